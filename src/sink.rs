use std::{
    fs::{File, OpenOptions},
    path::Path,
};

use serde::Serialize;

use crate::{
    constants::{ALGORITHMS_CSV, CSV_DELIMITER, DATA_CSV, MODELS_CSV},
    core::errors::SinkError,
};

const DATA_HEADER: [&str; 8] = [
    "ModelID",
    "AlgorithmID",
    "SystemIteration",
    "AlgorithmIteration",
    "InTime",
    "NoError",
    "Time",
    "Result",
];
const ALGORITHMS_HEADER: [&str; 4] = ["ModelID", "AlgorithmID", "Name", "Settings"];
const MODELS_HEADER: [&str; 2] = ["ModelID", "Name"];

/// One line of `data.csv`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct DataRow {
    pub model_id: u32,
    pub algorithm_id: usize,
    pub system_iteration: u32,
    pub algorithm_iteration: u32,
    pub in_time: bool,
    pub no_error: bool,
    pub time: i64,
    pub result: String,
}

#[derive(Serialize)]
struct AlgorithmRow<'a> {
    model_id: u32,
    algorithm_id: usize,
    name: &'a str,
    settings: &'a str,
}

/// Writes the three result files of a benchmark run. Every row is flushed
/// as soon as it is written.
pub struct CsvSink {
    data: csv::Writer<File>,
    models: csv::Writer<File>,
    algorithms: csv::Writer<File>,
}

impl CsvSink {
    /// Opens the result files in `dir`. In append mode existing rows are
    /// kept and headers are only written to files that are new or empty.
    pub fn open(dir: &Path, append: bool, model_header: &[String]) -> Result<Self, SinkError> {
        let models_header: Vec<&str> = MODELS_HEADER
            .into_iter()
            .chain(model_header.iter().map(String::as_str))
            .collect();

        Ok(Self {
            data: open_writer(&dir.join(DATA_CSV), append, &DATA_HEADER)?,
            models: open_writer(&dir.join(MODELS_CSV), append, &models_header)?,
            algorithms: open_writer(&dir.join(ALGORITHMS_CSV), append, &ALGORITHMS_HEADER)?,
        })
    }

    pub fn write_algorithm(
        &mut self,
        model_id: u32,
        algorithm_id: usize,
        name: &str,
        settings: &str,
    ) -> Result<(), SinkError> {
        self.algorithms.serialize(AlgorithmRow {
            model_id,
            algorithm_id,
            name,
            settings,
        })?;
        self.algorithms.flush()?;
        Ok(())
    }

    pub fn write_model(&mut self, model_id: u32, name: &str, columns: &[String]) -> Result<(), SinkError> {
        let id = model_id.to_string();
        let record = [id.as_str(), name]
            .into_iter()
            .chain(columns.iter().map(String::as_str));
        self.models.write_record(record)?;
        self.models.flush()?;
        Ok(())
    }

    pub fn write_data(&mut self, row: &DataRow) -> Result<(), SinkError> {
        self.data.serialize(row)?;
        self.data.flush()?;
        Ok(())
    }
}

fn open_writer(path: &Path, append: bool, header: &[&str]) -> Result<csv::Writer<File>, SinkError> {
    let has_rows = append
        && path
            .metadata()
            .map(|metadata| metadata.len() > 0)
            .unwrap_or(false);

    let file = OpenOptions::new()
        .create(true)
        .write(true)
        .append(append)
        .truncate(!append)
        .open(path)
        .map_err(|source| SinkError::Open {
            path: path.to_path_buf(),
            source,
        })?;

    let mut writer = csv::WriterBuilder::new()
        .delimiter(CSV_DELIMITER)
        .has_headers(false)
        .from_writer(file);
    if !has_rows {
        writer.write_record(header)?;
        writer.flush()?;
    }
    Ok(writer)
}
