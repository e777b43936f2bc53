use crate::core::{
    errors::AlgorithmError,
    traits::{
        algorithm::{Algorithm, CommandLine},
        reader::OutputReader,
    },
};

/// Algorithm with a fixed command line and switchable failures.
#[derive(Clone, Debug, Default)]
pub struct AlgorithmStub {
    name: String,
    settings: String,
    template: Vec<String>,
    command: CommandLine,
    iterations: Option<u32>,
    fail_pre_process: bool,
    fail_read: bool,
    fail_parse: bool,
    fail_post_process: bool,
    pub stdout: Vec<String>,
    pub pre_processed: usize,
    pub post_processed: usize,
}

impl AlgorithmStub {
    pub fn new(name: &str, command: Vec<&str>) -> Self {
        Self {
            name: name.to_string(),
            template: command.into_iter().map(str::to_string).collect(),
            ..Default::default()
        }
    }

    pub fn with_settings(mut self, settings: &str) -> Self {
        self.settings = settings.to_string();
        self
    }

    pub fn with_iterations(mut self, iterations: u32) -> Self {
        self.iterations = Some(iterations);
        self
    }

    pub fn failing_pre_process(mut self) -> Self {
        self.fail_pre_process = true;
        self
    }

    pub fn failing_read(mut self) -> Self {
        self.fail_read = true;
        self
    }

    pub fn failing_parse(mut self) -> Self {
        self.fail_parse = true;
        self
    }

    pub fn failing_post_process(mut self) -> Self {
        self.fail_post_process = true;
        self
    }
}

impl OutputReader for AlgorithmStub {
    fn read_output(&mut self, line: &str) -> Result<(), AlgorithmError> {
        self.stdout.push(line.to_string());
        if self.fail_read {
            return Err(AlgorithmError::Parse {
                line: line.to_string(),
                msg: "stub rejects every line".to_string(),
            });
        }
        Ok(())
    }
}

impl Algorithm for AlgorithmStub {
    type Output = Vec<String>;

    fn name(&self) -> &str {
        &self.name
    }

    fn parameter_settings(&self) -> String {
        self.settings.clone()
    }

    fn iterations(&self) -> Option<u32> {
        self.iterations
    }

    fn set_iterations(&mut self, iterations: u32) {
        self.iterations = Some(iterations);
    }

    fn pre_process(&mut self) -> Result<(), AlgorithmError> {
        self.pre_processed += 1;
        self.command.clear();
        if self.fail_pre_process {
            return Err(AlgorithmError::Command {
                msg: "stub refuses to build a command".to_string(),
            });
        }
        self.command.extend(self.template.iter().cloned());
        Ok(())
    }

    fn command_elements(&self) -> &[String] {
        self.command.as_slice()
    }

    fn parse_results(&mut self) -> Result<Self::Output, AlgorithmError> {
        if self.fail_parse {
            return Err(AlgorithmError::MissingResult {
                prefix: "result:".to_string(),
            });
        }
        Ok(self.stdout.clone())
    }

    fn post_process(&mut self) -> Result<(), AlgorithmError> {
        self.post_processed += 1;
        if self.fail_post_process {
            return Err(AlgorithmError::Io(std::io::Error::other("cleanup failed")));
        }
        Ok(())
    }
}
