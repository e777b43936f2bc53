use crate::core::errors::AlgorithmError;

/// Consumes subprocess output one line at a time.
///
/// A failing line is the reader's own problem: the pump drops the error and
/// keeps feeding this reader and the others.
pub trait OutputReader: Send {
    fn read_output(&mut self, _line: &str) -> Result<(), AlgorithmError> {
        Ok(())
    }
}
