use std::fmt;

use itertools::Itertools;

use crate::core::{errors::AlgorithmError, traits::reader::OutputReader};

/// Wrapper around an external program under benchmark.
///
/// The algorithm receives every stdout line of its process live through its
/// [`OutputReader`] impl.
pub trait Algorithm: OutputReader {
    type Output: Send;

    fn name(&self) -> &str;

    fn parameter_settings(&self) -> String;

    fn full_name(&self) -> String {
        format!("{}_{}", self.name(), self.parameter_settings())
    }

    fn key(&self) -> AlgorithmKey {
        AlgorithmKey(self.full_name())
    }

    /// `None` means the driver's default iteration count applies.
    fn iterations(&self) -> Option<u32>;

    fn set_iterations(&mut self, iterations: u32);

    /// Rebuilds the command from scratch.
    fn pre_process(&mut self) -> Result<(), AlgorithmError>;

    fn command_elements(&self) -> &[String];

    fn command(&self) -> String {
        self.command_elements().iter().join(" ")
    }

    fn parse_results(&mut self) -> Result<Self::Output, AlgorithmError>;

    fn post_process(&mut self) -> Result<(), AlgorithmError>;
}

/// Identity of an algorithm: two instances with the same full name are the
/// same algorithm.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AlgorithmKey(pub String);

impl fmt::Display for AlgorithmKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Argument list an algorithm rebuilds on every `pre_process`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CommandLine {
    elements: Vec<String>,
}

impl CommandLine {
    pub fn clear(&mut self) {
        self.elements.clear();
    }

    pub fn push(&mut self, element: impl Into<String>) {
        self.elements.push(element.into());
    }

    pub fn extend<I, S>(&mut self, elements: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.elements.extend(elements.into_iter().map(Into::into));
    }

    pub fn as_slice(&self) -> &[String] {
        &self.elements
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }
}

impl fmt::Display for CommandLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.elements.iter().join(" "))
    }
}
