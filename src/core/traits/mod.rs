pub mod algorithm;
pub mod launcher;
pub mod reader;
