pub mod pump;
pub mod readers;
