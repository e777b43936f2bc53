pub mod algorithm;
pub mod suite;
