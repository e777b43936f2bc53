pub mod benchmark;
pub mod running;
