/// Native module contains implementations of core traits
/// that talk to the host operating system directly.
pub mod launcher;
