pub mod domain;
pub mod errors;
pub mod pipeline;
pub mod streams;
pub mod traits;
