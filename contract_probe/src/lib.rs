pub mod artifacts;
pub mod config;
pub mod contracts;
pub mod errors;
pub mod probe;
pub mod utils;
