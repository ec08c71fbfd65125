//! Core utilities: error types and logging

pub mod error;
pub mod logging;

pub use error::Error;
