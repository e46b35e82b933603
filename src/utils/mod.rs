pub mod config;
pub mod error;

pub use config::{OcrConfig, PreprocessConfig, ProcessorConfig};
pub use error::IdCardError;
