pub mod id_card_processor;
pub mod models;
pub mod processing;
pub mod utils;
pub mod validation;

pub use id_card_processor::IdCardProcessor;
pub use models::{ExtractionResult, Field, FieldMap, SegmentationMode, TextZone};
pub use utils::{IdCardError, ProcessorConfig};
