pub mod extractors;
pub mod image;
pub mod ocr;
pub mod zones;

pub use extractors::FieldParser;
pub use image::ImageProcessor;
pub use ocr::{OcrEngine, OcrProcessor, TesseractEngine};
pub use zones::ZoneDetector;
