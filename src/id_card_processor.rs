use image::GrayImage;
use log::info;
use std::path::Path;

use crate::models::{ExtractionResult, TextZone};
use crate::processing::{FieldParser, ImageProcessor, OcrEngine, OcrProcessor, TesseractEngine, ZoneDetector};
use crate::utils::{IdCardError, PreprocessConfig, ProcessorConfig};

/// Runs the whole extraction for one card image. Holds configuration and the
/// OCR engine only; every buffer lives for a single call.
pub struct IdCardProcessor {
    preprocess: PreprocessConfig,
    ocr: OcrProcessor,
}

impl IdCardProcessor {
    /// Processor backed by Tesseract.
    pub fn new(config: ProcessorConfig) -> Self {
        let language = config.ocr.language.clone();
        let engine = TesseractEngine::new(config.ocr);
        Self::with_engine(config.preprocess, Box::new(engine), language)
    }

    pub fn with_engine(preprocess: PreprocessConfig, engine: Box<dyn OcrEngine>, language: impl Into<String>) -> Self {
        IdCardProcessor {
            preprocess,
            ocr: OcrProcessor::new(engine, language),
        }
    }

    // Main extraction function that orchestrates the entire process
    pub fn process(&self, image_bytes: &[u8]) -> Result<ExtractionResult, IdCardError> {
        // Step 1: Decode and preprocess the image
        let processed = ImageProcessor::process_bytes(image_bytes, &self.preprocess)?;

        self.extract(&processed)
    }

    /// Extraction plus candidate text zones, both read from a single
    /// preprocessed image.
    pub fn process_with_zones(&self, image_bytes: &[u8]) -> Result<(ExtractionResult, Vec<TextZone>), IdCardError> {
        let processed = ImageProcessor::process_bytes(image_bytes, &self.preprocess)?;
        let result = self.extract(&processed)?;
        let zones = ZoneDetector::detect_zones(&processed);
        Ok((result, zones))
    }

    pub fn process_file(&self, image_path: &Path) -> Result<ExtractionResult, IdCardError> {
        self.process(&Self::read_image(image_path)?)
    }

    pub fn process_file_with_zones(&self, image_path: &Path) -> Result<(ExtractionResult, Vec<TextZone>), IdCardError> {
        self.process_with_zones(&Self::read_image(image_path)?)
    }

    /// Candidate text regions of the preprocessed image.
    pub fn detect_zones(&self, image_bytes: &[u8]) -> Result<Vec<TextZone>, IdCardError> {
        let processed = ImageProcessor::process_bytes(image_bytes, &self.preprocess)?;
        Ok(ZoneDetector::detect_zones(&processed))
    }

    fn extract(&self, processed: &GrayImage) -> Result<ExtractionResult, IdCardError> {
        // Step 2: Read it with every segmentation mode
        let raw_text = self.ocr.recognize(processed)?;

        // Step 3: Map the text onto card fields
        let fields = FieldParser::parse(&raw_text);
        info!("Extracted {} field(s) from {} characters of OCR text", fields.len(), raw_text.len());

        Ok(ExtractionResult { fields, raw_text })
    }

    fn read_image(image_path: &Path) -> Result<Vec<u8>, IdCardError> {
        std::fs::read(image_path)
            .map_err(|e| IdCardError::IoError(format!("Failed to read image file {:?}: {}", image_path, e)))
    }
}
