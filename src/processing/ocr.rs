use image::GrayImage;
use log::{debug, info, warn};
use std::sync::Arc;
use tesseract::{PageSegMode, Tesseract};

use super::ImageProcessor;
use crate::models::SegmentationMode;
use crate::utils::{IdCardError, OcrConfig};

/// An OCR engine able to read a processed image with a given segmentation
/// strategy and recognition language.
pub trait OcrEngine: Send + Sync {
    fn recognize(&self, image: &GrayImage, mode: SegmentationMode, language: &str) -> Result<String, IdCardError>;
}

impl<E: OcrEngine + ?Sized> OcrEngine for Arc<E> {
    fn recognize(&self, image: &GrayImage, mode: SegmentationMode, language: &str) -> Result<String, IdCardError> {
        (**self).recognize(image, mode, language)
    }
}

/// Tesseract through its C API. A fresh handle is created for every call, so
/// one engine may serve concurrent pipelines.
pub struct TesseractEngine {
    config: OcrConfig,
}

impl TesseractEngine {
    pub fn new(config: OcrConfig) -> Self {
        TesseractEngine { config }
    }

    /// Check that Tesseract starts with the trained data of the configured
    /// language.
    pub fn probe(&self) -> Result<(), IdCardError> {
        Tesseract::new(self.config.datapath_str()?, Some(self.config.language.as_str())).map_err(|e| {
            IdCardError::OcrUnavailable(format!(
                "Tesseract could not load language '{}' from {:?}: {}",
                self.config.language, self.config.datapath, e
            ))
        })?;
        Ok(())
    }

    fn page_seg_mode(mode: SegmentationMode) -> PageSegMode {
        match mode {
            SegmentationMode::UniformBlock => PageSegMode::PsmSingleBlock,
            SegmentationMode::Automatic => PageSegMode::PsmAuto,
            SegmentationMode::SingleColumn => PageSegMode::PsmSingleColumn,
        }
    }
}

impl OcrEngine for TesseractEngine {
    fn recognize(&self, image: &GrayImage, mode: SegmentationMode, language: &str) -> Result<String, IdCardError> {
        let pass_error = |message: String| IdCardError::OcrPassError { mode, message };

        // Tesseract reads from a file; the handle keeps it alive for the pass.
        let temp_file = ImageProcessor::save_to_temp_file(image)?;
        let path_str = temp_file
            .path()
            .to_str()
            .ok_or_else(|| pass_error("Failed to convert path to string".to_string()))?;

        let mut tess = Tesseract::new(self.config.datapath_str()?, Some(language))
            .map_err(|e| pass_error(format!("Tesseract init error: {}", e)))?;
        tess.set_page_seg_mode(Self::page_seg_mode(mode));

        let mut tess = tess
            .set_image(path_str)
            .map_err(|e| pass_error(format!("Tesseract set image error: {}", e)))?;
        tess.get_text()
            .map_err(|e| pass_error(format!("Tesseract error: {}", e)))
    }
}

/// Runs every segmentation pass over the same image and joins what they read.
pub struct OcrProcessor {
    engine: Box<dyn OcrEngine>,
    language: String,
}

impl OcrProcessor {
    pub fn new(engine: Box<dyn OcrEngine>, language: impl Into<String>) -> Self {
        OcrProcessor {
            engine,
            language: language.into(),
        }
    }

    /// Texts of the uniform-block, automatic and single-column passes, joined
    /// by newlines in that order. A failing pass is skipped; only when every
    /// pass fails is the engine reported unavailable.
    pub fn recognize(&self, image: &GrayImage) -> Result<String, IdCardError> {
        let mut texts = Vec::with_capacity(SegmentationMode::PASSES.len());
        let mut failures = Vec::new();

        for mode in SegmentationMode::PASSES {
            match self.engine.recognize(image, mode, &self.language) {
                Ok(text) => {
                    debug!("OCR pass {} read {} characters", mode, text.len());
                    texts.push(text);
                }
                Err(err) => {
                    warn!("Dropping OCR pass {}: {}", mode, err);
                    failures.push(err.to_string());
                }
            }
        }

        if texts.is_empty() {
            return Err(IdCardError::OcrUnavailable(format!(
                "all {} OCR passes failed: {}",
                SegmentationMode::PASSES.len(),
                failures.join("; ")
            )));
        }

        info!("OCR finished with {}/{} passes", texts.len(), SegmentationMode::PASSES.len());
        Ok(texts.join("\n"))
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use image::Luma;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// Engine returning scripted text per segmentation mode.
    pub(crate) struct MockEngine {
        results: HashMap<SegmentationMode, Result<String, String>>,
        pub(crate) calls: Mutex<Vec<(SegmentationMode, String)>>,
    }

    impl MockEngine {
        pub(crate) fn new() -> Self {
            MockEngine {
                results: HashMap::new(),
                calls: Mutex::new(Vec::new()),
            }
        }

        pub(crate) fn with_text(mut self, mode: SegmentationMode, text: &str) -> Self {
            self.results.insert(mode, Ok(text.to_string()));
            self
        }

        pub(crate) fn with_failure(mut self, mode: SegmentationMode, message: &str) -> Self {
            self.results.insert(mode, Err(message.to_string()));
            self
        }
    }

    impl OcrEngine for MockEngine {
        fn recognize(&self, _image: &GrayImage, mode: SegmentationMode, language: &str) -> Result<String, IdCardError> {
            self.calls.lock().unwrap().push((mode, language.to_string()));
            match self.results.get(&mode) {
                Some(Ok(text)) => Ok(text.clone()),
                Some(Err(message)) => Err(IdCardError::OcrPassError {
                    mode,
                    message: message.clone(),
                }),
                None => Ok(String::new()),
            }
        }
    }

    fn blank() -> GrayImage {
        GrayImage::from_pixel(4, 4, Luma([255]))
    }

    #[test]
    fn test_all_passes_joined_in_order() {
        let engine = MockEngine::new()
            .with_text(SegmentationMode::Automatic, "auto")
            .with_text(SegmentationMode::SingleColumn, "column")
            .with_text(SegmentationMode::UniformBlock, "block");
        let processor = OcrProcessor::new(Box::new(engine), "fra");

        assert_eq!(processor.recognize(&blank()).unwrap(), "block\nauto\ncolumn");
    }

    #[test]
    fn test_passes_use_configured_language() {
        let engine = Arc::new(MockEngine::new());
        let processor = OcrProcessor::new(Box::new(engine.clone()), "fra");
        processor.recognize(&blank()).unwrap();

        let calls = engine.calls.lock().unwrap();
        let modes: Vec<SegmentationMode> = calls.iter().map(|(mode, _)| *mode).collect();
        assert_eq!(modes, SegmentationMode::PASSES.to_vec());
        assert!(calls.iter().all(|(_, language)| language == "fra"));
    }

    #[test]
    fn test_single_failed_pass_dropped() {
        let engine = MockEngine::new()
            .with_text(SegmentationMode::UniformBlock, "block")
            .with_failure(SegmentationMode::Automatic, "engine crashed")
            .with_text(SegmentationMode::SingleColumn, "column");
        let processor = OcrProcessor::new(Box::new(engine), "fra");

        assert_eq!(processor.recognize(&blank()).unwrap(), "block\ncolumn");
    }

    #[test]
    fn test_all_passes_failed() {
        let engine = MockEngine::new()
            .with_failure(SegmentationMode::UniformBlock, "no fra.traineddata")
            .with_failure(SegmentationMode::Automatic, "no fra.traineddata")
            .with_failure(SegmentationMode::SingleColumn, "no fra.traineddata");
        let processor = OcrProcessor::new(Box::new(engine), "fra");

        match processor.recognize(&blank()) {
            Err(IdCardError::OcrUnavailable(message)) => assert!(message.contains("no fra.traineddata")),
            other => panic!("expected OcrUnavailable, got {:?}", other),
        }
    }
}
