use log::debug;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::IdCardError;

/// Well-known tessdata locations, checked once when no prefix is exported.
const TESSDATA_CANDIDATES: [&str; 6] = [
    "/usr/share/tesseract-ocr/5/tessdata",
    "/usr/share/tesseract-ocr/4.00/tessdata",
    "/usr/share/tessdata",
    "/usr/local/share/tessdata",
    "/opt/homebrew/share/tessdata",
    r"C:\Program Files\Tesseract-OCR\tessdata",
];

/// Parameters of the OCR-oriented preprocessing chain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PreprocessConfig {
    pub clahe_clip_limit: f32,
    /// Tiles per axis for local equalisation.
    pub clahe_tile_grid: u32,
    /// Odd kernel size of the smoothing pass.
    pub blur_kernel: u32,
    /// Odd neighbourhood size of the adaptive threshold.
    pub threshold_block_size: u32,
    pub threshold_bias: f32,
    /// Filter strength `h` of the non-local means pass.
    pub denoise_strength: f32,
    pub denoise_template_window: u32,
    pub denoise_search_window: u32,
}

impl Default for PreprocessConfig {
    fn default() -> Self {
        PreprocessConfig {
            clahe_clip_limit: 2.0,
            clahe_tile_grid: 8,
            blur_kernel: 3,
            threshold_block_size: 11,
            threshold_bias: 2.0,
            denoise_strength: 3.0,
            denoise_template_window: 7,
            denoise_search_window: 21,
        }
    }
}

impl PreprocessConfig {
    pub fn validate(&self) -> Result<(), IdCardError> {
        let odd = |name: &str, value: u32| {
            if value == 0 || value % 2 == 0 {
                Err(IdCardError::ConfigError(format!("{} must be odd and positive, got {}", name, value)))
            } else {
                Ok(())
            }
        };
        odd("blur_kernel", self.blur_kernel)?;
        odd("threshold_block_size", self.threshold_block_size)?;
        odd("denoise_template_window", self.denoise_template_window)?;
        odd("denoise_search_window", self.denoise_search_window)?;

        if self.clahe_tile_grid == 0 {
            return Err(IdCardError::ConfigError("clahe_tile_grid must be positive".to_string()));
        }
        if self.clahe_clip_limit <= 0.0 || self.denoise_strength <= 0.0 {
            return Err(IdCardError::ConfigError(
                "clahe_clip_limit and denoise_strength must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// How to reach the OCR engine. Resolved once, then injected into the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OcrConfig {
    /// Directory holding the `*.traineddata` files. `None` lets Tesseract use
    /// its compiled-in default.
    pub datapath: Option<PathBuf>,
    pub language: String,
}

impl Default for OcrConfig {
    fn default() -> Self {
        OcrConfig {
            datapath: None,
            language: "fra".to_string(),
        }
    }
}

impl OcrConfig {
    /// Resolve the tessdata directory from `TESSDATA_PREFIX` or the usual
    /// install locations.
    pub fn from_env() -> Self {
        let datapath = std::env::var_os("TESSDATA_PREFIX")
            .map(PathBuf::from)
            .or_else(|| {
                TESSDATA_CANDIDATES
                    .iter()
                    .map(PathBuf::from)
                    .find(|candidate| candidate.is_dir())
            });
        debug!("Resolved tessdata directory: {:?}", datapath);

        OcrConfig {
            datapath,
            ..OcrConfig::default()
        }
    }

    pub fn datapath_str(&self) -> Result<Option<&str>, IdCardError> {
        self.datapath
            .as_deref()
            .map(|path| {
                path.to_str().ok_or_else(|| {
                    IdCardError::ConfigError(format!("tessdata path is not valid UTF-8: {:?}", path))
                })
            })
            .transpose()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessorConfig {
    pub preprocess: PreprocessConfig,
    pub ocr: OcrConfig,
}

impl ProcessorConfig {
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, IdCardError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .map_err(|e| IdCardError::IoError(format!("Failed to read config {:?}: {}", path, e)))?;
        let config: ProcessorConfig = serde_json::from_str(&contents)
            .map_err(|e| IdCardError::ConfigError(format!("Invalid config {:?}: {}", path, e)))?;
        config.preprocess.validate()?;
        Ok(config)
    }
}
