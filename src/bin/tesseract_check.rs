// Check that Tesseract and the recognition language are installed

use idcard_ocr::processing::TesseractEngine;
use idcard_ocr::utils::OcrConfig;
use log::{error, info, warn};
use std::process::ExitCode;

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = OcrConfig::from_env();
    match &config.datapath {
        Some(path) => info!("Using tessdata directory {:?}", path),
        None => warn!("No tessdata directory found, relying on Tesseract's built-in default"),
    }

    let language = config.language.clone();
    match TesseractEngine::new(config).probe() {
        Ok(()) => {
            info!("Tesseract is ready with language '{}'", language);
            ExitCode::SUCCESS
        }
        Err(err) => {
            error!("{}", err);
            error!("Install Tesseract and the '{}' language pack, or set TESSDATA_PREFIX", language);
            ExitCode::FAILURE
        }
    }
}
