// Identity card field extraction from the command line

use clap::Parser;
use idcard_ocr::models::ValidationIssue;
use idcard_ocr::utils::OcrConfig;
use idcard_ocr::validation::FieldValidator;
use idcard_ocr::{ExtractionResult, IdCardError, IdCardProcessor, ProcessorConfig, TextZone};
use log::error;
use serde::Serialize;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser, Debug)]
#[command(name = "idcard-ocr", version, about = "Extract identity card fields from a photograph")]
struct Args {
    /// Card photograph (PNG, JPEG, ...)
    image: PathBuf,

    /// JSON file with preprocessing and OCR settings
    #[arg(long)]
    config: Option<PathBuf>,

    /// Directory holding the Tesseract traineddata files
    #[arg(long, env = "TESSDATA_PREFIX")]
    tessdata: Option<PathBuf>,

    /// Recognition language
    #[arg(long)]
    lang: Option<String>,

    /// Print JSON instead of the text report
    #[arg(long)]
    json: bool,

    /// Also list candidate text zones
    #[arg(long)]
    zones: bool,

    /// Also run plausibility checks on the extracted fields
    #[arg(long)]
    validate: bool,
}

#[derive(Serialize)]
struct Output<'a> {
    #[serde(flatten)]
    result: &'a ExtractionResult,
    #[serde(skip_serializing_if = "Option::is_none")]
    zones: Option<Vec<TextZone>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    issues: Option<Vec<ValidationIssue>>,
}

fn load_config(args: &Args) -> Result<ProcessorConfig, IdCardError> {
    let mut config = match &args.config {
        Some(path) => ProcessorConfig::from_json_file(path)?,
        None => ProcessorConfig::default(),
    };

    if let Some(tessdata) = &args.tessdata {
        config.ocr.datapath = Some(tessdata.clone());
    } else if config.ocr.datapath.is_none() {
        config.ocr.datapath = OcrConfig::from_env().datapath;
    }
    if let Some(lang) = &args.lang {
        config.ocr.language = lang.clone();
    }
    Ok(config)
}

fn run(args: &Args) -> Result<(), IdCardError> {
    let config = load_config(args)?;
    let processor = IdCardProcessor::new(config);

    let (result, zones) = if args.zones {
        let (result, zones) = processor.process_file_with_zones(&args.image)?;
        (result, Some(zones))
    } else {
        (processor.process_file(&args.image)?, None)
    };
    let issues = args.validate.then(|| FieldValidator::validate(&result.fields));

    if args.json {
        let output = Output {
            result: &result,
            zones,
            issues,
        };
        let json = serde_json::to_string_pretty(&output)
            .map_err(|e| IdCardError::IoError(format!("Failed to serialise result: {}", e)))?;
        println!("{}", json);
        return Ok(());
    }

    println!("{}", result.report());

    if let Some(zones) = zones {
        println!("\n=== ZONES ({}) ===", zones.len());
        for zone in zones {
            println!("  x={} y={} w={} h={}", zone.x, zone.y, zone.width, zone.height);
        }
    }

    if let Some(issues) = issues {
        println!("\n=== VÉRIFICATIONS ===");
        if issues.is_empty() {
            println!("  Aucun problème détecté");
        }
        for issue in issues {
            println!("  - [{:?}] {}: {}", issue.issue_type, issue.field, issue.message);
        }
    }

    Ok(())
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("Extraction failed: {}", err);
            ExitCode::FAILURE
        }
    }
}
