//! ImageTextExtractor - command line host
//!
//! Runs the extraction pipeline on an image file and prints the text.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use image_text_extractor::capture::{download, FileSource};
use image_text_extractor::config::{self, AppConfig};
use image_text_extractor::vision::{ExtractionResult, OcrBackend, TextExtractor};
use image_text_extractor::EngineConfig;

/// Extract text from an image with OCR
#[derive(Parser, Debug)]
#[command(name = "image-text-extractor")]
#[command(about = "Normalize an image and extract its text with Tesseract OCR")]
struct Args {
    /// Image file to process
    image: PathBuf,

    /// Configuration file (defaults to config.toml in the user config directory)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Directory containing <lang>.traineddata
    #[arg(long)]
    tessdata: Option<PathBuf>,

    /// Recognition language code
    #[arg(short, long)]
    lang: Option<String>,

    /// Save the extracted text as <image stem>.txt in this directory
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Print the result as JSON
    #[arg(long)]
    json: bool,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let default_level = if args.verbose { "debug" } else { "info" };
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let mut config = load_or_create_config(args.config.as_deref())?;
    if let Some(dir) = &args.tessdata {
        config.engine.tessdata_dir = Some(dir.clone());
    }
    if let Some(lang) = &args.lang {
        config.engine.language = lang.clone();
    }

    run_default(&args, config).await
}

#[cfg(feature = "tesseract")]
async fn run_default(args: &Args, config: AppConfig) -> Result<()> {
    run(image_text_extractor::vision::TesseractBackend::new(), args, config).await
}

#[cfg(not(feature = "tesseract"))]
async fn run_default(_args: &Args, _config: AppConfig) -> Result<()> {
    anyhow::bail!("No OCR backend compiled in; rebuild with `--features tesseract`")
}

/// Load configuration from file or fall back to defaults
fn load_or_create_config(explicit: Option<&Path>) -> Result<AppConfig> {
    if let Some(path) = explicit {
        let config = config::load_config(path).with_context(|| format!("Failed to load {:?}", path))?;
        info!("Loaded configuration from {:?}", path);
        return Ok(config);
    }

    if let Ok(config_dir) = config::get_config_dir() {
        let config_path = config_dir.join("config.toml");
        if config_path.exists() {
            match config::load_config(&config_path) {
                Ok(config) => {
                    info!("Loaded configuration from {:?}", config_path);
                    return Ok(config);
                }
                Err(e) => warn!("Ignoring invalid configuration {:?}: {}", config_path, e),
            }
        }
    }
    info!("Using default configuration");
    Ok(AppConfig::default())
}

#[cfg_attr(not(feature = "tesseract"), allow(dead_code))]
async fn run<B: OcrBackend>(backend: B, args: &Args, config: AppConfig) -> Result<()> {
    let engine = EngineConfig::from_settings(&config.engine)?;
    let extractor =
        TextExtractor::new(backend, engine, config.preprocess).context("Failed to initialize OCR engine")?;

    let mut source = FileSource::new(&args.image);
    let sink = |percentage: u8, message: &str| eprintln!("[{:>3}%] {}", percentage, message);
    let result = extractor.extract_from_source(&mut source, &sink).await?;

    print_result(&result, args.json)?;

    if let Some(dir) = &args.output {
        let stem = args
            .image
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "extracted".to_string());
        let path = download::download_text(dir, &format!("{}.txt", stem), &download::encode_text(&result.text))?;
        eprintln!("Saved text to {}", path.display());
    }

    Ok(())
}

#[cfg_attr(not(feature = "tesseract"), allow(dead_code))]
fn print_result(result: &ExtractionResult, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(result)?);
    } else {
        print!("{}", result.text);
        eprintln!("{}", result.status);
    }
    Ok(())
}
