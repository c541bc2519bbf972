//! Headless color enhancement for a detection response.
//!
//! Prints the enhanced detections as JSON. With `--covers-png`, also writes
//! the source image with every covering rectangle painted on.
#![warn(clippy::all, rust_2018_idioms)]

use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use overlay_editor::export::encode_png;
use overlay_editor::{EditorConfig, EditorContext, EguiSurface, parse_detection_response};

/// Sample background and text colors for every OCR detection in a response.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Source image the detections were made on.
    image: PathBuf,
    /// JSON response from the OCR service.
    response: PathBuf,
    /// Editor config (JSON); missing fields use defaults.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Write the source with covering rectangles painted on (no text) as PNG.
    #[arg(long)]
    covers_png: Option<PathBuf>,
}

fn run(args: Args) -> Result<(), Box<dyn std::error::Error>> {
    let config = match &args.config {
        Some(path) => EditorConfig::load(path)?,
        None => EditorConfig::default(),
    };

    let response = fs::read_to_string(&args.response)?;
    let detections = parse_detection_response(&response)?;
    let image_bytes = fs::read(&args.image)?;

    let mut editor = EditorContext::new(EguiSurface::new(), config);
    editor.load_detections(detections);
    editor.enhance(&image_bytes)?;

    println!("{}", serde_json::to_string_pretty(editor.detections())?);

    if let Some(out) = &args.covers_png {
        let source = image::load_from_memory(&image_bytes)?.to_rgba8();
        editor.set_image_size(source.width(), source.height());
        let flattened = editor.flatten_covers(&source)?;
        fs::write(out, encode_png(&flattened)?)?;
        log::info!("Wrote covers to {}", out.display());
    }
    Ok(())
}

fn main() -> ExitCode {
    #[cfg(not(target_arch = "wasm32"))]
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    match run(Args::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            log::error!("{}", err);
            ExitCode::FAILURE
        }
    }
}
