use thiserror::Error;

/// Errors raised while enriching detections with sampled colors
#[derive(Error, Debug)]
pub enum EnhanceError {
    #[error("Failed to decode source image: {0}")]
    Decode(#[from] image::ImageError),

    #[error("Enhancement result from generation {ticket} discarded (current generation is {current})")]
    Stale { ticket: u64, current: u64 },
}

/// Errors raised while building a masked fill for a covering rectangle
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CompositeError {
    #[error("Offscreen surface unavailable for a {width}x{height} raster")]
    SurfaceUnavailable { width: u32, height: u32 },
}

/// Errors raised while reading the OCR collaborator's response
#[derive(Error, Debug)]
pub enum ResponseError {
    #[error("Malformed detection response: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("Detection service reported failure")]
    Unsuccessful,
}

/// Errors raised while loading editor configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config: {0}")]
    Read(#[from] std::io::Error),

    #[error("Invalid config: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Errors raised while producing the final raster
#[derive(Error, Debug)]
pub enum ExportError {
    #[error("Export plan has no area ({width}x{height})")]
    EmptyPlan { width: u32, height: u32 },

    #[error("Source is {actual:?} but the export plan needs {expected:?}")]
    SourceMismatch {
        expected: (u32, u32),
        actual: (u32, u32),
    },

    #[error("Failed to encode export: {0}")]
    Encode(#[from] image::ImageError),
}

/// Errors that can occur during interaction mode transitions
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ModeError {
    #[error("Cannot transition from {from} to {to}")]
    InvalidTransition {
        from: &'static str,
        to: &'static str,
    },
}
