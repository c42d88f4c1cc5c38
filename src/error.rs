use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Failures reported by a resize oracle.
#[derive(Debug, Error)]
pub enum OracleError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image processing error: {0}")]
    ImageProcessing(#[from] image::ImageError),

    #[error("PNG optimization error: {0}")]
    PngOptimization(String),

    #[error("Resize timed out after {0:?}")]
    Timeout(Duration),

    #[error("Resize command `{program}` failed with status {status}")]
    CommandFailed { program: String, status: String },

    #[error("Resize worker exited without reporting a result")]
    WorkerLost,
}

impl OracleError {
    /// Timeouts are retried by the search; everything else ends the run.
    pub fn is_timeout(&self) -> bool {
        matches!(self, OracleError::Timeout(_))
    }
}

#[derive(Debug, Error)]
pub enum BreakpointError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image processing error: {0}")]
    ImageProcessing(#[from] image::ImageError),

    #[error("Resize oracle error: {0}")]
    Oracle(#[from] OracleError),

    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    #[error("File too large: {0} bytes. Maximum allowed: {1} bytes")]
    FileTooLarge(u64, u64),

    #[error("Invalid dimensions: {0:?}. Expected WxH with positive integers")]
    InvalidDimensions(String),

    #[error("Invalid image dimensions: {0}x{1}. Maximum allowed: {2}x{2}")]
    DimensionsTooLarge(u32, u32, u32),

    #[error("Invalid step: {0} bytes. Must be greater than zero")]
    InvalidStep(u64),

    #[error("Invalid quality value: {0}. Must be between 1 and 100")]
    InvalidQuality(u8),

    #[error("Invalid attempt limit: {0}. Must be at least 1")]
    InvalidAttempts(usize),

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("Failed to create output directory: {0}")]
    DirectoryCreationFailed(PathBuf),

    #[error(
        "File size does not grow between the bounds: lower is {lower} bytes, upper is {upper} bytes"
    )]
    DivergentSamples { lower: u64, upper: u64 },
}

pub type Result<T> = std::result::Result<T, BreakpointError>;
