use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for operations that may fail with [`PipelineError`].
pub type PipelineResult<T> = std::result::Result<T, PipelineError>;

/// Error types that can occur while removing a background or tracing an image.
///
/// Only a failed vectorization is recovered from by the pipeline; every other
/// variant ends the run.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// ONNX Runtime inference error.
    #[error("ONNX Runtime error: {0}")]
    Ort(#[from] ort::Error),
    /// Image loading, decoding, or encoding error.
    #[error("Image processing failed: {0}")]
    Image(#[from] image::ImageError),
    /// File system I/O error.
    #[error(transparent)]
    Io(#[from] std::io::Error),
    /// Tensor shape mismatch or invalid dimensions.
    #[error("Invalid tensor shape: {0}")]
    Shape(#[from] ndarray::ShapeError),
    /// The model produced an output that cannot be read as a matte.
    #[error("Unexpected model output: {0}")]
    ModelOutput(String),
    /// Vectorization failed.
    #[error("Tracing failed: {0}")]
    Trace(String),
    /// Alpha matte dimensions do not match the source image.
    #[error("Alpha matte size {found:?} does not match source image size {expected:?}")]
    AlphaMismatch {
        expected: (u32, u32),
        found: (u32, u32),
    },
    /// Model file not found at the specified path.
    #[error("Model file not found: {}", path.display())]
    ModelNotFound { path: PathBuf },
    /// Model download or checksum verification failed.
    #[error("Model download failed: {0}")]
    Download(String),
}
