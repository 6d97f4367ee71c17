//! Error types for the mosaic pipeline.
//!
//! Configuration errors abort the run before any work starts. Tile and video
//! errors are per-item: the item is dropped from the output set and reported
//! in the end-of-run summary, never aborting sibling work.

use std::path::PathBuf;
use thiserror::Error;

/// Fatal validation errors, checked before any processing begins.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("DPI must be a positive integer, got: {0}")]
    InvalidDpi(i64),

    #[error("Number of columns must be a positive integer, got: {0}")]
    InvalidColumns(i64),

    #[error("Number of images must be a positive integer, got: {0}")]
    InvalidSampleCount(i64),

    #[error("Confidence threshold must lie in (0, 1), got: {0}")]
    InvalidConfidence(f32),

    #[error("Unsupported page format: {format} (supported: {supported})")]
    UnsupportedPageFormat { format: String, supported: String },

    #[error("Input path does not exist: {0}")]
    InputNotFound(PathBuf),
}

/// Per-image failures inside the tile pipeline.
#[derive(Debug, Error)]
pub enum TileError {
    #[error("Failed to load image {path}: {source}")]
    ImageLoad {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("Crop region has zero area for {0}")]
    EmptyCrop(PathBuf),

    #[error("Failed to resample {path}: {message}")]
    Resample { path: PathBuf, message: String },
}

/// Per-video failures inside the frame sampler.
#[derive(Debug, Error)]
pub enum VideoError {
    #[error("Failed to open video {path}: {message}")]
    Open { path: PathBuf, message: String },

    #[error("Video reports no frames: {0}")]
    FrameCount(PathBuf),

    #[error("Failed to decode a frame from {path}: {message}")]
    FrameDecode { path: PathBuf, message: String },

    #[error("IO error while sampling {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl VideoError {
    pub fn open(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Open {
            path: path.into(),
            message: message.into(),
        }
    }

    pub fn decode(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::FrameDecode {
            path: path.into(),
            message: message.into(),
        }
    }
}
