// Library exports for reuse by integration tests and other applications
pub mod cli;
pub mod config;
pub mod error;
pub mod image_processing;
pub mod media;
pub mod utils;

// Re-export commonly used types
pub use config::PageSizeTable;
pub use error::{ConfigError, TileError, VideoError};
pub use image_processing::{MosaicConfig, MosaicEngine};
pub use media::{MediaFile, MediaKind};
