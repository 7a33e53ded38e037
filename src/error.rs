//! Error type shared by the three tools.
//!
//! Invocation-level problems (bad directory, unknown format, page out of range)
//! abort a run before any work is done. Per-item problems use the same type but
//! are captured into the item's outcome by the caller instead of being
//! propagated.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Directory '{}' does not exist.", path.display())]
    DirectoryNotFound { path: PathBuf },

    #[error("'{}' is not a directory.", path.display())]
    NotADirectory { path: PathBuf },

    #[error("Unsupported format '{format}'. Supported: JPEG, JPG, PNG, WEBP")]
    UnsupportedFormat { format: String },

    #[error("Invalid page size: {name}. Choose from: letter, A4, legal")]
    UnknownPageSize { name: String },

    #[error("{0}")]
    InvalidArgument(String),

    #[error("Page number {page} out of range. PDF has {total} pages.")]
    PageOutOfRange { page: u32, total: u32 },

    #[error("Failed to decode '{}': {reason}", path.display())]
    Decode { path: PathBuf, reason: String },

    #[error("ImageMagick failed: {0}")]
    ImageMagick(String),

    #[error(transparent)]
    Image(#[from] image::ImageError),

    #[error("Resize failed: {0}")]
    Resize(String),

    #[error("PDF error: {0}")]
    Pdf(#[from] lopdf::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Operation cancelled by user")]
    Interrupted,

    #[error("Failed to install interrupt handler: {0}")]
    Signal(#[from] ctrlc::Error),
}

impl Error {
    pub fn is_interrupted(&self) -> bool {
        matches!(self, Error::Interrupted)
    }
}

pub type Result<T> = std::result::Result<T, Error>;
