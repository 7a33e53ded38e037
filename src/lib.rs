// Library exports shared by the heic-convert, photo-layout and pdf-repeat-page binaries
pub mod cli;
pub mod error;
pub mod image_processing;
pub mod json_output;
pub mod layout;
pub mod pdf;
pub mod utils;

// Re-export commonly used types
pub use cli::{OutputFormat, PageSize};
pub use error::{Error, Result};
pub use image_processing::{ConversionOutcome, ConversionSummary, ConvertOptions, SourceDecoder};
pub use json_output::JsonMessage;
pub use layout::{LayoutConfig, LayoutEvent, LayoutSummary};
pub use pdf::ReplicateOptions;
