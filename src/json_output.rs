//! JSON line output
//!
//! When `--json` is passed, per-item results and the final summary are emitted
//! as one JSON object per line on stdout, replacing the human readable text.

use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum JsonMessage {
    /// One source file converted
    FileConverted {
        input_path: String,
        output_path: String,
        deleted_original: bool,
    },
    /// One source file could not be converted
    FileFailed { input_path: String, error: String },
    /// One image drawn into the layout
    ImagePlaced {
        input_path: String,
        page: usize,
        row: u32,
        col: u32,
    },
    /// One image skipped by the layout
    ImageFailed { input_path: String, error: String },
    /// End of run
    Summary {
        total_files: usize,
        processed: usize,
        failed: usize,
        duration_secs: f64,
    },
}

impl JsonMessage {
    /// Emit JSON message to stdout
    pub fn emit(&self) {
        if let Ok(json) = serde_json::to_string(self) {
            println!("{}", json);
        }
    }

    pub fn file_converted(input_path: &Path, output_path: &Path, deleted_original: bool) -> Self {
        Self::FileConverted {
            input_path: input_path.display().to_string(),
            output_path: output_path.display().to_string(),
            deleted_original,
        }
    }

    pub fn file_failed(input_path: &Path, error: impl Into<String>) -> Self {
        Self::FileFailed {
            input_path: input_path.display().to_string(),
            error: error.into(),
        }
    }

    pub fn image_placed(input_path: &Path, page: usize, row: u32, col: u32) -> Self {
        Self::ImagePlaced {
            input_path: input_path.display().to_string(),
            page,
            row,
            col,
        }
    }

    pub fn image_failed(input_path: &Path, error: impl Into<String>) -> Self {
        Self::ImageFailed {
            input_path: input_path.display().to_string(),
            error: error.into(),
        }
    }

    pub fn summary(total_files: usize, processed: usize, failed: usize, duration_secs: f64) -> Self {
        Self::Summary {
            total_files,
            processed,
            failed,
            duration_secs,
        }
    }
}
