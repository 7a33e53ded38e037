use image::{DynamicImage, ImageFormat, ImageReader};
use std::path::Path;
use std::process::Command;

use crate::error::{Error, Result};

/// Turns one source file into an in-memory image buffer.
///
/// Implementations are shared by every worker of the conversion pool, so they
/// must not hold per-file state.
pub trait SourceDecoder: Send + Sync {
    fn decode(&self, path: &Path) -> Result<DynamicImage>;
}

/// Decodes HEIC (and anything else ImageMagick reads) by piping it through
/// `magick` / `convert` as PNG.
#[derive(Debug, Clone)]
pub struct ImageMagickDecoder {
    command: &'static str,
}

impl ImageMagickDecoder {
    pub fn new() -> Self {
        Self {
            command: get_imagemagick_command(),
        }
    }

    pub fn command(&self) -> &'static str {
        self.command
    }
}

impl Default for ImageMagickDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl SourceDecoder for ImageMagickDecoder {
    fn decode(&self, path: &Path) -> Result<DynamicImage> {
        tracing::debug!(file = %path.display(), command = self.command, "decoding with ImageMagick");

        // `[0]` selects the primary image of multi-image containers
        let source = format!("{}[0]", path.display());
        let output = Command::new(self.command)
            .arg(&source)
            .arg("png:-")
            .output()
            .map_err(|e| Error::ImageMagick(format!("could not run '{}': {}", self.command, e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Error::Decode {
                path: path.to_path_buf(),
                reason: stderr.trim().to_string(),
            });
        }

        image::load_from_memory_with_format(&output.stdout, ImageFormat::Png).map_err(|e| {
            Error::Decode {
                path: path.to_path_buf(),
                reason: e.to_string(),
            }
        })
    }
}

/// Decodes with the `image` crate, sniffing the format from the file content
/// rather than trusting the extension.
#[derive(Debug, Clone, Copy, Default)]
pub struct ImageCrateDecoder;

impl SourceDecoder for ImageCrateDecoder {
    fn decode(&self, path: &Path) -> Result<DynamicImage> {
        let reader = ImageReader::open(path)?.with_guessed_format()?;
        reader.decode().map_err(|e| Error::Decode {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }
}

/// Check if ImageMagick is available on the system
pub fn is_imagemagick_available() -> bool {
    // Try 'magick' first (ImageMagick v7), then fall back to 'convert' (v6)
    command_succeeds("magick") || command_succeeds("convert")
}

/// Get the appropriate ImageMagick command ('magick' for v7, 'convert' for v6)
fn get_imagemagick_command() -> &'static str {
    if command_succeeds("magick") {
        "magick"
    } else {
        "convert"
    }
}

fn command_succeeds(command: &str) -> bool {
    Command::new(command)
        .arg("-version")
        .output()
        .map(|output| output.status.success())
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    #[test]
    fn test_image_crate_decoder_ignores_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("photo.heic");
        RgbImage::from_pixel(8, 4, Rgb([10, 20, 30]))
            .save_with_format(&path, ImageFormat::Png)
            .unwrap();

        let img = ImageCrateDecoder.decode(&path).unwrap();
        assert_eq!((img.width(), img.height()), (8, 4));
    }

    #[test]
    fn test_image_crate_decoder_rejects_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.heic");
        std::fs::write(&path, b"definitely not an image").unwrap();

        assert!(ImageCrateDecoder.decode(&path).is_err());
    }
}
