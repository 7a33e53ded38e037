use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use strum::{Display, EnumString};

use crate::error::{Error, Result};
use crate::image_processing::convert::ConvertOptions;
use crate::layout::LayoutConfig;
use crate::pdf::replicate::ReplicateOptions;
use crate::utils::CancelToken;

pub const DEFAULT_IMG_WIDTH_IN: f64 = 4.0;
pub const DEFAULT_IMG_HEIGHT_IN: f64 = 3.0;
pub const DEFAULT_MARGIN_IN: f64 = 0.125;
pub const DEFAULT_COLS: u32 = 2;
pub const DEFAULT_ROWS: u32 = 3;
pub const DEFAULT_DPI: u32 = 600;
pub const DEFAULT_OUTPUT: &str = "layout.pdf";
pub const DEFAULT_JPEG_QUALITY: u8 = 95;

/// Raster formats the converter can write
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq, Hash, Display, EnumString)]
#[strum(ascii_case_insensitive)]
pub enum OutputFormat {
    /// JPEG (JPG is accepted as an alias)
    #[value(name = "JPEG", alias = "JPG")]
    #[strum(serialize = "JPEG", serialize = "JPG", to_string = "JPEG")]
    Jpeg,
    /// Lossless PNG
    #[value(name = "PNG")]
    #[strum(serialize = "PNG")]
    Png,
    /// WebP
    #[value(name = "WEBP")]
    #[strum(serialize = "WEBP")]
    Webp,
}

impl OutputFormat {
    /// Parse a user supplied format name (JPEG, JPG, PNG, WEBP, any case)
    pub fn parse(name: &str) -> Result<Self> {
        name.trim()
            .parse::<OutputFormat>()
            .map_err(|_| Error::UnsupportedFormat {
                format: name.to_string(),
            })
    }

    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Jpeg => "jpg",
            OutputFormat::Png => "png",
            OutputFormat::Webp => "webp",
        }
    }

    pub fn image_format(&self) -> image::ImageFormat {
        match self {
            OutputFormat::Jpeg => image::ImageFormat::Jpeg,
            OutputFormat::Png => image::ImageFormat::Png,
            OutputFormat::Webp => image::ImageFormat::WebP,
        }
    }
}

/// Named paper sizes for the layout composer
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq, Display, EnumString)]
pub enum PageSize {
    /// US Letter, 8.5" x 11"
    #[value(name = "letter")]
    #[strum(serialize = "letter")]
    Letter,
    /// ISO A4, 210mm x 297mm
    #[value(name = "A4")]
    #[strum(serialize = "A4")]
    A4,
    /// US Legal, 8.5" x 14"
    #[value(name = "legal")]
    #[strum(serialize = "legal")]
    Legal,
}

impl PageSize {
    /// Look up a page size by its exact name
    pub fn from_name(name: &str) -> Result<Self> {
        name.parse::<PageSize>()
            .map_err(|_| Error::UnknownPageSize {
                name: name.to_string(),
            })
    }

    /// Page dimensions in points (width, height)
    pub fn dimensions_pt(&self) -> (f64, f64) {
        match self {
            PageSize::Letter => (612.0, 792.0),
            PageSize::A4 => (210.0 / 25.4 * 72.0, 297.0 / 25.4 * 72.0),
            PageSize::Legal => (612.0, 1008.0),
        }
    }
}

#[derive(Parser, Debug)]
#[command(
    name = "heic-convert",
    about = "Convert HEIC images to other formats",
    long_about = "
Convert every HEIC file in a directory to JPEG, PNG or WEBP.

Output files are written next to their source as <stem>.<ext>. Decoding goes
through ImageMagick ('magick' or 'convert' must be on the PATH).

Example Usage:
  # Convert the current directory to JPEG using all cores
  heic-convert

  # PNG output, remove the originals once converted, one file at a time
  heic-convert -d ~/Photos/import -f png --delete-original --no-parallel"
)]
pub struct ConvertArgs {
    /// Directory containing HEIC files (default: current directory)
    #[arg(short = 'd', long = "directory", default_value = ".", value_name = "DIR")]
    pub directory: PathBuf,

    /// Output format
    #[arg(short = 'f', long = "format", default_value = "JPEG", ignore_case = true)]
    pub format: OutputFormat,

    /// Delete original HEIC files after conversion (default: keep them)
    #[arg(long = "delete-original")]
    pub delete_original: bool,

    /// Process images sequentially (default is parallel)
    #[arg(long = "no-parallel")]
    pub no_parallel: bool,

    /// Number of parallel jobs (0 = auto-detect CPU cores)
    #[arg(short = 'j', long = "jobs", default_value = "0", value_name = "N")]
    pub jobs: usize,

    /// Emit one JSON object per line instead of human readable text
    #[arg(long = "json")]
    pub json: bool,

    /// Enable verbose output
    #[arg(short = 'v', long = "verbose")]
    pub verbose: bool,
}

impl ConvertArgs {
    pub fn parallel(&self) -> bool {
        !self.no_parallel
    }

    pub fn to_options(&self) -> ConvertOptions {
        ConvertOptions {
            directory: self.directory.clone(),
            format: self.format,
            delete_original: self.delete_original,
            parallel: self.parallel(),
            jobs: self.jobs,
            ..ConvertOptions::default()
        }
    }
}

#[derive(Parser, Debug)]
#[command(
    name = "photo-layout",
    about = "Generate PDF layout from JPEG images",
    long_about = "
Arrange the JPEG images of a directory into a printable grid, one PDF page per
full grid. Portrait photos are turned to landscape, cropped to the cell ratio
and resampled to the requested DPI.

Example Usage:
  # Six 4x3 prints per letter page
  photo-layout -d ~/Photos/print

  # Nine 3x2 prints per A4 page at 300 DPI
  photo-layout -d ~/Photos/print -w 3 --height 2 -c 3 -r 3 --dpi 300 -p A4 -o sheet.pdf"
)]
pub struct LayoutArgs {
    /// Directory containing input images (default: current directory)
    #[arg(short = 'd', long = "input-dir", default_value = ".", value_name = "DIR")]
    pub input_dir: PathBuf,

    /// Image width in inches
    #[arg(short = 'w', long = "width", default_value_t = DEFAULT_IMG_WIDTH_IN)]
    pub width: f64,

    /// Image height in inches
    #[arg(long = "height", default_value_t = DEFAULT_IMG_HEIGHT_IN)]
    pub height: f64,

    /// Margin between images in inches
    #[arg(short = 'm', long = "margin", default_value_t = DEFAULT_MARGIN_IN)]
    pub margin: f64,

    /// Number of columns
    #[arg(short = 'c', long = "cols", default_value_t = DEFAULT_COLS)]
    pub cols: u32,

    /// Number of rows
    #[arg(short = 'r', long = "rows", default_value_t = DEFAULT_ROWS)]
    pub rows: u32,

    /// DPI resolution for processed images
    #[arg(long = "dpi", default_value_t = DEFAULT_DPI)]
    pub dpi: u32,

    /// Page size
    #[arg(short = 'p', long = "page-size", default_value = "letter")]
    pub page_size: PageSize,

    /// Output PDF filename
    #[arg(short = 'o', long = "output", default_value = DEFAULT_OUTPUT, value_name = "FILE")]
    pub output: PathBuf,

    /// JPEG quality of the resampled images embedded in the PDF (1-100)
    #[arg(
        short = 'q',
        long = "quality",
        default_value_t = DEFAULT_JPEG_QUALITY,
        value_parser = clap::value_parser!(u8).range(1..=100)
    )]
    pub quality: u8,

    /// Emit one JSON object per line instead of human readable text
    #[arg(long = "json")]
    pub json: bool,

    /// Enable verbose output
    #[arg(short = 'v', long = "verbose")]
    pub verbose: bool,
}

impl LayoutArgs {
    pub fn to_config(&self) -> LayoutConfig {
        LayoutConfig {
            input_dir: self.input_dir.clone(),
            width_in: self.width,
            height_in: self.height,
            margin_in: self.margin,
            cols: self.cols,
            rows: self.rows,
            dpi: self.dpi,
            page_size: self.page_size,
            output: self.output.clone(),
            quality: self.quality,
            cancel: CancelToken::new(),
        }
    }
}

#[derive(Parser, Debug)]
#[command(
    name = "pdf-repeat-page",
    about = "Duplicate a specific page from a PDF multiple times"
)]
pub struct ReplicateArgs {
    /// Input PDF file path
    #[arg(short = 'i', long = "input", value_name = "FILE")]
    pub input: PathBuf,

    /// Output PDF file path
    #[arg(short = 'o', long = "output", value_name = "FILE")]
    pub output: PathBuf,

    /// Page number to duplicate (1-indexed)
    #[arg(short = 'p', long = "page")]
    pub page: u32,

    /// Number of copies to create
    #[arg(
        short = 'n',
        long = "copies",
        value_parser = clap::value_parser!(u32).range(1..)
    )]
    pub copies: u32,

    /// Enable verbose output
    #[arg(short = 'v', long = "verbose")]
    pub verbose: bool,
}

impl ReplicateArgs {
    pub fn to_options(&self) -> ReplicateOptions {
        ReplicateOptions {
            input: self.input.clone(),
            output: self.output.clone(),
            page: self.page,
            copies: self.copies,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_output_format() {
        assert_eq!(OutputFormat::parse("JPEG").unwrap(), OutputFormat::Jpeg);
        assert_eq!(OutputFormat::parse("jpg").unwrap(), OutputFormat::Jpeg);
        assert_eq!(OutputFormat::parse("Png").unwrap(), OutputFormat::Png);
        assert_eq!(OutputFormat::parse("webp").unwrap(), OutputFormat::Webp);

        let err = OutputFormat::parse("gif").unwrap_err();
        assert!(matches!(err, Error::UnsupportedFormat { .. }));
    }

    #[test]
    fn test_output_format_extensions() {
        assert_eq!(OutputFormat::Jpeg.extension(), "jpg");
        assert_eq!(OutputFormat::Png.extension(), "png");
        assert_eq!(OutputFormat::Webp.extension(), "webp");
        assert_eq!(OutputFormat::Jpeg.to_string(), "JPEG");
    }

    #[test]
    fn test_page_size_lookup() {
        assert_eq!(PageSize::from_name("letter").unwrap(), PageSize::Letter);
        assert_eq!(PageSize::from_name("A4").unwrap(), PageSize::A4);
        assert_eq!(PageSize::from_name("legal").unwrap(), PageSize::Legal);
        assert!(PageSize::from_name("tabloid").is_err());

        let (w, h) = PageSize::A4.dimensions_pt();
        assert!((w - 595.2756).abs() < 0.001);
        assert!((h - 841.8898).abs() < 0.001);
        assert_eq!(PageSize::Letter.dimensions_pt(), (612.0, 792.0));
    }

    #[test]
    fn test_convert_args_defaults() {
        let args = ConvertArgs::parse_from(["heic-convert"]);
        assert_eq!(args.directory, PathBuf::from("."));
        assert_eq!(args.format, OutputFormat::Jpeg);
        assert!(!args.delete_original);
        assert!(args.parallel());

        let args = ConvertArgs::parse_from(["heic-convert", "-f", "jpg", "--no-parallel"]);
        assert_eq!(args.format, OutputFormat::Jpeg);
        assert!(!args.parallel());

        assert!(ConvertArgs::try_parse_from(["heic-convert", "-f", "bmp"]).is_err());
    }

    #[test]
    fn test_layout_args_defaults() {
        let args = LayoutArgs::parse_from(["photo-layout"]);
        let config = args.to_config();
        assert_eq!(config.width_in, 4.0);
        assert_eq!(config.height_in, 3.0);
        assert_eq!(config.margin_in, 0.125);
        assert_eq!((config.cols, config.rows), (2, 3));
        assert_eq!(config.dpi, 600);
        assert_eq!(config.page_size, PageSize::Letter);
        assert_eq!(config.output, PathBuf::from("layout.pdf"));

        assert!(LayoutArgs::try_parse_from(["photo-layout", "-p", "tabloid"]).is_err());
    }

    #[test]
    fn test_replicate_args_require_copies() {
        let args = ReplicateArgs::parse_from([
            "pdf-repeat-page", "-i", "in.pdf", "-o", "out.pdf", "-p", "2", "-n", "3",
        ]);
        assert_eq!(args.page, 2);
        assert_eq!(args.copies, 3);

        assert!(ReplicateArgs::try_parse_from([
            "pdf-repeat-page", "-i", "in.pdf", "-o", "out.pdf", "-p", "2", "-n", "0",
        ])
        .is_err());
    }
}
