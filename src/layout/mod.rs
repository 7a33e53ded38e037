//! Photo-sheet PDF layout
//!
//! JPEG images from one directory are arranged row by row into a grid of
//! fixed-size cells, one PDF page per full grid:
//! 1. Rotate portrait photos to landscape
//! 2. Crop to the cell aspect ratio, then resample to the target DPI
//! 3. Stage the result as a temporary JPEG and draw it centered in its cell

pub mod canvas;
pub mod geometry;

pub use canvas::PdfCanvas;
pub use geometry::{page_count, paginate, GridGeometry, Rect};

use image::codecs::jpeg::JpegEncoder;
use std::fs;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

use crate::cli::{PageSize, DEFAULT_JPEG_QUALITY};
use crate::error::{Error, Result};
use crate::image_processing::resize::{crop_and_resize, orient_landscape};
use crate::utils::{discover_files, CancelToken};

pub const JPEG_EXTENSIONS: [&str; 2] = ["jpg", "jpeg"];

#[derive(Debug, Clone)]
pub struct LayoutConfig {
    pub input_dir: PathBuf,
    pub width_in: f64,
    pub height_in: f64,
    pub margin_in: f64,
    pub cols: u32,
    pub rows: u32,
    pub dpi: u32,
    pub page_size: PageSize,
    pub output: PathBuf,
    /// Quality of the staged JPEGs embedded in the PDF
    pub quality: u8,
    /// Raised on Ctrl-C; checked between images
    pub cancel: CancelToken,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            input_dir: PathBuf::from("."),
            width_in: crate::cli::DEFAULT_IMG_WIDTH_IN,
            height_in: crate::cli::DEFAULT_IMG_HEIGHT_IN,
            margin_in: crate::cli::DEFAULT_MARGIN_IN,
            cols: crate::cli::DEFAULT_COLS,
            rows: crate::cli::DEFAULT_ROWS,
            dpi: crate::cli::DEFAULT_DPI,
            page_size: PageSize::Letter,
            output: PathBuf::from(crate::cli::DEFAULT_OUTPUT),
            quality: DEFAULT_JPEG_QUALITY,
            cancel: CancelToken::new(),
        }
    }
}

impl LayoutConfig {
    pub fn validate(&self) -> Result<()> {
        let positive = |value: f64| value.is_finite() && value > 0.0;

        if !positive(self.width_in) || !positive(self.height_in) {
            return Err(Error::InvalidArgument(format!(
                "Image size must be positive, got {}\" x {}\"",
                self.width_in, self.height_in
            )));
        }
        if !(self.margin_in.is_finite() && self.margin_in >= 0.0) {
            return Err(Error::InvalidArgument(format!(
                "Margin must not be negative, got {}\"",
                self.margin_in
            )));
        }
        if self.rows == 0 || self.cols == 0 {
            return Err(Error::InvalidArgument(format!(
                "Grid needs at least one row and one column, got {}x{}",
                self.rows, self.cols
            )));
        }
        if self.dpi == 0 {
            return Err(Error::InvalidArgument("DPI must be greater than 0".to_string()));
        }
        if self.quality == 0 || self.quality > 100 {
            return Err(Error::InvalidArgument(format!(
                "JPEG quality must be between 1 and 100, got {}",
                self.quality
            )));
        }

        let (width_px, height_px) = self.target_pixels();
        if width_px == 0 || height_px == 0 {
            return Err(Error::InvalidArgument(format!(
                "{}\" x {}\" at {} DPI is less than one pixel",
                self.width_in, self.height_in, self.dpi
            )));
        }
        Ok(())
    }

    /// Pixel size every image is resampled to
    pub fn target_pixels(&self) -> (u32, u32) {
        (
            (self.width_in * self.dpi as f64) as u32,
            (self.height_in * self.dpi as f64) as u32,
        )
    }

    /// Physical width / height ratio every image is cropped to
    pub fn target_ratio(&self) -> f64 {
        self.width_in / self.height_in
    }

    pub fn geometry(&self) -> GridGeometry {
        GridGeometry::new(
            self.page_size.dimensions_pt(),
            self.width_in,
            self.height_in,
            self.margin_in,
            self.rows,
            self.cols,
        )
    }
}

/// Which step of the per-image pipeline failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureStage {
    Processing,
    Placing,
}

/// Progress notifications from [`compose_layout`]
#[derive(Debug, Clone)]
pub enum LayoutEvent {
    /// The grid is larger than the page; the layout continues anyway
    GridDoesNotFit {
        total_width: f64,
        total_height: f64,
        page_width: f64,
        page_height: f64,
    },
    Started {
        images: usize,
    },
    Placing {
        path: PathBuf,
        page: usize,
        row: u32,
        col: u32,
    },
    Placed {
        path: PathBuf,
        page: usize,
        row: u32,
        col: u32,
    },
    Failed {
        path: PathBuf,
        stage: FailureStage,
        error: String,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct LayoutSummary {
    pub images_found: usize,
    pub placed: usize,
    pub failed: usize,
    pub pages: usize,
    /// `None` when there was nothing to lay out and no file was written
    pub output: Option<PathBuf>,
}

/// One photo cropped and resampled, staged as a temporary JPEG
pub struct PreparedImage {
    pub file: NamedTempFile,
    pub width_px: u32,
    pub height_px: u32,
}

/// Sorted `.jpg` / `.jpeg` files directly inside `dir`
pub fn discover_jpegs(dir: &Path) -> Result<Vec<PathBuf>> {
    discover_files(dir, &JPEG_EXTENSIONS)
}

/// Open, orient, crop, resample and stage one image.
pub fn prepare_image(path: &Path, config: &LayoutConfig) -> Result<PreparedImage> {
    let img = image::open(path)?.to_rgb8();
    let img = orient_landscape(img);

    let (width_px, height_px) = config.target_pixels();
    let processed = crop_and_resize(&img, config.target_ratio(), width_px, height_px)?;

    let stem = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    let mut file = tempfile::Builder::new()
        .prefix(&format!("temp_{}_", stem))
        .suffix(".jpg")
        .tempfile()?;

    {
        let mut writer = BufWriter::new(file.as_file_mut());
        let encoder = JpegEncoder::new_with_quality(&mut writer, config.quality);
        processed.write_with_encoder(encoder)?;
        writer.flush()?;
    }

    tracing::debug!(
        file = %path.display(),
        temp = %file.path().display(),
        width_px,
        height_px,
        "staged image"
    );

    Ok(PreparedImage {
        file,
        width_px,
        height_px,
    })
}

/// Draw a staged image centered in cell (`row`, `col`) of the open page
fn place_image(
    canvas: &mut PdfCanvas,
    geometry: &GridGeometry,
    prepared: &PreparedImage,
    row: u32,
    col: u32,
    dpi: u32,
) -> Result<()> {
    let (width_px, height_px) = image::image_dimensions(prepared.file.path())?;
    let jpeg = fs::read(prepared.file.path())?;
    let rect = geometry.place(row, col, width_px, height_px, dpi);
    canvas.draw_jpeg(jpeg, width_px, height_px, rect);
    Ok(())
}

/// Build the whole layout PDF described by `config`.
///
/// Invalid configuration or a missing input directory fail the call before
/// anything is written. A single image that cannot be processed or drawn is
/// reported through `on_event` and skipped; its cell stays empty. When the
/// directory holds no JPEG files nothing is written.
///
/// A raised `config.cancel` stops the run with `Error::Interrupted` before the
/// next image; the staged file of the current image is removed and no PDF is
/// written.
pub fn compose_layout<E>(config: &LayoutConfig, mut on_event: E) -> Result<LayoutSummary>
where
    E: FnMut(LayoutEvent),
{
    config.validate()?;
    let geometry = config.geometry();

    if !geometry.fits() {
        on_event(LayoutEvent::GridDoesNotFit {
            total_width: geometry.total_width(),
            total_height: geometry.total_height(),
            page_width: geometry.page_width,
            page_height: geometry.page_height,
        });
    }

    let images = discover_jpegs(&config.input_dir)?;
    if images.is_empty() {
        return Ok(LayoutSummary {
            images_found: 0,
            placed: 0,
            failed: 0,
            pages: 0,
            output: None,
        });
    }
    on_event(LayoutEvent::Started {
        images: images.len(),
    });

    let mut canvas = PdfCanvas::new(geometry.page_width, geometry.page_height);
    let per_page = geometry.per_page();
    let mut placed = 0;
    let mut failed = 0;

    for (page_index, page_images) in paginate(&images, config.rows, config.cols).enumerate() {
        let page_num = page_index + 1;

        for (idx, path) in page_images.iter().enumerate() {
            config.cancel.check()?;
            let (row, col) = geometry.cell_for_index(idx);
            on_event(LayoutEvent::Placing {
                path: path.clone(),
                page: page_num,
                row,
                col,
            });

            let prepared = match prepare_image(path, config) {
                Ok(prepared) => prepared,
                Err(e) => {
                    failed += 1;
                    on_event(LayoutEvent::Failed {
                        path: path.clone(),
                        stage: FailureStage::Processing,
                        error: e.to_string(),
                    });
                    continue;
                }
            };

            if config.cancel.is_cancelled() {
                drop(prepared);
                return Err(Error::Interrupted);
            }

            let drawn = place_image(&mut canvas, &geometry, &prepared, row, col, config.dpi);

            // The staged file goes away whether or not the draw worked
            let temp_path = prepared.file.path().to_path_buf();
            if let Err(e) = prepared.file.close() {
                tracing::warn!(temp = %temp_path.display(), error = %e, "could not remove temporary image");
            }

            match drawn {
                Ok(()) => {
                    placed += 1;
                    on_event(LayoutEvent::Placed {
                        path: path.clone(),
                        page: page_num,
                        row,
                        col,
                    });
                }
                Err(e) => {
                    failed += 1;
                    on_event(LayoutEvent::Failed {
                        path: path.clone(),
                        stage: FailureStage::Placing,
                        error: e.to_string(),
                    });
                }
            }
        }

        if page_num * per_page < images.len() {
            tracing::debug!(page = canvas.page_count(), "page complete");
            canvas.show_page()?;
        }
    }

    let pages = canvas.save(&config.output)?;
    debug_assert_eq!(pages, page_count(images.len(), per_page));
    tracing::debug!(output = %config.output.display(), pages, "layout saved");

    Ok(LayoutSummary {
        images_found: images.len(),
        placed,
        failed,
        pages,
        output: Some(config.output.clone()),
    })
}
