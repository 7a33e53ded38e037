//! Batch conversion of HEIC files to JPEG, PNG or WEBP.

use image::DynamicImage;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use super::batch::{run_batch, ExecutionMode};
use super::decode::SourceDecoder;
use crate::cli::OutputFormat;
use crate::error::{Error, Result};
use crate::utils::{discover_files, display_name, validate_directory, CancelToken};

pub const DEFAULT_SOURCE_EXTENSION: &str = "heic";

#[derive(Debug, Clone)]
pub struct ConvertOptions {
    pub directory: PathBuf,
    pub format: OutputFormat,
    pub delete_original: bool,
    pub parallel: bool,
    /// Worker count for parallel mode, 0 = one per CPU
    pub jobs: usize,
    /// Extension of the files to pick up, matched case-insensitively
    pub source_extension: String,
    /// Raised on Ctrl-C; files not started yet are skipped
    pub cancel: CancelToken,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("."),
            format: OutputFormat::Jpeg,
            delete_original: false,
            parallel: true,
            jobs: 0,
            source_extension: DEFAULT_SOURCE_EXTENSION.to_string(),
            cancel: CancelToken::new(),
        }
    }
}

/// Result of converting one source file
#[derive(Debug, Clone)]
pub struct ConversionOutcome {
    pub input: PathBuf,
    pub output: PathBuf,
    pub deleted_original: bool,
    pub result: std::result::Result<(), String>,
}

impl ConversionOutcome {
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }

    /// One-line human readable report for this file
    pub fn message(&self) -> String {
        let input_name = display_name(&self.input);
        match &self.result {
            Ok(()) => {
                let action = if self.deleted_original {
                    "Converted and deleted"
                } else {
                    "Converted"
                };
                format!(" {}: {} -> {}", action, input_name, display_name(&self.output))
            }
            Err(cause) => format!(" Failed to convert {}: {}", input_name, cause),
        }
    }
}

#[derive(Debug)]
pub struct ConversionSummary {
    /// One entry per discovered file, in path order
    pub outcomes: Vec<ConversionOutcome>,
    pub succeeded: usize,
    pub failed: usize,
    pub duration: Duration,
}

impl ConversionSummary {
    fn from_outcomes(outcomes: Vec<ConversionOutcome>, duration: Duration) -> Self {
        let succeeded = outcomes.iter().filter(|o| o.is_success()).count();
        let failed = outcomes.len() - succeeded;
        Self {
            outcomes,
            succeeded,
            failed,
            duration,
        }
    }

    pub fn total(&self) -> usize {
        self.outcomes.len()
    }
}

/// `<dir>/<stem>.<ext>` for a source file
pub fn output_path_for(input: &Path, format: OutputFormat) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_os_string())
        .unwrap_or_else(|| "image".into());
    let mut name = stem;
    name.push(".");
    name.push(format.extension());
    input.with_file_name(name)
}

/// Validate the directory and list the files to convert
pub fn discover_sources(options: &ConvertOptions) -> Result<Vec<PathBuf>> {
    validate_directory(&options.directory)?;
    discover_files(&options.directory, &[options.source_extension.as_str()])
}

/// Encode `img` in `format` at `output`.
fn write_image(img: DynamicImage, output: &Path, format: OutputFormat) -> Result<()> {
    let img = match format {
        // JPEG has no alpha channel
        OutputFormat::Jpeg => DynamicImage::ImageRgb8(img.to_rgb8()),
        OutputFormat::Webp if img.color().has_alpha() => DynamicImage::ImageRgba8(img.to_rgba8()),
        OutputFormat::Webp => DynamicImage::ImageRgb8(img.to_rgb8()),
        OutputFormat::Png => img,
    };
    img.save_with_format(output, format.image_format())?;
    Ok(())
}

/// Convert a single file: decode, write `<stem>.<ext>`, then optionally delete
/// the source. The source is only removed once the output has been written.
pub fn convert_one(
    input: &Path,
    options: &ConvertOptions,
    decoder: &dyn SourceDecoder,
) -> ConversionOutcome {
    let output = output_path_for(input, options.format);
    let result = convert_file(input, &output, options, decoder);

    if let Err(ref e) = result {
        tracing::debug!(file = %input.display(), error = %e, "conversion failed");
    }

    ConversionOutcome {
        input: input.to_path_buf(),
        output,
        deleted_original: matches!(result, Ok(true)),
        result: result.map(|_| ()).map_err(|e| e.to_string()),
    }
}

/// Returns whether the source was deleted
fn convert_file(
    input: &Path,
    output: &Path,
    options: &ConvertOptions,
    decoder: &dyn SourceDecoder,
) -> Result<bool> {
    options.cancel.check()?;
    let img = decoder.decode(input)?;
    tracing::debug!(
        file = %input.display(),
        width = img.width(),
        height = img.height(),
        "decoded"
    );

    write_image(img, output, options.format)?;

    if !options.delete_original {
        return Ok(false);
    }

    fs::remove_file(input).map_err(|e| {
        Error::Io(std::io::Error::new(
            e.kind(),
            format!("converted but could not delete original: {}", e),
        ))
    })?;
    Ok(true)
}

/// Convert every matching file in `options.directory`.
///
/// Invocation-level problems (missing directory) are returned as `Err`; a file
/// that fails only shows up as a failed outcome. `on_outcome` sees each outcome
/// as soon as it is ready.
pub fn convert_directory<C>(
    options: &ConvertOptions,
    decoder: &dyn SourceDecoder,
    on_outcome: C,
) -> Result<ConversionSummary>
where
    C: Fn(&ConversionOutcome) + Send + Sync,
{
    let start = Instant::now();
    let files = discover_sources(options)?;
    convert_files(&files, options, decoder, start, on_outcome)
}

/// Convert an already discovered list of files.
///
/// Returns `Error::Interrupted` if the cancel token was raised during the run;
/// outcomes of files skipped because of it are not reported.
pub fn convert_files<C>(
    files: &[PathBuf],
    options: &ConvertOptions,
    decoder: &dyn SourceDecoder,
    start: Instant,
    on_outcome: C,
) -> Result<ConversionSummary>
where
    C: Fn(&ConversionOutcome) + Send + Sync,
{
    let mode = ExecutionMode::from_flags(options.parallel, options.jobs);
    let outcomes = run_batch(
        files,
        mode,
        |file| convert_one(file, options, decoder),
        |outcome, _| {
            if !options.cancel.is_cancelled() {
                on_outcome(outcome)
            }
        },
    )?;
    options.cancel.check()?;

    Ok(ConversionSummary::from_outcomes(outcomes, start.elapsed()))
}
