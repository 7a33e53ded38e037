use anyhow::{Context, Result};
use clap::Parser;
use console::style;
use std::process;
use std::time::Instant;

use photo_tools::cli::ConvertArgs;
use photo_tools::image_processing::convert::{convert_files, discover_sources};
use photo_tools::image_processing::{
    is_imagemagick_available, ConversionOutcome, ConvertOptions, ImageMagickDecoder,
};
use photo_tools::json_output::JsonMessage;
use photo_tools::Error;
use photo_tools::utils::{
    create_progress_bar, error_println, format_duration, init_tracing, install_interrupt_handler,
    verbose_println, warn_println, CancelToken,
};

fn main() {
    let args = ConvertArgs::parse();
    init_tracing(args.verbose);

    if let Err(e) = run(&args) {
        let interrupted = e
            .downcast_ref::<Error>()
            .is_some_and(Error::is_interrupted);
        if interrupted {
            println!("\nOperation cancelled by user");
        } else {
            error_println(&format!("{:#}", e));
        }
        process::exit(1);
    }
}

fn run(args: &ConvertArgs) -> Result<()> {
    let start = Instant::now();
    let cancel = CancelToken::new();
    install_interrupt_handler(&cancel)?;
    let options = ConvertOptions {
        cancel,
        ..args.to_options()
    };

    if !args.json {
        println!(
            "Converting HEIC files in '{}' to {}...",
            options.directory.display(),
            options.format
        );
        println!("Delete original files: {}", options.delete_original);
        println!("Parallel processing: {}", options.parallel);
        println!("{}", "-".repeat(50));
    }

    let files = discover_sources(&options)?;
    if files.is_empty() {
        if args.json {
            JsonMessage::summary(0, 0, 0, start.elapsed().as_secs_f64()).emit();
        } else {
            println!("No HEIC files found in the specified directory.");
        }
        return Ok(());
    }
    verbose_println(args.verbose, &format!("Found {} HEIC files", files.len()));

    if !is_imagemagick_available() {
        warn_println(
            "ImageMagick not found; HEIC decoding will fail. Install it with: brew install imagemagick (macOS) or apt-get install imagemagick (Linux)",
        );
    }
    let decoder = ImageMagickDecoder::new();
    verbose_println(args.verbose, &format!("Decoding with '{}'", decoder.command()));

    let pb = if args.json {
        indicatif::ProgressBar::hidden()
    } else {
        create_progress_bar(files.len() as u64)
    };

    let report = |outcome: &ConversionOutcome| {
        if args.json {
            match &outcome.result {
                Ok(()) => JsonMessage::file_converted(
                    &outcome.input,
                    &outcome.output,
                    outcome.deleted_original,
                )
                .emit(),
                Err(cause) => JsonMessage::file_failed(&outcome.input, cause.as_str()).emit(),
            }
        } else if outcome.is_success() {
            pb.println(outcome.message());
        } else {
            pb.println(style(outcome.message()).red().to_string());
        }
        pb.inc(1);
    };

    let summary = convert_files(&files, &options, &decoder, start, report);
    pb.finish_and_clear();
    let summary = summary.context("Conversion failed")?;

    if args.json {
        JsonMessage::summary(
            summary.total(),
            summary.succeeded,
            summary.failed,
            summary.duration.as_secs_f64(),
        )
        .emit();
        return Ok(());
    }

    println!("{}", "-".repeat(50));
    let counts = format!(
        "Conversion complete: {} successful, {} failed",
        summary.succeeded, summary.failed
    );
    if summary.failed == 0 {
        println!("{}", style(counts).green().bold());
    } else {
        println!("{}", style(counts).yellow().bold());
    }
    verbose_println(
        args.verbose,
        &format!("Finished in {}", format_duration(summary.duration)),
    );

    Ok(())
}
