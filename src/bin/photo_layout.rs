use anyhow::{Context, Result};
use clap::Parser;
use console::style;
use std::process;
use std::time::Instant;

use photo_tools::cli::LayoutArgs;
use photo_tools::json_output::JsonMessage;
use photo_tools::layout::{compose_layout, FailureStage, LayoutConfig, LayoutEvent};
use photo_tools::Error;
use photo_tools::utils::{
    display_name, error_println, format_duration, init_tracing, install_interrupt_handler,
    validate_directory, verbose_println, warn_println, CancelToken,
};

fn main() {
    let args = LayoutArgs::parse();
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

fn run(args: &LayoutArgs) -> Result<()> {
    let start = Instant::now();
    let cancel = CancelToken::new();
    install_interrupt_handler(&cancel)?;
    let config = LayoutConfig {
        cancel,
        ..args.to_config()
    };
    config.validate()?;
    validate_directory(&config.input_dir)?;

    let json = args.json;
    let on_event = |event: LayoutEvent| match event {
        LayoutEvent::GridDoesNotFit {
            total_width,
            total_height,
            page_width,
            page_height,
        } => {
            if !json {
                warn_println(&format!(
                    "Layout ({:.1} x {:.1} pts) may not fit on {} page ({:.1} x {:.1} pts)",
                    total_width, total_height, config.page_size, page_width, page_height
                ));
            }
        }
        LayoutEvent::Started { images } => {
            if !json {
                println!("Found {} images", images);
                println!(
                    "Creating {}x{} grid on {} page",
                    config.rows, config.cols, config.page_size
                );
                println!(
                    "Image size: {}\" x {}\" at {} DPI",
                    config.width_in, config.height_in, config.dpi
                );
            }
        }
        LayoutEvent::Placing {
            path,
            page,
            row,
            col,
        } => {
            if !json {
                println!(
                    "  Placing {} @ row {}, col {} on page {}",
                    display_name(&path),
                    row,
                    col,
                    page
                );
            }
        }
        LayoutEvent::Placed {
            path,
            page,
            row,
            col,
        } => {
            if json {
                JsonMessage::image_placed(&path, page, row, col).emit();
            }
        }
        LayoutEvent::Failed { path, stage, error } => {
            if json {
                JsonMessage::image_failed(&path, error).emit();
            } else {
                let action = match stage {
                    FailureStage::Processing => "processing",
                    FailureStage::Placing => "placing",
                };
                println!(
                    "{}",
                    style(format!("Error {} {}: {}", action, path.display(), error)).red()
                );
            }
        }
    };

    let summary = compose_layout(&config, on_event)
        .with_context(|| format!("Failed to create layout '{}'", config.output.display()))?;

    if json {
        JsonMessage::summary(
            summary.images_found,
            summary.placed,
            summary.failed,
            start.elapsed().as_secs_f64(),
        )
        .emit();
        return Ok(());
    }

    match summary.output {
        Some(output) => {
            println!(
                "{}",
                style(format!("PDF saved as: {}", output.display())).green().bold()
            );
            verbose_println(
                args.verbose,
                &format!(
                    "{} placed, {} failed, {} page(s) in {}",
                    summary.placed,
                    summary.failed,
                    summary.pages,
                    format_duration(start.elapsed())
                ),
            );
        }
        None => println!(
            "No JPEG images found in directory: {}",
            config.input_dir.display()
        ),
    }

    Ok(())
}
