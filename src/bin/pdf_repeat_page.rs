use anyhow::{Context, Result};
use clap::Parser;
use console::style;
use std::process;

use photo_tools::cli::ReplicateArgs;
use photo_tools::pdf::replicate_page;
use photo_tools::utils::{error_println, init_tracing, verbose_println};
use photo_tools::Error;

fn main() {
    let args = ReplicateArgs::parse();
    init_tracing(args.verbose);

    if let Err(e) = run(&args) {
        error_println(&format!("{:#}", e));
        process::exit(1);
    }
}

fn run(args: &ReplicateArgs) -> Result<()> {
    // Nothing is staged on disk, so an interrupt can end the process right away
    ctrlc::set_handler(|| {
        println!("\nOperation cancelled by user");
        process::exit(1);
    })
    .context("Failed to install interrupt handler")?;

    let options = args.to_options();
    verbose_println(
        args.verbose,
        &format!(
            "Repeating page {} of '{}' {} times",
            options.page,
            options.input.display(),
            options.copies
        ),
    );

    match replicate_page(&options) {
        Ok(pages) => {
            verbose_println(args.verbose, &format!("Wrote {} pages", pages));
        }
        // Already names the page and the page count
        Err(e @ Error::PageOutOfRange { .. }) => return Err(e.into()),
        Err(e) => {
            return Err(e).with_context(|| format!("Failed to process '{}'", options.input.display()))
        }
    }

    println!(
        "{}",
        style(format!(
            "Generated {} with {} copies of page {}.",
            options.output.display(),
            options.copies,
            options.page
        ))
        .green()
    );
    Ok(())
}
