//! Command implementation for the bionic-epub CLI.

use anyhow::{Context, bail};

use crate::cli::args::{BionicArgs, OutputFormat};
use crate::cli::output::{ProcessReport, output_result};
use crate::epub::Stylesheet;
use crate::pipeline::BionicProcessor;

/// Process the book named on the command line.
pub fn execute_command(args: BionicArgs) -> anyhow::Result<()> {
    args.validate_input()?;

    let output = args.output_path();
    if output == args.input {
        bail!(
            "output path {} would overwrite the input; choose another with --output",
            output.display()
        );
    }

    let config = args.load_config().context("invalid configuration")?;
    let stylesheet = match &args.css {
        Some(path) => Stylesheet::from_file(path, &config.annotation.classes)?,
        None => Stylesheet::for_classes(&config.annotation.classes),
    };

    if args.verbosity() > 0 && args.output_format == OutputFormat::Human {
        println!("Processing EPUB: {}", args.input.display());
    }

    let processor = BionicProcessor::new(config)?;
    log::debug!("{processor:?}");

    let summary = processor
        .process_file(&args.input, &output, &stylesheet)
        .with_context(|| format!("failed to process {}", args.input.display()))?;

    output_result(
        "EPUB processing completed",
        &ProcessReport {
            input: args.input.display().to_string(),
            output: output.display().to_string(),
            summary,
        },
        &args,
    )?;

    Ok(())
}
