use std::collections::BTreeSet;

use clap::Args;

use crate::cli::OutputFormat;
use crate::samples::extract_samples;
use crate::source::Source;

#[derive(Args)]
pub struct SamplesArgs {
    /// Input file or URL (VCF, BCF, SAM, BAM, CRAM, or interval list)
    #[arg(required = true)]
    pub input: String,

    /// Read-group attribute to collect from SAM-style headers (ignored for VCF)
    #[arg(long, default_value = "SM")]
    pub attribute: String,
}

/// Execute samples subcommand
///
/// # Errors
///
/// Returns an error if the input cannot be classified or its header cannot
/// be read.
#[allow(clippy::needless_pass_by_value)] // CLI entry point, values from clap
pub fn run(args: SamplesArgs, format: OutputFormat, verbose: bool) -> anyhow::Result<()> {
    let source = Source::classify(args.input.as_str().into())
        .ok_or_else(|| anyhow::anyhow!("unsupported input: {}", args.input))?;

    if verbose {
        eprintln!("Extracting samples from {source}");
    }

    let samples = extract_samples(&source, Some(&args.attribute))?;

    if verbose {
        eprintln!("Found {} samples", samples.len());
    }

    match format {
        OutputFormat::Text => print_text(&samples),
        OutputFormat::Json => print_json(&samples)?,
        OutputFormat::Tsv => print_tsv(&samples),
    }

    Ok(())
}

fn print_text(samples: &BTreeSet<String>) {
    if samples.is_empty() {
        eprintln!("No samples found.");
        return;
    }

    for sample in samples {
        println!("{sample}");
    }
}

fn print_json(samples: &BTreeSet<String>) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(samples)?);
    Ok(())
}

fn print_tsv(samples: &BTreeSet<String>) {
    println!("sample");

    for sample in samples {
        println!("{sample}");
    }
}
