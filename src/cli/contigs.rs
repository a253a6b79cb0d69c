use clap::Args;

use crate::cli::OutputFormat;
use crate::contigs::extract_mapped_contigs;
use crate::source::Source;

#[derive(Args)]
pub struct ContigsArgs {
    /// Input file or URL (indexed VCF, BCF, BAM, or CRAM)
    #[arg(required = true)]
    pub input: String,
}

/// Execute contigs subcommand
///
/// # Errors
///
/// Returns an error if the input cannot be classified, is not indexed, or
/// its index cannot be read.
#[allow(clippy::needless_pass_by_value)] // CLI entry point, values from clap
pub fn run(args: ContigsArgs, format: OutputFormat, verbose: bool) -> anyhow::Result<()> {
    let source = Source::classify(args.input.as_str().into())
        .ok_or_else(|| anyhow::anyhow!("unsupported input: {}", args.input))?;

    if verbose {
        eprintln!("Extracting mapped contigs from the index of {source}");
    }

    let contigs = extract_mapped_contigs(&source)?;

    if verbose {
        eprintln!("Found {} contigs with mapped records", contigs.len());
    }

    match format {
        OutputFormat::Text => print_text(&contigs),
        OutputFormat::Json => print_json(&contigs)?,
        OutputFormat::Tsv => print_tsv(&contigs),
    }

    Ok(())
}

fn print_text(contigs: &[String]) {
    if contigs.is_empty() {
        eprintln!("No contigs with mapped records.");
        return;
    }

    for contig in contigs {
        println!("{contig}");
    }
}

fn print_json(contigs: &[String]) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(contigs)?);
    Ok(())
}

fn print_tsv(contigs: &[String]) {
    println!("contig");

    for contig in contigs {
        println!("{contig}");
    }
}
