use clap::Args;

use crate::cli::OutputFormat;
use crate::dict::{resolve_dictionary, SequenceDictionary};
use crate::source::Source;

#[derive(Args)]
pub struct DictArgs {
    /// Input file or URL (VCF, BCF, SAM, BAM, CRAM, FASTA, fasta index,
    /// sequence dictionary, or interval list)
    #[arg(required = true)]
    pub input: String,
}

/// Execute dict subcommand
///
/// # Errors
///
/// Returns an error if the input cannot be classified, opened, or yields no
/// sequence dictionary.
#[allow(clippy::needless_pass_by_value)] // CLI entry point, values from clap
pub fn run(args: DictArgs, format: OutputFormat, verbose: bool) -> anyhow::Result<()> {
    let source = Source::classify(args.input.as_str().into())
        .ok_or_else(|| anyhow::anyhow!("unsupported input: {}", args.input))?;

    if verbose {
        eprintln!("Resolving sequence dictionary for {source}");
    }

    let dictionary = resolve_dictionary(&source)?;

    if verbose {
        eprintln!("Resolved {} sequences", dictionary.len());
    }

    match format {
        OutputFormat::Text => print_text(&dictionary),
        OutputFormat::Json => print_json(&dictionary)?,
        OutputFormat::Tsv => print_tsv(&dictionary),
    }

    Ok(())
}

fn print_text(dictionary: &SequenceDictionary) {
    println!("{} sequences", dictionary.len());

    for record in dictionary {
        match &record.md5 {
            Some(md5) => println!("  {}  length={}  md5={md5}", record.name, record.length),
            None => println!("  {}  length={}", record.name, record.length),
        }
    }
}

fn print_json(dictionary: &SequenceDictionary) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(dictionary)?);
    Ok(())
}

fn print_tsv(dictionary: &SequenceDictionary) {
    println!("name\tlength\tmd5");

    for record in dictionary {
        println!(
            "{}\t{}\t{}",
            record.name,
            record.length,
            record.md5.as_deref().unwrap_or("")
        );
    }
}
