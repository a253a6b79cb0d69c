//! Build command - identify the reference build behind a file's dictionary.
//!
//! The file's sequence dictionary is resolved first, then matched against the
//! embedded catalog (or one supplied with `--catalog`). Naming conventions
//! are resolved by default so that `chr1` and `1`, or `chrM` and `MT`, count
//! as the same chromosome; `--exact` turns that off.

use std::path::PathBuf;

use clap::Args;
use tracing::warn;

use crate::builds::{Build, BuildCatalog};
use crate::cli::OutputFormat;
use crate::dict::resolve_dictionary;
use crate::source::Source;

#[derive(Args)]
pub struct BuildArgs {
    /// Input file or URL; its sequence dictionary is matched against the
    /// build catalog
    #[arg(required = true)]
    pub input: String,

    /// Path to a custom build catalog (JSON); defaults to the embedded catalog
    #[arg(long)]
    pub catalog: Option<PathBuf>,

    /// Require exact contig names instead of resolving naming conventions
    /// (chr prefixes, M vs MT)
    #[arg(long)]
    pub exact: bool,
}

/// Execute build subcommand
///
/// # Errors
///
/// Returns an error if the input cannot be classified or yields no sequence
/// dictionary. A catalog that fails to load is not an error: matching
/// degrades to "no known build".
#[allow(clippy::needless_pass_by_value)] // CLI entry point, values from clap
pub fn run(args: BuildArgs, format: OutputFormat, verbose: bool) -> anyhow::Result<()> {
    let source = Source::classify(args.input.as_str().into())
        .ok_or_else(|| anyhow::anyhow!("unsupported input: {}", args.input))?;

    if verbose {
        eprintln!("Resolving sequence dictionary for {source}");
    }

    let dictionary = resolve_dictionary(&source)?;

    if verbose {
        eprintln!("Resolved {} sequences", dictionary.len());
    }

    let catalog = match &args.catalog {
        Some(path) => match BuildCatalog::load_from_file(path) {
            Ok(catalog) => catalog,
            Err(e) => {
                warn!(error = %e, "failed to load build catalog, no builds will match");
                BuildCatalog::new()
            }
        },
        None => BuildCatalog::load_default(),
    };

    if verbose {
        eprintln!("Matching against {} known builds", catalog.len());
    }

    let matched = catalog.match_build(&dictionary, !args.exact);

    match format {
        OutputFormat::Text => print_text(matched),
        OutputFormat::Json => print_json(matched)?,
        OutputFormat::Tsv => print_tsv(matched),
    }

    Ok(())
}

fn print_text(matched: Option<&Build>) {
    match matched {
        Some(build) => {
            println!("{}", build.id);
            println!("  organism: {}", build.organism);
            println!("  version: {}", build.version);
        }
        None => eprintln!("No known build matched."),
    }
}

fn print_json(matched: Option<&Build>) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(&matched)?);
    Ok(())
}

fn print_tsv(matched: Option<&Build>) {
    println!("id\torganism\tversion");

    if let Some(build) = matched {
        println!("{}\t{}\t{}", build.id, build.organism, build.version);
    }
}
