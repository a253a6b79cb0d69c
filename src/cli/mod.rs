//! Command-line interface for hts-probe.
//!
//! This module implements the CLI using clap. Available commands:
//!
//! - **dict**: Resolve the sequence dictionary of a genomic file
//! - **samples**: List the sample names a file declares
//! - **contigs**: List contigs carrying mapped records, read from the index
//! - **build**: Identify the reference build a file was created against
//!
//! ## Usage
//!
//! ```text
//! # Resolve the dictionary of a BAM file
//! hts-probe dict sample.bam
//!
//! # Works on remote files too
//! hts-probe dict https://example.com/cohort/calls.vcf.gz
//!
//! # JSON output for scripting
//! hts-probe samples calls.vcf --format json
//!
//! # Read-group libraries instead of samples
//! hts-probe samples sample.bam --attribute LB
//!
//! # Which build was this aligned to?
//! hts-probe build sample.bam
//! ```

use clap::{Parser, Subcommand};

pub mod build;
pub mod contigs;
pub mod dict;
pub mod samples;

#[derive(Parser)]
#[command(name = "hts-probe")]
#[command(author = "Fulcrum Genomics")]
#[command(version)]
#[command(about = "Probe genomic files for dictionaries, samples, mapped contigs, and builds")]
#[command(
    long_about = "hts-probe extracts metadata from genomic files without a full parse.\n\nIt reads only headers and sibling indexes, so it is fast on large files and works on remote URLs as well as local paths. Supported formats: VCF, BCF, SAM, BAM, CRAM, FASTA (via .dict/.fai siblings), fasta indexes, sequence dictionaries, and interval lists."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output format
    #[arg(short, long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Resolve the sequence dictionary of a file or URL
    Dict(dict::DictArgs),

    /// List the sample names a file declares
    Samples(samples::SamplesArgs),

    /// List contigs with mapped records, read from the file's index
    Contigs(contigs::ContigsArgs),

    /// Identify the reference build a file was created against
    Build(build::BuildArgs),
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
    Tsv,
}
