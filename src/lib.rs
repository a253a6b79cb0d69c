//! # hts-probe
//!
//! A library for probing genomic files for their metadata: sequence
//! dictionaries, sample names, mapped contigs, and reference builds.
//!
//! Pipelines routinely receive files whose provenance is unclear. Which
//! reference was this BAM aligned to? Which samples does this VCF carry?
//! Which contigs actually hold data? Answering those questions should not
//! require a full pass over a multi-gigabyte file.
//!
//! `hts-probe` reads only what it needs: file headers, sibling dictionaries
//! and fasta indexes, and alignment indexes (tabix, CSI, BAI, CRAI). Inputs
//! may be local paths or HTTP(S) URLs, and gzip compression is detected and
//! unwrapped transparently.
//!
//! ## Features
//!
//! - **Format detection**: VCF, BCF, SAM, BAM, CRAM, FASTA, fasta indexes,
//!   sequence dictionaries, and interval lists, classified by suffix
//! - **Dictionary resolution**: Each format resolves its sequence
//!   dictionary from a header or sibling file, with fallbacks
//! - **Sample extraction**: VCF sample columns and alignment read-group
//!   attributes
//! - **Mapped contigs**: Contig names with aligned data, read from the
//!   file's index rather than its records
//! - **Build matching**: A dictionary is matched against a catalog of known
//!   reference builds, tolerating naming-convention drift (chr prefixes,
//!   M vs MT)
//!
//! ## Example
//!
//! ```rust,no_run
//! use hts_probe::{resolve_dictionary, BuildCatalog, Source};
//!
//! // Classify the input and resolve its sequence dictionary
//! let source = Source::classify("sample.bam".into()).unwrap();
//! let dictionary = resolve_dictionary(&source).unwrap();
//!
//! // Match it against the catalog of known builds
//! let catalog = BuildCatalog::load_default();
//! match catalog.match_build(&dictionary, true) {
//!     Some(build) => println!("{} ({})", build.id, build.organism),
//!     None => println!("unknown build"),
//! }
//! ```
//!
//! ## Modules
//!
//! - [`source`]: Input classification and suffix-based format predicates
//! - [`sniff`]: Leading-byte detection and transparent gzip unwrapping
//! - [`header`]: VCF/BCF and SAM/BAM/CRAM header readers
//! - [`dict`]: Sequence-dictionary resolution across formats
//! - [`samples`]: Sample-name extraction
//! - [`contigs`]: Mapped-contig extraction from indexes
//! - [`builds`]: Reference-build catalog and matching
//! - [`cli`]: Command-line interface implementation

pub mod builds;
pub mod cli;
pub mod contigs;
pub mod dict;
pub mod error;
pub mod header;
pub mod samples;
pub mod sniff;
pub mod source;

// Re-export commonly used types for convenience
pub use builds::{Build, BuildCatalog, BuildPredicate};
pub use contigs::extract_mapped_contigs;
pub use dict::{resolve_dictionary, SequenceDictionary, SequenceRecord};
pub use error::{ProbeError, Result};
pub use samples::extract_samples;
pub use source::{Source, SourceInput};
