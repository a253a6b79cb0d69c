//! Known reference builds and dictionary-to-build matching.
//!
//! A build is identified by a set of predicates over a dictionary, all of
//! which must hold. The catalog is an ordered list: earlier entries win, so
//! more specific builds (decoy-bearing variants, patched releases) must be
//! declared before the plain build they extend.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::dict::SequenceDictionary;
use crate::error::{ProbeError, Result};

/// Catalog version for compatibility checking.
pub const CATALOG_VERSION: &str = "1.0.0";

/// One condition a dictionary must satisfy to be called a build.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BuildPredicate {
    /// A contig with this name and exactly this length must be present.
    ContigLength { name: String, length: u64 },

    /// A contig with exactly this MD5 checksum must be present.
    ContigMd5 { md5: String },
}

impl BuildPredicate {
    /// Tests the predicate against a dictionary.
    ///
    /// With `resolve_chromosome`, length predicates compare names after
    /// normalization so that builds authored against one chromosome-naming
    /// convention still match dictionaries using another. MD5 predicates
    /// always compare exactly; checksums are unambiguous.
    pub fn test(&self, dict: &SequenceDictionary, resolve_chromosome: bool) -> bool {
        match self {
            Self::ContigLength { name, length } => {
                if resolve_chromosome {
                    let wanted = simple_chromosome_name(name);

                    dict.iter().any(|record| {
                        record.length == *length && simple_chromosome_name(&record.name) == wanted
                    })
                } else {
                    dict.get(name).is_some_and(|record| record.length == *length)
                }
            }
            Self::ContigMd5 { md5 } => dict
                .iter()
                .any(|record| record.md5.as_deref() == Some(md5.as_str())),
        }
    }
}

/// Lowercases, strips a leading `chr`, and maps a bare `m` to `mt`, so that
/// `chr1`/`1` and `M`/`MT`/`chrM`/`chrMT` compare equal.
fn simple_chromosome_name(name: &str) -> String {
    let lower = name.to_lowercase();
    let stripped = lower.strip_prefix("chr").unwrap_or(&lower);

    if stripped == "m" {
        "mt".to_string()
    } else {
        stripped.to_string()
    }
}

/// A known reference build and the predicates that identify it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Build {
    pub id: String,
    pub organism: String,
    pub version: String,
    pub contigs: Vec<BuildPredicate>,
}

/// Serializable catalog format.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogData {
    pub version: String,
    pub builds: Vec<Build>,
}

/// An ordered collection of known builds.
#[derive(Debug, Clone, Default)]
pub struct BuildCatalog {
    builds: Vec<Build>,
}

impl BuildCatalog {
    /// Creates an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads the embedded default catalog.
    ///
    /// # Errors
    ///
    /// Returns [`ProbeError::Config`] if the embedded JSON is malformed.
    pub fn load_embedded() -> Result<Self> {
        const EMBEDDED_CATALOG: &str = include_str!("../catalogs/builds.json");
        Self::from_json(EMBEDDED_CATALOG)
    }

    /// Loads the embedded catalog, degrading to an empty catalog on error.
    ///
    /// Build identification is an optional enrichment, so a broken catalog
    /// is logged rather than treated as fatal.
    pub fn load_default() -> Self {
        match Self::load_embedded() {
            Ok(catalog) => catalog,
            Err(e) => {
                warn!(error = %e, "embedded build catalog failed to load; continuing with none");
                Self::new()
            }
        }
    }

    /// Loads a catalog from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns [`ProbeError::Io`] if the file cannot be read and
    /// [`ProbeError::Config`] if it does not parse.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ProbeError::io(path.display().to_string(), e))?;
        Self::from_json(&content)
    }

    /// Parses a catalog from a JSON string.
    ///
    /// # Errors
    ///
    /// Returns [`ProbeError::Config`] if the JSON is malformed.
    pub fn from_json(json: &str) -> Result<Self> {
        let data: CatalogData = serde_json::from_str(json)?;

        if data.version != CATALOG_VERSION {
            warn!(
                expected = CATALOG_VERSION,
                found = data.version.as_str(),
                "build catalog version mismatch"
            );
        }

        Ok(Self {
            builds: data.builds,
        })
    }

    /// Appends a build; declaration order is priority order.
    pub fn add_build(&mut self, build: Build) {
        self.builds.push(build);
    }

    pub fn builds(&self) -> &[Build] {
        &self.builds
    }

    pub fn len(&self) -> usize {
        self.builds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.builds.is_empty()
    }

    /// Gets a build by ID.
    pub fn get(&self, id: &str) -> Option<&Build> {
        self.builds.iter().find(|b| b.id == id)
    }

    /// Returns the first build whose predicates all hold for the dictionary.
    ///
    /// A build with no predicates never matches; it would otherwise claim
    /// every dictionary.
    pub fn match_build(
        &self,
        dict: &SequenceDictionary,
        resolve_chromosome: bool,
    ) -> Option<&Build> {
        self.builds.iter().find(|build| {
            !build.contigs.is_empty()
                && build
                    .contigs
                    .iter()
                    .all(|predicate| predicate.test(dict, resolve_chromosome))
        })
    }

    /// Exports the catalog to JSON.
    ///
    /// # Errors
    ///
    /// Returns [`ProbeError::Config`] if serialization fails.
    pub fn to_json(&self) -> Result<String> {
        let data = CatalogData {
            version: CATALOG_VERSION.to_string(),
            builds: self.builds.clone(),
        };

        Ok(serde_json::to_string_pretty(&data)?)
    }
}
