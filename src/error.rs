//! Error types shared across the crate.

use thiserror::Error;

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, ProbeError>;

/// Errors raised while probing genomic sources.
///
/// Every variant except `Config` names the source it was raised for, so a
/// caller working through a batch of files can tell which one failed and
/// whether the failure was a format mismatch, a missing dictionary, or an
/// I/O problem.
#[derive(Error, Debug)]
pub enum ProbeError {
    /// The source's suffix or magic bytes do not match the requested operation.
    #[error("{source_id}: format error: {detail}")]
    Format { source_id: String, detail: String },

    /// No strategy produced a non-empty sequence dictionary.
    #[error("{source_id}: dictionary error: {detail}")]
    Dictionary { source_id: String, detail: String },

    /// The underlying stream failed: unreachable resource, premature
    /// end-of-stream, or a missing index.
    #[error("{source_id}: IO error: {source}")]
    Io {
        source_id: String,
        #[source]
        source: std::io::Error,
    },

    /// A build catalog could not be parsed.
    #[error("invalid build catalog: {0}")]
    Config(String),
}

impl ProbeError {
    pub fn format(source_id: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::Format {
            source_id: source_id.into(),
            detail: detail.into(),
        }
    }

    pub fn dictionary(source_id: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::Dictionary {
            source_id: source_id.into(),
            detail: detail.into(),
        }
    }

    pub fn io(source_id: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            source_id: source_id.into(),
            source,
        }
    }
}

impl From<serde_json::Error> for ProbeError {
    fn from(e: serde_json::Error) -> Self {
        Self::Config(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages_carry_source() {
        let err = ProbeError::format("/data/sample.bam", "not a VCF");
        assert_eq!(err.to_string(), "/data/sample.bam: format error: not a VCF");

        let err = ProbeError::dictionary("https://example.com/calls.vcf", "no sequences found");
        assert!(err.to_string().starts_with("https://example.com/calls.vcf"));
    }

    #[test]
    fn test_io_error_preserves_kind() {
        let inner = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err = ProbeError::io("sample.bam", inner);
        match err {
            ProbeError::Io { source, .. } => {
                assert_eq!(source.kind(), std::io::ErrorKind::NotFound);
            }
            _ => panic!("expected Io variant"),
        }
    }
}
