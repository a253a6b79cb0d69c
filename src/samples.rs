//! Sample-name extraction from variant and alignment headers.

use std::collections::BTreeSet;

use noodles::sam;
use noodles::sam::header::record::value::map::tag::Other;
use tracing::debug;

use crate::error::{ProbeError, Result};
use crate::header;
use crate::source::{self, Source};

/// Read-group attribute holding the sample name.
const DEFAULT_SAMPLE_ATTRIBUTE: &str = "SM";

/// Extracts the set of sample names a source declares.
///
/// Variant sources report the sample columns of their header. Alignment
/// sources and interval lists report the values of a read-group attribute,
/// `SM` unless `attribute` names another two-character tag; a blank
/// attribute falls back to the default. The result is sorted and
/// deduplicated.
///
/// # Errors
///
/// Returns [`ProbeError::Io`] with [`std::io::ErrorKind::Unsupported`] for
/// formats that carry no samples, and whatever the header decode raises.
pub fn extract_samples(source: &Source, attribute: Option<&str>) -> Result<BTreeSet<String>> {
    let source_id = source.to_string();

    if source::is_vcf(source) {
        let stream = crate::sniff::sniff(source.open()?, &source_id)?;
        let header = header::decode_vcf_header(stream, &source_id)?;

        return Ok(header.sample_names().iter().cloned().collect());
    }

    if source::is_alignment(source) || source::is_interval_list(source) {
        let header = if source::is_interval_list(source) {
            header::read_sam_text_header(source)?
        } else {
            header::decode_alignment_header(source)?
        };

        let attribute = attribute
            .map(str::trim)
            .filter(|a| !a.is_empty())
            .unwrap_or(DEFAULT_SAMPLE_ATTRIBUTE);

        return Ok(read_group_values(&header, attribute));
    }

    Err(ProbeError::io(
        source_id,
        std::io::Error::new(
            std::io::ErrorKind::Unsupported,
            "cannot extract samples from this format",
        ),
    ))
}

/// Collects the non-blank values of one read-group attribute across all
/// `@RG` lines. An attribute that cannot name a read-group tag (wrong width,
/// or a tag the codec treats as structural) matches nothing.
fn read_group_values(header: &sam::Header, attribute: &str) -> BTreeSet<String> {
    let mut values = BTreeSet::new();

    let Ok(bytes) = <[u8; 2]>::try_from(attribute.as_bytes()) else {
        debug!(attribute, "read-group attribute is not two characters");
        return values;
    };

    let Ok(tag) = Other::try_from(bytes) else {
        debug!(attribute, "read-group attribute is not addressable");
        return values;
    };

    for (_, map) in header.read_groups() {
        if let Some(value) = map.other_fields().get(&tag) {
            let value = value.to_string();

            if !value.trim().is_empty() {
                values.insert(value);
            }
        }
    }

    values
}
