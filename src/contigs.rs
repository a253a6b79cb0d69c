//! Mapped-contig extraction from alignment and variant indexes.
//!
//! The data files themselves are never scanned: presence of aligned records
//! on a contig is read from a sibling index (tabix, CSI, BAI, or CRAI). The
//! output preserves reference order, so contigs come back in dictionary
//! order even when the index stores them otherwise.

use noodles::bam;
use noodles::cram;
use noodles::csi;
use noodles::csi::binning_index::ReferenceSequence as _;
use noodles::csi::BinningIndex;
use noodles::tabix;
use tracing::debug;

use crate::dict::SequenceDictionary;
use crate::error::{ProbeError, Result};
use crate::header;
use crate::source::{self, Source};

/// Extracts the contigs known to carry at least one mapped record.
///
/// Decision order: block-compressed sources consult a tabix sibling; BAM
/// and CRAM sources use their native index formats, read against their own
/// header dictionary; other local sources check for a CSI sibling. The
/// native formats come first because an alignment file may also carry a
/// bare CSI sibling, which knows no contig names and would shadow a
/// perfectly usable `.bai`.
///
/// # Errors
///
/// Returns [`ProbeError::Io`] when no applicable index exists (`not
/// indexed`), when an index carries no contig names, or for formats with no
/// index convention at all.
pub fn extract_mapped_contigs(source: &Source) -> Result<Vec<String>> {
    if source::is_block_compressed(source) {
        return tabix_contigs(source);
    }

    if source::is_bam(source) {
        return bam_mapped_contigs(source);
    }

    if source::is_cram(source) {
        return cram_mapped_contigs(source);
    }

    if let Some(sibling) = local_csi_sibling(source)? {
        return csi_contigs(&sibling);
    }

    Err(ProbeError::io(
        source.to_string(),
        std::io::Error::new(
            std::io::ErrorKind::Unsupported,
            "cannot extract contigs from this format",
        ),
    ))
}

/// Tabix indexes store per-contig presence directly, so the index's name
/// list is the answer.
fn tabix_contigs(source: &Source) -> Result<Vec<String>> {
    let sibling = source.resolve_sibling(&format!("{}.tbi", source.file_name()))?;
    let sibling_id = sibling.to_string();

    let index = tabix::io::Reader::new(sibling.open()?)
        .read_index()
        .map_err(|e| ProbeError::io(sibling_id.as_str(), e))?;

    Ok(index
        .header()
        .map(|h| {
            h.reference_sequence_names()
                .iter()
                .map(|name| name.to_string())
                .collect()
        })
        .unwrap_or_default())
}

fn local_csi_sibling(source: &Source) -> Result<Option<Source>> {
    if !source.is_local() {
        return Ok(None);
    }

    let sibling = source.resolve_sibling(&format!("{}.csi", source.file_name()))?;

    match &sibling {
        Source::Local(path) if path.exists() => Ok(Some(sibling)),
        _ => Ok(None),
    }
}

/// A CSI sibling only answers the question when its aux block carries the
/// tabix-style name table; a bare binning index does not know contig names.
fn csi_contigs(sibling: &Source) -> Result<Vec<String>> {
    let sibling_id = sibling.to_string();

    let index = csi::io::Reader::new(sibling.open()?)
        .read_index()
        .map_err(|e| ProbeError::io(sibling_id.as_str(), e))?;

    index
        .header()
        .map(|h| {
            h.reference_sequence_names()
                .iter()
                .map(|name| name.to_string())
                .collect()
        })
        .ok_or_else(|| {
            ProbeError::io(
                sibling_id.as_str(),
                std::io::Error::other("index carries no contig names"),
            )
        })
}

fn bam_mapped_contigs(source: &Source) -> Result<Vec<String>> {
    let name = source.file_name();

    let mut candidates = vec![format!("{name}.bai")];
    candidates.extend(name.rsplit_once('.').map(|(stem, _)| format!("{stem}.bai")));

    let (sibling, stream) = open_index_stream(source, &candidates)?;
    let sibling_id = sibling.to_string();

    let index = bam::bai::io::Reader::new(stream)
        .read_index()
        .map_err(|e| ProbeError::io(sibling_id.as_str(), e))?;

    let dict = SequenceDictionary::from_sam_header(&header::decode_alignment_header(source)?);

    Ok(mapped_names_from_bai(&index, &dict))
}

fn cram_mapped_contigs(source: &Source) -> Result<Vec<String>> {
    let candidates = [format!("{}.crai", source.file_name())];

    let (sibling, stream) = open_index_stream(source, &candidates)?;
    let sibling_id = sibling.to_string();

    let index = cram::crai::Reader::new(stream)
        .read_index()
        .map_err(|e| ProbeError::io(sibling_id.as_str(), e))?;

    let dict = SequenceDictionary::from_sam_header(&header::decode_alignment_header(source)?);

    Ok(mapped_names_from_crai(&index, &dict))
}

/// Opens the first index candidate that answers. Candidates that fail to
/// open are logged and skipped; running out of candidates means the source
/// is not indexed.
fn open_index_stream(
    source: &Source,
    candidates: &[String],
) -> Result<(Source, Box<dyn std::io::Read>)> {
    for name in candidates {
        let sibling = source.resolve_sibling(name)?;

        match sibling.open() {
            Ok(stream) => return Ok((sibling, stream)),
            Err(e) => debug!(index = %name, error = %e, "index candidate not openable"),
        }
    }

    Err(ProbeError::io(
        source.to_string(),
        std::io::Error::new(std::io::ErrorKind::NotFound, "not indexed"),
    ))
}

/// A contig is mapped iff the index holds aggregate metadata for it with a
/// nonzero aligned-record count.
fn mapped_names_from_bai(index: &bam::bai::Index, dict: &SequenceDictionary) -> Vec<String> {
    dict.iter()
        .enumerate()
        .filter(|(i, _)| {
            index
                .reference_sequences()
                .get(*i)
                .and_then(|rs| rs.metadata())
                .is_some_and(|metadata| metadata.mapped_record_count() > 0)
        })
        .map(|(_, record)| record.name.clone())
        .collect()
}

/// A contig is mapped iff any index record points at it. The CRAM index has
/// no aggregate counts, but every slice with records on a contig lands in
/// the index, so record presence is equivalent.
fn mapped_names_from_crai(index: &cram::crai::Index, dict: &SequenceDictionary) -> Vec<String> {
    dict.iter()
        .enumerate()
        .filter(|(i, _)| {
            index
                .iter()
                .any(|record| record.reference_sequence_id() == Some(*i))
        })
        .map(|(_, record)| record.name.clone())
        .collect()
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;
    use crate::dict::SequenceRecord;

    fn bgzf_compress(raw: &[u8]) -> Vec<u8> {
        let mut writer = noodles::bgzf::Writer::new(Vec::new());
        writer.write_all(raw).unwrap();
        writer.finish().unwrap()
    }

    /// Tabix layout: format, name/begin/end columns, comment char, skip,
    /// then the NUL-delimited name table.
    fn tabix_header_bytes(names: &[&str]) -> Vec<u8> {
        let mut bytes = Vec::new();

        for v in [2i32, 1, 2, 0, i32::from(b'#'), 0] {
            bytes.extend_from_slice(&v.to_le_bytes());
        }

        let mut table = Vec::new();
        for name in names {
            table.extend_from_slice(name.as_bytes());
            table.push(0);
        }

        bytes.extend_from_slice(&(table.len() as i32).to_le_bytes());
        bytes.extend_from_slice(&table);
        bytes
    }

    fn tbi_bytes(names: &[&str]) -> Vec<u8> {
        let mut raw = b"TBI\x01".to_vec();
        raw.extend_from_slice(&(names.len() as i32).to_le_bytes());
        raw.extend_from_slice(&tabix_header_bytes(names));

        // Per reference: no bins, no linear-index intervals.
        for _ in names {
            raw.extend_from_slice(&0i32.to_le_bytes());
            raw.extend_from_slice(&0i32.to_le_bytes());
        }

        bgzf_compress(&raw)
    }

    fn csi_bytes(names: &[&str], with_names: bool) -> Vec<u8> {
        let mut raw = b"CSI\x01".to_vec();
        raw.extend_from_slice(&14i32.to_le_bytes());
        raw.extend_from_slice(&5i32.to_le_bytes());

        if with_names {
            let aux = tabix_header_bytes(names);
            raw.extend_from_slice(&(aux.len() as i32).to_le_bytes());
            raw.extend_from_slice(&aux);
        } else {
            raw.extend_from_slice(&0i32.to_le_bytes());
        }

        raw.extend_from_slice(&(names.len() as i32).to_le_bytes());
        for _ in names {
            raw.extend_from_slice(&0i32.to_le_bytes());
        }

        bgzf_compress(&raw)
    }

    fn bam_bytes(refs: &[(&str, i32)]) -> Vec<u8> {
        let mut text = String::from("@HD\tVN:1.6\n");
        for (name, len) in refs {
            text.push_str(&format!("@SQ\tSN:{name}\tLN:{len}\n"));
        }

        let mut raw = b"BAM\x01".to_vec();
        raw.extend_from_slice(&(text.len() as i32).to_le_bytes());
        raw.extend_from_slice(text.as_bytes());
        raw.extend_from_slice(&(refs.len() as i32).to_le_bytes());

        for (name, len) in refs {
            raw.extend_from_slice(&((name.len() + 1) as i32).to_le_bytes());
            raw.extend_from_slice(name.as_bytes());
            raw.push(0);
            raw.extend_from_slice(&len.to_le_bytes());
        }

        bgzf_compress(&raw)
    }

    /// Raw BAI bytes; `Some((mapped, unmapped))` writes the metadata
    /// pseudo-bin for that reference.
    fn bai_bytes(refs: &[Option<(u64, u64)>]) -> Vec<u8> {
        let mut raw = b"BAI\x01".to_vec();
        raw.extend_from_slice(&(refs.len() as i32).to_le_bytes());

        for counts in refs {
            match counts {
                Some((mapped, unmapped)) => {
                    raw.extend_from_slice(&1i32.to_le_bytes());
                    raw.extend_from_slice(&37450u32.to_le_bytes());
                    raw.extend_from_slice(&2i32.to_le_bytes());
                    raw.extend_from_slice(&0u64.to_le_bytes());
                    raw.extend_from_slice(&4096u64.to_le_bytes());
                    raw.extend_from_slice(&mapped.to_le_bytes());
                    raw.extend_from_slice(&unmapped.to_le_bytes());
                }
                None => raw.extend_from_slice(&0i32.to_le_bytes()),
            }

            raw.extend_from_slice(&0i32.to_le_bytes());
        }

        raw
    }

    fn crai_index(text: &str) -> cram::crai::Index {
        let mut encoder =
            flate2::write::GzEncoder::new(Vec::new(), flate2::Compression::default());
        encoder.write_all(text.as_bytes()).unwrap();

        let bytes = encoder.finish().unwrap();

        cram::crai::Reader::new(&bytes[..]).read_index().unwrap()
    }

    fn local(path: std::path::PathBuf) -> Source {
        Source::classify(path.into()).unwrap()
    }

    #[test]
    fn test_tabix_sibling_names() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("calls.vcf.gz"), b"contents never read").unwrap();
        std::fs::write(
            dir.path().join("calls.vcf.gz.tbi"),
            tbi_bytes(&["chr1", "chr2"]),
        )
        .unwrap();

        let contigs = extract_mapped_contigs(&local(dir.path().join("calls.vcf.gz"))).unwrap();
        assert_eq!(contigs, ["chr1", "chr2"]);
    }

    #[test]
    fn test_tabix_empty_index() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("calls.vcf.gz"), b"contents never read").unwrap();
        std::fs::write(dir.path().join("calls.vcf.gz.tbi"), tbi_bytes(&[])).unwrap();

        let contigs = extract_mapped_contigs(&local(dir.path().join("calls.vcf.gz"))).unwrap();
        assert!(contigs.is_empty());
    }

    #[test]
    fn test_block_compressed_without_index() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("calls.vcf.gz"), b"contents never read").unwrap();

        let err = extract_mapped_contigs(&local(dir.path().join("calls.vcf.gz"))).unwrap_err();
        assert!(matches!(err, ProbeError::Io { .. }), "{err}");
    }

    #[test]
    fn test_csi_sibling_names() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("calls.bcf"), b"contents never read").unwrap();
        std::fs::write(
            dir.path().join("calls.bcf.csi"),
            csi_bytes(&["chrX", "chrY"], true),
        )
        .unwrap();

        let contigs = extract_mapped_contigs(&local(dir.path().join("calls.bcf"))).unwrap();
        assert_eq!(contigs, ["chrX", "chrY"]);
    }

    #[test]
    fn test_csi_sibling_without_names() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("calls.bcf"), b"contents never read").unwrap();
        std::fs::write(
            dir.path().join("calls.bcf.csi"),
            csi_bytes(&["chrX", "chrY"], false),
        )
        .unwrap();

        let err = extract_mapped_contigs(&local(dir.path().join("calls.bcf"))).unwrap_err();
        assert!(err.to_string().contains("no contig names"), "{err}");
    }

    #[test]
    fn test_bam_metadata_counts() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("reads.bam"),
            bam_bytes(&[("chr1", 1000), ("chr2", 2000), ("chr3", 3000)]),
        )
        .unwrap();
        std::fs::write(
            dir.path().join("reads.bam.bai"),
            bai_bytes(&[Some((5, 0)), None, Some((7, 2))]),
        )
        .unwrap();

        let contigs = extract_mapped_contigs(&local(dir.path().join("reads.bam"))).unwrap();
        assert_eq!(contigs, ["chr1", "chr3"]);
    }

    #[test]
    fn test_bam_zero_count_is_absent() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("reads.bam"),
            bam_bytes(&[("chr1", 1000), ("chr2", 2000)]),
        )
        .unwrap();
        std::fs::write(
            dir.path().join("reads.bam.bai"),
            bai_bytes(&[Some((0, 4)), Some((3, 0))]),
        )
        .unwrap();

        let contigs = extract_mapped_contigs(&local(dir.path().join("reads.bam"))).unwrap();
        assert_eq!(contigs, ["chr2"]);
    }

    #[test]
    fn test_bam_stem_index_fallback() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("sample.bam"),
            bam_bytes(&[("chr1", 1000), ("chr2", 2000)]),
        )
        .unwrap();
        std::fs::write(dir.path().join("sample.bai"), bai_bytes(&[None, Some((3, 0))]))
            .unwrap();

        let contigs = extract_mapped_contigs(&local(dir.path().join("sample.bam"))).unwrap();
        assert_eq!(contigs, ["chr2"]);
    }

    #[test]
    fn test_bam_bai_wins_over_bare_csi_sibling() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("reads.bam"),
            bam_bytes(&[("chr1", 1000), ("chr2", 2000)]),
        )
        .unwrap();
        std::fs::write(
            dir.path().join("reads.bam.bai"),
            bai_bytes(&[Some((5, 0)), None]),
        )
        .unwrap();
        // samtools index -c writes a CSI without the tabix name table
        std::fs::write(
            dir.path().join("reads.bam.csi"),
            csi_bytes(&["chr1", "chr2"], false),
        )
        .unwrap();

        let contigs = extract_mapped_contigs(&local(dir.path().join("reads.bam"))).unwrap();
        assert_eq!(contigs, ["chr1"]);
    }

    #[test]
    fn test_bam_not_indexed() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("reads.bam"), bam_bytes(&[("chr1", 1000)])).unwrap();

        let err = extract_mapped_contigs(&local(dir.path().join("reads.bam"))).unwrap_err();
        assert!(err.to_string().contains("not indexed"), "{err}");
    }

    #[test]
    fn test_crai_presence_in_dictionary_order() {
        let dict = SequenceDictionary::new(vec![
            SequenceRecord::new("1", 100),
            SequenceRecord::new("2", 200),
            SequenceRecord::new("3", 300),
        ]);

        // Two slices on the middle contig plus an unmapped entry.
        let index = crai_index("1\t1\t100\t200\t0\t300\n1\t101\t100\t500\t0\t300\n-1\t0\t0\t800\t0\t100\n");

        assert_eq!(mapped_names_from_crai(&index, &dict), ["2"]);
    }

    #[test]
    fn test_crai_multiple_contigs_reordered() {
        let dict = SequenceDictionary::new(vec![
            SequenceRecord::new("1", 100),
            SequenceRecord::new("2", 200),
            SequenceRecord::new("3", 300),
        ]);

        // Physical order 3 then 1; output follows the dictionary.
        let index = crai_index("2\t1\t50\t200\t0\t300\n0\t1\t50\t500\t0\t300\n");

        assert_eq!(mapped_names_from_crai(&index, &dict), ["1", "3"]);
    }

    #[test]
    fn test_cram_not_indexed() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("reads.cram"), b"contents never read").unwrap();

        let err = extract_mapped_contigs(&local(dir.path().join("reads.cram"))).unwrap_err();
        assert!(err.to_string().contains("not indexed"), "{err}");
    }

    #[test]
    fn test_unsupported_format() {
        let err = extract_mapped_contigs(&Source::classify("ref.fasta".into()).unwrap())
            .unwrap_err();
        assert!(err.to_string().contains("cannot extract contigs"), "{err}");
    }
}
