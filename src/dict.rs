//! Sequence dictionaries and their resolution from genomic sources.
//!
//! A [`SequenceDictionary`] is the ordered list of sequences a source is
//! described against. Every supported format carries one somewhere: variant
//! headers in `##contig` lines, alignment headers in `@SQ` lines, FASTA
//! files in a `.dict` or `.fai` sibling, and fasta indexes in their own
//! columns. [`resolve_dictionary`] knows where to look for each format.

use std::io::{BufRead, BufReader, Read};

use noodles::sam;
use noodles::sam::header::record::value::map::tag::Other;
use serde::Serialize;
use tracing::debug;

use crate::error::{ProbeError, Result};
use crate::header;
use crate::source::{self, Source};

/// A single sequence entry: a name, a length, and an optional MD5 checksum
/// of the sequence bases.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SequenceRecord {
    pub name: String,
    pub length: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub md5: Option<String>,
}

impl SequenceRecord {
    pub fn new(name: impl Into<String>, length: u64) -> Self {
        Self {
            name: name.into(),
            length,
            md5: None,
        }
    }

    pub fn with_md5(mut self, md5: impl Into<String>) -> Self {
        self.md5 = Some(md5.into());
        self
    }
}

/// An ordered collection of [`SequenceRecord`]s.
///
/// Order is meaningful and always mirrors the order of the source it was
/// read from.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SequenceDictionary {
    pub records: Vec<SequenceRecord>,
}

impl SequenceDictionary {
    pub fn new(records: Vec<SequenceRecord>) -> Self {
        Self { records }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Looks up a record by exact sequence name.
    pub fn get(&self, name: &str) -> Option<&SequenceRecord> {
        self.records.iter().find(|r| r.name == name)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, SequenceRecord> {
        self.records.iter()
    }

    /// Builds a dictionary from the `@SQ` lines of a SAM-style header.
    pub fn from_sam_header(header: &sam::Header) -> Self {
        let mut records = Vec::new();

        for (name, map) in header.reference_sequences() {
            let mut record = SequenceRecord::new(name.to_string(), map.length().get() as u64);

            if let Ok(m5_tag) = Other::try_from(*b"M5") {
                if let Some(value) = map.other_fields().get(&m5_tag) {
                    record.md5 = Some(value.to_string());
                }
            }

            records.push(record);
        }

        Self::new(records)
    }
}

impl<'a> IntoIterator for &'a SequenceDictionary {
    type Item = &'a SequenceRecord;
    type IntoIter = std::slice::Iter<'a, SequenceRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

/// Resolves the sequence dictionary for a source, dispatching on its suffix.
///
/// Variant sources are read from their own header (`##contig` lines, through
/// the BCF framing when present). FASTA sources look for a `.dict` sibling
/// first and fall back to a `.fai` sibling. Fasta indexes, `.dict` files,
/// interval lists, and alignment sources are read directly.
///
/// # Errors
///
/// Returns [`ProbeError::Dictionary`] if the format is not one a dictionary
/// can be resolved from or the resolved dictionary has no sequences, and the
/// underlying [`ProbeError::Format`] or [`ProbeError::Io`] if reading fails.
pub fn resolve_dictionary(source: &Source) -> Result<SequenceDictionary> {
    let source_id = source.to_string();

    let dict = if source::is_vcf(source) {
        let stream = crate::sniff::sniff(source.open()?, &source_id)?;
        let text = header::read_vcf_header_text(stream, &source_id)?;
        dictionary_from_vcf_text(&text, &source_id)?
    } else if source::is_fasta_index(source) {
        let stream = crate::sniff::sniff(source.open()?, &source_id)?;
        dictionary_from_fai(stream.into_reader(), &source_id)?
    } else if source::is_fasta(source) {
        resolve_fasta_siblings(source)?
    } else if source::is_dictionary(source) || source::is_interval_list(source) {
        SequenceDictionary::from_sam_header(&header::read_sam_text_header(source)?)
    } else if source::is_alignment(source) {
        SequenceDictionary::from_sam_header(&header::decode_alignment_header(source)?)
    } else {
        return Err(ProbeError::dictionary(
            source_id,
            "unrecognized format for dictionary resolution",
        ));
    };

    if dict.is_empty() {
        return Err(ProbeError::dictionary(source_id, "no sequences found"));
    }

    Ok(dict)
}

/// Looks next to a FASTA file for its dictionary, preferring `<stem>.dict`
/// over `<name>.fai`.
fn resolve_fasta_siblings(source: &Source) -> Result<SequenceDictionary> {
    let name = source.file_name();
    let dict_name = sibling_dict_name(&name);

    match read_sibling_dict(source, &dict_name) {
        Ok(dict) => Ok(dict),
        Err(e) => {
            debug!(source = %source, error = %e, "no usable .dict sibling, trying .fai");

            let sibling = source.resolve_sibling(&format!("{name}.fai"))?;
            let stream = crate::sniff::sniff(sibling.open()?, &sibling.to_string())?;
            dictionary_from_fai(stream.into_reader(), &sibling.to_string())
        }
    }
}

fn read_sibling_dict(source: &Source, dict_name: &str) -> Result<SequenceDictionary> {
    let sibling = source.resolve_sibling(dict_name)?;
    let dict = SequenceDictionary::from_sam_header(&header::read_sam_text_header(&sibling)?);

    if dict.is_empty() {
        return Err(ProbeError::dictionary(
            sibling.to_string(),
            "sequence dictionary file has no @SQ lines",
        ));
    }

    Ok(dict)
}

/// `sample.fasta` looks for `sample.dict`; a bare name gets `.dict` appended.
fn sibling_dict_name(file_name: &str) -> String {
    match file_name.rsplit_once('.') {
        Some((stem, _)) => format!("{stem}.dict"),
        None => format!("{file_name}.dict"),
    }
}

/// Parses fasta index text leniently: sequence name and length from the
/// first two tab-separated columns, anything further ignored.
fn dictionary_from_fai(reader: Box<dyn Read>, source_id: &str) -> Result<SequenceDictionary> {
    let mut records = Vec::new();

    for line in BufReader::new(reader).lines() {
        let line = line.map_err(|e| ProbeError::io(source_id, e))?;

        if line.is_empty() {
            continue;
        }

        let mut fields = line.split('\t');
        let name = fields.next().unwrap_or("");
        let length = fields.next().ok_or_else(|| {
            ProbeError::format(source_id, "fasta index line has no length column")
        })?;

        let length = length.parse().map_err(|_| {
            ProbeError::format(source_id, format!("invalid sequence length: {length}"))
        })?;

        records.push(SequenceRecord::new(name, length));
    }

    Ok(SequenceDictionary::new(records))
}

/// Scans `##contig=<...>` lines out of VCF header text.
fn dictionary_from_vcf_text(text: &str, source_id: &str) -> Result<SequenceDictionary> {
    let mut records = Vec::new();

    for line in text.lines() {
        if !line.starts_with("##contig=") {
            if line.starts_with("#CHROM") {
                break;
            }

            continue;
        }

        if let Some(record) = parse_contig_line(line, source_id)? {
            records.push(record);
        }
    }

    if records.is_empty() {
        return Err(ProbeError::dictionary(
            source_id,
            "no ##contig lines in VCF header",
        ));
    }

    Ok(SequenceDictionary::new(records))
}

/// Parses one `##contig=<ID=...,length=...,md5=...>` line. Lines without an
/// `ID` field are skipped; a missing `length` is recorded as zero, matching
/// how a contig of unknown length is conventionally represented.
fn parse_contig_line(line: &str, source_id: &str) -> Result<Option<SequenceRecord>> {
    let body = line
        .strip_prefix("##contig=<")
        .and_then(|s| s.strip_suffix('>'))
        .ok_or_else(|| {
            ProbeError::format(source_id, format!("malformed contig line: {line}"))
        })?;

    let mut name: Option<String> = None;
    let mut length: Option<u64> = None;
    let mut md5: Option<String> = None;

    for field in split_contig_fields(body) {
        if let Some((key, value)) = field.split_once('=') {
            let value = value.trim().trim_matches('"');

            match key.trim().to_lowercase().as_str() {
                "id" => name = Some(value.to_string()),
                "length" => length = value.parse().ok(),
                "md5" => md5 = Some(value.to_string()),
                _ => {}
            }
        }
    }

    Ok(name.map(|name| SequenceRecord {
        name,
        length: length.unwrap_or(0),
        md5,
    }))
}

/// Splits `key=value` fields on commas, except inside double quotes.
///
/// Commas are single-byte ASCII, so `i + 1` after one is always a valid
/// character boundary.
fn split_contig_fields(body: &str) -> Vec<&str> {
    let mut fields = Vec::new();
    let mut start = 0;
    let mut in_quotes = false;

    for (i, c) in body.char_indices() {
        match c {
            '"' => in_quotes = !in_quotes,
            ',' if !in_quotes => {
                fields.push(&body[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }

    fields.push(&body[start..]);
    fields
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    const DICT_TEXT: &str =
        "@HD\tVN:1.6\n@SQ\tSN:chr1\tLN:248956422\tM5:6aef897c3d6ff0c78aff06ac189178dd\n@SQ\tSN:chrM\tLN:16569\n";

    const VCF_TEXT: &str = "##fileformat=VCFv4.2\n\
        ##contig=<ID=chr1,length=248956422>\n\
        ##contig=<ID=chr2,length=242193529,md5=f98db672eb0993dcfdabafe2a882905c>\n\
        #CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO\n";

    fn sam_header(text: &str) -> sam::Header {
        let mut reader = sam::io::Reader::new(text.as_bytes());
        reader.read_header().unwrap()
    }

    fn fai(text: &str) -> Result<SequenceDictionary> {
        dictionary_from_fai(Box::new(std::io::Cursor::new(text.as_bytes().to_vec())), "test")
    }

    #[test]
    fn test_from_sam_header() {
        let dict = SequenceDictionary::from_sam_header(&sam_header(DICT_TEXT));

        assert_eq!(dict.len(), 2);
        assert_eq!(dict.records[0].name, "chr1");
        assert_eq!(dict.records[0].length, 248956422);
        assert_eq!(
            dict.records[0].md5.as_deref(),
            Some("6aef897c3d6ff0c78aff06ac189178dd")
        );
        assert_eq!(dict.records[1].name, "chrM");
        assert!(dict.records[1].md5.is_none());
    }

    #[test]
    fn test_get_is_exact() {
        let dict = SequenceDictionary::new(vec![
            SequenceRecord::new("chr1", 100),
            SequenceRecord::new("1", 200),
        ]);

        assert_eq!(dict.get("chr1").map(|r| r.length), Some(100));
        assert_eq!(dict.get("1").map(|r| r.length), Some(200));
        assert!(dict.get("CHR1").is_none());
    }

    #[test]
    fn test_fai_ignores_extra_columns() {
        let dict = fai("chr1\t248956422\t112\t70\t71\nchr2\t242193529\n").unwrap();

        assert_eq!(dict.len(), 2);
        assert_eq!(dict.records[0].name, "chr1");
        assert_eq!(dict.records[0].length, 248956422);
        assert_eq!(dict.records[1].length, 242193529);
    }

    #[test]
    fn test_fai_skips_blank_lines() {
        let dict = fai("chr1\t100\n\nchr2\t200\n").unwrap();
        assert_eq!(dict.len(), 2);
    }

    #[test]
    fn test_fai_missing_length_column() {
        let err = fai("chr1\n").unwrap_err();
        assert!(err.to_string().contains("no length column"), "{err}");
    }

    #[test]
    fn test_fai_bad_length() {
        let err = fai("chr1\tlots\n").unwrap_err();
        assert!(err.to_string().contains("invalid sequence length"), "{err}");
    }

    #[test]
    fn test_vcf_contig_scan() {
        let dict = dictionary_from_vcf_text(VCF_TEXT, "test").unwrap();

        assert_eq!(dict.len(), 2);
        assert_eq!(dict.records[0].name, "chr1");
        assert!(dict.records[0].md5.is_none());
        assert_eq!(
            dict.records[1].md5.as_deref(),
            Some("f98db672eb0993dcfdabafe2a882905c")
        );
    }

    #[test]
    fn test_vcf_contig_without_length() {
        let text = "##fileformat=VCFv4.2\n##contig=<ID=HLA-A*01:01:01:01>\n#CHROM\tPOS\n";
        let dict = dictionary_from_vcf_text(text, "test").unwrap();

        assert_eq!(dict.records[0].name, "HLA-A*01:01:01:01");
        assert_eq!(dict.records[0].length, 0);
    }

    #[test]
    fn test_vcf_contig_quoted_comma() {
        let text = "##fileformat=VCFv4.2\n\
            ##contig=<ID=chr1,length=100,description=\"first, longest\">\n\
            #CHROM\tPOS\n";
        let dict = dictionary_from_vcf_text(text, "test").unwrap();

        assert_eq!(dict.len(), 1);
        assert_eq!(dict.records[0].length, 100);
    }

    #[test]
    fn test_vcf_without_contigs() {
        let err = dictionary_from_vcf_text("##fileformat=VCFv4.2\n#CHROM\tPOS\n", "test")
            .unwrap_err();
        assert!(matches!(err, ProbeError::Dictionary { .. }), "{err}");
    }

    #[test]
    fn test_md5_skipped_in_json_when_absent() {
        let value = serde_json::to_value(SequenceRecord::new("chr1", 100)).unwrap();
        assert!(value.get("md5").is_none());

        let with = serde_json::to_value(SequenceRecord::new("chr1", 100).with_md5("abc")).unwrap();
        assert_eq!(with["md5"], "abc");
    }

    #[test]
    fn test_resolve_dict_file() {
        let mut file = tempfile::NamedTempFile::with_suffix(".dict").unwrap();
        file.write_all(DICT_TEXT.as_bytes()).unwrap();

        let source = Source::classify(file.path().to_path_buf().into()).unwrap();
        let dict = resolve_dictionary(&source).unwrap();

        assert_eq!(dict.len(), 2);
        assert_eq!(dict.records[0].name, "chr1");

        // Resolution opens a fresh stream each time, so repeating it agrees.
        assert_eq!(resolve_dictionary(&source).unwrap(), dict);
    }

    #[test]
    fn test_resolve_fai_file() {
        let mut file = tempfile::NamedTempFile::with_suffix(".fai").unwrap();
        file.write_all(b"chr1\t100\t6\t70\t71\n").unwrap();

        let source = Source::classify(file.path().to_path_buf().into()).unwrap();
        let dict = resolve_dictionary(&source).unwrap();

        assert_eq!(dict.len(), 1);
        assert_eq!(dict.records[0].length, 100);
    }

    #[test]
    fn test_resolve_sam_file() {
        let mut file = tempfile::NamedTempFile::with_suffix(".sam").unwrap();
        file.write_all(DICT_TEXT.as_bytes()).unwrap();

        let source = Source::classify(file.path().to_path_buf().into()).unwrap();
        assert_eq!(resolve_dictionary(&source).unwrap().len(), 2);
    }

    #[test]
    fn test_resolve_interval_list() {
        let mut file = tempfile::NamedTempFile::with_suffix(".interval_list").unwrap();
        file.write_all(b"@HD\tVN:1.6\n@SQ\tSN:chr1\tLN:100\nchr1\t1\t50\t+\tregion\n")
            .unwrap();

        let source = Source::classify(file.path().to_path_buf().into()).unwrap();
        let dict = resolve_dictionary(&source).unwrap();

        assert_eq!(dict.len(), 1);
        assert_eq!(dict.records[0].name, "chr1");
    }

    #[test]
    fn test_resolve_vcf_and_gzipped_vcf() {
        let mut plain = tempfile::NamedTempFile::with_suffix(".vcf").unwrap();
        plain.write_all(VCF_TEXT.as_bytes()).unwrap();

        let source = Source::classify(plain.path().to_path_buf().into()).unwrap();
        let dict = resolve_dictionary(&source).unwrap();
        assert_eq!(dict.len(), 2);

        let mut gz = tempfile::NamedTempFile::with_suffix(".vcf.gz").unwrap();
        let mut encoder =
            flate2::write::GzEncoder::new(Vec::new(), flate2::Compression::default());
        encoder.write_all(VCF_TEXT.as_bytes()).unwrap();
        gz.write_all(&encoder.finish().unwrap()).unwrap();

        let source = Source::classify(gz.path().to_path_buf().into()).unwrap();
        assert_eq!(resolve_dictionary(&source).unwrap(), dict);
    }

    #[test]
    fn test_resolve_bcf_file() {
        let mut text = VCF_TEXT.as_bytes().to_vec();
        text.push(0);

        let mut bytes = b"BCF\x02\x02".to_vec();
        bytes.extend_from_slice(&(text.len() as i32).to_le_bytes());
        bytes.extend_from_slice(&text);

        let mut file = tempfile::NamedTempFile::with_suffix(".bcf").unwrap();
        file.write_all(&bytes).unwrap();

        let source = Source::classify(file.path().to_path_buf().into()).unwrap();
        let dict = resolve_dictionary(&source).unwrap();

        assert_eq!(dict.len(), 2);
        assert_eq!(
            dict.records[1].md5.as_deref(),
            Some("f98db672eb0993dcfdabafe2a882905c")
        );
    }

    #[test]
    fn test_resolve_fasta_prefers_dict_sibling() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("ref.fasta"), ">chr1\nACGT\n").unwrap();
        std::fs::write(dir.path().join("ref.dict"), DICT_TEXT).unwrap();
        std::fs::write(dir.path().join("ref.fasta.fai"), "other\t999\n").unwrap();

        let source = Source::classify(dir.path().join("ref.fasta").into()).unwrap();
        let dict = resolve_dictionary(&source).unwrap();

        assert_eq!(dict.records[0].name, "chr1");
        assert_eq!(dict.records[0].length, 248956422);
    }

    #[test]
    fn test_resolve_fasta_falls_back_to_fai() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("ref.fa"), ">chr1\nACGT\n").unwrap();
        std::fs::write(dir.path().join("ref.fa.fai"), "chr1\t4\t6\t70\t71\n").unwrap();

        let source = Source::classify(dir.path().join("ref.fa").into()).unwrap();
        let dict = resolve_dictionary(&source).unwrap();

        assert_eq!(dict.len(), 1);
        assert_eq!(dict.records[0].length, 4);
    }

    #[test]
    fn test_resolve_fasta_without_siblings() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("ref.fasta"), ">chr1\nACGT\n").unwrap();

        let source = Source::classify(dir.path().join("ref.fasta").into()).unwrap();
        assert!(resolve_dictionary(&source).is_err());
    }

    #[test]
    fn test_resolve_empty_dictionary() {
        let mut file = tempfile::NamedTempFile::with_suffix(".dict").unwrap();
        file.write_all(b"@HD\tVN:1.6\n").unwrap();

        let source = Source::classify(file.path().to_path_buf().into()).unwrap();
        let err = resolve_dictionary(&source).unwrap_err();

        assert!(matches!(err, ProbeError::Dictionary { .. }), "{err}");
    }

    #[test]
    fn test_resolve_unrecognized_format() {
        let source = Source::classify("notes.txt".into()).unwrap();
        let err = resolve_dictionary(&source).unwrap_err();

        assert!(err.to_string().contains("unrecognized format"), "{err}");
    }
}
