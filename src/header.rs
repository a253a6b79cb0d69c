//! Header decoding for variant and alignment sources.
//!
//! Variant headers (VCF and BCF) are decoded from a [`SniffedStream`] so that
//! plain-text, gzipped, and binary inputs all take the same path: the stream
//! arrives with any gzip layer already removed, and the BCF framing (if
//! present) is unwrapped here to reach the embedded header text. Alignment
//! headers (SAM, BAM, CRAM) are decoded straight from the [`Source`] since
//! each container format carries its own compression.

use std::io::{BufRead, BufReader, Read};

use noodles::bam;
use noodles::cram;
use noodles::sam;
use noodles::vcf;

use crate::error::{ProbeError, Result};
use crate::sniff::SniffedStream;
use crate::source::Source;

/// Magic bytes opening an uncompressed BCF stream.
const BCF_MAGIC: &[u8] = b"BCF";

/// Magic plus the two-byte format version that follows it.
const BCF_PREAMBLE_LEN: usize = 5;

/// Reads the raw header text of a variant stream.
///
/// BCF input is unframed down to the header text embedded after the magic;
/// plain-text input is collected line by line up to and including the
/// `#CHROM` column line. Either way the result is the same `##`-prefixed
/// text, so callers can scan it without caring which container it came from.
///
/// # Errors
///
/// Returns [`ProbeError::Format`] if the BCF framing is malformed, the text
/// is not a VCF header, or the `#CHROM` line is missing, and
/// [`ProbeError::Io`] if the underlying stream fails.
pub fn read_vcf_header_text(stream: SniffedStream, source_id: &str) -> Result<String> {
    if stream.starts_with(BCF_MAGIC) {
        read_bcf_header_text(stream, source_id)
    } else {
        collect_text_header(stream, source_id)
    }
}

/// Decodes the header of a variant stream into a structured header.
///
/// # Errors
///
/// As [`read_vcf_header_text`], plus [`ProbeError::Format`] if the header
/// text does not parse as VCF.
pub fn decode_vcf_header(stream: SniffedStream, source_id: &str) -> Result<vcf::Header> {
    let text = read_vcf_header_text(stream, source_id)?;

    let mut reader = vcf::io::Reader::new(text.as_bytes());

    reader
        .read_header()
        .map_err(|e| classify_read_error(source_id, e))
}

/// Decodes the header of an alignment source, dispatching on its suffix.
///
/// # Errors
///
/// Returns [`ProbeError::Format`] if the source does not carry an alignment
/// suffix or its header is malformed, and [`ProbeError::Io`] if it cannot be
/// read.
pub fn decode_alignment_header(source: &Source) -> Result<sam::Header> {
    if crate::source::is_bam(source) {
        read_bam_header(source)
    } else if crate::source::is_cram(source) {
        read_cram_header(source)
    } else if crate::source::is_sam(source) {
        read_sam_text_header(source)
    } else {
        Err(ProbeError::format(
            source.to_string(),
            "not an alignment source (.bam/.cram/.sam)",
        ))
    }
}

/// Reads a SAM-formatted text header from a source.
///
/// Used for `.sam` files and for the SAM-header-bearing sidecar formats
/// (`.dict` sequence dictionaries and Picard-style interval lists), all of
/// which may be gzipped.
///
/// # Errors
///
/// Returns [`ProbeError::Format`] if the header is malformed and
/// [`ProbeError::Io`] if the source cannot be read.
pub fn read_sam_text_header(source: &Source) -> Result<sam::Header> {
    let source_id = source.to_string();
    let stream = crate::sniff::sniff(source.open()?, &source_id)?;

    let mut reader = sam::io::Reader::new(BufReader::new(stream.into_reader()));

    reader
        .read_header()
        .map_err(|e| classify_read_error(&source_id, e))
}

fn read_bam_header(source: &Source) -> Result<sam::Header> {
    let source_id = source.to_string();
    let mut reader = bam::io::Reader::new(source.open()?);

    reader
        .read_header()
        .map_err(|e| classify_read_error(&source_id, e))
}

fn read_cram_header(source: &Source) -> Result<sam::Header> {
    let source_id = source.to_string();
    let mut reader = cram::io::Reader::new(source.open()?);

    reader
        .read_file_definition()
        .map_err(|e| classify_read_error(&source_id, e))?;

    reader
        .read_file_header()
        .map_err(|e| classify_read_error(&source_id, e))
}

/// Unwraps the BCF framing around the embedded VCF header text.
///
/// The layout after any block-gzip layer is `BCF` + two version bytes,
/// then a little-endian `i32` length, then that many bytes of header text
/// (NUL-padded at the end).
fn read_bcf_header_text(stream: SniffedStream, source_id: &str) -> Result<String> {
    let mut reader = stream.into_reader();

    let mut preamble = [0u8; BCF_PREAMBLE_LEN];
    reader
        .read_exact(&mut preamble)
        .map_err(|e| ProbeError::io(source_id, e))?;

    let mut len_buf = [0u8; 4];
    reader
        .read_exact(&mut len_buf)
        .map_err(|e| ProbeError::io(source_id, e))?;

    let len = i32::from_le_bytes(len_buf);

    if len <= 0 {
        return Err(ProbeError::format(
            source_id,
            format!("invalid BCF header length {len}"),
        ));
    }

    let mut block = vec![0u8; len as usize];
    reader
        .read_exact(&mut block)
        .map_err(|e| ProbeError::io(source_id, e))?;

    while block.last() == Some(&0) {
        block.pop();
    }

    String::from_utf8(block)
        .map_err(|_| ProbeError::format(source_id, "BCF header text is not valid UTF-8"))
}

/// Collects `#`-prefixed header lines up to and including the `#CHROM` line.
fn collect_text_header(stream: SniffedStream, source_id: &str) -> Result<String> {
    let mut reader = BufReader::new(stream.into_reader());
    let mut text = String::new();
    let mut line = String::new();

    loop {
        line.clear();

        let n = reader
            .read_line(&mut line)
            .map_err(|e| ProbeError::io(source_id, e))?;

        if n == 0 {
            return Err(ProbeError::format(source_id, "missing #CHROM header line"));
        }

        if text.is_empty() && !line.starts_with("##fileformat=") {
            return Err(ProbeError::format(source_id, "missing ##fileformat line"));
        }

        if !line.starts_with('#') {
            return Err(ProbeError::format(
                source_id,
                "malformed header line before #CHROM",
            ));
        }

        let done = line.starts_with("#CHROM");
        text.push_str(&line);

        if done {
            return Ok(text);
        }
    }
}

fn classify_read_error(source_id: &str, e: std::io::Error) -> ProbeError {
    if e.kind() == std::io::ErrorKind::InvalidData {
        ProbeError::format(source_id, format!("invalid header: {e}"))
    } else {
        ProbeError::io(source_id, e)
    }
}
