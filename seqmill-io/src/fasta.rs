//! FASTA reading and writing.
//!
//! Reading goes through needletail's FASTX parser; headers are split at the
//! first whitespace into id and description. Features and annotations are
//! not representable and are dropped on write.

use std::io::Cursor;

use log::debug;

use seqmill_core::{Result, SeqmillError};
use seqmill_seq::{Format, SequenceRecord};

use crate::draft::{finish, RecordDraft};
use crate::registry::Codec;

/// Residues per line when writing.
pub const LINE_WIDTH: usize = 60;

fn split_header(header: &str) -> RecordDraft {
    let (id, description) = match header.split_once(char::is_whitespace) {
        Some((id, rest)) => (id.to_string(), rest.trim().to_string()),
        None => (header.trim().to_string(), String::new()),
    };
    RecordDraft {
        description,
        ..RecordDraft::new(id)
    }
}

/// Set aside records that have a header but no residue lines.
///
/// Returns the remaining text and, for every record, either `None` (read it
/// from the remaining text) or the header of an empty record.
fn split_empty_records(text: &str) -> (String, Vec<Option<&str>>) {
    let mut kept = String::with_capacity(text.len());
    let mut slots = Vec::new();
    let mut lines = text.lines().peekable();
    while let Some(header) = lines.next() {
        let mut body = Vec::new();
        while let Some(line) = lines.next_if(|l| !l.starts_with('>')) {
            body.push(line);
        }
        if body.iter().all(|l| l.trim().is_empty()) {
            slots.push(Some(header[1..].trim_end()));
        } else {
            slots.push(None);
            kept.push_str(header);
            kept.push('\n');
            for line in body {
                kept.push_str(line);
                kept.push('\n');
            }
        }
    }
    (kept, slots)
}

fn parse_with_needletail(text: String) -> Result<Vec<RecordDraft>> {
    let mut drafts = Vec::new();
    if text.is_empty() {
        return Ok(drafts);
    }
    let mut reader = needletail::parse_fastx_reader(Cursor::new(text.into_bytes()))
        .map_err(|e| SeqmillError::Format(format!("FASTA: {e}")))?;
    while let Some(record) = reader.next() {
        let record = record.map_err(|e| SeqmillError::Format(format!("FASTA: {e}")))?;
        let mut draft = split_header(&String::from_utf8_lossy(record.id()));
        draft.residues = String::from_utf8_lossy(&record.seq())
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect();
        drafts.push(draft);
    }
    Ok(drafts)
}

/// Parse FASTA text into records.
///
/// A header without residue lines yields a record with no residues.
pub fn parse_fasta(text: &str) -> Result<Vec<SequenceRecord>> {
    let text = text.trim_start();
    if text.is_empty() {
        return Err(SeqmillError::EmptyInput("empty FASTA input".into()));
    }
    if !text.starts_with('>') {
        return Err(SeqmillError::Format(
            "FASTA input must start with a '>' header".into(),
        ));
    }
    let (kept, slots) = split_empty_records(text);
    let mut parsed = parse_with_needletail(kept)?.into_iter();

    let mut drafts = Vec::with_capacity(slots.len());
    for slot in slots {
        let draft = match slot {
            Some(header) => split_header(header),
            None => parsed.next().ok_or_else(|| {
                SeqmillError::Format("FASTA: record count mismatch".into())
            })?,
        };
        drafts.push(draft);
    }
    debug!("parsed {} FASTA record(s)", drafts.len());
    finish(drafts, None)
}

/// Write records as FASTA, wrapping residues at [`LINE_WIDTH`] columns.
pub fn write_fasta(records: &[SequenceRecord]) -> String {
    let mut out = String::new();
    for rec in records {
        out.push('>');
        out.push_str(&rec.id);
        if !rec.description.is_empty() {
            out.push(' ');
            out.push_str(&rec.description);
        }
        out.push('\n');
        for chunk in rec.residues().as_bytes().chunks(LINE_WIDTH) {
            out.push_str(&String::from_utf8_lossy(chunk));
            out.push('\n');
        }
    }
    out
}

/// Codec for [`Format::Fasta`].
#[derive(Debug, Clone, Copy, Default)]
pub struct FastaCodec;

impl Codec for FastaCodec {
    fn format(&self) -> Format {
        Format::Fasta
    }

    fn parse(&self, text: &str) -> Result<Vec<SequenceRecord>> {
        parse_fasta(text)
    }

    fn serialize(&self, records: &[SequenceRecord]) -> Result<String> {
        Ok(write_fasta(records))
    }
}
