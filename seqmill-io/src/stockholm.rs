//! Stockholm format reading and writing.
//!
//! A file holds one or more blocks, each opened by `# STOCKHOLM 1.0` and
//! closed by `//`; records from all blocks are read in order. Sequence lines
//! of the same name within a block are concatenated (interleaved layout).
//!
//! Per-sequence `#=GS` markup carries everything beyond residues:
//! - `#=GS <id> DE <text>`: description
//! - `#=GS <id> FT <type> <location> key="value" ...`: one feature
//! - `#=GS <id> <tag> <text>`: any other annotation
//!
//! `#=GF`, `#=GC` and `#=GR` lines are accepted and ignored.

use std::collections::HashSet;

use indexmap::IndexMap;
use log::debug;

use seqmill_core::{Result, SeqmillError};
use seqmill_seq::{Feature, Format, SequenceRecord};

use crate::draft::{finish, RecordDraft};
use crate::location::{format_location, format_qualifiers, parse_location, push_qualifier, tokenize};
use crate::registry::Codec;

pub const HEADER: &str = "# STOCKHOLM 1.0";

const DESCRIPTION_TAG: &str = "DE";
const FEATURE_TAG: &str = "FT";

fn parse_feature(text: &str) -> Result<Feature> {
    let tokens = tokenize(text)?;
    let [feature_type, location, qualifiers @ ..] = tokens.as_slice() else {
        return Err(SeqmillError::Format(format!(
            "feature line needs a type and a location: '{text}'"
        )));
    };
    let mut feature = Feature::new(feature_type.as_str(), parse_location(location)?);
    for token in qualifiers {
        push_qualifier(&mut feature.qualifiers, token);
    }
    Ok(feature)
}

#[derive(Default)]
struct Block {
    records: IndexMap<String, RecordDraft>,
    markup: Vec<(String, String, String)>,
}

impl Block {
    fn close(self, out: &mut Vec<RecordDraft>) -> Result<()> {
        let mut records = self.records;
        for (name, tag, value) in self.markup {
            let draft = records.get_mut(&name).ok_or_else(|| {
                SeqmillError::Format(format!("#=GS markup for unknown sequence '{name}'"))
            })?;
            match tag.as_str() {
                DESCRIPTION_TAG => draft.description = value,
                FEATURE_TAG => draft.features.push(parse_feature(&value)?),
                _ => {
                    draft.annotations.insert(tag, value);
                }
            }
        }
        out.extend(records.into_values());
        Ok(())
    }
}

/// Parse every Stockholm block in `input` into one list of records.
pub fn parse_stockholm(input: &str) -> Result<Vec<SequenceRecord>> {
    if input.trim().is_empty() {
        return Err(SeqmillError::EmptyInput("empty Stockholm input".into()));
    }

    let mut drafts = Vec::new();
    let mut block: Option<Block> = None;

    for (line_num, line) in input.lines().enumerate() {
        let line = line.trim_end();

        // Block header
        if line.starts_with(HEADER) {
            if block.is_some() {
                return Err(SeqmillError::Format(format!(
                    "line {}: nested STOCKHOLM header without preceding //",
                    line_num + 1
                )));
            }
            block = Some(Block::default());
            continue;
        }

        let Some(current) = block.as_mut() else {
            if line.trim().is_empty() {
                continue;
            }
            return Err(SeqmillError::Format(format!(
                "line {}: content outside a STOCKHOLM block",
                line_num + 1
            )));
        };

        // Block terminator
        if line == "//" {
            if let Some(done) = block.take() {
                done.close(&mut drafts)?;
            }
            continue;
        }

        if line.trim().is_empty() {
            continue;
        }

        // #=GS seqname tag value
        if let Some(rest) = line.strip_prefix("#=GS ") {
            let parts: Vec<&str> = rest.trim_start().splitn(3, char::is_whitespace).collect();
            if parts.len() < 3 {
                return Err(SeqmillError::Format(format!(
                    "line {}: incomplete #=GS line",
                    line_num + 1
                )));
            }
            current.markup.push((
                parts[0].to_string(),
                parts[1].to_string(),
                parts[2].trim().to_string(),
            ));
            continue;
        }

        // #=GF, #=GC, #=GR and plain comments
        if line.starts_with('#') {
            continue;
        }

        // Sequence line: name sequence, or a bare name for an empty sequence
        let (name, seq) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
        let seq: String = seq.chars().filter(|c| !c.is_whitespace()).collect();
        current
            .records
            .entry(name.to_string())
            .or_insert_with(|| RecordDraft::new(name))
            .residues
            .push_str(&seq);
    }

    if block.is_some() {
        return Err(SeqmillError::Format(
            "unterminated Stockholm block (missing //)".to_string(),
        ));
    }
    debug!("parsed {} Stockholm record(s)", drafts.len());
    finish(drafts, None)
}

fn sanitize(id: &str) -> String {
    id.replace(char::is_whitespace, "_")
}

/// Reject ids that would not read back as the same sequence line.
fn check_ids(records: &[SequenceRecord]) -> Result<()> {
    let mut seen = HashSet::new();
    for rec in records {
        let id = sanitize(&rec.id);
        if id.is_empty() || id.starts_with('#') || id == "//" {
            return Err(SeqmillError::Format(format!(
                "Stockholm: '{}' cannot be written as a sequence name",
                rec.id
            )));
        }
        if !seen.insert(id) {
            return Err(SeqmillError::Format(format!(
                "Stockholm: duplicate sequence name '{}'",
                rec.id
            )));
        }
    }
    Ok(())
}

/// Write all records as a single Stockholm block.
///
/// Sequence lines are matched by name, so names must be unique after
/// whitespace is replaced by `_`.
pub fn write_stockholm(records: &[SequenceRecord]) -> Result<String> {
    check_ids(records)?;
    let mut out = String::new();
    out.push_str(HEADER);
    out.push('\n');
    out.push_str(&format!("#=GF SQ {}\n", records.len()));

    // #=GS markup
    for rec in records {
        let id = sanitize(&rec.id);
        if !rec.description.is_empty() {
            out.push_str(&format!("#=GS {} {} {}\n", id, DESCRIPTION_TAG, rec.description));
        }
        for (key, value) in &rec.annotations {
            if key == DESCRIPTION_TAG || key == FEATURE_TAG || value.is_empty() {
                continue;
            }
            out.push_str(&format!("#=GS {} {} {}\n", id, sanitize(key), value));
        }
        for feature in &rec.features {
            let mut line = format!(
                "#=GS {} {} {} {}",
                id,
                FEATURE_TAG,
                sanitize(&feature.feature_type),
                format_location(&feature.location)
            );
            let qualifiers = format_qualifiers(&feature.qualifiers);
            if !qualifiers.is_empty() {
                line.push(' ');
                line.push_str(&qualifiers);
            }
            out.push_str(&line);
            out.push('\n');
        }
    }

    // Sequence lines
    let width = records.iter().map(|r| r.id.len()).max().unwrap_or(0) + 1;
    for rec in records {
        let line = format!("{:<width$}{}", sanitize(&rec.id), rec.residues());
        out.push_str(line.trim_end());
        out.push('\n');
    }
    out.push_str("//\n");
    Ok(out)
}

/// Codec for [`Format::Stockholm`].
#[derive(Debug, Clone, Copy, Default)]
pub struct StockholmCodec;

impl Codec for StockholmCodec {
    fn format(&self) -> Format {
        Format::Stockholm
    }

    fn parse(&self, text: &str) -> Result<Vec<SequenceRecord>> {
        parse_stockholm(text)
    }

    fn serialize(&self, records: &[SequenceRecord]) -> Result<String> {
        write_stockholm(records)
    }
}
