//! PHYLIP alignment reading and writing.
//!
//! Four layouts are supported: sequential or interleaved, each with either
//! strict names (exactly 10 columns, padded or truncated) or relaxed names
//! (whitespace-delimited, any length). Every layout starts with a
//! dimension line giving the number of taxa and sites. PHYLIP carries
//! neither descriptions nor features.

use log::warn;

use seqmill_core::{Result, SeqmillError};
use seqmill_seq::{Format, SequenceRecord};

use crate::draft::{finish, RecordDraft};
use crate::registry::Codec;

/// Width of a strict PHYLIP name field.
pub const STRICT_NAME_WIDTH: usize = 10;

/// Residues per interleaved block.
pub const BLOCK_SIZE: usize = 60;

/// One of the four PHYLIP layouts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhylipLayout {
    Sequential,
    SequentialRelaxed,
    Interleaved,
    InterleavedRelaxed,
}

impl PhylipLayout {
    pub const ALL: [PhylipLayout; 4] = [
        PhylipLayout::Sequential,
        PhylipLayout::SequentialRelaxed,
        PhylipLayout::Interleaved,
        PhylipLayout::InterleavedRelaxed,
    ];

    pub fn format(self) -> Format {
        match self {
            PhylipLayout::Sequential => Format::Phylip,
            PhylipLayout::SequentialRelaxed => Format::PhylipRelaxed,
            PhylipLayout::Interleaved => Format::PhylipInterleaved,
            PhylipLayout::InterleavedRelaxed => Format::PhylipInterleavedRelaxed,
        }
    }

    /// The layout for a PHYLIP format tag.
    pub fn from_format(format: Format) -> Option<Self> {
        Self::ALL.into_iter().find(|l| l.format() == format)
    }

    pub fn is_strict(self) -> bool {
        matches!(self, PhylipLayout::Sequential | PhylipLayout::Interleaved)
    }

    pub fn is_interleaved(self) -> bool {
        matches!(
            self,
            PhylipLayout::Interleaved | PhylipLayout::InterleavedRelaxed
        )
    }
}

fn parse_error(msg: impl Into<String>) -> SeqmillError {
    SeqmillError::Format(msg.into())
}

/// Parse PHYLIP text laid out as `layout`.
pub fn parse_phylip(input: &str, layout: PhylipLayout) -> Result<Vec<SequenceRecord>> {
    let mut lines = input.lines().peekable();
    let (n_taxa, n_sites) = parse_dimensions(&mut lines)?;
    if n_taxa == 0 {
        return Err(SeqmillError::EmptyInput("PHYLIP header declares no taxa".into()));
    }
    skip_blank_lines(&mut lines);

    let taxa = if layout.is_interleaved() {
        parse_interleaved(&mut lines, n_taxa, layout)?
    } else {
        parse_sequential(&mut lines, n_taxa, n_sites, layout)?
    };

    for (name, seq) in &taxa {
        if seq.len() != n_sites {
            return Err(parse_error(format!(
                "taxon '{}': expected {} sites, found {}",
                name,
                n_sites,
                seq.len()
            )));
        }
    }
    let drafts = taxa
        .into_iter()
        .map(|(name, residues)| RecordDraft {
            residues,
            ..RecordDraft::new(name)
        })
        .collect();
    finish(drafts, None)
}

type Taxon = (String, String);

fn parse_interleaved<'a, I: Iterator<Item = &'a str>>(
    lines: &mut std::iter::Peekable<I>,
    n_taxa: usize,
    layout: PhylipLayout,
) -> Result<Vec<Taxon>> {
    // First block: names + sequences
    let mut taxa: Vec<Taxon> = Vec::with_capacity(n_taxa);
    for _ in 0..n_taxa {
        let line = lines
            .next()
            .ok_or_else(|| parse_error("unexpected end of input in first PHYLIP block"))?;
        if line.trim().is_empty() {
            return Err(parse_error("unexpected blank line in first PHYLIP block"));
        }
        taxa.push(split_name_seq(line, layout)?);
    }

    // Subsequent blocks: sequences only
    loop {
        skip_blank_lines(lines);
        if lines.peek().is_none() {
            break;
        }
        for taxon in taxa.iter_mut() {
            let line = match lines.next() {
                Some(l) if !l.trim().is_empty() => l,
                _ => {
                    return Err(parse_error(format!(
                        "interleaved block ends before taxon '{}'",
                        taxon.0
                    )))
                }
            };
            taxon.1.extend(line.chars().filter(|c| !c.is_whitespace()));
        }
    }
    Ok(taxa)
}

fn parse_sequential<'a, I: Iterator<Item = &'a str>>(
    lines: &mut std::iter::Peekable<I>,
    n_taxa: usize,
    n_sites: usize,
    layout: PhylipLayout,
) -> Result<Vec<Taxon>> {
    let mut taxa: Vec<Taxon> = Vec::with_capacity(n_taxa);
    for _ in 0..n_taxa {
        skip_blank_lines(lines);
        let first_line = lines
            .next()
            .ok_or_else(|| parse_error("unexpected end of input in sequential PHYLIP"))?;
        let (name, mut seq) = split_name_seq(first_line, layout)?;

        // Read more lines until we have n_sites characters
        while seq.len() < n_sites {
            let line = lines.next().ok_or_else(|| {
                parse_error(format!(
                    "unexpected end of input for taxon '{}': got {} of {} sites",
                    name,
                    seq.len(),
                    n_sites
                ))
            })?;
            seq.extend(line.chars().filter(|c| !c.is_whitespace()));
        }
        taxa.push((name, seq));
    }
    skip_blank_lines(lines);
    if lines.peek().is_some() {
        return Err(parse_error(format!(
            "trailing content after {n_taxa} sequential PHYLIP taxa"
        )));
    }
    Ok(taxa)
}

/// Write records as PHYLIP laid out as `layout`.
///
/// Every record must have the same length. Strict layouts pad or truncate
/// ids to [`STRICT_NAME_WIDTH`] columns; relaxed layouts pad to the longest
/// id plus two spaces.
pub fn write_phylip(records: &[SequenceRecord], layout: PhylipLayout) -> Result<String> {
    let n_sites = records.first().map_or(0, |r| r.residues().len());
    if let Some(odd) = records.iter().find(|r| r.residues().len() != n_sites) {
        return Err(SeqmillError::Format(format!(
            "PHYLIP needs equal-length sequences: '{}' has {} residues, expected {}",
            odd.id,
            odd.residues().len(),
            n_sites
        )));
    }

    let names: Vec<String> = records
        .iter()
        .map(|r| {
            if layout.is_strict() {
                let name: String = r.id.chars().take(STRICT_NAME_WIDTH).collect();
                if name.len() < r.id.len() {
                    warn!("id '{}' truncated to '{}' for strict PHYLIP", r.id, name);
                }
                name.replace(char::is_whitespace, "_")
            } else {
                r.id.replace(char::is_whitespace, "_")
            }
        })
        .collect();
    let pad = if layout.is_strict() {
        STRICT_NAME_WIDTH
    } else {
        names.iter().map(String::len).max().unwrap_or(0) + 2
    };

    let mut out = format!(" {} {}\n", records.len(), n_sites);
    if !layout.is_interleaved() {
        for (name, rec) in names.iter().zip(records) {
            out.push_str(&format!("{:<width$}{}\n", name, rec.residues(), width = pad));
        }
        return Ok(out);
    }

    let mut offset = 0;
    loop {
        let end = (offset + BLOCK_SIZE).min(n_sites);
        for (name, rec) in names.iter().zip(records) {
            let fragment = &rec.residues()[offset..end];
            if offset == 0 {
                // First block: include names
                out.push_str(&format!("{:<width$}{}\n", name, fragment, width = pad));
            } else {
                out.push_str(fragment);
                out.push('\n');
            }
        }
        if end >= n_sites {
            break;
        }
        out.push('\n');
        offset = end;
    }
    Ok(out)
}

/// Codec for one PHYLIP layout.
#[derive(Debug, Clone, Copy)]
pub struct PhylipCodec {
    layout: PhylipLayout,
}

impl PhylipCodec {
    pub fn new(layout: PhylipLayout) -> Self {
        Self { layout }
    }
}

impl Codec for PhylipCodec {
    fn format(&self) -> Format {
        self.layout.format()
    }

    fn parse(&self, text: &str) -> Result<Vec<SequenceRecord>> {
        parse_phylip(text, self.layout)
    }

    fn serialize(&self, records: &[SequenceRecord]) -> Result<String> {
        write_phylip(records, self.layout)
    }
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

/// Read the ` n m` dimension line.
pub(crate) fn parse_dimensions<'a, I: Iterator<Item = &'a str>>(
    lines: &mut std::iter::Peekable<I>,
) -> Result<(usize, usize)> {
    let dim_line = loop {
        match lines.next() {
            Some(l) => {
                let trimmed = l.trim();
                if !trimmed.is_empty() {
                    break trimmed;
                }
            }
            None => {
                return Err(SeqmillError::EmptyInput(
                    "no PHYLIP dimension line".to_string(),
                ))
            }
        }
    };

    let parts: Vec<&str> = dim_line.split_whitespace().collect();
    if parts.len() != 2 {
        return Err(parse_error(format!(
            "invalid PHYLIP dimension line: '{dim_line}'"
        )));
    }
    let n_taxa: usize = parts[0]
        .parse()
        .map_err(|_| parse_error(format!("invalid taxon count '{}'", parts[0])))?;
    let n_sites: usize = parts[1]
        .parse()
        .map_err(|_| parse_error(format!("invalid site count '{}'", parts[1])))?;
    Ok((n_taxa, n_sites))
}

fn skip_blank_lines<'a, I: Iterator<Item = &'a str>>(lines: &mut std::iter::Peekable<I>) {
    while let Some(line) = lines.peek() {
        if line.trim().is_empty() {
            lines.next();
        } else {
            break;
        }
    }
}

fn split_name_seq(line: &str, layout: PhylipLayout) -> Result<Taxon> {
    let (name, rest) = if layout.is_strict() {
        match line.char_indices().nth(STRICT_NAME_WIDTH) {
            Some((idx, _)) => line.split_at(idx),
            None => (line, ""),
        }
    } else {
        let line = line.trim_start();
        line.split_once(char::is_whitespace).unwrap_or((line, ""))
    };
    let name = name.trim();
    if name.is_empty() {
        return Err(parse_error(format!(
            "could not parse name from line: '{line}'"
        )));
    }
    let seq = rest.chars().filter(|c| !c.is_whitespace()).collect();
    Ok((name.to_string(), seq))
}
