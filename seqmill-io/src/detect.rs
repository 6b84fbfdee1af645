//! Building collections from paths, streams, text or existing collections.
//!
//! When no format is given it is taken from the file extension, then from
//! the content itself.

use std::fmt;
use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};

use log::debug;

use seqmill_core::{Result, SeqmillError};
use seqmill_seq::{Alphabet, Format, SequenceCollection};

use crate::registry::CodecRegistry;

/// Where a collection comes from.
pub enum Source {
    Path(PathBuf),
    Reader(Box<dyn Read>),
    Text(String),
    /// An in-memory collection, taken as it is apart from the overrides.
    Collection(SequenceCollection),
}

impl Source {
    pub fn path(path: impl AsRef<Path>) -> Self {
        Source::Path(path.as_ref().to_path_buf())
    }

    pub fn text(text: impl Into<String>) -> Self {
        Source::Text(text.into())
    }

    pub fn reader(reader: impl Read + 'static) -> Self {
        Source::Reader(Box::new(reader))
    }
}

impl fmt::Debug for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Source::Path(path) => f.debug_tuple("Path").field(path).finish(),
            Source::Reader(_) => f.write_str("Reader(..)"),
            Source::Text(text) => write!(f, "Text({} bytes)", text.len()),
            Source::Collection(col) => write!(f, "Collection({} records)", col.len()),
        }
    }
}

/// Overrides applied while reading.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ReadOptions {
    /// Input format; detected when unset.
    pub format: Option<Format>,
    /// Alphabet to force instead of the guessed one.
    pub alphabet: Option<Alphabet>,
    /// Output format; defaults to the input format.
    pub output_format: Option<Format>,
}

fn is_dimension_line(line: &str) -> bool {
    let mut parts = line.split_whitespace();
    let numeric = |p: Option<&str>| p.is_some_and(|p| p.bytes().all(|b| b.is_ascii_digit()));
    numeric(parts.next()) && numeric(parts.next()) && parts.next().is_none()
}

#[cfg(feature = "phylip")]
fn detect_phylip(text: &str) -> Format {
    use crate::phylip::{parse_phylip, PhylipLayout};

    // Interleaved files have a blank line followed by more residues after
    // the first block.
    let lines = text.lines().skip_while(|l| l.trim().is_empty()).skip(1);
    let mut seen_block = false;
    let mut interleaved = false;
    let mut after_blank = false;
    for line in lines {
        if line.trim().is_empty() {
            after_blank = seen_block;
        } else if after_blank {
            interleaved = true;
            break;
        } else {
            seen_block = true;
        }
    }

    let (strict, relaxed) = if interleaved {
        (PhylipLayout::Interleaved, PhylipLayout::InterleavedRelaxed)
    } else {
        (PhylipLayout::Sequential, PhylipLayout::SequentialRelaxed)
    };
    if parse_phylip(text, strict).is_ok() {
        strict.format()
    } else {
        relaxed.format()
    }
}

/// Guess the format of `text` from its first non-blank line.
pub fn detect_format(text: &str) -> Result<Format> {
    let first = text
        .lines()
        .find(|l| !l.trim().is_empty())
        .ok_or_else(|| SeqmillError::EmptyInput("no content to detect a format from".into()))?;
    let trimmed = first.trim_start();

    let format = if trimmed.starts_with('>') {
        Some(Format::Fasta)
    } else if trimmed.starts_with("LOCUS") {
        Some(Format::Genbank)
    } else if trimmed.to_ascii_uppercase().starts_with("#NEXUS") {
        Some(Format::Nexus)
    } else if trimmed.starts_with("# STOCKHOLM") {
        Some(Format::Stockholm)
    } else if is_dimension_line(trimmed) {
        #[cfg(feature = "phylip")]
        {
            Some(detect_phylip(text))
        }
        #[cfg(not(feature = "phylip"))]
        {
            Some(Format::Phylip)
        }
    } else {
        None
    };
    format.ok_or_else(|| {
        SeqmillError::Format(format!(
            "could not detect the format of input starting with '{}'",
            trimmed.chars().take(20).collect::<String>()
        ))
    })
}

fn read_path(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|e| {
        SeqmillError::Io(std::io::Error::new(
            e.kind(),
            format!("{}: {}", path.display(), e),
        ))
    })
}

/// Format named by a path's extension, if it names one.
fn format_from_extension(path: &Path) -> Option<Format> {
    path.extension()
        .and_then(|ext| ext.to_str())
        .and_then(|ext| ext.parse().ok())
}

/// Build a collection from `source`, applying `options`.
///
/// An alphabet override is checked against every record's residues.
pub fn read_collection(
    registry: &CodecRegistry,
    source: Source,
    options: &ReadOptions,
) -> Result<SequenceCollection> {
    let mut collection = match source {
        Source::Collection(collection) => collection,
        Source::Path(path) => {
            let text = read_path(&path)?;
            let format = match options.format.or_else(|| format_from_extension(&path)) {
                Some(format) => format,
                None => detect_format(&text)?,
            };
            debug!("reading {} as {}", path.display(), format);
            registry.parse(format, &text)?
        }
        Source::Reader(mut reader) => {
            let mut text = String::new();
            reader.read_to_string(&mut text)?;
            let format = match options.format {
                Some(format) => format,
                None => detect_format(&text)?,
            };
            registry.parse(format, &text)?
        }
        Source::Text(text) => {
            let format = match options.format {
                Some(format) => format,
                None => detect_format(&text)?,
            };
            registry.parse(format, &text)?
        }
    };

    if let Some(alphabet) = options.alphabet {
        collection.set_alphabet(alphabet)?;
    }
    if let Some(format) = options.output_format {
        collection = collection.with_output_format(format);
    }
    Ok(collection)
}
