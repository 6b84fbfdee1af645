//! NEXUS character matrices.
//!
//! Reads the `data` (or `characters`) block of a NEXUS file: `dimensions`,
//! `format datatype=...` and a sequential or interleaved `matrix`. Other
//! blocks are skipped. Features and descriptions travel in a `features`
//! block of `feature <id> <type> <location> key="value" ...;` and
//! `description <id> "text";` statements.

use std::collections::HashSet;
use std::sync::OnceLock;

use indexmap::IndexMap;
use log::debug;
use regex::Regex;

use seqmill_core::{Result, SeqmillError};
use seqmill_seq::{Alphabet, Feature, Format, SequenceRecord};

use crate::draft::{finish, RecordDraft};
use crate::location::{
    format_location, format_qualifiers, parse_location, push_qualifier, quote, quote_name,
    tokenize, unquote,
};
use crate::registry::Codec;

pub const HEADER: &str = "#NEXUS";

/// Split `text` into `;`-terminated statements, dropping `[...]` comments.
///
/// Quoted runs are kept verbatim, so a `;` or `[` inside quotes does not
/// end a statement. A trailing unterminated statement is returned too.
fn split_statements(text: &str) -> Result<Vec<String>> {
    let mut statements = Vec::new();
    let mut current = String::new();
    let mut quote: Option<char> = None;
    let mut comment_depth = 0usize;
    for c in text.chars() {
        if comment_depth > 0 {
            match c {
                '[' => comment_depth += 1,
                ']' => comment_depth -= 1,
                _ => {}
            }
            continue;
        }
        match quote {
            Some(q) => {
                // a doubled quote closes and reopens, which leaves it intact
                if c == q {
                    quote = None;
                }
                current.push(c);
            }
            None => match c {
                '"' | '\'' => {
                    quote = Some(c);
                    current.push(c);
                }
                '[' => comment_depth = 1,
                ';' => statements.push(std::mem::take(&mut current)),
                _ => current.push(c),
            },
        }
    }
    if quote.is_some() || comment_depth > 0 {
        return Err(SeqmillError::Format(
            "NEXUS: unterminated quote or comment".into(),
        ));
    }
    if !current.trim().is_empty() {
        statements.push(current);
    }
    Ok(statements)
}

/// `key = value` settings of a `dimensions` or `format` statement.
fn settings(statement: &str) -> IndexMap<String, String> {
    static EQUALS: OnceLock<Option<Regex>> = OnceLock::new();
    let compact = match EQUALS.get_or_init(|| Regex::new(r"\s*=\s*").ok()) {
        Some(re) => re.replace_all(statement, "=").into_owned(),
        None => statement.to_string(),
    };
    compact
        .split_whitespace()
        .skip(1)
        .filter_map(|token| token.split_once('='))
        .map(|(k, v)| (k.to_ascii_lowercase(), unquote(v)))
        .collect()
}

fn datatype_alphabet(datatype: &str) -> Option<Alphabet> {
    match datatype.to_ascii_lowercase().as_str() {
        "dna" | "nucleotide" => Some(Alphabet::Dna),
        "rna" => Some(Alphabet::Rna),
        "protein" => Some(Alphabet::Protein),
        _ => None,
    }
}

fn parse_count(settings: &IndexMap<String, String>, key: &str) -> Result<Option<usize>> {
    settings
        .get(key)
        .map(|v| {
            v.parse()
                .map_err(|_| SeqmillError::Format(format!("NEXUS: invalid {key} '{v}'")))
        })
        .transpose()
}

fn parse_matrix(body: &str, rows: &mut IndexMap<String, RecordDraft>) -> Result<()> {
    for line in body.lines() {
        let tokens = tokenize(line)?;
        // a row with only a name is a taxon without residues
        let Some((name, residues)) = tokens.split_first() else {
            continue;
        };
        let name = unquote(name);
        rows.entry(name.clone())
            .or_insert_with(|| RecordDraft::new(name))
            .residues
            .push_str(&residues.concat());
    }
    Ok(())
}

fn parse_feature_statement(tokens: &[String], rows: &mut IndexMap<String, RecordDraft>) -> Result<()> {
    let unknown = |name: &str| SeqmillError::Format(format!("NEXUS: feature for unknown taxon '{name}'"));
    match tokens {
        [keyword, name, text] if keyword.eq_ignore_ascii_case("description") => {
            let name = unquote(name);
            let draft = rows.get_mut(&name).ok_or_else(|| unknown(&name))?;
            draft.description = unquote(text);
        }
        [keyword, name, feature_type, location, qualifiers @ ..]
            if keyword.eq_ignore_ascii_case("feature") =>
        {
            let name = unquote(name);
            let draft = rows.get_mut(&name).ok_or_else(|| unknown(&name))?;
            let mut feature = Feature::new(unquote(feature_type), parse_location(location)?);
            for token in qualifiers {
                push_qualifier(&mut feature.qualifiers, token);
            }
            draft.features.push(feature);
        }
        _ => {
            return Err(SeqmillError::Format(format!(
                "NEXUS: malformed features statement '{}'",
                tokens.join(" ")
            )))
        }
    }
    Ok(())
}

/// Parse a NEXUS file into records.
pub fn parse_nexus(input: &str) -> Result<Vec<SequenceRecord>> {
    let text = input.trim_start();
    if text.is_empty() {
        return Err(SeqmillError::EmptyInput("empty NEXUS input".into()));
    }
    if !text
        .get(..HEADER.len())
        .is_some_and(|h| h.eq_ignore_ascii_case(HEADER))
    {
        return Err(SeqmillError::Format("NEXUS input must start with #NEXUS".into()));
    }

    let mut rows: IndexMap<String, RecordDraft> = IndexMap::new();
    let mut feature_statements = Vec::new();
    let mut block: Option<String> = None;
    let mut ntax = None;
    let mut nchar = None;
    let mut hint = None;
    let mut saw_matrix = false;

    for statement in split_statements(&text[HEADER.len()..])? {
        let trimmed = statement.trim();
        let keyword = trimmed
            .split_whitespace()
            .next()
            .unwrap_or_default()
            .to_ascii_lowercase();
        match keyword.as_str() {
            "" => continue,
            "begin" => {
                block = trimmed.split_whitespace().nth(1).map(str::to_ascii_lowercase);
                continue;
            }
            "end" | "endblock" => {
                block = None;
                continue;
            }
            _ => {}
        }
        match block.as_deref() {
            Some("data") | Some("characters") => match keyword.as_str() {
                "dimensions" => {
                    let dims = settings(trimmed);
                    ntax = parse_count(&dims, "ntax")?.or(ntax);
                    nchar = parse_count(&dims, "nchar")?.or(nchar);
                }
                "format" => {
                    let format = settings(trimmed);
                    hint = format.get("datatype").and_then(|d| datatype_alphabet(d));
                }
                "matrix" => {
                    saw_matrix = true;
                    parse_matrix(&trimmed["matrix".len()..], &mut rows)?;
                }
                _ => {}
            },
            Some("features") => feature_statements.push(tokenize(trimmed)?),
            _ => {}
        }
    }

    if !saw_matrix {
        return Err(SeqmillError::EmptyInput("NEXUS: no data matrix".into()));
    }
    if let Some(n) = ntax {
        if n != rows.len() {
            return Err(SeqmillError::Format(format!(
                "NEXUS: ntax={} but matrix has {} taxa",
                n,
                rows.len()
            )));
        }
    }
    if let Some(n) = nchar {
        if let Some(row) = rows.values().find(|r| r.residues.len() > n) {
            return Err(SeqmillError::Format(format!(
                "NEXUS: taxon '{}' has {} characters, more than nchar={}",
                row.id,
                row.residues.len(),
                n
            )));
        }
    }
    for tokens in &feature_statements {
        parse_feature_statement(tokens, &mut rows)?;
    }

    debug!("parsed {} NEXUS taxa", rows.len());
    finish(rows.into_values().collect(), hint)
}

fn datatype(records: &[SequenceRecord]) -> &'static str {
    match records.first().map(|r| r.alphabet()) {
        Some(Alphabet::Protein) => "protein",
        Some(Alphabet::Rna) => "rna",
        _ => "dna",
    }
}

/// Write records as a NEXUS data block, followed by a features block when
/// any record has features or a description.
///
/// `nchar` is the longest sequence; shorter rows are written as they are.
/// Matrix rows are matched by name, so names must be unique.
pub fn write_nexus(records: &[SequenceRecord]) -> Result<String> {
    let mut seen = HashSet::new();
    if let Some(dup) = records.iter().find(|r| !seen.insert(r.id.as_str())) {
        return Err(SeqmillError::Format(format!(
            "NEXUS: duplicate taxon name '{}'",
            dup.id
        )));
    }
    let names: Vec<String> = records.iter().map(|r| quote_name(&r.id)).collect();
    let width = names.iter().map(String::len).max().unwrap_or(0) + 2;
    let nchar = records.iter().map(|r| r.residues().len()).max().unwrap_or(0);

    let mut out = String::new();
    out.push_str(HEADER);
    out.push_str("\n\nbegin data;\n");
    out.push_str(&format!(
        "    dimensions ntax={} nchar={};\n",
        records.len(),
        nchar
    ));
    out.push_str(&format!(
        "    format datatype={} missing=? gap=-;\n",
        datatype(records)
    ));
    out.push_str("    matrix\n");
    for (name, rec) in names.iter().zip(records) {
        let row = format!("    {:<width$}{}", name, rec.residues());
        out.push_str(row.trim_end());
        out.push('\n');
    }
    out.push_str("    ;\nend;\n");

    if records
        .iter()
        .any(|r| !r.features.is_empty() || !r.description.is_empty())
    {
        out.push_str("\nbegin features;\n");
        for (name, rec) in names.iter().zip(records) {
            if !rec.description.is_empty() {
                out.push_str(&format!(
                    "    description {} {};\n",
                    name,
                    quote(&rec.description)
                ));
            }
            for feature in &rec.features {
                let mut line = format!(
                    "    feature {} {} {}",
                    name,
                    quote_name(&feature.feature_type),
                    format_location(&feature.location)
                );
                let qualifiers = format_qualifiers(&feature.qualifiers);
                if !qualifiers.is_empty() {
                    line.push(' ');
                    line.push_str(&qualifiers);
                }
                out.push_str(&line);
                out.push_str(";\n");
            }
        }
        out.push_str("end;\n");
    }
    Ok(out)
}

/// Codec for [`Format::Nexus`].
#[derive(Debug, Clone, Copy, Default)]
pub struct NexusCodec;

impl Codec for NexusCodec {
    fn format(&self) -> Format {
        Format::Nexus
    }

    fn parse(&self, text: &str) -> Result<Vec<SequenceRecord>> {
        parse_nexus(text)
    }

    fn serialize(&self, records: &[SequenceRecord]) -> Result<String> {
        write_nexus(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use seqmill_seq::{Location, Strand};

    const INTERLEAVED: &str = "\
#NEXUS
[written by hand]
BEGIN TAXA;
    DIMENSIONS NTAX=2;
END;
BEGIN DATA;
    DIMENSIONS NTAX = 2 NCHAR = 12;
    FORMAT DATATYPE = DNA MISSING=? GAP=- INTERLEAVE;
    MATRIX
    human    ACGTAC
    'my seq' ACGTAC

    human    GTAC-- [trailing gaps]
    'my seq' GTACGT
    ;
END;
";

    #[test]
    fn interleaved_matrix() {
        let recs = parse_nexus(INTERLEAVED).unwrap();
        assert_eq!(recs.len(), 2);
        assert_eq!(recs[0].id, "human");
        assert_eq!(recs[0].residues(), "ACGTACGTAC--");
        assert_eq!(recs[1].id, "my seq");
        assert_eq!(recs[1].residues(), "ACGTACGTACGT");
        assert_eq!(recs[0].alphabet(), Alphabet::Dna);
    }

    #[test]
    fn datatype_hint_wins() {
        let text = "#NEXUS\nbegin data;\nformat datatype=protein;\nmatrix\np1 ACGT\n;\nend;\n";
        let recs = parse_nexus(text).unwrap();
        assert_eq!(recs[0].alphabet(), Alphabet::Protein);
    }

    #[test]
    fn features_block_round_trip() {
        let cds = Feature::new("CDS", Location::single(0, 6, Strand::Forward).unwrap())
            .with_qualifier("product", "thing; with [brackets]");
        let a = SequenceRecord::new("seq 1", "ATGAAA", Alphabet::Dna)
            .unwrap()
            .with_description("first \"one\"")
            .with_feature(cds)
            .unwrap();
        let b = SequenceRecord::new("seq2", "ATGCCC", Alphabet::Dna).unwrap();
        let text = write_nexus(&[a.clone(), b.clone()]).unwrap();
        assert!(text.contains("    dimensions ntax=2 nchar=6;\n"));
        assert!(text.contains("    'seq 1'  ATGAAA\n"));
        assert!(text.contains("    seq2     ATGCCC\n"));
        assert!(text.contains("    description 'seq 1' \"first \"\"one\"\"\";\n"));
        let back = parse_nexus(&text).unwrap();
        assert_eq!(back, vec![a, b]);
        assert_eq!(write_nexus(&back).unwrap(), text);
    }

    #[test]
    fn no_features_block_without_metadata() {
        let rec = SequenceRecord::new("a", "ACGU", Alphabet::Rna).unwrap();
        let text = write_nexus(&[rec]).unwrap();
        assert!(!text.contains("begin features"));
        assert!(text.contains("datatype=rna"));
    }

    #[test]
    fn taxa_without_residues() {
        let a = SequenceRecord::new("full", "ACGT", Alphabet::Dna).unwrap();
        let b = SequenceRecord::new("short", "", Alphabet::Dna).unwrap();
        let text = write_nexus(&[a.clone(), b.clone()]).unwrap();
        assert!(text.contains("    short\n"));
        let back = parse_nexus(&text).unwrap();
        assert_eq!(back, vec![a, b]);
        assert_eq!(write_nexus(&back).unwrap(), text);
    }

    #[test]
    fn duplicate_names_rejected() {
        let a = SequenceRecord::new("dup", "ACGT", Alphabet::Dna).unwrap();
        let b = SequenceRecord::new("dup", "TTTT", Alphabet::Dna).unwrap();
        assert!(matches!(write_nexus(&[a, b]), Err(SeqmillError::Format(_))));
    }

    #[test]
    fn malformed_input() {
        assert!(matches!(parse_nexus(" \n"), Err(SeqmillError::EmptyInput(_))));
        assert!(matches!(parse_nexus(">a\nACGT\n"), Err(SeqmillError::Format(_))));
        assert!(matches!(
            parse_nexus("#NEXUS\nbegin trees;\nend;\n"),
            Err(SeqmillError::EmptyInput(_))
        ));
        assert!(matches!(
            parse_nexus("#NEXUS\nbegin data;\ndimensions ntax=3;\nmatrix\na ACGT\n;\nend;\n"),
            Err(SeqmillError::Format(_))
        ));
        assert!(matches!(
            parse_nexus("#NEXUS\nbegin data;\nmatrix\na 'ACGT\n;\nend;\n"),
            Err(SeqmillError::Format(_))
        ));
        assert!(matches!(
            parse_nexus(
                "#NEXUS\nbegin data;\nmatrix\na ACGT\n;\nend;\nbegin features;\nfeature b gene 1..2;\nend;\n"
            ),
            Err(SeqmillError::Format(_))
        ));
    }
}
