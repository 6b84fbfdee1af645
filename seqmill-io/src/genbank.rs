//! GenBank flat file reading and writing.
//!
//! A file holds one or more records separated by `//`. Each record includes
//! LOCUS, DEFINITION, ACCESSION, VERSION, KEYWORDS, SOURCE/ORGANISM, a
//! FEATURES table and ORIGIN sequence section. Header fields land in the
//! record's annotations under the `ANN_*` keys; other sections (REFERENCE,
//! COMMENT, ...) are skipped.

use std::sync::OnceLock;

use log::debug;
use regex::Regex;

use seqmill_core::{Result, SeqmillError};
use seqmill_seq::record::ORGANISM;
use seqmill_seq::{Alphabet, Feature, Format, Qualifiers, SequenceRecord};

use crate::draft::{finish, RecordDraft};
use crate::location::{format_location, parse_location, quote, unquote};
use crate::registry::Codec;

pub const ANN_ACCESSION: &str = "accession";
pub const ANN_VERSION: &str = "version";
pub const ANN_KEYWORDS: &str = "keywords";
pub const ANN_SOURCE: &str = "source";
pub const ANN_TAXONOMY: &str = "taxonomy";
pub const ANN_MOLECULE: &str = "molecule";
pub const ANN_TOPOLOGY: &str = "topology";
pub const ANN_DIVISION: &str = "division";
pub const ANN_DATE: &str = "date";

/// Placeholder for empty header fields.
const EMPTY_FIELD: &str = ".";
const DEFAULT_TOPOLOGY: &str = "linear";
const DEFAULT_DIVISION: &str = "UNK";
const DEFAULT_DATE: &str = "01-JAN-1980";

/// Width of the header keyword column.
const HEADER_INDENT: usize = 12;
/// Width of the feature key column.
const FEATURE_INDENT: usize = 21;
/// Characters available to locations and qualifiers on one line.
const FEATURE_FIELD_WIDTH: usize = 58;
const LINE_WIDTH: usize = 80;
const ORIGIN_LINE: usize = 60;
const ORIGIN_GROUP: usize = 10;

/// Qualifiers whose numeric values are written without quotes.
const NUMERIC_QUALIFIERS: &[&str] = &["codon_start", "transl_table", "number"];

/// Collapse degenerate organisms into a single `.`.
///
/// Any value with a `". "` run counts, which covers repeated
/// `"Genus species. Genus species."` names and `". . ."` placeholders.
pub fn normalize_organism(organism: &str) -> String {
    static PLACEHOLDER: OnceLock<Option<Regex>> = OnceLock::new();
    let placeholder = PLACEHOLDER.get_or_init(|| Regex::new(r"(\. )+").ok());
    let trimmed = organism.trim();
    match placeholder {
        Some(re) if re.is_match(trimmed) => EMPTY_FIELD.to_string(),
        _ => trimmed.to_string(),
    }
}

// ---------------------------------------------------------------------------
// Reading
// ---------------------------------------------------------------------------

#[derive(Clone, Copy, PartialEq)]
enum Section {
    Header,
    Features,
    Origin,
}

/// Which header field a 12-space continuation line extends.
#[derive(Clone, Copy)]
enum Continues {
    Definition,
    Keywords,
    Source,
    Taxonomy,
    Nothing,
}

struct FeatureBuilder {
    feature_type: String,
    location: String,
    qualifiers: Qualifiers,
    open_key: Option<String>,
    open_value: String,
}

impl FeatureBuilder {
    fn new(feature_type: &str, location: &str) -> Self {
        Self {
            feature_type: feature_type.to_string(),
            location: location.to_string(),
            qualifiers: Qualifiers::new(),
            open_key: None,
            open_value: String::new(),
        }
    }

    /// A quoted value is complete once its quotes balance.
    fn value_complete(value: &str) -> bool {
        !value.starts_with('"') || value.matches('"').count() % 2 == 0
    }

    fn start_qualifier(&mut self, content: &str) {
        self.finish_qualifier();
        match content.split_once('=') {
            Some((key, value)) => {
                self.open_key = Some(key.to_string());
                self.open_value = value.to_string();
                if Self::value_complete(value) {
                    self.finish_qualifier();
                }
            }
            None => {
                self.qualifiers.entry(content.to_string()).or_default();
            }
        }
    }

    /// Extend the open qualifier, or the location while no qualifier has
    /// started yet.
    fn continue_line(&mut self, content: &str) {
        match &self.open_key {
            Some(key) => {
                if key != "translation" {
                    self.open_value.push(' ');
                }
                self.open_value.push_str(content);
                if Self::value_complete(&self.open_value) {
                    self.finish_qualifier();
                }
            }
            None if self.qualifiers.is_empty() => self.location.push_str(content.trim()),
            None => {}
        }
    }

    fn finish_qualifier(&mut self) {
        if let Some(key) = self.open_key.take() {
            let value = unquote(std::mem::take(&mut self.open_value).trim());
            self.qualifiers.entry(key).or_default().push(value);
        }
    }

    fn build(mut self) -> Result<Feature> {
        self.finish_qualifier();
        let mut feature = Feature::new(self.feature_type, parse_location(&self.location)?);
        feature.qualifiers = self.qualifiers;
        Ok(feature)
    }
}

struct RecordBuilder {
    draft: RecordDraft,
    hint: Option<Alphabet>,
    current_feature: Option<FeatureBuilder>,
}

impl RecordBuilder {
    fn from_locus(line: &str) -> Self {
        let parts: Vec<&str> = line.split_whitespace().collect();
        let mut draft = RecordDraft::new(parts.get(1).copied().unwrap_or_default());
        let mut hint = None;
        if parts.get(3) == Some(&"aa") {
            hint = Some(Alphabet::Protein);
        }
        for token in parts.iter().skip(4) {
            let (key, value) = if token.ends_with("DNA") || token.ends_with("RNA") {
                if hint.is_none() {
                    hint = Some(if token.ends_with("RNA") {
                        Alphabet::Rna
                    } else {
                        Alphabet::Dna
                    });
                }
                (ANN_MOLECULE, *token)
            } else if *token == "linear" || *token == "circular" {
                (ANN_TOPOLOGY, *token)
            } else if token.len() == 11 && token.matches('-').count() == 2 {
                (ANN_DATE, *token)
            } else {
                (ANN_DIVISION, *token)
            };
            draft.annotations.insert(key.to_string(), value.to_string());
        }
        Self {
            draft,
            hint,
            current_feature: None,
        }
    }

    fn annotate(&mut self, key: &str, value: &str) {
        self.draft
            .annotations
            .insert(key.to_string(), value.trim().to_string());
    }

    fn extend_annotation(&mut self, key: &str, value: &str) {
        let entry = self.draft.annotations.entry(key.to_string()).or_default();
        if !entry.is_empty() {
            entry.push(' ');
        }
        entry.push_str(value.trim());
    }

    fn finish_feature(&mut self) -> Result<()> {
        if let Some(fb) = self.current_feature.take() {
            self.draft.features.push(fb.build()?);
        }
        Ok(())
    }

    fn build(mut self) -> Result<(RecordDraft, Option<Alphabet>)> {
        self.finish_feature()?;
        if let Some(organism) = self.draft.annotations.get_mut(ORGANISM) {
            *organism = normalize_organism(organism);
        }
        Ok((self.draft, self.hint))
    }
}

fn header_value(line: &str) -> &str {
    line.get(HEADER_INDENT..).unwrap_or_default().trim()
}

fn is_continuation(line: &str, indent: usize) -> bool {
    line.len() > indent && line.as_bytes()[..indent].iter().all(|&b| b == b' ')
}

/// Parse a line within the FEATURES section.
///
/// Feature keys start at column 5, qualifier and continuation lines at
/// column 21.
fn parse_feature_line(line: &str, builder: &mut RecordBuilder, line_num: usize) -> Result<()> {
    if line.trim().is_empty() {
        return Ok(());
    }
    if is_continuation(line, FEATURE_INDENT) {
        let content = line[FEATURE_INDENT..].trim_end();
        let feature = builder.current_feature.as_mut().ok_or_else(|| {
            SeqmillError::Format(format!(
                "line {}: qualifier outside a feature",
                line_num + 1
            ))
        })?;
        match content.strip_prefix('/') {
            Some(stripped) if feature.open_key.is_none() => feature.start_qualifier(stripped),
            _ => feature.continue_line(content),
        }
        return Ok(());
    }
    builder.finish_feature()?;
    let Some((feature_type, location)) = line.trim().split_once(char::is_whitespace) else {
        return Err(SeqmillError::Format(format!(
            "line {}: feature '{}' has no location",
            line_num + 1,
            line.trim()
        )));
    };
    builder.current_feature = Some(FeatureBuilder::new(feature_type, location.trim()));
    Ok(())
}

/// Parse GenBank text into records.
pub fn parse_genbank(input: &str) -> Result<Vec<SequenceRecord>> {
    if input.trim().is_empty() {
        return Err(SeqmillError::EmptyInput("empty GenBank input".into()));
    }

    let mut drafts = Vec::new();
    let mut hints = Vec::new();
    let mut builder: Option<RecordBuilder> = None;
    let mut section = Section::Header;
    let mut continues = Continues::Nothing;

    for (line_num, line) in input.lines().enumerate() {
        let line = line.trim_end();

        if line.starts_with("LOCUS") {
            if let Some(done) = builder.take() {
                let (draft, hint) = done.build()?;
                drafts.push(draft);
                hints.push(hint);
            }
            builder = Some(RecordBuilder::from_locus(line));
            section = Section::Header;
            continues = Continues::Nothing;
            continue;
        }

        // Record terminator
        if line.starts_with("//") {
            if let Some(done) = builder.take() {
                let (draft, hint) = done.build()?;
                drafts.push(draft);
                hints.push(hint);
            }
            continue;
        }

        let Some(current) = builder.as_mut() else {
            if line.trim().is_empty() {
                continue;
            }
            return Err(SeqmillError::Format(format!(
                "line {}: expected a LOCUS line",
                line_num + 1
            )));
        };

        if section == Section::Origin {
            // "        1 atgcatgcat gcatgcatgc ..."
            current.draft.residues.extend(
                line.chars()
                    .filter(|c| !c.is_ascii_digit() && !c.is_whitespace())
                    .map(|c| c.to_ascii_uppercase()),
            );
            continue;
        }

        if line.starts_with("ORIGIN") {
            current.finish_feature()?;
            section = Section::Origin;
            continue;
        }

        if line.starts_with("FEATURES") {
            section = Section::Features;
            continue;
        }

        if section == Section::Features {
            if line.starts_with(' ') || line.is_empty() {
                parse_feature_line(line, current, line_num)?;
                continue;
            }
            // A new top-level section (CONTIG, BASE COUNT, ...)
            current.finish_feature()?;
            section = Section::Header;
        }

        if is_continuation(line, HEADER_INDENT) {
            let value = line.trim();
            match continues {
                Continues::Definition => {
                    current.draft.description.push(' ');
                    current.draft.description.push_str(value);
                }
                Continues::Keywords => current.extend_annotation(ANN_KEYWORDS, value),
                Continues::Source => current.extend_annotation(ANN_SOURCE, value),
                Continues::Taxonomy => current.extend_annotation(ANN_TAXONOMY, value),
                Continues::Nothing => {}
            }
            continue;
        }

        let keyword = line.split_whitespace().next().unwrap_or_default();
        continues = Continues::Nothing;
        match keyword {
            "DEFINITION" => {
                let value = header_value(line);
                current.draft.description = if value == EMPTY_FIELD {
                    String::new()
                } else {
                    value.to_string()
                };
                continues = Continues::Definition;
            }
            "ACCESSION" => current.annotate(ANN_ACCESSION, header_value(line)),
            "VERSION" => {
                let version = header_value(line).split_whitespace().next().unwrap_or_default();
                current.annotate(ANN_VERSION, version);
            }
            "KEYWORDS" => {
                current.annotate(ANN_KEYWORDS, header_value(line));
                continues = Continues::Keywords;
            }
            "SOURCE" => {
                current.annotate(ANN_SOURCE, header_value(line));
                continues = Continues::Source;
            }
            "ORGANISM" => {
                current.annotate(ORGANISM, header_value(line));
                continues = Continues::Taxonomy;
            }
            _ => {}
        }
    }

    // Last record without trailing //
    if let Some(done) = builder.take() {
        let (draft, hint) = done.build()?;
        drafts.push(draft);
        hints.push(hint);
    }

    let hint = match hints.first() {
        Some(first) if hints.iter().all(|h| h == first) => *first,
        _ => None,
    };
    debug!("parsed {} GenBank record(s)", drafts.len());
    finish(drafts, hint)
}

// ---------------------------------------------------------------------------
// Writing
// ---------------------------------------------------------------------------

/// Greedy word wrap at single spaces. Words longer than `width` keep a line
/// of their own.
fn wrap_words(text: &str, width: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut words = text.split(' ');
    let mut current = words.next().unwrap_or_default().to_string();
    for word in words {
        if current.len() + 1 + word.len() <= width {
            current.push(' ');
            current.push_str(word);
        } else {
            lines.push(std::mem::replace(&mut current, word.to_string()));
        }
    }
    lines.push(current);
    lines
}

fn wrap_hard(text: &str, width: usize) -> Vec<String> {
    text.as_bytes()
        .chunks(width)
        .map(|chunk| String::from_utf8_lossy(chunk).into_owned())
        .collect()
}

/// Wrap at commas, for long `join(...)` locations.
fn wrap_location(location: &str, width: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();
    for piece in location.split_inclusive(',') {
        if !current.is_empty() && current.len() + piece.len() > width {
            lines.push(std::mem::take(&mut current));
        }
        current.push_str(piece);
    }
    lines.push(current);
    lines
}

/// Header text flows over continuation lines, so runs of whitespace are
/// written as one space.
fn flowed(value: &str) -> String {
    value.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn push_header(out: &mut String, keyword: &str, value: &str) {
    let value = match flowed(value) {
        v if v.is_empty() => EMPTY_FIELD.to_string(),
        v => v,
    };
    for (i, line) in wrap_words(&value, LINE_WIDTH - HEADER_INDENT).iter().enumerate() {
        let label = if i == 0 { keyword } else { "" };
        out.push_str(&format!("{:<width$}{}\n", label, line, width = HEADER_INDENT));
    }
}

fn push_feature_lines(out: &mut String, lines: &[String]) {
    for line in lines {
        out.push_str(&" ".repeat(FEATURE_INDENT));
        out.push_str(line);
        out.push('\n');
    }
}

fn qualifier_text(key: &str, value: &str) -> String {
    let numeric = !value.is_empty() && value.bytes().all(|b| b.is_ascii_digit());
    if numeric && NUMERIC_QUALIFIERS.contains(&key) {
        format!("/{key}={value}")
    } else {
        format!("/{key}={}", quote(value))
    }
}

fn write_feature(out: &mut String, feature: &Feature) {
    let feature_type = feature.feature_type.replace(char::is_whitespace, "_");
    let location = wrap_location(&format_location(&feature.location), FEATURE_FIELD_WIDTH);
    out.push_str(&format!("     {:<15} {}\n", feature_type, location[0]));
    push_feature_lines(out, &location[1..]);

    for (key, values) in &feature.qualifiers {
        if values.is_empty() {
            push_feature_lines(out, &[format!("/{key}")]);
        }
        for value in values {
            let text = qualifier_text(key, value);
            let lines = if key == "translation" {
                wrap_hard(&text, FEATURE_FIELD_WIDTH)
            } else {
                wrap_words(&text, FEATURE_FIELD_WIDTH)
            };
            push_feature_lines(out, &lines);
        }
    }
}

fn molecule(rec: &SequenceRecord) -> &str {
    let annotated = rec.annotations.get(ANN_MOLECULE).map(String::as_str);
    match rec.alphabet() {
        Alphabet::Protein => "",
        Alphabet::Dna => annotated
            .filter(|m| m.contains("DNA"))
            .unwrap_or("DNA"),
        Alphabet::Rna => annotated
            .filter(|m| m.contains("RNA"))
            .unwrap_or("RNA"),
    }
}

fn write_record(out: &mut String, rec: &SequenceRecord) {
    let ann = |key: &str| {
        rec.annotations
            .get(key)
            .map(String::as_str)
            .filter(|v| !v.trim().is_empty())
    };
    let name = rec.id.replace(char::is_whitespace, "_");
    let unit = if rec.alphabet() == Alphabet::Protein { "aa" } else { "bp" };

    let locus = format!(
        "LOCUS       {:<16} {:>11} {} {:<6}  {:<8} {} {}",
        name,
        rec.residues().len(),
        unit,
        molecule(rec),
        ann(ANN_TOPOLOGY).unwrap_or(DEFAULT_TOPOLOGY),
        ann(ANN_DIVISION).unwrap_or(DEFAULT_DIVISION),
        ann(ANN_DATE).unwrap_or(DEFAULT_DATE),
    );
    out.push_str(&locus);
    out.push('\n');

    push_header(out, "DEFINITION", &rec.description);
    push_header(out, "ACCESSION", ann(ANN_ACCESSION).unwrap_or(&name));
    push_header(out, "VERSION", ann(ANN_VERSION).unwrap_or(&name));
    push_header(out, "KEYWORDS", ann(ANN_KEYWORDS).unwrap_or(EMPTY_FIELD));

    let organism = normalize_organism(ann(ORGANISM).unwrap_or(EMPTY_FIELD));
    push_header(out, "SOURCE", ann(ANN_SOURCE).unwrap_or(&organism));
    push_header(out, "  ORGANISM", &organism);
    if let Some(taxonomy) = ann(ANN_TAXONOMY) {
        for line in wrap_words(&flowed(taxonomy), LINE_WIDTH - HEADER_INDENT) {
            out.push_str(&" ".repeat(HEADER_INDENT));
            out.push_str(&line);
            out.push('\n');
        }
    }

    out.push_str("FEATURES             Location/Qualifiers\n");
    for feature in &rec.features {
        write_feature(out, feature);
    }

    out.push_str("ORIGIN\n");
    let residues = rec.residues().to_ascii_lowercase();
    for (i, line) in residues.as_bytes().chunks(ORIGIN_LINE).enumerate() {
        out.push_str(&format!("{:>9}", i * ORIGIN_LINE + 1));
        for group in line.chunks(ORIGIN_GROUP) {
            out.push(' ');
            out.push_str(&String::from_utf8_lossy(group));
        }
        out.push('\n');
    }
    out.push_str("//\n");
}

/// Write records as GenBank flat file text.
///
/// Missing header annotations are filled with fixed placeholders so output
/// stays deterministic.
pub fn write_genbank(records: &[SequenceRecord]) -> String {
    let mut out = String::new();
    for rec in records {
        write_record(&mut out, rec);
    }
    out
}

/// Codec for [`Format::Genbank`].
#[derive(Debug, Clone, Copy, Default)]
pub struct GenbankCodec;

impl Codec for GenbankCodec {
    fn format(&self) -> Format {
        Format::Genbank
    }

    fn parse(&self, text: &str) -> Result<Vec<SequenceRecord>> {
        parse_genbank(text)
    }

    fn serialize(&self, records: &[SequenceRecord]) -> Result<String> {
        Ok(write_genbank(records))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use seqmill_seq::{Location, Strand};

    const SIMPLE: &str = "\
LOCUS       AB000001                  70 bp    DNA     linear   PRI 01-JAN-2020
DEFINITION  Homo sapiens test gene.
ACCESSION   AB000001
VERSION     AB000001.1
KEYWORDS    .
SOURCE      Homo sapiens (human)
  ORGANISM  Homo sapiens
            Eukaryota; Metazoa; Chordata; Craniata; Vertebrata; Euteleostomi;
            Mammalia; Primates; Hominidae; Homo.
REFERENCE   1  (bases 1 to 70)
  AUTHORS   Doe,J.
FEATURES             Location/Qualifiers
     gene            1..70
                     /gene=\"TP53\"
     CDS             join(1..30,
                     41..70)
                     /gene=\"TP53\"
                     /codon_start=1
                     /note=\"tumor protein
                     p53\"
                     /pseudo
ORIGIN
        1 atgcatgcat gcatgcatgc atgcatgcat gcatgcatgc atgcatgcat gcatgcatgc
       61 atgcatgcat
//
";

    #[test]
    fn parses_header_fields() {
        let recs = parse_genbank(SIMPLE).unwrap();
        assert_eq!(recs.len(), 1);
        let rec = &recs[0];
        assert_eq!(rec.id, "AB000001");
        assert_eq!(rec.description, "Homo sapiens test gene.");
        assert_eq!(rec.alphabet(), Alphabet::Dna);
        assert_eq!(rec.residues().len(), 70);
        assert_eq!(&rec.residues()[..4], "ATGC");
        assert_eq!(rec.organism(), Some("Homo sapiens"));
        assert_eq!(rec.annotations[ANN_VERSION], "AB000001.1");
        assert_eq!(rec.annotations[ANN_DIVISION], "PRI");
        assert_eq!(rec.annotations[ANN_DATE], "01-JAN-2020");
        assert!(rec.annotations[ANN_TAXONOMY].ends_with("Hominidae; Homo."));
    }

    #[test]
    fn parses_features_and_qualifiers() {
        let recs = parse_genbank(SIMPLE).unwrap();
        let features = &recs[0].features;
        assert_eq!(features.len(), 2);
        let cds = &features[1];
        assert_eq!(cds.feature_type, "CDS");
        assert_eq!(cds.location.segments().len(), 2);
        assert_eq!(cds.location.segments()[1].start(), 40);
        assert_eq!(cds.qualifier("note").unwrap(), ["tumor protein p53"]);
        assert_eq!(cds.qualifier("codon_start").unwrap(), ["1"]);
        assert_eq!(cds.qualifier("pseudo").unwrap().len(), 0);
    }

    #[test]
    fn multi_record_without_final_terminator() {
        let text = "\
LOCUS       REC1                  10 bp    DNA     linear   PRI
ORIGIN
        1 atgcatgcat
//
LOCUS       REC2                  10 bp    DNA     linear   PRI
ORIGIN
        1 gggggaaaaa
";
        let recs = parse_genbank(text).unwrap();
        assert_eq!(recs.len(), 2);
        assert_eq!(recs[1].id, "REC2");
        assert_eq!(recs[1].residues(), "GGGGGAAAAA");
    }

    #[test]
    fn protein_unit_sets_alphabet() {
        let text = "LOCUS       P1                     4 aa            linear   UNK\nORIGIN\n        1 acgt\n//\n";
        let recs = parse_genbank(text).unwrap();
        assert_eq!(recs[0].alphabet(), Alphabet::Protein);
    }

    #[test]
    fn writer_layout() {
        let mut cds = Feature::new("CDS", Location::single(0, 9, Strand::Reverse).unwrap());
        cds.add_qualifier("codon_start", "1");
        cds.add_qualifier("translation", "M".repeat(70));
        let rec = SequenceRecord::new("seq 1", "ATGAAATAA", Alphabet::Dna)
            .unwrap()
            .with_feature(cds)
            .unwrap();
        let text = write_genbank(&[rec]);
        let lines: Vec<&str> = text.lines().collect();
        assert!(lines[0].starts_with("LOCUS       seq_1"));
        assert!(lines[0].contains(" 9 bp DNA   "));
        assert!(lines[0].ends_with("linear   UNK 01-JAN-1980"));
        assert!(text.contains("DEFINITION  .\n"));
        assert!(text.contains("     CDS             complement(1..9)\n"));
        assert!(text.contains("                     /codon_start=1\n"));
        assert!(text.contains(&format!("                     /translation=\"{}\n", "M".repeat(44))));
        assert!(text.contains("        1 atgaaataa\n//\n"));
    }

    #[test]
    fn round_trip_is_stable() {
        let once = write_genbank(&parse_genbank(SIMPLE).unwrap());
        let twice = write_genbank(&parse_genbank(&once).unwrap());
        assert_eq!(once, twice);
        assert!(once.contains("                     /note=\"tumor protein p53\"\n"));
        let back = parse_genbank(&once).unwrap();
        assert_eq!(back[0].features, parse_genbank(SIMPLE).unwrap()[0].features);
    }

    #[test]
    fn long_values_wrap_and_rejoin() {
        let note = "word ".repeat(30).trim_end().to_string();
        let protein = "MKV".repeat(40);
        let feature = Feature::new("CDS", Location::single(0, 12, Strand::Forward).unwrap())
            .with_qualifier("note", note.clone())
            .with_qualifier("translation", protein.clone());
        let rec = SequenceRecord::new("x", "ATGAAAGTTTAA", Alphabet::Dna)
            .unwrap()
            .with_description("a fairly long definition line ".repeat(5).trim_end())
            .with_feature(feature)
            .unwrap();
        let text = write_genbank(&[rec.clone()]);
        assert!(text.lines().all(|l| l.len() <= LINE_WIDTH));
        let back = parse_genbank(&text).unwrap();
        assert_eq!(back[0].features[0].qualifier("note").unwrap(), [note]);
        assert_eq!(back[0].features[0].qualifier("translation").unwrap(), [protein]);
        assert_eq!(back[0].description, rec.description);
    }

    #[test]
    fn placeholder_organism_normalized() {
        assert_eq!(normalize_organism(". . . ."), ".");
        assert_eq!(normalize_organism("Mnemiopsis leidyi. Mnemiopsis leidyi."), ".");
        assert_eq!(normalize_organism(" Homo sapiens "), "Homo sapiens");
        let repeated = SIMPLE.replace(
            "  ORGANISM  Homo sapiens",
            "  ORGANISM  Mnemiopsis leidyi. Mnemiopsis leidyi.",
        );
        let recs = parse_genbank(&repeated).unwrap();
        assert_eq!(recs[0].organism(), Some("."));
        let once = write_genbank(&recs);
        assert!(once.contains("  ORGANISM  .\n"));
        assert_eq!(write_genbank(&parse_genbank(&once).unwrap()), once);
        let text = SIMPLE.replace("  ORGANISM  Homo sapiens", "  ORGANISM  . . .");
        let recs = parse_genbank(&text).unwrap();
        assert_eq!(recs[0].organism(), Some("."));
    }

    #[test]
    fn header_whitespace_collapses() {
        // the double space lands exactly on the 68-column wrap boundary
        let description = format!("  {}  {} ", "a".repeat(68), "tail  end");
        let rec = SequenceRecord::new("x", "ACGT", Alphabet::Dna)
            .unwrap()
            .with_description(description);
        let text = write_genbank(&[rec]);
        assert!(text.contains(&format!("DEFINITION  {}\n            tail end\n", "a".repeat(68))));
        assert!(text.lines().all(|l| !l.trim().is_empty()));
        let back = parse_genbank(&text).unwrap();
        assert_eq!(back[0].description, format!("{} tail end", "a".repeat(68)));
        assert_eq!(write_genbank(&back), text);
    }

    #[test]
    fn malformed_input() {
        assert!(matches!(parse_genbank(""), Err(SeqmillError::EmptyInput(_))));
        assert!(matches!(
            parse_genbank("DEFINITION  nothing\n"),
            Err(SeqmillError::Format(_))
        ));
        let bad_location = SIMPLE.replace("1..70\n", "1..x70\n");
        assert!(matches!(
            parse_genbank(&bad_location),
            Err(SeqmillError::Format(_))
        ));
        let past_end = SIMPLE.replace("     gene            1..70", "     gene            1..700");
        assert!(matches!(parse_genbank(&past_end), Err(SeqmillError::Format(_))));
    }
}
