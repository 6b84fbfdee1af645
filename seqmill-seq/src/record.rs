//! Sequence records: id, description, residues and their annotations.

use indexmap::IndexMap;

use seqmill_core::{Annotated, ContentAddressable, Result, SeqmillError, Sequence, Summarizable};

use crate::alphabet::Alphabet;
use crate::feature::Feature;

/// Header metadata carried alongside a record (organism, accession, date, ...).
pub type Annotations = IndexMap<String, String>;

/// Annotation key holding the source organism.
pub const ORGANISM: &str = "organism";

/// A single biological sequence with its features.
///
/// Residues keep the case they were given; alphabet checks are
/// case-insensitive. Every feature segment must lie within the residues.
/// Residues and alphabet change only through checked methods.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "RawRecord"))]
pub struct SequenceRecord {
    pub id: String,
    pub description: String,
    pub(crate) alphabet: Alphabet,
    pub(crate) residues: String,
    pub features: Vec<Feature>,
    pub annotations: Annotations,
    /// Residues clipped off the front by the last frame selection.
    frame_prefix: String,
}

impl SequenceRecord {
    /// Create a record, validating the residues against `alphabet`.
    pub fn new(
        id: impl Into<String>,
        residues: impl Into<String>,
        alphabet: Alphabet,
    ) -> Result<Self> {
        let residues = residues.into();
        alphabet.validate(&residues)?;
        Ok(Self::from_validated(id.into(), residues, alphabet))
    }

    /// Create a record from residues already known to fit `alphabet`.
    pub(crate) fn from_validated(id: String, residues: String, alphabet: Alphabet) -> Self {
        Self {
            id,
            description: String::new(),
            alphabet,
            residues,
            features: Vec::new(),
            annotations: Annotations::new(),
            frame_prefix: String::new(),
        }
    }

    pub fn residues(&self) -> &str {
        &self.residues
    }

    pub fn alphabet(&self) -> Alphabet {
        self.alphabet
    }

    /// Replace the residues, keeping alphabet and features.
    ///
    /// Fails if the new residues do not fit the alphabet or are too short
    /// for an existing feature; the record is unchanged on failure.
    pub fn set_residues(&mut self, residues: impl Into<String>) -> Result<()> {
        let residues = residues.into();
        self.alphabet.validate(&residues)?;
        let old = std::mem::replace(&mut self.residues, residues);
        if let Err(e) = self.features.iter().try_for_each(|f| self.check_feature(f)) {
            self.residues = old;
            return Err(e);
        }
        Ok(())
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Attach a feature, failing if it reaches past the residues.
    pub fn with_feature(mut self, feature: Feature) -> Result<Self> {
        self.push_feature(feature)?;
        Ok(self)
    }

    /// Attach a feature, failing if it reaches past the residues.
    pub fn push_feature(&mut self, feature: Feature) -> Result<()> {
        self.check_feature(&feature)?;
        self.features.push(feature);
        Ok(())
    }

    pub fn with_annotation(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.annotations.insert(key.into(), value.into());
        self
    }

    /// The organism annotation, if any.
    pub fn organism(&self) -> Option<&str> {
        self.annotations.get(ORGANISM).map(String::as_str)
    }

    /// Number of leading residues clipped by the last `select_frame`.
    pub fn frame_offset(&self) -> usize {
        self.frame_prefix.len()
    }

    pub(crate) fn frame_prefix(&self) -> &str {
        &self.frame_prefix
    }

    pub(crate) fn set_frame_prefix(&mut self, prefix: String) {
        self.frame_prefix = prefix;
    }

    pub(crate) fn take_frame_prefix(&mut self) -> String {
        std::mem::take(&mut self.frame_prefix)
    }

    /// Check residues and feature bounds.
    pub fn validate(&self) -> Result<()> {
        self.alphabet.validate(&self.residues)?;
        self.features.iter().try_for_each(|f| self.check_feature(f))
    }

    fn check_feature(&self, feature: &Feature) -> Result<()> {
        let end = feature.location.max_end();
        if end > self.residues.len() {
            return Err(SeqmillError::Range(format!(
                "{} feature of '{}' ends at {} past sequence length {}",
                feature.feature_type,
                self.id,
                end,
                self.residues.len()
            )));
        }
        Ok(())
    }
}

#[cfg(feature = "serde")]
#[derive(serde::Deserialize)]
struct RawRecord {
    id: String,
    description: String,
    alphabet: Alphabet,
    residues: String,
    features: Vec<Feature>,
    annotations: Annotations,
    #[serde(default)]
    frame_prefix: String,
}

#[cfg(feature = "serde")]
impl TryFrom<RawRecord> for SequenceRecord {
    type Error = SeqmillError;

    fn try_from(raw: RawRecord) -> Result<Self> {
        let rec = Self {
            id: raw.id,
            description: raw.description,
            alphabet: raw.alphabet,
            residues: raw.residues,
            features: raw.features,
            annotations: raw.annotations,
            frame_prefix: raw.frame_prefix,
        };
        rec.validate()?;
        Ok(rec)
    }
}

impl Sequence for SequenceRecord {
    fn as_bytes(&self) -> &[u8] {
        self.residues.as_bytes()
    }
}

impl Annotated for SequenceRecord {
    fn name(&self) -> &str {
        &self.id
    }

    fn description(&self) -> Option<&str> {
        (!self.description.is_empty()).then_some(self.description.as_str())
    }
}

impl ContentAddressable for SequenceRecord {
    fn content_bytes(&self) -> Vec<u8> {
        self.residues.as_bytes().to_vec()
    }
}

impl Summarizable for SequenceRecord {
    fn summary(&self) -> String {
        let unit = if self.alphabet == Alphabet::Protein { "aa" } else { "bp" };
        let preview_len = self.residues.len().min(20);
        let ellipsis = if self.residues.len() > 20 { "..." } else { "" };
        format!(
            "{} {} ({} {}, {} features): {}{}",
            self.id,
            self.alphabet,
            self.residues.len(),
            unit,
            self.features.len(),
            &self.residues[..preview_len],
            ellipsis
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feature::{Location, Strand};

    fn gene(start: usize, end: usize) -> Feature {
        Feature::new("gene", Location::single(start, end, Strand::Forward).unwrap())
    }

    #[test]
    fn new_validates_residues() {
        assert!(SequenceRecord::new("s1", "ACGT", Alphabet::Dna).is_ok());
        assert!(matches!(
            SequenceRecord::new("s1", "ACGE", Alphabet::Dna),
            Err(SeqmillError::AlphabetMismatch(_))
        ));
    }

    #[test]
    fn keeps_case() {
        let rec = SequenceRecord::new("s1", "acGT", Alphabet::Dna).unwrap();
        assert_eq!(rec.residues, "acGT");
    }

    #[test]
    fn feature_bounds_checked() {
        let rec = SequenceRecord::new("s1", "ACGTACGT", Alphabet::Dna).unwrap();
        assert!(rec.clone().with_feature(gene(0, 8)).is_ok());
        assert!(matches!(
            rec.with_feature(gene(4, 9)),
            Err(SeqmillError::Range(_))
        ));
    }

    #[test]
    fn set_residues_is_checked() {
        let mut rec = SequenceRecord::new("s1", "ACGTACGT", Alphabet::Dna)
            .unwrap()
            .with_feature(gene(2, 6))
            .unwrap();
        assert!(matches!(
            rec.set_residues("MKV"),
            Err(SeqmillError::AlphabetMismatch(_))
        ));
        assert!(matches!(rec.set_residues("ACG"), Err(SeqmillError::Range(_))));
        assert_eq!(rec.residues(), "ACGTACGT");
        rec.set_residues("TTTTTT").unwrap();
        assert_eq!(rec.residues(), "TTTTTT");
        assert_eq!(rec.alphabet(), Alphabet::Dna);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn deserialized_records_are_checked() {
        let rec = SequenceRecord::new("s1", "ACGT", Alphabet::Dna)
            .unwrap()
            .with_feature(gene(0, 4))
            .unwrap();
        let json = serde_json::to_string(&rec).unwrap();
        assert_eq!(serde_json::from_str::<SequenceRecord>(&json).unwrap(), rec);
        let bad = json.replace("\"ACGT\"", "\"ACGE\"");
        assert!(serde_json::from_str::<SequenceRecord>(&bad).is_err());
    }

    #[test]
    fn content_hash_tracks_residues() {
        let a = SequenceRecord::new("a", "ACGT", Alphabet::Dna).unwrap();
        let b = SequenceRecord::new("b", "ACGT", Alphabet::Dna).unwrap();
        assert_eq!(a.content_hash(), b.content_hash());
    }

    #[test]
    fn summary_mentions_units() {
        let rec = SequenceRecord::new("p1", "MKV", Alphabet::Protein).unwrap();
        assert_eq!(rec.summary(), "p1 Protein (3 aa, 0 features): MKV");
        assert_eq!(rec.frame_offset(), 0);
    }
}
