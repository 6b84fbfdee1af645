//! Ordered collections of records sharing one alphabet.

use seqmill_core::{ContentAddressable, Result, SeqmillError, Sequence, Summarizable};

use crate::alphabet::Alphabet;
use crate::format::Format;
use crate::record::SequenceRecord;

/// An ordered list of records plus their input and output format tags.
///
/// All records share `alphabet`; operations check it once at their boundary.
/// Only `output_format` matters when the collection is written out.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SequenceCollection {
    pub records: Vec<SequenceRecord>,
    pub alphabet: Alphabet,
    pub input_format: Format,
    pub output_format: Format,
}

impl SequenceCollection {
    /// Build a collection, inferring the shared alphabet from the records.
    ///
    /// Fails with `EmptyInput` for an empty record list and with
    /// `AlphabetMismatch` when records disagree on their alphabet.
    pub fn new(records: Vec<SequenceRecord>, format: Format) -> Result<Self> {
        let first = records.first().ok_or_else(|| {
            SeqmillError::EmptyInput("a collection needs at least one record".into())
        })?;
        let alphabet = first.alphabet;
        if let Some(odd) = records.iter().find(|r| r.alphabet != alphabet) {
            return Err(SeqmillError::AlphabetMismatch(format!(
                "record '{}' is {} but '{}' is {}",
                odd.id, odd.alphabet, first.id, alphabet
            )));
        }
        Ok(Self {
            records,
            alphabet,
            input_format: format,
            output_format: format,
        })
    }

    /// Same format tags and alphabet, different records.
    ///
    /// Callers guarantee the records are non-empty and carry `alphabet`.
    pub(crate) fn derive(&self, records: Vec<SequenceRecord>, alphabet: Alphabet) -> Self {
        Self {
            records,
            alphabet,
            input_format: self.input_format,
            output_format: self.output_format,
        }
    }

    /// Change the output format (the records are untouched).
    pub fn with_output_format(mut self, format: Format) -> Self {
        self.output_format = format;
        self
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, SequenceRecord> {
        self.records.iter()
    }

    /// First record with the given id.
    pub fn get(&self, id: &str) -> Option<&SequenceRecord> {
        self.records.iter().find(|r| r.id == id)
    }

    /// Ids in collection order.
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.records.iter().map(|r| r.id.as_str())
    }

    /// Force every record to `alphabet`, validating the residues first.
    pub fn set_alphabet(&mut self, alphabet: Alphabet) -> Result<()> {
        for rec in &self.records {
            alphabet.validate(&rec.residues).map_err(|e| {
                SeqmillError::AlphabetMismatch(format!("record '{}': {}", rec.id, e))
            })?;
        }
        for rec in &mut self.records {
            rec.alphabet = alphabet;
        }
        self.alphabet = alphabet;
        Ok(())
    }
}

impl ContentAddressable for SequenceCollection {
    /// Ids and residues in order; formats and annotations do not count.
    fn content_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::new();
        for rec in &self.records {
            bytes.extend_from_slice(rec.id.as_bytes());
            bytes.push(b'\n');
            bytes.extend_from_slice(rec.residues.as_bytes());
            bytes.push(b'\n');
        }
        bytes
    }
}

impl Summarizable for SequenceCollection {
    fn summary(&self) -> String {
        let residues: usize = self.records.iter().map(|r| r.ungapped_len()).sum();
        format!(
            "{} {} record(s), {} residues ({} -> {})",
            self.len(),
            self.alphabet,
            residues,
            self.input_format,
            self.output_format
        )
    }
}

impl<'a> IntoIterator for &'a SequenceCollection {
    type Item = &'a SequenceRecord;
    type IntoIter = std::slice::Iter<'a, SequenceRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dna(id: &str, residues: &str) -> SequenceRecord {
        SequenceRecord::new(id, residues, Alphabet::Dna).unwrap()
    }

    #[test]
    fn empty_collection_rejected() {
        assert!(matches!(
            SequenceCollection::new(Vec::new(), Format::Fasta),
            Err(SeqmillError::EmptyInput(_))
        ));
    }

    #[test]
    fn mixed_alphabets_rejected() {
        let prot = SequenceRecord::new("p", "MKV", Alphabet::Protein).unwrap();
        assert!(matches!(
            SequenceCollection::new(vec![dna("d", "ACGT"), prot], Format::Fasta),
            Err(SeqmillError::AlphabetMismatch(_))
        ));
    }

    #[test]
    fn formats_start_equal() {
        let col = SequenceCollection::new(vec![dna("a", "ACGT")], Format::Genbank).unwrap();
        assert_eq!(col.input_format, Format::Genbank);
        assert_eq!(col.output_format, Format::Genbank);
        let col = col.with_output_format(Format::Fasta);
        assert_eq!(col.input_format, Format::Genbank);
        assert_eq!(col.output_format, Format::Fasta);
    }

    #[test]
    fn set_alphabet_validates_before_mutating() {
        let mut col =
            SequenceCollection::new(vec![dna("a", "ACGT"), dna("b", "ACGG")], Format::Fasta)
                .unwrap();
        assert!(col.set_alphabet(Alphabet::Rna).is_err());
        assert_eq!(col.alphabet, Alphabet::Dna);
        assert!(col.records.iter().all(|r| r.alphabet == Alphabet::Dna));
        col.set_alphabet(Alphabet::Protein).unwrap();
        assert_eq!(col.records[1].alphabet, Alphabet::Protein);
    }

    #[test]
    fn summary_and_hash() {
        let col =
            SequenceCollection::new(vec![dna("a", "AC-GT"), dna("b", "GG")], Format::Fasta)
                .unwrap();
        assert_eq!(col.summary(), "2 DNA record(s), 6 residues (fasta -> fasta)");
        let renamed = SequenceCollection::new(vec![dna("x", "AC-GT"), dna("b", "GG")], Format::Fasta)
            .unwrap();
        assert_ne!(col.content_hash(), renamed.content_hash());
        assert_eq!(
            col.content_hash(),
            col.clone().with_output_format(Format::Nexus).content_hash()
        );
    }

    #[test]
    fn lookup_by_id() {
        let col =
            SequenceCollection::new(vec![dna("a", "ACGT"), dna("b", "GG")], Format::Fasta).unwrap();
        assert_eq!(col.get("b").unwrap().residues, "GG");
        assert!(col.get("c").is_none());
        assert_eq!(col.ids().collect::<Vec<_>>(), ["a", "b"]);
    }
}
