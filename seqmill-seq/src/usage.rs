//! Codon usage frequency tables keyed by organism.
//!
//! The tables are read-only data supplied by the caller, either built in
//! code or loaded from JSON of the shape
//! `{"organism": {"A": [["GCC", 0.40], ["GCT", 0.26]], ...}}`.

use std::collections::BTreeMap;

use seqmill_core::{Result, SeqmillError};

/// A codon with its relative usage frequency.
pub type CodonFrequency = (String, f64);

/// Codon frequencies for one organism, keyed by one-letter amino acid.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct CodonUsage {
    residues: BTreeMap<char, Vec<CodonFrequency>>,
}

impl CodonUsage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the codons for `aa`. Codons are stored as uppercase DNA.
    pub fn insert<I, S>(&mut self, aa: char, codons: I) -> Result<()>
    where
        I: IntoIterator<Item = (S, f64)>,
        S: AsRef<str>,
    {
        let codons = codons
            .into_iter()
            .map(|(codon, freq)| Ok((normalize_codon(codon.as_ref())?, freq)))
            .collect::<Result<Vec<_>>>()?;
        self.residues.insert(aa.to_ascii_uppercase(), codons);
        Ok(())
    }

    /// Codons listed for `aa`, in table order.
    pub fn codons(&self, aa: char) -> Option<&[CodonFrequency]> {
        self.residues
            .get(&aa.to_ascii_uppercase())
            .map(Vec::as_slice)
    }

    fn normalized(self) -> Result<Self> {
        let mut out = CodonUsage::new();
        for (aa, codons) in self.residues {
            out.insert(aa, codons)?;
        }
        Ok(out)
    }
}

fn normalize_codon(codon: &str) -> Result<String> {
    let dna: String = codon
        .chars()
        .map(|c| match c.to_ascii_uppercase() {
            'U' => 'T',
            other => other,
        })
        .collect();
    if dna.len() == 3 && dna.bytes().all(|b| matches!(b, b'A' | b'C' | b'G' | b'T')) {
        Ok(dna)
    } else {
        Err(SeqmillError::InvalidInput(format!(
            "'{codon}' is not an unambiguous codon"
        )))
    }
}

/// Codon usage tables for any number of organisms.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct CodonUsageTable {
    organisms: BTreeMap<String, CodonUsage>,
}

impl CodonUsageTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, organism: impl Into<String>, usage: CodonUsage) {
        self.organisms.insert(organism.into(), usage);
    }

    /// Usage for `organism`, failing with `InvalidInput` when it is unknown.
    pub fn organism(&self, organism: &str) -> Result<&CodonUsage> {
        self.organisms.get(organism).ok_or_else(|| {
            SeqmillError::InvalidInput(format!("no codon usage table for organism '{organism}'"))
        })
    }

    /// Known organism names, sorted.
    pub fn organisms(&self) -> impl Iterator<Item = &str> {
        self.organisms.keys().map(String::as_str)
    }

    /// Load tables from JSON. Codons are normalized to uppercase DNA.
    #[cfg(feature = "serde")]
    pub fn from_json(json: &str) -> Result<Self> {
        let raw: CodonUsageTable = serde_json::from_str(json)
            .map_err(|e| SeqmillError::Format(format!("codon usage JSON: {e}")))?;
        let mut table = CodonUsageTable::new();
        for (organism, usage) in raw.organisms {
            table.insert(organism, usage.normalized()?);
        }
        Ok(table)
    }
}
