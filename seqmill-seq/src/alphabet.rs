//! Alphabet definitions for biological sequence validation.
//!
//! An [`Alphabet`] is a runtime tag carried by every record and collection.
//! Operations check it once at their boundary instead of probing residues on
//! every call.

use std::fmt;
use std::str::FromStr;

use seqmill_core::{Result, SeqmillError};

/// IUPAC DNA alphabet: `ACGTNRYSWKMBDHV`.
const DNA_BYTES: &[u8] = b"ACGTNRYSWKMBDHV";

/// IUPAC RNA alphabet: `ACGUNRYSWKMBDHV`.
const RNA_BYTES: &[u8] = b"ACGUNRYSWKMBDHV";

/// Protein alphabet: 20 standard amino acids plus `XBZJUO*`.
const PROTEIN_BYTES: &[u8] = b"ACDEFGHIKLMNPQRSTVWYXBZJUO*";

/// Gap and missing-data symbols accepted by every alphabet.
pub const GAP_BYTES: &[u8] = seqmill_core::GAP_SYMBOLS;

/// Residue alphabet of a sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Alphabet {
    Dna,
    Rna,
    Protein,
}

impl Alphabet {
    /// Human-readable name (e.g. "DNA").
    pub fn name(self) -> &'static str {
        match self {
            Alphabet::Dna => "DNA",
            Alphabet::Rna => "RNA",
            Alphabet::Protein => "Protein",
        }
    }

    /// The set of valid uppercase residue bytes, excluding gap symbols.
    pub fn residue_bytes(self) -> &'static [u8] {
        match self {
            Alphabet::Dna => DNA_BYTES,
            Alphabet::Rna => RNA_BYTES,
            Alphabet::Protein => PROTEIN_BYTES,
        }
    }

    /// Whether `b` is a residue of this alphabet (case-insensitive).
    pub fn is_residue(self, b: u8) -> bool {
        self.residue_bytes().contains(&b.to_ascii_uppercase())
    }

    /// Whether `b` may appear in a residue string of this alphabet.
    pub fn is_valid(self, b: u8) -> bool {
        self.is_residue(b) || GAP_BYTES.contains(&b)
    }

    /// DNA or RNA.
    pub fn is_nucleic(self) -> bool {
        matches!(self, Alphabet::Dna | Alphabet::Rna)
    }

    /// Check that every byte of `residues` is valid, reporting the first offender.
    pub fn validate(self, residues: &str) -> Result<()> {
        match residues.bytes().enumerate().find(|&(_, b)| !self.is_valid(b)) {
            None => Ok(()),
            Some((i, b)) => Err(SeqmillError::AlphabetMismatch(format!(
                "invalid {} residue '{}' (0x{:02X}) at position {}",
                self.name(),
                b as char,
                b,
                i
            ))),
        }
    }

    /// Guess the alphabet of a residue string.
    ///
    /// Gap symbols are ignored. If at least 90% of what remains is
    /// `ACGTUN`, the string is nucleic: RNA when it contains `U` but no `T`,
    /// DNA otherwise. Everything else is protein. Empty input guesses DNA.
    pub fn guess(residues: &str) -> Alphabet {
        let mut total = 0usize;
        let mut nucleic = 0usize;
        let mut has_t = false;
        let mut has_u = false;
        for b in residues.bytes().map(|b| b.to_ascii_uppercase()) {
            if GAP_BYTES.contains(&b) || b.is_ascii_whitespace() {
                continue;
            }
            total += 1;
            match b {
                b'A' | b'C' | b'G' | b'N' => nucleic += 1,
                b'T' => {
                    nucleic += 1;
                    has_t = true;
                }
                b'U' => {
                    nucleic += 1;
                    has_u = true;
                }
                _ => {}
            }
        }
        if total == 0 || nucleic * 10 >= total * 9 {
            if has_u && !has_t {
                Alphabet::Rna
            } else {
                Alphabet::Dna
            }
        } else {
            Alphabet::Protein
        }
    }

    /// Fail unless the alphabet is DNA or RNA.
    pub fn require_nucleic(self, operation: &str) -> Result<()> {
        if self.is_nucleic() {
            Ok(())
        } else {
            Err(SeqmillError::alphabet(
                operation,
                format!("requires nucleotide sequences, got {}", self.name()),
            ))
        }
    }

    /// Fail unless the alphabet is protein.
    pub fn require_protein(self, operation: &str) -> Result<()> {
        if self == Alphabet::Protein {
            Ok(())
        } else {
            Err(SeqmillError::alphabet(
                operation,
                format!("requires protein sequences, got {}", self.name()),
            ))
        }
    }
}

impl fmt::Display for Alphabet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Alphabet {
    type Err = SeqmillError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "dna" | "nucl" | "nucleotide" => Ok(Alphabet::Dna),
            "rna" => Ok(Alphabet::Rna),
            "protein" | "prot" | "pep" | "aa" => Ok(Alphabet::Protein),
            other => Err(SeqmillError::InvalidInput(format!(
                "unknown alphabet '{other}'"
            ))),
        }
    }
}
