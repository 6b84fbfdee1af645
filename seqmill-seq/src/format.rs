//! Canonical flat-file format tags.
//!
//! Collections remember the format they were read from and the format they
//! will be written to. User-facing names are normalized here so that `gb`
//! and `genbank` (or `stklm` and `stockholm`) select the same codec.

use std::fmt;
use std::str::FromStr;

use seqmill_core::{Result, SeqmillError};

/// A supported serialization format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Format {
    Fasta,
    Genbank,
    Nexus,
    /// Sequential PHYLIP with strict 10-character ids.
    Phylip,
    /// Sequential PHYLIP with unrestricted ids.
    PhylipRelaxed,
    /// Interleaved PHYLIP with strict 10-character ids.
    PhylipInterleaved,
    /// Interleaved PHYLIP with unrestricted ids.
    PhylipInterleavedRelaxed,
    Stockholm,
}

impl Format {
    /// All formats, in a fixed order.
    pub const ALL: [Format; 8] = [
        Format::Fasta,
        Format::Genbank,
        Format::Nexus,
        Format::Phylip,
        Format::PhylipRelaxed,
        Format::PhylipInterleaved,
        Format::PhylipInterleavedRelaxed,
        Format::Stockholm,
    ];

    /// The canonical token for this format.
    pub fn token(self) -> &'static str {
        match self {
            Format::Fasta => "fasta",
            Format::Genbank => "genbank",
            Format::Nexus => "nexus",
            Format::Phylip => "phylip",
            Format::PhylipRelaxed => "phylip-relaxed",
            Format::PhylipInterleaved => "phylipi",
            Format::PhylipInterleavedRelaxed => "phylipis",
            Format::Stockholm => "stockholm",
        }
    }

    /// Whether records written in this format keep their features.
    pub fn carries_features(self) -> bool {
        matches!(self, Format::Genbank | Format::Nexus | Format::Stockholm)
    }

    /// Whether this is one of the PHYLIP variants.
    pub fn is_phylip(self) -> bool {
        matches!(
            self,
            Format::Phylip
                | Format::PhylipRelaxed
                | Format::PhylipInterleaved
                | Format::PhylipInterleavedRelaxed
        )
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

impl FromStr for Format {
    type Err = SeqmillError;

    fn from_str(s: &str) -> Result<Self> {
        let format = match s.trim().to_ascii_lowercase().as_str() {
            "fasta" | "fa" | "fas" | "fna" | "faa" => Format::Fasta,
            "gb" | "gbk" | "genbank" => Format::Genbank,
            "nexus" | "nex" | "nxs" => Format::Nexus,
            "phylip" | "phy" | "phylip-sequential" => Format::Phylip,
            "phylip-relaxed" | "phylipr" | "phyr" | "phylipsr" => Format::PhylipRelaxed,
            "phylipi" | "phylip-interleaved" => Format::PhylipInterleaved,
            "phylipis" | "phylip-interleaved-relaxed" => Format::PhylipInterleavedRelaxed,
            "stockholm" | "stklm" | "sto" => Format::Stockholm,
            other => {
                return Err(SeqmillError::InvalidInput(format!(
                    "unknown format '{other}'"
                )))
            }
        };
        Ok(format)
    }
}
