//! Residue mass tables for molecular weight estimation.

use std::collections::BTreeMap;

use crate::alphabet::Alphabet;

/// Average masses (Da) for one alphabet.
///
/// `masses` gives the residue mass, `complement_masses` the mass of the
/// residue paired with it on the opposite strand. Residues missing from the
/// table weigh `fallback`.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ResidueWeights {
    pub masses: BTreeMap<char, f64>,
    pub complement_masses: BTreeMap<char, f64>,
    pub water: f64,
    pub fallback: f64,
}

const WATER: f64 = 18.015;

// Nucleoside monophosphates.
const DNA_MASSES: [(char, f64); 4] = [
    ('A', 331.2218),
    ('C', 307.1971),
    ('G', 347.2212),
    ('T', 322.2085),
];

const RNA_MASSES: [(char, f64); 4] = [
    ('A', 347.2212),
    ('C', 323.1965),
    ('G', 363.2206),
    ('U', 324.1813),
];

const AMINO_ACID_MASSES: [(char, f64); 20] = [
    ('A', 89.09), ('R', 174.20), ('N', 132.12), ('D', 133.10),
    ('C', 121.16), ('E', 147.13), ('Q', 146.15), ('G', 75.03),
    ('H', 155.16), ('I', 131.17), ('L', 131.17), ('K', 146.19),
    ('M', 149.21), ('F', 165.19), ('P', 115.13), ('S', 105.09),
    ('T', 119.12), ('W', 204.23), ('Y', 181.19), ('V', 117.15),
];

fn pair_masses(masses: &BTreeMap<char, f64>, pairs: &[(char, char)]) -> BTreeMap<char, f64> {
    pairs
        .iter()
        .filter_map(|&(base, partner)| masses.get(&partner).map(|&m| (base, m)))
        .collect()
}

impl ResidueWeights {
    /// DNA nucleotide masses; the fallback is the mean of the four bases.
    pub fn dna() -> Self {
        let masses: BTreeMap<char, f64> = DNA_MASSES.into_iter().collect();
        let complement_masses =
            pair_masses(&masses, &[('A', 'T'), ('T', 'A'), ('C', 'G'), ('G', 'C')]);
        Self {
            fallback: mean(&masses),
            masses,
            complement_masses,
            water: WATER,
        }
    }

    /// RNA nucleotide masses; the fallback is the mean of the four bases.
    pub fn rna() -> Self {
        let masses: BTreeMap<char, f64> = RNA_MASSES.into_iter().collect();
        let complement_masses =
            pair_masses(&masses, &[('A', 'U'), ('U', 'A'), ('C', 'G'), ('G', 'C')]);
        Self {
            fallback: mean(&masses),
            masses,
            complement_masses,
            water: WATER,
        }
    }

    /// Amino acid masses. Ambiguous or non-standard residues use the average
    /// of all 20.
    pub fn protein() -> Self {
        Self {
            masses: AMINO_ACID_MASSES.into_iter().collect(),
            complement_masses: BTreeMap::new(),
            water: WATER,
            fallback: 128.16,
        }
    }

    /// The shipped table for `alphabet`.
    pub fn for_alphabet(alphabet: Alphabet) -> Self {
        match alphabet {
            Alphabet::Dna => Self::dna(),
            Alphabet::Rna => Self::rna(),
            Alphabet::Protein => Self::protein(),
        }
    }

    pub fn mass(&self, residue: char) -> f64 {
        self.masses
            .get(&residue.to_ascii_uppercase())
            .copied()
            .unwrap_or(self.fallback)
    }

    pub fn complement_mass(&self, residue: char) -> f64 {
        self.complement_masses
            .get(&residue.to_ascii_uppercase())
            .copied()
            .unwrap_or(self.fallback)
    }
}

fn mean(masses: &BTreeMap<char, f64>) -> f64 {
    masses.values().sum::<f64>() / masses.len() as f64
}
