//! Codon translation with the standard genetic code (NCBI Table 1).
//!
//! Codons may be DNA or RNA, upper or lower case. IUPAC ambiguity codes are
//! expanded: a codon translates to a residue when every expansion agrees
//! (`GCN` is always alanine) and to `X` otherwise.

// ---------------------------------------------------------------------------
// Base encoding: A=0, C=1, G=2, T/U=3
// ---------------------------------------------------------------------------

fn base_index(b: u8) -> Option<usize> {
    match b.to_ascii_uppercase() {
        b'A' => Some(0),
        b'C' => Some(1),
        b'G' => Some(2),
        b'T' | b'U' => Some(3),
        _ => None,
    }
}

/// Concrete bases (as indices) an IUPAC code stands for.
fn expand_base(b: u8) -> &'static [usize] {
    match b.to_ascii_uppercase() {
        b'A' => &[0],
        b'C' => &[1],
        b'G' => &[2],
        b'T' | b'U' => &[3],
        b'R' => &[0, 2],
        b'Y' => &[1, 3],
        b'S' => &[1, 2],
        b'W' => &[0, 3],
        b'K' => &[2, 3],
        b'M' => &[0, 1],
        b'B' => &[1, 2, 3],
        b'D' => &[0, 2, 3],
        b'H' => &[0, 1, 3],
        b'V' => &[0, 1, 2],
        b'N' => &[0, 1, 2, 3],
        _ => &[],
    }
}

/// Convert a 3-base codon to an index in [0, 64).
fn codon_index(codon: &[u8]) -> Option<usize> {
    if codon.len() != 3 {
        return None;
    }
    let b1 = base_index(codon[0])?;
    let b2 = base_index(codon[1])?;
    let b3 = base_index(codon[2])?;
    Some(b1 * 16 + b2 * 4 + b3)
}

/// Convert an index in [0, 64) back to a codon (as DNA: A/C/G/T).
fn index_to_codon(idx: usize) -> [u8; 3] {
    const BASES: [u8; 4] = [b'A', b'C', b'G', b'T'];
    [BASES[idx >> 4], BASES[(idx >> 2) & 3], BASES[idx & 3]]
}

// Codon order: AAA, AAC, AAG, AAT, ACA, ACC, ACG, ACT, AGA, AGC, AGG, AGT,
//              ATA, ATC, ATG, ATT, CAA, CAC, CAG, CAT, CCA, CCC, CCG, CCT,
//              CGA, CGC, CGG, CGT, CTA, CTC, CTG, CTT, GAA, GAC, GAG, GAT,
//              GCA, GCC, GCG, GCT, GGA, GGC, GGG, GGT, GTA, GTC, GTG, GTT,
//              TAA, TAC, TAG, TAT, TCA, TCC, TCG, TCT, TGA, TGC, TGG, TGT,
//              TTA, TTC, TTG, TTT

/// Standard genetic code (NCBI Table 1).
const TABLE1_AA: [u8; 64] = [
    b'K', b'N', b'K', b'N', b'T', b'T', b'T', b'T', b'R', b'S', b'R', b'S',
    b'I', b'I', b'M', b'I', b'Q', b'H', b'Q', b'H', b'P', b'P', b'P', b'P',
    b'R', b'R', b'R', b'R', b'L', b'L', b'L', b'L', b'E', b'D', b'E', b'D',
    b'A', b'A', b'A', b'A', b'G', b'G', b'G', b'G', b'V', b'V', b'V', b'V',
    b'*', b'Y', b'*', b'Y', b'S', b'S', b'S', b'S', b'*', b'C', b'W', b'C',
    b'L', b'F', b'L', b'F',
];

/// Residue written for codons that cannot be resolved to one amino acid.
pub const UNKNOWN_RESIDUE: u8 = b'X';

/// Residue written for stop codons under [`StopPolicy::Mark`].
pub const STOP_RESIDUE: u8 = b'*';

/// What translation does when it meets a stop codon.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum StopPolicy {
    /// Emit `*` and keep translating.
    #[default]
    Mark,
    /// End the translation at the first stop codon.
    Truncate,
}

/// A genetic code translation table.
#[derive(Debug, Clone)]
pub struct GeneticCode {
    table: [u8; 64],
}

impl GeneticCode {
    /// The standard genetic code (NCBI Table 1).
    pub fn standard() -> Self {
        Self { table: TABLE1_AA }
    }

    /// Translate a single codon.
    ///
    /// Returns the amino acid, `*` for stops, `-` for an all-gap codon and
    /// `X` for anything unresolvable.
    pub fn translate_codon(&self, codon: &[u8]) -> u8 {
        if let Some(idx) = codon_index(codon) {
            return self.table[idx];
        }
        if codon.len() == 3 && codon.iter().all(|&b| b == b'-') {
            return b'-';
        }
        self.resolve_ambiguous(codon).unwrap_or(UNKNOWN_RESIDUE)
    }

    fn resolve_ambiguous(&self, codon: &[u8]) -> Option<u8> {
        if codon.len() != 3 {
            return None;
        }
        let (e1, e2, e3) = (
            expand_base(codon[0]),
            expand_base(codon[1]),
            expand_base(codon[2]),
        );
        let mut resolved = None;
        for &b1 in e1 {
            for &b2 in e2 {
                for &b3 in e3 {
                    let aa = self.table[b1 * 16 + b2 * 4 + b3];
                    match resolved {
                        None => resolved = Some(aa),
                        Some(prev) if prev != aa => return None,
                        Some(_) => {}
                    }
                }
            }
        }
        resolved
    }

    /// Translate a nucleotide sequence codon by codon.
    ///
    /// Incomplete trailing codons are ignored.
    pub fn translate(&self, seq: &[u8], stop: StopPolicy) -> Vec<u8> {
        let mut protein = Vec::with_capacity(seq.len() / 3);
        for codon in seq.chunks_exact(3) {
            let aa = self.translate_codon(codon);
            if aa == STOP_RESIDUE && stop == StopPolicy::Truncate {
                break;
            }
            protein.push(aa);
        }
        protein
    }

    /// Check whether a codon is a stop codon.
    pub fn is_stop(&self, codon: &[u8]) -> bool {
        codon_index(codon).map_or(false, |idx| self.table[idx] == STOP_RESIDUE)
    }

    /// All codons (as DNA, in lexicographic order) encoding `aa`.
    pub fn codons_for(&self, aa: u8) -> Vec<[u8; 3]> {
        let aa = aa.to_ascii_uppercase();
        (0..64)
            .filter(|&i| self.table[i] == aa)
            .map(index_to_codon)
            .collect()
    }
}

impl Default for GeneticCode {
    fn default() -> Self {
        Self::standard()
    }
}
