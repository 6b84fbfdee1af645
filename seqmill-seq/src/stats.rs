//! Per-collection statistics: molecular weights, lengths and id listings.

use crate::alphabet::{Alphabet, GAP_BYTES};
use crate::collection::SequenceCollection;
use crate::weights::ResidueWeights;

/// Estimated mass of one record in Daltons.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MolecularWeight {
    pub id: String,
    pub single_strand: f64,
    /// Duplex mass; only reported for DNA.
    pub double_strand: Option<f64>,
}

fn chain_mass(residues: &[char], mass: impl Fn(char) -> f64, water: f64) -> f64 {
    if residues.is_empty() {
        return 0.0;
    }
    let sum: f64 = residues.iter().map(|&c| mass(c)).sum();
    // One water is lost per bond.
    sum - (residues.len() as f64 - 1.0) * water
}

/// Molecular weight of every record, using `weights` for residue masses.
///
/// Gap symbols are ignored. DNA records also get a double-strand mass that
/// adds the complementary strand.
pub fn molecular_weight(
    collection: &SequenceCollection,
    weights: &ResidueWeights,
) -> Vec<MolecularWeight> {
    collection
        .iter()
        .map(|rec| {
            let residues: Vec<char> = rec
                .residues
                .chars()
                .filter(|c| c.is_ascii() && !GAP_BYTES.contains(&(*c as u8)))
                .collect();
            let single_strand = chain_mass(&residues, |c| weights.mass(c), weights.water);
            let double_strand = (rec.alphabet == Alphabet::Dna).then(|| {
                single_strand
                    + chain_mass(&residues, |c| weights.complement_mass(c), weights.water)
            });
            MolecularWeight {
                id: rec.id.clone(),
                single_strand,
                double_strand,
            }
        })
        .collect()
}

/// Residue count of every record, gaps included.
pub fn seq_lengths(collection: &SequenceCollection) -> Vec<(String, usize)> {
    collection
        .iter()
        .map(|rec| (rec.id.clone(), rec.residues.len()))
        .collect()
}

pub fn num_seqs(collection: &SequenceCollection) -> usize {
    collection.len()
}

/// Mean residue count over all records.
pub fn ave_seq_length(collection: &SequenceCollection) -> f64 {
    if collection.is_empty() {
        return 0.0;
    }
    let total: usize = collection.iter().map(|r| r.residues.len()).sum();
    total as f64 / collection.len() as f64
}

/// Ids separated by tabs, `columns` per row, each row newline-terminated.
///
/// A `columns` of zero lists one id per row.
pub fn list_ids(collection: &SequenceCollection, columns: usize) -> String {
    let ids: Vec<&str> = collection.ids().collect();
    let mut out = String::new();
    for row in ids.chunks(columns.max(1)) {
        out.push_str(&row.join("\t"));
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::Format;
    use crate::record::SequenceRecord;

    fn collection(records: &[(&str, &str)], alphabet: Alphabet) -> SequenceCollection {
        let records = records
            .iter()
            .map(|(id, res)| SequenceRecord::new(*id, *res, alphabet).unwrap())
            .collect();
        SequenceCollection::new(records, Format::Fasta).unwrap()
    }

    #[test]
    fn protein_weight_subtracts_water() {
        let col = collection(&[("p", "GA")], Alphabet::Protein);
        let mw = molecular_weight(&col, &ResidueWeights::protein());
        let expected = 75.03 + 89.09 - 18.015;
        assert!((mw[0].single_strand - expected).abs() < 1e-9);
        assert!(mw[0].double_strand.is_none());
    }

    #[test]
    fn dna_has_double_strand() {
        let col = collection(&[("d", "A-T")], Alphabet::Dna);
        let mw = molecular_weight(&col, &ResidueWeights::for_alphabet(Alphabet::Dna));
        let ss = 331.2218 + 322.2085 - 18.015;
        assert!((mw[0].single_strand - ss).abs() < 1e-9);
        // AT is its own complement
        assert!((mw[0].double_strand.unwrap() - 2.0 * ss).abs() < 1e-9);
    }

    #[test]
    fn rna_single_strand_only() {
        let col = collection(&[("r", "ACGU")], Alphabet::Rna);
        let mw = molecular_weight(&col, &ResidueWeights::rna());
        assert!(mw[0].double_strand.is_none());
    }

    #[test]
    fn lengths_and_means() {
        let col = collection(&[("a", "ACGT"), ("b", "AC-")], Alphabet::Dna);
        assert_eq!(
            seq_lengths(&col),
            vec![("a".to_string(), 4), ("b".to_string(), 3)]
        );
        assert_eq!(num_seqs(&col), 2);
        assert_eq!(ave_seq_length(&col), 3.5);
    }

    #[test]
    fn id_listing_columns() {
        let col = collection(&[("a", "A"), ("b", "C"), ("c", "G")], Alphabet::Dna);
        assert_eq!(list_ids(&col, 2), "a\tb\nc\n");
        assert_eq!(list_ids(&col, 0), "a\nb\nc\n");
        assert_eq!(list_ids(&col, 10), "a\tb\tc\n");
    }
}
