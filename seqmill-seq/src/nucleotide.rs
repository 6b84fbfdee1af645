//! Transcription and complementation of nucleic collections.
//!
//! All operations preserve residue case and reject protein collections
//! before touching any record.

use seqmill_core::Result;

use crate::alphabet::Alphabet;
use crate::collection::SequenceCollection;

// ---------------------------------------------------------------------------
// Complement tables (full IUPAC)
// ---------------------------------------------------------------------------

fn dna_complement(b: u8) -> u8 {
    match b {
        b'A' => b'T',
        b'T' => b'A',
        b'C' => b'G',
        b'G' => b'C',
        b'R' => b'Y', // A|G -> T|C
        b'Y' => b'R',
        b'S' => b'S', // G|C -> C|G
        b'W' => b'W', // A|T -> T|A
        b'K' => b'M', // G|T -> C|A
        b'M' => b'K',
        b'B' => b'V', // C|G|T -> G|C|A
        b'V' => b'B',
        b'D' => b'H', // A|G|T -> T|C|A
        b'H' => b'D',
        other => other,
    }
}

fn rna_complement(b: u8) -> u8 {
    match dna_complement(b) {
        b'T' => b'U',
        b'U' => b'A',
        other => other,
    }
}

fn preserve_case(b: u8, f: fn(u8) -> u8) -> u8 {
    let out = f(b.to_ascii_uppercase());
    if b.is_ascii_lowercase() {
        out.to_ascii_lowercase()
    } else {
        out
    }
}

/// Complement a nucleotide string under `alphabet`, keeping case.
pub fn complement_str(residues: &str, alphabet: Alphabet) -> String {
    let table: fn(u8) -> u8 = match alphabet {
        Alphabet::Rna => rna_complement,
        _ => dna_complement,
    };
    residues
        .bytes()
        .map(|b| preserve_case(b, table) as char)
        .collect()
}

/// Reverse complement a nucleotide string under `alphabet`, keeping case.
pub fn reverse_complement_str(residues: &str, alphabet: Alphabet) -> String {
    complement_str(residues, alphabet).chars().rev().collect()
}

fn swap_base(residues: &str, from: char, to: char) -> String {
    residues
        .chars()
        .map(|c| {
            if c == from {
                to
            } else if c == from.to_ascii_lowercase() {
                to.to_ascii_lowercase()
            } else {
                c
            }
        })
        .collect()
}

/// Transcribe: T becomes U. The result is an RNA collection.
pub fn dna2rna(collection: &SequenceCollection) -> Result<SequenceCollection> {
    collection.alphabet.require_nucleic("dna2rna")?;
    let records = collection
        .iter()
        .map(|rec| {
            let mut out = rec.clone();
            out.residues = swap_base(&rec.residues, 'T', 'U');
            out.set_frame_prefix(swap_base(rec.frame_prefix(), 'T', 'U'));
            out.alphabet = Alphabet::Rna;
            out
        })
        .collect();
    Ok(collection.derive(records, Alphabet::Rna))
}

/// Reverse-transcribe: U becomes T. The result is a DNA collection.
pub fn rna2dna(collection: &SequenceCollection) -> Result<SequenceCollection> {
    collection.alphabet.require_nucleic("rna2dna")?;
    let records = collection
        .iter()
        .map(|rec| {
            let mut out = rec.clone();
            out.residues = swap_base(&rec.residues, 'U', 'T');
            out.set_frame_prefix(swap_base(rec.frame_prefix(), 'U', 'T'));
            out.alphabet = Alphabet::Dna;
            out
        })
        .collect();
    Ok(collection.derive(records, Alphabet::Dna))
}

/// Complement every record in place of position; features are untouched.
pub fn complement(collection: &SequenceCollection) -> Result<SequenceCollection> {
    let alphabet = collection.alphabet;
    alphabet.require_nucleic("complement")?;
    let records = collection
        .iter()
        .map(|rec| {
            let mut out = rec.clone();
            out.residues = complement_str(&rec.residues, alphabet);
            out.set_frame_prefix(complement_str(rec.frame_prefix(), alphabet));
            out
        })
        .collect();
    Ok(collection.derive(records, alphabet))
}

/// Reverse complement every record.
///
/// Feature segments are mirrored onto the opposite strand and their order is
/// reversed, so applying this twice gives back the input. Any remembered
/// frame offset is dropped since it no longer sits at the front.
pub fn reverse_complement(collection: &SequenceCollection) -> Result<SequenceCollection> {
    let alphabet = collection.alphabet;
    alphabet.require_nucleic("reverse_complement")?;
    let records = collection
        .iter()
        .map(|rec| {
            let len = rec.residues.len();
            let mut out = rec.clone();
            out.residues = reverse_complement_str(&rec.residues, alphabet);
            out.take_frame_prefix();
            for feature in &mut out.features {
                feature.location = feature.location.mirrored(len);
            }
            out
        })
        .collect();
    Ok(collection.derive(records, alphabet))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feature::{Feature, Location, Segment, Strand};
    use crate::format::Format;
    use crate::record::SequenceRecord;
    use seqmill_core::SeqmillError;

    fn collection(residues: &str, alphabet: Alphabet) -> SequenceCollection {
        let rec = SequenceRecord::new("s1", residues, alphabet).unwrap();
        SequenceCollection::new(vec![rec], Format::Fasta).unwrap()
    }

    #[test]
    fn revcomp_iupac_and_case() {
        assert_eq!(reverse_complement_str("ATGc", Alphabet::Dna), "gCAT");
        assert_eq!(reverse_complement_str("RYKMBVDHN", Alphabet::Dna), "NDHBVKMRY");
        assert_eq!(reverse_complement_str("AUGG", Alphabet::Rna), "CCAU");
        assert_eq!(complement_str("AC-G", Alphabet::Dna), "TG-C");
    }

    #[test]
    fn transcription_keeps_case() {
        let rna = dna2rna(&collection("ATtg", Alphabet::Dna)).unwrap();
        assert_eq!(rna.alphabet, Alphabet::Rna);
        assert_eq!(rna.records[0].residues, "AUug");
        let dna = rna2dna(&rna).unwrap();
        assert_eq!(dna.records[0].residues, "ATtg");
        assert_eq!(dna.records[0].alphabet, Alphabet::Dna);
    }

    #[test]
    fn protein_rejected() {
        let prot = collection("MKV", Alphabet::Protein);
        for result in [
            dna2rna(&prot),
            rna2dna(&prot),
            complement(&prot),
            reverse_complement(&prot),
        ] {
            assert!(matches!(result, Err(SeqmillError::AlphabetMismatch(_))));
        }
    }

    #[test]
    fn revcomp_mirrors_features() {
        let feat = Feature::new(
            "CDS",
            Location::new(vec![
                Segment::new(0, 3, Strand::Forward).unwrap(),
                Segment::new(5, 8, Strand::Forward).unwrap(),
            ])
            .unwrap(),
        );
        let rec = SequenceRecord::new("s1", "ATGCCGGA", Alphabet::Dna)
            .unwrap()
            .with_feature(feat)
            .unwrap();
        let col = SequenceCollection::new(vec![rec], Format::Genbank).unwrap();
        let rc = reverse_complement(&col).unwrap();
        assert_eq!(rc.records[0].residues, "TCCGGCAT");
        let segs = rc.records[0].features[0].location.segments();
        assert_eq!(segs[0], Segment::new(0, 3, Strand::Reverse).unwrap());
        assert_eq!(segs[1], Segment::new(5, 8, Strand::Reverse).unwrap());
        assert_eq!(reverse_complement(&rc).unwrap(), col);
    }
}
