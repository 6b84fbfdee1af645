//! Feature coordinate mapping between nucleotide and protein records.
//!
//! Records are paired by id: each target record takes the features of the
//! first source record with the same id. One codon spans three nucleotides,
//! so a DNA segment `[s, e)` covers protein residues `[s/3, ceil(e/3))` and a
//! protein segment `[s, e)` covers nucleotides `[3s, 3e)`.
//!
//! A frame offset set by `select_frame` needs no extra shift: the clipped
//! residues are already gone from the record, so its coordinates start at
//! the first codon of the frame.

use log::warn;

use seqmill_core::Result;

use crate::collection::SequenceCollection;
use crate::feature::{Feature, Segment};
use crate::record::SequenceRecord;

/// Map a nucleotide segment onto a protein of `prot_len` residues.
pub(crate) fn segment_dna2prot(seg: &Segment, prot_len: usize) -> Option<Segment> {
    let start = seg.start() / 3;
    let end = (seg.end() + 2) / 3;
    Segment::try_new(start, end, seg.strand())?.clip(0, prot_len)
}

/// Map a protein segment onto a nucleotide sequence of `dna_len` bases.
pub(crate) fn segment_prot2dna(seg: &Segment, dna_len: usize) -> Option<Segment> {
    Segment::try_new(seg.start() * 3, seg.end() * 3, seg.strand())?.clip(0, dna_len)
}

pub(crate) fn features_dna2prot(features: &[Feature], prot_len: usize) -> Vec<Feature> {
    features
        .iter()
        .filter_map(|f| f.remapped(|s| segment_dna2prot(s, prot_len)))
        .collect()
}

pub(crate) fn features_prot2dna(features: &[Feature], dna_len: usize) -> Vec<Feature> {
    features
        .iter()
        .filter_map(|f| f.remapped(|s| segment_prot2dna(s, dna_len)))
        .collect()
}

fn annotate_from<F>(
    targets: &SequenceCollection,
    sources: &SequenceCollection,
    mut map: F,
) -> SequenceCollection
where
    F: FnMut(&SequenceRecord, &SequenceRecord) -> Vec<Feature>,
{
    let records = targets
        .iter()
        .map(|target| match sources.get(&target.id) {
            Some(source) => {
                let mut out = target.clone();
                out.features = map(source, target);
                let dropped = source.features.len() - out.features.len();
                if dropped > 0 {
                    warn!(
                        "'{}': {} feature(s) fell outside the mapped sequence",
                        target.id, dropped
                    );
                }
                out
            }
            None => {
                warn!("'{}' has no partner record to take features from", target.id);
                target.clone()
            }
        })
        .collect();
    targets.derive(records, targets.alphabet)
}

/// Copy features from nucleotide records onto the protein records they
/// encode.
///
/// Protein records without a nucleotide partner pass through unchanged.
pub fn map_features_dna2prot(
    dna: &SequenceCollection,
    prot: &SequenceCollection,
) -> Result<SequenceCollection> {
    dna.alphabet.require_nucleic("map_features_dna2prot")?;
    prot.alphabet.require_protein("map_features_dna2prot")?;
    Ok(annotate_from(prot, dna, |source, target| {
        features_dna2prot(&source.features, target.residues.len())
    }))
}

/// Copy features from protein records onto the nucleotide records that
/// encode them.
pub fn map_features_prot2dna(
    prot: &SequenceCollection,
    dna: &SequenceCollection,
) -> Result<SequenceCollection> {
    prot.alphabet.require_protein("map_features_prot2dna")?;
    dna.alphabet.require_nucleic("map_features_prot2dna")?;
    Ok(annotate_from(dna, prot, |source, target| {
        features_prot2dna(&source.features, target.residues.len())
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alphabet::Alphabet;
    use crate::codon::{GeneticCode, StopPolicy};
    use crate::feature::{Location, Strand};
    use crate::format::Format;
    use crate::transform::delete_metadata;
    use crate::translate::{select_frame, translate_cds, TranslateConfig};
    use seqmill_core::SeqmillError;

    fn feature(start: usize, end: usize) -> Feature {
        Feature::new("CDS", Location::single(start, end, Strand::Forward).unwrap())
            .with_qualifier("gene", "x")
    }

    fn single(rec: SequenceRecord) -> SequenceCollection {
        SequenceCollection::new(vec![rec], Format::Genbank).unwrap()
    }

    #[test]
    fn segment_arithmetic() {
        let seg = Segment::new(0, 9, Strand::Forward).unwrap();
        assert_eq!(segment_dna2prot(&seg, 10), Segment::try_new(0, 3, Strand::Forward));
        let seg = Segment::new(4, 10, Strand::Reverse).unwrap();
        assert_eq!(segment_dna2prot(&seg, 10), Segment::try_new(1, 4, Strand::Reverse));
        assert_eq!(segment_dna2prot(&seg, 2), Segment::try_new(1, 2, Strand::Reverse));
        let seg = Segment::new(1, 2, Strand::Forward).unwrap();
        assert_eq!(segment_prot2dna(&seg, 100), Segment::try_new(3, 6, Strand::Forward));
        assert_eq!(segment_prot2dna(&seg, 5), Segment::try_new(3, 5, Strand::Forward));
    }

    #[test]
    fn dna2prot_by_id() {
        let dna = single(
            SequenceRecord::new("g1", "ATGGCCAAATAA", Alphabet::Dna)
                .unwrap()
                .with_feature(feature(0, 9))
                .unwrap(),
        );
        let prot = SequenceCollection::new(
            vec![
                SequenceRecord::new("g1", "MAK*", Alphabet::Protein).unwrap(),
                SequenceRecord::new("g2", "MV", Alphabet::Protein).unwrap(),
            ],
            Format::Fasta,
        )
        .unwrap();
        let mapped = map_features_dna2prot(&dna, &prot).unwrap();
        let f = &mapped.records[0].features[0];
        assert_eq!(f.location.segments()[0], Segment::new(0, 3, Strand::Forward).unwrap());
        assert_eq!(f.qualifier("gene").unwrap(), ["x"]);
        assert!(mapped.records[1].features.is_empty());
    }

    fn codons_of(rec: &SequenceRecord, feature: &Feature) -> String {
        let code = GeneticCode::standard();
        feature
            .location
            .segments()
            .iter()
            .flat_map(|s| code.translate(&rec.residues.as_bytes()[s.start()..s.end()], StopPolicy::Mark))
            .map(char::from)
            .collect()
    }

    #[test]
    fn prot2dna_lands_on_the_selected_frame() {
        let prot = single(
            SequenceRecord::new("g1", "MAK", Alphabet::Protein)
                .unwrap()
                .with_feature(feature(1, 2))
                .unwrap(),
        );
        let framed = select_frame(
            &single(SequenceRecord::new("g1", "CATGGCCAAAT", Alphabet::Dna).unwrap()),
            2,
        )
        .unwrap();
        assert_eq!(framed.records[0].frame_offset(), 1);
        assert_eq!(framed.records[0].residues, "ATGGCCAAAT");
        let mapped = map_features_prot2dna(&prot, &framed).unwrap();
        let rec = &mapped.records[0];
        let seg = rec.features[0].location.segments()[0];
        assert_eq!((seg.start(), seg.end()), (3, 6));
        assert_eq!(codons_of(rec, &rec.features[0]), "A");
    }

    #[test]
    fn spliced_feature_round_trips() {
        let exons = Feature::new(
            "CDS",
            Location::new(vec![
                Segment::new(0, 6, Strand::Forward).unwrap(),
                Segment::new(9, 15, Strand::Forward).unwrap(),
            ])
            .unwrap(),
        )
        .with_qualifier("gene", "x");
        let dna = single(
            SequenceRecord::new("g1", "ATGGCCAAAGTTTGG", Alphabet::Dna)
                .unwrap()
                .with_feature(exons.clone())
                .unwrap(),
        );
        let prot = translate_cds(&delete_metadata(&dna), &TranslateConfig::default()).unwrap();
        assert_eq!(prot.records[0].residues, "MAKVW");

        let annotated = map_features_dna2prot(&dna, &prot).unwrap();
        let on_prot = &annotated.records[0].features[0];
        assert_eq!(
            on_prot.location.segments(),
            [
                Segment::new(0, 2, Strand::Forward).unwrap(),
                Segment::new(3, 5, Strand::Forward).unwrap(),
            ]
        );

        let back = map_features_prot2dna(&annotated, &delete_metadata(&dna)).unwrap();
        let rec = &back.records[0];
        assert_eq!(rec.features, vec![exons]);
        assert_eq!(codons_of(rec, &rec.features[0]), "MAVW");
    }

    #[test]
    fn alphabets_checked() {
        let dna = single(SequenceRecord::new("a", "ACGT", Alphabet::Dna).unwrap());
        assert!(matches!(
            map_features_dna2prot(&dna, &dna),
            Err(SeqmillError::AlphabetMismatch(_))
        ));
        assert!(matches!(
            map_features_prot2dna(&dna, &dna),
            Err(SeqmillError::AlphabetMismatch(_))
        ));
    }
}
