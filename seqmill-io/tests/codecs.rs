use std::io::Write;

use seqmill_core::SeqmillError;
use seqmill_io::{read_collection, CodecRegistry, ReadOptions, Source};
use seqmill_seq::transform::{convert, extract_range};
use seqmill_seq::translate::translate_cds;
use seqmill_seq::{
    Alphabet, Feature, Format, Location, SequenceCollection, SequenceRecord, Strand,
    TranslateConfig,
};

fn annotated_collection() -> SequenceCollection {
    let mut cds = Feature::new("CDS", Location::single(0, 12, Strand::Forward).unwrap());
    cds.add_qualifier("gene", "demo");
    cds.add_qualifier("codon_start", "1");
    let gene = Feature::new(
        "gene",
        Location::new(vec![
            seqmill_seq::Segment::new(6, 12, Strand::Reverse).unwrap(),
            seqmill_seq::Segment::new(0, 3, Strand::Reverse).unwrap(),
        ])
        .unwrap(),
    );
    let a = SequenceRecord::new("alpha", "ATGGCCAAATAA", Alphabet::Dna)
        .unwrap()
        .with_description("first test sequence")
        .with_annotation("organism", "Homo sapiens")
        .with_feature(cds)
        .unwrap()
        .with_feature(gene)
        .unwrap();
    let b = SequenceRecord::new("beta", "ATGCCC---TAA", Alphabet::Dna)
        .unwrap()
        .with_description("second");
    SequenceCollection::new(vec![a, b], Format::Fasta).unwrap()
}

#[test]
fn serialize_parse_serialize_is_stable_for_every_format() {
    let registry = CodecRegistry::standard();
    let collection = annotated_collection();
    for format in Format::ALL {
        let once = registry.serialize(&collection, format).unwrap();
        let parsed = registry.parse(format, &once).unwrap();
        let twice = registry.serialize(&parsed, format).unwrap();
        assert_eq!(once, twice, "{format} output changed on round trip");
        assert_eq!(parsed.len(), 2, "{format}");
        assert_eq!(parsed.alphabet, Alphabet::Dna, "{format}");
    }
}

#[test]
fn feature_formats_keep_features() {
    let registry = CodecRegistry::standard();
    let collection = annotated_collection();
    for format in Format::ALL.into_iter().filter(|f| f.carries_features()) {
        let text = registry.serialize(&collection, format).unwrap();
        let parsed = registry.parse(format, &text).unwrap();
        assert_eq!(
            parsed.records[0].features, collection.records[0].features,
            "{format}"
        );
        assert_eq!(parsed.records[0].description, "first test sequence", "{format}");
    }
}

#[test]
fn detected_formats_match_written_formats() {
    let registry = CodecRegistry::standard();
    let collection = annotated_collection();
    for format in Format::ALL {
        let text = registry.serialize(&collection, format).unwrap();
        let col = read_collection(&registry, Source::text(text), &ReadOptions::default()).unwrap();
        if format.is_phylip() {
            // a single block reads the same sequential or interleaved
            assert!(col.input_format.is_phylip(), "{format}");
        } else {
            assert_eq!(col.input_format, format);
        }
    }
}

#[test]
fn path_conversion_pipeline() {
    let registry = CodecRegistry::standard();
    let mut input = tempfile::Builder::new().suffix(".gb").tempfile().unwrap();
    let genbank = registry
        .serialize(&annotated_collection(), Format::Genbank)
        .unwrap();
    input.write_all(genbank.as_bytes()).unwrap();
    input.flush().unwrap();

    let col = read_collection(&registry, Source::path(input.path()), &ReadOptions::default())
        .unwrap();
    assert_eq!(col.input_format, Format::Genbank);

    let protein = translate_cds(&extract_range(&col, 1, 12).unwrap(), &TranslateConfig::default())
        .unwrap();
    assert_eq!(protein.records[0].residues(), "MAK*");

    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("protein.fasta");
    registry
        .write_to_path(&convert(&protein, Format::Fasta), &out)
        .unwrap();
    let back = read_collection(&registry, Source::path(&out), &ReadOptions::default()).unwrap();
    assert_eq!(back.alphabet, Alphabet::Protein);
    assert_eq!(back.records[0].residues(), "MAK*");
}

fn dna(records: &[(&str, &str)]) -> SequenceCollection {
    let records = records
        .iter()
        .map(|(id, residues)| SequenceRecord::new(*id, *residues, Alphabet::Dna).unwrap())
        .collect();
    SequenceCollection::new(records, Format::Fasta).unwrap()
}

#[test]
fn records_emptied_by_extraction_round_trip() {
    let registry = CodecRegistry::standard();
    let col = extract_range(&dna(&[("long", "ACGTACGTACGT"), ("short", "ACG")]), 5, 10).unwrap();
    assert_eq!(col.records[1].residues(), "");
    for format in Format::ALL {
        match registry.serialize(&col, format) {
            Ok(once) => {
                let parsed = registry.parse(format, &once).unwrap();
                assert_eq!(parsed.records[0].residues(), "ACGTAC", "{format}");
                assert_eq!(parsed.records[1].residues(), "", "{format}");
                assert_eq!(registry.serialize(&parsed, format).unwrap(), once, "{format}");
            }
            // PHYLIP needs aligned sequences
            Err(err) => {
                assert!(format.is_phylip(), "{format}: {err}");
                assert!(matches!(err, SeqmillError::Format(_)), "{format}");
            }
        }
    }
}

#[test]
fn duplicate_ids_are_kept_or_refused() {
    let registry = CodecRegistry::standard();
    let col = dna(&[("dup", "ACGT"), ("dup", "TTTT")]);
    for format in Format::ALL {
        match registry.serialize(&col, format) {
            Ok(once) => {
                let parsed = registry.parse(format, &once).unwrap();
                assert_eq!(parsed.len(), 2, "{format}");
                assert_eq!(parsed.records[1].residues(), "TTTT", "{format}");
                assert_eq!(registry.serialize(&parsed, format).unwrap(), once, "{format}");
            }
            // name-matched layouts cannot tell the rows apart
            Err(err) => {
                assert!(
                    matches!(format, Format::Nexus | Format::Stockholm),
                    "{format}: {err}"
                );
                assert!(matches!(err, SeqmillError::Format(_)), "{format}");
            }
        }
    }
}

#[test]
fn empty_inputs_fail_for_every_format() {
    let registry = CodecRegistry::standard();
    for format in Format::ALL {
        let err = registry.parse(format, "").unwrap_err();
        assert!(
            matches!(err, SeqmillError::EmptyInput(_)),
            "{format}: {err}"
        );
    }
}
