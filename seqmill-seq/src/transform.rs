//! Residue and annotation transforms over whole collections.
//!
//! Every function takes a collection by reference and returns a new one;
//! alphabet and argument checks happen before any record is touched.

use indexmap::IndexMap;
use log::debug;
use regex::Regex;

use seqmill_core::{Result, SeqmillError};

use crate::collection::SequenceCollection;
use crate::feature::{Feature, Location, Strand};
use crate::format::Format;
use crate::record::SequenceRecord;

/// Id given to the record produced by [`concat_seqs`] with [`ConcatKey::All`].
pub const CONCAT_ID: &str = "concatenation";

/// Longest feature type written for each record marked by [`concat_seqs`].
const MARKER_TYPE_LEN: usize = 15;

/// How [`concat_seqs`] groups records.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ConcatKey {
    /// Merge everything into one record.
    #[default]
    All,
    /// Merge records sharing an id.
    Id,
}

fn map_records<F>(collection: &SequenceCollection, mut f: F) -> SequenceCollection
where
    F: FnMut(&mut SequenceRecord),
{
    let records = collection
        .iter()
        .map(|rec| {
            let mut out = rec.clone();
            f(&mut out);
            out
        })
        .collect();
    collection.derive(records, collection.alphabet)
}

pub fn uppercase(collection: &SequenceCollection) -> SequenceCollection {
    map_records(collection, |rec| {
        rec.residues.make_ascii_uppercase();
        let prefix = rec.frame_prefix().to_ascii_uppercase();
        rec.set_frame_prefix(prefix);
    })
}

pub fn lowercase(collection: &SequenceCollection) -> SequenceCollection {
    map_records(collection, |rec| {
        rec.residues.make_ascii_lowercase();
        let prefix = rec.frame_prefix().to_ascii_lowercase();
        rec.set_frame_prefix(prefix);
    })
}

/// Strip everything that is not a residue of the collection's alphabet.
///
/// Feature coordinates are not shifted; features reaching past the shortened
/// sequence are clipped to it.
pub fn clean_seq(collection: &SequenceCollection) -> SequenceCollection {
    let alphabet = collection.alphabet;
    map_records(collection, |rec| {
        rec.residues.retain(|c| c.is_ascii() && alphabet.is_residue(c as u8));
        let len = rec.residues.len();
        rec.features = rec
            .features
            .iter()
            .filter_map(|f| f.remapped(|s| s.clip(0, len)))
            .collect();
    })
}

/// Clear descriptions, features and annotations.
pub fn delete_metadata(collection: &SequenceCollection) -> SequenceCollection {
    map_records(collection, |rec| {
        rec.description.clear();
        rec.features.clear();
        rec.annotations.clear();
    })
}

/// Bare residue strings, separated by blank lines.
pub fn raw_seq(collection: &SequenceCollection) -> String {
    let mut out = collection
        .iter()
        .map(|rec| rec.residues.as_str())
        .collect::<Vec<_>>()
        .join("\n\n");
    out.push('\n');
    out
}

fn sort_stable<T, K, F>(items: &mut [T], reverse: bool, key: F)
where
    K: Ord,
    F: Fn(&T) -> K,
{
    if reverse {
        items.sort_by(|a, b| key(b).cmp(&key(a)));
    } else {
        items.sort_by_key(key);
    }
}

/// Sort every record's features by type name.
pub fn order_features_alphabetically(
    collection: &SequenceCollection,
    reverse: bool,
) -> SequenceCollection {
    map_records(collection, |rec| {
        sort_stable(&mut rec.features, reverse, |f| f.feature_type.clone());
    })
}

/// Sort every record's features by the start of their first segment.
pub fn order_features_by_position(
    collection: &SequenceCollection,
    reverse: bool,
) -> SequenceCollection {
    map_records(collection, |rec| {
        sort_stable(&mut rec.features, reverse, |f| f.location.start());
    })
}

/// Sort records by id.
pub fn order_ids(collection: &SequenceCollection, reverse: bool) -> SequenceCollection {
    let mut records = collection.records.clone();
    sort_stable(&mut records, reverse, |r| r.id.clone());
    collection.derive(records, collection.alphabet)
}

/// Append `src` onto `dst`, shifting its features past the current end.
fn append_record(dst: &mut SequenceRecord, src: &SequenceRecord) {
    let offset = dst.residues.len();
    dst.residues.push_str(&src.residues);
    dst.features.extend(
        src.features
            .iter()
            .filter_map(|f| f.remapped(|s| Some(s.shifted_right(offset)))),
    );
}

fn concat_all(collection: &SequenceCollection) -> SequenceRecord {
    let mut out =
        SequenceRecord::from_validated(CONCAT_ID.into(), String::new(), collection.alphabet);
    for rec in collection {
        let start = out.residues.len();
        let end = start + rec.residues.len();
        if let Ok(location) = Location::single(start, end, Strand::Forward) {
            let marker: String = rec.id.chars().take(MARKER_TYPE_LEN).collect();
            out.features.push(Feature::new(marker, location));
        }
        append_record(&mut out, rec);
    }
    out
}

fn concat_by_id(collection: &SequenceCollection) -> Vec<SequenceRecord> {
    let mut groups: IndexMap<&str, SequenceRecord> = IndexMap::new();
    for rec in collection {
        match groups.get_mut(rec.id.as_str()) {
            Some(merged) => append_record(merged, rec),
            None => {
                let mut first = rec.clone();
                first.take_frame_prefix();
                groups.insert(rec.id.as_str(), first);
            }
        }
    }
    groups.into_values().collect()
}

/// Concatenate records end to end.
///
/// With [`ConcatKey::All`] the result is a single record named
/// `concatenation` carrying every input feature plus one marker feature per
/// input record spanning its residues. With [`ConcatKey::Id`] records that
/// share an id are merged in order of first appearance.
pub fn concat_seqs(collection: &SequenceCollection, key: ConcatKey) -> SequenceCollection {
    let records = match key {
        ConcatKey::All => vec![concat_all(collection)],
        ConcatKey::Id => concat_by_id(collection),
    };
    debug!(
        "concatenated {} record(s) into {}",
        collection.len(),
        records.len()
    );
    collection.derive(records, collection.alphabet)
}

/// Regex substitution on every id.
///
/// At most `max` replacements are made per id; zero replaces every match.
/// `replacement` may refer to capture groups (`$1`, `${name}`).
pub fn rename(
    collection: &SequenceCollection,
    pattern: &str,
    replacement: &str,
    max: usize,
) -> Result<SequenceCollection> {
    let re = Regex::new(pattern)
        .map_err(|e| SeqmillError::InvalidInput(format!("bad rename pattern: {e}")))?;
    Ok(map_records(collection, |rec| {
        rec.id = re.replacen(&rec.id, max, replacement).into_owned();
    }))
}

/// Union of the features of two records describing the same sequence.
///
/// Features of `b` already present on `a` are not duplicated.
pub fn combine_features(a: &SequenceRecord, b: &SequenceRecord) -> Result<SequenceRecord> {
    if a.id != b.id {
        return Err(SeqmillError::InvalidInput(format!(
            "cannot combine features of '{}' and '{}'",
            a.id, b.id
        )));
    }
    if a.alphabet != b.alphabet {
        return Err(SeqmillError::alphabet(
            "combine_features",
            format!("'{}' is {} in one input and {} in the other", a.id, a.alphabet, b.alphabet),
        ));
    }
    let mut out = a.clone();
    for feature in &b.features {
        if !out.features.contains(feature) {
            out.push_feature(feature.clone())?;
        }
    }
    Ok(out)
}

/// Pair records by id and combine their features.
///
/// Records of `a` without a partner pass through, and so do unpaired records
/// of `b`, which are appended after those of `a`.
pub fn combine_collection_features(
    a: &SequenceCollection,
    b: &SequenceCollection,
) -> Result<SequenceCollection> {
    if a.alphabet != b.alphabet {
        return Err(SeqmillError::alphabet(
            "combine_features",
            format!("collections are {} and {}", a.alphabet, b.alphabet),
        ));
    }
    let mut records = a
        .iter()
        .map(|rec| match b.get(&rec.id) {
            Some(partner) => combine_features(rec, partner),
            None => Ok(rec.clone()),
        })
        .collect::<Result<Vec<_>>>()?;
    records.extend(b.iter().filter(|rec| a.get(&rec.id).is_none()).cloned());
    Ok(a.derive(records, a.alphabet))
}

/// Keep residues `start..=end` (1-based) of every record.
///
/// Ranges reaching past a record are clipped to it; features are shifted and
/// clipped, losing segments and features that fall outside.
pub fn extract_range(
    collection: &SequenceCollection,
    start: usize,
    end: usize,
) -> Result<SequenceCollection> {
    if start == 0 {
        return Err(SeqmillError::Range("range start is 1-based".into()));
    }
    if end < start {
        return Err(SeqmillError::Range(format!(
            "range end {end} precedes start {start}"
        )));
    }
    let lo = start - 1;
    Ok(map_records(collection, |rec| {
        let len = rec.residues.len();
        let (lo, hi) = (lo.min(len), end.min(len));
        rec.residues = rec.residues[lo..hi].to_string();
        rec.take_frame_prefix();
        rec.features = rec
            .features
            .iter()
            .filter_map(|f| f.remapped(|s| s.clip(lo, hi)?.shifted_left(lo)))
            .collect();
    }))
}

/// Switch the format the collection will be written in.
pub fn convert(collection: &SequenceCollection, format: Format) -> SequenceCollection {
    collection.clone().with_output_format(format)
}


#[cfg(test)]
mod proptests {
    use super::*;
    use crate::alphabet::Alphabet;
    use proptest::prelude::*;

    fn dna_collection() -> impl Strategy<Value = SequenceCollection> {
        proptest::collection::vec("[ACGTNacgtn-]{1,40}", 1..5).prop_map(|seqs| {
            let records = seqs
                .into_iter()
                .enumerate()
                .map(|(i, s)| SequenceRecord::new(format!("s{i}"), s, Alphabet::Dna).unwrap())
                .collect();
            SequenceCollection::new(records, Format::Fasta).unwrap()
        })
    }

    proptest! {
        #[test]
        fn uppercase_absorbs_lowercase(col in dna_collection()) {
            prop_assert_eq!(uppercase(&lowercase(&col)), uppercase(&col));
        }

        #[test]
        fn backwards_range_fails(start in 2usize..100, back in 1usize..100) {
            let rec = SequenceRecord::new("s", "ACGT", Alphabet::Dna).unwrap();
            let col = SequenceCollection::new(vec![rec], Format::Fasta).unwrap();
            let end = start.saturating_sub(back);
            prop_assume!(end < start);
            prop_assert!(matches!(
                extract_range(&col, start, end),
                Err(SeqmillError::Range(_))
            ));
        }
    }
}
