//! Reading frames, translation and back-translation.

use log::{debug, warn};

use seqmill_core::{Result, SeqmillError};

use crate::alphabet::{Alphabet, GAP_BYTES};
use crate::codon::{GeneticCode, StopPolicy, STOP_RESIDUE};
use crate::collection::SequenceCollection;
use crate::mapper::{features_dna2prot, features_prot2dna};
use crate::nucleotide::reverse_complement_str;
use crate::record::SequenceRecord;
use crate::usage::{CodonFrequency, CodonUsage, CodonUsageTable};

/// Options for [`translate_cds`] and [`translate6frames`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TranslateConfig {
    pub stop: StopPolicy,
}

/// How [`back_translate`] picks among synonymous codons.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum BackTranslateMode {
    /// The most frequent codon; ties go to the lexicographically first.
    #[default]
    Optimized,
    /// A codon drawn in proportion to its frequency.
    Random,
}

/// Seed used by [`BackTranslateConfig::default`].
pub const DEFAULT_SEED: u64 = 0x5EED_5EED;

/// Options for [`back_translate`].
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BackTranslateConfig {
    pub mode: BackTranslateMode,
    /// Key into the codon usage table.
    pub organism: String,
    /// Seed for [`BackTranslateMode::Random`].
    pub seed: u64,
}

impl Default for BackTranslateConfig {
    fn default() -> Self {
        Self {
            mode: BackTranslateMode::Optimized,
            organism: "human".into(),
            seed: DEFAULT_SEED,
        }
    }
}

// ---------------------------------------------------------------------------
// Private Xorshift64 PRNG
// ---------------------------------------------------------------------------

struct Xorshift64 {
    state: u64,
}

impl Xorshift64 {
    fn new(seed: u64) -> Self {
        // Avoid the all-zero fixed point.
        Self {
            state: if seed == 0 { 1 } else { seed },
        }
    }

    fn next_u64(&mut self) -> u64 {
        let mut x = self.state;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.state = x;
        x
    }

    fn next_f64(&mut self) -> f64 {
        self.next_u64() as f64 / u64::MAX as f64
    }
}

// ---------------------------------------------------------------------------
// Frames
// ---------------------------------------------------------------------------

/// Re-attach residues clipped by an earlier frame selection.
fn restore_frame(rec: &mut SequenceRecord) {
    let prefix = rec.take_frame_prefix();
    if prefix.is_empty() {
        return;
    }
    let delta = prefix.len();
    rec.residues.insert_str(0, &prefix);
    for feature in &mut rec.features {
        if let Some(location) = feature.location.map_segments(|s| Some(s.shifted_right(delta))) {
            feature.location = location;
        }
    }
}

/// Drop the first `k` residues, shifting features left and discarding
/// whatever falls off. Returns the clipped residues.
fn clip_front(rec: &mut SequenceRecord, k: usize) -> String {
    let k = k.min(rec.residues.len());
    let clipped: String = rec.residues.drain(..k).collect();
    let before = rec.features.len();
    rec.features = rec
        .features
        .iter()
        .filter_map(|f| f.remapped(|s| s.shifted_left(k)))
        .collect();
    if rec.features.len() < before {
        warn!(
            "'{}': {} feature(s) clipped away by frame shift",
            rec.id,
            before - rec.features.len()
        );
    }
    clipped
}

/// Shift every record into reading frame `frame` (1, 2 or 3).
///
/// The record is first restored to frame 1, then `frame - 1` leading residues
/// are clipped and remembered as the record's frame offset. Selecting the same
/// frame twice is a no-op.
pub fn select_frame(collection: &SequenceCollection, frame: u8) -> Result<SequenceCollection> {
    if !(1..=3).contains(&frame) {
        return Err(SeqmillError::Range(format!(
            "reading frame must be 1, 2 or 3, got {frame}"
        )));
    }
    collection.alphabet.require_nucleic("select_frame")?;
    let records = collection
        .iter()
        .map(|rec| {
            let mut out = rec.clone();
            restore_frame(&mut out);
            let prefix = clip_front(&mut out, usize::from(frame - 1));
            out.set_frame_prefix(prefix);
            out
        })
        .collect();
    Ok(collection.derive(records, collection.alphabet))
}

// ---------------------------------------------------------------------------
// Translation
// ---------------------------------------------------------------------------

fn translate_record(rec: &SequenceRecord, code: &GeneticCode, stop: StopPolicy) -> SequenceRecord {
    let trailing = rec.residues.len() % 3;
    if trailing != 0 {
        warn!(
            "'{}': ignoring {} trailing residue(s) after the last full codon",
            rec.id, trailing
        );
    }
    let protein = code.translate(rec.residues.as_bytes(), stop);
    let mut out = rec.clone();
    out.take_frame_prefix();
    out.residues = protein.into_iter().map(char::from).collect();
    out.alphabet = Alphabet::Protein;
    out.features = features_dna2prot(&rec.features, out.residues.len());
    out
}

/// Translate coding sequences codon by codon with the standard code.
pub fn translate_cds(
    collection: &SequenceCollection,
    config: &TranslateConfig,
) -> Result<SequenceCollection> {
    collection.alphabet.require_nucleic("translate_cds")?;
    let code = GeneticCode::standard();
    let records = collection
        .iter()
        .map(|rec| translate_record(rec, &code, config.stop))
        .collect();
    debug!("translated {} record(s)", collection.len());
    Ok(collection.derive(records, Alphabet::Protein))
}

/// Translate all six reading frames of every record.
///
/// Each input yields `<id>_f1`, `_f2`, `_f3` (offsets 0, 1, 2) followed by
/// `_rf1`, `_rf2`, `_rf3` (the same offsets on the reverse complement).
pub fn translate6frames(
    collection: &SequenceCollection,
    config: &TranslateConfig,
) -> Result<SequenceCollection> {
    let alphabet = collection.alphabet;
    alphabet.require_nucleic("translate6frames")?;
    let code = GeneticCode::standard();
    let mut records = Vec::with_capacity(collection.len() * 6);
    for rec in collection {
        let mut forward = rec.clone();
        restore_frame(&mut forward);
        let mut reverse = forward.clone();
        reverse.residues = reverse_complement_str(&forward.residues, alphabet);
        let len = forward.residues.len();
        for feature in &mut reverse.features {
            feature.location = feature.location.mirrored(len);
        }
        for (strand, tag) in [(&forward, "f"), (&reverse, "rf")] {
            for offset in 0..3 {
                let mut framed = strand.clone();
                clip_front(&mut framed, offset);
                let mut protein = translate_record(&framed, &code, config.stop);
                protein.id = format!("{}_{}{}", rec.id, tag, offset + 1);
                records.push(protein);
            }
        }
    }
    Ok(collection.derive(records, Alphabet::Protein))
}

// ---------------------------------------------------------------------------
// Back-translation
// ---------------------------------------------------------------------------

fn most_frequent(codons: &[CodonFrequency]) -> Option<&str> {
    codons
        .iter()
        .reduce(|best, cur| {
            if cur.1 > best.1 || (cur.1 == best.1 && cur.0 < best.0) {
                cur
            } else {
                best
            }
        })
        .map(|(codon, _)| codon.as_str())
}

fn sample<'a>(codons: &'a [CodonFrequency], rng: &mut Xorshift64) -> Option<&'a str> {
    let total: f64 = codons.iter().map(|(_, f)| f.max(0.0)).sum();
    if total <= 0.0 {
        return most_frequent(codons);
    }
    let target = rng.next_f64() * total;
    let mut acc = 0.0;
    for (codon, freq) in codons {
        acc += freq.max(0.0);
        if target < acc {
            return Some(codon.as_str());
        }
    }
    codons.last().map(|(codon, _)| codon.as_str())
}

struct CodonPicker<'a> {
    usage: &'a CodonUsage,
    code: GeneticCode,
    mode: BackTranslateMode,
    rng: Xorshift64,
}

impl CodonPicker<'_> {
    fn pick(&mut self, aa: u8) -> String {
        if GAP_BYTES.contains(&aa) {
            return "---".into();
        }
        let aa = aa.to_ascii_uppercase();
        if let Some(codons) = self.usage.codons(char::from(aa)).filter(|c| !c.is_empty()) {
            let chosen = match self.mode {
                BackTranslateMode::Optimized => most_frequent(codons),
                BackTranslateMode::Random => sample(codons, &mut self.rng),
            };
            if let Some(codon) = chosen {
                return codon.to_string();
            }
        }
        if aa == STOP_RESIDUE {
            return "TAA".into();
        }
        // Residues the table skips fall back to the first synonymous codon.
        match self.code.codons_for(aa).first() {
            Some(codon) => String::from_utf8_lossy(codon).into_owned(),
            None => "NNN".into(),
        }
    }
}

/// Replace every amino acid with a codon chosen from `table`.
///
/// Features are scaled onto the nucleotide coordinates. Unknown residues
/// such as `X` become `NNN`.
pub fn back_translate(
    collection: &SequenceCollection,
    config: &BackTranslateConfig,
    table: &CodonUsageTable,
) -> Result<SequenceCollection> {
    collection.alphabet.require_protein("back_translate")?;
    let mut picker = CodonPicker {
        usage: table.organism(&config.organism)?,
        code: GeneticCode::standard(),
        mode: config.mode,
        rng: Xorshift64::new(config.seed),
    };
    let records = collection
        .iter()
        .map(|rec| {
            let mut out = rec.clone();
            out.residues = rec.residues.bytes().map(|aa| picker.pick(aa)).collect();
            out.alphabet = Alphabet::Dna;
            out.features = features_prot2dna(&rec.features, out.residues.len());
            out
        })
        .collect();
    Ok(collection.derive(records, Alphabet::Dna))
}


#[cfg(test)]
mod proptests {
    use super::*;
    use crate::format::Format;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn select_frame_is_idempotent(residues in "[ACGT]{0,40}", frame in 1u8..=3) {
            let rec = SequenceRecord::new("s", residues, Alphabet::Dna).unwrap();
            let col = SequenceCollection::new(vec![rec], Format::Fasta).unwrap();
            let once = select_frame(&col, frame).unwrap();
            let twice = select_frame(&once, frame).unwrap();
            prop_assert_eq!(once, twice);
        }
    }
}
