//! Turning parsed text into validated records.
//!
//! Codecs collect ids, residues and annotations first and pick one alphabet
//! for the whole input afterwards, so a short or ambiguous record cannot end
//! up with a different alphabet than its neighbours.

use seqmill_core::{Result, SeqmillError};
use seqmill_seq::{Alphabet, Annotations, Feature, SequenceRecord};

/// A record as read from text, before alphabet assignment.
#[derive(Debug, Clone, Default)]
pub(crate) struct RecordDraft {
    pub id: String,
    pub description: String,
    pub residues: String,
    pub features: Vec<Feature>,
    pub annotations: Annotations,
}

impl RecordDraft {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }
}

/// Validate drafts into records sharing one alphabet.
///
/// `hint` comes from the file itself (a GenBank `aa` unit, a NEXUS
/// `datatype`); otherwise the alphabet is guessed from all residues. A guessed
/// nucleotide alphabet that does not fit falls back to protein. Features
/// reaching past their record are a format error.
pub(crate) fn finish(drafts: Vec<RecordDraft>, hint: Option<Alphabet>) -> Result<Vec<SequenceRecord>> {
    if drafts.is_empty() {
        return Err(SeqmillError::EmptyInput("no sequence records found".into()));
    }
    if drafts.iter().all(|d| d.residues.is_empty()) {
        return Err(SeqmillError::EmptyInput("records carry no residues".into()));
    }
    let alphabet = match hint {
        Some(alphabet) => alphabet,
        None => {
            let all: String = drafts.iter().map(|d| d.residues.as_str()).collect();
            let guess = Alphabet::guess(&all);
            if guess.is_nucleic() && guess.validate(&all).is_err() {
                Alphabet::Protein
            } else {
                guess
            }
        }
    };
    drafts
        .into_iter()
        .map(|draft| {
            let mut rec = SequenceRecord::new(draft.id, draft.residues, alphabet)?
                .with_description(draft.description);
            rec.annotations = draft.annotations;
            for feature in draft.features {
                rec.push_feature(feature).map_err(|e| match e {
                    SeqmillError::Range(msg) => SeqmillError::Format(msg),
                    other => other,
                })?;
            }
            Ok(rec)
        })
        .collect()
}
