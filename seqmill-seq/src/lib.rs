//! Sequence records, collections and the transforms that act on them.
//!
//! - **Model** — [`Alphabet`], [`Feature`] locations, [`SequenceRecord`],
//!   [`SequenceCollection`] and the [`Format`] tags collections carry
//! - **Transforms** — case folding, cleaning, sorting, concatenation,
//!   renaming, range extraction ([`transform`])
//! - **Nucleotides** — transcription and (reverse) complement ([`nucleotide`])
//! - **Frames** — frame selection, translation and back-translation
//!   ([`translate`]) with the standard genetic code ([`codon`])
//! - **Mapping** — feature coordinates between DNA and protein ([`mapper`])
//! - **Statistics** — molecular weight, lengths, id listings ([`stats`])
//!
//! # Example
//!
//! ```
//! use seqmill_seq::{Alphabet, Format, SequenceCollection, SequenceRecord};
//! use seqmill_seq::translate::{translate_cds, TranslateConfig};
//!
//! let rec = SequenceRecord::new("cds1", "ATGGCCTAA", Alphabet::Dna).unwrap();
//! let dna = SequenceCollection::new(vec![rec], Format::Fasta).unwrap();
//!
//! let protein = translate_cds(&dna, &TranslateConfig::default()).unwrap();
//! assert_eq!(protein.records[0].residues(), "MA*");
//! assert_eq!(protein.alphabet, Alphabet::Protein);
//! ```

pub mod alphabet;
pub mod codon;
pub mod collection;
pub mod feature;
pub mod format;
pub mod mapper;
pub mod nucleotide;
pub mod record;
pub mod stats;
pub mod transform;
pub mod translate;
pub mod usage;
pub mod weights;

pub use alphabet::Alphabet;
pub use codon::{GeneticCode, StopPolicy};
pub use collection::SequenceCollection;
pub use feature::{Feature, Location, Qualifiers, Segment, Strand};
pub use format::Format;
pub use record::{Annotations, SequenceRecord};
pub use transform::ConcatKey;
pub use translate::{BackTranslateConfig, BackTranslateMode, TranslateConfig};
pub use usage::{CodonUsage, CodonUsageTable};
pub use weights::ResidueWeights;
