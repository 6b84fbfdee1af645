//! Flat-file codecs for seqmill sequence collections.
//!
//! Supported formats:
//! - **FASTA** — always available, parsed with needletail
//! - **GenBank** — via the `genbank` feature (enabled by default)
//! - **NEXUS** — via the `nexus` feature (enabled by default)
//! - **PHYLIP** — strict, relaxed and interleaved layouts, via the `phylip` feature
//! - **Stockholm** — via the `stockholm` feature (enabled by default)
//!
//! [`CodecRegistry`] maps each [`Format`](seqmill_seq::Format) to its codec;
//! [`read_collection`] builds a collection from a path, reader or text,
//! detecting the format when none is given.

mod draft;

pub mod detect;
pub mod fasta;
pub mod location;
pub mod registry;

#[cfg(feature = "genbank")]
pub mod genbank;

#[cfg(feature = "nexus")]
pub mod nexus;

#[cfg(feature = "phylip")]
pub mod phylip;

#[cfg(feature = "stockholm")]
pub mod stockholm;

pub use detect::{detect_format, read_collection, ReadOptions, Source};
pub use location::{format_location, parse_location};
pub use registry::{Codec, CodecRegistry};
