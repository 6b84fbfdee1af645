//! Shared primitives for the seqmill sequence-manipulation crates.
//!
//! - **Error types** — [`SeqmillError`] and [`Result`]
//! - **Traits** — [`Sequence`], [`ContentAddressable`], [`Annotated`], [`Summarizable`]
//! - **Hashing** — SHA-256 content addressing for serialized output

pub mod error;
pub mod hash;
pub mod traits;

pub use error::{Result, SeqmillError};
pub use traits::*;
