//! Traits implemented by seqmill records and collections.

/// Gap and missing-data symbols shared by every residue alphabet.
pub const GAP_SYMBOLS: &[u8] = b"-.?";

/// A residue string (DNA, RNA or protein), possibly aligned.
pub trait Sequence {
    /// The raw residues, gaps included.
    fn as_bytes(&self) -> &[u8];

    /// Length in columns, gaps included.
    fn len(&self) -> usize {
        self.as_bytes().len()
    }

    fn is_empty(&self) -> bool {
        self.as_bytes().is_empty()
    }

    /// Number of residues that are not gap symbols.
    fn ungapped_len(&self) -> usize {
        self.as_bytes()
            .iter()
            .filter(|b| !GAP_SYMBOLS.contains(b))
            .count()
    }
}

/// A value identified by a SHA-256 digest of its content.
pub trait ContentAddressable {
    /// The bytes that define this value's identity.
    fn content_bytes(&self) -> Vec<u8>;

    /// Hex-encoded SHA-256 of [`content_bytes`](Self::content_bytes).
    fn content_hash(&self) -> String {
        crate::hash::sha256(&self.content_bytes())
    }
}

/// Something with an id and an optional free-text description.
pub trait Annotated {
    fn name(&self) -> &str;

    fn description(&self) -> Option<&str> {
        None
    }
}

/// A one-line, human-readable summary.
pub trait Summarizable {
    fn summary(&self) -> String;
}
