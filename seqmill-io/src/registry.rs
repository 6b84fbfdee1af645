//! Codec lookup by format tag.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use log::debug;

use seqmill_core::{Result, SeqmillError};
use seqmill_seq::{Format, SequenceCollection, SequenceRecord};

/// Reads and writes one serialization format.
pub trait Codec {
    /// The format this codec handles.
    fn format(&self) -> Format;

    /// Parse text into records.
    ///
    /// Fails with `EmptyInput` when the text holds no records or no residues
    /// and with `Format` when it does not follow the grammar.
    fn parse(&self, text: &str) -> Result<Vec<SequenceRecord>>;

    /// Serialize records. Identical input yields byte-identical output.
    fn serialize(&self, records: &[SequenceRecord]) -> Result<String>;
}

/// Maps each [`Format`] to the codec that handles it.
pub struct CodecRegistry {
    codecs: BTreeMap<Format, Box<dyn Codec>>,
}

impl CodecRegistry {
    /// A registry with no codecs.
    pub fn empty() -> Self {
        Self {
            codecs: BTreeMap::new(),
        }
    }

    /// A registry with every codec compiled into this crate.
    pub fn standard() -> Self {
        let mut registry = Self::empty();
        registry.register(crate::fasta::FastaCodec);
        #[cfg(feature = "genbank")]
        registry.register(crate::genbank::GenbankCodec);
        #[cfg(feature = "nexus")]
        registry.register(crate::nexus::NexusCodec);
        #[cfg(feature = "phylip")]
        for layout in crate::phylip::PhylipLayout::ALL {
            registry.register(crate::phylip::PhylipCodec::new(layout));
        }
        #[cfg(feature = "stockholm")]
        registry.register(crate::stockholm::StockholmCodec);
        registry
    }

    /// Add a codec, replacing any codec already registered for its format.
    pub fn register<C: Codec + 'static>(&mut self, codec: C) {
        self.codecs.insert(codec.format(), Box::new(codec));
    }

    /// Formats with a registered codec.
    pub fn formats(&self) -> impl Iterator<Item = Format> + '_ {
        self.codecs.keys().copied()
    }

    pub fn codec(&self, format: Format) -> Result<&dyn Codec> {
        self.codecs
            .get(&format)
            .map(|c| c.as_ref())
            .ok_or_else(|| SeqmillError::InvalidInput(format!("no codec registered for {format}")))
    }

    /// Parse `text` as `format` into a collection tagged with that format.
    pub fn parse(&self, format: Format, text: &str) -> Result<SequenceCollection> {
        let records = self.codec(format)?.parse(text)?;
        debug!("parsed {} {} record(s)", records.len(), format);
        SequenceCollection::new(records, format)
    }

    /// Serialize a collection as `format`, regardless of its output format.
    pub fn serialize(&self, collection: &SequenceCollection, format: Format) -> Result<String> {
        let text = self.codec(format)?.serialize(&collection.records)?;
        debug!(
            "serialized {} record(s) as {} ({} bytes)",
            collection.len(),
            format,
            text.len()
        );
        Ok(text)
    }

    /// Serialize a collection in its own output format.
    pub fn write(&self, collection: &SequenceCollection) -> Result<String> {
        self.serialize(collection, collection.output_format)
    }

    /// Write a collection in its output format to `path`.
    pub fn write_to_path(&self, collection: &SequenceCollection, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let text = self.write(collection)?;
        fs::write(path, text).map_err(|e| {
            SeqmillError::Io(std::io::Error::new(
                e.kind(),
                format!("{}: {}", path.display(), e),
            ))
        })
    }
}

impl Default for CodecRegistry {
    fn default() -> Self {
        Self::standard()
    }
}
