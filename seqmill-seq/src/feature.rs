//! Feature annotations: typed location segments plus qualifiers.
//!
//! Coordinates are 0-based and half-open. A [`Location`] is never empty and
//! every [`Segment`] satisfies `start < end`; transforms that would violate
//! either drop the segment (or the whole feature) instead.

use indexmap::IndexMap;

use seqmill_core::{Result, SeqmillError};

/// Strand orientation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Strand {
    Forward,
    Reverse,
}

impl Strand {
    /// The opposite strand.
    pub fn flip(self) -> Strand {
        match self {
            Strand::Forward => Strand::Reverse,
            Strand::Reverse => Strand::Forward,
        }
    }
}

/// A contiguous stretch `[start, end)` on one strand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "RawSegment"))]
pub struct Segment {
    start: usize,
    end: usize,
    strand: Strand,
}

impl Segment {
    /// Create a segment, failing with a range error unless `start < end`.
    pub fn new(start: usize, end: usize, strand: Strand) -> Result<Self> {
        Self::try_new(start, end, strand).ok_or_else(|| {
            SeqmillError::Range(format!("segment end {end} must exceed start {start}"))
        })
    }

    /// Create a segment, returning `None` when it would be empty.
    pub fn try_new(start: usize, end: usize, strand: Strand) -> Option<Self> {
        (start < end).then_some(Self { start, end, strand })
    }

    pub fn start(&self) -> usize {
        self.start
    }

    pub fn end(&self) -> usize {
        self.end
    }

    pub fn strand(&self) -> Strand {
        self.strand
    }

    #[allow(clippy::len_without_is_empty)]
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    /// Intersect with `[lo, hi)`.
    pub fn clip(&self, lo: usize, hi: usize) -> Option<Segment> {
        Segment::try_new(self.start.max(lo), self.end.min(hi), self.strand)
    }

    /// Move the segment `delta` positions to the right.
    pub fn shifted_right(&self, delta: usize) -> Segment {
        Segment {
            start: self.start + delta,
            end: self.end + delta,
            strand: self.strand,
        }
    }

    /// Move the segment `delta` positions to the left, clipping at zero.
    pub fn shifted_left(&self, delta: usize) -> Option<Segment> {
        Segment::try_new(
            self.start.saturating_sub(delta),
            self.end.saturating_sub(delta),
            self.strand,
        )
    }

    /// Mirror onto the reverse strand of a sequence of length `len`.
    ///
    /// The segment must lie within `[0, len)`.
    pub fn mirrored(&self, len: usize) -> Segment {
        Segment {
            start: len - self.end,
            end: len - self.start,
            strand: self.strand.flip(),
        }
    }
}

// Deserialized values go through the same checks as the constructors.

#[cfg(feature = "serde")]
#[derive(serde::Deserialize)]
struct RawSegment {
    start: usize,
    end: usize,
    strand: Strand,
}

#[cfg(feature = "serde")]
impl TryFrom<RawSegment> for Segment {
    type Error = SeqmillError;

    fn try_from(raw: RawSegment) -> Result<Self> {
        Segment::new(raw.start, raw.end, raw.strand)
    }
}

#[cfg(feature = "serde")]
#[derive(serde::Deserialize)]
struct RawLocation {
    segments: Vec<Segment>,
}

#[cfg(feature = "serde")]
impl TryFrom<RawLocation> for Location {
    type Error = SeqmillError;

    fn try_from(raw: RawLocation) -> Result<Self> {
        Location::new(raw.segments)
    }
}

/// An ordered, non-empty list of segments.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "RawLocation"))]
pub struct Location {
    segments: Vec<Segment>,
}

impl Location {
    /// Build a location, failing with a range error when `segments` is empty.
    pub fn new(segments: Vec<Segment>) -> Result<Self> {
        Self::from_segments(segments)
            .ok_or_else(|| SeqmillError::Range("location must have at least one segment".into()))
    }

    /// Build a location, returning `None` when `segments` is empty.
    pub fn from_segments(segments: Vec<Segment>) -> Option<Self> {
        (!segments.is_empty()).then_some(Self { segments })
    }

    /// A single-segment location.
    pub fn single(start: usize, end: usize, strand: Strand) -> Result<Self> {
        Ok(Self {
            segments: vec![Segment::new(start, end, strand)?],
        })
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Start of the first segment.
    pub fn start(&self) -> usize {
        self.segments[0].start
    }

    /// Largest end coordinate over all segments.
    pub fn max_end(&self) -> usize {
        self.segments.iter().map(|s| s.end).max().unwrap_or(0)
    }

    /// Whether every segment is on the reverse strand.
    pub fn is_reverse(&self) -> bool {
        self.segments.iter().all(|s| s.strand == Strand::Reverse)
    }

    /// Apply `f` to every segment independently, dropping segments for which
    /// it returns `None`. Returns `None` when nothing survives.
    pub fn map_segments<F>(&self, f: F) -> Option<Location>
    where
        F: FnMut(&Segment) -> Option<Segment>,
    {
        Location::from_segments(self.segments.iter().filter_map(f).collect())
    }

    /// Mirror onto the reverse strand of a sequence of length `len`; segment
    /// order is reversed so that it still follows the direction of reading.
    pub fn mirrored(&self, len: usize) -> Location {
        Location {
            segments: self.segments.iter().rev().map(|s| s.mirrored(len)).collect(),
        }
    }
}

/// Insertion-ordered qualifier map; every key holds an ordered list of values
/// (empty for flag qualifiers such as `/pseudo`).
pub type Qualifiers = IndexMap<String, Vec<String>>;

/// An annotation attached to a sequence record.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Feature {
    /// Feature type (e.g. "gene", "CDS", "mRNA").
    pub feature_type: String,
    /// Where the feature lies on the owning sequence.
    pub location: Location,
    /// Qualifier key to values.
    pub qualifiers: Qualifiers,
}

impl Feature {
    pub fn new(feature_type: impl Into<String>, location: Location) -> Self {
        Self {
            feature_type: feature_type.into(),
            location,
            qualifiers: Qualifiers::new(),
        }
    }

    /// Append a value to a qualifier, creating the key if needed.
    pub fn with_qualifier(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.add_qualifier(key, value);
        self
    }

    pub fn add_qualifier(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.qualifiers.entry(key.into()).or_default().push(value.into());
    }

    /// Add a valueless flag qualifier.
    pub fn add_flag(&mut self, key: impl Into<String>) {
        self.qualifiers.entry(key.into()).or_default();
    }

    /// Values of a qualifier, if present.
    pub fn qualifier(&self, key: &str) -> Option<&[String]> {
        self.qualifiers.get(key).map(Vec::as_slice)
    }

    /// Same feature with its location transformed segment by segment.
    /// `None` when no segment survives.
    pub fn remapped<F>(&self, f: F) -> Option<Feature>
    where
        F: FnMut(&Segment) -> Option<Segment>,
    {
        self.location.map_segments(f).map(|location| Feature {
            feature_type: self.feature_type.clone(),
            location,
            qualifiers: self.qualifiers.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[cfg(feature = "serde")]
    #[test]
    fn deserialized_locations_are_checked() {
        let location = Location::single(2, 9, Strand::Reverse).unwrap();
        let json = serde_json::to_string(&location).unwrap();
        let back: Location = serde_json::from_str(&json).unwrap();
        assert_eq!(back, location);
        assert_eq!(back.start(), 2);

        assert!(serde_json::from_str::<Location>(r#"{"segments":[]}"#).is_err());
        assert!(serde_json::from_str::<Segment>(
            r#"{"start":5,"end":5,"strand":"Forward"}"#
        )
        .is_err());
    }

    #[test]
    fn segment_requires_positive_length() {
        assert!(Segment::new(5, 5, Strand::Forward).is_err());
        assert!(Segment::new(6, 5, Strand::Forward).is_err());
        assert_eq!(Segment::new(0, 9, Strand::Forward).unwrap().len(), 9);
    }

    #[test]
    fn location_requires_segments() {
        assert!(Location::new(Vec::new()).is_err());
    }

    #[test]
    fn clip_and_shift() {
        let seg = Segment::new(10, 20, Strand::Forward).unwrap();
        assert_eq!(seg.clip(15, 100).unwrap().start(), 15);
        assert!(seg.clip(20, 30).is_none());
        assert_eq!(seg.shifted_left(12).unwrap().start(), 0);
        assert_eq!(seg.shifted_left(12).unwrap().end(), 8);
        assert!(seg.shifted_left(25).is_none());
        assert_eq!(seg.shifted_right(5).end(), 25);
    }

    #[test]
    fn mirrored_flips_strand_and_order() {
        let loc = Location::new(vec![
            Segment::new(0, 3, Strand::Forward).unwrap(),
            Segment::new(6, 9, Strand::Forward).unwrap(),
        ])
        .unwrap();
        let rc = loc.mirrored(10);
        assert_eq!(rc.segments()[0], Segment::new(1, 4, Strand::Reverse).unwrap());
        assert_eq!(rc.segments()[1], Segment::new(7, 10, Strand::Reverse).unwrap());
        assert_eq!(rc.mirrored(10), loc);
    }

    #[test]
    fn remap_drops_dead_segments() {
        let feat = Feature::new(
            "CDS",
            Location::new(vec![
                Segment::new(0, 3, Strand::Forward).unwrap(),
                Segment::new(6, 9, Strand::Forward).unwrap(),
            ])
            .unwrap(),
        )
        .with_qualifier("gene", "panx1");
        let kept = feat.remapped(|s| s.clip(5, 100)).unwrap();
        assert_eq!(kept.location.segments().len(), 1);
        assert_eq!(kept.qualifier("gene").unwrap(), ["panx1".to_string()]);
        assert!(feat.remapped(|s| s.clip(50, 100)).is_none());
    }

    #[test]
    fn multi_valued_qualifiers_keep_order() {
        let mut feat = Feature::new("gene", Location::single(0, 4, Strand::Forward).unwrap());
        feat.add_qualifier("note", "first");
        feat.add_qualifier("db_xref", "x");
        feat.add_qualifier("note", "second");
        feat.add_flag("pseudo");
        let keys: Vec<&String> = feat.qualifiers.keys().collect();
        assert_eq!(keys, ["note", "db_xref", "pseudo"]);
        assert_eq!(feat.qualifier("note").unwrap(), ["first", "second"]);
        assert!(feat.qualifier("pseudo").unwrap().is_empty());
    }
}
