//! INSDC feature locations and quoted qualifier tokens.
//!
//! GenBank, NEXUS and Stockholm all spell feature locations the INSDC way
//! (`12..40`, `complement(join(1..3,7..9))`), converting between 1-based
//! inclusive text and 0-based half-open [`Segment`]s. NEXUS and Stockholm
//! also share the `key="value"` token syntax for qualifiers.

use seqmill_core::{Result, SeqmillError};
use seqmill_seq::{Location, Qualifiers, Segment, Strand};

// ---------------------------------------------------------------------------
// Locations
// ---------------------------------------------------------------------------

fn bad_location(text: &str, why: &str) -> SeqmillError {
    SeqmillError::Format(format!("bad feature location '{text}': {why}"))
}

struct LocationParser<'a> {
    text: &'a str,
    rest: &'a str,
}

impl<'a> LocationParser<'a> {
    fn eat(&mut self, prefix: &str) -> bool {
        match self.rest.strip_prefix(prefix) {
            Some(rest) => {
                self.rest = rest;
                true
            }
            None => false,
        }
    }

    fn require(&mut self, prefix: &str) -> Result<()> {
        if self.eat(prefix) {
            Ok(())
        } else {
            Err(bad_location(self.text, &format!("expected '{prefix}'")))
        }
    }

    /// A 1-based position, with any partial marker dropped.
    fn position(&mut self) -> Result<usize> {
        let _ = self.eat("<") || self.eat(">");
        let digits = self.rest.bytes().take_while(u8::is_ascii_digit).count();
        if digits == 0 {
            return Err(bad_location(self.text, "expected a position"));
        }
        let (num, rest) = self.rest.split_at(digits);
        self.rest = rest;
        let pos: usize = num
            .parse()
            .map_err(|_| bad_location(self.text, "position out of range"))?;
        if pos == 0 {
            return Err(bad_location(self.text, "positions are 1-based"));
        }
        Ok(pos)
    }

    fn span(&mut self) -> Result<Segment> {
        let start = self.position()?;
        let end = if self.eat("..") {
            self.position()?
        } else if self.eat("^") {
            // between two bases; keep the first
            self.position()?;
            start
        } else {
            start
        };
        Segment::new(start - 1, end, Strand::Forward)
            .map_err(|_| bad_location(self.text, "end precedes start"))
    }

    /// Segments in reading order.
    fn segments(&mut self) -> Result<Vec<Segment>> {
        if self.eat("complement(") {
            let inner = self.segments()?;
            self.require(")")?;
            return Ok(inner
                .iter()
                .rev()
                .map(|s| Segment::new(s.start(), s.end(), s.strand().flip()))
                .collect::<Result<Vec<_>>>()?);
        }
        if self.eat("join(") || self.eat("order(") {
            let mut out = self.segments()?;
            while self.eat(",") {
                out.extend(self.segments()?);
            }
            self.require(")")?;
            return Ok(out);
        }
        Ok(vec![self.span()?])
    }
}

/// Parse an INSDC location string.
///
/// Whitespace is ignored; partial markers are accepted and dropped. Remote
/// references (`J00194.1:100..202`) are rejected.
pub fn parse_location(text: &str) -> Result<Location> {
    let compact: String = text.chars().filter(|c| !c.is_whitespace()).collect();
    let mut parser = LocationParser {
        text,
        rest: &compact,
    };
    let segments = parser.segments()?;
    if !parser.rest.is_empty() {
        return Err(bad_location(text, "trailing characters"));
    }
    Location::new(segments).map_err(|_| bad_location(text, "no segments"))
}

fn format_span(seg: &Segment) -> String {
    if seg.len() == 1 {
        format!("{}", seg.end())
    } else {
        format!("{}..{}", seg.start() + 1, seg.end())
    }
}

/// Write a location the INSDC way.
///
/// A location entirely on the reverse strand is written as one
/// `complement(...)` around the forward-order spans.
pub fn format_location(location: &Location) -> String {
    let segments = location.segments();
    if location.is_reverse() {
        let spans: Vec<String> = segments.iter().rev().map(format_span).collect();
        return if spans.len() == 1 {
            format!("complement({})", spans[0])
        } else {
            format!("complement(join({}))", spans.join(","))
        };
    }
    let spans: Vec<String> = segments
        .iter()
        .map(|s| match s.strand() {
            Strand::Forward => format_span(s),
            Strand::Reverse => format!("complement({})", format_span(s)),
        })
        .collect();
    if spans.len() == 1 {
        spans[0].clone()
    } else {
        format!("join({})", spans.join(","))
    }
}

// ---------------------------------------------------------------------------
// Tokens
// ---------------------------------------------------------------------------

/// Split `text` at whitespace outside single or double quotes.
///
/// Quotes stay in the tokens; a doubled quote inside a quoted run is an
/// escaped quote character.
pub fn tokenize(text: &str) -> Result<Vec<String>> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut quote: Option<char> = None;
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        match quote {
            Some(q) if c == q => {
                current.push(c);
                if chars.peek() == Some(&q) {
                    current.push(q);
                    chars.next();
                } else {
                    quote = None;
                }
            }
            Some(_) => current.push(c),
            None if c == '"' || c == '\'' => {
                quote = Some(c);
                current.push(c);
            }
            None if c.is_whitespace() => {
                if !current.is_empty() {
                    tokens.push(std::mem::take(&mut current));
                }
            }
            None => current.push(c),
        }
    }
    if quote.is_some() {
        return Err(SeqmillError::Format(format!("unterminated quote in '{text}'")));
    }
    if !current.is_empty() {
        tokens.push(current);
    }
    Ok(tokens)
}

/// Strip surrounding quotes and undo doubled quotes.
pub fn unquote(token: &str) -> String {
    for q in ['"', '\''] {
        if token.len() >= 2 && token.starts_with(q) && token.ends_with(q) {
            let pair: String = [q, q].iter().collect();
            return token[1..token.len() - 1].replace(&pair, &q.to_string());
        }
    }
    token.to_string()
}

/// Wrap `value` in double quotes, doubling any embedded ones.
pub fn quote(value: &str) -> String {
    format!("\"{}\"", value.replace('"', "\"\""))
}

/// Quote a NEXUS-style name when it would not survive as a bare word.
pub fn quote_name(name: &str) -> String {
    let plain = !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "_.|".contains(c));
    if plain {
        name.to_string()
    } else {
        format!("'{}'", name.replace('\'', "''"))
    }
}

/// Qualifiers as space-separated `key="value"` tokens; flags are bare keys.
pub fn format_qualifiers(qualifiers: &Qualifiers) -> String {
    let mut tokens = Vec::new();
    for (key, values) in qualifiers {
        if values.is_empty() {
            tokens.push(key.clone());
        }
        for value in values {
            tokens.push(format!("{}={}", key, quote(value)));
        }
    }
    tokens.join(" ")
}

/// Add the qualifier encoded by one `key="value"` (or bare `key`) token.
pub fn push_qualifier(qualifiers: &mut Qualifiers, token: &str) {
    match token.split_once('=') {
        Some((key, value)) => qualifiers
            .entry(key.to_string())
            .or_default()
            .push(unquote(value)),
        None => {
            qualifiers.entry(token.to_string()).or_default();
        }
    }
}
