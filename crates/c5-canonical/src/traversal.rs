//! Depth-first canonical traversal.
//!
//! Walking a [`CanonicalValue`] yields a fixed event sequence: containers open
//! and close around their members, object members appear in byte-wise
//! ascending name order, array members in their original order. Emitters and
//! digests consume the same sequence through [`EventSink`].

use chrono::{DateTime, Utc};
use std::borrow::Cow;
use std::fmt;
use tracing::trace;

use crate::value::{format_number, format_timestamp, quote, CanonicalValue};

/// Breadcrumb from the traversal root: `/data/0/name`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Path {
    segments: Vec<String>,
}

impl Path {
    /// The root path, rendered as the empty string.
    pub fn root() -> Self {
        Self {
            segments: Vec::new(),
        }
    }

    /// Builds a path from a chain of member names.
    pub fn from_fields<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            segments: fields.into_iter().map(Into::into).collect(),
        }
    }

    /// Extends the path with an object member name.
    pub fn push_field(&self, field: &str) -> Self {
        let mut segments = self.segments.clone();
        segments.push(field.to_string());
        Self { segments }
    }

    /// Extends the path with an array index.
    pub fn push_index(&self, index: usize) -> Self {
        let mut segments = self.segments.clone();
        segments.push(index.to_string());
        Self { segments }
    }

    /// Number of segments below the root.
    pub fn depth(&self) -> usize {
        self.segments.len()
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for segment in &self.segments {
            write!(f, "/{}", segment)?;
        }
        Ok(())
    }
}

/// A leaf carried by [`Event::Value`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Leaf<'a> {
    /// `null`.
    Null,
    /// Boolean.
    Bool(bool),
    /// Number.
    Number(f64),
    /// Unquoted string content.
    String(&'a str),
    /// Timestamp.
    Timestamp(&'a DateTime<Utc>),
    /// Pre-rendered JSON text, written verbatim by emitters.
    Raw(&'a str),
}

impl<'a> Leaf<'a> {
    /// JSON text for this leaf.
    pub fn json_text(&self) -> Cow<'a, str> {
        match *self {
            Leaf::Null => Cow::Borrowed("null"),
            Leaf::Bool(true) => Cow::Borrowed("true"),
            Leaf::Bool(false) => Cow::Borrowed("false"),
            Leaf::Number(n) => Cow::Owned(format_number(n)),
            Leaf::String(s) => Cow::Owned(quote(s)),
            Leaf::Timestamp(ts) => Cow::Owned(quote(&format_timestamp(ts))),
            Leaf::Raw(text) => Cow::Borrowed(text),
        }
    }

    /// Plain string form, without JSON quoting or escaping.
    pub fn plain_text(&self) -> Cow<'a, str> {
        match *self {
            Leaf::String(s) => Cow::Borrowed(s),
            Leaf::Timestamp(ts) => Cow::Owned(format_timestamp(ts)),
            _ => self.json_text(),
        }
    }
}

/// One step of the canonical event sequence.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Event<'a> {
    /// `[`
    ArrayStart,
    /// `]`
    ArrayEnd,
    /// `{`
    ObjectStart,
    /// `}`
    ObjectEnd,
    /// Name of the object member whose events follow.
    Attribute(&'a str),
    /// A leaf value.
    Value(Leaf<'a>),
}

impl fmt::Display for Event<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Event::ArrayStart => write!(f, "AS"),
            Event::ArrayEnd => write!(f, "AE"),
            Event::ObjectStart => write!(f, "OS"),
            Event::ObjectEnd => write!(f, "OE"),
            Event::Attribute(name) => write!(f, "@{}", quote(name)),
            Event::Value(leaf) => write!(f, "={}", leaf.json_text()),
        }
    }
}

/// Consumer of canonical events.
pub trait EventSink {
    /// Receives the next event together with the path it was emitted at.
    fn append(&mut self, event: &Event<'_>, path: &Path);
}

impl<T: EventSink + ?Sized> EventSink for &mut T {
    fn append(&mut self, event: &Event<'_>, path: &Path) {
        (**self).append(event, path)
    }
}

/// Fans every event out to two sinks, in order.
#[derive(Debug)]
pub struct Tee<A, B> {
    first: A,
    second: B,
}

impl<A: EventSink, B: EventSink> Tee<A, B> {
    /// Pairs two sinks.
    pub fn new(first: A, second: B) -> Self {
        Self { first, second }
    }

    /// Returns both sinks.
    pub fn into_parts(self) -> (A, B) {
        (self.first, self.second)
    }
}

impl<A: EventSink, B: EventSink> EventSink for Tee<A, B> {
    fn append(&mut self, event: &Event<'_>, path: &Path) {
        self.first.append(event, path);
        self.second.append(event, path);
    }
}

/// Records events as `<path> <event>` lines.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct EventLog {
    entries: Vec<String>,
}

impl EventLog {
    /// Empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Recorded lines, in emission order.
    pub fn entries(&self) -> &[String] {
        &self.entries
    }
}

impl EventSink for EventLog {
    fn append(&mut self, event: &Event<'_>, path: &Path) {
        self.entries.push(format!("{} {}", path, event));
    }
}

/// Instructs the traversal to emit pre-rendered JSON at one slot.
///
/// When the walk reaches the member at `slot`, it emits a single
/// `Value(Leaf::Raw(json))` instead of descending into that member's value.
#[derive(Debug, Clone)]
pub struct Splice<'a> {
    /// Exact path of the member to replace.
    pub slot: Path,
    /// JSON text emitted in its place.
    pub json: &'a str,
}

/// Walks `value` and feeds its canonical events into `sink`.
///
/// # Panics
///
/// Panics if an object carries the same member name twice; such a value has
/// no canonical form and indicates a broken conversion upstream.
pub fn traverse<S: EventSink + ?Sized>(value: &CanonicalValue, sink: &mut S) {
    Walker { sink, splice: None }.walk(value, &Path::root());
}

/// Like [`traverse`], substituting `splice.json` at `splice.slot`.
///
/// # Panics
///
/// Same conditions as [`traverse`].
pub fn traverse_with_splice<S: EventSink + ?Sized>(
    value: &CanonicalValue,
    splice: &Splice<'_>,
    sink: &mut S,
) {
    Walker {
        sink,
        splice: Some(splice),
    }
    .walk(value, &Path::root());
}

struct Walker<'s, 'j, S: ?Sized> {
    sink: &'s mut S,
    splice: Option<&'s Splice<'j>>,
}

impl<S: EventSink + ?Sized> Walker<'_, '_, S> {
    fn walk(&mut self, value: &CanonicalValue, path: &Path) {
        if let Some(splice) = self.splice {
            if splice.slot == *path {
                trace!(path = %path, bytes = splice.json.len(), "splicing rendered json");
                self.sink.append(&Event::Value(Leaf::Raw(splice.json)), path);
                return;
            }
        }

        match value {
            CanonicalValue::Null => self.leaf(Leaf::Null, path),
            CanonicalValue::Bool(b) => self.leaf(Leaf::Bool(*b), path),
            CanonicalValue::Number(n) => self.leaf(Leaf::Number(*n), path),
            CanonicalValue::String(s) => self.leaf(Leaf::String(s), path),
            CanonicalValue::Timestamp(ts) => self.leaf(Leaf::Timestamp(ts), path),
            CanonicalValue::Array(items) => {
                self.sink.append(&Event::ArrayStart, path);
                for (index, item) in items.iter().enumerate() {
                    self.walk(item, &path.push_index(index));
                }
                self.sink.append(&Event::ArrayEnd, path);
            }
            CanonicalValue::Object(members) => {
                self.sink.append(&Event::ObjectStart, path);
                let mut ordered: Vec<&(String, CanonicalValue)> = members.iter().collect();
                ordered.sort_by(|a, b| a.0.as_bytes().cmp(b.0.as_bytes()));
                if let Some(pair) = ordered.windows(2).find(|pair| pair[0].0 == pair[1].0) {
                    panic!("duplicate member name '{}' at '{}'", pair[0].0, path);
                }
                for (name, member) in ordered {
                    let member_path = path.push_field(name);
                    self.sink.append(&Event::Attribute(name), &member_path);
                    self.walk(member, &member_path);
                }
                self.sink.append(&Event::ObjectEnd, path);
            }
        }
    }

    fn leaf(&mut self, leaf: Leaf<'_>, path: &Path) {
        self.sink.append(&Event::Value(leaf), path);
    }
}
