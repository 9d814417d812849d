//! Canonical serialization primitives for C5 envelopes.
//!
//! A value is walked once in canonical order (object members sorted by name,
//! arrays in order) and the resulting event sequence is fed to independent
//! consumers: a streaming JSON emitter and a streaming SHA-256 digest. Because
//! both see the same sequence, the JSON text and the content hash of a value
//! always agree.
//!
#![deny(missing_docs)]

/// Canonicalization facade: text, hash, or both in one pass.
pub mod canonicalizer;
/// Streaming content hash and hash identifiers.
pub mod digest;
/// Streaming JSON text emitter.
pub mod emitter;
/// Canonical traversal and the event model.
pub mod traversal;
/// Validation helpers used by canonical types.
pub mod validation;
/// The canonical value model and leaf text rules.
pub mod value;

pub use canonicalizer::{CanonicalError, CanonicalizationResult, Canonicalizer};
pub use digest::{content_hash, ContentHash, DigestAlg, HashDigest};
pub use emitter::{to_json, JsonEmitter, JsonProps, TextSink};
pub use traversal::{
    traverse, traverse_with_splice, Event, EventLog, EventSink, Leaf, Path, Splice, Tee,
};
pub use validation::ValidationError;
pub use value::{
    format_number, format_timestamp, timestamp_from_millis, whole_number, CanonicalValue,
    ToCanonical, TIMESTAMP_FORMAT,
};
