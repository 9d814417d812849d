//! Versioned message envelopes with content-derived identity.
//!
//! An envelope wraps an application [`Payload`] with routing metadata
//! (`src`, `dst`), a creation time, a time to live, and an id. Unless the
//! caller supplies one, the id is derived from the creation time and the
//! content hash of the payload data.
//!
//! The canonical text of an envelope embeds the payload data text verbatim:
//! it is rendered once, hashed once, and spliced into place.
//!
#![deny(missing_docs)]

/// Envelope assembly and memoized finalization.
pub mod assembler;
/// Pluggable time source.
pub mod clock;
/// Error types for envelope operations.
pub mod errors;
/// Identity derivation policies.
pub mod identity;
/// Payload and envelope wire shapes.
pub mod schema;

pub use assembler::{EnvelopeTime, SimpleEnvelope, SimpleEnvelopeProps, DEFAULT_TTL};
pub use clock::{Clock, FixedClock, SystemClock};
pub use errors::{EnvelopeError, IdError};
pub use identity::{FnIdGenerator, HashIdGenerator, IdGenerator, IdInput, TimeHashIdGenerator};
pub use schema::{Envelope, Payload, Version, CURRENT_VERSION};
