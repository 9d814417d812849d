use serde::Serialize;

use crate::digest::{ContentHash, HashDigest};
use crate::emitter::{JsonEmitter, JsonProps};
use crate::traversal::{traverse, Tee};
use crate::value::CanonicalValue;

/// Error returned when a value cannot enter canonical form.
#[derive(thiserror::Error, Debug)]
pub enum CanonicalError {
    /// The value could not be resolved into the canonical value model.
    #[error("serialization failed: {0}")]
    Serialization(String),
    /// Provided JSON text could not be parsed.
    #[error("invalid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),
}

/// Result of canonicalization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanonicalizationResult {
    /// Canonical JSON text.
    pub json: String,
    /// Content hash computed from the same event sequence.
    pub hash: ContentHash,
}

/// Canonicalizer that emits deterministic JSON text and content hashes.
#[derive(Debug, Clone, Default)]
pub struct Canonicalizer {
    props: JsonProps,
}

impl Canonicalizer {
    /// Creates a canonicalizer with the given formatting.
    pub fn new(props: JsonProps) -> Self {
        Self { props }
    }

    /// Formatting applied to rendered text.
    pub fn props(&self) -> &JsonProps {
        &self.props
    }

    /// Renders canonical JSON text only.
    pub fn render(&self, value: &CanonicalValue) -> String {
        let mut emitter = JsonEmitter::new(String::new(), &self.props);
        traverse(value, &mut emitter);
        emitter.into_output()
    }

    /// Renders text and hash in a single traversal.
    pub fn canonicalize(&self, value: &CanonicalValue) -> CanonicalizationResult {
        let mut tee = Tee::new(
            JsonEmitter::new(String::new(), &self.props),
            HashDigest::new(),
        );
        traverse(value, &mut tee);
        let (emitter, digest) = tee.into_parts();
        CanonicalizationResult {
            json: emitter.into_output(),
            hash: digest.digest(),
        }
    }

    /// Canonicalizes any serde-serializable value.
    pub fn canonicalize_serialize<T: Serialize + ?Sized>(
        &self,
        value: &T,
    ) -> Result<CanonicalizationResult, CanonicalError> {
        let value = CanonicalValue::from_serialize(value)?;
        Ok(self.canonicalize(&value))
    }

    /// Parses JSON text and canonicalizes it.
    pub fn canonicalize_str(&self, json: &str) -> Result<CanonicalizationResult, CanonicalError> {
        let value: CanonicalValue = serde_json::from_str(json)?;
        Ok(self.canonicalize(&value))
    }
}
