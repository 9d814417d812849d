//! Envelope identity derivation.
//!
//! When an envelope is built without an id, one is derived from its creation
//! time and the content hash of its payload data. The policy is pluggable:
//!
//! - [`TimeHashIdGenerator`] (default): `"{t}-{hash}"`
//! - [`HashIdGenerator`]: `"{hash}"`
//! - [`FnIdGenerator`]: any closure over [`IdInput`]

use c5_canonical::ContentHash;
use std::fmt;

use crate::assembler::SimpleEnvelopeProps;
use crate::errors::IdError;

/// Inputs available to an identity generator.
#[derive(Debug, Clone, Copy)]
pub struct IdInput<'a> {
    /// Resolved creation time in milliseconds since the Unix epoch.
    pub t: i64,
    /// Content hash of the payload data.
    pub hash: &'a ContentHash,
    /// Props the envelope was built from.
    pub props: &'a SimpleEnvelopeProps,
}

/// Derives an envelope id.
pub trait IdGenerator: Send + Sync {
    /// Produces the id for `input`.
    ///
    /// # Errors
    ///
    /// Custom generators may fail; the error reaches the caller of the
    /// envelope accessor unchanged.
    fn generate(&self, input: &IdInput<'_>) -> Result<String, IdError>;
}

/// `"{t}-{hash}"`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TimeHashIdGenerator;

impl IdGenerator for TimeHashIdGenerator {
    fn generate(&self, input: &IdInput<'_>) -> Result<String, IdError> {
        Ok(format!("{}-{}", input.t, input.hash))
    }
}

/// `"{hash}"`.
#[derive(Debug, Clone, Copy, Default)]
pub struct HashIdGenerator;

impl IdGenerator for HashIdGenerator {
    fn generate(&self, input: &IdInput<'_>) -> Result<String, IdError> {
        Ok(input.hash.to_string())
    }
}

/// Adapts a closure into an [`IdGenerator`].
pub struct FnIdGenerator<F>(pub F);

impl<F> IdGenerator for FnIdGenerator<F>
where
    F: Fn(&IdInput<'_>) -> Result<String, IdError> + Send + Sync,
{
    fn generate(&self, input: &IdInput<'_>) -> Result<String, IdError> {
        (self.0)(input)
    }
}

impl<F> fmt::Debug for FnIdGenerator<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("FnIdGenerator")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use c5_canonical::{content_hash, CanonicalValue};
    use serde_json::json;

    fn hash() -> ContentHash {
        content_hash(&CanonicalValue::from(json!({"y": 4})))
    }

    #[test]
    fn builtin_policies() {
        let hash = hash();
        let props = SimpleEnvelopeProps::default();
        let input = IdInput {
            t: 123,
            hash: &hash,
            props: &props,
        };
        assert_eq!(
            TimeHashIdGenerator.generate(&input).unwrap(),
            "123-GUKeStj4aGQRju7p2Dzf31Qi2d2MVuRCw68H1c8gMCnQ"
        );
        assert_eq!(
            HashIdGenerator.generate(&input).unwrap(),
            "GUKeStj4aGQRju7p2Dzf31Qi2d2MVuRCw68H1c8gMCnQ"
        );
    }

    #[test]
    fn closures_see_props() {
        let hash = hash();
        let props = SimpleEnvelopeProps::new("node-1", Default::default());
        let generator = FnIdGenerator(|input: &IdInput<'_>| -> Result<String, IdError> {
            Ok(format!("{}:{}", input.props.src, &input.hash.as_str()[..6]))
        });
        let input = IdInput {
            t: 0,
            hash: &hash,
            props: &props,
        };
        assert_eq!(generator.generate(&input).unwrap(), "node-1:GUKeSt");
    }
}
