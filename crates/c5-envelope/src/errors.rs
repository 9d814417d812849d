use thiserror::Error;

/// Error raised by a custom identity generator.
pub type IdError = Box<dyn std::error::Error + Send + Sync>;

/// Envelope error types.
#[derive(Error, Debug)]
pub enum EnvelopeError {
    /// Wire input could not be decoded into a payload or envelope.
    #[error("decode failed: {0}")]
    Decode(#[from] serde_json::Error),
    /// The identity generator refused to produce an id.
    #[error("id generation failed: {0}")]
    IdGenerator(#[source] IdError),
    /// A value could not be brought into canonical form.
    #[error("canonicalization error: {0}")]
    Canonical(#[from] c5_canonical::CanonicalError),
    /// A field value is outside its valid range.
    #[error("invalid field: {0}")]
    Validation(#[from] c5_canonical::ValidationError),
}
