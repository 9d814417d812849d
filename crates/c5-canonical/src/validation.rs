use thiserror::Error;

/// Rejected inputs to canonical primitives.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    /// A number that must be whole and within bounds is not.
    #[error("{field} ({value}) is not a whole number in range")]
    NotWholeInRange {
        /// What was being validated.
        field: &'static str,
        /// Offending number, as number text.
        value: String,
    },
    /// Epoch milliseconds outside the range an instant can represent.
    #[error("{millis} ms since the epoch is not a representable instant")]
    TimestampOutOfRange {
        /// Offending milliseconds.
        millis: i64,
    },
}
