//! Error types for correlation vector parsing and construction.

use thiserror::Error;

/// Top-level error type for correlation vector operations.
///
/// Length and depth overflow during `increment`/`extend`/`spin` is *not* an
/// error: the vector degrades to its terminated form instead (see
/// [`crate::CorrelationVector`]). Errors here are limited to strict parsing
/// failures and unavailable entropy sources.
#[derive(Debug, Error)]
pub enum CorrelationVectorError {
    /// The input string violates the structure, length, or alphabet rules of
    /// its version. Raised only when validation is enabled on parse.
    #[error("malformed correlation vector '{value}': {reason}")]
    Malformed {
        /// The offending input.
        value: String,
        /// What check failed.
        reason: String,
    },

    /// The input's base field matches no known version profile.
    #[error("correlation vector '{value}' does not match any supported version")]
    UnsupportedVersion {
        /// The offending input.
        value: String,
    },

    /// The OS randomness source (or wall clock, for spin) failed. Fatal: a
    /// process that cannot reach secure randomness cannot safely mint
    /// identifiers, so this is not retried.
    #[error("entropy source unavailable: {0}")]
    RandomnessUnavailable(String),
}

impl CorrelationVectorError {
    /// Convenience constructor for [`CorrelationVectorError::Malformed`].
    pub(crate) fn malformed(value: &str, reason: impl Into<String>) -> Self {
        CorrelationVectorError::Malformed {
            value: value.to_string(),
            reason: reason.into(),
        }
    }
}
