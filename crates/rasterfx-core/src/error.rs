//! Error type shared by every engine in the crate.
//!
//! [`FilterError`] covers the two failure classes an engine call can hit:
//! a buffer without pixel data, and a parameter outside the range the
//! engine can work with. Edge addressing is a policy and never surfaces here.

use thiserror::Error;

/// Failure of an engine call.
///
/// Every engine checks its inputs before touching the buffer, so an error
/// means the call aborted without writing anything.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FilterError {
    /// The buffer holds no pixel data (zero width, zero height or empty storage).
    #[error("buffer holds no pixel data")]
    NullBuffer,

    /// A parameter is outside the range the engine accepts.
    #[error("invalid parameter `{name}`: {reason}")]
    InvalidParameter {
        /// Name of the offending parameter
        name: &'static str,
        /// Human-readable constraint that was violated
        reason: String,
    },
}

impl FilterError {
    pub(crate) fn invalid(name: &'static str, reason: impl Into<String>) -> Self {
        FilterError::InvalidParameter {
            name,
            reason: reason.into(),
        }
    }
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, FilterError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_null_buffer_message() {
        assert_eq!(FilterError::NullBuffer.to_string(), "buffer holds no pixel data");
    }

    #[test]
    fn test_invalid_parameter_message() {
        let err = FilterError::invalid("divisor", "must not be zero");
        assert_eq!(
            err.to_string(),
            "invalid parameter `divisor`: must not be zero"
        );
    }

    #[test]
    fn test_invalid_parameter_fields() {
        match FilterError::invalid("levels", "need at least 2") {
            FilterError::InvalidParameter { name, reason } => {
                assert_eq!(name, "levels");
                assert_eq!(reason, "need at least 2");
            }
            other => panic!("Expected InvalidParameter, got {other:?}"),
        }
    }
}
