//! Error types for color parsing and palette validation.

use std::num::ParseIntError;

use thiserror::Error;

use crate::error::FilterError;

/// Error type for parsing hex color strings.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseColorError {
    /// Hex string has invalid length (must be 3 or 6 characters after stripping '#')
    #[error("invalid hex color length (expected 3 or 6 characters)")]
    InvalidLength,
    /// Non-ASCII input, which can never be a hex digit
    #[error("hex color contains non-ASCII characters")]
    NonAscii,
    /// A character that is not a hex digit, including signs
    #[error("invalid hex character: {0:?}")]
    InvalidDigit(char),
    /// Hex digits that do not form a channel value
    #[error("invalid hex value: {0}")]
    InvalidHex(#[from] ParseIntError),
}

/// Error type for palette validation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PaletteError {
    /// No colors provided
    #[error("palette cannot be empty")]
    EmptyPalette,
    /// Duplicate color found at the specified index
    #[error("duplicate color found at index {index}")]
    DuplicateColor {
        /// Index where the duplicate was found
        index: usize,
    },
    /// Invalid hex color string
    #[error("invalid color: {0}")]
    ParseColor(#[from] ParseColorError),
}

impl From<PaletteError> for FilterError {
    fn from(err: PaletteError) -> Self {
        FilterError::invalid("palette", err.to_string())
    }
}
