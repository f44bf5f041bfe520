//! Error types for amount parsing.

use thiserror::Error;

/// A textual amount that could not be read as a decimal number.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AmountError {
    /// The input was empty or whitespace.
    #[error("Empty amount")]
    Empty,

    /// The input is not a decimal number.
    #[error("Not a number: {0:?}")]
    NotANumber(String),
}
