//! Common error types for the Lexora core types.

use thiserror::Error;

/// A result type using `IdError`.
pub type Result<T> = std::result::Result<T, IdError>;

/// Errors that can occur when constructing identifiers.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdError {
    /// The identifier was empty or only whitespace.
    #[error("identifier must not be empty")]
    Empty,
}
