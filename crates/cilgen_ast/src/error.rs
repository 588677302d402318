//! Error types for AST construction.

use thiserror::Error;

/// Errors that can occur while building the semantic tree.
#[derive(Debug, Error)]
pub enum Error {
    /// A statement line is structurally broken (recognized keyword with
    /// missing or ill-typed argument tokens).
    #[error("malformed statement at line {line}: {reason}")]
    MalformedStatement {
        /// Source line of the offending statement.
        line: u32,
        /// What was wrong with it.
        reason: String,
    },

    /// The parse tree itself violates the expected shape.
    #[error("malformed parse tree: {0}")]
    MalformedTree(String),
}

/// Result type alias for AST operations.
pub type Result<T> = std::result::Result<T, Error>;
