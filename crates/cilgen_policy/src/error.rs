//! Error types for policy emission.

use cilgen_ast::Flavor;
use thiserror::Error;

/// Errors that can occur during policy emission.
#[derive(Debug, Error)]
pub enum Error {
    /// An operator was applied with too few operands on the stack.
    #[error("expression stack underflow: operator '{op}' with too few operands")]
    ExprUnderflow {
        /// Display text of the offending operator.
        op: &'static str,
    },

    /// The expression stack exceeded its fixed depth bound.
    #[error("expression stack overflow: depth bound {max} exceeded")]
    ExprOverflow {
        /// The configured maximum depth.
        max: usize,
    },

    /// After consuming every token the stack did not hold exactly one value.
    #[error("malformed expression: {remaining} values left on the stack")]
    MalformedExpr {
        /// Number of values left after evaluation.
        remaining: usize,
    },

    /// A statement kind appeared at a dispatch site that does not admit it.
    #[error("unexpected {flavor:?} statement in {site}")]
    UnexpectedFlavor {
        /// The offending flavor.
        flavor: Flavor,
        /// The restricted dispatch site.
        site: &'static str,
    },

    /// A declaration or grouped fact is incomplete.
    #[error("missing data: {0}")]
    MissingData(String),

    /// Writing to a section buffer failed.
    #[error(transparent)]
    Fmt(#[from] std::fmt::Error),
}

/// Result type alias for emission operations.
pub type Result<T> = std::result::Result<T, Error>;
