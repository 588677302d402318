//! Canonical policy-source emission.
//!
//! This crate is **pure and deterministic**: the same database always
//! produces the same artifact. It provides:
//! - An insertion-ordered, handle-keyed multimap for folding scattered
//!   relation facts into grouped statements ([`multimap`])
//! - A stack-encoded expression renderer ([`expr`])
//! - One canonical ordering comparator per context-rule family ([`sort`])
//! - The single-pass policy emitter ([`emit`])

#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

pub mod emit;
pub mod error;
pub mod expr;
pub mod multimap;
pub mod sort;

pub use emit::{generate_policy, Section};
pub use error::{Error, Result};
pub use expr::{render_expr, COND_EXPR_MAX_DEPTH};
pub use multimap::Multimap;
