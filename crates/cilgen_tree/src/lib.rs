//! Arena tree and depth-first walker for cilgen.
//!
//! The same [`Tree`] type carries both the raw parse tree (string tokens)
//! and the semantic tree (tagged statements); the payload type is the only
//! difference. The walker visits both the same way, so traversal logic
//! exists exactly once.

#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

pub mod tree;
pub mod walker;

pub use tree::{Node, NodeId, Tree};
pub use walker::{walk, VisitAction, Visitor};
