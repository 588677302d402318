//! Security context and MLS level model.
//!
//! Plain data; rendering to policy-source text lives with the emitter.

use crate::symtab::SymbolId;
use serde::{Deserialize, Serialize};

/// One element of a category set: a single category or an inclusive range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CatItem {
    /// A single category.
    Cat(SymbolId),
    /// An inclusive `low.high` range of categories.
    Range {
        /// Lowest category in the range.
        low: SymbolId,
        /// Highest category in the range.
        high: SymbolId,
    },
}

/// An ordered set of categories and category ranges.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CatSet {
    /// Items in declaration order.
    pub items: Vec<CatItem>,
}

/// A sensitivity plus its category set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Level {
    /// Sensitivity reference.
    pub sens: SymbolId,
    /// Categories attached to the sensitivity.
    pub cats: CatSet,
}

/// A low/high pair of levels.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelRange {
    /// Low level.
    pub low: Level,
    /// High level.
    pub high: Level,
}

/// A full security context: user, role, type, and level range.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Context {
    /// User reference.
    pub user: SymbolId,
    /// Role reference.
    pub role: SymbolId,
    /// Type reference.
    pub ty: SymbolId,
    /// MLS level range.
    pub range: LevelRange,
}
