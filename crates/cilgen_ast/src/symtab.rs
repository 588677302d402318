//! Symbol handles and the interning table.
//!
//! A [`SymbolId`] is a stable integer handle assigned at interning time.
//! All later matching (multimap keys, rule references) compares handles,
//! never name strings, so two distinct declarations that happen to share a
//! spelling can never merge.

use serde::{Deserialize, Serialize};

/// Stable handle identifying one declared entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SymbolId(u32);

/// Interning table mapping handles to display names.
///
/// Scoped name resolution happens in upstream passes; this table only hands
/// out identities and remembers spellings for rendering.
#[derive(Debug, Clone, Default)]
pub struct SymbolTable {
    names: Vec<String>,
}

impl SymbolTable {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Interns a name, always producing a fresh handle.
    ///
    /// # Panics
    ///
    /// Panics if more than `u32::MAX` symbols are interned.
    pub fn intern(&mut self, name: impl Into<String>) -> SymbolId {
        let id = u32::try_from(self.names.len()).expect("symbol table overflow");
        self.names.push(name.into());
        SymbolId(id)
    }

    /// The display name for a handle.
    pub fn name(&self, id: SymbolId) -> &str {
        &self.names[id.0 as usize]
    }

    /// Number of interned symbols.
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// True if nothing has been interned.
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}
