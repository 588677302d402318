//! Insertion-ordered, handle-keyed multimap.
//!
//! Folds N scattered relation facts (`user u role r1`, `user u role r2`)
//! into one grouped entry per key. Keys and values are matched by
//! [`SymbolId`] handle equality, never by name string, so distinct
//! declarations with identical spellings stay separate.

use cilgen_ast::SymbolId;

/// One key with its ordered, duplicate-free value list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    /// The key symbol.
    pub key: SymbolId,
    /// Values in first-insertion order.
    pub values: Vec<SymbolId>,
}

/// A many-to-many association table preserving key insertion order.
#[derive(Debug, Clone, Default)]
pub struct Multimap {
    entries: Vec<Entry>,
}

impl Multimap {
    /// Creates an empty multimap.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts `value` under `key`.
    ///
    /// An absent key is appended, so key order equals first-insertion order.
    /// `None` registers the key without any value (used to seed declaration
    /// order before any fact arrives). Inserting an identical (key, value)
    /// pair twice is idempotent.
    pub fn insert(&mut self, key: SymbolId, value: Option<SymbolId>) {
        if let Some(entry) = self.entries.iter_mut().find(|e| e.key == key) {
            if let Some(value) = value {
                if !entry.values.contains(&value) {
                    entry.values.push(value);
                }
            }
            return;
        }
        self.entries.push(Entry {
            key,
            values: value.into_iter().collect(),
        });
    }

    /// Entries in key first-insertion order.
    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    /// Number of distinct keys.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if no key has been inserted.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
