//! Dense string-to-id symbol tables.
//!
//! Row labels and column labels live in separate id spaces. [`RowId`] and
//! [`ColumnId`] are distinct types so an id from one space cannot be resolved
//! through the other space's [`Dictionary`].

use std::collections::HashMap;
use std::fmt;

use crate::error::{CoocError, Result};

/// Ids are written to the scratch file as signed 32-bit integers.
pub const MAX_SYMBOLS: u64 = i32::MAX as u64;

/// A dense id in one symbol space.
pub trait SymbolId: Copy + Eq + Ord + std::hash::Hash + fmt::Debug {
    /// Human-readable name of the id space, used in error messages.
    const SPACE: &'static str;

    fn from_index(index: u32) -> Self;

    fn index(self) -> u32;
}

/// Id of a row label (document, user, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RowId(pub u32);

/// Id of a column label (term, item, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ColumnId(pub u32);

impl SymbolId for RowId {
    const SPACE: &'static str = "row";

    fn from_index(index: u32) -> Self {
        RowId(index)
    }

    fn index(self) -> u32 {
        self.0
    }
}

impl SymbolId for ColumnId {
    const SPACE: &'static str = "column";

    fn from_index(index: u32) -> Self {
        ColumnId(index)
    }

    fn index(self) -> u32 {
        self.0
    }
}

/// Bidirectional mapping between tokens and ids assigned in first-seen order.
///
/// Ids are always `0..len()` and never change once assigned. There is no
/// removal.
#[derive(Debug, Clone)]
pub struct Dictionary<I> {
    ids: HashMap<String, I>,
    tokens: Vec<String>,
}

impl<I: SymbolId> Default for Dictionary<I> {
    fn default() -> Self {
        Self::new()
    }
}

impl<I: SymbolId> Dictionary<I> {
    pub fn new() -> Self {
        Dictionary {
            ids: HashMap::new(),
            tokens: Vec::new(),
        }
    }

    /// Returns the id of `token`, allocating the next one if it is new.
    pub fn intern(&mut self, token: &str) -> Result<I> {
        if let Some(&id) = self.ids.get(token) {
            return Ok(id);
        }
        let next = self.tokens.len() as u64;
        if next >= MAX_SYMBOLS {
            return Err(CoocError::Capacity {
                space: I::SPACE,
                limit: MAX_SYMBOLS,
            });
        }
        let id = I::from_index(next as u32);
        self.ids.insert(token.to_owned(), id);
        self.tokens.push(token.to_owned());
        Ok(id)
    }

    /// Looks a token up without interning it.
    pub fn get(&self, token: &str) -> Option<I> {
        self.ids.get(token).copied()
    }

    pub fn resolve(&self, id: I) -> Result<&str> {
        self.tokens
            .get(id.index() as usize)
            .map(String::as_str)
            .ok_or(CoocError::InvalidId {
                space: I::SPACE,
                id: id.index(),
                size: self.tokens.len(),
            })
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Tokens in id order.
    pub fn tokens(&self) -> impl Iterator<Item = (I, &str)> + '_ {
        self.tokens
            .iter()
            .enumerate()
            .map(|(i, t)| (I::from_index(i as u32), t.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_are_dense_and_stable() {
        let mut dict: Dictionary<ColumnId> = Dictionary::new();
        let words = ["alpha", "beta", "alpha", "gamma", "beta", "delta"];
        let ids: Vec<u32> = words
            .iter()
            .map(|w| dict.intern(w).unwrap().index())
            .collect();
        assert_eq!(ids, vec![0, 1, 0, 2, 1, 3]);
        assert_eq!(dict.len(), 4);
        for w in words {
            let id = dict.get(w).unwrap();
            assert_eq!(dict.resolve(id).unwrap(), w);
        }
    }

    #[test]
    fn test_resolve_out_of_range() {
        let mut dict: Dictionary<RowId> = Dictionary::new();
        dict.intern("only").unwrap();
        match dict.resolve(RowId(1)) {
            Err(CoocError::InvalidId { space, id, size }) => {
                assert_eq!(space, "row");
                assert_eq!(id, 1);
                assert_eq!(size, 1);
            }
            other => panic!("expected InvalidId, got {:?}", other),
        }
    }

    #[test]
    fn test_spaces_are_independent() {
        let mut rows: Dictionary<RowId> = Dictionary::new();
        let mut cols: Dictionary<ColumnId> = Dictionary::new();
        rows.intern("a").unwrap();
        rows.intern("shared").unwrap();
        let c = cols.intern("shared").unwrap();
        assert_eq!(c, ColumnId(0));
        assert_eq!(rows.get("shared"), Some(RowId(1)));
        assert!(cols.get("a").is_none());
    }

    #[test]
    fn test_tokens_in_id_order() {
        let mut dict: Dictionary<ColumnId> = Dictionary::new();
        for w in ["z", "y", "x"] {
            dict.intern(w).unwrap();
        }
        let listed: Vec<_> = dict.tokens().map(|(id, t)| (id.0, t.to_string())).collect();
        assert_eq!(
            listed,
            vec![(0, "z".to_string()), (1, "y".to_string()), (2, "x".to_string())]
        );
    }
}
