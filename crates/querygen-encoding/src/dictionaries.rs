//! Named set of sealed dictionaries, one per string column.

use std::collections::BTreeMap;
use std::sync::Arc;

use querygen_trie::Trie;

use crate::error::{Error, Result};

/// Read-only after load; cloned cheaply into every execution context.
#[derive(Debug, Clone, Default)]
pub struct Dictionaries {
    by_column: BTreeMap<String, Arc<Trie>>,
}

impl Dictionaries {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `dict` for `column`, sealing it first.
    pub fn insert(&mut self, column: impl Into<String>, mut dict: Trie) {
        dict.seal();
        self.by_column.insert(column.into(), Arc::new(dict));
    }

    pub fn get(&self, column: &str) -> Option<&Arc<Trie>> {
        self.by_column.get(column)
    }

    /// Dictionary for `column`, or an encoding error naming the column.
    pub fn require(&self, column: &str) -> Result<&Arc<Trie>> {
        self.get(column)
            .ok_or_else(|| Error::Encoding(format!("no dictionary for string column '{column}'")))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Arc<Trie>)> {
        self.by_column.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.by_column.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_column.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inserted_dictionaries_are_sealed() {
        let mut t = Trie::new();
        t.intern("a").unwrap();
        let mut dicts = Dictionaries::new();
        dicts.insert("city", t);
        assert!(dicts.require("city").unwrap().is_sealed());
        assert!(dicts.require("country").is_err());
        assert_eq!(dicts.len(), 1);
    }
}
