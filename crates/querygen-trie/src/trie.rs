//! Arena-backed byte trie with parent links.
//!
//! Layout:
//! - `nodes[0]` is the root (empty string). Every other node records its
//!   parent, the edge byte leading to it, and its depth.
//! - Children are kept sorted by edge byte, so enumeration is lexicographic by
//!   UTF-8 bytes and lookups binary-search.
//! - `terminals[k]` is the node whose path spells the string with key `k`.
//!   Keys are dense and issued in insertion order; they carry no ordering
//!   meaning.

use querygen_core::id::SurrogateKey;

use crate::error::{Error, Result};
use crate::iter::PrefixIter;

pub(crate) type NodeId = u32;

pub(crate) const ROOT: NodeId = 0;

#[derive(Debug, Clone)]
pub(crate) struct Node {
    pub(crate) parent: NodeId,
    pub(crate) byte: u8,
    pub(crate) depth: u32,
    pub(crate) children: Vec<(u8, NodeId)>,
    pub(crate) key: Option<SurrogateKey>,
}

impl Node {
    fn root() -> Self {
        Self {
            parent: ROOT,
            byte: 0,
            depth: 0,
            children: Vec::new(),
            key: None,
        }
    }

    fn child(&self, byte: u8) -> Option<NodeId> {
        self.children
            .binary_search_by_key(&byte, |&(b, _)| b)
            .ok()
            .map(|i| self.children[i].1)
    }
}

#[derive(Debug, Clone)]
pub struct Trie {
    pub(crate) nodes: Vec<Node>,
    terminals: Vec<NodeId>,
    sealed: bool,
}

impl Default for Trie {
    fn default() -> Self {
        Self::new()
    }
}

impl Trie {
    pub fn new() -> Self {
        Self {
            nodes: vec![Node::root()],
            terminals: Vec::new(),
            sealed: false,
        }
    }

    /// Build and seal a dictionary from `values`, interning in iteration order.
    pub fn from_strings<'a, I>(values: I) -> Result<Self>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut trie = Self::new();
        for v in values {
            trie.insert_path(v)?;
        }
        trie.seal();
        Ok(trie)
    }

    /// Return the key for `value`, issuing the next key if it is new.
    pub fn intern(&mut self, value: &str) -> Result<SurrogateKey> {
        if self.sealed {
            return Err(Error::Sealed(value.to_string()));
        }
        self.insert_path(value)
    }

    fn insert_path(&mut self, value: &str) -> Result<SurrogateKey> {
        let mut cur = ROOT;
        for &b in value.as_bytes() {
            cur = match self.nodes[cur as usize].child(b) {
                Some(next) => next,
                None => self.push_child(cur, b)?,
            };
        }

        if let Some(key) = self.nodes[cur as usize].key {
            return Ok(key);
        }
        let key = SurrogateKey::new(self.terminals.len() as u64);
        self.nodes[cur as usize].key = Some(key);
        self.terminals.push(cur);
        Ok(key)
    }

    fn push_child(&mut self, parent: NodeId, byte: u8) -> Result<NodeId> {
        let id = next_node_id(self.nodes.len())?;
        let depth = self.nodes[parent as usize].depth + 1;
        self.nodes.push(Node {
            parent,
            byte,
            depth,
            children: Vec::new(),
            key: None,
        });
        let children = &mut self.nodes[parent as usize].children;
        let pos = children.partition_point(|&(b, _)| b < byte);
        children.insert(pos, (byte, id));
        Ok(id)
    }

    pub(crate) fn find_node(&self, bytes: &[u8]) -> Option<NodeId> {
        let mut cur = ROOT;
        for &b in bytes {
            cur = self.nodes[cur as usize].child(b)?;
        }
        Some(cur)
    }

    /// Key for `value` if it was interned; never inserts.
    pub fn get(&self, value: &str) -> Option<SurrogateKey> {
        self.find_node(value.as_bytes())
            .and_then(|n| self.nodes[n as usize].key)
    }

    pub fn contains(&self, value: &str) -> bool {
        self.get(value).is_some()
    }

    /// String for `key`, rebuilt by walking from its terminal node to the root.
    pub fn lookup(&self, key: SurrogateKey) -> Result<String> {
        let node = usize::try_from(key.get())
            .ok()
            .and_then(|idx| self.terminals.get(idx))
            .copied()
            .ok_or(Error::UnknownKey(key))?;

        let mut cur = &self.nodes[node as usize];
        let mut bytes = vec![0u8; cur.depth as usize];
        while cur.depth > 0 {
            bytes[cur.depth as usize - 1] = cur.byte;
            cur = &self.nodes[cur.parent as usize];
        }
        // Paths are only ever spelled by whole `&str` values.
        Ok(String::from_utf8(bytes)
            .unwrap_or_else(|e| String::from_utf8_lossy(e.as_bytes()).into_owned()))
    }

    /// Lazily enumerate every `(string, key)` whose string starts with `prefix`,
    /// in lexicographic byte order.
    pub fn prefix_search<'a>(&'a self, prefix: &str) -> PrefixIter<'a> {
        match self.find_node(prefix.as_bytes()) {
            Some(start) => PrefixIter::new(self, start, prefix.as_bytes().to_vec()),
            None => PrefixIter::empty(self),
        }
    }

    /// All entries in lexicographic order.
    pub fn iter(&self) -> PrefixIter<'_> {
        self.prefix_search("")
    }

    /// Mark the dictionary immutable. Idempotent.
    pub fn seal(&mut self) {
        if !self.sealed {
            self.sealed = true;
            tracing::debug!(
                entries = self.terminals.len(),
                nodes = self.nodes.len(),
                "sealed dictionary"
            );
        }
    }

    pub fn is_sealed(&self) -> bool {
        self.sealed
    }

    /// Number of distinct strings (and keys) issued.
    pub fn len(&self) -> usize {
        self.terminals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terminals.is_empty()
    }

    /// Nodes in the arena, root included.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }
}

/// Id of the node appended to an arena currently holding `len` nodes.
fn next_node_id(len: usize) -> Result<NodeId> {
    NodeId::try_from(len).map_err(|_| Error::NodeLimit { nodes: len })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn intern_is_stable_and_dense() {
        let mut t = Trie::new();
        let a = t.intern("apple").unwrap();
        let b = t.intern("app").unwrap();
        let a2 = t.intern("apple").unwrap();
        assert_eq!(a, a2);
        assert_eq!(a.get(), 0);
        assert_eq!(b.get(), 1);
        assert_eq!(t.len(), 2);
        // "app" shares the path of "apple"
        assert_eq!(t.node_count(), 1 + "apple".len());
    }

    #[test]
    fn lookup_inverts_intern() {
        let mut t = Trie::new();
        let words = ["", "a", "ab", "abc", "b", "zürich", "日本"];
        let keys: Vec<_> = words.iter().map(|w| t.intern(w).unwrap()).collect();
        for (w, k) in words.iter().zip(&keys) {
            assert_eq!(t.lookup(*k).unwrap(), *w);
        }
    }

    #[test]
    fn unknown_key_is_an_error() {
        let mut t = Trie::new();
        t.intern("x").unwrap();
        assert_eq!(
            t.lookup(SurrogateKey::new(1)),
            Err(Error::UnknownKey(SurrogateKey::new(1)))
        );
    }

    #[test]
    fn sealed_rejects_intern_but_serves_reads() {
        let mut t = Trie::new();
        let k = t.intern("east").unwrap();
        t.seal();
        t.seal();
        assert!(t.is_sealed());
        assert!(matches!(t.intern("west"), Err(Error::Sealed(_))));
        assert!(matches!(t.intern("east"), Err(Error::Sealed(_))));
        assert_eq!(t.get("east"), Some(k));
        assert_eq!(t.get("west"), None);
        assert_eq!(t.get("eas"), None);
    }

    #[test]
    fn key_order_follows_insertion_not_lexicographic() {
        let t = Trie::from_strings(["pear", "apple"]).unwrap();
        assert!(t.get("pear").unwrap() < t.get("apple").unwrap());
    }

    #[test]
    fn node_ids_stop_at_the_id_width() {
        assert_eq!(next_node_id(7), Ok(7));
        let full = NodeId::MAX as usize + 1;
        assert_eq!(next_node_id(full), Err(Error::NodeLimit { nodes: full }));
    }
}
