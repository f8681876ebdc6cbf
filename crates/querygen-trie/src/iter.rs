//! Lazy prefix enumeration.

use std::iter::FusedIterator;

use querygen_core::id::SurrogateKey;

use crate::trie::{NodeId, Trie};

/// Pre-order walk below one trie node.
///
/// Children are pushed in reverse byte order so the smallest edge is visited
/// first; a node's own entry is yielded before its descendants. Together this
/// gives lexicographic order by UTF-8 bytes.
pub struct PrefixIter<'a> {
    trie: &'a Trie,
    stack: Vec<NodeId>,
    start_depth: u32,
    path: Vec<u8>,
}

impl<'a> PrefixIter<'a> {
    pub(crate) fn new(trie: &'a Trie, start: NodeId, prefix: Vec<u8>) -> Self {
        Self {
            trie,
            stack: vec![start],
            start_depth: trie.nodes[start as usize].depth,
            path: prefix,
        }
    }

    pub(crate) fn empty(trie: &'a Trie) -> Self {
        Self {
            trie,
            stack: Vec::new(),
            start_depth: 0,
            path: Vec::new(),
        }
    }
}

impl<'a> Iterator for PrefixIter<'a> {
    type Item = (String, SurrogateKey);

    fn next(&mut self) -> Option<Self::Item> {
        let trie = self.trie;
        while let Some(id) = self.stack.pop() {
            let node = &trie.nodes[id as usize];
            if node.depth > self.start_depth {
                self.path.truncate(node.depth as usize - 1);
                self.path.push(node.byte);
            }
            self.stack
                .extend(node.children.iter().rev().map(|&(_, child)| child));

            if let Some(key) = node.key {
                let s = String::from_utf8_lossy(&self.path).into_owned();
                return Some((s, key));
            }
        }
        None
    }
}

impl FusedIterator for PrefixIter<'_> {}

#[cfg(test)]
mod tests {
    use crate::Trie;

    #[test]
    fn prefix_search_is_lexicographic() {
        let t = Trie::from_strings(["cart", "car", "cat", "dog", "ca", "c"]).unwrap();
        let got: Vec<String> = t.prefix_search("ca").map(|(s, _)| s).collect();
        assert_eq!(got, vec!["ca", "car", "cart", "cat"]);
    }

    #[test]
    fn prefix_search_returns_matching_keys() {
        let t = Trie::from_strings(["b", "a", "ab"]).unwrap();
        for (s, k) in t.prefix_search("a") {
            assert_eq!(t.lookup(k).unwrap(), s);
        }
        assert_eq!(t.prefix_search("a").count(), 2);
    }

    #[test]
    fn missing_prefix_yields_nothing() {
        let t = Trie::from_strings(["alpha"]).unwrap();
        assert_eq!(t.prefix_search("b").count(), 0);
        assert_eq!(t.prefix_search("alphabet").count(), 0);
    }

    #[test]
    fn full_iteration_covers_every_entry() {
        let t = Trie::from_strings(["z", "", "m", "ma"]).unwrap();
        let all: Vec<String> = t.iter().map(|(s, _)| s).collect();
        assert_eq!(all, vec!["", "m", "ma", "z"]);
    }
}
