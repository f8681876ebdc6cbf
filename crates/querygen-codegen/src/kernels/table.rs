use std::collections::HashMap;

/// Aggregate per distinct key, sorted by key.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupTable<K, A> {
    entries: Vec<(K, A)>,
}

impl<K: Ord, A> GroupTable<K, A> {
    pub fn from_map<H>(map: HashMap<K, A, H>) -> Self {
        let mut entries: Vec<(K, A)> = map.into_iter().collect();
        entries.sort_unstable_by(|a, b| a.0.cmp(&b.0));
        Self { entries }
    }

    pub fn get(&self, key: &K) -> Option<&A> {
        self.entries
            .binary_search_by(|(k, _)| k.cmp(key))
            .ok()
            .map(|i| &self.entries[i].1)
    }
}

impl<K, A> GroupTable<K, A> {
    pub fn empty() -> Self {
        Self { entries: Vec::new() }
    }

    pub fn entries(&self) -> &[(K, A)] {
        &self.entries
    }

    pub fn iter(&self) -> impl Iterator<Item = (&K, &A)> {
        self.entries.iter().map(|(k, a)| (k, a))
    }

    pub fn into_entries(self) -> Vec<(K, A)> {
        self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
