use std::collections::{HashMap, HashSet};
use std::fmt;
use std::marker::PhantomData;

use querygen_buffer::{typed_values, Partition};
use querygen_encoding::{HashStrategy, StrategyBuildHasher};

use super::{merge_maps, scan_partitions, GroupTable, KeyType};
use crate::application::QueryKernel;
use crate::context::ExecContext;
use crate::error::Result;

/// Rows per distinct string key that starts with `prefix`.
///
/// The prefix is resolved against the column's dictionary first, so the scan
/// only probes a set of surrogate keys.
pub struct PrefixCount<K, S> {
    key_column: String,
    prefix: String,
    _types: PhantomData<fn() -> (K, S)>,
}

impl<K: KeyType, S: HashStrategy> PrefixCount<K, S> {
    pub fn new(key_column: impl Into<String>, prefix: impl Into<String>) -> Self {
        Self {
            key_column: key_column.into(),
            prefix: prefix.into(),
            _types: PhantomData,
        }
    }
}

impl<K, S> Clone for PrefixCount<K, S> {
    fn clone(&self) -> Self {
        Self {
            key_column: self.key_column.clone(),
            prefix: self.prefix.clone(),
            _types: PhantomData,
        }
    }
}

impl<K, S> fmt::Debug for PrefixCount<K, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PrefixCount")
            .field("key_column", &self.key_column)
            .field("prefix", &self.prefix)
            .finish()
    }
}

impl<K: KeyType, S: HashStrategy> QueryKernel for PrefixCount<K, S> {
    type Output = GroupTable<K, u64>;

    fn execute(&self, ctx: &ExecContext) -> Result<Self::Output> {
        let dict = ctx.dictionaries().require(&self.key_column)?;
        let wanted: HashSet<K, StrategyBuildHasher<S>> = dict
            .prefix_search(&self.prefix)
            .filter_map(|(_, key)| K::from_surrogate(key))
            .collect();
        tracing::trace!(prefix = %self.prefix, keys = wanted.len(), "prefix resolved");
        if wanted.is_empty() {
            // Still reject a key column that is absent or of another type.
            for p in ctx.store().partitions() {
                typed_values::<K>(p.column(&self.key_column)?)?;
            }
            return Ok(GroupTable::empty());
        }

        let partials = scan_partitions(ctx, |p: &Partition| {
            let mut counts: HashMap<K, u64, StrategyBuildHasher<S>> = HashMap::default();
            for k in typed_values::<K>(p.column(&self.key_column)?)? {
                if wanted.contains(&k) {
                    *counts.entry(k).or_insert(0) += 1;
                }
            }
            Ok(counts)
        })?;
        Ok(GroupTable::from_map(merge_maps(partials, |acc, n| *acc += n)))
    }
}
