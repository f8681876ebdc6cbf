use std::collections::HashMap;
use std::fmt;
use std::marker::PhantomData;

use querygen_buffer::{typed_values, Partition};
use querygen_encoding::{HashStrategy, StrategyBuildHasher};

use super::{merge_maps, scan_partitions, GroupTable, KeyType};
use crate::application::QueryKernel;
use crate::context::ExecContext;
use crate::error::Result;

/// Rows per distinct value of `key_column`.
pub struct GroupCount<K, S> {
    key_column: String,
    _types: PhantomData<fn() -> (K, S)>,
}

impl<K: KeyType, S: HashStrategy> GroupCount<K, S> {
    pub fn new(key_column: impl Into<String>) -> Self {
        Self {
            key_column: key_column.into(),
            _types: PhantomData,
        }
    }
}

impl<K, S> Clone for GroupCount<K, S> {
    fn clone(&self) -> Self {
        Self {
            key_column: self.key_column.clone(),
            _types: PhantomData,
        }
    }
}

impl<K, S> fmt::Debug for GroupCount<K, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GroupCount")
            .field("key_column", &self.key_column)
            .finish()
    }
}

impl<K: KeyType, S: HashStrategy> QueryKernel for GroupCount<K, S> {
    type Output = GroupTable<K, u64>;

    fn execute(&self, ctx: &ExecContext) -> Result<Self::Output> {
        let partials = scan_partitions(ctx, |p: &Partition| {
            let mut counts: HashMap<K, u64, StrategyBuildHasher<S>> = HashMap::default();
            for k in typed_values::<K>(p.column(&self.key_column)?)? {
                *counts.entry(k).or_insert(0) += 1;
            }
            Ok(counts)
        })?;
        let merged = merge_maps(partials, |acc, n| *acc += n);
        tracing::trace!(column = %self.key_column, groups = merged.len(), "group count merged");
        Ok(GroupTable::from_map(merged))
    }
}
