use std::collections::HashMap;
use std::fmt;
use std::marker::PhantomData;

use querygen_buffer::{typed_values, Partition};
use querygen_encoding::{HashStrategy, StrategyBuildHasher};

use super::{merge_maps, scan_partitions, GroupTable, KeyType, SumValue};
use crate::application::QueryKernel;
use crate::context::ExecContext;
use crate::error::Result;

/// Sum of `value_column` per distinct value of `key_column`.
pub struct GroupSum<K, V, S> {
    key_column: String,
    value_column: String,
    _types: PhantomData<fn() -> (K, V, S)>,
}

impl<K: KeyType, V: SumValue, S: HashStrategy> GroupSum<K, V, S> {
    pub fn new(key_column: impl Into<String>, value_column: impl Into<String>) -> Self {
        Self {
            key_column: key_column.into(),
            value_column: value_column.into(),
            _types: PhantomData,
        }
    }
}

impl<K, V, S> Clone for GroupSum<K, V, S> {
    fn clone(&self) -> Self {
        Self {
            key_column: self.key_column.clone(),
            value_column: self.value_column.clone(),
            _types: PhantomData,
        }
    }
}

impl<K, V, S> fmt::Debug for GroupSum<K, V, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GroupSum")
            .field("key_column", &self.key_column)
            .field("value_column", &self.value_column)
            .finish()
    }
}

impl<K: KeyType, V: SumValue, S: HashStrategy> QueryKernel for GroupSum<K, V, S> {
    type Output = GroupTable<K, V::Acc>;

    fn execute(&self, ctx: &ExecContext) -> Result<Self::Output> {
        let partials = scan_partitions(ctx, |p: &Partition| {
            let keys = typed_values::<K>(p.column(&self.key_column)?)?;
            let values = typed_values::<V>(p.column(&self.value_column)?)?;
            let mut sums: HashMap<K, V::Acc, StrategyBuildHasher<S>> = HashMap::default();
            for (k, v) in keys.zip(values) {
                V::accumulate(sums.entry(k).or_default(), v);
            }
            Ok(sums)
        })?;
        let merged = merge_maps(partials, |acc, other| V::merge(acc, other));
        tracing::trace!(
            key = %self.key_column,
            value = %self.value_column,
            groups = merged.len(),
            "group sum merged"
        );
        Ok(GroupTable::from_map(merged))
    }
}
