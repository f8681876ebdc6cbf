//! Generic query kernels.
//!
//! Generated units are type aliases that fix the generic parameters of one of
//! these kernels: the key type `K`, the value type `V` and the hash strategy
//! `S` used by every hash table the kernel builds.

mod group_count;
mod group_sum;
mod prefix_count;
mod table;

use std::collections::HashMap;
use std::hash::{BuildHasher, Hash};
use std::thread;

use querygen_buffer::Partition;
use querygen_core::id::SurrogateKey;
use querygen_core::types::FixedWidth;

use crate::context::ExecContext;
use crate::error::{Error, Result};

pub use group_count::GroupCount;
pub use group_sum::GroupSum;
pub use prefix_count::PrefixCount;
pub use table::GroupTable;

/// Physical types usable as group keys.
pub trait KeyType: FixedWidth + Eq + Hash + Ord {
    /// The key as stored in a column of this width, if it fits.
    fn from_surrogate(key: SurrogateKey) -> Option<Self>;
}

macro_rules! impl_key_type {
    ($($t:ty),*) => {$(
        impl KeyType for $t {
            #[inline]
            fn from_surrogate(key: SurrogateKey) -> Option<Self> {
                <$t>::try_from(key.get()).ok()
            }
        }
    )*};
}

impl_key_type!(u8, i32, i64, u32, u64);

/// Physical types that can be summed.
pub trait SumValue: FixedWidth {
    type Acc: Copy + Default + PartialEq + std::fmt::Debug + Send + Sync + 'static;

    fn accumulate(acc: &mut Self::Acc, v: Self);

    fn merge(acc: &mut Self::Acc, other: Self::Acc);
}

macro_rules! impl_int_sum {
    ($($t:ty),*) => {$(
        impl SumValue for $t {
            type Acc = i64;
            /// Integer sums wrap on overflow.
            #[inline]
            fn accumulate(acc: &mut i64, v: Self) {
                *acc = acc.wrapping_add(v as i64);
            }
            #[inline]
            fn merge(acc: &mut i64, other: i64) {
                *acc = acc.wrapping_add(other);
            }
        }
    )*};
}

macro_rules! impl_float_sum {
    ($($t:ty),*) => {$(
        impl SumValue for $t {
            type Acc = f64;
            #[inline]
            fn accumulate(acc: &mut f64, v: Self) {
                *acc += v as f64;
            }
            #[inline]
            fn merge(acc: &mut f64, other: f64) {
                *acc += other;
            }
        }
    )*};
}

impl_int_sum!(i32, i64, u32, u64);
impl_float_sum!(f32, f64);

/// Run `scan` over every partition, using up to `ctx.parallelism()` threads.
/// Results come back in partition order.
pub(crate) fn scan_partitions<T, F>(ctx: &ExecContext, scan: F) -> Result<Vec<T>>
where
    T: Send,
    F: Fn(&Partition) -> Result<T> + Sync,
{
    let parts = ctx.store().partitions();
    let workers = ctx.parallelism().min(parts.len()).max(1);
    if workers == 1 {
        return parts.iter().map(&scan).collect();
    }

    let chunk = parts.len().div_ceil(workers);
    let scan = &scan;
    thread::scope(|s| {
        let handles: Vec<_> = parts
            .chunks(chunk)
            .map(|group| s.spawn(move || group.iter().map(scan).collect::<Result<Vec<T>>>()))
            .collect();

        let mut out = Vec::with_capacity(parts.len());
        for h in handles {
            let partial = h
                .join()
                .map_err(|_| Error::Exec("partition scan panicked".into()))??;
            out.extend(partial);
        }
        Ok(out)
    })
}

/// Fold per-partition maps into the first one.
pub(crate) fn merge_maps<K, A, H>(
    partials: Vec<HashMap<K, A, H>>,
    combine: impl Fn(&mut A, A),
) -> HashMap<K, A, H>
where
    K: Eq + Hash,
    H: BuildHasher + Default,
{
    let mut iter = partials.into_iter();
    let mut acc = iter.next().unwrap_or_default();
    for partial in iter {
        for (k, v) in partial {
            match acc.get_mut(&k) {
                Some(slot) => combine(slot, v),
                None => {
                    acc.insert(k, v);
                }
            }
        }
    }
    acc
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::Arc;

    use querygen_buffer::{ColumnStore, MemoryBudgetImpl, ParMemoryBuffer, Partition};
    use querygen_core::id::PartitionId;
    use querygen_core::types::PhysicalValue;
    use querygen_encoding::Dictionaries;

    use crate::context::ExecContext;

    /// One partition per element of `parts`; each partition is a list of
    /// named columns.
    pub fn context(parts: Vec<Vec<(&str, Vec<PhysicalValue>)>>, dicts: Dictionaries) -> ExecContext {
        let budget = MemoryBudgetImpl::new(1 << 20);
        let mut store = ColumnStore::new();
        for (i, cols) in parts.into_iter().enumerate() {
            let mut p = Partition::new(PartitionId::new(i as u64));
            for (name, vals) in cols {
                let ty = vals[0].physical_type();
                let buf = ParMemoryBuffer::from_values(&budget, ty, &vals).unwrap();
                p.add_column(name, Box::new(buf)).unwrap();
            }
            store.push(p);
        }
        store.seal_all().unwrap();
        ExecContext::new(Arc::new(store), dicts).unwrap()
    }

    pub fn u32s(vals: &[u32]) -> Vec<PhysicalValue> {
        vals.iter().copied().map(PhysicalValue::U32).collect()
    }
}
