//! Hard memory budget for memory-resident column buffers.
//!
//! Every [`ParMemoryBuffer`](crate::ParMemoryBuffer) acquires a guard here for
//! its full capacity before allocating. Dropping the guard returns the bytes.

use std::fmt;
use std::ops::Deref;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use querygen_core::budget::{BudgetGuard, MemoryBudget};

use crate::error::{Error, Result};

struct Ledger {
    capacity: usize,
    used: AtomicUsize,
}

impl Ledger {
    fn try_take(&self, bytes: usize) -> bool {
        let mut cur = self.used.load(Ordering::Relaxed);
        loop {
            let next = cur.saturating_add(bytes);
            if next > self.capacity {
                return false;
            }
            match self
                .used
                .compare_exchange_weak(cur, next, Ordering::AcqRel, Ordering::Relaxed)
            {
                Ok(_) => return true,
                Err(actual) => cur = actual,
            }
        }
    }

    fn give_back(&self, bytes: usize) {
        self.used.fetch_sub(bytes, Ordering::AcqRel);
    }
}

/// Shared byte budget. Cloning shares the same ledger.
#[derive(Clone)]
pub struct MemoryBudgetImpl {
    ledger: Arc<Ledger>,
}

impl MemoryBudgetImpl {
    pub fn new(capacity_bytes: usize) -> Self {
        Self {
            ledger: Arc::new(Ledger {
                capacity: capacity_bytes,
                used: AtomicUsize::new(0),
            }),
        }
    }

    pub fn remaining_bytes(&self) -> usize {
        self.ledger
            .capacity
            .saturating_sub(self.ledger.used.load(Ordering::Relaxed))
    }
}

impl fmt::Debug for MemoryBudgetImpl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryBudgetImpl")
            .field("capacity", &self.ledger.capacity)
            .field("used", &self.ledger.used.load(Ordering::Relaxed))
            .finish()
    }
}

impl MemoryBudget for MemoryBudgetImpl {
    type Guard = BudgetGuardImpl;

    fn try_acquire(&self, bytes: usize, tag: &'static str) -> Option<Self::Guard> {
        if bytes > 0 && !self.ledger.try_take(bytes) {
            tracing::debug!(tag, bytes, used = self.used_bytes(), "memory budget refused");
            return None;
        }
        Some(BudgetGuardImpl {
            ledger: Arc::clone(&self.ledger),
            bytes,
            tag,
        })
    }

    fn capacity_bytes(&self) -> usize {
        self.ledger.capacity
    }

    fn used_bytes(&self) -> usize {
        self.ledger.used.load(Ordering::Relaxed)
    }
}

/// RAII accounting for a number of bytes.
pub struct BudgetGuardImpl {
    ledger: Arc<Ledger>,
    bytes: usize,
    tag: &'static str,
}

impl BudgetGuardImpl {
    /// Resize the accounted amount. Shrinking always succeeds; growing fails
    /// (leaving the guard unchanged) when the budget has no room.
    pub fn try_resize(&mut self, new_bytes: usize) -> bool {
        if new_bytes <= self.bytes {
            self.ledger.give_back(self.bytes - new_bytes);
            self.bytes = new_bytes;
            return true;
        }
        if self.ledger.try_take(new_bytes - self.bytes) {
            self.bytes = new_bytes;
            true
        } else {
            false
        }
    }
}

impl BudgetGuard for BudgetGuardImpl {
    fn bytes(&self) -> usize {
        self.bytes
    }
    fn tag(&self) -> &'static str {
        self.tag
    }
}

impl Drop for BudgetGuardImpl {
    fn drop(&mut self) {
        if self.bytes > 0 {
            self.ledger.give_back(self.bytes);
            self.bytes = 0;
        }
    }
}

/// Byte buffer whose capacity is accounted against a [`MemoryBudgetImpl`].
///
/// Writes never exceed the accounted capacity; growth goes through
/// [`OwnedBuf::try_grow`] so the budget is charged first.
pub struct OwnedBuf {
    guard: BudgetGuardImpl,
    buf: Vec<u8>,
}

impl OwnedBuf {
    pub fn with_capacity(
        budget: &MemoryBudgetImpl,
        cap: usize,
        tag: &'static str,
    ) -> Result<Self> {
        let guard = budget
            .try_acquire(cap, tag)
            .ok_or_else(|| Error::BudgetExceeded {
                tag,
                requested: cap,
                capacity: budget.capacity_bytes(),
                used: budget.used_bytes(),
            })?;
        Ok(Self {
            guard,
            buf: Vec::with_capacity(cap),
        })
    }

    /// Accounted capacity in bytes.
    pub fn accounted_bytes(&self) -> usize {
        self.guard.bytes()
    }

    /// Append `bytes` if they fit in the accounted capacity.
    pub fn try_extend(&mut self, bytes: &[u8]) -> bool {
        if self.buf.len() + bytes.len() > self.guard.bytes() {
            return false;
        }
        self.buf.extend_from_slice(bytes);
        true
    }

    /// Grow the accounted capacity to `new_cap` bytes, charging the budget.
    pub fn try_grow(&mut self, new_cap: usize) -> Result<()> {
        if new_cap <= self.guard.bytes() {
            return Ok(());
        }
        let used_before = self.guard.bytes();
        if !self.guard.try_resize(new_cap) {
            return Err(Error::BudgetExceeded {
                tag: self.guard.tag(),
                requested: new_cap - used_before,
                capacity: self.guard.ledger.capacity,
                used: self.guard.ledger.used.load(Ordering::Relaxed),
            });
        }
        self.buf.reserve_exact(new_cap - self.buf.len());
        Ok(())
    }
}

impl Deref for OwnedBuf {
    type Target = [u8];
    fn deref(&self) -> &Self::Target {
        &self.buf
    }
}

impl fmt::Debug for OwnedBuf {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OwnedBuf")
            .field("len", &self.buf.len())
            .field("accounted", &self.guard.bytes())
            .field("tag", &self.guard.tag())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn guards_return_bytes_on_drop() {
        let budget = MemoryBudgetImpl::new(100);
        let a = budget.try_acquire(60, "a").unwrap();
        assert!(budget.fits(40));
        assert!(!budget.fits(41));
        assert!(budget.try_acquire(50, "b").is_none());
        drop(a);
        assert_eq!(budget.used_bytes(), 0);
        assert!(budget.try_acquire(50, "b").is_some());
    }

    #[test]
    fn owned_buf_refuses_writes_past_accounted_capacity() {
        let budget = MemoryBudgetImpl::new(64);
        let mut buf = OwnedBuf::with_capacity(&budget, 8, "t").unwrap();
        assert!(buf.try_extend(&[1; 8]));
        assert!(!buf.try_extend(&[2]));
        buf.try_grow(16).unwrap();
        assert!(buf.try_extend(&[2]));
        assert_eq!(budget.used_bytes(), 16);
        assert!(matches!(buf.try_grow(128), Err(Error::BudgetExceeded { .. })));
        assert_eq!(buf.accounted_bytes(), 16);
    }
}
