//! Memory-cap interfaces.
//!
//! `querygen-buffer` holds the only implementation. The traits sit in core so
//! configuration and host code can name a budget without the buffer crate.

/// Bytes charged against a budget. Dropping the guard returns them.
pub trait BudgetGuard: Send {
    /// Bytes currently held.
    fn bytes(&self) -> usize;

    /// Label carried into refusal events.
    fn tag(&self) -> &'static str;
}

/// A hard cap on memory-resident column bytes.
///
/// Memory buffers charge their whole capacity before allocating; a refused
/// charge surfaces as a `BudgetExceeded` error on the load path. Memory-mapped
/// columns are file-backed and never charged.
pub trait MemoryBudget: Send + Sync + 'static {
    type Guard: BudgetGuard;

    /// Charge `bytes`, or `None` if that would pass the cap.
    fn try_acquire(&self, bytes: usize, tag: &'static str) -> Option<Self::Guard>;

    fn capacity_bytes(&self) -> usize;

    /// Bytes held by live guards. Advisory while other threads are charging.
    fn used_bytes(&self) -> usize;

    /// Whether `bytes` more would fit at this moment.
    fn fits(&self, bytes: usize) -> bool {
        self.used_bytes().saturating_add(bytes) <= self.capacity_bytes()
    }
}
