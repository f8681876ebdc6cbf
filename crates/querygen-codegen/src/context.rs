use std::sync::Arc;

use querygen_buffer::ColumnStore;
use querygen_encoding::Dictionaries;

use crate::error::{Error, Result};

/// What a unit may read while it runs: sealed columns, sealed dictionaries and
/// a parallelism hint.
#[derive(Debug, Clone)]
pub struct ExecContext {
    store: Arc<ColumnStore>,
    dictionaries: Dictionaries,
    parallelism: usize,
}

impl ExecContext {
    /// Fails unless every partition in `store` is sealed.
    pub fn new(store: Arc<ColumnStore>, dictionaries: Dictionaries) -> Result<Self> {
        if !store.is_sealed() {
            return Err(Error::Exec("column store must be sealed before execution".into()));
        }
        Ok(Self {
            store,
            dictionaries,
            parallelism: 1,
        })
    }

    /// Upper bound on partitions scanned at once (at least 1).
    pub fn with_parallelism(mut self, parallelism: usize) -> Self {
        self.parallelism = parallelism.max(1);
        self
    }

    pub fn store(&self) -> &ColumnStore {
        &self.store
    }

    pub fn dictionaries(&self) -> &Dictionaries {
        &self.dictionaries
    }

    pub fn parallelism(&self) -> usize {
        self.parallelism
    }
}
