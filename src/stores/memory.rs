use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};

use super::{Account, Store};
use crate::StoreError;

/// Keeps the last saved snapshot in memory. Used by tests and benchmarks.
#[derive(Debug, Default)]
pub struct MemoryStore {
    snapshot: Mutex<Vec<Account>>,
    saves: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_accounts(accounts: Vec<Account>) -> Self {
        Self {
            snapshot: Mutex::new(accounts),
            saves: AtomicUsize::new(0),
        }
    }

    pub fn snapshot(&self) -> Vec<Account> {
        self.snapshot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Number of completed saves.
    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }
}

impl Store for MemoryStore {
    fn load(&self) -> Result<Vec<Account>, StoreError> {
        Ok(self.snapshot())
    }

    fn save(&self, accounts: &[Account]) -> Result<(), StoreError> {
        *self.snapshot.lock().unwrap_or_else(PoisonError::into_inner) = accounts.to_vec();
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
