//! Storage layer for the ledger. Provides:
//! - Account types and the in-memory collection ([`Accounts`])
//! - The persistence seam ([`Store`]) with a JSON file implementation
//!   ([`JsonFileStore`]) and an in-memory one ([`MemoryStore`])
//!
//! Stores always deal in the full collection: there are no partial writes.

mod accounts;
mod json_file;
mod memory;

pub use accounts::{validate_phone, Account, AccountNumber, Accounts, Pin};
pub use json_file::JsonFileStore;
pub use memory::MemoryStore;

use crate::StoreError;

pub trait Store {
    /// Reads the full collection.
    fn load(&self) -> Result<Vec<Account>, StoreError>;

    /// Replaces the stored collection with `accounts`.
    fn save(&self, accounts: &[Account]) -> Result<(), StoreError>;
}
