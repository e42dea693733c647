//! Single-tenant account ledger: customer accounts gated by account number
//! and 4-digit PIN, with balances persisted to a JSON document after every
//! mutation.

mod dto;
mod engine;
mod error;
mod handle;
mod runner;
pub mod stores;

pub use dto::{Operation, OperationType, OutcomeRow};
pub use engine::Ledger;
pub use error::{Error, StoreError, ValidationError};
pub use handle::LedgerHandle;
pub use runner::{run, run_async};
pub use stores::{Account, AccountNumber, JsonFileStore, MemoryStore, Pin, Store};
