//! Error types for the ledger.
//!
//! Recoverable failures the caller is expected to show to a user:
//! - Validation errors (malformed PIN, phone or amount, or a deposit that
//!   would overflow the balance)
//! - Authentication errors (unknown account or wrong PIN, deliberately not
//!   distinguished)
//! - Insufficient funds on withdrawal
//!
//! Storage errors ([`StoreError`]) are fatal. A ledger refuses to open on a
//! corrupt backing file rather than start from an empty collection.

use rust_decimal::Decimal;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("PIN must be 4 digits")]
    InvalidPin,
    #[error("phone must be 10 digits")]
    InvalidPhone,
    #[error("amount must not be negative")]
    NegativeAmount,
    #[error("amount would overflow the balance")]
    AmountTooLarge,
    #[error("missing field: {0}")]
    MissingField(&'static str),
}

impl ValidationError {
    pub fn tag(&self) -> &'static str {
        match self {
            ValidationError::InvalidPin => "invalid_pin",
            ValidationError::InvalidPhone => "invalid_phone",
            ValidationError::NegativeAmount => "negative_amount",
            ValidationError::AmountTooLarge => "amount_too_large",
            ValidationError::MissingField(_) => "missing_field",
        }
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("backing store {path} is corrupt: {reason}")]
    Corrupt { path: PathBuf, reason: String },

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to serialize accounts: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl StoreError {
    pub(crate) fn io(path: &Path, source: io::Error) -> Self {
        Self::Io {
            path: path.to_owned(),
            source,
        }
    }

    pub(crate) fn corrupt(path: &Path, reason: impl ToString) -> Self {
        Self::Corrupt {
            path: path.to_owned(),
            reason: reason.to_string(),
        }
    }
}

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("invalid account number or PIN")]
    Auth,

    #[error("insufficient funds: balance {balance}, requested {requested}")]
    InsufficientFunds { balance: Decimal, requested: Decimal },

    #[error("storage failure: {0}")]
    Storage(#[from] StoreError),

    #[error("ledger task is no longer running")]
    Closed,
}

impl Error {
    /// Short machine-readable tag, used in batch output.
    pub fn tag(&self) -> &'static str {
        match self {
            Error::Validation(err) => err.tag(),
            Error::Auth => "auth_failed",
            Error::InsufficientFunds { .. } => "insufficient_funds",
            Error::Storage(_) => "storage_failure",
            Error::Closed => "closed",
        }
    }

    /// Fatal errors abort whatever is driving the ledger; the rest are
    /// reported back to the user.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Error::Storage(_) | Error::Closed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tags() {
        assert_eq!(Error::from(ValidationError::InvalidPin).tag(), "invalid_pin");
        assert_eq!(Error::from(ValidationError::InvalidPhone).tag(), "invalid_phone");
        assert_eq!(Error::from(ValidationError::AmountTooLarge).tag(), "amount_too_large");
        assert_eq!(Error::Auth.tag(), "auth_failed");
        assert_eq!(
            Error::InsufficientFunds {
                balance: Decimal::ZERO,
                requested: Decimal::ONE,
            }
            .tag(),
            "insufficient_funds"
        );
    }

    #[test]
    fn test_only_storage_and_closed_are_fatal() {
        assert!(!Error::Auth.is_fatal());
        assert!(!Error::from(ValidationError::NegativeAmount).is_fatal());
        assert!(Error::Closed.is_fatal());
        let corrupt = StoreError::corrupt(Path::new("data.json"), "expected value");
        assert!(Error::from(corrupt).is_fatal());
    }

    #[test]
    fn test_auth_message_does_not_say_which_part_failed() {
        assert_eq!(Error::Auth.to_string(), "invalid account number or PIN");
    }
}
