//! File-backed store holding the whole collection as one JSON document.
//!
//! Every save rewrites the document through a sibling temp file which is
//! synced and then renamed over the target, so readers never see a
//! truncated file.

use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use std::collections::HashSet;
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use super::{Account, Store};
use crate::StoreError;

#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|name| name.to_os_string())
            .unwrap_or_else(|| "accounts.json".into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    fn write_document(&self, tmp: &Path, accounts: &[Account]) -> Result<(), StoreError> {
        let file = File::create(tmp).map_err(|e| StoreError::io(tmp, e))?;
        {
            let mut writer = BufWriter::new(&file);
            let mut serializer =
                serde_json::Serializer::with_formatter(&mut writer, PrettyFormatter::with_indent(b"    "));
            accounts.serialize(&mut serializer)?;
            writer
                .write_all(b"\n")
                .and_then(|_| writer.flush())
                .map_err(|e| StoreError::io(tmp, e))?;
        }
        file.sync_all().map_err(|e| StoreError::io(tmp, e))
    }
}

/// Checks the invariants serde cannot express on a single record.
fn check_loaded(accounts: &[Account]) -> Result<(), String> {
    let mut seen = HashSet::with_capacity(accounts.len());
    for account in accounts {
        if account.balance.is_sign_negative() && !account.balance.is_zero() {
            return Err(format!("account {} has a negative balance", account.account_number));
        }
        if !seen.insert(account.account_number.as_str()) {
            return Err(format!("account {} appears more than once", account.account_number));
        }
    }
    Ok(())
}

impl Store for JsonFileStore {
    fn load(&self) -> Result<Vec<Account>, StoreError> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                info!(path = %self.path.display(), "backing store missing, initializing empty collection");
                self.save(&[])?;
                return Ok(Vec::new());
            }
            Err(e) => return Err(StoreError::io(&self.path, e)),
        };

        let accounts: Vec<Account> =
            serde_json::from_slice(&bytes).map_err(|e| StoreError::corrupt(&self.path, e))?;
        check_loaded(&accounts).map_err(|reason| StoreError::corrupt(&self.path, reason))?;

        info!(path = %self.path.display(), count = accounts.len(), "loaded accounts");
        Ok(accounts)
    }

    fn save(&self, accounts: &[Account]) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| StoreError::io(parent, e))?;
        }

        let tmp = self.temp_path();
        if let Err(e) = self.write_document(&tmp, accounts) {
            let _ = fs::remove_file(&tmp);
            return Err(e);
        }
        fs::rename(&tmp, &self.path).map_err(|e| {
            let _ = fs::remove_file(&tmp);
            StoreError::io(&self.path, e)
        })?;

        debug!(path = %self.path.display(), count = accounts.len(), "saved accounts");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stores::{AccountNumber, Pin};
    use rust_decimal_macros::dec;
    use tempfile::tempdir;

    fn account(number: &str, pin: &str, balance: rust_decimal::Decimal) -> Account {
        Account {
            name: "Alice".to_string(),
            email: "a@x.com".to_string(),
            phone: "9876543210".to_string(),
            pin: Pin::parse(pin).unwrap(),
            account_number: AccountNumber::parse(number).unwrap(),
            balance,
        }
    }

    #[test]
    fn test_load_missing_file_creates_empty_document() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("data.json");
        let store = JsonFileStore::new(&path);

        assert!(store.load().unwrap().is_empty());
        assert_eq!(fs::read_to_string(&path).unwrap().trim(), "[]");
    }

    #[test]
    fn test_save_then_load_round_trip() {
        let dir = tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("data.json"));
        let accounts = vec![
            account("ABCD1234", "1234", dec!(60)),
            account("WXYZ0042", "0042", dec!(10.25)),
        ];

        store.save(&accounts).unwrap();
        let loaded = store.load().unwrap();
        assert_eq!(loaded, accounts);

        store.save(&loaded).unwrap();
        assert_eq!(store.load().unwrap(), accounts);
    }

    #[test]
    fn test_save_replaces_previous_contents() {
        let dir = tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("data.json"));

        store.save(&[account("ABCD1234", "1234", dec!(1))]).unwrap();
        store.save(&[]).unwrap();

        assert!(store.load().unwrap().is_empty());
        assert!(!store.temp_path().exists());
    }

    #[test]
    fn test_loads_document_with_numeric_balances() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("data.json");
        fs::write(
            &path,
            r#"[
    {
        "name": "Alice",
        "email": "a@x.com",
        "phone No.": "9876543210",
        "pin": 1234,
        "Account No.": "ABCD1234",
        "balance": 60
    },
    {
        "name": "Bob",
        "email": "b@x.com",
        "phone No.": "9123456780",
        "pin": 7,
        "Account No.": "QRST0007",
        "balance": 12.5
    }
]"#,
        )
        .unwrap();

        let loaded = JsonFileStore::new(&path).load().unwrap();
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded[0].balance, dec!(60));
        assert_eq!(loaded[1].balance, dec!(12.5));
        assert!(loaded[1].pin.matches("0007"));
    }

    #[test]
    fn test_malformed_document_is_corrupt() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("data.json");
        fs::write(&path, "[{\"name\": ").unwrap();

        let result = JsonFileStore::new(&path).load();
        assert!(matches!(result, Err(StoreError::Corrupt { .. })));
        // The damaged file is left for manual inspection.
        assert_eq!(fs::read_to_string(&path).unwrap(), "[{\"name\": ");
    }

    #[test]
    fn test_negative_balance_is_corrupt() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("data.json");
        let store = JsonFileStore::new(&path);
        store.save(&[account("ABCD1234", "1234", dec!(-1))]).unwrap();

        assert!(matches!(store.load(), Err(StoreError::Corrupt { .. })));
    }

    #[test]
    fn test_duplicate_account_numbers_are_corrupt() {
        let dir = tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("data.json"));
        store
            .save(&[account("ABCD1234", "1234", dec!(0)), account("ABCD1234", "4321", dec!(0))])
            .unwrap();

        assert!(matches!(store.load(), Err(StoreError::Corrupt { .. })));
    }

    #[test]
    fn test_document_uses_four_space_indent() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("data.json");
        JsonFileStore::new(&path)
            .save(&[account("ABCD1234", "1234", dec!(0))])
            .unwrap();

        let text = fs::read_to_string(&path).unwrap();
        assert!(text.contains("\n    {\n        \"name\": \"Alice\""));
    }
}
