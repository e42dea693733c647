//! The runner is responsible for reading a CSV batch of operations, applying
//! them to the ledger in file order, and writing one outcome row per input
//! row to a writer.
//!
//! This module provides both a synchronous and an asynchronous runner implementations.
//! Recoverable errors become outcome rows; malformed CSV and storage failures
//! abort the run.
//!
mod async_runner;
mod sync_runner;

pub use async_runner::run as run_async;
pub use sync_runner::run;

use tracing::debug;

use crate::dto::{Operation, OperationType, OutcomeRow};
use crate::stores::{Account, Store};
use crate::{Error, Ledger};

/// Applies a single operation. Delete yields no account.
pub(crate) fn apply<S: Store>(
    ledger: &mut Ledger<S>,
    operation: &Operation,
) -> Result<Option<Account>, Error> {
    let Operation {
        account: number,
        pin,
        name,
        email,
        phone,
        ..
    } = operation;

    match operation.op {
        OperationType::Create => ledger.create_account(name, email, phone, pin).map(Some),
        OperationType::Deposit => ledger.deposit(number, pin, operation.amount()?).map(Some),
        OperationType::Withdraw => ledger.withdraw(number, pin, operation.amount()?).map(Some),
        OperationType::View => ledger.view_account(number, pin).map(Some),
        OperationType::Update => ledger
            .update_account(number, pin, name, email, phone)
            .map(Some),
        OperationType::Delete => ledger.delete_account(number, pin).map(|()| None),
    }
}

/// Turns the result of [`apply`] into an output row, passing fatal errors through.
pub(crate) fn outcome(
    row: usize,
    operation: &Operation,
    result: Result<Option<Account>, Error>,
) -> Result<OutcomeRow, Error> {
    let (account, status, balance) = match result {
        Ok(Some(account)) => (account.account_number.to_string(), "ok", Some(account.balance)),
        Ok(None) => (operation.account.clone(), "ok", None),
        Err(err) if err.is_fatal() => return Err(err),
        Err(err) => {
            debug!(row, error = %err, "operation rejected");
            (operation.account.clone(), err.tag(), None)
        }
    };

    Ok(OutcomeRow {
        row,
        op: operation.op,
        account,
        status,
        balance,
    })
}

#[cfg(test)]
pub(crate) mod fixtures {
    use std::fs;
    use std::path::PathBuf;
    use tempfile::TempDir;

    /// Copies the seed document into a fresh temp dir.
    pub(crate) fn seeded_data_file() -> (TempDir, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.json");
        fs::copy("data/seed.json", &path).unwrap();
        (dir, path)
    }

    /// Expected output for `data/example_ops.csv` against the seed, minus the
    /// first row whose account number is random.
    pub(crate) const EXPECTED_TAIL: &str = "\
2,create,,invalid_pin,
3,create,,invalid_phone,
4,deposit,ABCD1234,ok,100
5,withdraw,ABCD1234,ok,60
6,withdraw,ABCD1234,insufficient_funds,
7,deposit,ABCD1234,auth_failed,
8,deposit,ZZZZ0000,auth_failed,
9,deposit,ABCD1234,negative_amount,
10,withdraw,ABCD1234,missing_field,
11,view,WXYZ0042,ok,12.5
12,update,WXYZ0042,ok,12.5
13,update,WXYZ0042,invalid_phone,
14,delete,WXYZ0042,ok,
15,view,WXYZ0042,auth_failed,
";

    /// Checks the header and the created-account row, returns the rest.
    pub(crate) fn split_output(output: &str) -> &str {
        let (header, rest) = output.split_once('\n').unwrap();
        assert_eq!(header, "row,op,account,status,balance");
        let (first, tail) = rest.split_once('\n').unwrap();
        let fields: Vec<&str> = first.split(',').collect();
        assert_eq!(fields[0], "1");
        assert_eq!(fields[1], "create");
        assert!(crate::stores::AccountNumber::parse(fields[2]).is_some());
        assert_eq!(&fields[3..], ["ok", "0"]);
        tail
    }
}
