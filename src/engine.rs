use rand::rngs::StdRng;
use rand::SeedableRng;
use rust_decimal::Decimal;
use tracing::{info, warn};

use crate::stores::{validate_phone, Account, AccountNumber, Accounts, Pin, Store};
use crate::{Error, StoreError, ValidationError};

/// The ledger: the authoritative in-memory collection of accounts plus the
/// store it is mirrored to.
///
/// Every mutation is applied to a staged copy of the collection, written to
/// the store, and only then committed. A failed save leaves the in-memory
/// state untouched.
pub struct Ledger<S> {
    accounts: Accounts,
    store: S,
    rng: StdRng,
}

impl<S: Store> Ledger<S> {
    /// Loads the collection once from `store`. A corrupt store is fatal.
    pub fn open(store: S) -> Result<Self, StoreError> {
        Self::with_rng(store, StdRng::from_entropy())
    }

    pub fn with_rng(store: S, rng: StdRng) -> Result<Self, StoreError> {
        let accounts = Accounts::from(store.load()?);
        info!(count = accounts.len(), "ledger opened");
        Ok(Self {
            accounts,
            store,
            rng,
        })
    }

    pub fn accounts(&self) -> impl Iterator<Item = &Account> {
        self.accounts.iter()
    }

    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Draws random account numbers until one is not already taken.
    pub fn generate_account_number(&mut self) -> AccountNumber {
        let Self { accounts, rng, .. } = self;
        accounts.unique_number(|| AccountNumber::random(&mut *rng))
    }

    /// Validates the PIN, then the phone, and appends a new account with a
    /// zero balance. The returned account carries the generated number, which
    /// the caller must surface to the user.
    pub fn create_account(
        &mut self,
        name: &str,
        email: &str,
        phone: &str,
        pin: &str,
    ) -> Result<Account, Error> {
        let pin = Pin::parse(pin)?;
        validate_phone(phone)?;

        let account = Account {
            name: name.to_owned(),
            email: email.to_owned(),
            phone: phone.to_owned(),
            pin,
            account_number: self.generate_account_number(),
            balance: Decimal::ZERO,
        };

        let mut staged = self.accounts.clone();
        staged.push(account.clone());
        self.commit(staged)?;

        info!(account = %account.account_number, "account created");
        Ok(account)
    }

    /// Authentication gate for every other operation.
    pub fn find_account(&self, number: &str, pin: &str) -> Option<&Account> {
        self.accounts.find(number, pin)
    }

    pub fn view_account(&self, number: &str, pin: &str) -> Result<Account, Error> {
        let index = self.authenticate(number, pin)?;
        Ok(self.accounts.as_slice()[index].clone())
    }

    pub fn deposit(&mut self, number: &str, pin: &str, amount: Decimal) -> Result<Account, Error> {
        check_amount(amount)?;
        let index = self.authenticate(number, pin)?;
        self.mutate(index, |account| {
            account.balance = account
                .balance
                .checked_add(amount)
                .ok_or(ValidationError::AmountTooLarge)?;
            Ok(())
        })
    }

    pub fn withdraw(&mut self, number: &str, pin: &str, amount: Decimal) -> Result<Account, Error> {
        check_amount(amount)?;
        let index = self.authenticate(number, pin)?;
        self.mutate(index, |account| {
            if account.balance < amount {
                return Err(Error::InsufficientFunds {
                    balance: account.balance,
                    requested: amount,
                });
            }
            account.balance -= amount;
            Ok(())
        })
    }

    /// Overwrites name, email and phone. The phone is held to the same format
    /// as at creation. The PIN cannot be changed.
    pub fn update_account(
        &mut self,
        number: &str,
        pin: &str,
        name: &str,
        email: &str,
        phone: &str,
    ) -> Result<Account, Error> {
        validate_phone(phone)?;
        let index = self.authenticate(number, pin)?;
        self.mutate(index, |account| {
            account.name = name.to_owned();
            account.email = email.to_owned();
            account.phone = phone.to_owned();
            Ok(())
        })
    }

    pub fn delete_account(&mut self, number: &str, pin: &str) -> Result<(), Error> {
        let index = self.authenticate(number, pin)?;
        let mut staged = self.accounts.clone();
        let removed = staged.remove(index);
        self.commit(staged)?;

        info!(account = %removed.account_number, "account deleted");
        Ok(())
    }

    fn authenticate(&self, number: &str, pin: &str) -> Result<usize, Error> {
        self.accounts.position(number, pin).ok_or_else(|| {
            warn!(account = number, "authentication failed");
            Error::Auth
        })
    }

    /// Applies `f` to a staged copy of the account at `index` and commits it.
    fn mutate<F>(&mut self, index: usize, f: F) -> Result<Account, Error>
    where
        F: FnOnce(&mut Account) -> Result<(), Error>,
    {
        let mut staged = self.accounts.clone();
        let account = staged.get_mut(index).ok_or(Error::Auth)?;
        f(account)?;
        let updated = account.clone();
        self.commit(staged)?;
        Ok(updated)
    }

    fn commit(&mut self, staged: Accounts) -> Result<(), StoreError> {
        self.store.save(staged.as_slice())?;
        self.accounts = staged;
        Ok(())
    }
}

fn check_amount(amount: Decimal) -> Result<(), ValidationError> {
    if amount.is_sign_negative() && !amount.is_zero() {
        return Err(ValidationError::NegativeAmount);
    }
    Ok(())
}
