use rand::Rng;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::ValidationError;

const PIN_DIGITS: usize = 4;
const PHONE_DIGITS: usize = 10;

/// Primary key of an account: 4 uppercase ASCII letters followed by 4 digits.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AccountNumber(String);

impl AccountNumber {
    pub fn parse(s: &str) -> Option<Self> {
        let bytes = s.as_bytes();
        let well_formed = bytes.len() == 8
            && bytes[..4].iter().all(u8::is_ascii_uppercase)
            && bytes[4..].iter().all(u8::is_ascii_digit);
        well_formed.then(|| Self(s.to_owned()))
    }

    /// Draws a random candidate. Uniqueness is the caller's concern, see
    /// [`Accounts::unique_number`].
    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let mut number = String::with_capacity(8);
        for _ in 0..4 {
            number.push(rng.gen_range(b'A'..=b'Z') as char);
        }
        for _ in 0..4 {
            number.push(rng.gen_range(b'0'..=b'9') as char);
        }
        Self(number)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AccountNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for AccountNumber {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value).ok_or_else(|| format!("malformed account number {:?}", value))
    }
}

impl From<AccountNumber> for String {
    fn from(number: AccountNumber) -> Self {
        number.0
    }
}

/// 4-digit PIN, stored as an integer.
///
/// Leading zeros are not kept in storage, so comparison against user input
/// goes through the zero-padded rendering.
#[derive(Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u16", into = "u16")]
pub struct Pin(u16);

impl Pin {
    pub fn parse(s: &str) -> Result<Self, ValidationError> {
        if s.len() != PIN_DIGITS || !s.bytes().all(|b| b.is_ascii_digit()) {
            return Err(ValidationError::InvalidPin);
        }
        s.parse().map(Pin).map_err(|_| ValidationError::InvalidPin)
    }

    pub fn matches(&self, candidate: &str) -> bool {
        format!("{:04}", self.0) == candidate
    }
}

// Keep the credential out of logs and panic messages.
impl fmt::Debug for Pin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Pin(****)")
    }
}

impl TryFrom<u16> for Pin {
    type Error = String;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        if value > 9999 {
            return Err(format!("PIN {} has more than 4 digits", value));
        }
        Ok(Pin(value))
    }
}

impl From<Pin> for u16 {
    fn from(pin: Pin) -> Self {
        pin.0
    }
}

pub fn validate_phone(phone: &str) -> Result<(), ValidationError> {
    if phone.len() == PHONE_DIGITS && phone.bytes().all(|b| b.is_ascii_digit()) {
        Ok(())
    } else {
        Err(ValidationError::InvalidPhone)
    }
}

/// A customer account. Field names on disk are kept compatible with existing
/// `data.json` files.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    pub name: String,
    pub email: String,
    #[serde(rename = "phone No.")]
    pub phone: String,
    pub pin: Pin,
    #[serde(rename = "Account No.")]
    pub account_number: AccountNumber,
    pub balance: Decimal,
}

/// Ordered in-memory collection of accounts. Insertion order is the order
/// written to the backing store.
#[derive(Debug, Clone, Default)]
pub struct Accounts {
    accounts: Vec<Account>,
}

impl Accounts {
    pub fn contains(&self, number: &str) -> bool {
        self.accounts
            .iter()
            .any(|account| account.account_number.as_str() == number)
    }

    /// Index of the first account matching both the number and the PIN.
    /// An unknown number and a wrong PIN are indistinguishable here.
    pub fn position(&self, number: &str, pin: &str) -> Option<usize> {
        self.accounts
            .iter()
            .position(|account| account.account_number.as_str() == number && account.pin.matches(pin))
    }

    pub fn find(&self, number: &str, pin: &str) -> Option<&Account> {
        self.position(number, pin).map(|index| &self.accounts[index])
    }

    /// Draws candidates until one does not collide with an existing account.
    pub fn unique_number<F>(&self, mut candidate: F) -> AccountNumber
    where
        F: FnMut() -> AccountNumber,
    {
        loop {
            let number = candidate();
            if !self.contains(number.as_str()) {
                return number;
            }
        }
    }

    pub fn push(&mut self, account: Account) {
        self.accounts.push(account);
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut Account> {
        self.accounts.get_mut(index)
    }

    pub fn remove(&mut self, index: usize) -> Account {
        self.accounts.remove(index)
    }

    pub fn as_slice(&self) -> &[Account] {
        &self.accounts
    }

    pub fn iter(&self) -> impl Iterator<Item = &Account> {
        self.accounts.iter()
    }

    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }
}

impl From<Vec<Account>> for Accounts {
    fn from(accounts: Vec<Account>) -> Self {
        Self { accounts }
    }
}
