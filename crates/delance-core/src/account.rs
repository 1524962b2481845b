use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ValidationFailure;

/// An opaque ledger address.
///
/// The only invariant enforced here is non-emptiness; the ledger client is
/// responsible for checking the address format when it needs to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Account(String);

impl Account {
    pub fn new(address: impl Into<String>) -> Result<Self, ValidationFailure> {
        let address = address.into();
        let trimmed = address.trim();
        if trimmed.is_empty() {
            return Err(ValidationFailure::EmptyAddress);
        }
        Ok(Self(trimmed.to_string()))
    }

    /// Interprets the contents of an address input field.
    ///
    /// A blank field means "no account" rather than an error.
    pub fn from_input(input: &str) -> Option<Self> {
        Self::new(input).ok()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Case-insensitive comparison, matching how hex addresses are compared.
    pub fn same_address(&self, other: &Account) -> bool {
        self.0.eq_ignore_ascii_case(&other.0)
    }
}

impl fmt::Display for Account {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for Account {
    type Error = ValidationFailure;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Account> for String {
    fn from(account: Account) -> Self {
        account.0
    }
}
