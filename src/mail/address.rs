//! Validated mailbox addresses

use std::fmt::{self, Display};
use std::str::FromStr;

use lettre::message::Mailbox;

use crate::mail::error::MailError;

/// A syntactically valid mailbox, optionally carrying a display name.
///
/// Accepts both bare addresses (`user@example.com`) and the
/// `Name <user@example.com>` form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Address(Mailbox);

impl Address {
    /// Parse and validate an address
    pub fn new(address: &str) -> Result<Self, MailError> {
        address
            .parse::<Mailbox>()
            .map(Self)
            .map_err(|source| MailError::InvalidAddress {
                address: address.to_owned(),
                source,
            })
    }

    /// Parse an address and attach a display name, replacing any name it
    /// already carried. A blank name leaves the address unnamed.
    pub fn with_name(address: &str, name: &str) -> Result<Self, MailError> {
        let mut parsed = Self::new(address)?;
        let name = name.trim();
        parsed.0.name = (!name.is_empty()).then(|| name.to_owned());
        Ok(parsed)
    }

    /// The bare `local@domain` part
    pub fn email(&self) -> &str {
        self.0.email.as_ref()
    }

    /// The display name, if any
    pub fn name(&self) -> Option<&str> {
        self.0.name.as_deref()
    }

    pub fn mailbox(&self) -> &Mailbox {
        &self.0
    }
}

impl FromStr for Address {
    type Err = MailError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        Display::fmt(&self.0, f)
    }
}

impl From<Address> for Mailbox {
    fn from(value: Address) -> Self {
        value.0
    }
}

/// Validate every entry before returning any of them, so callers can append
/// the result without leaving a list half-updated.
pub(crate) fn parse_all<I, S>(addresses: I) -> Result<Vec<Address>, MailError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    addresses
        .into_iter()
        .map(|address| Address::new(address.as_ref()))
        .collect()
}
