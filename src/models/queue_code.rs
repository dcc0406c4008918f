use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::ServiceError;

const PREFIX: char = 'Q';
const WIDTH: usize = 4;

/// Human-facing kitchen ticket, `Q` followed by a zero-padded four digit number.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct QueueCode(String);

impl QueueCode {
    /// Highest ordinal a code can carry.
    pub const MAX_NUMBER: u16 = 9999;

    /// The sentinel code that precedes the first issued ticket.
    pub fn zero() -> Self {
        Self::from_number(0)
    }

    /// Formats an ordinal. Values above [`Self::MAX_NUMBER`] are reduced into range.
    pub fn from_number(number: u16) -> Self {
        let number = number % (Self::MAX_NUMBER + 1);
        Self(format!("{}{:0width$}", PREFIX, number, width = WIDTH))
    }

    pub fn parse(raw: &str) -> Result<Self, ServiceError> {
        let trimmed = raw.trim();
        let digits = trimmed
            .strip_prefix(PREFIX)
            .filter(|digits| digits.len() == WIDTH && digits.bytes().all(|b| b.is_ascii_digit()))
            .ok_or_else(|| ServiceError::InvalidInput(format!("malformed queue code '{}'", raw)))?;
        // Four ASCII digits always fit.
        let number: u16 = digits
            .parse()
            .map_err(|_| ServiceError::InvalidInput(format!("malformed queue code '{}'", raw)))?;
        Ok(Self::from_number(number))
    }

    /// The fixed-width numeric suffix.
    pub fn number(&self) -> u16 {
        self.0[1..].parse().unwrap_or(0)
    }

    /// The code issued after this one. `Q9999` wraps to `Q0001`; `Q0000` is never reissued.
    pub fn next(&self) -> Self {
        match self.number() {
            n if n >= Self::MAX_NUMBER => Self::from_number(1),
            n => Self::from_number(n + 1),
        }
    }

    pub fn is_zero(&self) -> bool {
        self.number() == 0
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for QueueCode {
    type Err = ServiceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for QueueCode {
    type Error = ServiceError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<QueueCode> for String {
    fn from(code: QueueCode) -> Self {
        code.0
    }
}

impl fmt::Display for QueueCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
