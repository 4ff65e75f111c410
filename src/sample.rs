//! Collected samples and their text encoding.
//!
//! A [`Sample`] is produced by one successful probe execution and consumed by
//! exactly one dispatch. Its text form is `<name>:<value>`, split on the first
//! `:` when decoding. The same text is the body of the StatsD counter line.

use std::str::FromStr;

use thiserror::Error;

/// Separator between metric name and value.
pub const SEPARATOR: char = ':';

/// Errors decoding a `<name>:<value>` string.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SampleParseError {
    /// No separator in the input.
    #[error("missing '{SEPARATOR}' separator in {0:?}")]
    MissingSeparator(String),

    /// Nothing before the separator.
    #[error("empty metric name in {0:?}")]
    EmptyName(String),

    /// The value part is not an integer.
    #[error("invalid value {value:?}: {source}")]
    InvalidValue {
        value: String,
        #[source]
        source: std::num::ParseIntError,
    },
}

/// A (metric name, integer value) pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Sample {
    pub name: String,
    pub value: i64,
}

impl Sample {
    pub fn new(name: impl Into<String>, value: i64) -> Self {
        Self {
            name: name.into(),
            value,
        }
    }

    /// Parse a scalar read from the data source.
    ///
    /// Surrounding ASCII whitespace is ignored; anything else that is not a
    /// base-10 `i64` is rejected.
    pub fn parse_value(raw: &str) -> Result<i64, std::num::ParseIntError> {
        raw.trim_ascii().parse::<i64>()
    }
}

impl std::fmt::Display for Sample {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{SEPARATOR}{}", self.name, self.value)
    }
}

impl FromStr for Sample {
    type Err = SampleParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (name, value) = s
            .split_once(SEPARATOR)
            .ok_or_else(|| SampleParseError::MissingSeparator(s.to_string()))?;

        if name.is_empty() {
            return Err(SampleParseError::EmptyName(s.to_string()));
        }

        let value = value
            .parse::<i64>()
            .map_err(|source| SampleParseError::InvalidValue {
                value: value.to_string(),
                source,
            })?;

        Ok(Self::new(name, value))
    }
}
