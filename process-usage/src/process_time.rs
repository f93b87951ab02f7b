//! Elapsed cpu time of a process, as printed by `ps` and `top`.
//!
//! Two text forms are understood:
//! - compact: `[D-]H:MM.SS` (hours on 1 to 3 digits, `:` also accepted before the seconds)
//! - canonical: `H:MM:SS` below one day, `N day[s], H:MM:SS` above
//!
//! Only the canonical form is ever produced.

use lazy_static::lazy_static;
use regex::{Captures, Regex};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

pub const SECONDS_PER_MINUTE: u64 = 60;
pub const SECONDS_PER_HOUR: u64 = 60 * SECONDS_PER_MINUTE;
pub const SECONDS_PER_DAY: u64 = 24 * SECONDS_PER_HOUR;

lazy_static! {
    static ref COMPACT_FORMAT: Regex =
        Regex::new(r"^(?:([0-9]+)-)?([0-9]{1,3}):([0-9]{2})[.:]([0-9]{2})$").unwrap();
    static ref CANONICAL_FORMAT: Regex =
        Regex::new(r"^([0-9]+) days?, ([0-9]{1,2}):([0-9]{2}):([0-9]{2})$").unwrap();
}

/// Raised when a time field does not match any accepted form.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{}", parse_error_message(.text, .pid))]
pub struct ParseError {
    pub text: String,
    pub pid: Option<i32>,
}

fn parse_error_message(text: &str, pid: &Option<i32>) -> String {
    match pid {
        Some(pid) => format!(
            "The time metadata '{text}' could not be parsed properly for the process with pid: {pid}."
        ),
        None => format!("The time metadata '{text}' could not be parsed properly."),
    }
}

impl ParseError {
    pub fn new(text: &str) -> Self {
        Self {
            text: text.to_string(),
            pid: None,
        }
    }

    /// Attaches the identifier of the record being validated.
    pub fn with_pid(mut self, pid: i32) -> Self {
        self.pid = Some(pid);
        self
    }
}

/// Non-negative duration with one second resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct ProcessTime(u64);

impl ProcessTime {
    pub fn from_seconds(seconds: u64) -> Self {
        Self(seconds)
    }

    pub fn as_seconds(&self) -> u64 {
        self.0
    }

    /// Builds a duration from independent components.
    ///
    /// Hours are not required to be below 24: `2-43:23:04` is two days plus
    /// forty-three hours, not a malformed value.
    pub fn from_components(days: u64, hours: u64, minutes: u64, seconds: u64) -> Option<Self> {
        let clock = hours
            .checked_mul(SECONDS_PER_HOUR)?
            .checked_add(minutes.checked_mul(SECONDS_PER_MINUTE)?)?
            .checked_add(seconds)?;
        days.checked_mul(SECONDS_PER_DAY)?
            .checked_add(clock)
            .map(Self)
    }

    /// Whole days, then the hours, minutes and seconds left over.
    pub fn components(&self) -> (u64, u64, u64, u64) {
        let days = self.0 / SECONDS_PER_DAY;
        let rest = self.0 % SECONDS_PER_DAY;
        (
            days,
            rest / SECONDS_PER_HOUR,
            rest % SECONDS_PER_HOUR / SECONDS_PER_MINUTE,
            rest % SECONDS_PER_MINUTE,
        )
    }

    pub fn parse(text: &str) -> Result<Self, ParseError> {
        let captures = COMPACT_FORMAT
            .captures(text)
            .or_else(|| CANONICAL_FORMAT.captures(text))
            .ok_or_else(|| ParseError::new(text))?;
        let days = match captures.get(1) {
            Some(days) => days.as_str().parse::<u64>().map_err(|_| ParseError::new(text))?,
            None => 0,
        };
        Self::from_components(
            days,
            capture_number(&captures, 2, text)?,
            capture_number(&captures, 3, text)?,
            capture_number(&captures, 4, text)?,
        )
        .ok_or_else(|| ParseError::new(text))
    }
}

fn capture_number(captures: &Captures<'_>, index: usize, text: &str) -> Result<u64, ParseError> {
    captures
        .get(index)
        .and_then(|m| m.as_str().parse::<u64>().ok())
        .ok_or_else(|| ParseError::new(text))
}

impl From<std::time::Duration> for ProcessTime {
    fn from(duration: std::time::Duration) -> Self {
        Self(duration.as_secs())
    }
}

impl FromStr for ProcessTime {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for ProcessTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (days, hours, minutes, seconds) = self.components();
        match days {
            0 => {}
            1 => write!(f, "1 day, ")?,
            _ => write!(f, "{days} days, ")?,
        }
        write!(f, "{hours}:{minutes:02}:{seconds:02}")
    }
}

impl Serialize for ProcessTime {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ProcessTime {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        Self::parse(&text).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_components() {
        let time = ProcessTime::from_seconds(328_984);
        assert_eq!(time.components(), (3, 19, 23, 4));
        assert_eq!(ProcessTime::default().components(), (0, 0, 0, 0));
    }

    #[test]
    fn test_from_components_overflow() {
        assert!(ProcessTime::from_components(u64::MAX, 0, 0, 0).is_none());
        assert_eq!(
            ProcessTime::from_components(0, 1, 1, 1),
            Some(ProcessTime::from_seconds(3661))
        );
    }

    #[test]
    fn test_display_pluralization() {
        assert_eq!(ProcessTime::from_seconds(59).to_string(), "0:00:59");
        assert_eq!(ProcessTime::from_seconds(SECONDS_PER_DAY).to_string(), "1 day, 0:00:00");
        assert_eq!(
            ProcessTime::from_seconds(2 * SECONDS_PER_DAY + 1).to_string(),
            "2 days, 0:00:01"
        );
    }

    #[test]
    fn test_error_message() {
        let err = ProcessTime::parse("abc").unwrap_err();
        assert_eq!(err.text, "abc");
        assert_eq!(err.pid, None);
        let err = err.with_pid(42);
        assert!(err.to_string().contains("pid: 42"));
        assert!(err.to_string().contains("'abc'"));
    }
}
