//! Log severities and their lookup table.

use crate::bundler::{Error, Result};
use std::{fmt, str::FromStr};

/// Severity of a log record.
///
/// Ordered from least to most severe. The numeric value is the position in
/// [`SEVERITY_TABLE`].
#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub enum Severity {
    /// Verbose diagnostics, including raw tool output.
    Debug,
    /// Progress messages.
    Info,
    /// Recoverable problems such as sanitized package names.
    Warn,
    /// Failures.
    Error,
    /// Failures that abort the process.
    Fatal,
    /// Messages of unknown severity. Always logged.
    Unknown,
}

/// Name to severity mapping used for parsing.
pub const SEVERITY_TABLE: &[(&str, Severity)] = &[
    ("debug", Severity::Debug),
    ("info", Severity::Info),
    ("warn", Severity::Warn),
    ("error", Severity::Error),
    ("fatal", Severity::Fatal),
    ("unknown", Severity::Unknown),
];

impl Severity {
    /// Integer level of this severity (0 = debug … 5 = unknown).
    pub fn as_u8(self) -> u8 {
        self as u8
    }

    /// Inverse of [`Severity::as_u8`]; values past the table saturate to
    /// [`Severity::Unknown`].
    pub fn from_u8(value: u8) -> Self {
        SEVERITY_TABLE
            .get(value as usize)
            .map(|(_, severity)| *severity)
            .unwrap_or(Severity::Unknown)
    }

    /// Upper-case label, e.g. `WARN`.
    pub fn label(self) -> &'static str {
        match self {
            Severity::Debug => "DEBUG",
            Severity::Info => "INFO",
            Severity::Warn => "WARN",
            Severity::Error => "ERROR",
            Severity::Fatal => "FATAL",
            Severity::Unknown => "ANY",
        }
    }

    /// The `log` crate level records of this severity are emitted at.
    pub fn to_log_level(self) -> log::Level {
        match self {
            Severity::Debug => log::Level::Debug,
            Severity::Info => log::Level::Info,
            Severity::Warn => log::Level::Warn,
            Severity::Error | Severity::Fatal | Severity::Unknown => log::Level::Error,
        }
    }
}

impl FromStr for Severity {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim().to_ascii_lowercase();
        SEVERITY_TABLE
            .iter()
            .find(|(name, _)| *name == wanted)
            .map(|(_, severity)| *severity)
            .ok_or_else(|| Error::InvalidLogLevel(s.to_string()))
    }
}

impl<'de> serde::Deserialize<'de> for Severity {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let name = <String as serde::Deserialize>::deserialize(deserializer)?;
        name.parse().map_err(serde::de::Error::custom)
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
