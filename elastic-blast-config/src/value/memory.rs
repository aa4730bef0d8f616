//! Memory sizes such as `1.3G` or `500M`.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use serde::Deserialize;
use serde::Serialize;

use crate::Error;

/// The pattern a [`MemorySize`] must match.
static MEMORY_SIZE_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    // SAFETY: this is checked statically to ensure it always unwraps.
    Regex::new(r"^([0-9]+(?:\.[0-9]+)?)([kKmMgGtT])$").unwrap()
});

/// An amount of memory written as a number followed by a unit letter.
///
/// Units are binary: `1G` is 1024 `M`. The original text is preserved so that
/// values read from a configuration file are reported back verbatim.
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(try_from = "String", into = "String")]
pub struct MemorySize {
    /// The textual form.
    text: String,

    /// The size in gigabytes.
    gigabytes: f64,
}

impl MemorySize {
    /// Creates a memory size from a number of gigabytes.
    ///
    /// The textual form is truncated to one decimal place, but the exact value
    /// is retained for comparisons.
    pub fn from_gb(gigabytes: f64) -> Self {
        let shown = (gigabytes * 10.0).floor() / 10.0;

        Self {
            text: format!("{shown}G"),
            gigabytes,
        }
    }

    /// Gets the size in gigabytes.
    pub fn as_gb(&self) -> f64 {
        self.gigabytes
    }

    /// Gets the size in bytes.
    pub fn as_bytes(&self) -> f64 {
        self.gigabytes * 1024.0 * 1024.0 * 1024.0
    }

    /// Gets the textual form.
    pub fn as_str(&self) -> &str {
        &self.text
    }
}

impl FromStr for MemorySize {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let captures = MEMORY_SIZE_REGEX.captures(s).ok_or_else(|| {
            Error::invalid(s, "expected a number followed by one of k, m, g or t")
        })?;

        let number = captures[1]
            .parse::<f64>()
            .map_err(|_| Error::invalid(s, "expected a number followed by one of k, m, g or t"))?;

        let gigabytes = match captures[2].to_ascii_lowercase().as_str() {
            "k" => number / (1024.0 * 1024.0),
            "m" => number / 1024.0,
            "g" => number,
            _ => number * 1024.0,
        };

        if gigabytes <= 0.0 {
            return Err(Error::invalid(s, "memory size must be greater than zero"));
        }

        Ok(Self {
            text: s.to_string(),
            gigabytes,
        })
    }
}

impl TryFrom<String> for MemorySize {
    type Error = Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<MemorySize> for String {
    fn from(value: MemorySize) -> Self {
        value.text
    }
}

impl PartialEq for MemorySize {
    fn eq(&self, other: &Self) -> bool {
        self.gigabytes == other.gigabytes
    }
}

impl PartialOrd for MemorySize {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        self.gigabytes.partial_cmp(&other.gigabytes)
    }
}

impl PartialEq<str> for MemorySize {
    fn eq(&self, other: &str) -> bool {
        self.text == other
    }
}

impl PartialEq<&str> for MemorySize {
    fn eq(&self, other: &&str) -> bool {
        self.text == *other
    }
}

impl fmt::Display for MemorySize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}
