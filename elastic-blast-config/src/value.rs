//! Validated scalar values.
//!
//! Every configuration field that accepts a cloud identifier is typed with one
//! of the values below so that malformed identifiers are caught when the value
//! is assigned rather than deep inside a cloud API call.

mod memory;
mod token;
mod uri;

pub use memory::MemorySize;
pub use token::AwsRegion;
pub use token::GcpString;
pub use uri::CloudUri;

use crate::Error;
use crate::Result;

/// Parses a permissive boolean (`yes`/`no`, `true`/`false`, `on`/`off`,
/// `1`/`0`), ignoring case.
pub fn parse_flag(value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "yes" | "true" | "on" | "y" | "t" => Ok(true),
        "0" | "no" | "false" | "off" | "n" | "f" => Ok(false),
        _ => Err(Error::invalid(value, "expected a boolean such as yes or no")),
    }
}

/// Parses a strictly positive integer.
pub fn parse_positive(value: &str) -> Result<u64> {
    match value.trim().parse::<u64>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(Error::invalid(value, "expected a positive integer")),
    }
}

/// Parses a non-negative, finite number.
pub fn parse_number(value: &str) -> Result<f64> {
    match value.trim().parse::<f64>() {
        Ok(n) if n.is_finite() && n >= 0.0 => Ok(n),
        _ => Err(Error::invalid(value, "expected a non-negative number")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags() {
        for value in ["Yes", "TRUE", "1", "on"] {
            assert!(parse_flag(value).unwrap());
        }

        for value in ["no", "False", "0", "OFF"] {
            assert!(!parse_flag(value).unwrap());
        }

        assert!(parse_flag("maybe").is_err());
    }

    #[test]
    fn numbers() {
        assert_eq!(parse_positive("5000").unwrap(), 5000);
        assert!(parse_positive("0").is_err());
        assert!(parse_positive("-5").is_err());
        assert!(parse_positive("abc").is_err());

        assert_eq!(parse_number("91.6").unwrap(), 91.6);
        assert!(parse_number("margin").is_err());
        assert!(parse_number("-1").is_err());
    }
}
