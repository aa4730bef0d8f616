//! Cloud resource identifiers.

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use serde::Deserialize;
use serde::Serialize;

use crate::Error;

/// The pattern a [`GcpString`] must match.
static GCP_STRING_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    // SAFETY: this is checked statically to ensure it always unwraps.
    Regex::new(r"^[a-z0-9-]+$").unwrap()
});

/// The pattern an [`AwsRegion`] must match.
static AWS_REGION_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    // SAFETY: this is checked statically to ensure it always unwraps.
    Regex::new(r"^[A-Za-z0-9-]+$").unwrap()
});

/// Defines a string newtype that is validated against a regex.
macro_rules! token {
    ($(#[$meta:meta])* $name:ident, $regex:ident, $rule:literal) => {
        $(#[$meta])*
        #[derive(Clone, Debug, PartialEq, Eq, Hash, Deserialize, Serialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(String);

        impl $name {
            /// Gets the inner string.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl FromStr for $name {
            type Err = Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                if $regex.is_match(s) {
                    Ok(Self(s.to_string()))
                } else {
                    Err(Error::invalid(s, $rule))
                }
            }
        }

        impl TryFrom<String> for $name {
            type Error = Error;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                value.parse()
            }
        }

        impl From<$name> for String {
            fn from(value: $name) -> Self {
                value.0
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl PartialEq<str> for $name {
            fn eq(&self, other: &str) -> bool {
                self.0 == other
            }
        }

        impl PartialEq<&str> for $name {
            fn eq(&self, other: &&str) -> bool {
                self.0 == *other
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

token!(
    /// A GCP project, region, zone or network name.
    ///
    /// Only lowercase letters, digits and hyphens are allowed.
    GcpString,
    GCP_STRING_REGEX,
    "only lowercase letters, digits and hyphens are allowed"
);

token!(
    /// An AWS region name.
    ///
    /// Letters of either case, digits and hyphens are allowed.
    AwsRegion,
    AWS_REGION_REGEX,
    "only letters, digits and hyphens are allowed"
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gcp_strings() {
        for value in ["us-east-4b", "some-string", "name-1234"] {
            assert_eq!(value.parse::<GcpString>().unwrap(), value);
        }

        for value in ["UPPERCASE", "some@name", ""] {
            assert!(value.parse::<GcpString>().is_err(), "{value} should be invalid");
        }
    }

    #[test]
    fn aws_regions() {
        for value in ["us-east-1", "some-Region", "REGION-123"] {
            assert_eq!(value.parse::<AwsRegion>().unwrap(), value);
        }

        for value in ["re@ion", "region-!@#", ""] {
            assert!(value.parse::<AwsRegion>().is_err(), "{value} should be invalid");
        }
    }

    #[test]
    fn errors_name_the_input() {
        let err = "inval!d-PROJECT".parse::<GcpString>().unwrap_err();
        assert!(err.to_string().contains("inval!d-PROJECT"));
    }
}
