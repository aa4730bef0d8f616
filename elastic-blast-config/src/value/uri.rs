//! Cloud storage URIs.

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use serde::Deserialize;
use serde::Serialize;

use crate::provider::Cloud;
use crate::Error;

/// The pattern a [`CloudUri`] must match.
static CLOUD_URI_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    // SAFETY: this is checked statically to ensure it always unwraps.
    Regex::new(r"^(gs|s3)://[A-Za-z0-9][A-Za-z0-9._~/-]*$").unwrap()
});

/// A `gs://` or `s3://` URI.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(try_from = "String", into = "String")]
pub struct CloudUri {
    /// The URI.
    uri: String,

    /// The hex encoded MD5 digest of the URI.
    checksum: String,
}

impl CloudUri {
    /// The scheme prefix for Google Cloud Storage.
    pub const GCS_PREFIX: &'static str = "gs://";

    /// The scheme prefix for Amazon S3.
    pub const S3_PREFIX: &'static str = "s3://";

    /// Gets the URI.
    pub fn as_str(&self) -> &str {
        &self.uri
    }

    /// Gets the cloud provider that hosts the URI.
    pub fn cloud(&self) -> Cloud {
        if self.uri.starts_with(Self::GCS_PREFIX) {
            Cloud::Gcp
        } else {
            Cloud::Aws
        }
    }

    /// Gets the bucket name.
    pub fn bucket(&self) -> &str {
        let rest = &self.uri[Self::GCS_PREFIX.len()..];
        rest.split('/').next().unwrap_or(rest)
    }

    /// Gets the hex encoded MD5 checksum of the URI.
    ///
    /// This is suitable as a cache key for anything derived from the URI.
    pub fn md5(&self) -> &str {
        &self.checksum
    }

    /// Whether or not `value` is shaped like a URI (carries a `scheme://`).
    pub fn looks_like_uri(value: &str) -> bool {
        value.contains("://")
    }
}

impl FromStr for CloudUri {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if !CLOUD_URI_REGEX.is_match(s) {
            return Err(Error::invalid(
                s,
                "expected a gs:// or s3:// URI containing only URL-safe characters",
            ));
        }

        Ok(Self {
            uri: s.to_string(),
            checksum: format!("{:x}", md5::compute(s.as_bytes())),
        })
    }
}

impl TryFrom<String> for CloudUri {
    type Error = Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<CloudUri> for String {
    fn from(value: CloudUri) -> Self {
        value.uri
    }
}

impl AsRef<str> for CloudUri {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl PartialEq<str> for CloudUri {
    fn eq(&self, other: &str) -> bool {
        self.uri == other
    }
}

impl PartialEq<&str> for CloudUri {
    fn eq(&self, other: &&str) -> bool {
        self.uri == *other
    }
}

impl fmt::Display for CloudUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.uri)
    }
}
