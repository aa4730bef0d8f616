//! Cloud provider profiles.
//!
//! A profile carries the identity and networking configuration for exactly one
//! cloud provider. The two providers share no fields beyond their tag, so a
//! profile is a sum type over the provider-specific configuration objects.

use std::fmt;
use std::str::FromStr;

use serde::Deserialize;
use serde::Serialize;

pub mod aws;
pub mod gcp;

use crate::section::Param;
use crate::section::Sections;
use crate::Command;
use crate::Error;
use crate::Issues;
use crate::Result;

/// The name of the section holding provider parameters.
pub const SECTION: &str = "cloud-provider";

/// A supported cloud provider.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub enum Cloud {
    /// Google Cloud Platform.
    #[serde(rename = "GCP")]
    Gcp,

    /// Amazon Web Services.
    #[serde(rename = "AWS")]
    Aws,
}

impl FromStr for Cloud {
    type Err = Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "GCP" => Ok(Cloud::Gcp),
            "AWS" => Ok(Cloud::Aws),
            _ => Err(Error::invalid(s, "expected GCP or AWS")),
        }
    }
}

impl fmt::Display for Cloud {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cloud::Gcp => write!(f, "GCP"),
            Cloud::Aws => write!(f, "AWS"),
        }
    }
}

/// A cloud provider profile.
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(tag = "cloud")]
pub enum Profile {
    /// A GCP profile.
    #[serde(rename = "GCP")]
    Gcp(gcp::Config),

    /// An AWS profile.
    #[serde(rename = "AWS")]
    Aws(aws::Config),
}

impl Profile {
    /// Gets the provider of the profile.
    pub fn cloud(&self) -> Cloud {
        match self {
            Profile::Gcp(_) => Cloud::Gcp,
            Profile::Aws(_) => Cloud::Aws,
        }
    }

    /// Gets the region.
    pub fn region(&self) -> &str {
        match self {
            Profile::Gcp(config) => config.region().as_str(),
            Profile::Aws(config) => config.region().as_str(),
        }
    }

    /// Reads the profile for `cloud` from `sections`.
    pub fn from_sections(cloud: Cloud, sections: &Sections) -> Result<Self> {
        match cloud {
            Cloud::Gcp => gcp::Config::from_sections(sections).map(Profile::Gcp),
            Cloud::Aws => aws::Config::from_sections(sections).map(Profile::Aws),
        }
    }

    /// Determines which provider the parameters in `sections` describe.
    ///
    /// Provider parameters are prefixed with the provider name, so a section
    /// holding only `gcp-*` keys describes GCP and one holding only `aws-*`
    /// keys describes AWS. Anything else cannot be attributed.
    pub fn detect(sections: &Sections) -> Result<Cloud> {
        let keys = sections
            .section(SECTION)
            .map(|section| section.keys().map(String::as_str).collect::<Vec<_>>())
            .unwrap_or_default();

        let gcp = keys.iter().any(|key| key.starts_with("gcp-"));
        let aws = keys.iter().any(|key| key.starts_with("aws-"));

        let mut issues = Issues::default();
        match (gcp, aws) {
            (true, false) => return Ok(Cloud::Gcp),
            (false, true) => return Ok(Cloud::Aws),
            (true, true) => issues.violation(
                "GCP and AWS parameters cannot be mixed: use either gcp-* or aws-* parameters in \
                 the cloud-provider section",
            ),
            (false, false) => issues.violation(
                "Cloud provider configuration is missing: provide gcp-project, gcp-region and \
                 gcp-zone, or aws-region",
            ),
        }

        Err(Error::Invalid(issues))
    }

    /// Gets every section and key the profiles of either provider recognize.
    pub fn schema() -> impl Iterator<Item = (&'static str, &'static str)> {
        gcp::SCHEMA
            .iter()
            .map(Param::location)
            .chain(aws::SCHEMA.iter().map(Param::location))
    }

    /// Validates the profile, appending any problems to `issues`.
    pub fn validate(&self, issues: &mut Issues, command: Command) {
        match self {
            Profile::Gcp(config) => config.validate(issues, command),
            Profile::Aws(config) => config.validate(issues, command),
        }
    }

    /// Attempts to return a reference to the inner [GCP
    /// configuration][`gcp::Config`].
    pub fn as_gcp(&self) -> Option<&gcp::Config> {
        match self {
            Profile::Gcp(config) => Some(config),
            _ => None,
        }
    }

    /// Attempts to return a mutable reference to the inner [GCP
    /// configuration][`gcp::Config`].
    pub fn as_gcp_mut(&mut self) -> Option<&mut gcp::Config> {
        match self {
            Profile::Gcp(config) => Some(config),
            _ => None,
        }
    }

    /// Attempts to return a reference to the inner [AWS
    /// configuration][`aws::Config`].
    pub fn as_aws(&self) -> Option<&aws::Config> {
        match self {
            Profile::Aws(config) => Some(config),
            _ => None,
        }
    }

    /// Attempts to return a mutable reference to the inner [AWS
    /// configuration][`aws::Config`].
    pub fn as_aws_mut(&mut self) -> Option<&mut aws::Config> {
        match self {
            Profile::Aws(config) => Some(config),
            _ => None,
        }
    }
}

impl From<gcp::Config> for Profile {
    fn from(config: gcp::Config) -> Self {
        Profile::Gcp(config)
    }
}

impl From<aws::Config> for Profile {
    fn from(config: aws::Config) -> Self {
        Profile::Aws(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clouds() {
        assert_eq!("gcp".parse::<Cloud>().unwrap(), Cloud::Gcp);
        assert_eq!("AWS".parse::<Cloud>().unwrap(), Cloud::Aws);
        assert!("some-db-source".parse::<Cloud>().is_err());
        assert_eq!(Cloud::Gcp.to_string(), "GCP");
    }

    #[test]
    fn detection() {
        let sections = Sections::new().with_section(SECTION, [("gcp-project", "p")]);
        assert_eq!(Profile::detect(&sections).unwrap(), Cloud::Gcp);

        let sections = Sections::new().with_section(SECTION, [("aws-region", "us-east-1")]);
        assert_eq!(Profile::detect(&sections).unwrap(), Cloud::Aws);

        let sections = Sections::new()
            .with_section(SECTION, [("aws-region", "us-east-1"), ("gcp-zone", "z")]);
        assert!(Profile::detect(&sections)
            .unwrap_err()
            .to_string()
            .contains("cannot be mixed"));

        let err = Profile::detect(&Sections::new()).unwrap_err();
        assert!(err.to_string().contains("Cloud provider configuration is missing"));
    }

    #[test]
    fn profiles_carry_only_their_own_fields() {
        let profile = Profile::from(
            gcp::Config::builder()
                .project("test-project".parse().unwrap())
                .region("test-region".parse().unwrap())
                .zone("test-zone".parse().unwrap())
                .try_build()
                .unwrap(),
        );

        assert_eq!(profile.cloud(), Cloud::Gcp);
        assert_eq!(profile.region(), "test-region");
        assert!(profile.as_aws().is_none());
        assert!(profile.as_gcp().is_some());
    }
}
