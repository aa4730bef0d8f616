//! Configuration related to _Amazon Web Services_.

use serde::Deserialize;
use serde::Serialize;

use crate::provider::SECTION;
use crate::section::reconcile;
use crate::section::Param;
use crate::section::Sections;
use crate::value::AwsRegion;
use crate::Command;
use crate::Error;
use crate::Issues;
use crate::Result;

/// The key for the AWS region.
pub const REGION: &str = "aws-region";

/// The key for the VPC.
pub const VPC: &str = "aws-vpc";

/// The key for the subnet.
pub const SUBNET: &str = "aws-subnet";

/// The key for the security group.
pub const SECURITY_GROUP: &str = "aws-security-group";

/// The key for the EC2 key pair.
pub const KEY_PAIR: &str = "aws-key-pair";

/// The key for the IAM role of the search jobs.
pub const JOB_ROLE: &str = "aws-job-role";

/// The key for the IAM role of the compute instances.
pub const INSTANCE_ROLE: &str = "aws-instance-role";

/// The key for the IAM role of the batch service.
pub const BATCH_SERVICE_ROLE: &str = "aws-batch-service-role";

/// The key for the IAM role of the spot fleet.
pub const SPOT_FLEET_ROLE: &str = "aws-spot-fleet-role";

/// The parameters an AWS profile reads from the `cloud-provider` section.
pub(crate) static SCHEMA: &[Param<Builder>] = &[
    Param::required(SECTION, REGION, |builder, value| {
        builder.region = Some(value.parse()?);
        Ok(())
    }),
    Param::optional(SECTION, VPC, |builder, value| {
        builder.vpc = Some(value.to_string());
        Ok(())
    }),
    Param::optional(SECTION, SUBNET, |builder, value| {
        builder.subnet = Some(value.to_string());
        Ok(())
    }),
    Param::optional(SECTION, SECURITY_GROUP, |builder, value| {
        builder.security_group = Some(value.to_string());
        Ok(())
    }),
    Param::optional(SECTION, KEY_PAIR, |builder, value| {
        builder.key_pair = Some(value.to_string());
        Ok(())
    }),
    Param::optional(SECTION, JOB_ROLE, |builder, value| {
        builder.job_role = Some(value.to_string());
        Ok(())
    }),
    Param::optional(SECTION, INSTANCE_ROLE, |builder, value| {
        builder.instance_role = Some(value.to_string());
        Ok(())
    }),
    Param::optional(SECTION, BATCH_SERVICE_ROLE, |builder, value| {
        builder.batch_service_role = Some(value.to_string());
        Ok(())
    }),
    Param::optional(SECTION, SPOT_FLEET_ROLE, |builder, value| {
        builder.spot_fleet_role = Some(value.to_string());
        Ok(())
    }),
];

/// A configuration object for AWS.
///
/// Everything except the region is optional; resources that are not given are
/// created on demand when the search is submitted.
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct Config {
    /// The region.
    region: AwsRegion,

    /// The VPC.
    vpc: Option<String>,

    /// The subnet.
    subnet: Option<String>,

    /// The security group.
    security_group: Option<String>,

    /// The EC2 key pair.
    key_pair: Option<String>,

    /// The IAM role of the search jobs.
    job_role: Option<String>,

    /// The IAM role of the compute instances.
    instance_role: Option<String>,

    /// The IAM role of the batch service.
    batch_service_role: Option<String>,

    /// The IAM role of the spot fleet.
    spot_fleet_role: Option<String>,
}

impl Config {
    /// Gets a default [`Builder`] for a [`Config`].
    pub fn builder() -> Builder {
        Builder::default()
    }

    /// Reads a [`Config`] from the `cloud-provider` section of `sections`.
    ///
    /// Every missing or invalid parameter is reported in the returned error.
    pub fn from_sections(sections: &Sections) -> Result<Self> {
        let mut builder = Builder::default();
        let mut issues = Issues::default();
        reconcile(sections, SCHEMA, &mut builder, &mut issues);
        issues.into_result(())?;
        builder.try_build()
    }

    /// Gets the region.
    pub fn region(&self) -> &AwsRegion {
        &self.region
    }

    /// Gets the VPC.
    pub fn vpc(&self) -> Option<&str> {
        self.vpc.as_deref()
    }

    /// Gets the subnet.
    pub fn subnet(&self) -> Option<&str> {
        self.subnet.as_deref()
    }

    /// Gets the security group.
    pub fn security_group(&self) -> Option<&str> {
        self.security_group.as_deref()
    }

    /// Gets the EC2 key pair.
    pub fn key_pair(&self) -> Option<&str> {
        self.key_pair.as_deref()
    }

    /// Gets the IAM role of the search jobs.
    pub fn job_role(&self) -> Option<&str> {
        self.job_role.as_deref()
    }

    /// Gets the IAM role of the compute instances.
    pub fn instance_role(&self) -> Option<&str> {
        self.instance_role.as_deref()
    }

    /// Gets the IAM role of the batch service.
    pub fn batch_service_role(&self) -> Option<&str> {
        self.batch_service_role.as_deref()
    }

    /// Gets the IAM role of the spot fleet.
    pub fn spot_fleet_role(&self) -> Option<&str> {
        self.spot_fleet_role.as_deref()
    }

    /// Validates the configuration, appending any problems to `issues`.
    ///
    /// Every AWS field is independently valid, so there is nothing to check
    /// across fields.
    pub fn validate(&self, _: &mut Issues, _: Command) {}
}

/// A builder for an [AWS configuration object](Config).
#[derive(Debug, Default)]
pub struct Builder {
    /// The region.
    region: Option<AwsRegion>,

    /// The VPC.
    vpc: Option<String>,

    /// The subnet.
    subnet: Option<String>,

    /// The security group.
    security_group: Option<String>,

    /// The EC2 key pair.
    key_pair: Option<String>,

    /// The IAM role of the search jobs.
    job_role: Option<String>,

    /// The IAM role of the compute instances.
    instance_role: Option<String>,

    /// The IAM role of the batch service.
    batch_service_role: Option<String>,

    /// The IAM role of the spot fleet.
    spot_fleet_role: Option<String>,
}

impl Builder {
    /// Sets the region for the [`Builder`].
    pub fn region(mut self, region: AwsRegion) -> Self {
        self.region = Some(region);
        self
    }

    /// Sets the VPC for the [`Builder`].
    pub fn vpc(mut self, vpc: impl Into<String>) -> Self {
        self.vpc = Some(vpc.into());
        self
    }

    /// Sets the subnet for the [`Builder`].
    pub fn subnet(mut self, subnet: impl Into<String>) -> Self {
        self.subnet = Some(subnet.into());
        self
    }

    /// Sets the security group for the [`Builder`].
    pub fn security_group(mut self, security_group: impl Into<String>) -> Self {
        self.security_group = Some(security_group.into());
        self
    }

    /// Sets the EC2 key pair for the [`Builder`].
    pub fn key_pair(mut self, key_pair: impl Into<String>) -> Self {
        self.key_pair = Some(key_pair.into());
        self
    }

    /// Sets the IAM role of the search jobs for the [`Builder`].
    pub fn job_role(mut self, role: impl Into<String>) -> Self {
        self.job_role = Some(role.into());
        self
    }

    /// Sets the IAM role of the compute instances for the [`Builder`].
    pub fn instance_role(mut self, role: impl Into<String>) -> Self {
        self.instance_role = Some(role.into());
        self
    }

    /// Sets the IAM role of the batch service for the [`Builder`].
    pub fn batch_service_role(mut self, role: impl Into<String>) -> Self {
        self.batch_service_role = Some(role.into());
        self
    }

    /// Sets the IAM role of the spot fleet for the [`Builder`].
    pub fn spot_fleet_role(mut self, role: impl Into<String>) -> Self {
        self.spot_fleet_role = Some(role.into());
        self
    }

    /// Consumes `self` and attempts to build a [`Config`].
    pub fn try_build(self) -> Result<Config> {
        Ok(Config {
            region: self.region.ok_or(Error::Missing(REGION))?,
            vpc: self.vpc,
            subnet: self.subnet,
            security_group: self.security_group,
            key_pair: self.key_pair,
            job_role: self.job_role,
            instance_role: self.instance_role,
            batch_service_role: self.batch_service_role,
            spot_fleet_role: self.spot_fleet_role,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = Config::builder()
            .region("test-region".parse().unwrap())
            .try_build()
            .unwrap();

        assert_eq!(config.region(), "test-region");
        assert!(config.vpc().is_none());
        assert!(config.subnet().is_none());
        assert!(config.security_group().is_none());
        assert!(config.key_pair().is_none());
        assert!(config.job_role().is_none());
        assert!(config.instance_role().is_none());
        assert!(config.batch_service_role().is_none());
        assert!(config.spot_fleet_role().is_none());

        let mut issues = Issues::default();
        config.validate(&mut issues, Command::Submit);
        assert!(issues.is_empty());
    }

    #[test]
    fn from_sections() {
        let sections = Sections::new().with_section(
            SECTION,
            [
                (REGION, "test-region"),
                (VPC, "test-vpc"),
                (SUBNET, "test-subnet"),
                (SECURITY_GROUP, "test-security-group"),
                (KEY_PAIR, "test-key-pair"),
                (JOB_ROLE, "arn:aws:iam::test-job-role"),
                (INSTANCE_ROLE, "arn:aws:iam::test-instance-role"),
                (BATCH_SERVICE_ROLE, "arn:aws:iam::test-batch-service-role"),
                (SPOT_FLEET_ROLE, "arn:aws:iam::test-spot-fleet-role"),
            ],
        );

        let config = Config::from_sections(&sections).unwrap();
        assert_eq!(config.region(), "test-region");
        assert_eq!(config.vpc(), Some("test-vpc"));
        assert_eq!(config.subnet(), Some("test-subnet"));
        assert_eq!(config.security_group(), Some("test-security-group"));
        assert_eq!(config.key_pair(), Some("test-key-pair"));
        assert_eq!(config.job_role(), Some("arn:aws:iam::test-job-role"));
        assert_eq!(config.instance_role(), Some("arn:aws:iam::test-instance-role"));
        assert_eq!(
            config.batch_service_role(),
            Some("arn:aws:iam::test-batch-service-role")
        );
        assert_eq!(config.spot_fleet_role(), Some("arn:aws:iam::test-spot-fleet-role"));
    }

    #[test]
    fn from_sections_reports_missing_region() {
        let err = Config::from_sections(&Sections::new()).unwrap_err();
        assert!(err.to_string().contains("Missing aws-region"));
    }

    #[test]
    fn from_sections_reports_invalid_region() {
        let sections = Sections::new().with_section(SECTION, [(REGION, "re@ion")]);
        let message = Config::from_sections(&sections).unwrap_err().to_string();
        assert!(message.contains(REGION));
        assert!(message.contains("re@ion"));
    }
}
