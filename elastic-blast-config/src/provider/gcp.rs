//! Configuration related to _Google Cloud Platform_.

use serde::Deserialize;
use serde::Serialize;

use crate::provider::SECTION;
use crate::section::reconcile;
use crate::section::Param;
use crate::section::Sections;
use crate::value::GcpString;
use crate::Command;
use crate::Error;
use crate::Issues;
use crate::Result;

/// The key for the GCP project.
pub const PROJECT: &str = "gcp-project";

/// The key for the GCP region.
pub const REGION: &str = "gcp-region";

/// The key for the GCP zone.
pub const ZONE: &str = "gcp-zone";

/// The key for the GCP network.
pub const NETWORK: &str = "gcp-network";

/// The key for the GCP subnetwork.
pub const SUBNETWORK: &str = "gcp-subnetwork";

/// The parameters a GCP profile reads from the `cloud-provider` section.
pub(crate) static SCHEMA: &[Param<Builder>] = &[
    Param::required(SECTION, PROJECT, |builder, value| {
        builder.project = Some(value.parse()?);
        Ok(())
    }),
    Param::required(SECTION, REGION, |builder, value| {
        builder.region = Some(value.parse()?);
        Ok(())
    }),
    Param::required(SECTION, ZONE, |builder, value| {
        builder.zone = Some(value.parse()?);
        Ok(())
    }),
    Param::optional(SECTION, NETWORK, |builder, value| {
        builder.network = Some(value.parse()?);
        Ok(())
    }),
    Param::optional(SECTION, SUBNETWORK, |builder, value| {
        builder.subnetwork = Some(value.parse()?);
        Ok(())
    }),
];

/// A configuration object for GCP.
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct Config {
    /// The project.
    project: GcpString,

    /// The region.
    region: GcpString,

    /// The zone.
    zone: GcpString,

    /// The network.
    network: Option<GcpString>,

    /// The subnetwork.
    subnetwork: Option<GcpString>,
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

    /// Gets the project.
    pub fn project(&self) -> &GcpString {
        &self.project
    }

    /// Gets the region.
    pub fn region(&self) -> &GcpString {
        &self.region
    }

    /// Gets the zone.
    pub fn zone(&self) -> &GcpString {
        &self.zone
    }

    /// Gets the network.
    pub fn network(&self) -> Option<&GcpString> {
        self.network.as_ref()
    }

    /// Gets the subnetwork.
    pub fn subnetwork(&self) -> Option<&GcpString> {
        self.subnetwork.as_ref()
    }

    /// Sets the network.
    pub fn set_network(&mut self, network: Option<GcpString>) {
        self.network = network;
    }

    /// Sets the subnetwork.
    pub fn set_subnetwork(&mut self, subnetwork: Option<GcpString>) {
        self.subnetwork = subnetwork;
    }

    /// Validates the configuration, appending any problems to `issues`.
    pub fn validate(&self, issues: &mut Issues, _: Command) {
        if self.network.is_some() != self.subnetwork.is_some() {
            issues.violation(format!(
                "Both {NETWORK} and {SUBNETWORK} must be set, or neither of them"
            ));
        }
    }
}

/// A builder for a [GCP configuration object](Config).
#[derive(Debug, Default)]
pub struct Builder {
    /// The project.
    project: Option<GcpString>,

    /// The region.
    region: Option<GcpString>,

    /// The zone.
    zone: Option<GcpString>,

    /// The network.
    network: Option<GcpString>,

    /// The subnetwork.
    subnetwork: Option<GcpString>,
}

impl Builder {
    /// Sets the project for the [`Builder`].
    pub fn project(mut self, project: GcpString) -> Self {
        self.project = Some(project);
        self
    }

    /// Sets the region for the [`Builder`].
    pub fn region(mut self, region: GcpString) -> Self {
        self.region = Some(region);
        self
    }

    /// Sets the zone for the [`Builder`].
    pub fn zone(mut self, zone: GcpString) -> Self {
        self.zone = Some(zone);
        self
    }

    /// Sets the network for the [`Builder`].
    pub fn network(mut self, network: GcpString) -> Self {
        self.network = Some(network);
        self
    }

    /// Sets the subnetwork for the [`Builder`].
    pub fn subnetwork(mut self, subnetwork: GcpString) -> Self {
        self.subnetwork = Some(subnetwork);
        self
    }

    /// Consumes `self` and attempts to build a [`Config`].
    pub fn try_build(self) -> Result<Config> {
        Ok(Config {
            project: self.project.ok_or(Error::Missing(PROJECT))?,
            region: self.region.ok_or(Error::Missing(REGION))?,
            zone: self.zone.ok_or(Error::Missing(ZONE))?,
            network: self.network,
            subnetwork: self.subnetwork,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> Config {
        Config::builder()
            .project("test-project".parse().unwrap())
            .region("test-region".parse().unwrap())
            .zone("test-zone".parse().unwrap())
            .try_build()
            .unwrap()
    }

    #[test]
    fn defaults() {
        let config = config();
        assert_eq!(config.project(), "test-project");
        assert_eq!(config.region(), "test-region");
        assert_eq!(config.zone(), "test-zone");
        assert!(config.network().is_none());
        assert!(config.subnetwork().is_none());

        let mut issues = Issues::default();
        config.validate(&mut issues, Command::Submit);
        assert!(issues.is_empty());
    }

    #[test]
    fn network_and_subnetwork_are_paired() {
        let mut config = config();

        config.set_network(Some("some-network".parse().unwrap()));
        let mut issues = Issues::default();
        config.validate(&mut issues, Command::Submit);
        assert_eq!(issues.len(), 1);
        assert!(issues.to_string().contains("gcp-network and gcp-subnetwork"));

        config.set_network(None);
        config.set_subnetwork(Some("subnet".parse().unwrap()));
        let mut issues = Issues::default();
        config.validate(&mut issues, Command::Submit);
        assert!(issues.to_string().contains("gcp-network and gcp-subnetwork"));

        config.set_network(Some("some-network".parse().unwrap()));
        let mut issues = Issues::default();
        config.validate(&mut issues, Command::Submit);
        assert!(issues.is_empty());
    }

    #[test]
    fn from_sections() {
        let sections = Sections::new().with_section(
            SECTION,
            [
                (PROJECT, "test-project"),
                (REGION, "test-region"),
                (ZONE, "test-zone"),
                (NETWORK, "network"),
                (SUBNETWORK, "subnet"),
            ],
        );

        let config = Config::from_sections(&sections).unwrap();
        assert_eq!(config.project(), "test-project");
        assert_eq!(config.network().unwrap(), "network");
        assert_eq!(config.subnetwork().unwrap(), "subnet");

        let mut issues = Issues::default();
        config.validate(&mut issues, Command::Submit);
        assert!(issues.is_empty());
    }

    #[test]
    fn from_sections_reports_missing_parameters() {
        let message = Config::from_sections(&Sections::new())
            .unwrap_err()
            .to_string();

        for key in [PROJECT, REGION, ZONE] {
            assert!(message.contains(&format!("Missing {key}")), "{message}");
        }
    }

    #[test]
    fn from_sections_reports_every_invalid_value() {
        let entries = [
            (PROJECT, "inval!d-PROJECT"),
            (REGION, "invalie-rEg!on"),
            (ZONE, "inavlid-zone-@#$"),
        ];
        let sections = Sections::new().with_section(SECTION, entries);

        let message = Config::from_sections(&sections).unwrap_err().to_string();
        let lines = message.lines().collect::<Vec<_>>();
        assert_eq!(lines.len(), 3);

        for (key, value) in entries {
            assert!(lines
                .iter()
                .any(|line| line.contains(key)
                    && line.contains("invalid value")
                    && line.contains(value)));
        }
    }
}
