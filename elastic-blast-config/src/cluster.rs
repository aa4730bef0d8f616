//! Configuration related to the compute cluster.

use std::cell::OnceCell;

use serde::Deserialize;
use serde::Serialize;
use tracing::debug;

mod builder;
pub mod labels;
pub mod name;

pub use builder::Builder;
pub(crate) use builder::SCHEMA;

use crate::machine;
use crate::machine::InstanceProperties;
use crate::machine::MachineResolver;
use crate::provider::Cloud;
use crate::value::CloudUri;
use crate::value::MemorySize;
use crate::Command;
use crate::Error;
use crate::Issues;
use crate::Result;

/// The name of the section holding cluster parameters.
pub const SECTION: &str = "cluster";

/// The key for the cluster name.
pub const NAME: &str = "name";

/// The key for the machine type.
pub const MACHINE_TYPE: &str = "machine-type";

/// The key for the number of nodes.
pub const NUM_NODES: &str = "num-nodes";

/// The key for the number of CPUs per job.
pub const NUM_CPUS: &str = "num-cpus";

/// The key for the persistent disk size.
pub const PD_SIZE: &str = "pd-size";

/// The key for the use of preemptible (spot) nodes.
pub const USE_PREEMPTIBLE: &str = "use-preemptible";

/// The key for the disk type.
pub const DISK_TYPE: &str = "disk-type";

/// The key for the provisioned disk IOPS.
pub const PROVISIONED_IOPS: &str = "provisioned-iops";

/// The key for the spot bid percentage.
pub const BID_PERCENTAGE: &str = "bid-percentage";

/// The key for the labels.
pub const LABELS: &str = "labels";

/// The key for the use of local SSDs.
pub const EXP_USE_LOCAL_SSD: &str = "exp-use-local-ssd";

/// The key for enabling stackdriver monitoring.
pub const ENABLE_STACKDRIVER: &str = "enable-stackdriver";

/// The key for a dry run.
pub const DRY_RUN: &str = "dry-run";

/// The default number of nodes.
pub const DEFAULT_NUM_NODES: u32 = 1;

/// Per-provider cluster defaults.
#[derive(Clone, Copy, Debug)]
pub struct Defaults {
    /// The machine type.
    pub machine_type: &'static str,

    /// The persistent disk size.
    pub pd_size: &'static str,

    /// The disk type.
    pub disk_type: &'static str,

    /// The spot bid percentage.
    pub bid_percentage: Option<u8>,
}

impl Defaults {
    /// Gets the defaults for `cloud`.
    pub fn of(cloud: Cloud) -> Self {
        match cloud {
            Cloud::Gcp => Self {
                machine_type: "n1-highmem-32",
                pd_size: "3000G",
                disk_type: "pd-standard",
                bid_percentage: None,
            },
            Cloud::Aws => Self {
                machine_type: "m5.8xlarge",
                pd_size: "1000G",
                disk_type: "gp3",
                bid_percentage: Some(100),
            },
        }
    }
}

/// A configuration object for the compute cluster.
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct Config {
    /// The provider the cluster runs on.
    cloud: Cloud,

    /// The cluster name.
    name: String,

    /// The machine type of the nodes.
    machine_type: String,

    /// The number of nodes.
    num_nodes: u32,

    /// The number of CPUs per job (all CPUs of a node if unset).
    num_cpus: Option<u32>,

    /// The persistent disk size.
    pd_size: MemorySize,

    /// The disk type.
    disk_type: String,

    /// The provisioned disk IOPS.
    iops: Option<u32>,

    /// Whether or not preemptible (spot) nodes are used.
    use_preemptible: bool,

    /// The spot bid percentage.
    bid_percentage: Option<u8>,

    /// The labels.
    labels: Option<String>,

    /// Whether or not local SSDs are used.
    use_local_ssd: bool,

    /// Whether or not stackdriver monitoring is enabled.
    enable_stackdriver: bool,

    /// Whether or not this is a dry run.
    dry_run: bool,

    /// The results location.
    results: CloudUri,

    /// The resolved capacity of the machine type.
    #[serde(skip)]
    instance: OnceCell<InstanceProperties>,
}

impl Config {
    /// Gets a default [`Builder`] for a [`Config`].
    pub fn builder() -> Builder {
        Builder::default()
    }

    /// Gets the provider the cluster runs on.
    pub fn cloud(&self) -> Cloud {
        self.cloud
    }

    /// Gets the cluster name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Gets the machine type of the nodes.
    pub fn machine_type(&self) -> &str {
        &self.machine_type
    }

    /// Gets the number of nodes.
    pub fn num_nodes(&self) -> u32 {
        self.num_nodes
    }

    /// Gets the number of CPUs per job.
    pub fn num_cpus(&self) -> Option<u32> {
        self.num_cpus
    }

    /// Gets the persistent disk size.
    pub fn pd_size(&self) -> &MemorySize {
        &self.pd_size
    }

    /// Gets the disk type.
    pub fn disk_type(&self) -> &str {
        &self.disk_type
    }

    /// Gets the provisioned disk IOPS.
    pub fn iops(&self) -> Option<u32> {
        self.iops
    }

    /// Whether or not preemptible (spot) nodes are used.
    pub fn use_preemptible(&self) -> bool {
        self.use_preemptible
    }

    /// Gets the spot bid percentage.
    pub fn bid_percentage(&self) -> Option<u8> {
        self.bid_percentage
    }

    /// Gets the labels.
    pub fn labels(&self) -> Option<&str> {
        self.labels.as_deref()
    }

    /// Whether or not local SSDs are used.
    pub fn use_local_ssd(&self) -> bool {
        self.use_local_ssd
    }

    /// Whether or not stackdriver monitoring is enabled.
    pub fn enable_stackdriver(&self) -> bool {
        self.enable_stackdriver
    }

    /// Whether or not this is a dry run.
    pub fn dry_run(&self) -> bool {
        self.dry_run
    }

    /// Gets the results location.
    pub fn results(&self) -> &CloudUri {
        &self.results
    }

    /// Gets the capacity of the machine type, resolving it with `machines` the
    /// first time it is needed.
    ///
    /// The resolved capacity is kept for the lifetime of the configuration (or
    /// until the machine type changes), so every consumer sees the same value.
    pub fn instance_properties(
        &self,
        machines: &dyn MachineResolver,
    ) -> Result<InstanceProperties> {
        if let Some(properties) = self.instance.get() {
            return Ok(*properties);
        }

        let properties = machines.resolve(&self.machine_type, self.cloud)?;
        debug!(
            "machine type `{}` has {} CPUs and {}GB of RAM",
            self.machine_type,
            properties.cpus(),
            properties.memory()
        );

        Ok(*self.instance.get_or_init(|| properties))
    }

    /// Sets the machine type of the nodes.
    pub fn set_machine_type(&mut self, machine_type: impl Into<String>) {
        self.machine_type = machine_type.into();
        self.instance = OnceCell::new();
    }

    /// Sets the number of nodes.
    pub fn set_num_nodes(&mut self, num_nodes: u32) {
        self.num_nodes = num_nodes;
    }

    /// Sets the number of CPUs per job.
    pub fn set_num_cpus(&mut self, num_cpus: Option<u32>) {
        self.num_cpus = num_cpus;
    }

    /// Sets the spot bid percentage.
    pub fn set_bid_percentage(&mut self, bid_percentage: Option<u8>) {
        self.bid_percentage = bid_percentage;
    }

    /// Sets the labels.
    pub fn set_labels(&mut self, labels: Option<String>) {
        self.labels = labels;
    }

    /// Sets whether or not local SSDs are used.
    pub fn set_use_local_ssd(&mut self, use_local_ssd: bool) {
        self.use_local_ssd = use_local_ssd;
    }

    /// Validates the configuration, appending any problems to `issues`.
    ///
    /// Requesting local SSDs fails immediately with
    /// [`Error::Unimplemented`].
    pub fn validate(&self, issues: &mut Issues, _: Command) -> Result<()> {
        if self.use_local_ssd {
            return Err(Error::Unimplemented("Local SSD storage"));
        }

        if !machine::is_supported(&self.machine_type) {
            issues.violation(format!(
                "Machine type \"{}\" is not supported by ElasticBLAST. Please select a machine \
                 type with an x86 processor",
                self.machine_type
            ));
        }

        if self.num_nodes == 0 {
            issues.violation(format!("Parameter \"{NUM_NODES}\" must be greater than zero"));
        }

        if self.num_cpus == Some(0) {
            issues.violation(format!("Parameter \"{NUM_CPUS}\" must be greater than zero"));
        }

        if let Some(bid) = self.bid_percentage.filter(|bid| *bid > 100) {
            issues.violation(format!(
                "Parameter \"{BID_PERCENTAGE}\" must be between 0 and 100, got {bid}"
            ));
        }

        if self.results.cloud() != self.cloud {
            issues.violation(format!(
                "Results location \"{}\" must be a {} bucket",
                self.results, self.cloud
            ));
        }

        if let Some(labels) = &self.labels {
            labels::validate(labels, issues);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blast;
    use crate::machine::Table;
    use crate::section::Sections;

    fn config(cloud: Cloud, results: &str) -> Config {
        Config::builder()
            .results(results.parse().unwrap())
            .try_build(cloud)
            .unwrap()
    }

    #[test]
    fn gcp_defaults() {
        let config = config(Cloud::Gcp, "gs://test-results");
        assert!(config.name().starts_with(name::PREFIX));
        assert_eq!(config.machine_type(), "n1-highmem-32");
        assert_eq!(config.pd_size(), "3000G");
        assert_eq!(config.disk_type(), "pd-standard");
        assert_eq!(config.num_nodes(), DEFAULT_NUM_NODES);
        assert!(config.num_cpus().is_none());
        assert_eq!(config.results(), "gs://test-results");
        assert!(config.bid_percentage().is_none());
        assert!(!config.use_preemptible());
        assert!(config.iops().is_none());
        assert!(config.labels().is_none());
        assert!(!config.use_local_ssd());
        assert!(!config.enable_stackdriver());

        let mut issues = Issues::default();
        config.validate(&mut issues, Command::Submit).unwrap();
        assert!(issues.is_empty());
    }

    #[test]
    fn aws_defaults() {
        let config = config(Cloud::Aws, "s3://test-results");
        assert_eq!(config.machine_type(), "m5.8xlarge");
        assert_eq!(config.pd_size(), "1000G");
        assert_eq!(config.disk_type(), "gp3");
        assert_eq!(config.bid_percentage(), Some(100));

        let mut issues = Issues::default();
        config.validate(&mut issues, Command::Submit).unwrap();
        assert!(issues.is_empty());
    }

    #[test]
    fn arm_machine_types_are_unsupported() {
        let mut config = config(Cloud::Aws, "s3://test-results");
        config.set_machine_type("r6gd.8xlarge");

        let mut issues = Issues::default();
        config.validate(&mut issues, Command::Submit).unwrap();
        let first = issues.iter().next().unwrap();
        assert!(first.message().contains("not supported by ElasticBLAST"));
        assert!(first.message().contains("r6gd.8xlarge"));
    }

    #[test]
    fn local_ssd_is_not_implemented() {
        let mut config = config(Cloud::Gcp, "gs://test-results");
        config.set_use_local_ssd(true);

        let mut issues = Issues::default();
        let err = config.validate(&mut issues, Command::Submit).unwrap_err();
        assert!(matches!(err, Error::Unimplemented(_)));
        assert!(issues.is_empty());
    }

    #[test]
    fn cross_field_rules() {
        let mut config = config(Cloud::Aws, "gs://test-results");
        config.set_num_nodes(0);
        config.set_bid_percentage(Some(120));
        config.set_labels(Some(String::from("Bad Label")));

        let mut issues = Issues::default();
        config.validate(&mut issues, Command::Submit).unwrap();
        let message = issues.to_string();
        assert_eq!(issues.len(), 4, "{message}");
        assert!(message.contains(NUM_NODES));
        assert!(message.contains(BID_PERCENTAGE));
        assert!(message.contains("must be a AWS bucket"));
        assert!(message.contains("Bad Label"));
    }

    #[test]
    fn instance_properties_are_resolved_once() {
        let mut config = config(Cloud::Aws, "s3://test-results");

        let table = Table::default().with("m5.8xlarge", InstanceProperties::new(32, 128.0));
        assert_eq!(config.instance_properties(&table).unwrap().cpus(), 32);

        // The memoized value is used even though the table cannot answer.
        let empty = Table::default();
        assert_eq!(config.instance_properties(&empty).unwrap().cpus(), 32);

        config.set_machine_type("m5.large");
        assert!(matches!(
            config.instance_properties(&empty),
            Err(Error::Machine(_))
        ));
    }

    #[test]
    fn from_sections() {
        let sections = Sections::new()
            .with_section(
                SECTION,
                [
                    (NAME, "test-name"),
                    (MACHINE_TYPE, "test-machine-type"),
                    (PD_SIZE, "200G"),
                    (NUM_CPUS, "10"),
                    (NUM_NODES, "5000"),
                    (USE_PREEMPTIBLE, "Yes"),
                    (DISK_TYPE, "test-disk-type"),
                    (PROVISIONED_IOPS, "987"),
                    (BID_PERCENTAGE, "45"),
                    (LABELS, "team=search"),
                    (EXP_USE_LOCAL_SSD, "yes"),
                    (ENABLE_STACKDRIVER, "true"),
                ],
            )
            .with_section(blast::SECTION, [(blast::RESULTS, "s3://test-bucket")]);

        let config = Config::from_sections(&sections, Cloud::Aws).unwrap();
        assert_eq!(config.name(), "test-name");
        assert_eq!(config.machine_type(), "test-machine-type");
        assert_eq!(config.pd_size(), "200G");
        assert_eq!(config.num_cpus(), Some(10));
        assert_eq!(config.num_nodes(), 5000);
        assert!(config.use_preemptible());
        assert_eq!(config.disk_type(), "test-disk-type");
        assert_eq!(config.iops(), Some(987));
        assert_eq!(config.bid_percentage(), Some(45));
        assert_eq!(config.labels(), Some("team=search"));
        assert!(config.use_local_ssd());
        assert!(config.enable_stackdriver());
        assert_eq!(config.results(), "s3://test-bucket");

        let mut issues = Issues::default();
        assert!(matches!(
            config.validate(&mut issues, Command::Submit),
            Err(Error::Unimplemented(_))
        ));
        assert!(issues.is_empty());
    }

    #[test]
    fn from_sections_reports_missing_results() {
        let err = Config::from_sections(&Sections::new(), Cloud::Aws).unwrap_err();
        assert!(err.to_string().contains("Missing results"));
    }

    #[test]
    fn from_sections_reports_every_invalid_value() {
        let entries = [(NUM_CPUS, "-25"), (NUM_NODES, "abc"), (BID_PERCENTAGE, "101")];
        let sections = Sections::new()
            .with_section(SECTION, entries)
            .with_section(blast::SECTION, [(blast::RESULTS, "s3://test-bucket")]);

        let message = Config::from_sections(&sections, Cloud::Aws)
            .unwrap_err()
            .to_string();
        let lines = message.lines().collect::<Vec<_>>();
        assert_eq!(lines.len(), 3);

        for (key, value) in entries {
            assert!(lines.iter().any(|line| line.contains(key)
                && line.contains("invalid value")
                && line.contains(value)));
        }
    }
}
