//! Builders for [cluster configuration objects](Config).

use std::cell::OnceCell;

use tracing::debug;

use crate::blast;
use crate::cluster::name::Alphanumeric;
use crate::cluster::name::Generator as _;
use crate::cluster::Config;
use crate::cluster::Defaults;
use crate::cluster::BID_PERCENTAGE;
use crate::cluster::DEFAULT_NUM_NODES;
use crate::cluster::DISK_TYPE;
use crate::cluster::DRY_RUN;
use crate::cluster::ENABLE_STACKDRIVER;
use crate::cluster::EXP_USE_LOCAL_SSD;
use crate::cluster::LABELS;
use crate::cluster::MACHINE_TYPE;
use crate::cluster::NAME;
use crate::cluster::NUM_CPUS;
use crate::cluster::NUM_NODES;
use crate::cluster::PD_SIZE;
use crate::cluster::PROVISIONED_IOPS;
use crate::cluster::SECTION;
use crate::cluster::USE_PREEMPTIBLE;
use crate::provider::Cloud;
use crate::section::reconcile;
use crate::section::Param;
use crate::section::Sections;
use crate::value::parse_flag;
use crate::value::parse_positive;
use crate::value::CloudUri;
use crate::value::MemorySize;
use crate::Error;
use crate::Issues;
use crate::Result;

/// Parses a strictly positive count that fits in 32 bits.
fn parse_count(value: &str) -> Result<u32> {
    u32::try_from(parse_positive(value)?)
        .map_err(|_| Error::invalid(value, "expected a positive integer below 2^32"))
}

/// Parses a percentage between 0 and 100.
fn parse_percentage(value: &str) -> Result<u8> {
    value
        .trim()
        .parse::<u8>()
        .ok()
        .filter(|percentage| *percentage <= 100)
        .ok_or_else(|| Error::invalid(value, "expected an integer between 0 and 100"))
}

/// The parameters a cluster reads from the `cluster` section, plus the results
/// location from the `blast` section.
pub(crate) static SCHEMA: &[Param<Builder>] = &[
    Param::required(blast::SECTION, blast::RESULTS, |builder, value| {
        builder.results = Some(value.parse()?);
        Ok(())
    }),
    Param::optional(SECTION, NAME, |builder, value| {
        builder.name = Some(value.to_string());
        Ok(())
    }),
    Param::optional(SECTION, MACHINE_TYPE, |builder, value| {
        builder.machine_type = Some(value.to_string());
        Ok(())
    }),
    Param::optional(SECTION, NUM_NODES, |builder, value| {
        builder.num_nodes = Some(parse_count(value)?);
        Ok(())
    }),
    Param::optional(SECTION, NUM_CPUS, |builder, value| {
        builder.num_cpus = Some(parse_count(value)?);
        Ok(())
    }),
    Param::optional(SECTION, PD_SIZE, |builder, value| {
        builder.pd_size = Some(value.parse()?);
        Ok(())
    }),
    Param::optional(SECTION, USE_PREEMPTIBLE, |builder, value| {
        builder.use_preemptible = Some(parse_flag(value)?);
        Ok(())
    }),
    Param::optional(SECTION, DISK_TYPE, |builder, value| {
        builder.disk_type = Some(value.to_string());
        Ok(())
    }),
    Param::optional(SECTION, PROVISIONED_IOPS, |builder, value| {
        builder.iops = Some(parse_count(value)?);
        Ok(())
    }),
    Param::optional(SECTION, BID_PERCENTAGE, |builder, value| {
        builder.bid_percentage = Some(parse_percentage(value)?);
        Ok(())
    }),
    Param::optional(SECTION, LABELS, |builder, value| {
        builder.labels = Some(value.to_string());
        Ok(())
    }),
    Param::optional(SECTION, EXP_USE_LOCAL_SSD, |builder, value| {
        builder.use_local_ssd = Some(parse_flag(value)?);
        Ok(())
    }),
    Param::optional(SECTION, ENABLE_STACKDRIVER, |builder, value| {
        builder.enable_stackdriver = Some(parse_flag(value)?);
        Ok(())
    }),
    Param::optional(SECTION, DRY_RUN, |builder, value| {
        builder.dry_run = Some(parse_flag(value)?);
        Ok(())
    }),
];

/// A builder for a [cluster configuration object](Config).
#[derive(Debug, Default)]
pub struct Builder {
    /// The cluster name.
    name: Option<String>,

    /// The machine type of the nodes.
    machine_type: Option<String>,

    /// The number of nodes.
    num_nodes: Option<u32>,

    /// The number of CPUs per job.
    num_cpus: Option<u32>,

    /// The persistent disk size.
    pd_size: Option<MemorySize>,

    /// The disk type.
    disk_type: Option<String>,

    /// The provisioned disk IOPS.
    iops: Option<u32>,

    /// Whether or not preemptible (spot) nodes are used.
    use_preemptible: Option<bool>,

    /// The spot bid percentage.
    bid_percentage: Option<u8>,

    /// The labels.
    labels: Option<String>,

    /// Whether or not local SSDs are used.
    use_local_ssd: Option<bool>,

    /// Whether or not stackdriver monitoring is enabled.
    enable_stackdriver: Option<bool>,

    /// Whether or not this is a dry run.
    dry_run: Option<bool>,

    /// The results location.
    results: Option<CloudUri>,
}

impl Builder {
    /// Reads the cluster parameters of `sections` into a [`Builder`].
    ///
    /// Every missing or invalid parameter is reported in the returned error.
    pub fn from_sections(sections: &Sections) -> Result<Self> {
        let mut builder = Self::default();
        let mut issues = Issues::default();
        reconcile(sections, SCHEMA, &mut builder, &mut issues);
        issues.into_result(builder)
    }

    /// Sets the cluster name for the [`Builder`].
    ///
    /// # Notes
    ///
    /// A unique name is generated if none is set.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Sets the machine type for the [`Builder`].
    pub fn machine_type(mut self, machine_type: impl Into<String>) -> Self {
        self.machine_type = Some(machine_type.into());
        self
    }

    /// Sets the number of nodes for the [`Builder`].
    pub fn num_nodes(mut self, num_nodes: u32) -> Self {
        self.num_nodes = Some(num_nodes);
        self
    }

    /// Sets the number of CPUs per job for the [`Builder`].
    pub fn num_cpus(mut self, num_cpus: u32) -> Self {
        self.num_cpus = Some(num_cpus);
        self
    }

    /// Sets the persistent disk size for the [`Builder`].
    pub fn pd_size(mut self, pd_size: MemorySize) -> Self {
        self.pd_size = Some(pd_size);
        self
    }

    /// Sets the disk type for the [`Builder`].
    pub fn disk_type(mut self, disk_type: impl Into<String>) -> Self {
        self.disk_type = Some(disk_type.into());
        self
    }

    /// Sets the provisioned disk IOPS for the [`Builder`].
    pub fn iops(mut self, iops: u32) -> Self {
        self.iops = Some(iops);
        self
    }

    /// Sets whether or not preemptible (spot) nodes are used for the
    /// [`Builder`].
    pub fn use_preemptible(mut self, use_preemptible: bool) -> Self {
        self.use_preemptible = Some(use_preemptible);
        self
    }

    /// Sets the spot bid percentage for the [`Builder`].
    pub fn bid_percentage(mut self, bid_percentage: u8) -> Self {
        self.bid_percentage = Some(bid_percentage);
        self
    }

    /// Sets the labels for the [`Builder`].
    pub fn labels(mut self, labels: impl Into<String>) -> Self {
        self.labels = Some(labels.into());
        self
    }

    /// Sets whether or not local SSDs are used for the [`Builder`].
    pub fn use_local_ssd(mut self, use_local_ssd: bool) -> Self {
        self.use_local_ssd = Some(use_local_ssd);
        self
    }

    /// Sets whether or not stackdriver monitoring is enabled for the
    /// [`Builder`].
    pub fn enable_stackdriver(mut self, enable_stackdriver: bool) -> Self {
        self.enable_stackdriver = Some(enable_stackdriver);
        self
    }

    /// Sets whether or not this is a dry run for the [`Builder`].
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = Some(dry_run);
        self
    }

    /// Sets the results location for the [`Builder`].
    pub fn results(mut self, results: CloudUri) -> Self {
        self.results = Some(results);
        self
    }

    /// Consumes `self` and attempts to build a [`Config`] for a cluster on
    /// `cloud`.
    ///
    /// Unset values take the defaults of `cloud`.
    pub fn try_build(self, cloud: Cloud) -> Result<Config> {
        let results = self.results.ok_or(Error::Missing(blast::RESULTS))?;
        let defaults = Defaults::of(cloud);

        let name = self
            .name
            .unwrap_or_else(|| Alphanumeric::default().generate());
        let machine_type = self.machine_type.unwrap_or_else(|| {
            debug!("using the default machine type `{}`", defaults.machine_type);
            defaults.machine_type.to_string()
        });
        let pd_size = match self.pd_size {
            Some(pd_size) => pd_size,
            None => defaults.pd_size.parse()?,
        };

        Ok(Config {
            cloud,
            name,
            machine_type,
            num_nodes: self.num_nodes.unwrap_or(DEFAULT_NUM_NODES),
            num_cpus: self.num_cpus,
            pd_size,
            disk_type: self
                .disk_type
                .unwrap_or_else(|| defaults.disk_type.to_string()),
            iops: self.iops,
            use_preemptible: self.use_preemptible.unwrap_or_default(),
            bid_percentage: self.bid_percentage.or(defaults.bid_percentage),
            labels: self.labels,
            use_local_ssd: self.use_local_ssd.unwrap_or_default(),
            enable_stackdriver: self.enable_stackdriver.unwrap_or_default(),
            dry_run: self.dry_run.unwrap_or_default(),
            results,
            instance: OnceCell::new(),
        })
    }
}

impl Config {
    /// Reads a [`Config`] for a cluster on `cloud` from `sections`.
    pub fn from_sections(sections: &Sections, cloud: Cloud) -> Result<Self> {
        Builder::from_sections(sections)?.try_build(cloud)
    }
}
