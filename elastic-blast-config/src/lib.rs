//! Configuration and resource planning for ElasticBLAST.
//!
//! A [`Config`] is put together either from explicit parameters set on a
//! [`Builder`] or from the flat section mapping of a configuration file
//! through [`Config::from_sections`]. Both paths run the same assembly.
//!
//! * Parameters read from a section mapping are checked against an explicit
//!   schema per configuration object, and every problem found is collected
//!   into [`Issues`] so that it can be reported in one pass.
//! * Once assembled, the cloud provider, workload and cluster are only
//!   patched through setters before a call to [`Config::validate()`].
//! * Collaborators that reach outside of the process (looking up machine types
//!   and database metadata) sit behind the [`MachineResolver`] and
//!   [`DatabaseResolver`] traits.

use std::sync::Arc;

use tracing::debug;

pub mod blast;
mod builder;
pub mod cluster;
mod command;
pub mod database;
mod error;
pub mod machine;
pub mod program;
pub mod provider;
pub mod section;
pub mod tuner;
pub mod value;

pub use builder::Builder;
pub use command::Command;
pub use database::DatabaseResolver;
pub use error::Category;
pub use error::Error;
pub use error::Issue;
pub use error::IssueKind;
pub use error::Issues;
pub use error::Result;
pub use machine::MachineResolver;
pub use section::Sections;

use crate::cluster::labels;
use crate::provider::aws;
use crate::provider::gcp;
use crate::provider::Cloud;
use crate::provider::Profile;
use crate::section::Param;

/// A global configuration object for ElasticBLAST.
///
/// A configuration is made of exactly one provider [profile](Profile), one
/// [workload](blast::Config) and one [cluster](cluster::Config).
///
/// Notably, a configuration object may not be valid. You'll need to use the
/// [`validate()`](Config::validate) method to ensure the config is valid.
#[derive(Clone, Debug)]
pub struct Config {
    /// The task the configuration was built for.
    task: Command,

    /// The cloud provider profile.
    provider: Profile,

    /// The workload.
    blast: blast::Config,

    /// The cluster.
    cluster: cluster::Config,

    /// The machine type resolver.
    machines: Arc<dyn MachineResolver>,

    /// The database metadata resolver.
    databases: Option<Arc<dyn DatabaseResolver>>,
}

impl Config {
    /// Gets a default [`Builder`] for a [`Config`].
    pub fn builder() -> Builder {
        Builder::default()
    }

    /// Builds a [`Config`] for `task` from a parsed section mapping, resolving
    /// machine types with the static [`Catalog`](machine::Catalog).
    pub fn from_sections(sections: Sections, task: Command) -> Result<Self> {
        Builder::default().sections(sections).task(task).try_build()
    }

    /// Gets every section and key that is part of the configuration schema.
    pub fn schema() -> impl Iterator<Item = (&'static str, &'static str)> {
        Profile::schema()
            .chain(blast::SCHEMA.iter().map(Param::location))
            .chain(cluster::SCHEMA.iter().map(Param::location))
    }

    /// Assembles the configuration from `sections`.
    ///
    /// Unrecognized sections and keys and every invalid parameter of every
    /// configuration object are reported together.
    fn assemble(
        sections: &Sections,
        task: Command,
        machines: Arc<dyn MachineResolver>,
        databases: Option<Arc<dyn DatabaseResolver>>,
    ) -> Result<Self> {
        let mut issues = Issues::default();
        sections.unrecognized(Self::schema(), &mut issues);

        let cloud = issues.absorb(Profile::detect(sections))?;
        let (provider, cluster) = match cloud {
            Some(cloud) => (
                issues.absorb(Profile::from_sections(cloud, sections))?,
                issues.absorb(cluster::Config::from_sections(sections, cloud))?,
            ),
            None => {
                // Parameters of the other sections are still checked.
                issues.absorb(cluster::Builder::from_sections(sections))?;
                (None, None)
            }
        };
        let blast = issues.absorb(blast::Builder::from_sections(sections))?;

        let (provider, mut cluster, blast) = match (provider, cluster, blast) {
            (Some(provider), Some(cluster), Some(blast)) if issues.is_empty() => {
                (provider, cluster, blast)
            }
            _ => return Err(issues.into_report(Category::Input)),
        };

        let instance = cluster.instance_properties(machines.as_ref())?;
        let blast = blast.try_build(provider.cloud(), instance, cluster.num_cpus())?;

        if cluster.labels().is_none() {
            let generated = labels::generate(&labels::Subject {
                cluster_name: cluster.name(),
                db: blast.db().as_str(),
                program: blast.program().as_str(),
                results: cluster.results().as_str(),
            });

            debug!("generated default labels `{generated}`");
            cluster.set_labels(Some(generated));
        }

        Ok(Self {
            task,
            provider,
            blast,
            cluster,
            machines,
            databases,
        })
    }

    /// Gets the task the configuration was built for.
    pub fn task(&self) -> Command {
        self.task
    }

    /// Gets the cloud provider.
    pub fn cloud(&self) -> Cloud {
        self.provider.cloud()
    }

    /// Gets the cloud provider profile.
    pub fn provider(&self) -> &Profile {
        &self.provider
    }

    /// Gets a mutable reference to the cloud provider profile.
    pub fn provider_mut(&mut self) -> &mut Profile {
        &mut self.provider
    }

    /// Attempts to return a reference to the GCP profile.
    pub fn gcp(&self) -> Option<&gcp::Config> {
        self.provider.as_gcp()
    }

    /// Attempts to return a reference to the AWS profile.
    pub fn aws(&self) -> Option<&aws::Config> {
        self.provider.as_aws()
    }

    /// Gets the workload.
    pub fn blast(&self) -> &blast::Config {
        &self.blast
    }

    /// Gets a mutable reference to the workload.
    pub fn blast_mut(&mut self) -> &mut blast::Config {
        &mut self.blast
    }

    /// Gets the cluster.
    pub fn cluster(&self) -> &cluster::Config {
        &self.cluster
    }

    /// Gets a mutable reference to the cluster.
    pub fn cluster_mut(&mut self) -> &mut cluster::Config {
        &mut self.cluster
    }

    /// Validates the configuration for `command`.
    ///
    /// The provider profile, the workload and the cluster are validated in
    /// that order, followed by the checks that span them. Every problem found
    /// is reported in one error. Requests for unimplemented features and
    /// unusable databases fail immediately.
    pub fn validate(&self, command: Command) -> Result<()> {
        let mut issues = Issues::default();
        self.provider.validate(&mut issues, command);

        let instance = self.cluster.instance_properties(self.machines.as_ref())?;
        let context = self.databases.as_deref().map(|databases| blast::Context {
            databases,
            machine_type: self.cluster.machine_type(),
            instance,
        });

        self.blast.validate(&mut issues, command, context)?;
        self.cluster.validate(&mut issues, command)?;

        if let Some(cpus) = self.cluster.num_cpus() {
            if cpus > instance.cpus() {
                issues.violation(format!(
                    "The number of CPUs requested per job \"{cpus}\" exceeds the number of CPUs \
                     \"{}\" available on machine type \"{}\". Please set {} to at most {}",
                    instance.cpus(),
                    self.cluster.machine_type(),
                    cluster::NUM_CPUS,
                    instance.cpus()
                ));
            }
        }

        if issues.is_empty() {
            Ok(())
        } else {
            Err(issues.into_report(Category::Input))
        }
    }

    /// Gets the maximum number of search jobs that run concurrently on the
    /// whole cluster.
    ///
    /// This is the number of jobs per node (sized against the same machine
    /// capacity used for the memory limits) times the number of nodes.
    pub fn max_number_of_concurrent_blast_jobs(&self) -> Result<u32> {
        let instance = self.cluster.instance_properties(self.machines.as_ref())?;
        let jobs_per_node = tuner::jobs_per_node(instance, self.cluster.num_cpus())?;
        Ok(jobs_per_node.saturating_mul(self.cluster.num_nodes()))
    }
}
