//! Builders for [configuration objects](Config).

use std::sync::Arc;

use crate::blast;
use crate::cluster;
use crate::database::DatabaseResolver;
use crate::machine::Catalog;
use crate::machine::MachineResolver;
use crate::provider::aws;
use crate::provider::gcp;
use crate::provider::SECTION as PROVIDER;
use crate::section::Sections;
use crate::Command;
use crate::Config;
use crate::Error;
use crate::Result;

/// The message reported when a configuration is built without a task.
const MISSING_TASK: &str = "task parameter must be specified";

/// The message reported when both construction forms are mixed.
const MIXED_FORMS: &str = "ElasticBLAST configuration must be created with either two arguments, \
                           a parsed section mapping and a task, or explicit parameters with a \
                           task";

/// A builder for a [configuration object](Config).
///
/// A configuration is either built from a parsed section mapping (see
/// [`sections()`](Builder::sections)) or from explicit parameters, and always
/// needs a [task](Builder::task). Explicit parameters are checked by the same
/// rules as parameters read from a file.
#[derive(Debug, Default)]
pub struct Builder {
    /// A parsed section mapping.
    sections: Option<Sections>,

    /// The explicit parameters, keyed by the section and key they would be
    /// read from.
    explicit: Sections,

    /// The task.
    task: Option<Command>,

    /// The machine type resolver.
    machines: Option<Arc<dyn MachineResolver>>,

    /// The database metadata resolver.
    databases: Option<Arc<dyn DatabaseResolver>>,
}

/// Generates explicit parameter setters.
macro_rules! explicit {
    ($($(#[$meta:meta])* $name:ident => ($section:expr, $key:expr)),+ $(,)?) => {
        impl Builder {
            $(
                $(#[$meta])*
                pub fn $name(mut self, value: impl ToString) -> Self {
                    self.explicit.insert($section, $key, value.to_string());
                    self
                }
            )+
        }
    };
}

explicit! {
    /// Sets the GCP project.
    gcp_project => (PROVIDER, gcp::PROJECT),
    /// Sets the GCP region.
    gcp_region => (PROVIDER, gcp::REGION),
    /// Sets the GCP zone.
    gcp_zone => (PROVIDER, gcp::ZONE),
    /// Sets the GCP network.
    gcp_network => (PROVIDER, gcp::NETWORK),
    /// Sets the GCP subnetwork.
    gcp_subnetwork => (PROVIDER, gcp::SUBNETWORK),
    /// Sets the AWS region.
    aws_region => (PROVIDER, aws::REGION),
    /// Sets the AWS VPC.
    aws_vpc => (PROVIDER, aws::VPC),
    /// Sets the AWS subnet.
    aws_subnet => (PROVIDER, aws::SUBNET),
    /// Sets the AWS security group.
    aws_security_group => (PROVIDER, aws::SECURITY_GROUP),
    /// Sets the AWS EC2 key pair.
    aws_key_pair => (PROVIDER, aws::KEY_PAIR),
    /// Sets the AWS IAM role of the search jobs.
    aws_job_role => (PROVIDER, aws::JOB_ROLE),
    /// Sets the AWS IAM role of the compute instances.
    aws_instance_role => (PROVIDER, aws::INSTANCE_ROLE),
    /// Sets the AWS IAM role of the batch service.
    aws_batch_service_role => (PROVIDER, aws::BATCH_SERVICE_ROLE),
    /// Sets the AWS IAM role of the spot fleet.
    aws_spot_fleet_role => (PROVIDER, aws::SPOT_FLEET_ROLE),
    /// Sets the search program.
    program => (blast::SECTION, blast::PROGRAM),
    /// Sets the database.
    db => (blast::SECTION, blast::DB),
    /// Sets the queries.
    queries => (blast::SECTION, blast::QUERIES),
    /// Sets the results location.
    results => (blast::SECTION, blast::RESULTS),
    /// Sets the program options.
    options => (blast::SECTION, blast::OPTIONS),
    /// Sets the number of query residues per batch.
    batch_len => (blast::SECTION, blast::BATCH_LEN),
    /// Sets the memory request per job.
    mem_request => (blast::SECTION, blast::MEM_REQUEST),
    /// Sets the memory limit per job.
    mem_limit => (blast::SECTION, blast::MEM_LIMIT),
    /// Sets the provider hosting the database catalog.
    db_source => (blast::SECTION, blast::DB_SOURCE),
    /// Sets the taxonomy filter file.
    taxidlist => (blast::SECTION, blast::TAXIDLIST),
    /// Sets the database memory margin (in percent).
    db_mem_margin => (blast::SECTION, blast::DB_MEM_MARGIN),
    /// Sets the cluster name.
    cluster_name => (cluster::SECTION, cluster::NAME),
    /// Sets the machine type.
    machine_type => (cluster::SECTION, cluster::MACHINE_TYPE),
    /// Sets the number of nodes.
    num_nodes => (cluster::SECTION, cluster::NUM_NODES),
    /// Sets the number of CPUs per job.
    num_cpus => (cluster::SECTION, cluster::NUM_CPUS),
    /// Sets the persistent disk size.
    pd_size => (cluster::SECTION, cluster::PD_SIZE),
    /// Sets whether or not preemptible (spot) nodes are used.
    use_preemptible => (cluster::SECTION, cluster::USE_PREEMPTIBLE),
    /// Sets the disk type.
    disk_type => (cluster::SECTION, cluster::DISK_TYPE),
    /// Sets the provisioned disk IOPS.
    provisioned_iops => (cluster::SECTION, cluster::PROVISIONED_IOPS),
    /// Sets the spot bid percentage.
    bid_percentage => (cluster::SECTION, cluster::BID_PERCENTAGE),
    /// Sets the labels.
    labels => (cluster::SECTION, cluster::LABELS),
    /// Sets whether or not local SSDs are used.
    use_local_ssd => (cluster::SECTION, cluster::EXP_USE_LOCAL_SSD),
    /// Sets whether or not stackdriver monitoring is enabled.
    enable_stackdriver => (cluster::SECTION, cluster::ENABLE_STACKDRIVER),
    /// Sets whether or not this is a dry run.
    dry_run => (cluster::SECTION, cluster::DRY_RUN),
}

impl Builder {
    /// Sets the parsed section mapping for the [`Builder`].
    ///
    /// # Notes
    ///
    /// This will silently overwrite any previous section mapping set within
    /// the builder.
    pub fn sections(mut self, sections: Sections) -> Self {
        self.sections = Some(sections);
        self
    }

    /// Sets the task for the [`Builder`].
    pub fn task(mut self, task: Command) -> Self {
        self.task = Some(task);
        self
    }

    /// Sets the machine type resolver for the [`Builder`].
    ///
    /// # Notes
    ///
    /// When unset, machine types are resolved by the static [`Catalog`].
    pub fn machines(mut self, machines: impl MachineResolver + 'static) -> Self {
        self.machines = Some(Arc::new(machines));
        self
    }

    /// Sets the database metadata resolver for the [`Builder`].
    ///
    /// # Notes
    ///
    /// When unset, database metadata is not checked during validation.
    pub fn databases(mut self, databases: impl DatabaseResolver + 'static) -> Self {
        self.databases = Some(Arc::new(databases));
        self
    }

    /// Consumes `self` and attempts to build a [`Config`].
    pub fn try_build(self) -> Result<Config> {
        let task = self
            .task
            .ok_or_else(|| Error::Usage(String::from(MISSING_TASK)))?;

        let sections = match self.sections {
            Some(_) if !self.explicit.is_empty() => {
                return Err(Error::Usage(String::from(MIXED_FORMS)))
            }
            Some(sections) => sections,
            None => self.explicit,
        };

        let machines = self.machines.unwrap_or_else(|| Arc::new(Catalog));
        Config::assemble(&sections, task, machines, self.databases)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Category;

    #[test]
    fn a_task_is_required() {
        let err = Builder::default().try_build().unwrap_err();
        assert!(matches!(err, Error::Usage(_)));
        assert!(err.to_string().contains(MISSING_TASK));

        let err = Builder::default()
            .sections(Sections::new())
            .results("s3://results")
            .try_build()
            .unwrap_err();
        assert!(err.to_string().contains(MISSING_TASK));

        let err = Builder::default()
            .aws_region("some-region")
            .results("s3://results")
            .try_build()
            .unwrap_err();
        assert!(err.to_string().contains(MISSING_TASK));
    }

    #[test]
    fn forms_cannot_be_mixed() {
        let err = Builder::default()
            .sections(Sections::new())
            .results("s3://results")
            .task(Command::Submit)
            .try_build()
            .unwrap_err();

        assert_eq!(err.category(), Category::Input);
        assert!(err.to_string().contains("either two arguments"));
        assert!(err.to_string().contains("parsed section mapping"));
    }
}
