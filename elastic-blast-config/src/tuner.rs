//! Sizing of search jobs to the machines they run on.
//!
//! Given a machine's capacity and the number of CPUs each search job asks for,
//! the tuner decides how many jobs fit on one node and how much memory each of
//! them may request and use.

use tracing::debug;

use crate::machine::InstanceProperties;
use crate::value::MemorySize;
use crate::Category;
use crate::Error;
use crate::Result;

/// The amount of RAM (in GB) left on every node for the operating system and
/// the node agents.
pub const SYSTEM_MEMORY_RESERVE: f64 = 2.0;

/// The memory request (in GB) of a search job when none is given.
pub const DEFAULT_MEM_REQUEST: f64 = 0.5;

/// Gets the number of jobs using `cpus_per_job` CPUs each that run
/// concurrently on a machine with the capacity of `instance`.
///
/// At least one job always runs, and a job without a CPU count takes the whole
/// machine.
pub fn jobs_per_node(instance: InstanceProperties, cpus_per_job: Option<u32>) -> Result<u32> {
    match cpus_per_job {
        Some(0) => Err(Error::invalid(
            "0",
            "the number of CPUs per job must be greater than zero",
        )),
        Some(cpus) => Ok((instance.cpus() / cpus).max(1)),
        None => Ok(1),
    }
}

/// The sizing of search jobs on one machine type.
#[derive(Clone, Debug, PartialEq)]
pub struct Tuning {
    /// The capacity of the machine.
    instance: InstanceProperties,

    /// The number of jobs that run concurrently on a node.
    jobs_per_node: u32,

    /// The memory limit per job.
    mem_limit: MemorySize,

    /// The memory request per job.
    mem_request: MemorySize,
}

impl Tuning {
    /// Sizes jobs on a machine with the capacity of `instance`.
    ///
    /// Explicit memory values take precedence over computed ones. A computed
    /// request never exceeds the limit.
    ///
    /// Without an explicit limit, the machine must have more RAM than
    /// [`SYSTEM_MEMORY_RESERVE`].
    pub fn new(
        instance: InstanceProperties,
        cpus_per_job: Option<u32>,
        mem_request: Option<MemorySize>,
        mem_limit: Option<MemorySize>,
    ) -> Result<Self> {
        let jobs_per_node = jobs_per_node(instance, cpus_per_job)?;

        let mem_limit = match mem_limit {
            Some(limit) => limit,
            None => {
                let usable = instance.memory() - SYSTEM_MEMORY_RESERVE;
                if usable <= 0.0 {
                    return Err(Error::Report {
                        category: Category::Input,
                        message: format!(
                            "The selected machine type has {}GB of RAM, which does not exceed \
                             the {SYSTEM_MEMORY_RESERVE}GB reserved for the system",
                            instance.memory()
                        ),
                    });
                }

                MemorySize::from_gb(usable / f64::from(jobs_per_node))
            }
        };

        let mem_request = mem_request
            .unwrap_or_else(|| MemorySize::from_gb(DEFAULT_MEM_REQUEST.min(mem_limit.as_gb())));

        debug!(
            "sized jobs for {} CPUs and {}GB: {jobs_per_node} jobs per node, memory request \
             {mem_request}, memory limit {mem_limit}",
            instance.cpus(),
            instance.memory()
        );

        Ok(Self {
            instance,
            jobs_per_node,
            mem_limit,
            mem_request,
        })
    }

    /// Gets the capacity of the machine.
    pub fn instance(&self) -> InstanceProperties {
        self.instance
    }

    /// Gets the number of jobs that run concurrently on a node.
    pub fn jobs_per_node(&self) -> u32 {
        self.jobs_per_node
    }

    /// Gets the memory limit per job.
    pub fn mem_limit(&self) -> &MemorySize {
        &self.mem_limit
    }

    /// Gets the memory request per job.
    pub fn mem_request(&self) -> &MemorySize {
        &self.mem_request
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    fn large() -> InstanceProperties {
        InstanceProperties::new(32, 128.0)
    }

    #[test]
    fn jobs_share_usable_memory() {
        let tuning = Tuning::new(large(), Some(15), None, None).unwrap();
        assert_eq!(tuning.jobs_per_node(), 2);
        assert_relative_eq!(
            tuning.mem_limit().as_gb(),
            (128.0 - SYSTEM_MEMORY_RESERVE) / 2.0
        );
        assert_relative_eq!(tuning.mem_request().as_gb(), DEFAULT_MEM_REQUEST);
    }

    #[test]
    fn one_job_per_node_by_default() {
        let tuning = Tuning::new(large(), None, None, None).unwrap();
        assert_eq!(tuning.jobs_per_node(), 1);
        assert_relative_eq!(tuning.mem_limit().as_gb(), 126.0);

        let tuning = Tuning::new(large(), Some(64), None, None).unwrap();
        assert_eq!(tuning.jobs_per_node(), 1);
    }

    #[test]
    fn explicit_values_win() {
        let tuning = Tuning::new(
            large(),
            Some(8),
            Some("1G".parse().unwrap()),
            Some("20G".parse().unwrap()),
        )
        .unwrap();

        assert_eq!(tuning.jobs_per_node(), 4);
        assert_eq!(tuning.mem_request(), "1G");
        assert_eq!(tuning.mem_limit(), "20G");
    }

    #[test]
    fn request_never_exceeds_a_small_limit() {
        let tuning = Tuning::new(large(), None, None, Some("256M".parse().unwrap())).unwrap();
        assert!(tuning.mem_request() <= tuning.mem_limit());
        assert_relative_eq!(tuning.mem_request().as_gb(), 0.25);
    }

    #[test]
    fn zero_cpus_per_job_is_rejected() {
        let err = Tuning::new(large(), Some(0), None, None).unwrap_err();
        assert!(matches!(err, Error::InvalidValue { .. }));
    }

    #[test]
    fn machines_without_headroom_are_rejected() {
        let err = Tuning::new(InstanceProperties::new(2, 2.0), None, None, None).unwrap_err();
        assert_eq!(err.category(), Category::Input);
        assert!(err.to_string().contains("reserved for the system"));

        let tuning = Tuning::new(
            InstanceProperties::new(2, 2.0),
            None,
            None,
            Some("1G".parse().unwrap()),
        )
        .unwrap();
        assert_eq!(tuning.mem_limit(), "1G");
    }
}
