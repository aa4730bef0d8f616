//! Machine capacity derived from the providers' naming schemes.

use std::sync::LazyLock;

use regex::Regex;

use crate::machine::Error;
use crate::machine::InstanceProperties;
use crate::machine::MachineResolver;
use crate::provider::Cloud;

/// Predefined GCP machine types such as `n1-highmem-32`.
static GCP_PREDEFINED_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    // SAFETY: this is checked statically to ensure it always unwraps.
    Regex::new(r"^(n1|n2|n2d|e2|c2|c2d)-(standard|highmem|highcpu)-([0-9]+)$").unwrap()
});

/// Custom GCP machine types such as `n2-custom-8-32768`.
static GCP_CUSTOM_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    // SAFETY: this is checked statically to ensure it always unwraps.
    Regex::new(r"^(?:[a-z0-9]+-)?custom-([0-9]+)-([0-9]+)$").unwrap()
});

/// AWS instance types such as `m5.8xlarge` or `r5d.large`.
static AWS_INSTANCE_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    // SAFETY: this is checked statically to ensure it always unwraps.
    Regex::new(r"^([mrct])([0-9]+)([a-z-]*)\.([0-9]*)(x?)large$").unwrap()
});

/// A resolver that derives capacity from a machine type's name.
#[derive(Clone, Copy, Debug, Default)]
pub struct Catalog;

impl Catalog {
    /// Resolves a GCP machine type.
    fn gcp(machine_type: &str) -> Option<InstanceProperties> {
        if let Some(captures) = GCP_PREDEFINED_REGEX.captures(machine_type) {
            let cpus = captures[3].parse::<u32>().ok()?;
            let per_cpu = match (&captures[1], &captures[2]) {
                ("n1", "standard") => 3.75,
                ("n1", "highmem") => 6.5,
                ("n1", "highcpu") => 0.9,
                (_, "standard") => 4.0,
                (_, "highmem") => 8.0,
                _ => 1.0,
            };

            return Self::properties(cpus, f64::from(cpus) * per_cpu);
        }

        let captures = GCP_CUSTOM_REGEX.captures(machine_type)?;
        let cpus = captures[1].parse::<u32>().ok()?;
        let megabytes = captures[2].parse::<u32>().ok()?;
        Self::properties(cpus, f64::from(megabytes) / 1024.0)
    }

    /// Resolves an AWS instance type.
    fn aws(machine_type: &str) -> Option<InstanceProperties> {
        let captures = AWS_INSTANCE_REGEX.captures(machine_type)?;

        let cpus = match (&captures[4], &captures[5]) {
            ("", "") => 2,
            ("", "x") => 4,
            (multiplier, "x") => multiplier.parse::<u32>().ok()?.checked_mul(4)?,
            _ => return None,
        };

        let per_cpu = match &captures[1] {
            "m" | "t" => 4.0,
            "r" => 8.0,
            _ => 2.0,
        };

        Self::properties(cpus, f64::from(cpus) * per_cpu)
    }

    /// Builds the properties of a machine, rejecting machines without CPUs
    /// or memory.
    fn properties(cpus: u32, memory: f64) -> Option<InstanceProperties> {
        if cpus == 0 || !memory.is_finite() || memory <= 0.0 {
            return None;
        }

        Some(InstanceProperties::new(cpus, memory))
    }
}

impl MachineResolver for Catalog {
    fn resolve(&self, machine_type: &str, cloud: Cloud) -> Result<InstanceProperties, Error> {
        let properties = match cloud {
            Cloud::Gcp => Self::gcp(machine_type),
            Cloud::Aws => Self::aws(machine_type),
        };

        properties.ok_or_else(|| Error::UnknownMachineType {
            machine_type: machine_type.to_string(),
            cloud,
        })
    }
}
