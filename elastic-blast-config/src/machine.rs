//! Machine types and the resolution of their capacity.
//!
//! Looking machine types up in a provider's instance catalog is the job of an
//! external collaborator; this module defines the interface it implements
//! ([`MachineResolver`]) along with two resolvers: a [`Catalog`] that
//! understands the providers' naming schemes and an explicit [`Table`].

use std::collections::HashMap;
use std::fmt;
use std::sync::LazyLock;

use bon::Builder;
use regex::Regex;
use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

mod catalog;

pub use catalog::Catalog;

use crate::provider::Cloud;

/// Machine type families that run on ARM processors, for which the search
/// software is not built.
static ARM_MACHINE_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    // SAFETY: this is checked statically to ensure it always unwraps.
    Regex::new(r"^(?:[a-z]+[0-9]+g[a-z]*\.|a1\.|t2a-|c4a-)").unwrap()
});

/// An error related to resolving a machine type.
#[derive(Debug, Error)]
pub enum Error {
    /// The machine type is not known for the provider.
    #[error("machine type \"{machine_type}\" is not recognized for {cloud}")]
    UnknownMachineType {
        /// The machine type.
        machine_type: String,

        /// The provider.
        cloud: Cloud,
    },
}

/// The capacity of a machine type.
#[derive(Builder, Clone, Copy, Debug, PartialEq, Deserialize, Serialize)]
#[builder(builder_type = Builder)]
pub struct InstanceProperties {
    /// The number of virtual CPUs.
    cpus: u32,

    /// The amount of RAM in gigabytes.
    memory: f64,
}

impl InstanceProperties {
    /// Creates a new [`InstanceProperties`].
    pub fn new(cpus: u32, memory: f64) -> Self {
        Self { cpus, memory }
    }

    /// Gets the number of virtual CPUs.
    pub fn cpus(&self) -> u32 {
        self.cpus
    }

    /// Gets the amount of RAM in gigabytes.
    pub fn memory(&self) -> f64 {
        self.memory
    }
}

/// Resolves a machine type to its capacity.
pub trait MachineResolver: fmt::Debug + Send + Sync {
    /// Resolves `machine_type` for `cloud`.
    fn resolve(&self, machine_type: &str, cloud: Cloud) -> Result<InstanceProperties, Error>;
}

/// A fixed table of machine types.
///
/// A fallback may be set to answer for machine types not in the table.
#[derive(Clone, Debug, Default)]
pub struct Table {
    /// The known machine types.
    machines: HashMap<String, InstanceProperties>,

    /// The properties reported for any other machine type.
    fallback: Option<InstanceProperties>,
}

impl Table {
    /// Creates a table that reports `properties` for every machine type.
    pub fn uniform(properties: InstanceProperties) -> Self {
        Self {
            machines: Default::default(),
            fallback: Some(properties),
        }
    }

    /// Adds a machine type to the table.
    pub fn with(mut self, machine_type: impl Into<String>, properties: InstanceProperties) -> Self {
        self.machines.insert(machine_type.into(), properties);
        self
    }
}

impl MachineResolver for Table {
    fn resolve(&self, machine_type: &str, cloud: Cloud) -> Result<InstanceProperties, Error> {
        self.machines
            .get(machine_type)
            .copied()
            .or(self.fallback)
            .ok_or_else(|| Error::UnknownMachineType {
                machine_type: machine_type.to_string(),
                cloud,
            })
    }
}

/// Whether or not the search software can run on `machine_type`.
pub fn is_supported(machine_type: &str) -> bool {
    !ARM_MACHINE_REGEX.is_match(machine_type)
}
