//! Configuration related to the search workload.
//!
//! The workload names the search program, the database it searches and the
//! queries it searches with, and carries the per-job resource bounds computed
//! by the [tuner](crate::tuner).

use serde::Deserialize;
use serde::Serialize;
use tracing::debug;
use tracing::warn;

mod builder;

pub use builder::Builder;
pub(crate) use builder::SCHEMA;

use crate::database;
use crate::database::Database;
use crate::database::DatabaseResolver;
use crate::machine::InstanceProperties;
use crate::program::Program;
use crate::provider::Cloud;
use crate::tuner::SYSTEM_MEMORY_RESERVE;
use crate::value::CloudUri;
use crate::value::MemorySize;
use crate::Category;
use crate::Command;
use crate::Error;
use crate::Issues;
use crate::Result;

/// The name of the section holding workload parameters.
pub const SECTION: &str = "blast";

/// The key for the search program.
pub const PROGRAM: &str = "program";

/// The key for the database.
pub const DB: &str = "db";

/// The key for the queries.
pub const QUERIES: &str = "queries";

/// The key for the results location.
///
/// The results live in the workload section but belong to the cluster.
pub const RESULTS: &str = "results";

/// The key for the program options.
pub const OPTIONS: &str = "options";

/// The key for the query batch length.
pub const BATCH_LEN: &str = "batch-len";

/// The key for the memory request per job.
pub const MEM_REQUEST: &str = "mem-request";

/// The key for the memory limit per job.
pub const MEM_LIMIT: &str = "mem-limit";

/// The key for the provider hosting the database catalog.
pub const DB_SOURCE: &str = "db-source";

/// The key for the taxonomy filter file.
pub const TAXIDLIST: &str = "taxidlist";

/// The key for the database memory margin.
pub const DB_MEM_MARGIN: &str = "db-mem-margin";

/// The output format flag added when the options have none.
pub const DEFAULT_OUTFMT: &str = "-outfmt 11";

/// The default database memory margin (in percent).
pub const DEFAULT_DB_MEM_MARGIN: f64 = 10.0;

/// The program option naming a taxonomy filter file.
const TAXIDLIST_FLAG: &str = "-taxidlist";

/// The number of bytes in a gigabyte.
const GIGABYTE: f64 = 1024.0 * 1024.0 * 1024.0;

/// The collaborators and resolved values needed to check a database against
/// the cluster it will be searched on.
#[derive(Clone, Copy, Debug)]
pub struct Context<'a> {
    /// The database metadata resolver.
    pub databases: &'a dyn DatabaseResolver,

    /// The machine type of the cluster nodes.
    pub machine_type: &'a str,

    /// The capacity of the cluster nodes.
    pub instance: InstanceProperties,
}

/// A configuration object for the search workload.
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct Config {
    /// The search program.
    program: Program,

    /// The database.
    db: Database,

    /// The provider hosting the database catalog.
    db_source: Cloud,

    /// The queries as they were given.
    queries_arg: String,

    /// The resolved query files.
    queries: Vec<String>,

    /// The program options.
    options: String,

    /// The taxonomy filter file.
    taxidlist: Option<String>,

    /// The number of query residues per batch.
    batch_len: u64,

    /// The memory request per job.
    mem_request: MemorySize,

    /// The memory limit per job.
    mem_limit: MemorySize,

    /// The safety margin (in percent) added to the database size.
    db_mem_margin: f64,
}

impl Config {
    /// Gets a default [`Builder`] for a [`Config`].
    pub fn builder() -> Builder {
        Builder::default()
    }

    /// Gets the search program.
    pub fn program(&self) -> Program {
        self.program
    }

    /// Gets the database.
    pub fn db(&self) -> &Database {
        &self.db
    }

    /// Gets the provider hosting the database catalog.
    pub fn db_source(&self) -> Cloud {
        self.db_source
    }

    /// Gets the queries as they were given.
    pub fn queries_arg(&self) -> &str {
        &self.queries_arg
    }

    /// Gets the resolved query files.
    ///
    /// This is empty until the queries are resolved with
    /// [`set_queries()`](Self::set_queries).
    pub fn queries(&self) -> &[String] {
        &self.queries
    }

    /// Gets the program options.
    pub fn options(&self) -> &str {
        &self.options
    }

    /// Gets the taxonomy filter file.
    pub fn taxidlist(&self) -> Option<&str> {
        self.taxidlist.as_deref()
    }

    /// Gets the number of query residues per batch.
    pub fn batch_len(&self) -> u64 {
        self.batch_len
    }

    /// Gets the memory request per job.
    pub fn mem_request(&self) -> &MemorySize {
        &self.mem_request
    }

    /// Gets the memory limit per job.
    pub fn mem_limit(&self) -> &MemorySize {
        &self.mem_limit
    }

    /// Gets the database memory margin (in percent).
    pub fn db_mem_margin(&self) -> f64 {
        self.db_mem_margin
    }

    /// Sets the resolved query files.
    pub fn set_queries(&mut self, queries: Vec<String>) {
        self.queries = queries;
    }

    /// Sets the memory request per job.
    pub fn set_mem_request(&mut self, mem_request: MemorySize) {
        self.mem_request = mem_request;
    }

    /// Sets the memory limit per job.
    pub fn set_mem_limit(&mut self, mem_limit: MemorySize) {
        self.mem_limit = mem_limit;
    }

    /// Validates the configuration, appending any problems to `issues`.
    ///
    /// When `command` submits a search and a `context` is given, the database
    /// metadata is resolved and checked against the program and the cluster.
    /// A database from the well-known catalog without metadata, or of the
    /// wrong molecule type, fails immediately.
    pub fn validate(
        &self,
        issues: &mut Issues,
        command: Command,
        context: Option<Context<'_>>,
    ) -> Result<()> {
        let references = self
            .queries_arg
            .split_whitespace()
            .chain(self.queries.iter().map(String::as_str));

        for reference in references {
            if CloudUri::looks_like_uri(reference) {
                if let Err(err) = reference.parse::<CloudUri>() {
                    issues.malformed(QUERIES, reference, err);
                }
            }
        }

        if self.queries_arg.trim().is_empty() {
            issues.missing(QUERIES);
        }

        if self.batch_len == 0 {
            issues.violation(format!("Parameter \"{BATCH_LEN}\" must be greater than zero"));
        }

        if self.mem_request > self.mem_limit {
            issues.violation(format!(
                "The memory request \"{}\" exceeds the memory limit \"{}\"",
                self.mem_request, self.mem_limit
            ));
        }

        match context {
            Some(context) if command.submits() => self.check_database(issues, context),
            _ => Ok(()),
        }
    }

    /// Checks the database metadata against the program and the cluster.
    fn check_database(&self, issues: &mut Issues, context: Context<'_>) -> Result<()> {
        let metadata = match context.databases.resolve(&self.db, self.db_source) {
            Ok(metadata) => metadata,
            Err(database::Error::NotFound(_)) if self.db.is_catalog() => {
                return Err(Error::Report {
                    category: Category::Database,
                    message: format!(
                        "Metadata for BLAST database \"{}\" was not found. Please make sure the \
                         database name is spelled correctly and that the database is available \
                         from {}",
                        self.db, self.db_source
                    ),
                });
            }
            Err(database::Error::NotFound(_)) => {
                warn!(
                    "metadata for BLAST database `{}` was not found; skipping the memory check",
                    self.db
                );
                return Ok(());
            }
            Err(err) => return Err(err.into()),
        };

        let required = self.program.db_mol_type();
        if metadata.dbtype != required {
            return Err(Error::Report {
                category: Category::Database,
                message: format!(
                    "The BLAST database molecular type of \"{}\" is {}, but {} requires a {} \
                     database",
                    self.db, metadata.dbtype, self.program, required
                ),
            });
        }

        let needed = metadata.bytes_to_cache as f64 * (1.0 + self.db_mem_margin / 100.0);
        let available = (context.instance.memory() - SYSTEM_MEMORY_RESERVE) * GIGABYTE;
        debug!(
            "database `{}` needs {needed} bytes of memory and {available} bytes are available",
            self.db
        );

        if needed > available {
            issues.violation(format!(
                "BLAST database \"{}\" memory requirements exceed memory available on selected \
                 machine type \"{}\". Please select a machine type with at least {:.1}GB of RAM",
                self.db,
                context.machine_type,
                needed / GIGABYTE + SYSTEM_MEMORY_RESERVE
            ));
        }

        Ok(())
    }
}

/// Splits a taxonomy filter out of the program options and ensures an output
/// format is requested.
///
/// Returns the remaining options and the taxonomy filter file, if any.
pub fn split_options(options: &str) -> (String, Option<String>) {
    let mut remaining = Vec::new();
    let mut taxidlist = None;
    let mut tokens = options.split_whitespace();

    while let Some(token) = tokens.next() {
        if token == TAXIDLIST_FLAG {
            taxidlist = tokens.next().map(str::to_string);
        } else {
            remaining.push(token);
        }
    }

    if !remaining.contains(&"-outfmt") {
        remaining.push(DEFAULT_OUTFMT);
    }

    (remaining.join(" "), taxidlist)
}
