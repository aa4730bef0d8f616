//! Builders for [workload configuration objects](Config).

use crate::blast::split_options;
use crate::blast::Config;
use crate::blast::BATCH_LEN;
use crate::blast::DB;
use crate::blast::DB_MEM_MARGIN;
use crate::blast::DB_SOURCE;
use crate::blast::DEFAULT_DB_MEM_MARGIN;
use crate::blast::MEM_LIMIT;
use crate::blast::MEM_REQUEST;
use crate::blast::OPTIONS;
use crate::blast::PROGRAM;
use crate::blast::QUERIES;
use crate::blast::SECTION;
use crate::blast::TAXIDLIST;
use crate::database::Database;
use crate::machine::InstanceProperties;
use crate::program::Program;
use crate::provider::Cloud;
use crate::section::reconcile;
use crate::section::Param;
use crate::section::Sections;
use crate::tuner::Tuning;
use crate::value::parse_number;
use crate::value::parse_positive;
use crate::value::MemorySize;
use crate::Error;
use crate::Issues;
use crate::Result;

/// The parameters a workload reads from the `blast` section.
pub(crate) static SCHEMA: &[Param<Builder>] = &[
    Param::required(SECTION, PROGRAM, |builder, value| {
        builder.program = Some(value.parse()?);
        Ok(())
    }),
    Param::required(SECTION, DB, |builder, value| {
        builder.db = Some(value.parse()?);
        Ok(())
    }),
    Param::required(SECTION, QUERIES, |builder, value| {
        builder.queries = Some(value.to_string());
        Ok(())
    }),
    Param::optional(SECTION, DB_SOURCE, |builder, value| {
        builder.db_source = Some(value.parse()?);
        Ok(())
    }),
    Param::optional(SECTION, OPTIONS, |builder, value| {
        builder.options = Some(value.to_string());
        Ok(())
    }),
    Param::optional(SECTION, TAXIDLIST, |builder, value| {
        builder.taxidlist = Some(value.to_string());
        Ok(())
    }),
    Param::optional(SECTION, BATCH_LEN, |builder, value| {
        builder.batch_len = Some(parse_positive(value)?);
        Ok(())
    }),
    Param::optional(SECTION, MEM_REQUEST, |builder, value| {
        builder.mem_request = Some(value.parse()?);
        Ok(())
    }),
    Param::optional(SECTION, MEM_LIMIT, |builder, value| {
        builder.mem_limit = Some(value.parse()?);
        Ok(())
    }),
    Param::optional(SECTION, DB_MEM_MARGIN, |builder, value| {
        builder.db_mem_margin = Some(parse_number(value)?);
        Ok(())
    }),
];

/// A builder for a [workload configuration object](Config).
#[derive(Debug, Default)]
pub struct Builder {
    /// The search program.
    program: Option<Program>,

    /// The database.
    db: Option<Database>,

    /// The provider hosting the database catalog.
    db_source: Option<Cloud>,

    /// The queries.
    queries: Option<String>,

    /// The program options.
    options: Option<String>,

    /// The taxonomy filter file.
    taxidlist: Option<String>,

    /// The number of query residues per batch.
    batch_len: Option<u64>,

    /// The memory request per job.
    mem_request: Option<MemorySize>,

    /// The memory limit per job.
    mem_limit: Option<MemorySize>,

    /// The database memory margin (in percent).
    db_mem_margin: Option<f64>,
}

impl Builder {
    /// Reads the parameters of the `blast` section of `sections` into a
    /// [`Builder`].
    ///
    /// Every missing or invalid parameter is reported in the returned error.
    /// Nothing is sized until [`try_build()`](Self::try_build) is called.
    pub fn from_sections(sections: &Sections) -> Result<Self> {
        let mut builder = Self::default();
        let mut issues = Issues::default();
        reconcile(sections, SCHEMA, &mut builder, &mut issues);
        issues.into_result(builder)
    }

    /// Sets the search program for the [`Builder`].
    pub fn program(mut self, program: Program) -> Self {
        self.program = Some(program);
        self
    }

    /// Sets the database for the [`Builder`].
    pub fn db(mut self, db: Database) -> Self {
        self.db = Some(db);
        self
    }

    /// Sets the provider hosting the database catalog for the [`Builder`].
    ///
    /// # Notes
    ///
    /// When unset, the provider the cluster runs on is used.
    pub fn db_source(mut self, db_source: Cloud) -> Self {
        self.db_source = Some(db_source);
        self
    }

    /// Sets the queries for the [`Builder`].
    pub fn queries(mut self, queries: impl Into<String>) -> Self {
        self.queries = Some(queries.into());
        self
    }

    /// Sets the program options for the [`Builder`].
    ///
    /// # Notes
    ///
    /// A `-taxidlist` option is moved into the taxonomy filter file and an
    /// output format is added if the options do not request one.
    pub fn options(mut self, options: impl Into<String>) -> Self {
        self.options = Some(options.into());
        self
    }

    /// Sets the taxonomy filter file for the [`Builder`].
    pub fn taxidlist(mut self, taxidlist: impl Into<String>) -> Self {
        self.taxidlist = Some(taxidlist.into());
        self
    }

    /// Sets the number of query residues per batch for the [`Builder`].
    pub fn batch_len(mut self, batch_len: u64) -> Self {
        self.batch_len = Some(batch_len);
        self
    }

    /// Sets the memory request per job for the [`Builder`].
    pub fn mem_request(mut self, mem_request: MemorySize) -> Self {
        self.mem_request = Some(mem_request);
        self
    }

    /// Sets the memory limit per job for the [`Builder`].
    pub fn mem_limit(mut self, mem_limit: MemorySize) -> Self {
        self.mem_limit = Some(mem_limit);
        self
    }

    /// Sets the database memory margin (in percent) for the [`Builder`].
    pub fn db_mem_margin(mut self, db_mem_margin: f64) -> Self {
        self.db_mem_margin = Some(db_mem_margin);
        self
    }

    /// Consumes `self` and attempts to build a [`Config`] for jobs running on
    /// `cloud` machines with the capacity of `instance`, each job using
    /// `cpus_per_job` CPUs.
    pub fn try_build(
        self,
        cloud: Cloud,
        instance: InstanceProperties,
        cpus_per_job: Option<u32>,
    ) -> Result<Config> {
        let program = self.program.ok_or(Error::Missing(PROGRAM))?;
        let db = self.db.ok_or(Error::Missing(DB))?;
        let queries_arg = self.queries.ok_or(Error::Missing(QUERIES))?;

        let (options, taxidlist) = split_options(self.options.as_deref().unwrap_or_default());
        let tuning = Tuning::new(instance, cpus_per_job, self.mem_request, self.mem_limit)?;

        Ok(Config {
            program,
            db,
            db_source: self.db_source.unwrap_or(cloud),
            queries_arg,
            queries: Vec::new(),
            options,
            taxidlist: self.taxidlist.or(taxidlist),
            batch_len: self.batch_len.unwrap_or_else(|| program.batch_len()),
            mem_request: tuning.mem_request().clone(),
            mem_limit: tuning.mem_limit().clone(),
            db_mem_margin: self.db_mem_margin.unwrap_or(DEFAULT_DB_MEM_MARGIN),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields() {
        let err = Builder::default()
            .program(Program::Blastn)
            .try_build(Cloud::Gcp, InstanceProperties::new(4, 16.0), None)
            .unwrap_err();
        assert_eq!(err.to_string(), "Missing db");
    }

    #[test]
    fn taxonomy_filters_come_from_options() {
        let config = Builder::default()
            .program(Program::Blastn)
            .db("nt".parse().unwrap())
            .queries("gs://bucket/queries.fa")
            .options("-taxidlist taxids.txt")
            .try_build(Cloud::Aws, InstanceProperties::new(4, 16.0), None)
            .unwrap();

        assert_eq!(config.taxidlist(), Some("taxids.txt"));
        assert_eq!(config.options(), "-outfmt 11");
        assert_eq!(config.db_source(), Cloud::Aws);
        assert_eq!(config.batch_len(), 5_000_000);
    }
}
