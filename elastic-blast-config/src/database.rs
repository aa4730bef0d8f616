//! BLAST databases and their metadata.
//!
//! A database is either a short name from the well-known catalog of reference
//! databases or a full storage path to a user-supplied database. Each database
//! is published with a JSON metadata document describing its molecule type and
//! how many bytes need to be cached in memory to search it.

use std::fmt;
use std::str::FromStr;

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

mod store;

pub use store::LocalMirror;
pub use store::MetadataStore;

use crate::provider::Cloud;
use crate::value::CloudUri;

/// The catalog of well-known databases hosted on GCP.
pub const GCP_CATALOG: &str = "gs://blast-db";

/// The catalog of well-known databases hosted on AWS.
pub const AWS_CATALOG: &str = "s3://ncbi-blast-databases";

/// The catalog directory holding the latest database release.
pub const LATEST_RELEASE: &str = "000";

/// An error related to database metadata.
#[derive(Debug, Error)]
pub enum Error {
    /// No metadata exists for the database.
    #[error("metadata for database \"{0}\" was not found")]
    NotFound(String),

    /// A metadata document could not be parsed.
    #[error("failed to parse database metadata at `{location}`: {source}")]
    Parse {
        /// The location of the document.
        location: String,

        /// The source of the error.
        source: serde_json::Error,
    },

    /// A metadata document could not be read.
    #[error("failed to read database metadata at `{location}`: {source}")]
    Io {
        /// The location of the document.
        location: String,

        /// The source of the error.
        source: std::io::Error,
    },
}

/// The molecule type of sequences.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub enum MolType {
    /// Protein sequences.
    #[serde(alias = "protein", alias = "PROTEIN", alias = "prot")]
    Protein,

    /// Nucleotide sequences.
    #[serde(alias = "nucleotide", alias = "NUCLEOTIDE", alias = "nucl")]
    Nucleotide,
}

impl MolType {
    /// The abbreviation used in metadata file names.
    pub fn abbreviation(&self) -> &'static str {
        match self {
            MolType::Protein => "prot",
            MolType::Nucleotide => "nucl",
        }
    }

    /// Gets the other molecule type.
    pub fn other(&self) -> MolType {
        match self {
            MolType::Protein => MolType::Nucleotide,
            MolType::Nucleotide => MolType::Protein,
        }
    }
}

impl fmt::Display for MolType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MolType::Protein => write!(f, "protein"),
            MolType::Nucleotide => write!(f, "nucleotide"),
        }
    }
}

/// A reference to a BLAST database.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(try_from = "String", into = "String")]
pub enum Database {
    /// A database from the well-known catalog, referenced by name.
    Catalog(String),

    /// A user-supplied database, referenced by its storage path.
    Path(CloudUri),
}

impl Database {
    /// Whether or not the database is from the well-known catalog.
    pub fn is_catalog(&self) -> bool {
        matches!(self, Database::Catalog(_))
    }

    /// Gets the database as it was written.
    pub fn as_str(&self) -> &str {
        match self {
            Database::Catalog(name) => name,
            Database::Path(uri) => uri.as_str(),
        }
    }

    /// Gets the name of the database (the last path component for a path).
    pub fn name(&self) -> &str {
        match self {
            Database::Catalog(name) => name,
            Database::Path(uri) => uri.as_str().rsplit('/').next().unwrap_or(uri.as_str()),
        }
    }

    /// Gets the location of the metadata document for the database, assuming
    /// it holds `mol_type` sequences.
    ///
    /// Catalog databases are looked up in the catalog hosted by `source`.
    pub fn metadata_path(&self, source: Cloud, mol_type: MolType) -> String {
        let prefix = match self {
            Database::Catalog(name) => {
                let catalog = match source {
                    Cloud::Gcp => GCP_CATALOG,
                    Cloud::Aws => AWS_CATALOG,
                };

                format!("{catalog}/{LATEST_RELEASE}/{name}")
            }
            Database::Path(uri) => uri.to_string(),
        };

        format!("{prefix}-{}-metadata.json", mol_type.abbreviation())
    }
}

impl FromStr for Database {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if CloudUri::looks_like_uri(s) {
            return s.parse().map(Database::Path);
        }

        if s.is_empty() || s.contains(char::is_whitespace) || s.contains('/') {
            return Err(crate::Error::invalid(
                s,
                "expected a database name or a gs:// or s3:// path",
            ));
        }

        Ok(Database::Catalog(s.to_string()))
    }
}

impl TryFrom<String> for Database {
    type Error = crate::Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Database> for String {
    fn from(value: Database) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for Database {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The metadata published alongside a BLAST database.
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct Metadata {
    /// The database name.
    pub dbname: String,

    /// The metadata format version.
    pub version: String,

    /// The molecule type.
    pub dbtype: MolType,

    /// A description of the database.
    #[serde(default)]
    pub description: String,

    /// The total number of residues.
    #[serde(default)]
    pub number_of_letters: u64,

    /// The number of sequences.
    #[serde(default)]
    pub number_of_sequences: u64,

    /// The files making up the database.
    #[serde(default)]
    pub files: Vec<String>,

    /// When the database was last updated.
    #[serde(default)]
    pub last_updated: String,

    /// The total size of the database files.
    #[serde(default)]
    pub bytes_total: u64,

    /// The number of bytes that need to be cached in memory for a search.
    pub bytes_to_cache: u64,

    /// The number of database volumes.
    #[serde(default)]
    pub number_of_volumes: u32,
}

impl Metadata {
    /// Parses a metadata document.
    pub fn from_json(location: &str, json: &str) -> Result<Self, Error> {
        serde_json::from_str(json).map_err(|source| Error::Parse {
            location: location.to_string(),
            source,
        })
    }
}

/// Resolves the metadata of a database.
pub trait DatabaseResolver: fmt::Debug + Send + Sync {
    /// Resolves the metadata for `database` using the catalog hosted by
    /// `source`.
    ///
    /// Returns [`Error::NotFound`] if no metadata document exists.
    fn resolve(&self, database: &Database, source: Cloud) -> Result<Metadata, Error>;
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Renders a metadata document for tests.
    pub(crate) fn metadata_json(name: &str, dbtype: &str, bytes_to_cache: u64) -> String {
        format!(
            r#"{{
  "dbname": "{name}",
  "version": "1.1",
  "dbtype": "{dbtype}",
  "description": "A test database",
  "number-of-letters": 180911227,
  "number-of-sequences": 477327,
  "files": [
    "gs://blast-db/2021-09-28-01-05-02/{name}.pin",
    "gs://blast-db/2021-09-28-01-05-02/{name}.psq"
  ],
  "last-updated": "2021-09-19T00:00:00",
  "bytes-total": 353839003,
  "bytes-to-cache": {bytes_to_cache},
  "number-of-volumes": 1
}}"#
        )
    }

    #[test]
    fn classifies_references() {
        assert_eq!(
            "testdb".parse::<Database>().unwrap(),
            Database::Catalog("testdb".to_string())
        );

        let db = "gs://bucket/largedb".parse::<Database>().unwrap();
        assert!(!db.is_catalog());
        assert_eq!(db.name(), "largedb");
        assert_eq!(db.to_string(), "gs://bucket/largedb");

        for value in ["", "gs://@bad", "local/path", "two words"] {
            assert!(value.parse::<Database>().is_err(), "{value} should be invalid");
        }
    }

    #[test]
    fn metadata_paths() {
        let db = "nt".parse::<Database>().unwrap();
        assert_eq!(
            db.metadata_path(Cloud::Gcp, MolType::Nucleotide),
            "gs://blast-db/000/nt-nucl-metadata.json"
        );
        assert_eq!(
            db.metadata_path(Cloud::Aws, MolType::Protein),
            "s3://ncbi-blast-databases/000/nt-prot-metadata.json"
        );

        let db = "s3://bucket/mydb".parse::<Database>().unwrap();
        assert_eq!(
            db.metadata_path(Cloud::Gcp, MolType::Protein),
            "s3://bucket/mydb-prot-metadata.json"
        );
    }

    #[test]
    fn parses_metadata() {
        let metadata =
            Metadata::from_json("test", &metadata_json("largedb", "Protein", 999185207299))
                .unwrap();
        assert_eq!(metadata.dbname, "largedb");
        assert_eq!(metadata.dbtype, MolType::Protein);
        assert_eq!(metadata.bytes_to_cache, 999185207299);
        assert_eq!(metadata.files.len(), 2);
        assert_eq!(metadata.number_of_volumes, 1);

        let err = Metadata::from_json("broken.json", "{").unwrap_err();
        assert!(err.to_string().contains("broken.json"));
    }
}
