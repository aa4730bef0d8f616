//! Metadata resolvers backed by in-memory objects or a local directory.

use std::collections::HashMap;
use std::path::PathBuf;

use tracing::debug;

use crate::database::Database;
use crate::database::DatabaseResolver;
use crate::database::Error;
use crate::database::Metadata;
use crate::database::MolType;
use crate::provider::Cloud;

/// Gets the candidate metadata locations for a database.
///
/// The molecule type of a database is not known before its metadata is read,
/// so both are tried.
fn candidates(database: &Database, source: Cloud) -> [String; 2] {
    [MolType::Protein, MolType::Nucleotide].map(|mol| database.metadata_path(source, mol))
}

/// A resolver over an in-memory map of storage paths to metadata documents.
#[derive(Clone, Debug, Default)]
pub struct MetadataStore {
    /// The documents, keyed by their storage path.
    objects: HashMap<String, String>,
}

impl MetadataStore {
    /// Stores the document `json` at `path`.
    pub fn insert(&mut self, path: impl Into<String>, json: impl Into<String>) {
        self.objects.insert(path.into(), json.into());
    }

    /// Stores the document `json` at `path`, returning `self`.
    pub fn with(mut self, path: impl Into<String>, json: impl Into<String>) -> Self {
        self.insert(path, json);
        self
    }
}

impl DatabaseResolver for MetadataStore {
    fn resolve(&self, database: &Database, source: Cloud) -> Result<Metadata, Error> {
        for path in candidates(database, source) {
            if let Some(json) = self.objects.get(&path) {
                return Metadata::from_json(&path, json);
            }
        }

        Err(Error::NotFound(database.to_string()))
    }
}

/// A resolver over a local directory mirroring bucket layouts.
///
/// The object `gs://bucket/path/db-prot-metadata.json` is read from
/// `<root>/gs/bucket/path/db-prot-metadata.json`.
#[derive(Clone, Debug)]
pub struct LocalMirror {
    /// The root of the mirror.
    root: PathBuf,
}

impl LocalMirror {
    /// Creates a new [`LocalMirror`] rooted at `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Maps a storage path onto the local file system.
    fn local_path(&self, uri: &str) -> PathBuf {
        let (scheme, rest) = uri.split_once("://").unwrap_or(("", uri));

        let mut path = self.root.join(scheme);
        path.extend(rest.split('/').filter(|part| !part.is_empty()));
        path
    }
}

impl DatabaseResolver for LocalMirror {
    fn resolve(&self, database: &Database, source: Cloud) -> Result<Metadata, Error> {
        for uri in candidates(database, source) {
            let path = self.local_path(&uri);
            debug!("looking for database metadata at `{}`", path.display());

            match std::fs::read_to_string(&path) {
                Ok(json) => return Metadata::from_json(&uri, &json),
                Err(err) if err.kind() == std::io::ErrorKind::NotFound => continue,
                Err(source) => {
                    return Err(Error::Io {
                        location: path.display().to_string(),
                        source,
                    })
                }
            }
        }

        Err(Error::NotFound(database.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::tests::metadata_json;

    #[test]
    fn store_tries_both_molecule_types() {
        let store = MetadataStore::default().with(
            "s3://ncbi-blast-databases/000/some-db-prot-metadata.json",
            metadata_json("some-db", "Protein", 1000),
        );

        let db = "some-db".parse::<Database>().unwrap();
        let metadata = store.resolve(&db, Cloud::Aws).unwrap();
        assert_eq!(metadata.dbtype, MolType::Protein);

        let err = store.resolve(&db, Cloud::Gcp).unwrap_err();
        assert!(matches!(err, Error::NotFound(name) if name == "some-db"));
    }

    #[test]
    fn mirror_reads_local_files() -> Result<(), Box<dyn std::error::Error>> {
        let root = tempfile::tempdir()?;
        let dir = root.path().join("gs").join("bucket");
        std::fs::create_dir_all(&dir)?;
        std::fs::write(
            dir.join("mydb-nucl-metadata.json"),
            metadata_json("mydb", "Nucleotide", 42),
        )?;

        let mirror = LocalMirror::new(root.path());
        let db = "gs://bucket/mydb".parse::<Database>()?;
        let metadata = mirror.resolve(&db, Cloud::Gcp)?;
        assert_eq!(metadata.dbtype, MolType::Nucleotide);
        assert_eq!(metadata.bytes_to_cache, 42);

        let db = "gs://bucket/missing".parse::<Database>()?;
        assert!(matches!(
            mirror.resolve(&db, Cloud::Gcp),
            Err(Error::NotFound(_))
        ));

        Ok(())
    }
}
