//! Flat section/key/value configuration input and schema reconciliation.
//!
//! Structured input reaches the configuration as a mapping of section names to
//! key/value pairs where every value is an untyped string. Each configuration
//! object declares a schema: a table of [`Param`]s naming the section and key
//! of each field, whether it is required, and the function that validates and
//! assigns it.

use std::collections::HashSet;
use std::path::Path;

use config::File;
use indexmap::IndexMap;
use tracing::debug;

use crate::Issues;
use crate::Result;

/// The file name used when looking for configuration files.
pub const FILE_NAME: &str = "elastic-blast.ini";

/// The environment variable pointing to an additional configuration file.
pub const CONFIG_ENV: &str = "ELB_CONFIG";

/// The key/value pairs within a section.
pub type Section = IndexMap<String, String>;

/// A mapping of section names to their key/value pairs.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Sections(IndexMap<String, Section>);

impl Sections {
    /// Creates an empty set of sections.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets `key` within `section` to `value`.
    ///
    /// The section is created if it does not yet exist.
    pub fn insert(
        &mut self,
        section: impl Into<String>,
        key: impl Into<String>,
        value: impl Into<String>,
    ) {
        self.0
            .entry(section.into())
            .or_default()
            .insert(key.into(), value.into());
    }

    /// Adds every pair in `entries` to `section`, returning `self`.
    pub fn with_section<I, K, V>(mut self, section: impl Into<String>, entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let section = self.0.entry(section.into()).or_default();

        for (key, value) in entries {
            section.insert(key.into(), value.into());
        }

        self
    }

    /// Removes a section.
    pub fn remove_section(&mut self, section: &str) -> Option<Section> {
        self.0.shift_remove(section)
    }

    /// Gets a section by name.
    pub fn section(&self, name: &str) -> Option<&Section> {
        self.0.get(name)
    }

    /// Gets the value of `key` within `section`.
    pub fn get(&self, section: &str, key: &str) -> Option<&str> {
        self.0
            .get(section)
            .and_then(|entries| entries.get(key))
            .map(String::as_str)
    }

    /// Iterates over the sections.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Section)> {
        self.0.iter().map(|(name, section)| (name.as_str(), section))
    }

    /// Whether or not there are no sections.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Records every section/key pair that is not in `known`.
    pub fn unrecognized<'a>(
        &self,
        known: impl IntoIterator<Item = (&'a str, &'a str)>,
        issues: &mut Issues,
    ) {
        let known = known.into_iter().collect::<HashSet<_>>();

        for (section, entries) in self.iter() {
            for key in entries.keys() {
                if !known.contains(&(section, key.as_str())) {
                    issues.unrecognized(section, key);
                }
            }
        }
    }

    /// Gets a builder with the default sources preloaded.
    ///
    /// The default sources, in the order they are merged, are:
    ///
    /// * `<CONFIG DIR>/elastic-blast/elastic-blast.ini`.
    /// * `<CWD>/elastic-blast.ini`.
    /// * If the environment variable is present, the file pointed to by
    ///   `ELB_CONFIG`.
    pub fn default_sources() -> config::ConfigBuilder<config::builder::DefaultState> {
        let mut builder = config::Config::builder();

        if let Some(config_home) = dirs::config_dir() {
            builder = builder.add_source(
                File::from(config_home.join("elastic-blast").join(FILE_NAME)).required(false),
            );
        }

        if let Ok(mut path) = std::env::current_dir() {
            path.push(FILE_NAME);
            builder = builder.add_source(File::from(path).required(false));
        }

        if let Ok(config_file) = std::env::var(CONFIG_ENV) {
            builder = builder.add_source(File::from(Path::new(&config_file)));
        }

        builder
    }

    /// Loads sections from the default sources followed by `paths`.
    ///
    /// The file format (INI or TOML) is inferred from each file's extension.
    pub fn load_with_paths<I, S>(paths: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<Path>,
    {
        let mut builder = Self::default_sources();

        for path in paths {
            debug!("loading configuration from `{}`", path.as_ref().display());
            builder = builder.add_source(File::from(path.as_ref()));
        }

        Self::extract(builder)
    }

    /// Loads sections from exactly the files in `paths`, ignoring the default
    /// sources.
    pub fn load_files<I, S>(paths: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<Path>,
    {
        let mut builder = config::Config::builder();

        for path in paths {
            builder = builder.add_source(File::from(path.as_ref()));
        }

        Self::extract(builder)
    }

    /// Builds the sources and flattens them into sections.
    fn extract(builder: config::ConfigBuilder<config::builder::DefaultState>) -> Result<Self> {
        let sections = builder
            .build()?
            .try_deserialize::<IndexMap<String, Section>>()?;

        Ok(Self(sections))
    }
}

/// A single entry in a configuration schema.
///
/// `T` is the object the parameter is assigned into (typically a builder).
pub struct Param<T> {
    /// The section the parameter lives in.
    pub section: &'static str,

    /// The key of the parameter.
    pub key: &'static str,

    /// Whether or not the parameter must be present.
    pub required: bool,

    /// Validates the raw value and assigns it.
    pub apply: fn(&mut T, &str) -> Result<()>,
}

impl<T> Param<T> {
    /// Creates a required parameter.
    pub const fn required(
        section: &'static str,
        key: &'static str,
        apply: fn(&mut T, &str) -> Result<()>,
    ) -> Self {
        Self {
            section,
            key,
            required: true,
            apply,
        }
    }

    /// Creates an optional parameter.
    pub const fn optional(
        section: &'static str,
        key: &'static str,
        apply: fn(&mut T, &str) -> Result<()>,
    ) -> Self {
        Self {
            section,
            key,
            required: false,
            apply,
        }
    }

    /// Gets the section and key of the parameter.
    pub fn location(&self) -> (&'static str, &'static str) {
        (self.section, self.key)
    }
}

/// Assigns every parameter in `schema` found in `sections` into `target`.
///
/// Missing required parameters and values that fail validation are appended
/// to `issues`; nothing stops at the first problem.
pub fn reconcile<T>(sections: &Sections, schema: &[Param<T>], target: &mut T, issues: &mut Issues) {
    for param in schema {
        match sections.get(param.section, param.key) {
            Some(value) => {
                if let Err(err) = (param.apply)(target, value) {
                    issues.malformed(param.key, value, err);
                }
            }
            None if param.required => issues.missing(param.key),
            None => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write as _;

    use super::*;
    use crate::value::parse_positive;
    use crate::Error;
    use crate::IssueKind;

    #[derive(Default)]
    struct Target {
        name: Option<String>,
        count: Option<u64>,
    }

    static SCHEMA: &[Param<Target>] = &[
        Param::required("section", "name", |target, value| {
            target.name = Some(value.to_string());
            Ok(())
        }),
        Param::optional("section", "count", |target, value| {
            target.count = Some(parse_positive(value)?);
            Ok(())
        }),
    ];

    #[test]
    fn reconcile_assigns_values() {
        let sections =
            Sections::new().with_section("section", [("name", "hello"), ("count", "3")]);

        let mut target = Target::default();
        let mut issues = Issues::default();
        reconcile(&sections, SCHEMA, &mut target, &mut issues);

        assert!(issues.is_empty());
        assert_eq!(target.name.as_deref(), Some("hello"));
        assert_eq!(target.count, Some(3));
    }

    #[test]
    fn reconcile_accumulates_every_problem() {
        let sections = Sections::new().with_section("section", [("count", "abc")]);

        let mut target = Target::default();
        let mut issues = Issues::default();
        reconcile(&sections, SCHEMA, &mut target, &mut issues);

        assert_eq!(issues.len(), 2);
        let message = issues.to_string();
        assert!(message.contains("Missing name"));
        assert!(message.contains("count") && message.contains("invalid value"));
    }

    #[test]
    fn unrecognized_keys_name_section_and_key() {
        let sections = Sections::new()
            .with_section("section", [("name", "a"), ("bogus", "b")])
            .with_section("wrong-section", [("wrong-param", "c")]);

        let mut issues = Issues::default();
        sections.unrecognized(SCHEMA.iter().map(Param::location), &mut issues);

        assert_eq!(issues.len(), 2);
        assert!(issues
            .iter()
            .all(|issue| issue.kind() == IssueKind::UnrecognizedKey));
        let message = issues.to_string();
        assert!(message.contains("\"bogus\" in section \"section\""));
        assert!(message.contains("\"wrong-param\" in section \"wrong-section\""));
    }

    #[test]
    fn loads_ini_files() -> std::result::Result<(), Box<dyn std::error::Error>> {
        let mut file = tempfile::Builder::new().suffix(".ini").tempfile()?;
        writeln!(file, "[cloud-provider]\naws-region = us-east-1\n")?;
        writeln!(file, "[cluster]\nnum-nodes = 4\n")?;

        let sections = Sections::load_files([file.path()])?;
        assert_eq!(sections.get("cloud-provider", "aws-region"), Some("us-east-1"));
        assert_eq!(sections.get("cluster", "num-nodes"), Some("4"));

        Ok(())
    }

    #[test]
    fn loading_a_missing_file_fails() {
        let err = Sections::load_files(["/this/path/does/not/exist.ini"]).unwrap_err();
        assert!(matches!(err, Error::Load(_)));
    }
}
