//! Errors and the collector used to accumulate non-fatal configuration issues.

use std::fmt;

use thiserror::Error;

use crate::database;
use crate::machine;

/// A classification of user-facing failures.
///
/// The classification is stable and is meant to be mapped onto a process exit
/// code by command line tools.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Category {
    /// The configuration supplied by the user is incorrect.
    Input,

    /// A BLAST database cannot be used as configured.
    Database,

    /// An external dependency failed.
    Dependency,

    /// The requested feature is not supported.
    Unsupported,
}

impl Category {
    /// Gets the process exit code associated with the category.
    pub fn exit_code(&self) -> i32 {
        match self {
            Category::Input => 1,
            Category::Database => 2,
            Category::Dependency => 6,
            Category::Unsupported => 255,
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Category::Input => write!(f, "input error"),
            Category::Database => write!(f, "database error"),
            Category::Dependency => write!(f, "dependency error"),
            Category::Unsupported => write!(f, "unsupported feature"),
        }
    }
}

/// The kind of a non-fatal configuration [`Issue`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IssueKind {
    /// A single value failed its syntax rule.
    MalformedValue,

    /// A required parameter was not provided.
    MissingRequiredField,

    /// A section or key is not part of any known schema.
    UnrecognizedKey,

    /// A rule spanning several fields was violated.
    SemanticViolation,
}

/// A single non-fatal problem found in a configuration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Issue {
    /// The kind of issue.
    kind: IssueKind,

    /// The user-facing message.
    message: String,
}

impl Issue {
    /// Gets the kind of the issue.
    pub fn kind(&self) -> IssueKind {
        self.kind
    }

    /// Gets the message of the issue.
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// A collector of [`Issue`]s.
///
/// Validation functions append to a collector rather than failing on the first
/// problem so that every problem can be reported in one pass.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Issues(Vec<Issue>);

impl Issues {
    /// Appends an issue.
    pub fn push(&mut self, kind: IssueKind, message: impl Into<String>) {
        self.0.push(Issue {
            kind,
            message: message.into(),
        });
    }

    /// Records a value for `key` that failed to parse.
    pub fn malformed(&mut self, key: &str, value: &str, reason: impl fmt::Display) {
        self.push(
            IssueKind::MalformedValue,
            format!("Parameter \"{key}\" has an invalid value: \"{value}\" ({reason})"),
        );
    }

    /// Records a required `key` that was not provided.
    pub fn missing(&mut self, key: &str) {
        self.push(IssueKind::MissingRequiredField, format!("Missing {key}"));
    }

    /// Records a `key` within `section` that is not part of any schema.
    pub fn unrecognized(&mut self, section: &str, key: &str) {
        self.push(
            IssueKind::UnrecognizedKey,
            format!("Unrecognized configuration parameter \"{key}\" in section \"{section}\""),
        );
    }

    /// Records a violated cross-field rule.
    pub fn violation(&mut self, message: impl Into<String>) {
        self.push(IssueKind::SemanticViolation, message);
    }

    /// Whether or not any issues were recorded.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The number of recorded issues.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Iterates over the recorded issues.
    pub fn iter(&self) -> impl Iterator<Item = &Issue> {
        self.0.iter()
    }

    /// Moves the issues carried by an [`Error::Invalid`] into `self`.
    ///
    /// Successful results are returned as `Some`, accumulated failures as
    /// `None`, and any other error is propagated.
    pub fn absorb<T>(&mut self, result: Result<T>) -> Result<Option<T>> {
        match result {
            Ok(value) => Ok(Some(value)),
            Err(Error::Invalid(issues)) => {
                self.0.extend(issues.0);
                Ok(None)
            }
            Err(err) => Err(err),
        }
    }

    /// Returns `value` if no issues were recorded and an [`Error::Invalid`]
    /// otherwise.
    pub fn into_result<T>(self, value: T) -> Result<T> {
        if self.is_empty() {
            Ok(value)
        } else {
            Err(Error::Invalid(self))
        }
    }

    /// Converts the issues into a single user-facing report.
    pub fn into_report(self, category: Category) -> Error {
        Error::Report {
            category,
            message: self.to_string(),
        }
    }
}

impl fmt::Display for Issues {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, issue) in self.0.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }

            write!(f, "{issue}")?;
        }

        Ok(())
    }
}

/// An error within this crate.
#[derive(Debug, Error)]
pub enum Error {
    /// A single value failed its syntax rule.
    #[error("invalid value \"{value}\": {rule}")]
    InvalidValue {
        /// The offending input.
        value: String,

        /// The violated rule.
        rule: &'static str,
    },

    /// A required value was missing.
    #[error("Missing {0}")]
    Missing(&'static str),

    /// One or more problems found while reading a section.
    #[error("{0}")]
    Invalid(Issues),

    /// A user-facing report.
    #[error("{message}")]
    Report {
        /// The classification of the report.
        category: Category,

        /// The message.
        message: String,
    },

    /// A requested feature is not implemented.
    #[error("{0} is not implemented")]
    Unimplemented(&'static str),

    /// The configuration was constructed incorrectly.
    #[error("{0}")]
    Usage(String),

    /// Configuration sources could not be loaded.
    #[error("failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    /// A machine type could not be resolved.
    #[error(transparent)]
    Machine(#[from] machine::Error),

    /// Database metadata could not be resolved.
    #[error(transparent)]
    Database(#[from] database::Error),
}

impl Error {
    /// Creates an [`Error::InvalidValue`].
    pub(crate) fn invalid(value: impl Into<String>, rule: &'static str) -> Self {
        Self::InvalidValue {
            value: value.into(),
            rule,
        }
    }

    /// Gets the category of the error.
    pub fn category(&self) -> Category {
        match self {
            Error::InvalidValue { .. }
            | Error::Missing(_)
            | Error::Invalid(_)
            | Error::Usage(_)
            | Error::Load(_) => Category::Input,
            Error::Report { category, .. } => *category,
            Error::Machine(_) => Category::Dependency,
            Error::Unimplemented(_) => Category::Unsupported,
            Error::Database(_) => Category::Database,
        }
    }
}

/// A [`Result`](std::result::Result) with an [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn issues_are_reported_one_per_line() {
        let mut issues = Issues::default();
        issues.missing("gcp-project");
        issues.unrecognized("clustr", "num-cpus");

        let err = issues.into_report(Category::Input);
        assert_eq!(err.category(), Category::Input);
        assert_eq!(
            err.to_string(),
            "Missing gcp-project\nUnrecognized configuration parameter \"num-cpus\" in section \
             \"clustr\""
        );
    }

    #[test]
    fn absorb_collects_invalid_results() {
        let mut inner = Issues::default();
        inner.missing("program");

        let mut issues = Issues::default();
        let value: Option<u32> = issues.absorb(inner.into_result(1)).unwrap();
        assert!(value.is_none());
        assert_eq!(issues.len(), 1);

        let value = issues.absorb(Ok(5)).unwrap();
        assert_eq!(value, Some(5));

        let err = issues
            .absorb::<u32>(Err(Error::Unimplemented("local SSD")))
            .unwrap_err();
        assert_eq!(err.category(), Category::Unsupported);
    }

    #[test]
    fn machine_lookups_are_dependency_errors() {
        let err = Error::from(machine::Error::UnknownMachineType {
            machine_type: String::from("n9-gigantic-512"),
            cloud: crate::provider::Cloud::Gcp,
        });
        assert_eq!(err.category(), Category::Dependency);
    }

    #[test]
    fn exit_codes_are_stable() {
        assert_eq!(Category::Input.exit_code(), 1);
        assert_eq!(Category::Database.exit_code(), 2);
        assert_eq!(Category::Dependency.exit_code(), 6);
        assert_eq!(Category::Unsupported.exit_code(), 255);
    }
}
