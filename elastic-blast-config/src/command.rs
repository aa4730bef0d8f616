//! The commands a configuration can be validated for.

use std::fmt;
use std::str::FromStr;

use crate::Error;

/// A command (or task) that a configuration is built for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Command {
    /// Submit a search.
    Submit,

    /// Report the status of a search.
    Status,

    /// Delete the resources of a search.
    Delete,

    /// Summarize a finished search.
    RunSummary,
}

impl Command {
    /// Whether or not the command creates resources, which means database and
    /// capacity checks apply.
    pub fn submits(&self) -> bool {
        matches!(self, Command::Submit)
    }
}

impl FromStr for Command {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "submit" => Ok(Command::Submit),
            "status" => Ok(Command::Status),
            "delete" => Ok(Command::Delete),
            "run-summary" => Ok(Command::RunSummary),
            _ => Err(Error::invalid(
                s,
                "expected one of submit, status, delete or run-summary",
            )),
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::Submit => write!(f, "submit"),
            Command::Status => write!(f, "status"),
            Command::Delete => write!(f, "delete"),
            Command::RunSummary => write!(f, "run-summary"),
        }
    }
}
