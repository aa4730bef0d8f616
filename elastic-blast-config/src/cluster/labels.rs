//! Resource labels attached to everything a cluster creates.
//!
//! Labels are written as comma separated `key=value` pairs. Keys must start
//! with a lowercase letter and both keys and values may only hold lowercase
//! letters, digits, underscores and hyphens, up to 63 characters.

use std::sync::LazyLock;

use chrono::DateTime;
use chrono::Utc;
use regex::Regex;

use crate::cluster::LABELS;
use crate::Issues;

/// The value of the project and billing code labels.
pub const PROJECT: &str = "elastic-blast";

/// The maximum length of a label key or value.
pub const MAX_LEN: usize = 63;

/// The format of the creation timestamp.
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d-%H-%M-%S";

/// The pattern a label key must match.
static KEY_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    // SAFETY: this is checked statically to ensure it always unwraps.
    Regex::new(r"^[a-z][a-z0-9_-]{0,62}$").unwrap()
});

/// The pattern a label value must match.
static VALUE_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    // SAFETY: this is checked statically to ensure it always unwraps.
    Regex::new(r"^[a-z0-9_-]{0,63}$").unwrap()
});

/// Lowercases `value` and collapses every run of characters other than
/// letters and digits into a single hyphen.
pub fn normalize(value: &str) -> String {
    let mut normalized = String::with_capacity(value.len());
    let mut pending = false;

    for c in value.chars() {
        if c.is_ascii_alphanumeric() {
            if pending && !normalized.is_empty() {
                normalized.push('-');
            }

            pending = false;
            normalized.push(c.to_ascii_lowercase());
        } else {
            pending = true;
        }
    }

    truncate(normalized)
}

/// Lowercases a storage path and replaces each of its separators with a
/// hyphen.
fn normalize_path(value: &str) -> String {
    let normalized = value
        .chars()
        .map(|c| match c {
            'a'..='z' | '0'..='9' | '_' | '-' => c,
            'A'..='Z' => c.to_ascii_lowercase(),
            _ => '-',
        })
        .collect();

    truncate(normalized)
}

/// Truncates a label value to the maximum length.
fn truncate(mut value: String) -> String {
    value.truncate(MAX_LEN);
    value
}

/// The values that identify a search in its labels.
#[derive(Debug)]
pub struct Subject<'a> {
    /// The cluster name.
    pub cluster_name: &'a str,

    /// The database.
    pub db: &'a str,

    /// The search program.
    pub program: &'a str,

    /// The results location.
    pub results: &'a str,
}

/// Generates the default labels for `subject`, created now by the current
/// user on this host.
pub fn generate(subject: &Subject<'_>) -> String {
    let hostname = whoami::fallible::hostname().unwrap_or_else(|_| String::from("unknown"));
    render(subject, Utc::now(), &hostname, &whoami::username())
}

/// Renders the default labels.
fn render(subject: &Subject<'_>, created: DateTime<Utc>, hostname: &str, user: &str) -> String {
    let user = normalize(user);

    [
        ("project", String::from(PROJECT)),
        ("cluster-name", normalize(subject.cluster_name)),
        ("client-hostname", normalize(hostname)),
        ("created", created.format(TIMESTAMP_FORMAT).to_string()),
        ("owner", user.clone()),
        ("creator", user),
        ("db", normalize(subject.db)),
        ("program", normalize(subject.program)),
        ("billingcode", String::from(PROJECT)),
        ("results", normalize_path(subject.results)),
    ]
    .iter()
    .map(|(key, value)| format!("{key}={value}"))
    .collect::<Vec<_>>()
    .join(",")
}

/// Checks the syntax of user supplied labels, appending any problems to
/// `issues`.
pub fn validate(labels: &str, issues: &mut Issues) {
    for pair in labels.split(',').map(str::trim) {
        match pair.split_once('=') {
            Some((key, value)) if KEY_REGEX.is_match(key) && VALUE_REGEX.is_match(value) => {}
            _ => issues.malformed(
                LABELS,
                pair,
                "labels must be comma separated key=value pairs where keys start with a \
                 lowercase letter and only lowercase letters, digits, underscores and hyphens \
                 are used",
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use chrono::TimeZone as _;
    use regex::Regex;

    use super::*;

    #[test]
    fn the_label_regexes_unwrap() {
        let _ = KEY_REGEX.is_match("");
        let _ = VALUE_REGEX.is_match("");
    }

    #[test]
    fn normalization() {
        assert_eq!(normalize("My:Fancy*DB65"), "my-fancy-db65");
        assert_eq!(normalize("--nr--"), "nr");
        assert_eq!(normalize_path("gs://some-bucket"), "gs---some-bucket");
        assert_eq!(normalize(&"x".repeat(100)).len(), MAX_LEN);
    }

    #[test]
    fn default_labels() {
        let subject = Subject {
            cluster_name: "some-cluster-name",
            db: "My:Fancy*DB65",
            program: "blastn",
            results: "gs://some-bucket-with-interesting-name",
        };
        let created = Utc.with_ymd_and_hms(2021, 3, 4, 5, 6, 7).unwrap();
        let labels = render(&subject, created, "Build.Host", "Some User");

        assert!(!labels.chars().any(|c| c.is_ascii_uppercase()));

        let labels = labels
            .split(',')
            .filter_map(|pair| pair.split_once('='))
            .collect::<HashMap<_, _>>();

        assert_eq!(labels["project"], "elastic-blast");
        assert_eq!(labels["cluster-name"], "some-cluster-name");
        assert_eq!(labels["client-hostname"], "build-host");
        assert_eq!(labels["created"], "2021-03-04-05-06-07");
        assert_eq!(labels["owner"], "some-user");
        assert_eq!(labels["owner"], labels["creator"]);
        assert_eq!(labels["db"], "my-fancy-db65");
        assert_eq!(labels["program"], "blastn");
        assert_eq!(labels["billingcode"], "elastic-blast");
        assert_eq!(labels["results"], "gs---some-bucket-with-interesting-name");
    }

    #[test]
    fn generated_labels_are_valid() {
        let labels = generate(&Subject {
            cluster_name: "elasticblast-user-abc",
            db: "nt",
            program: "megablast",
            results: "s3://results",
        });

        let created = Regex::new(r"created=[0-9]{4}-[0-9]{2}-[0-9]{2}-[0-9]{2}-[0-9]{2}-[0-9]{2}")
            .unwrap();
        assert!(created.is_match(&labels));

        let mut issues = Issues::default();
        validate(&labels, &mut issues);
        assert!(issues.is_empty(), "{issues}");
    }

    #[test]
    fn malformed_labels() {
        let mut issues = Issues::default();
        validate("team=search,Owner=me,lonely", &mut issues);

        assert_eq!(issues.len(), 2);
        let message = issues.to_string();
        assert!(message.contains("Owner=me"));
        assert!(message.contains("lonely"));
    }
}
