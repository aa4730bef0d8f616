//! Cluster name generation.

use rand::Rng as _;

use crate::cluster::labels::normalize;

/// The prefix of every generated cluster name.
pub const PREFIX: &str = "elasticblast";

/// A name generator.
pub trait Generator {
    /// Generates a new name.
    fn generate(&self) -> String;
}

/// A generator of names made of the prefix, the user name and a random
/// lowercase alphanumeric suffix.
#[derive(Debug)]
pub struct Alphanumeric {
    /// The length of the randomized portion of the name.
    length: usize,
}

impl Default for Alphanumeric {
    fn default() -> Self {
        Self { length: 8 }
    }
}

impl Generator for Alphanumeric {
    fn generate(&self) -> String {
        let random: String = rand::rng()
            .sample_iter(&rand::distr::Alphanumeric)
            .take(self.length)
            .map(|byte| char::from(byte).to_ascii_lowercase())
            .collect();

        let user = normalize(&whoami::username());
        if user.is_empty() {
            format!("{PREFIX}-{random}")
        } else {
            format!("{PREFIX}-{user}-{random}")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_names_are_lowercase_and_unique() {
        let generator = Alphanumeric::default();
        let first = generator.generate();
        let second = generator.generate();

        assert!(first.starts_with(PREFIX));
        assert!(!first.chars().any(|c| c.is_ascii_uppercase()));
        assert_ne!(first, second);
    }
}
