//! The search programs that can be run.

use std::fmt;
use std::str::FromStr;

use serde::Deserialize;
use serde::Serialize;

use crate::database::MolType;
use crate::Error;

/// A search program.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Program {
    /// Nucleotide query against a nucleotide database.
    Blastn,

    /// Protein query against a protein database.
    Blastp,

    /// Translated nucleotide query against a protein database.
    Blastx,

    /// Fast nucleotide search for highly similar sequences.
    Megablast,

    /// Position-specific iterated protein search.
    Psiblast,

    /// Protein query against a conserved domain database.
    Rpsblast,

    /// Translated nucleotide query against a conserved domain database.
    Rpstblastn,

    /// Protein query against a translated nucleotide database.
    Tblastn,

    /// Translated nucleotide query against a translated nucleotide database.
    Tblastx,
}

impl Program {
    /// Every supported program.
    pub const ALL: [Program; 9] = [
        Program::Blastn,
        Program::Blastp,
        Program::Blastx,
        Program::Megablast,
        Program::Psiblast,
        Program::Rpsblast,
        Program::Rpstblastn,
        Program::Tblastn,
        Program::Tblastx,
    ];

    /// Gets the name of the program.
    pub fn as_str(&self) -> &'static str {
        match self {
            Program::Blastn => "blastn",
            Program::Blastp => "blastp",
            Program::Blastx => "blastx",
            Program::Megablast => "megablast",
            Program::Psiblast => "psiblast",
            Program::Rpsblast => "rpsblast",
            Program::Rpstblastn => "rpstblastn",
            Program::Tblastn => "tblastn",
            Program::Tblastx => "tblastx",
        }
    }

    /// Gets the molecule type of the database the program searches.
    pub fn db_mol_type(&self) -> MolType {
        match self {
            Program::Blastn | Program::Megablast | Program::Tblastn | Program::Tblastx => {
                MolType::Nucleotide
            }
            _ => MolType::Protein,
        }
    }

    /// Gets the default number of query residues per batch.
    pub fn batch_len(&self) -> u64 {
        match self {
            Program::Blastn | Program::Megablast => 5_000_000,
            Program::Blastp => 10_000,
            Program::Blastx => 20_004,
            Program::Tblastn => 20_000,
            Program::Tblastx | Program::Psiblast | Program::Rpsblast | Program::Rpstblastn => {
                100_000
            }
        }
    }
}

impl FromStr for Program {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim().to_ascii_lowercase();

        Program::ALL
            .into_iter()
            .find(|program| program.as_str() == name)
            .ok_or_else(|| {
                Error::invalid(
                    s,
                    "expected one of blastn, blastp, blastx, megablast, psiblast, rpsblast, \
                     rpstblastn, tblastn or tblastx",
                )
            })
    }
}

impl fmt::Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_programs() {
        for program in Program::ALL {
            assert_eq!(program.as_str().parse::<Program>().unwrap(), program);
        }

        assert_eq!("BLASTP".parse::<Program>().unwrap(), Program::Blastp);
        assert!("blastq".parse::<Program>().is_err());
    }

    #[test]
    fn molecule_types() {
        assert_eq!(Program::Blastn.db_mol_type(), MolType::Nucleotide);
        assert_eq!(Program::Tblastn.db_mol_type(), MolType::Nucleotide);
        assert_eq!(Program::Blastx.db_mol_type(), MolType::Protein);
        assert_eq!(Program::Rpstblastn.db_mol_type(), MolType::Protein);
    }

    #[test]
    fn batch_lengths() {
        assert_eq!(Program::Megablast.batch_len(), 5_000_000);
        assert_eq!(Program::Blastp.batch_len(), 10_000);
        assert_eq!(Program::Blastx.batch_len(), 20_004);
        assert_eq!(Program::Tblastn.batch_len(), 20_000);
        assert_eq!(Program::Psiblast.batch_len(), 100_000);
    }
}
