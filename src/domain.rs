use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use camino::Utf8PathBuf;
use regex::Regex;
use serde::Serialize;

use crate::error::PipelineError;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Accession(String);

impl Accession {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Loose shape check for run accessions (SRR/ERR/DRR + digits).
    /// Accessions are treated as opaque, so this only drives a warning.
    pub fn looks_like_run_accession(&self) -> bool {
        static RE: OnceLock<Regex> = OnceLock::new();
        let re = RE.get_or_init(|| Regex::new(r"^[SED]RR[0-9]+$").unwrap());
        re.is_match(&self.0)
    }
}

impl fmt::Display for Accession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Accession {
    type Err = PipelineError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        if trimmed.is_empty() || trimmed.chars().any(char::is_whitespace) {
            return Err(PipelineError::InvalidAccession(value.to_string()));
        }
        Ok(Self(trimmed.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadLayout {
    Paired {
        mate1: Utf8PathBuf,
        mate2: Utf8PathBuf,
    },
    Single {
        reads: Utf8PathBuf,
    },
    Absent,
}

impl ReadLayout {
    pub fn describe(&self) -> &'static str {
        match self {
            ReadLayout::Paired { .. } => "paired-end",
            ReadLayout::Single { .. } => "single-end",
            ReadLayout::Absent => "no reads",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineOutcome {
    Completed,
    FailedAfterRetries,
    SkippedAlreadyDone,
}
