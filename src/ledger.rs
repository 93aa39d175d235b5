use std::fs::{self, File, OpenOptions};
use std::io::{self, BufRead, BufReader, Write};

use camino::{Utf8Path, Utf8PathBuf};

use crate::domain::Accession;
use crate::error::PipelineError;

pub const COMPLETED_FILE: &str = "completed.txt";
pub const FAILED_FILE: &str = "failed_accessions.txt";

/// Durable record of terminal per-accession outcomes, backed by two
/// append-only line files under the output root. Entries are never removed
/// or rewritten; a duplicate append is harmless under line-set semantics.
#[derive(Debug, Clone)]
pub struct Ledger {
    completed_path: Utf8PathBuf,
    failed_path: Utf8PathBuf,
}

impl Ledger {
    /// Opens the ledger, creating the output root and both files if absent.
    pub fn open(output_root: &Utf8Path) -> Result<Self, PipelineError> {
        fs::create_dir_all(output_root.as_std_path()).map_err(|err| PipelineError::LedgerIo {
            path: output_root.to_path_buf(),
            message: err.to_string(),
        })?;
        let ledger = Self {
            completed_path: output_root.join(COMPLETED_FILE),
            failed_path: output_root.join(FAILED_FILE),
        };
        ledger.touch(&ledger.completed_path)?;
        ledger.touch(&ledger.failed_path)?;
        Ok(ledger)
    }

    pub fn completed_path(&self) -> &Utf8Path {
        &self.completed_path
    }

    pub fn failed_path(&self) -> &Utf8Path {
        &self.failed_path
    }

    pub fn is_completed(&self, accession: &Accession) -> Result<bool, PipelineError> {
        self.contains(&self.completed_path, accession)
    }

    pub fn mark_completed(&self, accession: &Accession) -> Result<(), PipelineError> {
        self.append(&self.completed_path, accession)
    }

    pub fn mark_failed(&self, accession: &Accession) -> Result<(), PipelineError> {
        self.append(&self.failed_path, accession)
    }

    fn contains(&self, path: &Utf8Path, accession: &Accession) -> Result<bool, PipelineError> {
        let file = match File::open(path.as_std_path()) {
            Ok(file) => file,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(false),
            Err(err) => return Err(self.io_error(path, err)),
        };
        let reader = BufReader::new(file);
        for line in reader.lines() {
            let line = line.map_err(|err| self.io_error(path, err))?;
            if line.trim() == accession.as_str() {
                return Ok(true);
            }
        }
        Ok(false)
    }

    fn append(&self, path: &Utf8Path, accession: &Accession) -> Result<(), PipelineError> {
        let mut file = OpenOptions::new()
            .append(true)
            .create(true)
            .open(path.as_std_path())
            .map_err(|err| self.io_error(path, err))?;
        writeln!(file, "{accession}").map_err(|err| self.io_error(path, err))?;
        // The ledger is the only cross-run memory; flush before reporting
        // the accession as terminal.
        file.sync_all().map_err(|err| self.io_error(path, err))
    }

    fn touch(&self, path: &Utf8Path) -> Result<(), PipelineError> {
        OpenOptions::new()
            .append(true)
            .create(true)
            .open(path.as_std_path())
            .map(|_| ())
            .map_err(|err| self.io_error(path, err))
    }

    fn io_error(&self, path: &Utf8Path, err: io::Error) -> PipelineError {
        PipelineError::LedgerIo {
            path: path.to_path_buf(),
            message: err.to_string(),
        }
    }
}
