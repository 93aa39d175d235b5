use std::fs;

use camino::Utf8Path;
use chrono::Utc;
use serde::Serialize;
use tracing::{info, warn};

use crate::config::RunConfig;
use crate::domain::{Accession, PipelineOutcome};
use crate::error::PipelineError;
use crate::ledger::Ledger;
use crate::pipeline::StagePipeline;
use crate::tools::ToolRunner;
use crate::workspace::AccessionWorkspace;

#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub started_at: String,
    pub finished_at: String,
    pub completed: Vec<String>,
    pub failed: Vec<String>,
    pub skipped: Vec<String>,
}

impl RunSummary {
    pub fn total(&self) -> usize {
        self.completed.len() + self.failed.len() + self.skipped.len()
    }
}

/// Drives the batch: filters already-completed accessions through the
/// ledger, wraps each remaining accession's pipeline in the bounded retry
/// loop, and records terminal outcomes. Accessions are resolved strictly in
/// list order, one at a time; the external tools are resource-heavy enough
/// on their own.
pub struct App<T: ToolRunner> {
    config: RunConfig,
    ledger: Ledger,
    runner: T,
}

impl<T: ToolRunner> App<T> {
    pub fn new(config: RunConfig, ledger: Ledger, runner: T) -> Self {
        Self {
            config,
            ledger,
            runner,
        }
    }

    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    pub fn run(&self, list_path: &Utf8Path) -> Result<RunSummary, PipelineError> {
        let accessions = read_accession_list(list_path)?;
        fs::create_dir_all(self.config.contigs_dir().as_std_path())
            .map_err(|err| PipelineError::Filesystem(err.to_string()))?;
        fs::create_dir_all(self.config.scratch_root.as_std_path())
            .map_err(|err| PipelineError::Filesystem(err.to_string()))?;

        let started_at = Utc::now().to_rfc3339();
        info!("processing {} accessions from {list_path}", accessions.len());

        let mut completed = Vec::new();
        let mut failed = Vec::new();
        let mut skipped = Vec::new();

        for accession in &accessions {
            if !accession.looks_like_run_accession() {
                warn!("{accession} does not look like a run accession; processing anyway");
            }
            match self.resolve(accession)? {
                PipelineOutcome::Completed => completed.push(accession.as_str().to_string()),
                PipelineOutcome::FailedAfterRetries => {
                    failed.push(accession.as_str().to_string())
                }
                PipelineOutcome::SkippedAlreadyDone => {
                    skipped.push(accession.as_str().to_string())
                }
            }
        }

        Ok(RunSummary {
            started_at,
            finished_at: Utc::now().to_rfc3339(),
            completed,
            failed,
            skipped,
        })
    }

    /// Resolves one accession to a terminal outcome. Any stage failure
    /// restarts the whole pipeline from the download stage; partial
    /// workspace state from a failed attempt is not trusted.
    pub fn resolve(&self, accession: &Accession) -> Result<PipelineOutcome, PipelineError> {
        if self.ledger.is_completed(accession)? {
            info!("skipping {accession}: already completed");
            return Ok(PipelineOutcome::SkippedAlreadyDone);
        }

        let workspace = AccessionWorkspace::new(&self.config.scratch_root, accession);
        let pipeline = StagePipeline::new(&self.config, &self.runner);

        let mut failures = 0u32;
        loop {
            match pipeline.run_once(accession, &workspace) {
                Ok(()) => {
                    self.ledger.mark_completed(accession)?;
                    info!("processing completed for {accession}");
                    return Ok(PipelineOutcome::Completed);
                }
                Err(failure) => {
                    failures += 1;
                    if failures > self.config.max_retries {
                        warn!("{accession}: {failure}; maximum retries exceeded");
                        self.ledger.mark_failed(accession)?;
                        return Ok(PipelineOutcome::FailedAfterRetries);
                    }
                    warn!(
                        "{accession}: {failure}; retrying ({failures}/{})",
                        self.config.max_retries
                    );
                }
            }
        }
    }
}

/// One accession per line, whitespace-trimmed, blank lines skipped.
pub fn read_accession_list(path: &Utf8Path) -> Result<Vec<Accession>, PipelineError> {
    let content =
        fs::read_to_string(path.as_std_path()).map_err(|err| PipelineError::AccessionList {
            path: path.to_path_buf(),
            message: err.to_string(),
        })?;
    let mut accessions = Vec::new();
    for line in content.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        accessions.push(trimmed.parse()?);
    }
    Ok(accessions)
}
