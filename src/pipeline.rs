use std::fmt;
use std::fs;

use camino::{Utf8Path, Utf8PathBuf};
use tracing::info;

use crate::config::RunConfig;
use crate::contigs;
use crate::domain::{Accession, ReadLayout};
use crate::tools::{ToolExit, ToolInvocation, ToolRunner};
use crate::workspace::AccessionWorkspace;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Download,
    Locate,
    Validate,
    ExtractReads,
    DetectLayout,
    Assemble,
    Postprocess,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Download => "download",
            Stage::Locate => "locate",
            Stage::Validate => "validate",
            Stage::ExtractReads => "extract-reads",
            Stage::DetectLayout => "detect-layout",
            Stage::Assemble => "assemble",
            Stage::Postprocess => "postprocess",
        };
        write!(f, "{name}")
    }
}

/// One attempt's failure. The stage is informational only; the retry policy
/// restarts from the first stage regardless of where the attempt stopped.
#[derive(Debug)]
pub enum StageFailure {
    ToolInvocation {
        stage: Stage,
        tool: String,
        detail: String,
    },
    ArtifactMissing {
        stage: Stage,
        path: Utf8PathBuf,
    },
    ReadsAbsent {
        dir: Utf8PathBuf,
    },
    Io {
        stage: Stage,
        detail: String,
    },
}

impl StageFailure {
    pub fn stage(&self) -> Stage {
        match self {
            StageFailure::ToolInvocation { stage, .. } => *stage,
            StageFailure::ArtifactMissing { stage, .. } => *stage,
            StageFailure::ReadsAbsent { .. } => Stage::DetectLayout,
            StageFailure::Io { stage, .. } => *stage,
        }
    }
}

impl fmt::Display for StageFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StageFailure::ToolInvocation {
                stage,
                tool,
                detail,
            } => {
                write!(f, "{stage}: {tool} failed ({detail})")
            }
            StageFailure::ArtifactMissing { stage, path } => {
                write!(f, "{stage}: expected {path} not found")
            }
            StageFailure::ReadsAbsent { dir } => {
                write!(f, "detect-layout: no read files in {dir}")
            }
            StageFailure::Io { stage, detail } => write!(f, "{stage}: {detail}"),
        }
    }
}

/// The ordered per-accession stage sequence. Short-circuits on the first
/// failing stage; every tool's exit status is cross-checked against the
/// files it was supposed to produce.
pub struct StagePipeline<'a, T: ToolRunner> {
    config: &'a RunConfig,
    runner: &'a T,
}

impl<'a, T: ToolRunner> StagePipeline<'a, T> {
    pub fn new(config: &'a RunConfig, runner: &'a T) -> Self {
        Self { config, runner }
    }

    pub fn run_once(
        &self,
        accession: &Accession,
        workspace: &AccessionWorkspace,
    ) -> Result<(), StageFailure> {
        self.download(accession)?;
        let archive = self.locate(workspace)?;
        self.validate(&archive)?;
        self.extract_reads(workspace, &archive)?;
        let layout = self.detect_layout(accession, workspace)?;
        self.assemble(workspace, &layout)?;
        self.postprocess(accession, workspace)
    }

    fn download(&self, accession: &Accession) -> Result<(), StageFailure> {
        info!(
            "downloading {accession} with {}",
            self.config.programs.prefetch
        );
        let invocation = ToolInvocation::new(&self.config.programs.prefetch)
            .arg(accession.as_str())
            .arg("--output-directory")
            .arg(self.config.scratch_root.as_str());
        self.invoke(Stage::Download, invocation)
    }

    fn locate(&self, workspace: &AccessionWorkspace) -> Result<Utf8PathBuf, StageFailure> {
        // A clean prefetch exit does not guarantee the archive landed.
        let archive = workspace.archive_path();
        if !archive.exists() {
            return Err(StageFailure::ArtifactMissing {
                stage: Stage::Locate,
                path: archive,
            });
        }
        Ok(archive)
    }

    fn validate(&self, archive: &Utf8Path) -> Result<(), StageFailure> {
        info!("validating {archive}");
        let invocation =
            ToolInvocation::new(&self.config.programs.vdb_validate).arg(archive.as_str());
        self.invoke(Stage::Validate, invocation)
    }

    fn extract_reads(
        &self,
        workspace: &AccessionWorkspace,
        archive: &Utf8Path,
    ) -> Result<(), StageFailure> {
        info!(
            "extracting reads from {archive} with {}",
            self.config.programs.fasterq_dump
        );
        let invocation = ToolInvocation::new(&self.config.programs.fasterq_dump)
            .arg("--split-files")
            .arg("--threads")
            .arg(self.config.threads.to_string())
            .arg("--mem")
            .arg(&self.config.memory)
            .arg("--outdir")
            .arg(workspace.dir().as_str())
            .arg(archive.as_str());
        self.invoke(Stage::ExtractReads, invocation)
    }

    fn detect_layout(
        &self,
        accession: &Accession,
        workspace: &AccessionWorkspace,
    ) -> Result<ReadLayout, StageFailure> {
        let layout = detect_read_layout(workspace);
        if layout == ReadLayout::Absent {
            return Err(StageFailure::ReadsAbsent {
                dir: workspace.dir().to_path_buf(),
            });
        }
        info!("{} reads detected for {accession}", layout.describe());
        Ok(layout)
    }

    fn assemble(
        &self,
        workspace: &AccessionWorkspace,
        layout: &ReadLayout,
    ) -> Result<(), StageFailure> {
        let assembly_dir = workspace.assembly_dir();
        // The assembler refuses an existing output directory; a leftover from
        // a failed attempt is untrusted state anyway.
        if assembly_dir.exists() {
            fs::remove_dir_all(assembly_dir.as_std_path()).map_err(|err| StageFailure::Io {
                stage: Stage::Assemble,
                detail: err.to_string(),
            })?;
        }

        let mut invocation = ToolInvocation::new(&self.config.programs.megahit);
        match layout {
            ReadLayout::Paired { mate1, mate2 } => {
                invocation = invocation
                    .arg("-1")
                    .arg(mate1.as_str())
                    .arg("-2")
                    .arg(mate2.as_str());
            }
            ReadLayout::Single { reads } => {
                invocation = invocation.arg("-r").arg(reads.as_str());
            }
            ReadLayout::Absent => {
                return Err(StageFailure::ReadsAbsent {
                    dir: workspace.dir().to_path_buf(),
                });
            }
        }
        let invocation = invocation
            .arg("-t")
            .arg(self.config.threads.to_string())
            .arg("-o")
            .arg(assembly_dir.as_str());
        info!("assembling with: {invocation}");
        self.invoke(Stage::Assemble, invocation)
    }

    fn postprocess(
        &self,
        accession: &Accession,
        workspace: &AccessionWorkspace,
    ) -> Result<(), StageFailure> {
        // Assembler exit success does not guarantee output existence.
        let source = workspace.contigs_path();
        if !source.exists() {
            return Err(StageFailure::ArtifactMissing {
                stage: Stage::Postprocess,
                path: source,
            });
        }
        let dest = self.config.final_contigs_path(accession);
        let records =
            contigs::rewrite_contigs(&source, &dest, accession).map_err(|err| StageFailure::Io {
                stage: Stage::Postprocess,
                detail: err.to_string(),
            })?;
        info!("wrote {records} contigs for {accession} to {dest}");
        Ok(())
    }

    fn invoke(&self, stage: Stage, invocation: ToolInvocation) -> Result<(), StageFailure> {
        match self.runner.run(&invocation) {
            Ok(ToolExit::Success) => Ok(()),
            Ok(ToolExit::Failure(code)) => Err(StageFailure::ToolInvocation {
                stage,
                tool: invocation.program,
                detail: match code {
                    Some(code) => format!("exit code {code}"),
                    None => "terminated by signal".to_string(),
                },
            }),
            // A spawn failure is classified like any other tool failure and
            // retried; only ledger I/O aborts the batch.
            Err(err) => Err(StageFailure::ToolInvocation {
                stage,
                tool: invocation.program,
                detail: err.to_string(),
            }),
        }
    }
}

/// Probe priority: both mates, then a lone first mate, then an unpaired
/// file. A lone second mate is not guessed at and reads as absent.
pub fn detect_read_layout(workspace: &AccessionWorkspace) -> ReadLayout {
    let mate1 = workspace.mate1_path();
    let mate2 = workspace.mate2_path();
    let unpaired = workspace.unpaired_path();

    if mate1.exists() && mate2.exists() {
        ReadLayout::Paired { mate1, mate2 }
    } else if mate1.exists() {
        ReadLayout::Single { reads: mate1 }
    } else if unpaired.exists() {
        ReadLayout::Single { reads: unpaired }
    } else {
        ReadLayout::Absent
    }
}
