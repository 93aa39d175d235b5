use camino::Utf8PathBuf;

use crate::domain::Accession;
use crate::error::PipelineError;

pub const DEFAULT_MAX_RETRIES: u32 = 2;
pub const DEFAULT_THREADS: u32 = 32;
pub const DEFAULT_MEMORY: &str = "64GB";
pub const DEFAULT_OUTPUT_ROOT: &str = "sra-batch-output";

/// Programs invoked for each pipeline stage. Overriding these is how
/// container wrappers (singularity, docker) are injected; the pipeline
/// itself never composes shell strings.
#[derive(Debug, Clone)]
pub struct ToolPrograms {
    pub prefetch: String,
    pub vdb_validate: String,
    pub fasterq_dump: String,
    pub megahit: String,
}

impl Default for ToolPrograms {
    fn default() -> Self {
        Self {
            prefetch: "prefetch".to_string(),
            vdb_validate: "vdb-validate".to_string(),
            fasterq_dump: "fasterq-dump".to_string(),
            megahit: "megahit".to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct RunConfig {
    pub scratch_root: Utf8PathBuf,
    pub output_root: Utf8PathBuf,
    pub max_retries: u32,
    pub threads: u32,
    pub memory: String,
    pub programs: ToolPrograms,
}

impl RunConfig {
    pub fn from_env() -> Result<Self, PipelineError> {
        Self::resolve(|var| std::env::var(var).ok())
    }

    pub fn resolve<F>(lookup: F) -> Result<Self, PipelineError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |var: &str| {
            lookup(var)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let scratch_root = match get("SRA_BATCH_SCRATCH").or_else(|| get("TMPDIR")) {
            Some(path) => Utf8PathBuf::from(path),
            None => Utf8PathBuf::from_path_buf(std::env::temp_dir())
                .map_err(|_| PipelineError::Filesystem("invalid temp dir path".to_string()))?,
        };

        let output_root = get("SRA_BATCH_OUTPUT")
            .map(Utf8PathBuf::from)
            .unwrap_or_else(|| Utf8PathBuf::from(DEFAULT_OUTPUT_ROOT));

        let max_retries = parse_var(get("SRA_BATCH_MAX_RETRIES"), "SRA_BATCH_MAX_RETRIES")?
            .unwrap_or(DEFAULT_MAX_RETRIES);
        let threads =
            parse_var(get("SRA_BATCH_THREADS"), "SRA_BATCH_THREADS")?.unwrap_or(DEFAULT_THREADS);
        let memory = get("SRA_BATCH_MEM").unwrap_or_else(|| DEFAULT_MEMORY.to_string());

        let defaults = ToolPrograms::default();
        let programs = ToolPrograms {
            prefetch: get("SRA_BATCH_PREFETCH").unwrap_or(defaults.prefetch),
            vdb_validate: get("SRA_BATCH_VDB_VALIDATE").unwrap_or(defaults.vdb_validate),
            fasterq_dump: get("SRA_BATCH_FASTERQ_DUMP").unwrap_or(defaults.fasterq_dump),
            megahit: get("SRA_BATCH_MEGAHIT").unwrap_or(defaults.megahit),
        };

        Ok(Self {
            scratch_root,
            output_root,
            max_retries,
            threads,
            memory,
            programs,
        })
    }

    pub fn contigs_dir(&self) -> Utf8PathBuf {
        self.output_root.join("contigs")
    }

    pub fn final_contigs_path(&self, accession: &Accession) -> Utf8PathBuf {
        self.contigs_dir()
            .join(format!("{accession}_final_contigs.fa"))
    }
}

fn parse_var(value: Option<String>, var: &str) -> Result<Option<u32>, PipelineError> {
    match value {
        Some(raw) => raw
            .parse::<u32>()
            .map(Some)
            .map_err(|_| PipelineError::InvalidEnvVar {
                var: var.to_string(),
                value: raw,
            }),
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;
    use crate::error::PipelineError;

    #[test]
    fn defaults_when_unset() {
        let config = RunConfig::resolve(|_| None).unwrap();
        assert_eq!(config.output_root, Utf8PathBuf::from(DEFAULT_OUTPUT_ROOT));
        assert_eq!(config.max_retries, DEFAULT_MAX_RETRIES);
        assert_eq!(config.threads, DEFAULT_THREADS);
        assert_eq!(config.memory, DEFAULT_MEMORY);
        assert_eq!(config.programs.prefetch, "prefetch");
        assert_eq!(config.programs.megahit, "megahit");
    }

    #[test]
    fn env_overrides() {
        let config = RunConfig::resolve(|var| match var {
            "SRA_BATCH_SCRATCH" => Some("/scratch/jobs".to_string()),
            "SRA_BATCH_OUTPUT" => Some("/data/run1".to_string()),
            "SRA_BATCH_MAX_RETRIES" => Some("5".to_string()),
            "SRA_BATCH_THREADS" => Some("8".to_string()),
            "SRA_BATCH_MEM" => Some("16GB".to_string()),
            "SRA_BATCH_MEGAHIT" => Some("/containers/megahit.sif".to_string()),
            _ => None,
        })
        .unwrap();
        assert_eq!(config.scratch_root, Utf8PathBuf::from("/scratch/jobs"));
        assert_eq!(config.output_root, Utf8PathBuf::from("/data/run1"));
        assert_eq!(config.max_retries, 5);
        assert_eq!(config.threads, 8);
        assert_eq!(config.memory, "16GB");
        assert_eq!(config.programs.megahit, "/containers/megahit.sif");
        assert_eq!(config.contigs_dir(), Utf8PathBuf::from("/data/run1/contigs"));
    }

    #[test]
    fn tmpdir_fallback_for_scratch() {
        let config = RunConfig::resolve(|var| match var {
            "TMPDIR" => Some("/tmp/job123".to_string()),
            _ => None,
        })
        .unwrap();
        assert_eq!(config.scratch_root, Utf8PathBuf::from("/tmp/job123"));
    }

    #[test]
    fn rejects_non_numeric_retries() {
        let err = RunConfig::resolve(|var| match var {
            "SRA_BATCH_MAX_RETRIES" => Some("many".to_string()),
            _ => None,
        })
        .unwrap_err();
        assert_matches!(err, PipelineError::InvalidEnvVar { .. });
    }
}
