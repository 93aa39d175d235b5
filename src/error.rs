use camino::Utf8PathBuf;
use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum PipelineError {
    #[error("invalid accession: {0:?}")]
    InvalidAccession(String),

    #[error("failed to read accession list at {path}: {message}")]
    AccessionList { path: Utf8PathBuf, message: String },

    #[error("ledger I/O failed at {path}: {message}")]
    LedgerIo { path: Utf8PathBuf, message: String },

    #[error("failed to launch {tool}: {message}")]
    ToolLaunch { tool: String, message: String },

    #[error("filesystem error: {0}")]
    Filesystem(String),

    #[error("invalid value for {var}: {value}")]
    InvalidEnvVar { var: String, value: String },

    #[error("failed to read FASTA at {path}: {message}")]
    FastaRead { path: Utf8PathBuf, message: String },

    #[error("window and step sizes must be greater than zero")]
    InvalidWindow,
}
