use camino::{Utf8Path, Utf8PathBuf};

use crate::domain::Accession;

pub const ASSEMBLY_SUBDIR: &str = "megahit_out";
pub const ASSEMBLER_CONTIGS: &str = "final.contigs.fa";

/// Scratch directory layout for one accession. The path is a pure function
/// of the scratch root and the accession, so every retry (and every re-run
/// after an interruption) lands in the same place.
#[derive(Debug, Clone)]
pub struct AccessionWorkspace {
    dir: Utf8PathBuf,
    accession: Accession,
}

impl AccessionWorkspace {
    pub fn new(scratch_root: &Utf8Path, accession: &Accession) -> Self {
        Self {
            dir: scratch_root.join(accession.as_str()),
            accession: accession.clone(),
        }
    }

    pub fn dir(&self) -> &Utf8Path {
        &self.dir
    }

    pub fn archive_path(&self) -> Utf8PathBuf {
        self.dir.join(format!("{}.sra", self.accession))
    }

    pub fn mate1_path(&self) -> Utf8PathBuf {
        self.dir.join(format!("{}_1.fastq", self.accession))
    }

    pub fn mate2_path(&self) -> Utf8PathBuf {
        self.dir.join(format!("{}_2.fastq", self.accession))
    }

    pub fn unpaired_path(&self) -> Utf8PathBuf {
        self.dir.join(format!("{}.fastq", self.accession))
    }

    pub fn assembly_dir(&self) -> Utf8PathBuf {
        self.dir.join(ASSEMBLY_SUBDIR)
    }

    pub fn contigs_path(&self) -> Utf8PathBuf {
        self.assembly_dir().join(ASSEMBLER_CONTIGS)
    }
}
