use std::fs::File;
use std::io::{self, BufRead, BufReader};

use camino::{Utf8Path, Utf8PathBuf};
use flate2::read::MultiGzDecoder;

use crate::error::PipelineError;

/// One multi-FASTA record. The name is the full header line after `>`,
/// trimmed, not just the first word.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FastaRecord {
    pub name: String,
    pub seq: String,
}

/// Streaming multi-FASTA reader. Files ending in `.gz` are transparently
/// decompressed.
pub struct FastaReader {
    reader: Box<dyn BufRead>,
    path: Utf8PathBuf,
    pending: Option<String>,
    line: String,
}

impl FastaReader {
    pub fn open(path: &Utf8Path) -> Result<Self, PipelineError> {
        let file = File::open(path.as_std_path()).map_err(|err| fasta_error(path, err))?;
        let reader: Box<dyn BufRead> = if path.extension() == Some("gz") {
            Box::new(BufReader::new(MultiGzDecoder::new(file)))
        } else {
            Box::new(BufReader::new(file))
        };
        let mut this = Self {
            reader,
            path: path.to_path_buf(),
            pending: None,
            line: String::new(),
        };
        // Skip anything before the first header.
        loop {
            this.line.clear();
            let read = this
                .reader
                .read_line(&mut this.line)
                .map_err(|err| fasta_error(&this.path, err))?;
            if read == 0 {
                break;
            }
            if let Some(header) = this.line.strip_prefix('>') {
                this.pending = Some(header.trim().to_string());
                break;
            }
        }
        Ok(this)
    }

    pub fn read_next(&mut self) -> Result<Option<FastaRecord>, PipelineError> {
        let Some(name) = self.pending.take() else {
            return Ok(None);
        };
        let mut seq = String::new();
        loop {
            self.line.clear();
            let read = self
                .reader
                .read_line(&mut self.line)
                .map_err(|err| fasta_error(&self.path, err))?;
            if read == 0 {
                break;
            }
            if let Some(header) = self.line.strip_prefix('>') {
                self.pending = Some(header.trim().to_string());
                break;
            }
            seq.push_str(self.line.trim());
        }
        Ok(Some(FastaRecord { name, seq }))
    }
}

impl Iterator for FastaReader {
    type Item = Result<FastaRecord, PipelineError>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.read_next() {
            Ok(Some(record)) => Some(Ok(record)),
            Ok(None) => None,
            Err(err) => Some(Err(err)),
        }
    }
}

fn fasta_error(path: &Utf8Path, err: io::Error) -> PipelineError {
    PipelineError::FastaRead {
        path: path.to_path_buf(),
        message: err.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_fixture(content: &str) -> (tempfile::TempDir, Utf8PathBuf) {
        let temp = tempfile::tempdir().unwrap();
        let path = Utf8PathBuf::from_path_buf(temp.path().join("input.fa")).unwrap();
        std::fs::write(path.as_std_path(), content).unwrap();
        (temp, path)
    }

    #[test]
    fn reads_multiline_records() {
        let (_temp, path) = write_fixture(">seq1 desc=a\nACGT\nacgt\n>seq2\nTTTT\n");
        let mut reader = FastaReader::open(&path).unwrap();

        let first = reader.read_next().unwrap().unwrap();
        assert_eq!(first.name, "seq1 desc=a");
        assert_eq!(first.seq, "ACGTacgt");

        let second = reader.read_next().unwrap().unwrap();
        assert_eq!(second.name, "seq2");
        assert_eq!(second.seq, "TTTT");

        assert!(reader.read_next().unwrap().is_none());
    }

    #[test]
    fn empty_file_yields_no_records() {
        let (_temp, path) = write_fixture("");
        let mut reader = FastaReader::open(&path).unwrap();
        assert!(reader.read_next().unwrap().is_none());
    }

    #[test]
    fn iterator_collects_records() {
        let (_temp, path) = write_fixture(">a\nAC\n>b\nGT\n");
        let records: Vec<FastaRecord> = FastaReader::open(&path)
            .unwrap()
            .collect::<Result<_, _>>()
            .unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].name, "b");
    }
}
