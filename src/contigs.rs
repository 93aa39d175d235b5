use std::fs::{self, File};
use std::io::{self, BufRead, BufReader, BufWriter, Write};

use camino::Utf8Path;

use crate::domain::Accession;

/// Replaces the separator characters the assembler puts in contig headers
/// (`k141_0 flag=1 multi=2.0000 len=287`) so the accession-prefixed name
/// stays a single token.
pub fn sanitize_header(header: &str) -> String {
    header.replace(' ', "_").replace('=', "_")
}

/// Streams the assembler output into the per-accession final contigs file,
/// prefixing every header with the accession. Sequence lines pass through
/// unchanged. Returns the number of contig records written.
pub fn rewrite_contigs(
    source: &Utf8Path,
    dest: &Utf8Path,
    accession: &Accession,
) -> io::Result<usize> {
    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent.as_std_path())?;
    }
    let reader = BufReader::new(File::open(source.as_std_path())?);
    let mut writer = BufWriter::new(File::create(dest.as_std_path())?);

    let mut records = 0usize;
    for line in reader.lines() {
        let line = line?;
        if let Some(header) = line.strip_prefix('>') {
            writeln!(writer, ">{}_{}", accession, sanitize_header(header))?;
            records += 1;
        } else {
            writeln!(writer, "{line}")?;
        }
    }
    writer.flush()?;
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_replaces_spaces_and_equals() {
        assert_eq!(
            sanitize_header("k141_0 flag=1 multi=2.0000 len=287"),
            "k141_0_flag_1_multi_2.0000_len_287"
        );
        assert_eq!(sanitize_header("plain"), "plain");
    }

    #[test]
    fn rewrite_prefixes_headers_only() {
        let temp = tempfile::tempdir().unwrap();
        let source = Utf8Path::from_path(temp.path()).unwrap().join("in.fa");
        let dest = Utf8Path::from_path(temp.path())
            .unwrap()
            .join("contigs/out.fa");
        std::fs::write(
            source.as_std_path(),
            ">k141_0 flag=1 len=7\nACGTACG\nTTTT\n>k141_1\nGGGG\n",
        )
        .unwrap();

        let acc: Accession = "SRR000002".parse().unwrap();
        let records = rewrite_contigs(&source, &dest, &acc).unwrap();
        assert_eq!(records, 2);

        let written = std::fs::read_to_string(dest.as_std_path()).unwrap();
        assert_eq!(
            written,
            ">SRR000002_k141_0_flag_1_len_7\nACGTACG\nTTTT\n>SRR000002_k141_1\nGGGG\n"
        );
    }
}
