use std::collections::HashMap;
use std::io::Write;

use crate::error::PipelineError;
use crate::fasta::FastaRecord;

/// Fixed column order of the output table.
pub const DINUCLEOTIDES: [&str; 16] = [
    "AA", "AT", "AC", "AG", "TA", "TT", "TC", "TG", "CA", "CT", "CC", "CG", "GA", "GT", "GC", "GG",
];

/// Odds ratio f(XY) / (f(X) * f(Y)) for every dinucleotide observed in the
/// uppercased sequence, with f(XY) over overlapping windows. Sequences
/// shorter than two bases have no windows and produce an empty map.
pub fn odds_ratios(seq: &str) -> HashMap<String, f64> {
    let seq = seq.to_uppercase();
    let bytes = seq.as_bytes();
    if bytes.len() < 2 {
        return HashMap::new();
    }

    let mut base_counts: HashMap<u8, usize> = HashMap::new();
    for &base in bytes {
        *base_counts.entry(base).or_insert(0) += 1;
    }
    let mut pair_counts: HashMap<[u8; 2], usize> = HashMap::new();
    for pair in bytes.windows(2) {
        *pair_counts.entry([pair[0], pair[1]]).or_insert(0) += 1;
    }

    let len = bytes.len() as f64;
    let windows = (bytes.len() - 1) as f64;
    pair_counts
        .into_iter()
        .map(|(pair, count)| {
            let f_xy = count as f64 / windows;
            let f_x = base_counts[&pair[0]] as f64 / len;
            let f_y = base_counts[&pair[1]] as f64 / len;
            let name = String::from_utf8_lossy(&pair).into_owned();
            (name, f_xy / (f_x * f_y))
        })
        .collect()
}

/// Writes the TSV table: one header row, then one row per record with the
/// 16 standard dinucleotide ratios to two decimals (0 when absent).
pub fn write_table<W, I>(out: &mut W, records: I) -> Result<(), PipelineError>
where
    W: Write,
    I: IntoIterator<Item = Result<FastaRecord, PipelineError>>,
{
    writeln!(out, "Sequence\t{}", DINUCLEOTIDES.join("\t"))
        .map_err(|err| PipelineError::Filesystem(err.to_string()))?;
    for record in records {
        let record = record?;
        let ratios = odds_ratios(&record.seq);
        let mut row = record.name.clone();
        for dinuc in DINUCLEOTIDES {
            match ratios.get(dinuc) {
                Some(ratio) => row.push_str(&format!("\t{ratio:.2}")),
                None => row.push_str("\t0"),
            }
        }
        writeln!(out, "{row}").map_err(|err| PipelineError::Filesystem(err.to_string()))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uniform_sequence_single_dinucleotide() {
        // "AAAA": f(AA) = 1, f(A) = 1, ratio = 1.
        let ratios = odds_ratios("AAAA");
        assert_eq!(ratios.len(), 1);
        assert!((ratios["AA"] - 1.0).abs() < 1e-9);
    }

    #[test]
    fn alternating_sequence() {
        // "ATAT": windows AT,TA,AT over 3; f(AT)=2/3, f(A)=f(T)=1/2.
        let ratios = odds_ratios("ATAT");
        assert!((ratios["AT"] - (2.0 / 3.0) / 0.25).abs() < 1e-9);
        assert!((ratios["TA"] - (1.0 / 3.0) / 0.25).abs() < 1e-9);
        assert!(!ratios.contains_key("TT"));
    }

    #[test]
    fn lowercase_input_is_uppercased() {
        assert_eq!(odds_ratios("acgt"), odds_ratios("ACGT"));
    }

    #[test]
    fn short_sequence_is_empty() {
        assert!(odds_ratios("A").is_empty());
        assert!(odds_ratios("").is_empty());
    }

    #[test]
    fn table_layout() {
        let records = vec![Ok(FastaRecord {
            name: "chr1 test".to_string(),
            seq: "AAAA".to_string(),
        })];
        let mut out = Vec::new();
        write_table(&mut out, records).unwrap();
        let text = String::from_utf8(out).unwrap();
        let mut lines = text.lines();
        assert_eq!(
            lines.next().unwrap(),
            "Sequence\tAA\tAT\tAC\tAG\tTA\tTT\tTC\tTG\tCA\tCT\tCC\tCG\tGA\tGT\tGC\tGG"
        );
        let row = lines.next().unwrap();
        assert!(row.starts_with("chr1 test\t1.00\t0\t0"));
        assert_eq!(row.split('\t').count(), 17);
    }
}
