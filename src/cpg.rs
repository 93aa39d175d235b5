use std::io::Write;

use crate::error::PipelineError;

pub const DEFAULT_WINDOW: usize = 500;
pub const DEFAULT_STEP: usize = 250;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WindowRatio {
    pub start: usize,
    pub ratio: f64,
}

/// Observed/expected CpG ratio over a sliding window:
/// (count("CG") * window_len) / (count('C') * count('G')), 0 when either
/// base is absent. Only full windows are scored; a sequence shorter than
/// the window yields no rows.
pub fn sliding_cpg(
    seq: &str,
    window: usize,
    step: usize,
) -> Result<Vec<WindowRatio>, PipelineError> {
    if window == 0 || step == 0 {
        return Err(PipelineError::InvalidWindow);
    }
    let seq = seq.to_uppercase();
    let bytes = seq.as_bytes();

    let mut results = Vec::new();
    let mut start = 0usize;
    while start + window <= bytes.len() {
        let slice = &bytes[start..start + window];
        let c_count = slice.iter().filter(|&&base| base == b'C').count();
        let g_count = slice.iter().filter(|&&base| base == b'G').count();
        let cg_count = slice.windows(2).filter(|pair| pair == b"CG").count();
        let ratio = if c_count == 0 || g_count == 0 {
            0.0
        } else {
            (cg_count * window) as f64 / (c_count * g_count) as f64
        };
        results.push(WindowRatio { start, ratio });
        start += step;
    }
    Ok(results)
}

/// One `start<TAB>ratio` line per window.
pub fn write_windows<W: Write>(out: &mut W, windows: &[WindowRatio]) -> Result<(), PipelineError> {
    for window in windows {
        writeln!(out, "{}\t{}", window.start, window.ratio)
            .map_err(|err| PipelineError::Filesystem(err.to_string()))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;
    use crate::error::PipelineError;

    #[test]
    fn known_windows() {
        // "CGCGAATT", window 4, step 2: windows CGCG, CGAA, AATT.
        let windows = sliding_cpg("CGCGAATT", 4, 2).unwrap();
        assert_eq!(windows.len(), 3);

        // CGCG: cg=2, c=2, g=2 -> 2*4/(2*2) = 2.
        assert_eq!(windows[0].start, 0);
        assert!((windows[0].ratio - 2.0).abs() < 1e-9);

        // CGAA: cg=1, c=1, g=1 -> 4.
        assert_eq!(windows[1].start, 2);
        assert!((windows[1].ratio - 4.0).abs() < 1e-9);

        // AATT: no C or G -> 0.
        assert_eq!(windows[2].start, 4);
        assert_eq!(windows[2].ratio, 0.0);
    }

    #[test]
    fn sequence_shorter_than_window() {
        assert!(sliding_cpg("ACGT", 10, 5).unwrap().is_empty());
    }

    #[test]
    fn zero_window_rejected() {
        let err = sliding_cpg("ACGT", 0, 1).unwrap_err();
        assert_matches!(err, PipelineError::InvalidWindow);
        let err = sliding_cpg("ACGT", 4, 0).unwrap_err();
        assert_matches!(err, PipelineError::InvalidWindow);
    }

    #[test]
    fn lowercase_input() {
        let upper = sliding_cpg("CGCGCGCG", 4, 4).unwrap();
        let lower = sliding_cpg("cgcgcgcg", 4, 4).unwrap();
        assert_eq!(upper, lower);
    }

    #[test]
    fn writes_tab_separated_rows() {
        let windows = vec![
            WindowRatio {
                start: 0,
                ratio: 2.0,
            },
            WindowRatio {
                start: 250,
                ratio: 0.0,
            },
        ];
        let mut out = Vec::new();
        write_windows(&mut out, &windows).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "0\t2\n250\t0\n");
    }
}
