//! Normalization of checker output before golden comparison.

use checkgold_version::VersionTuple;
use regex::Regex;

/// Text that ends the path prefix of a diagnostic line.
pub const DEFAULT_SOURCE_MARKER: &str = ".py:";

/// Checkers older than this word some diagnostics differently.
pub const LEGACY_BELOW: [u64; 2] = [0, 930];

/// Whether the legacy wording rewrites apply to this checker version.
pub fn needs_legacy(installed: &VersionTuple) -> bool {
    *installed < VersionTuple::new(&LEGACY_BELOW)
}

/// Golden files are compared with LF line endings and without their
/// trailing newlines.
pub fn prepare_expected(golden: &str) -> String {
    golden.replace("\r\n", "\n").trim_end_matches('\n').to_string()
}

/// Strips environment-specific noise from checker stdout.
#[derive(Debug, Clone)]
pub struct Normalizer {
    marker: String,
    blank_runs: Regex,
    note_continuation: Regex,
}

impl Default for Normalizer {
    fn default() -> Self {
        Self::new(DEFAULT_SOURCE_MARKER)
    }
}

impl Normalizer {
    pub fn new(marker: &str) -> Self {
        Self {
            marker: marker.to_string(),
            blank_runs: Regex::new(r"\n\s*\n").expect("valid regex pattern"),
            note_continuation: Regex::new(r"(?m)^(\d+: note: {4}).*").expect("valid regex pattern"),
        }
    }

    /// Full pipeline: path stripping, trimming, blank-run removal.
    pub fn normalize(&self, raw: &str) -> String {
        let stripped = self.strip_paths(raw);
        self.collapse_blank_runs(stripped.trim())
    }

    /// Keep only the text after the first source marker on each non-empty
    /// line. Lines without the marker (such as the closing summary) become
    /// empty. CRLF endings are dropped along with the newline.
    pub fn strip_paths(&self, raw: &str) -> String {
        raw.lines()
            .filter(|line| !line.is_empty())
            .map(|line| {
                line.split_once(self.marker.as_str())
                    .map(|(_, rest)| rest)
                    .unwrap_or("")
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Replace every newline/whitespace/newline run with one newline.
    pub fn collapse_blank_runs(&self, text: &str) -> String {
        self.blank_runs.replace_all(text, "\n").into_owned()
    }

    /// Rewrites applied to both sides when the installed checker is legacy
    /// and produced output.
    pub fn legacy_pair(&self, actual: &str, expected: &str) -> (String, String) {
        let actual = actual.to_lowercase().replace("variant:", "variants:");
        let expected = expected.to_lowercase();
        (
            self.elide_notes(&actual),
            self.elide_notes(&expected),
        )
    }

    fn elide_notes(&self, text: &str) -> String {
        self.note_continuation
            .replace_all(text, "${1}...")
            .into_owned()
    }

    /// The pair of texts that must be equal for a case to pass.
    pub fn comparable(&self, actual: &str, expected: &str, installed: &VersionTuple) -> (String, String) {
        if !actual.is_empty() && needs_legacy(installed) {
            self.legacy_pair(actual, expected)
        } else {
            (actual.to_string(), expected.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RAW: &str = "\
tests/mypy/modules/plugin_fail.py:24: error: Unexpected keyword argument \"z\" for \"Model\"  [call-arg]
tests/mypy/modules/plugin_fail.py:25: error: Missing named argument \"y\" for \"Model\"  [call-arg]

Found 2 errors in 1 file (checked 1 source file)
";

    #[test]
    fn test_normalize_strips_paths_and_summary() {
        let n = Normalizer::default();
        assert_eq!(
            n.normalize(RAW),
            "24: error: Unexpected keyword argument \"z\" for \"Model\"  [call-arg]\n\
             25: error: Missing named argument \"y\" for \"Model\"  [call-arg]"
        );
    }

    #[test]
    fn test_normalize_windows_paths() {
        let n = Normalizer::default();
        let raw = "C:\\work\\tests\\mypy\\modules\\fail1.py:3: error: boom  [misc]\n";
        assert_eq!(n.normalize(raw), "3: error: boom  [misc]");
    }

    #[test]
    fn test_normalize_crlf_output() {
        let n = Normalizer::default();
        let raw = "C:\\w\\fail1.py:3: error: a  [misc]\r\nC:\\w\\fail1.py:4: error: b  [misc]\r\nFound 2 errors in 1 file (checked 1 source file)\r\n";
        assert_eq!(n.normalize(raw), "3: error: a  [misc]\n4: error: b  [misc]");
    }

    #[test]
    fn test_normalize_keeps_later_markers() {
        let n = Normalizer::default();
        let raw = "a.py:1: note: see other.py: here\n";
        assert_eq!(n.normalize(raw), "1: note: see other.py: here");
    }

    #[test]
    fn test_normalize_empty_output() {
        let n = Normalizer::default();
        assert_eq!(n.normalize(""), "");
        assert_eq!(n.normalize("Success: no issues found in 1 source file\n"), "");
    }

    #[test]
    fn test_collapse_blank_runs_removes_blank_lines() {
        let n = Normalizer::default();
        assert_eq!(n.collapse_blank_runs("a\n\n\nb\n  \t\nc"), "a\nb\nc");
    }

    #[test]
    fn test_unmarked_line_between_diagnostics_removed() {
        let n = Normalizer::default();
        let raw = "x.py:1: error: a\nsome banner\nx.py:2: error: b\n";
        assert_eq!(n.normalize(raw), "1: error: a\n2: error: b");
    }

    #[test]
    fn test_needs_legacy_threshold() {
        assert!(needs_legacy(&VersionTuple::new(&[0, 920])));
        assert!(!needs_legacy(&VersionTuple::new(&[0, 930])));
        assert!(!needs_legacy(&VersionTuple::new(&[1, 4, 1])));
    }

    #[test]
    fn test_legacy_pair_rewrites() {
        let n = Normalizer::default();
        let actual = "10: Error: No overload Variant: x\n11: note:     def f(a: int) -> None";
        let expected = "10: error: no overload variants: x\n11: note:     def f(a: str) -> None";

        let (a, e) = n.legacy_pair(actual, expected);
        assert_eq!(a, "10: error: no overload variants: x\n11: note:     ...");
        assert_eq!(a, e);
    }

    #[test]
    fn test_legacy_note_needs_four_spaces() {
        let n = Normalizer::default();
        let (a, _) = n.legacy_pair("3: note: see docs", "");
        assert_eq!(a, "3: note: see docs");
    }

    #[test]
    fn test_comparable_skips_legacy_for_empty_actual() {
        let n = Normalizer::default();
        let old = VersionTuple::new(&[0, 910]);
        let (a, e) = n.comparable("", "Expected", &old);
        assert_eq!(a, "");
        assert_eq!(e, "Expected");
    }

    #[test]
    fn test_comparable_modern_is_identity() {
        let n = Normalizer::default();
        let (a, e) = n.comparable("1: Error", "1: error", &VersionTuple::new(&[1, 0]));
        assert_ne!(a, e);
    }

    #[test]
    fn test_prepare_expected_trims_trailing_newlines_only() {
        assert_eq!(prepare_expected("1: error: x\n\n"), "1: error: x");
        assert_eq!(prepare_expected("  1: error: x"), "  1: error: x");
    }

    #[test]
    fn test_prepare_expected_crlf_golden() {
        assert_eq!(prepare_expected("3: error: a\r\n4: error: b\r\n"), "3: error: a\n4: error: b");
    }
}
