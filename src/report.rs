//! Plain-text batch report.
//!
//! ```text
//! Batch TTS Processing Report
//! Generated: 2024-05-01 14:03:22.118254
//! Success Rate: 4/5 (80.0%)
//!
//! ✓ demo_001.wav: The quick brown fox jumps over the lazy dog.
//! ✗ demo_002.wav: Speech synthesis technology has advanced …
//! ```

use std::{fmt::Write as _, path::Path};

use chrono::{DateTime, Local};

use crate::{
    batch::{truncate_chars, ConversionResult},
    error::BatchError,
};

/// Characters of source text kept per report line.
pub const TEXT_PREVIEW_CHARS: usize = 100;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.6f";

/// A snapshot of a finished batch, ready to render.
pub struct Report<'a> {
    generated: DateTime<Local>,
    results: &'a [ConversionResult],
}

impl<'a> Report<'a> {
    pub fn new(results: &'a [ConversionResult]) -> Self {
        Self::with_timestamp(results, Local::now())
    }

    pub fn with_timestamp(results: &'a [ConversionResult], generated: DateTime<Local>) -> Self {
        Self { generated, results }
    }

    pub fn successful(&self) -> usize {
        self.results.iter().filter(|r| r.success()).count()
    }

    pub fn total(&self) -> usize {
        self.results.len()
    }

    /// Success percentage; an empty batch counts as 0 %.
    pub fn success_rate(&self) -> f64 {
        match self.total() {
            0 => 0.0,
            total => self.successful() as f64 / total as f64 * 100.0,
        }
    }

    pub fn render(&self) -> String {
        let mut out = String::new();
        out.push_str("Batch TTS Processing Report\n");
        let _ = writeln!(out, "Generated: {}", self.generated.format(TIMESTAMP_FORMAT));
        let _ = writeln!(
            out,
            "Success Rate: {}/{} ({:.1}%)",
            self.successful(),
            self.total(),
            self.success_rate()
        );
        out.push('\n');
        for r in self.results {
            let marker = if r.success() { '✓' } else { '✗' };
            let _ = writeln!(out, "{marker} {}: {}", r.filename, truncate_chars(&r.text, TEXT_PREVIEW_CHARS));
        }
        out
    }

    pub fn write(&self, path: &Path) -> Result<(), BatchError> {
        std::fs::write(path, self.render()).map_err(|e| BatchError::io(path, e))
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;
    use crate::error::ConversionFailure;

    fn result(index: usize, text: &str, ok: bool) -> ConversionResult {
        ConversionResult {
            index,
            filename: format!("demo_{index:03}.wav"),
            text: text.to_string(),
            failure: (!ok).then(|| ConversionFailure::ExitStatus { code: Some(1), stderr: String::new() }),
        }
    }

    fn at_noon() -> DateTime<Local> {
        Local.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_render_layout() {
        let results = vec![result(1, "Hi", true), result(2, "Bye", false)];
        let text = Report::with_timestamp(&results, at_noon()).render();
        assert_eq!(
            text,
            "Batch TTS Processing Report\n\
             Generated: 2024-05-01 12:00:00.000000\n\
             Success Rate: 1/2 (50.0%)\n\
             \n\
             ✓ demo_001.wav: Hi\n\
             ✗ demo_002.wav: Bye\n"
        );
    }

    #[test]
    fn test_empty_batch() {
        let report = Report::with_timestamp(&[], at_noon());
        assert_eq!(report.success_rate(), 0.0);
        assert!(report.render().contains("Success Rate: 0/0 (0.0%)\n"));
    }

    #[test]
    fn test_rate_rounding() {
        let results = vec![result(1, "a", true), result(2, "b", true), result(3, "c", false)];
        assert!(Report::new(&results).render().contains("Success Rate: 2/3 (66.7%)"));
    }

    #[test]
    fn test_long_text_truncated() {
        let long = "ä".repeat(150);
        let results = vec![result(1, &long, true)];
        let text = Report::new(&results).render();
        let line = text.lines().last().unwrap();
        assert_eq!(line, format!("✓ demo_001.wav: {}", "ä".repeat(TEXT_PREVIEW_CHARS)));
    }

    #[test]
    fn test_write_to_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("batch_report.txt");
        let results = vec![result(1, "Hi", true)];
        Report::new(&results).write(&path).unwrap();
        assert!(std::fs::read_to_string(&path).unwrap().starts_with("Batch TTS Processing Report\n"));
    }
}
