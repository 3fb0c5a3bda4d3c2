//! Batch orchestration — one synthesizer call per text, in order.
//!
//! ```text
//! texts ──normalize──▶ [TextItem] ──synthesize──▶ [ConversionResult] ──▶ Report
//! ```
//!
//! A failing item is recorded and the batch moves on; only a missing or
//! malformed input file stops a batch, and it does so before anything runs.

use std::path::{Path, PathBuf};

use tracing::{error, info, warn};

use crate::{
    config::BatchConfig,
    error::{BatchError, ConversionFailure},
    input::{self, FormatArg},
    report::Report,
    synth::{PiperProcess, Synthesizer},
};

/// Extension of every generated audio file.
pub const AUDIO_EXTENSION: &str = "wav";

/// Largest accepted first sequence number; keeps `start_index + i` in range.
pub const MAX_START_INDEX: usize = 1_000_000;

/// Characters of text shown in per-item progress lines.
const PROGRESS_PREVIEW_CHARS: usize = 50;

/// First `max` characters of `text` (never splits a code point).
pub(crate) fn truncate_chars(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((end, _)) => &text[..end],
        None => text,
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Items and results
// ─────────────────────────────────────────────────────────────────────────────

/// One text scheduled for synthesis.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextItem {
    pub index: usize,
    pub filename: String,
    pub text: String,
}

impl TextItem {
    pub fn new(prefix: &str, index: usize, text: impl Into<String>) -> Self {
        Self {
            index,
            filename: format!("{prefix}_{index:03}.{AUDIO_EXTENSION}"),
            text: text.into(),
        }
    }
}

/// Normalize `texts` and number them from `start_index`.
///
/// Blank entries are dropped before numbering, so indices have no gaps.
/// `start_index` must not exceed [`MAX_START_INDEX`].
pub fn plan<I, S>(texts: I, prefix: &str, start_index: usize) -> Vec<TextItem>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    input::normalize(texts)
        .into_iter()
        .enumerate()
        .map(|(i, text)| TextItem::new(prefix, start_index + i, text))
        .collect()
}

/// Filename prefix for items read from `path`: its stem.
pub fn file_prefix(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "audio".to_string())
}

/// Outcome of one [`TextItem`].
#[derive(Debug)]
pub struct ConversionResult {
    pub index: usize,
    pub filename: String,
    pub text: String,
    /// `None` when the audio file was produced.
    pub failure: Option<ConversionFailure>,
}

impl ConversionResult {
    pub fn success(&self) -> bool {
        self.failure.is_none()
    }
}

fn remove_stale(output: &Path) -> std::io::Result<()> {
    match std::fs::remove_file(output) {
        Err(e) if e.kind() != std::io::ErrorKind::NotFound => Err(e),
        _ => Ok(()),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// BatchRunner
// ─────────────────────────────────────────────────────────────────────────────

/// Drives a [`Synthesizer`] over a batch of texts.
pub struct BatchRunner<S = PiperProcess> {
    synth: S,
    output_dir: PathBuf,
    start_index: usize,
}

impl BatchRunner<PiperProcess> {
    /// Runner for the Piper executable described by `config`.
    pub fn new(config: &BatchConfig) -> Result<Self, BatchError> {
        Self::with_synthesizer(PiperProcess::from_config(config), &config.output_dir, config.start_index)
    }
}

impl<S: Synthesizer> BatchRunner<S> {
    /// Create the runner, creating `output_dir` if needed.
    pub fn with_synthesizer(
        synth: S,
        output_dir: impl Into<PathBuf>,
        start_index: usize,
    ) -> Result<Self, BatchError> {
        if start_index > MAX_START_INDEX {
            return Err(BatchError::InvalidStartIndex(start_index));
        }
        let output_dir = output_dir.into();
        std::fs::create_dir_all(&output_dir).map_err(|e| BatchError::io(&output_dir, e))?;
        Ok(Self { synth, output_dir, start_index })
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn synthesizer(&self) -> &S {
        &self.synth
    }

    /// Convert a literal list of texts; files are named `{prefix}_{n:03}.wav`.
    pub fn process_texts<I, T>(&self, texts: I, prefix: &str) -> Vec<ConversionResult>
    where
        I: IntoIterator<Item = T>,
        T: AsRef<str>,
    {
        self.process_items(plan(texts, prefix, self.start_index))
    }

    /// Convert the texts in `path`, using the file stem as filename prefix.
    ///
    /// A file with no usable entries yields an empty result list.
    pub fn process_file(
        &self,
        path: &Path,
        format: FormatArg,
    ) -> Result<Vec<ConversionResult>, BatchError> {
        let texts = input::read_texts(path, format).inspect_err(|e| error!("{e}"))?;
        if texts.is_empty() {
            warn!(path = %path.display(), "no texts found in file");
            return Ok(Vec::new());
        }
        Ok(self.process_texts(texts, &file_prefix(path)))
    }

    /// Convert already-planned items, strictly one after another.
    pub fn process_items(&self, items: Vec<TextItem>) -> Vec<ConversionResult> {
        let total = items.len();
        info!("Processing {total} texts…");
        items
            .into_iter()
            .enumerate()
            .map(|(i, item)| self.convert(item, i + 1, total))
            .collect()
    }

    fn convert(&self, item: TextItem, position: usize, total: usize) -> ConversionResult {
        let output = self.output_dir.join(&item.filename);
        info!(
            "[{position}/{total}] {}... -> {}",
            truncate_chars(&item.text, PROGRESS_PREVIEW_CHARS),
            item.filename
        );

        // Exit status alone is not trusted: the file has to be there too,
        // so a leftover from an earlier run must not count.
        let failure = match remove_stale(&output) {
            Err(e) => Some(ConversionFailure::Io(e)),
            Ok(()) => match self.synth.synthesize(&item.text, &output) {
                Ok(()) if output.exists() => None,
                Ok(()) => Some(ConversionFailure::MissingOutput(output)),
                Err(e) => Some(e),
            },
        };
        match &failure {
            None => info!("  ✓ Success: {}", item.filename),
            Some(e) => warn!("  ✗ Failed: {}: {e}", item.filename),
        }

        ConversionResult { index: item.index, filename: item.filename, text: item.text, failure }
    }

    /// Write a report for `results` into the output directory.
    pub fn write_report(&self, results: &[ConversionResult], name: &str) -> Result<PathBuf, BatchError> {
        let path = self.output_dir.join(name);
        Report::new(results).write(&path)?;
        info!("Report saved: {}", path.display());
        Ok(path)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::Scripted;

    fn runner(synth: Scripted) -> (tempfile::TempDir, BatchRunner<Scripted>) {
        let dir = tempfile::tempdir().unwrap();
        let runner = BatchRunner::with_synthesizer(synth, dir.path().join("out"), 1).unwrap();
        (dir, runner)
    }

    #[test]
    fn test_plan_numbers_without_gaps() {
        let items = plan(["Hi", "  ", "Bye"], "demo", 1);
        assert_eq!(
            items,
            vec![TextItem::new("demo", 1, "Hi"), TextItem::new("demo", 2, "Bye")]
        );
        assert_eq!(items[0].filename, "demo_001.wav");
        assert_eq!(items[1].filename, "demo_002.wav");
    }

    #[test]
    fn test_start_index_and_wide_numbers() {
        let items = plan(["a", "b"], "x", 999);
        assert_eq!(items[0].filename, "x_999.wav");
        assert_eq!(items[1].filename, "x_1000.wav");
    }

    #[test]
    fn test_all_success_in_order() {
        let (_dir, runner) = runner(Scripted::default());
        let results = runner.process_texts(["one", "", "two", "three"], "audio");

        assert_eq!(results.len(), 3);
        assert!(results.iter().all(ConversionResult::success));
        let texts: Vec<_> = results.iter().map(|r| r.text.as_str()).collect();
        assert_eq!(texts, ["one", "two", "three"]);
        assert_eq!(*runner.synthesizer().calls.borrow(), ["one", "two", "three"]);
        assert!(runner.output_dir().join("audio_003.wav").exists());
    }

    #[test]
    fn test_failure_does_not_stop_batch() {
        let synth = Scripted { fail_on: vec!["bad"], ..Default::default() };
        let (_dir, runner) = runner(synth);
        let results = runner.process_texts(["ok", "bad", "fine"], "audio");

        let flags: Vec<_> = results.iter().map(ConversionResult::success).collect();
        assert_eq!(flags, [true, false, true]);
        assert_eq!(results[1].index, 2);
    }

    #[test]
    fn test_reported_success_without_file_is_failure() {
        let synth = Scripted { skip_write: true, ..Default::default() };
        let (_dir, runner) = runner(synth);
        let results = runner.process_texts(["ghost"], "audio");

        assert!(matches!(results[0].failure, Some(ConversionFailure::MissingOutput(_))));
    }

    #[test]
    fn test_leftover_file_does_not_count() {
        let synth = Scripted { skip_write: true, ..Default::default() };
        let (_dir, runner) = runner(synth);
        std::fs::write(runner.output_dir().join("demo_001.wav"), b"old").unwrap();

        let results = runner.process_texts(["Hi"], "demo");
        assert!(matches!(results[0].failure, Some(ConversionFailure::MissingOutput(_))));
        assert!(!runner.output_dir().join("demo_001.wav").exists());
    }

    #[test]
    fn test_start_index_out_of_range() {
        let dir = tempfile::tempdir().unwrap();
        let err = BatchRunner::with_synthesizer(Scripted::default(), dir.path(), usize::MAX)
            .err()
            .unwrap();
        assert!(matches!(err, BatchError::InvalidStartIndex(usize::MAX)), "got: {err:?}");
        assert!(BatchRunner::with_synthesizer(Scripted::default(), dir.path(), MAX_START_INDEX).is_ok());
    }

    #[test]
    fn test_process_file_uses_stem_prefix() {
        let (dir, runner) = runner(Scripted::default());
        let path = dir.path().join("chapter.json");
        std::fs::write(&path, r#"["a", {"text": "b"}, {"other": "c"}]"#).unwrap();

        let results = runner.process_file(&path, FormatArg::Auto).unwrap();
        let names: Vec<_> = results.iter().map(|r| r.filename.as_str()).collect();
        assert_eq!(names, ["chapter_001.wav", "chapter_002.wav"]);
    }

    #[test]
    fn test_bad_file_converts_nothing() {
        let (dir, runner) = runner(Scripted::default());
        let path = dir.path().join("broken.json");
        std::fs::write(&path, "{not json").unwrap();

        assert!(runner.process_file(&path, FormatArg::Auto).is_err());
        assert!(runner.process_file(&dir.path().join("missing.txt"), FormatArg::Auto).is_err());
        assert!(runner.synthesizer().calls.borrow().is_empty());
    }

    #[test]
    fn test_empty_file_gives_no_results() {
        let (dir, runner) = runner(Scripted::default());
        let path = dir.path().join("blank.txt");
        std::fs::write(&path, "\n  \n").unwrap();
        assert!(runner.process_file(&path, FormatArg::Auto).unwrap().is_empty());
    }

    #[test]
    fn test_truncate_chars_respects_code_points() {
        assert_eq!(truncate_chars("héllo", 2), "hé");
        assert_eq!(truncate_chars("hi", 50), "hi");
    }

    #[cfg(unix)]
    mod piper_stub {
        use super::super::*;
        use crate::test_support::{stub, SPAWN_LOCK};

        fn piper_runner(body: &str) -> (tempfile::TempDir, BatchRunner) {
            let dir = tempfile::tempdir().unwrap();
            let config = BatchConfig {
                executable: stub(dir.path(), body),
                model: dir.path().join("voice.onnx"),
                output_dir: dir.path().join("output"),
                start_index: 1,
            };
            let runner = BatchRunner::new(&config).unwrap();
            (dir, runner)
        }

        #[test]
        fn test_stub_always_succeeds() {
            let _guard = SPAWN_LOCK.lock().unwrap_or_else(|e| e.into_inner());
            let (_dir, runner) = piper_runner("cat > \"$4\"");
            let results = runner.process_texts(["Hi", "Bye"], "demo");
            let path = runner.write_report(&results, "demo_report.txt").unwrap();

            let report = std::fs::read_to_string(path).unwrap();
            assert!(report.contains("Success Rate: 2/2 (100.0%)"), "got: {report}");
            assert!(report.contains("✓ demo_001.wav: Hi\n"), "got: {report}");
            assert!(report.contains("✓ demo_002.wav: Bye\n"), "got: {report}");
        }

        #[test]
        fn test_stub_always_fails() {
            let _guard = SPAWN_LOCK.lock().unwrap_or_else(|e| e.into_inner());
            let (_dir, runner) = piper_runner("cat > \"$4\"; exit 1");
            let results = runner.process_texts(["one", "two", "three"], "audio");
            assert_eq!(results.len(), 3);
            assert!(results.iter().all(|r| !r.success()));

            let path = runner.write_report(&results, "batch_report.txt").unwrap();
            let report = std::fs::read_to_string(path).unwrap();
            assert!(report.contains("Success Rate: 0/3 (0.0%)"), "got: {report}");
            assert_eq!(report.matches("✗ audio_").count(), 3);
        }

        #[test]
        fn test_stub_exits_zero_without_output() {
            let _guard = SPAWN_LOCK.lock().unwrap_or_else(|e| e.into_inner());
            let (_dir, runner) = piper_runner("cat > /dev/null");
            let results = runner.process_texts(["silent"], "audio");
            assert!(matches!(results[0].failure, Some(ConversionFailure::MissingOutput(_))));
        }

        #[test]
        fn test_stub_exits_zero_over_previous_run() {
            let _guard = SPAWN_LOCK.lock().unwrap_or_else(|e| e.into_inner());
            let (_dir, runner) = piper_runner("cat > /dev/null; exit 0");
            std::fs::write(runner.output_dir().join("demo_001.wav"), b"RIFF").unwrap();

            let results = runner.process_texts(["Hi", "Bye"], "demo");
            let flags: Vec<_> = results.iter().map(ConversionResult::success).collect();
            assert_eq!(flags, [false, false]);
        }
    }
}
