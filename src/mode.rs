//! Run modes of the `piper-batch` tool.
//!
//! | Mode          | Texts                | Default prefix | Report             |
//! |---------------|----------------------|----------------|--------------------|
//! | `Demo`        | [`DEMO_TEXTS`]       | `demo`         | `demo_report.txt`  |
//! | `Interactive` | typed at the prompt  | `audio`        | `batch_report.txt` |
//! | `File`        | parsed from the file | file stem      | `batch_report.txt` |
//!
//! A run that ends up with no items writes no report.

use std::{io, path::PathBuf};

use tracing::{error, warn};

use crate::{
    batch::{file_prefix, BatchRunner, ConversionResult},
    error::BatchError,
    input::{self, FormatArg},
    synth::Synthesizer,
};

/// Sample sentences spoken when no input is given.
pub const DEMO_TEXTS: &[&str] = &[
    "The quick brown fox jumps over the lazy dog.",
    "Speech synthesis technology has advanced significantly in recent years.",
    "This is a demonstration of batch text-to-speech processing.",
    "Machine learning models can generate human-like speech patterns.",
    "Voice cloning and synthesis raise important ethical considerations.",
];

pub const DEMO_REPORT: &str = "demo_report.txt";
pub const BATCH_REPORT: &str = "batch_report.txt";

/// Where the texts of a run come from.
#[derive(Debug, Clone, PartialEq)]
pub enum Mode {
    Demo,
    Interactive(Vec<String>),
    File { path: PathBuf, format: FormatArg },
}

impl Mode {
    /// Pick the mode from command-line flags: a file wins over `interactive`,
    /// and no flags at all mean the demo.  `prompt` runs only in interactive
    /// mode.
    pub fn from_flags<F>(
        file: Option<PathBuf>,
        format: FormatArg,
        interactive: bool,
        prompt: F,
    ) -> io::Result<Self>
    where
        F: FnOnce() -> io::Result<Vec<String>>,
    {
        Ok(match file {
            Some(path) => Mode::File { path, format },
            None if interactive => Mode::Interactive(prompt()?),
            None => Mode::Demo,
        })
    }

    pub fn default_prefix(&self) -> String {
        match self {
            Mode::Demo => "demo".to_string(),
            Mode::Interactive(_) => "audio".to_string(),
            Mode::File { path, .. } => file_prefix(path),
        }
    }

    pub fn report_name(&self) -> &'static str {
        match self {
            Mode::Demo => DEMO_REPORT,
            Mode::Interactive(_) | Mode::File { .. } => BATCH_REPORT,
        }
    }
}

/// User overrides of the per-mode defaults.
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    pub prefix: Option<String>,
    pub report: Option<String>,
}

/// What a finished run produced.
#[derive(Debug)]
pub struct RunOutcome {
    pub results: Vec<ConversionResult>,
    /// `None` when there was nothing to convert.
    pub report: Option<PathBuf>,
}

impl<S: Synthesizer> BatchRunner<S> {
    /// Acquire the texts for `mode`, convert them and write the report.
    ///
    /// Fails only when a file input is missing or malformed, before any
    /// conversion happens.
    pub fn run(&self, mode: Mode, options: &RunOptions) -> Result<RunOutcome, BatchError> {
        let prefix = options.prefix.clone().unwrap_or_else(|| mode.default_prefix());
        let report_name = options.report.as_deref().unwrap_or(mode.report_name()).to_string();

        let texts: Vec<String> = match mode {
            Mode::Demo => DEMO_TEXTS.iter().map(|t| t.to_string()).collect(),
            Mode::Interactive(texts) => texts,
            Mode::File { path, format } => {
                input::read_texts(&path, format).inspect_err(|e| error!("{e}"))?
            }
        };

        let results = self.process_texts(texts, &prefix);
        if results.is_empty() {
            warn!("No texts to process");
            return Ok(RunOutcome { results, report: None });
        }
        let report = self.write_report(&results, &report_name)?;
        Ok(RunOutcome { results, report: Some(report) })
    }
}
