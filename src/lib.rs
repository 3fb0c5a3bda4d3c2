//! # piper-batch
//!
//! Batch text-to-speech on top of the [Piper](https://github.com/rhasspy/piper)
//! command-line synthesizer.  No synthesis happens in-process: every text is
//! piped into the external `piper` executable, one child process per item.
//!
//! ## Quick start
//!
//! ```no_run
//! use piper_batch::{BatchConfig, BatchRunner};
//!
//! let config = BatchConfig::from_piper_dir("piper_tts");
//! let runner = BatchRunner::new(&config).unwrap();
//!
//! let results = runner.process_texts(["Hello from Rust!", "Second line."], "demo");
//! runner.write_report(&results, "demo_report.txt").unwrap();
//! ```
//!
//! Texts can also come from a file (`.txt`, `.csv` or `.json`):
//!
//! ```no_run
//! # use piper_batch::{BatchConfig, BatchRunner, FormatArg};
//! # let runner = BatchRunner::new(&BatchConfig::from_piper_dir("piper_tts")).unwrap();
//! let results = runner
//!     .process_file(std::path::Path::new("chapter.json"), FormatArg::Auto)
//!     .unwrap();
//! ```
//!
//! ## Pipeline
//! 1. **Input** — literal list, interactive prompt or file; trimmed, blanks dropped.
//! 2. **Plan** — items numbered from `start_index`, named `{prefix}_{n:03}.wav`.
//! 3. **Synthesize** — `piper --model … --output_file …` per item, text on stdin.
//! 4. **Check** — success needs exit status 0 *and* the output file on disk.
//! 5. **Report** — success rate plus one ✓/✗ line per item.
//!
//! A failed item never stops the batch.  A missing or malformed input file
//! stops it before the first item runs.

pub mod batch;
pub mod config;
pub mod error;
pub mod input;
pub mod interactive;
pub mod mode;
pub mod report;
pub mod synth;

// Release archive + voice model fetcher; needs network crates.
#[cfg(feature = "download")]
pub mod download;

#[cfg(feature = "cli")]
pub mod logging;

#[cfg(test)]
mod test_support;

// ─── Re-exports for convenience ─────────────────────────────────────────────

pub use batch::{BatchRunner, ConversionResult, TextItem};
pub use config::BatchConfig;
pub use error::{BatchError, ConversionFailure};
pub use input::{FormatArg, InputFormat};
pub use mode::{Mode, RunOptions, RunOutcome};
pub use report::Report;
pub use synth::{PiperProcess, Synthesizer};
