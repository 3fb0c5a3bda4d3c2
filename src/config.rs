//! Runner configuration: where the Piper executable, its voice model and the
//! generated audio live.
//!
//! A Piper install directory conventionally looks like this (it is what
//! `piper-fetch` produces):
//!
//! ```text
//! <piper_dir>/
//! ├── piper_models/
//! │   ├── piper/piper[.exe]          ← extracted release
//! │   └── en_US-lessac-medium.onnx   ← voice model (+ .onnx.json)
//! └── output/                        ← generated audio and reports
//! ```

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

/// Voice used when nothing else is configured.
pub const DEFAULT_VOICE: &str = "en_US-lessac-medium";

/// Name of the Piper binary inside a release archive.
#[cfg(windows)]
pub const EXECUTABLE_NAME: &str = "piper.exe";
#[cfg(not(windows))]
pub const EXECUTABLE_NAME: &str = "piper";

/// Everything a [`BatchRunner`](crate::BatchRunner) needs to know about its
/// environment.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchConfig {
    /// The speech-synthesis executable.
    pub executable: PathBuf,
    /// Voice model passed as `--model`.
    pub model: PathBuf,
    /// Directory receiving audio files and reports.
    pub output_dir: PathBuf,
    /// Sequence number of the first item (filenames are `{prefix}_{n:03}.wav`).
    pub start_index: usize,
}

/// On-disk form of [`BatchConfig`]; every field is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    piper_dir: Option<PathBuf>,
    executable: Option<PathBuf>,
    model: Option<PathBuf>,
    output_dir: Option<PathBuf>,
    start_index: Option<usize>,
}

impl BatchConfig {
    /// Conventional layout under a Piper install directory.
    pub fn from_piper_dir(piper_dir: impl AsRef<Path>) -> Self {
        let piper_dir = piper_dir.as_ref();
        let models = piper_dir.join("piper_models");
        Self {
            executable: models.join("piper").join(EXECUTABLE_NAME),
            model: models.join(format!("{DEFAULT_VOICE}.onnx")),
            output_dir: piper_dir.join("output"),
            start_index: 1,
        }
    }

    /// Load a JSON config file.
    ///
    /// Missing fields fall back to [`from_piper_dir`](Self::from_piper_dir)
    /// of the file's `piper_dir` when given, otherwise of `default_dir`.
    /// Relative paths are taken as-is (relative to the working directory).
    pub fn from_json_file(path: &Path, default_dir: &Path) -> Result<Self> {
        let bytes = std::fs::read(path)
            .with_context(|| format!("Cannot read config: {}", path.display()))?;
        let file: ConfigFile = serde_json::from_slice(&bytes)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        Ok(file.into_config(default_dir))
    }
}

impl ConfigFile {
    fn into_config(self, default_dir: &Path) -> BatchConfig {
        let base = BatchConfig::from_piper_dir(self.piper_dir.as_deref().unwrap_or(default_dir));
        BatchConfig {
            executable: self.executable.unwrap_or(base.executable),
            model: self.model.unwrap_or(base.model),
            output_dir: self.output_dir.unwrap_or(base.output_dir),
            start_index: self.start_index.unwrap_or(base.start_index),
        }
    }
}
