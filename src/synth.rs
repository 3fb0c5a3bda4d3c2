//! The external synthesizer seam.
//!
//! [`Synthesizer`] is the one call the batch runner makes per item.  The
//! production implementation, [`PiperProcess`], runs the Piper executable:
//!
//! ```text
//! piper --model <model.onnx> --output_file <out.wav>   < text on stdin
//! ```
//!
//! with the executable's own directory as working directory (Piper looks for
//! `espeak-ng-data/` and its shared libraries next to itself).

use std::{
    io::{self, Write},
    path::{Path, PathBuf},
    process::{Command, Stdio},
    thread,
};

use tracing::debug;

use crate::{config::BatchConfig, error::ConversionFailure};

/// Turns one piece of text into one audio file.
pub trait Synthesizer {
    /// Synthesize `text` into `output`.
    ///
    /// `Ok(())` only means the engine reported success; the runner still
    /// checks that `output` exists.
    fn synthesize(&self, text: &str, output: &Path) -> Result<(), ConversionFailure>;
}

/// Runs the Piper executable once per call.
#[derive(Debug, Clone)]
pub struct PiperProcess {
    executable: PathBuf,
    model: PathBuf,
}

/// Make `path` absolute so it survives the child's changed working directory.
fn anchored(path: &Path) -> PathBuf {
    std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf())
}

impl PiperProcess {
    pub fn new(executable: impl AsRef<Path>, model: impl AsRef<Path>) -> Self {
        let executable = executable.as_ref();
        // A bare program name is left for the PATH lookup.
        let executable = if executable.components().count() > 1 {
            anchored(executable)
        } else {
            executable.to_path_buf()
        };
        Self { executable, model: anchored(model.as_ref()) }
    }

    pub fn from_config(config: &BatchConfig) -> Self {
        Self::new(&config.executable, &config.model)
    }

    pub fn executable(&self) -> &Path {
        &self.executable
    }

    fn command(&self, output: &Path) -> Command {
        let mut cmd = Command::new(&self.executable);
        cmd.arg("--model")
            .arg(&self.model)
            .arg("--output_file")
            .arg(anchored(output))
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        if let Some(dir) = self.executable.parent().filter(|d| d.is_dir()) {
            cmd.current_dir(dir);
        }
        cmd
    }
}

impl Synthesizer for PiperProcess {
    fn synthesize(&self, text: &str, output: &Path) -> Result<(), ConversionFailure> {
        let mut child = self.command(output).spawn().map_err(|source| ConversionFailure::Spawn {
            program: self.executable.display().to_string(),
            source,
        })?;

        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| io::Error::other("child stdin was not captured"))?;

        // Feed stdin from a second thread so a child that writes a lot before
        // reading cannot deadlock against us.  Dropping `stdin` closes it.
        let (fed, finished) = thread::scope(|s| {
            let feeder = s.spawn(move || stdin.write_all(text.as_bytes()));
            let finished = child.wait_with_output();
            let fed = feeder
                .join()
                .unwrap_or_else(|_| Err(io::Error::other("stdin feeder panicked")));
            (fed, finished)
        });
        let finished = finished?;

        let stdout = String::from_utf8_lossy(&finished.stdout);
        if !stdout.trim().is_empty() {
            debug!(stdout = %stdout.trim(), "synthesizer output");
        }

        if !finished.status.success() {
            return Err(ConversionFailure::ExitStatus {
                code: finished.status.code(),
                stderr: String::from_utf8_lossy(&finished.stderr).trim().to_string(),
            });
        }

        match fed {
            // A child may legitimately exit before draining its input.
            Err(e) if e.kind() != io::ErrorKind::BrokenPipe => Err(ConversionFailure::Io(e)),
            _ => Ok(()),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
