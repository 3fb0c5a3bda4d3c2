//! Shared helpers for tests: an in-process synthesizer and shell-script stubs.

use std::{
    cell::RefCell,
    io,
    path::{Path, PathBuf},
    sync::Mutex,
};

use crate::{error::ConversionFailure, synth::Synthesizer};

/// Records every call; creates the output file unless told otherwise.
#[derive(Default)]
pub struct Scripted {
    pub fail_on: Vec<&'static str>,
    pub skip_write: bool,
    pub calls: RefCell<Vec<String>>,
}

impl Synthesizer for Scripted {
    fn synthesize(&self, text: &str, output: &Path) -> Result<(), ConversionFailure> {
        self.calls.borrow_mut().push(text.to_string());
        if self.fail_on.contains(&text) {
            return Err(ConversionFailure::Io(io::Error::other("boom")));
        }
        if !self.skip_write {
            std::fs::write(output, b"RIFF")?;
        }
        Ok(())
    }
}

/// Held by every test that writes or runs a stub script.
///
/// Executing a script while another thread's freshly forked child still holds
/// its write descriptor fails with `ETXTBSY`.
pub static SPAWN_LOCK: Mutex<()> = Mutex::new(());

/// Write an executable `/bin/sh` stub named `piper` into `dir`.
///
/// Piper's argument order is `--model M --output_file OUT`, so the body sees
/// the model as `$2` and the output path as `$4`.
#[cfg(unix)]
pub fn stub(dir: &Path, body: &str) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let path = dir.join("piper");
    std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    path
}
