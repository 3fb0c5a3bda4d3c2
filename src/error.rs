//! Error taxonomy for batch runs.
//!
//! Two levels, never mixed:
//!
//! | Type                  | Scope       | Effect                                  |
//! |-----------------------|-------------|-----------------------------------------|
//! | [`BatchError`]        | whole batch | returned before any conversion starts   |
//! | [`ConversionFailure`] | one item    | recorded in the result, batch continues |

use std::{io, path::PathBuf};

use thiserror::Error;

/// A failure that prevents a batch from starting.
#[derive(Debug, Error)]
pub enum BatchError {
    #[error("input file {} not found", .0.display())]
    InputNotFound(PathBuf),

    #[error("{}: {reason}", .path.display())]
    Format { path: PathBuf, reason: String },

    #[error("start index {0} is out of range (at most {max})", max = crate::batch::MAX_START_INDEX)]
    InvalidStartIndex(usize),

    #[error("I/O error on {}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl BatchError {
    pub(crate) fn format(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        Self::Format { path: path.into(), reason: reason.to_string() }
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io { path: path.into(), source }
    }
}

/// Why a single item did not produce audio.
#[derive(Debug, Error)]
pub enum ConversionFailure {
    #[error("failed to start {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("I/O error talking to the synthesizer: {0}")]
    Io(#[from] io::Error),

    #[error("synthesizer exited with {}: {stderr}", .code.map_or("a signal".to_string(), |c| format!("status {c}")))]
    ExitStatus { code: Option<i32>, stderr: String },

    #[error("synthesizer reported success but {} was not written", .0.display())]
    MissingOutput(PathBuf),
}
