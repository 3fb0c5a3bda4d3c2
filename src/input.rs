//! Input acquisition — turns a text file into the list of lines to speak.
//!
//! | Format | Layout                                                        |
//! |--------|---------------------------------------------------------------|
//! | `txt`  | one item per line                                             |
//! | `csv`  | first field of every record, other columns ignored            |
//! | `json` | array of strings and/or objects carrying a `"text"` field     |
//!
//! Every reader trims whitespace and drops empty entries.  A file that cannot
//! be read as its format fails as a whole: no partial list is ever returned.

use std::{
    collections::HashMap,
    fmt,
    path::Path,
};

use once_cell::sync::Lazy;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::error::BatchError;

/// A concrete input layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InputFormat {
    Txt,
    Csv,
    Json,
}

/// Extension → format.  Anything not listed reads as [`InputFormat::Txt`].
static EXTENSIONS: Lazy<HashMap<&'static str, InputFormat>> = Lazy::new(|| {
    HashMap::from([
        ("txt", InputFormat::Txt),
        ("csv", InputFormat::Csv),
        ("json", InputFormat::Json),
    ])
});

impl InputFormat {
    pub const FALLBACK: InputFormat = InputFormat::Txt;

    /// Look up the format for `path` by its (case-insensitive) extension.
    pub fn from_path(path: &Path) -> Self {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(|ext| EXTENSIONS.get(ext.to_ascii_lowercase().as_str()).copied())
            .unwrap_or(Self::FALLBACK)
    }
}

/// The format as requested by the user: a concrete one, or `auto`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
pub enum FormatArg {
    #[default]
    Auto,
    Txt,
    Csv,
    Json,
}

impl FormatArg {
    /// Resolve to a concrete format, consulting `path` only for `auto`.
    pub fn resolve(self, path: &Path) -> InputFormat {
        match self {
            FormatArg::Auto => InputFormat::from_path(path),
            FormatArg::Txt => InputFormat::Txt,
            FormatArg::Csv => InputFormat::Csv,
            FormatArg::Json => InputFormat::Json,
        }
    }
}

impl fmt::Display for InputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            InputFormat::Txt => "txt",
            InputFormat::Csv => "csv",
            InputFormat::Json => "json",
        })
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Normalisation
// ─────────────────────────────────────────────────────────────────────────────

/// Trim every entry and drop the ones left empty.
pub fn normalize<I, S>(texts: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    texts
        .into_iter()
        .filter_map(|t| {
            let t = t.as_ref().trim();
            (!t.is_empty()).then(|| t.to_string())
        })
        .collect()
}

// ─────────────────────────────────────────────────────────────────────────────
// Readers
// ─────────────────────────────────────────────────────────────────────────────

/// Read the texts in `path` using `format`.
pub fn read_texts(path: &Path, format: FormatArg) -> Result<Vec<String>, BatchError> {
    if !path.exists() {
        return Err(BatchError::InputNotFound(path.to_path_buf()));
    }
    let format = format.resolve(path);
    debug!(path = %path.display(), %format, "reading input");

    let raw = std::fs::read(path).map_err(|e| BatchError::io(path, e))?;
    match format {
        InputFormat::Txt => parse_txt(path, &raw),
        InputFormat::Csv => parse_csv(path, &raw),
        InputFormat::Json => parse_json(path, &raw),
    }
}

fn utf8<'a>(path: &Path, raw: &'a [u8]) -> Result<&'a str, BatchError> {
    std::str::from_utf8(raw).map_err(|e| BatchError::format(path, format!("not valid UTF-8: {e}")))
}

fn parse_txt(path: &Path, raw: &[u8]) -> Result<Vec<String>, BatchError> {
    Ok(normalize(utf8(path, raw)?.lines()))
}

fn parse_csv(path: &Path, raw: &[u8]) -> Result<Vec<String>, BatchError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(raw);

    let mut firsts = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| BatchError::format(path, e))?;
        if let Some(field) = record.get(0) {
            firsts.push(field.to_string());
        }
    }
    Ok(normalize(firsts))
}

/// One element of a JSON input array.
#[derive(Deserialize)]
#[serde(untagged)]
enum JsonEntry {
    Plain(String),
    Record { text: String },
    Other(serde_json::Value),
}

fn parse_json(path: &Path, raw: &[u8]) -> Result<Vec<String>, BatchError> {
    let entries: Vec<JsonEntry> = serde_json::from_slice(raw)
        .map_err(|e| BatchError::format(path, format!("expected a JSON array: {e}")))?;

    let mut texts = Vec::with_capacity(entries.len());
    for (i, entry) in entries.into_iter().enumerate() {
        match entry {
            JsonEntry::Plain(text) | JsonEntry::Record { text } => texts.push(text),
            JsonEntry::Other(value) => {
                warn!(path = %path.display(), index = i, "skipping entry without a text string: {}", value);
            }
        }
    }
    Ok(normalize(texts))
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
