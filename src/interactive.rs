//! Line-by-line text entry, finished by typing `END`.

use std::io::{self, BufRead, Write};

/// Typed on its own line (any case) to finish entry.
pub const SENTINEL: &str = "END";

const PROMPT: &str = "Text: ";

/// Prompt on `out` and collect lines from `input` until [`SENTINEL`] or EOF.
///
/// Lines are trimmed; blank ones are ignored.
pub fn collect_texts<R: BufRead, W: Write>(mut input: R, mut out: W) -> io::Result<Vec<String>> {
    writeln!(out, "Enter texts (one per line). Type '{SENTINEL}' to finish:")?;

    let mut texts = Vec::new();
    let mut line = String::new();
    loop {
        write!(out, "{PROMPT}")?;
        out.flush()?;

        line.clear();
        if input.read_line(&mut line)? == 0 {
            writeln!(out)?;
            break;
        }
        let text = line.trim();
        if text.eq_ignore_ascii_case(SENTINEL) {
            break;
        }
        if !text.is_empty() {
            texts.push(text.to_string());
        }
    }
    Ok(texts)
}
