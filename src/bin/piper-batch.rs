//! Batch text-to-speech with the Piper executable.
//!
//! Usage:
//!   piper-batch                          # demo batch
//!   piper-batch --file lines.txt         # one item per line
//!   piper-batch -f sheet.data -t csv     # explicit format
//!   piper-batch --interactive            # type texts, finish with END
//!
//! Requirements:
//!   - a Piper install under --piper-dir (see `piper-fetch`)

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use piper_batch::{
    interactive, logging, BatchConfig, BatchRunner, ConversionResult, FormatArg, Mode, Report,
    RunOptions,
};
use tracing::warn;

#[derive(Debug, Parser)]
#[command(name = "piper-batch", about = "Batch Text-to-Speech using Piper")]
struct Cli {
    /// Input file path
    #[arg(short, long)]
    file: Option<PathBuf>,

    /// File type
    #[arg(short = 't', long = "type", value_enum, default_value_t = FormatArg::Auto)]
    file_type: FormatArg,

    /// Interactive mode (ignored when --file is given)
    #[arg(short, long)]
    interactive: bool,

    /// Piper install directory (piper_models/ and output/ live here)
    #[arg(long, env = "PIPER_DIR", default_value = "piper_tts")]
    piper_dir: PathBuf,

    /// JSON config file; its fields fill in before the flags below
    #[arg(long)]
    config: Option<PathBuf>,

    #[arg(long)]
    executable: Option<PathBuf>,

    #[arg(long)]
    model: Option<PathBuf>,

    #[arg(long)]
    output_dir: Option<PathBuf>,

    #[arg(long)]
    start_index: Option<usize>,

    /// Audio filename prefix (default: file stem, `audio`, or `demo`)
    #[arg(long)]
    prefix: Option<String>,

    /// Report filename inside the output directory
    #[arg(long)]
    report: Option<String>,
}

impl Cli {
    fn batch_config(&self) -> Result<BatchConfig> {
        let mut config = match &self.config {
            Some(path) => BatchConfig::from_json_file(path, &self.piper_dir)?,
            None => BatchConfig::from_piper_dir(&self.piper_dir),
        };
        if let Some(p) = &self.executable {
            config.executable = p.clone();
        }
        if let Some(p) = &self.model {
            config.model = p.clone();
        }
        if let Some(p) = &self.output_dir {
            config.output_dir = p.clone();
        }
        if let Some(n) = self.start_index {
            config.start_index = n;
        }
        Ok(config)
    }
}

fn main() -> Result<()> {
    logging::init();
    let cli = Cli::parse();

    let config = cli.batch_config()?;
    if config.executable.components().count() > 1 && !config.executable.exists() {
        warn!(
            "Piper executable not found at {} (run `piper-fetch` or pass --executable)",
            config.executable.display()
        );
    }
    if !config.model.exists() {
        warn!("Voice model not found at {}", config.model.display());
    }

    let runner = BatchRunner::new(&config)?;

    let mode = Mode::from_flags(cli.file.clone(), cli.file_type, cli.interactive, || {
        println!("=== Interactive Batch TTS ===");
        interactive::collect_texts(std::io::stdin().lock(), std::io::stdout())
    })?;
    if mode == Mode::Demo {
        println!("Demo mode: Processing sample texts...");
    }
    let options = RunOptions { prefix: cli.prefix.clone(), report: cli.report.clone() };

    let outcome = runner.run(mode, &options)?;
    match &outcome.report {
        Some(path) => summarize(&outcome.results, path),
        None => println!("No texts found; nothing to do."),
    }
    Ok(())
}

fn summarize(results: &[ConversionResult], report_path: &std::path::Path) {
    let report = Report::new(results);
    println!();
    println!(
        "Converted {}/{} ({:.1}%)",
        report.successful(),
        report.total(),
        report.success_rate()
    );
    for failed in results.iter().filter(|r| !r.success()) {
        if let Some(reason) = &failed.failure {
            println!("  ✗ {}: {reason}", failed.filename);
        }
    }
    println!("Report: {}", report_path.display());
}
