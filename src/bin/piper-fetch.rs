//! Download the Piper executable (and optionally a voice) into a Piper
//! install directory laid out the way `piper-batch` expects.
//!
//! Usage:
//!   piper-fetch
//!   piper-fetch --voice en_US-lessac-medium
//!   piper-fetch --url https://…/piper_linux_x86_64.tar.gz --skip-release --voice en_GB-alan-low

use std::{path::PathBuf, process::ExitCode};

use clap::Parser;
use piper_batch::{config::DEFAULT_VOICE, download, logging};
use tracing::error;

#[derive(Debug, Parser)]
#[command(name = "piper-fetch", about = "Download the Piper executable and voices")]
struct Cli {
    /// Piper install directory; files land in <piper-dir>/piper_models
    #[arg(long, env = "PIPER_DIR", default_value = "piper_tts")]
    piper_dir: PathBuf,

    /// Release archive URL to try (repeatable, tried in order)
    #[arg(long = "url")]
    urls: Vec<String>,

    /// Skip the release archive
    #[arg(long)]
    skip_release: bool,

    /// Also download this voice from the piper-voices repository
    #[arg(long, num_args = 0..=1, default_missing_value = DEFAULT_VOICE)]
    voice: Option<String>,
}

fn main() -> ExitCode {
    logging::init();
    let cli = Cli::parse();
    let dest = cli.piper_dir.join("piper_models");
    let mut ok = true;

    if !cli.skip_release {
        let urls: Vec<String> = if cli.urls.is_empty() {
            download::DEFAULT_RELEASE_URLS.iter().map(|u| u.to_string()).collect()
        } else {
            cli.urls.clone()
        };
        match download::fetch_release(&urls, &dest) {
            Ok(url) => {
                println!("Fetched {url}");
                println!("\nPiper files in {}:", dest.display());
                for path in download::find_executables(&dest) {
                    println!("  Found: {}", path.display());
                }
            }
            Err(e) => {
                error!("{e}");
                if let download::FetchError::AllCandidatesFailed(attempts) = &e {
                    for a in attempts {
                        println!("  {} → {}", a.url, a.reason);
                    }
                }
                println!("Download failed. Please download manually from GitHub.");
                ok = false;
            }
        }
    }

    if let Some(voice) = &cli.voice {
        match download::fetch_voice(voice, &dest) {
            Ok(model) => println!("Voice model: {}", model.display()),
            Err(e) => {
                error!("Voice download failed: {e:#}");
                ok = false;
            }
        }
    }

    if ok { ExitCode::SUCCESS } else { ExitCode::FAILURE }
}
