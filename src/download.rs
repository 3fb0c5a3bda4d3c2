//! Piper release and voice downloader.
//!
//! * [`fetch_release`] tries a list of release-archive URLs in order and
//!   unpacks the first one that downloads.
//! * [`fetch_voice`] pulls a voice model (`.onnx` + `.onnx.json`) from the
//!   `rhasspy/piper-voices` HuggingFace repository.

use std::{
    fs::File,
    io,
    path::{Path, PathBuf},
};

use anyhow::{bail, Context, Result};
use hf_hub::api::sync::Api;
use thiserror::Error;
use tracing::{info, warn};

/// Release archives tried when no URL is given, most likely first.
pub const DEFAULT_RELEASE_URLS: &[&str] = &[
    "https://github.com/rhasspy/piper/releases/download/2023.11.14-2/piper_amd64.tar.gz",
    "https://github.com/rhasspy/piper/releases/download/v1.2.0/piper_amd64.tar.gz",
    "https://github.com/rhasspy/piper/releases/latest/download/piper_windows_amd64.zip",
    "https://github.com/rhasspy/piper/releases/download/2023.11.14-2/piper_windows_amd64.zip",
];

/// HuggingFace repository holding the published Piper voices.
pub const VOICES_REPO: &str = "rhasspy/piper-voices";

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("all {} download attempts failed", .0.len())]
    AllCandidatesFailed(Vec<Attempt>),

    #[error("don't know how to unpack '{0}' (expected .tar.gz, .tgz or .zip)")]
    UnsupportedArchive(String),

    #[error("'{0}' is not a voice name of the form lang_REGION-name-quality")]
    InvalidVoiceName(String),
}

/// One failed candidate URL.
#[derive(Debug)]
pub struct Attempt {
    pub url: String,
    pub reason: String,
}

// ─────────────────────────────────────────────────────────────────────────────
// Archives
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveKind {
    TarGz,
    Zip,
}

impl ArchiveKind {
    pub fn from_name(name: &str) -> Result<Self, FetchError> {
        let lower = name.to_ascii_lowercase();
        if lower.ends_with(".tar.gz") || lower.ends_with(".tgz") {
            Ok(Self::TarGz)
        } else if lower.ends_with(".zip") {
            Ok(Self::Zip)
        } else {
            Err(FetchError::UnsupportedArchive(name.to_string()))
        }
    }
}

/// Unpack `archive` into `dest`.
pub fn extract(archive: &Path, kind: ArchiveKind, dest: &Path) -> Result<()> {
    std::fs::create_dir_all(dest)
        .with_context(|| format!("Cannot create {}", dest.display()))?;
    let file = File::open(archive)
        .with_context(|| format!("Cannot open {}", archive.display()))?;

    match kind {
        ArchiveKind::TarGz => {
            let mut tar = tar::Archive::new(flate2::read::GzDecoder::new(file));
            tar.set_preserve_permissions(true);
            tar.unpack(dest)
                .with_context(|| format!("Failed to unpack {}", archive.display()))?;
        }
        ArchiveKind::Zip => {
            zip::ZipArchive::new(file)
                .and_then(|mut zip| zip.extract(dest))
                .with_context(|| format!("Failed to unpack {}", archive.display()))?;
        }
    }
    Ok(())
}

// ─────────────────────────────────────────────────────────────────────────────
// Release download
// ─────────────────────────────────────────────────────────────────────────────

/// Last path segment of `url`, used as the local archive name.
fn archive_name(url: &str) -> &str {
    let path = url.split(['?', '#']).next().unwrap_or(url);
    path.rsplit('/').next().unwrap_or(path)
}

/// Stream `url` into `path`.
fn download_to(url: &str, path: &Path) -> Result<()> {
    let response = match ureq::get(url).call() {
        Ok(r) => r,
        Err(ureq::Error::Status(code, _)) => bail!("HTTP {code}"),
        Err(e) => bail!("request failed: {e}"),
    };
    let mut file = File::create(path)
        .with_context(|| format!("Cannot create {}", path.display()))?;
    io::copy(&mut response.into_reader(), &mut file).context("download interrupted")?;
    Ok(())
}

fn try_candidate(url: &str, dest: &Path) -> Result<PathBuf> {
    let name = archive_name(url);
    let kind = ArchiveKind::from_name(name)?;

    std::fs::create_dir_all(dest)
        .with_context(|| format!("Cannot create {}", dest.display()))?;
    let archive = dest.join(name);

    info!("Downloading {name}…");
    let unpacked = download_to(url, &archive).and_then(|()| {
        info!("Extracting {name}…");
        extract(&archive, kind, dest)
    });
    // The archive is only scratch space, whatever happened.
    if archive.exists() {
        if let Err(e) = std::fs::remove_file(&archive) {
            warn!("Could not remove {}: {e}", archive.display());
        }
    }
    unpacked?;
    Ok(archive)
}

/// Download and unpack the first reachable archive among `urls` into `dest`.
///
/// Returns the URL that worked.
pub fn fetch_release<S: AsRef<str>>(urls: &[S], dest: &Path) -> Result<String, FetchError> {
    let mut attempts = Vec::new();
    for url in urls.iter().map(AsRef::as_ref) {
        info!("Trying: {url}");
        match try_candidate(url, dest) {
            Ok(_) => {
                info!("Extracted successfully into {}", dest.display());
                return Ok(url.to_string());
            }
            Err(e) => {
                warn!("Failed: {e:#}");
                attempts.push(Attempt { url: url.to_string(), reason: format!("{e:#}") });
            }
        }
    }
    Err(FetchError::AllCandidatesFailed(attempts))
}

/// Files under `dir` whose name mentions `piper`, sorted.
pub fn find_executables(dir: &Path) -> Vec<PathBuf> {
    let mut found: Vec<PathBuf> = walkdir::WalkDir::new(dir)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .filter(|entry| entry.file_name().to_string_lossy().to_lowercase().contains("piper"))
        .map(walkdir::DirEntry::into_path)
        .collect();
    found.sort();
    found
}

// ─────────────────────────────────────────────────────────────────────────────
// Voices
// ─────────────────────────────────────────────────────────────────────────────

/// A published voice such as `en_US-lessac-medium`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoiceName {
    pub locale: String,
    pub name: String,
    pub quality: String,
}

impl VoiceName {
    /// Split `lang_REGION-name-quality`; the name part may itself contain `-`.
    pub fn parse(voice: &str) -> Result<Self, FetchError> {
        let invalid = || FetchError::InvalidVoiceName(voice.to_string());
        let (locale, rest) = voice.split_once('-').ok_or_else(invalid)?;
        let (name, quality) = rest.rsplit_once('-').ok_or_else(invalid)?;
        let (lang, region) = locale.split_once('_').ok_or_else(invalid)?;
        if [lang, region, name, quality].iter().any(|p| p.is_empty()) {
            return Err(invalid());
        }
        Ok(Self { locale: locale.to_string(), name: name.to_string(), quality: quality.to_string() })
    }

    pub fn language(&self) -> &str {
        self.locale.split('_').next().unwrap_or(&self.locale)
    }

    pub fn stem(&self) -> String {
        format!("{}-{}-{}", self.locale, self.name, self.quality)
    }

    /// Path of `file` inside [`VOICES_REPO`].
    pub fn repo_path(&self, file: &str) -> String {
        format!("{}/{}/{}/{}/{}", self.language(), self.locale, self.name, self.quality, file)
    }
}

/// Download `voice` into `dest`; returns the local `.onnx` path.
///
/// Files are cached in the HuggingFace Hub cache directory and copied out.
pub fn fetch_voice(voice: &str, dest: &Path) -> Result<PathBuf> {
    let voice = VoiceName::parse(voice)?;
    let api = Api::new().context("Failed to initialise HuggingFace Hub client")?;
    let repo = api.model(VOICES_REPO.to_string());

    std::fs::create_dir_all(dest)
        .with_context(|| format!("Cannot create {}", dest.display()))?;

    let model = format!("{}.onnx", voice.stem());
    let files = [model.clone(), format!("{model}.json")];
    for file in &files {
        info!("Downloading {file}…");
        let cached = repo
            .get(&voice.repo_path(file))
            .with_context(|| format!("Failed to download '{file}' from '{VOICES_REPO}'"))?;
        std::fs::copy(&cached, dest.join(file))
            .with_context(|| format!("Cannot copy {} into {}", cached.display(), dest.display()))?;
    }
    Ok(dest.join(model))
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
