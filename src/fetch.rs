//! Asset fetcher: download catalog entries into a local directory.
//!
//! The core group is always fetched; optional groups follow the caller's
//! [`Plugins`]. Every scheduled entry is retrieved from its canonical URL and
//! written to `target_dir/local_filename`.
//!
//! ## Failure model
//!
//! Failures are isolated per entry. A 404, a timeout or a failed file write
//! for one asset is recorded in [`FetchReport::failed`] and the remaining
//! assets are still fetched. Only problems with the target directory itself
//! (or the provenance file in it) abort the call with a [`FetchError`].
//!
//! ## Concurrency
//!
//! Retrievals run on a dedicated rayon pool built for each call and sized by
//! [`effective_parallelism`]. Each entry owns a distinct file, so workers never
//! contend on the filesystem. Files are written to a hidden sibling and renamed
//! into place, which means a reader never observes a half-written asset.
//!
//! ## Provenance
//!
//! After the downloads, `target_dir/.offline-assets.json` records what was
//! fetched:
//!
//! ```json
//! {
//!   "leaflet_js": {
//!     "url": "https://cdn.jsdelivr.net/npm/leaflet@1.9.3/dist/leaflet.js",
//!     "file": "leaflet.js",
//!     "bytes": 147552,
//!     "sha256": "9f1c…",
//!     "fetched_at": "2026-10-18T09:12:44Z"
//!   }
//! }
//! ```
//!
//! Entries for kinds not fetched in this run are kept.

use crate::catalog::{AssetKind, Catalog, CatalogEntry};
use crate::config::{FetchConfig, ToolConfig, effective_parallelism};
use crate::features::Plugins;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::Sender;
use std::time::Duration;
use thiserror::Error;

pub const PROVENANCE_FILENAME: &str = ".offline-assets.json";

/// Failure to retrieve a single asset. Recorded, never propagated.
#[derive(Error, Debug)]
pub enum RetrievalError {
    #[error("HTTP status {status}")]
    Http { status: u16 },
    #[error("transport error: {0}")]
    Transport(String),
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("cannot write to {}: {source}", path.display())]
    UnwritableTarget { path: PathBuf, source: io::Error },
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("thread pool error: {0}")]
    ThreadPool(String),
    #[error("HTTP client error: {0}")]
    Client(String),
}

/// Where asset bytes come from.
///
/// `Sync` because retrievals run on a rayon pool.
pub trait AssetSource: Sync {
    fn retrieve(&self, url: &str) -> Result<Vec<u8>, RetrievalError>;
}

/// Blocking HTTP(S) source.
pub struct HttpSource {
    client: reqwest::blocking::Client,
}

impl HttpSource {
    pub fn new(config: &FetchConfig) -> Result<Self, FetchError> {
        let mut builder = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(config.user_agent.clone());
        if !config.use_system_proxy {
            builder = builder.no_proxy();
        }
        let client = builder
            .build()
            .map_err(|e| FetchError::Client(e.to_string()))?;
        Ok(Self { client })
    }
}

impl AssetSource for HttpSource {
    fn retrieve(&self, url: &str) -> Result<Vec<u8>, RetrievalError> {
        let response = self
            .client
            .get(url)
            .send()
            .map_err(|e| RetrievalError::Transport(e.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            return Err(RetrievalError::Http {
                status: status.as_u16(),
            });
        }
        let bytes = response
            .bytes()
            .map_err(|e| RetrievalError::Transport(e.to_string()))?;
        Ok(bytes.to_vec())
    }
}

#[derive(Debug, Clone)]
pub struct FetchOptions {
    /// Catalog to download from (config URL overrides applied).
    pub catalog: Catalog,
    /// Upper bound on concurrent retrievals.
    pub max_parallel: usize,
    /// Leave files that already exist untouched.
    pub skip_existing: bool,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            catalog: Catalog::standard().clone(),
            max_parallel: FetchConfig::default().max_parallel,
            skip_existing: false,
        }
    }
}

impl FetchOptions {
    pub fn from_config(config: &ToolConfig) -> Self {
        Self {
            catalog: config.catalog(),
            max_parallel: config.fetch.max_parallel,
            skip_existing: false,
        }
    }
}

/// Progress events for a fetch run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchEvent {
    Started { target_dir: PathBuf, total: usize },
    Fetched { kind: AssetKind, bytes: u64 },
    Skipped { kind: AssetKind },
    Failed { kind: AssetKind, error: String },
}

/// A successfully written asset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedAsset {
    pub url: String,
    pub path: PathBuf,
    pub bytes: u64,
    pub sha256: String,
}

#[derive(Debug, Clone, Default)]
pub struct FetchReport {
    pub target_dir: PathBuf,
    pub succeeded: BTreeMap<AssetKind, FetchedAsset>,
    /// Already present and left alone (`skip_existing`).
    pub skipped: BTreeSet<AssetKind>,
    /// Kind → error message.
    pub failed: BTreeMap<AssetKind, String>,
}

impl FetchReport {
    /// True when every scheduled asset is now available locally.
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

/// One record of the provenance file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProvenanceEntry {
    pub url: String,
    pub file: String,
    pub bytes: u64,
    pub sha256: String,
    pub fetched_at: String,
}

pub type Provenance = BTreeMap<AssetKind, ProvenanceEntry>;

/// Read a directory's provenance file. Missing or unparsable files read as empty.
pub fn read_provenance(dir: &Path) -> Provenance {
    fs::read_to_string(dir.join(PROVENANCE_FILENAME))
        .ok()
        .and_then(|text| serde_json::from_str(&text).ok())
        .unwrap_or_default()
}

enum Outcome {
    Fetched(FetchedAsset),
    Skipped,
    Failed(String),
}

/// Fetch the core group plus every group `include` enables.
pub fn fetch(
    target_dir: &Path,
    include: &Plugins,
    source: &impl AssetSource,
    options: &FetchOptions,
    events: Option<Sender<FetchEvent>>,
) -> Result<FetchReport, FetchError> {
    fs::create_dir_all(target_dir).map_err(|source| FetchError::UnwritableTarget {
        path: target_dir.to_path_buf(),
        source,
    })?;

    let scheduled: Vec<&CatalogEntry> = include
        .groups()
        .into_iter()
        .flat_map(|g| options.catalog.group(g))
        .collect();

    if let Some(tx) = &events {
        tx.send(FetchEvent::Started {
            target_dir: target_dir.to_path_buf(),
            total: scheduled.len(),
        })
        .ok();
    }

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(effective_parallelism(options.max_parallel, scheduled.len()))
        .build()
        .map_err(|e| FetchError::ThreadPool(e.to_string()))?;

    let outcomes: Vec<(AssetKind, Outcome)> = pool.install(|| {
        scheduled
            .par_iter()
            .map(|entry| {
                let outcome = fetch_one(entry, target_dir, source, options.skip_existing);
                if let Some(tx) = &events {
                    let event = match &outcome {
                        Outcome::Fetched(asset) => FetchEvent::Fetched {
                            kind: entry.kind,
                            bytes: asset.bytes,
                        },
                        Outcome::Skipped => FetchEvent::Skipped { kind: entry.kind },
                        Outcome::Failed(error) => FetchEvent::Failed {
                            kind: entry.kind,
                            error: error.clone(),
                        },
                    };
                    tx.send(event).ok();
                }
                (entry.kind, outcome)
            })
            .collect()
    });

    let mut report = FetchReport {
        target_dir: target_dir.to_path_buf(),
        ..Default::default()
    };
    for (kind, outcome) in outcomes {
        match outcome {
            Outcome::Fetched(asset) => {
                report.succeeded.insert(kind, asset);
            }
            Outcome::Skipped => {
                report.skipped.insert(kind);
            }
            Outcome::Failed(error) => {
                report.failed.insert(kind, error);
            }
        }
    }

    if !report.succeeded.is_empty() {
        write_provenance(target_dir, &report)?;
    }
    Ok(report)
}

/// [`fetch`] over HTTP with settings from `config`.
pub fn fetch_assets(
    target_dir: &Path,
    include: &Plugins,
    config: &ToolConfig,
) -> Result<FetchReport, FetchError> {
    let source = HttpSource::new(&config.fetch)?;
    fetch(
        target_dir,
        include,
        &source,
        &FetchOptions::from_config(config),
        None,
    )
}

fn fetch_one(
    entry: &CatalogEntry,
    target_dir: &Path,
    source: &impl AssetSource,
    skip_existing: bool,
) -> Outcome {
    let path = target_dir.join(entry.local_filename);
    if skip_existing && path.is_file() {
        return Outcome::Skipped;
    }
    let result = source
        .retrieve(&entry.canonical_url)
        .and_then(|bytes| {
            write_atomic(&path, &bytes)?;
            Ok(bytes)
        });
    match result {
        Ok(bytes) => Outcome::Fetched(FetchedAsset {
            url: entry.canonical_url.clone(),
            path,
            bytes: bytes.len() as u64,
            sha256: format!("{:x}", Sha256::digest(&bytes)),
        }),
        Err(e) => Outcome::Failed(e.to_string()),
    }
}

fn write_provenance(target_dir: &Path, report: &FetchReport) -> Result<(), FetchError> {
    let mut provenance = read_provenance(target_dir);
    let fetched_at = now_rfc3339_utc();
    for (kind, asset) in &report.succeeded {
        let file = asset
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        provenance.insert(
            *kind,
            ProvenanceEntry {
                url: asset.url.clone(),
                file,
                bytes: asset.bytes,
                sha256: asset.sha256.clone(),
                fetched_at: fetched_at.clone(),
            },
        );
    }
    let json = serde_json::to_string_pretty(&provenance)?;
    let path = target_dir.join(PROVENANCE_FILENAME);
    write_atomic(&path, json.as_bytes())
        .map_err(|source| FetchError::UnwritableTarget { path, source })
}

fn now_rfc3339_utc() -> String {
    time::OffsetDateTime::now_utc()
        .format(&time::format_description::well_known::Rfc3339)
        .unwrap_or_default()
}

static TMP_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Write `bytes` to a hidden sibling of `path`, then rename it into place.
/// The sibling's name is unique per call (process id plus counter).
pub(crate) fn write_atomic(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let file_name = path
        .file_name()
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "path has no file name"))?;
    let mut tmp_name = std::ffi::OsString::from(".");
    tmp_name.push(file_name);
    tmp_name.push(format!(
        ".tmp-{}-{}",
        std::process::id(),
        TMP_COUNTER.fetch_add(1, Ordering::Relaxed)
    ));
    let tmp = path.with_file_name(tmp_name);

    let result = fs::write(&tmp, bytes).and_then(|()| fs::rename(&tmp, path));
    if result.is_err() {
        let _ = fs::remove_file(&tmp);
    }
    result
}
