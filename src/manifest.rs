//! Local asset manifest: which catalog assets are available on disk.
//!
//! Built fresh for every save operation and thrown away afterwards. There are
//! two ways to populate it, and they compose:
//!
//! 1. **Directory scan**: for each catalog entry, `dir/local_filename` is
//!    checked. This is the normal path after `leaflet-offline fetch --dir dir`.
//! 2. **Explicit overrides**: an `AssetKind → path` map for non-standard
//!    layouts. An override always wins over the scan result for its kind.
//!
//! Construction never fails. A file that is missing stays unresolved; a file
//! that exists but cannot be read (or is not UTF-8 when content is requested)
//! also stays unresolved and is listed in [`AssetManifest::unreadable`] so
//! the caller can report why. Unresolved kinds surface later, through the
//! strict-offline validator or as remote references left in place.

use crate::catalog::{AssetKind, Catalog};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Whether asset bytes are loaded while building the manifest.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadContent {
    /// Only record paths (local-reference mode).
    PathsOnly,
    /// Also read file contents (inline-embed mode).
    Contents,
}

/// A locally available asset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedAsset {
    pub path: PathBuf,
    /// File content, present when built with [`LoadContent::Contents`].
    pub content: Option<String>,
}

/// Per-operation mapping of AssetKind → local file.
#[derive(Debug, Clone, Default)]
pub struct AssetManifest {
    resolved: BTreeMap<AssetKind, ResolvedAsset>,
    unreadable: BTreeMap<AssetKind, String>,
}

impl AssetManifest {
    pub fn new() -> Self {
        Self::default()
    }

    /// Scan `dir` for every catalog entry's `local_filename`.
    pub fn scan(catalog: &Catalog, dir: &Path, load: LoadContent) -> Self {
        let mut manifest = Self::new();
        for entry in catalog.entries() {
            let path = dir.join(entry.local_filename);
            if path.is_file() {
                manifest.resolve(entry.kind, path, load);
            }
        }
        manifest
    }

    /// Apply explicit overrides on top of whatever is already resolved.
    ///
    /// A missing override file removes any scan result for that kind: the
    /// caller asked for that specific file.
    pub fn apply_overrides(&mut self, overrides: &BTreeMap<AssetKind, PathBuf>, load: LoadContent) {
        for (kind, path) in overrides {
            self.resolved.remove(kind);
            self.unreadable.remove(kind);
            if path.is_file() {
                self.resolve(*kind, path.clone(), load);
            } else {
                self.unreadable
                    .insert(*kind, format!("override not found: {}", path.display()));
            }
        }
    }

    /// Directory scan (if any) followed by overrides.
    pub fn build(
        catalog: &Catalog,
        dir: Option<&Path>,
        overrides: &BTreeMap<AssetKind, PathBuf>,
        load: LoadContent,
    ) -> Self {
        let mut manifest = match dir {
            Some(dir) => Self::scan(catalog, dir, load),
            None => Self::new(),
        };
        manifest.apply_overrides(overrides, load);
        manifest
    }

    /// Record a single asset, reading its content when requested.
    pub fn resolve(&mut self, kind: AssetKind, path: PathBuf, load: LoadContent) {
        let content = match load {
            LoadContent::PathsOnly => None,
            LoadContent::Contents => match std::fs::read(&path) {
                Ok(bytes) => match String::from_utf8(bytes) {
                    Ok(text) => Some(text),
                    Err(_) => {
                        self.unreadable
                            .insert(kind, format!("{} is not valid UTF-8", path.display()));
                        return;
                    }
                },
                Err(e) => {
                    self.unreadable
                        .insert(kind, format!("{}: {}", path.display(), e));
                    return;
                }
            },
        };
        self.unreadable.remove(&kind);
        self.resolved.insert(kind, ResolvedAsset { path, content });
    }

    /// Insert an in-memory asset (used by callers that already hold the bytes).
    pub fn insert(&mut self, kind: AssetKind, asset: ResolvedAsset) {
        self.unreadable.remove(&kind);
        self.resolved.insert(kind, asset);
    }

    pub fn get(&self, kind: AssetKind) -> Option<&ResolvedAsset> {
        self.resolved.get(&kind)
    }

    pub fn path(&self, kind: AssetKind) -> Option<&Path> {
        self.resolved.get(&kind).map(|a| a.path.as_path())
    }

    pub fn content(&self, kind: AssetKind) -> Option<&str> {
        self.resolved.get(&kind).and_then(|a| a.content.as_deref())
    }

    pub fn is_resolved(&self, kind: AssetKind) -> bool {
        self.resolved.contains_key(&kind)
    }

    pub fn resolved_kinds(&self) -> impl Iterator<Item = AssetKind> + '_ {
        self.resolved.keys().copied()
    }

    /// Kinds whose file was present but could not be used, with the reason.
    pub fn unreadable(&self) -> &BTreeMap<AssetKind, String> {
        &self.unreadable
    }

    pub fn len(&self) -> usize {
        self.resolved.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resolved.is_empty()
    }
}
