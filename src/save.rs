//! Save a map document with its assets made local.
//!
//! Pipeline for one call:
//!
//! 1. Pick the mode: no asset directory and no explicit map means
//!    remote passthrough; otherwise inline embedding, or local references
//!    when `embed_assets` is off.
//! 2. Build the asset manifest (file contents only for inline embedding).
//! 3. In strict mode, validate the manifest against the declared plugins.
//! 4. Rewrite the document.
//! 5. In strict mode, refuse if a required kind is still referenced remotely.
//! 6. Write the file.
//!
//! A strict failure writes nothing. The destination is replaced by rename, so
//! an existing file is either fully old or fully new.

use crate::catalog::{AssetKind, Catalog};
use crate::config::ToolConfig;
use crate::features::{FeatureSet, Plugins};
use crate::fetch::write_atomic;
use crate::manifest::{AssetManifest, LoadContent};
use crate::rewrite::{self, Rewrite, RewriteOptions, SaveMode};
use crate::validate::{MissingAssets, validate};
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SaveError {
    #[error("{0}")]
    MissingAssets(#[from] MissingAssets),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Clone)]
pub struct SaveOptions {
    /// Directory of fetched assets, scanned by catalog filename.
    pub offline_assets_dir: Option<PathBuf>,
    /// Explicit per-kind files; these win over the directory scan.
    pub assets_map: BTreeMap<AssetKind, PathBuf>,
    /// Inline asset content rather than linking to the files.
    pub embed_assets: bool,
    /// Fail instead of writing a document that still needs the network.
    pub strict_offline: bool,
    /// Plugins the document uses; defines the required kinds.
    pub plugins: Plugins,
    /// Directory local links are made relative to.
    pub link_base: Option<PathBuf>,
    /// Replacement for the OpenStreetMap tile URL.
    pub tiles_template: Option<String>,
    pub catalog: Catalog,
}

impl Default for SaveOptions {
    fn default() -> Self {
        Self {
            offline_assets_dir: None,
            assets_map: BTreeMap::new(),
            embed_assets: true,
            strict_offline: false,
            plugins: Plugins::default(),
            link_base: None,
            tiles_template: None,
            catalog: Catalog::standard().clone(),
        }
    }
}

impl SaveOptions {
    /// Defaults taken from the `[save]` and `[catalog]` config sections.
    pub fn from_config(config: &ToolConfig) -> Self {
        Self {
            embed_assets: config.save.embed_assets,
            strict_offline: config.save.strict_offline,
            catalog: config.catalog(),
            ..Default::default()
        }
    }

    pub fn mode(&self) -> SaveMode {
        if self.offline_assets_dir.is_none() && self.assets_map.is_empty() {
            SaveMode::RemotePassthrough
        } else if self.embed_assets {
            SaveMode::InlineEmbed
        } else {
            SaveMode::LocalReference
        }
    }
}

#[derive(Debug, Clone)]
pub struct SaveReport {
    pub path: PathBuf,
    pub mode: SaveMode,
    pub rewrites: Vec<Rewrite>,
    /// Recognized kinds the saved document still loads remotely.
    pub unresolved: BTreeSet<AssetKind>,
    /// Kinds that were linked because their content could not be inlined.
    pub not_embeddable: BTreeSet<AssetKind>,
    /// Asset files that were present but unusable, with the reason.
    pub unreadable: BTreeMap<AssetKind, String>,
    pub tiles_replaced: usize,
    /// Non-loopback URLs left in the saved document.
    pub remote_urls: Vec<String>,
}

/// Rewrite `document` per `options` and write it to `path`.
pub fn save(document: &str, path: &Path, options: &SaveOptions) -> Result<SaveReport, SaveError> {
    let mode = options.mode();
    let manifest = match mode {
        SaveMode::RemotePassthrough => AssetManifest::new(),
        SaveMode::LocalReference => AssetManifest::build(
            &options.catalog,
            options.offline_assets_dir.as_deref(),
            &options.assets_map,
            LoadContent::PathsOnly,
        ),
        SaveMode::InlineEmbed => AssetManifest::build(
            &options.catalog,
            options.offline_assets_dir.as_deref(),
            &options.assets_map,
            LoadContent::Contents,
        ),
    };
    let features = FeatureSet::from_plugins(&options.plugins);

    if options.strict_offline {
        validate(&features, &manifest)?;
    }

    let processed = rewrite::process(
        document,
        &options.catalog,
        &manifest,
        mode,
        &features,
        &RewriteOptions {
            link_base: options.link_base.clone(),
            tiles_template: options.tiles_template.clone(),
        },
    );

    if options.strict_offline && !processed.required_remote.is_empty() {
        return Err(MissingAssets(processed.required_remote).into());
    }

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    write_atomic(path, processed.html.as_bytes())?;

    Ok(SaveReport {
        path: path.to_path_buf(),
        mode,
        remote_urls: crate::audit::remote_urls(&processed.html),
        rewrites: processed.rewrites,
        unresolved: processed.unresolved,
        not_embeddable: processed.not_embeddable,
        unreadable: manifest.unreadable().clone(),
        tiles_replaced: processed.tiles_replaced,
    })
}
