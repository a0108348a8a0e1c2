//! Tool configuration.
//!
//! Handles loading, validating, and merging `leaflet-offline.toml`. User files
//! are sparse: they are merged key-by-key on top of the stock defaults, so a
//! file only needs the values it wants to change.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [fetch]
//! timeout_secs = 60          # Per-retrieval timeout
//! max_parallel = 4           # Concurrent downloads (clamped to CPU cores)
//! user_agent = "Mozilla/5.0 (compatible; leaflet-offline)"
//! use_system_proxy = true    # Honor HTTP(S)_PROXY / NO_PROXY
//!
//! [save]
//! embed_assets = true        # Inline asset bytes (false = link to local files)
//! strict_offline = false     # Refuse to write a document with remote assets
//! relative_links = false     # Link paths relative to the output file
//!
//! [catalog.urls]
//! # Replace canonical download URLs, keyed by asset kind
//! # leaflet_js = "https://mirror.example/leaflet/1.9.3/leaflet.js"
//! ```
//!
//! Unknown keys are rejected to catch typos early, including unknown asset
//! kinds under `[catalog.urls]`.
//!
//! Configuration is a plain value handed to each operation. Nothing here is
//! stored globally, so two callers with different mirrors never interfere.

use crate::catalog::{AssetKind, Catalog};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use thiserror::Error;
use url::Url;

/// Default config file name looked up in the working directory.
pub const CONFIG_FILENAME: &str = "leaflet-offline.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Complete tool configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ToolConfig {
    /// Download behavior of the fetch tool.
    pub fetch: FetchConfig,
    /// Defaults for saving documents.
    pub save: SaveConfig,
    /// Catalog adjustments.
    pub catalog: CatalogConfig,
}

impl ToolConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.fetch.timeout_secs == 0 {
            return Err(ConfigError::Validation(
                "fetch.timeout_secs must be greater than 0".into(),
            ));
        }
        if self.fetch.max_parallel == 0 {
            return Err(ConfigError::Validation(
                "fetch.max_parallel must be greater than 0".into(),
            ));
        }
        for (kind, raw) in &self.catalog.urls {
            let parsed = Url::parse(raw).map_err(|e| {
                ConfigError::Validation(format!("catalog.urls.{kind}: invalid URL `{raw}`: {e}"))
            })?;
            if parsed.scheme() != "http" && parsed.scheme() != "https" {
                return Err(ConfigError::Validation(format!(
                    "catalog.urls.{kind}: URL must be http or https, got `{}`",
                    parsed.scheme()
                )));
            }
        }
        Ok(())
    }

    /// The standard catalog with this config's URL overrides applied.
    pub fn catalog(&self) -> Catalog {
        Catalog::standard().with_url_overrides(&self.catalog.urls)
    }
}

/// Download settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FetchConfig {
    /// Per-retrieval timeout in seconds. A timed-out asset is reported as failed.
    pub timeout_secs: u64,
    /// Maximum concurrent downloads. Values larger than the core count are
    /// clamped down.
    pub max_parallel: usize,
    /// `User-Agent` header sent with every request. Some CDNs reject requests
    /// without one.
    pub user_agent: String,
    /// Honor proxy environment variables.
    pub use_system_proxy: bool,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 60,
            max_parallel: 4,
            user_agent: "Mozilla/5.0 (compatible; leaflet-offline)".to_string(),
            use_system_proxy: true,
        }
    }
}

/// Resolve the effective download parallelism.
///
/// `min(max_parallel, cores, jobs)`, never below 1.
pub fn effective_parallelism(max_parallel: usize, jobs: usize) -> usize {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    max_parallel.min(cores).min(jobs).max(1)
}

/// Defaults for the save operation; CLI flags override them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SaveConfig {
    pub embed_assets: bool,
    pub strict_offline: bool,
    pub relative_links: bool,
}

impl Default for SaveConfig {
    fn default() -> Self {
        Self {
            embed_assets: true,
            strict_offline: false,
            relative_links: false,
        }
    }
}

/// Catalog adjustments.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CatalogConfig {
    /// Canonical URL overrides keyed by asset kind.
    pub urls: BTreeMap<AssetKind, String>,
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(ToolConfig::default()).expect("default config must serialize")
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Load a config file as a raw TOML value.
///
/// Returns `Ok(None)` if the file does not exist.
pub fn load_raw_config(path: &Path) -> Result<Option<toml::Value>, ConfigError> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge an optional overlay onto a base value, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<ToolConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: ToolConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load config from `path`, falling back to stock defaults when the file is
/// absent.
pub fn load_config(path: &Path) -> Result<ToolConfig, ConfigError> {
    let base = stock_defaults_value();
    let overlay = load_raw_config(path)?;
    resolve_config(base, overlay)
}

/// Returns a fully-commented stock config file with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# leaflet-offline configuration
# =============================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults. Unknown keys will cause an error.

# ---------------------------------------------------------------------------
# Fetching assets (`leaflet-offline fetch`)
# ---------------------------------------------------------------------------
[fetch]
# Per-retrieval timeout in seconds. Timed-out assets are reported as failed;
# the remaining assets are still fetched.
timeout_secs = 60

# Maximum concurrent downloads (clamped to the number of CPU cores).
max_parallel = 4

# User-Agent header sent to the CDNs.
user_agent = "Mozilla/5.0 (compatible; leaflet-offline)"

# Honor HTTP_PROXY / HTTPS_PROXY / NO_PROXY from the environment.
use_system_proxy = true

# ---------------------------------------------------------------------------
# Saving documents (`leaflet-offline embed`)
# ---------------------------------------------------------------------------
[save]
# true: replace asset tags with inline <script>/<style> blocks.
# false: point asset tags at the local files instead.
embed_assets = true

# Refuse to write a document if any required asset is still remote.
strict_offline = false

# Write local links relative to the output file instead of absolute paths.
relative_links = false

# ---------------------------------------------------------------------------
# Catalog
# ---------------------------------------------------------------------------
[catalog.urls]
# Replace the download URL of individual assets, keyed by asset kind
# (see `leaflet-offline catalog`). Documents referencing either the stock
# CDN URL or the override are both recognized.
# leaflet_js = "https://mirror.example/leaflet/1.9.3/leaflet.js"
"##
}
