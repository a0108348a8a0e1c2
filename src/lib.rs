//! # Leaflet Offline
//!
//! Makes interactive Leaflet map documents work without network access.
//! Map generators emit HTML that loads Leaflet, jQuery, Bootstrap and plugin
//! assets from public CDNs; this crate downloads those assets once and then
//! rewrites saved documents to load them from disk or to carry them inline.
//!
//! # Architecture: Fetch Once, Save Many
//!
//! ```text
//! 1. Fetch   catalog URLs  →  assets/           (one flat directory + provenance)
//! 2. Save    map.html      →  map.offline.html  (manifest → validate → rewrite → write)
//! ```
//!
//! The two halves only share the [`catalog`]: the fetcher writes each asset
//! under its catalog filename, and the save operation finds it there again.
//! Nothing else is persisted between runs.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`catalog`] | Known assets: kind, canonical CDN URL, local filename, URL recognition |
//! | [`features`] | Declared plugin groups and the asset kinds they require |
//! | [`fetch`] | Downloads catalog entries concurrently, writes provenance |
//! | [`manifest`] | Per-save map of asset kind → local file (and content) |
//! | [`rewrite`] | Rewrites asset tags to local links or inline blocks |
//! | [`validate`] | Strict-offline check of a manifest against required kinds |
//! | [`save`] | The save operation tying manifest, validation and rewriting together |
//! | [`audit`] | Lists remote URLs left in a document |
//! | [`config`] | `leaflet-offline.toml` loading, validation and merging |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## Closed Asset Set
//!
//! Only assets in the catalog are ever touched. A tag pointing anywhere else,
//! including a CDN asset the catalog does not know, passes through unchanged.
//! Recognition accepts other versions of a known asset through per-entry URL
//! patterns, so a document built against an older Leaflet still resolves to
//! `leaflet_js`.
//!
//! ## Fail Closed in Strict Mode
//!
//! With `strict_offline` set, a save either produces a document whose required
//! assets are all local or writes nothing and returns
//! [`save::SaveError::MissingAssets`] with the exact set of missing kinds.
//!
//! ## Scoped Rewriting
//!
//! The rewriter never edits text inside inline scripts, styles or comments.
//! URLs that map-building JavaScript mentions stay exactly as they were.

pub mod audit;
pub mod catalog;
pub mod config;
pub mod features;
pub mod fetch;
pub mod manifest;
pub mod output;
pub mod rewrite;
pub mod save;
pub mod validate;

pub use fetch::fetch_assets;
pub use save::{SaveError, SaveOptions, SaveReport, save};

#[cfg(test)]
pub(crate) mod test_helpers;
