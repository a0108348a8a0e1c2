//! The fixed catalog of offline-able map assets.
//!
//! Every JavaScript and CSS dependency a generated Leaflet map can pull from a
//! CDN is listed here exactly once, as an [`AssetKind`] with a [`CatalogEntry`]
//! describing where it lives remotely and what it is called on disk.
//!
//! ## Groups
//!
//! | Group | Kinds | Needed when |
//! |-------|-------|-------------|
//! | Core | Leaflet, jQuery, Bootstrap, Font Awesome, AwesomeMarkers | always |
//! | Time | TimeDimension, moment, iso8601 | time animation layers |
//! | AntPath | leaflet-ant-path | animated tracks |
//! | Clustering | leaflet.markercluster | clustered markers |
//! | Draw | leaflet.draw | drawing tools |
//!
//! ## Recognizing references
//!
//! Map generators bump plugin versions from release to release, so a document
//! rarely carries *exactly* the URL this catalog would fetch. Each entry owns an
//! anchored, version-tolerant pattern (`leaflet@<any>/dist/leaflet(.min).js`)
//! and [`Catalog::kind_for_url`] matches the whole URL against it. Anything the
//! patterns do not recognize is "not found" and is never touched.
//!
//! ## Catalog values
//!
//! [`Catalog::standard`] is the read-only table built once per process. A
//! caller that mirrors assets elsewhere builds its own value with
//! [`Catalog::with_url_overrides`]; overridden URLs are recognized verbatim in
//! addition to the stock patterns. Nothing here is mutable after construction.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;
use thiserror::Error;

/// One member of the fixed set of known map assets.
///
/// Serialized as its snake_case [`key`](AssetKind::key) (`"leaflet_js"`), which
/// is also the spelling used in config files and `--asset key=path` flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "&'static str")]
pub enum AssetKind {
    LeafletJs,
    LeafletCss,
    JqueryJs,
    BootstrapJs,
    BootstrapCss,
    BootstrapGlyphiconsCss,
    FontAwesomeCss,
    AwesomeMarkersJs,
    AwesomeMarkersCss,
    AwesomeMarkersRotateCss,
    TimeDimensionJs,
    TimeDimensionCss,
    MomentJs,
    Iso8601Js,
    AntPathJs,
    MarkerClusterJs,
    MarkerClusterCss,
    MarkerClusterDefaultCss,
    DrawJs,
    DrawCss,
}

impl AssetKind {
    /// Every kind, in catalog order.
    pub const ALL: [AssetKind; 20] = [
        AssetKind::LeafletJs,
        AssetKind::LeafletCss,
        AssetKind::JqueryJs,
        AssetKind::BootstrapJs,
        AssetKind::BootstrapCss,
        AssetKind::BootstrapGlyphiconsCss,
        AssetKind::FontAwesomeCss,
        AssetKind::AwesomeMarkersJs,
        AssetKind::AwesomeMarkersCss,
        AssetKind::AwesomeMarkersRotateCss,
        AssetKind::TimeDimensionJs,
        AssetKind::TimeDimensionCss,
        AssetKind::MomentJs,
        AssetKind::Iso8601Js,
        AssetKind::AntPathJs,
        AssetKind::MarkerClusterJs,
        AssetKind::MarkerClusterCss,
        AssetKind::MarkerClusterDefaultCss,
        AssetKind::DrawJs,
        AssetKind::DrawCss,
    ];

    /// Stable snake_case identifier.
    pub fn key(self) -> &'static str {
        match self {
            AssetKind::LeafletJs => "leaflet_js",
            AssetKind::LeafletCss => "leaflet_css",
            AssetKind::JqueryJs => "jquery_js",
            AssetKind::BootstrapJs => "bootstrap_js",
            AssetKind::BootstrapCss => "bootstrap_css",
            AssetKind::BootstrapGlyphiconsCss => "bootstrap_glyphicons_css",
            AssetKind::FontAwesomeCss => "fa_css",
            AssetKind::AwesomeMarkersJs => "awesomemarkers_js",
            AssetKind::AwesomeMarkersCss => "awesomemarkers_css",
            AssetKind::AwesomeMarkersRotateCss => "awesomemarkers_rotate_css",
            AssetKind::TimeDimensionJs => "timedimension_js",
            AssetKind::TimeDimensionCss => "timedimension_css",
            AssetKind::MomentJs => "moment_js",
            AssetKind::Iso8601Js => "iso8601_js",
            AssetKind::AntPathJs => "antpath_js",
            AssetKind::MarkerClusterJs => "markercluster_js",
            AssetKind::MarkerClusterCss => "markercluster_css",
            AssetKind::MarkerClusterDefaultCss => "markercluster_default_css",
            AssetKind::DrawJs => "draw_js",
            AssetKind::DrawCss => "draw_css",
        }
    }

    /// Position in [`AssetKind::ALL`].
    fn index(self) -> usize {
        self as usize
    }

    pub fn asset_type(self) -> AssetType {
        if self.key().ends_with("_js") {
            AssetType::Script
        } else {
            AssetType::Stylesheet
        }
    }

    pub fn group(self) -> PluginGroup {
        match self {
            AssetKind::TimeDimensionJs
            | AssetKind::TimeDimensionCss
            | AssetKind::MomentJs
            | AssetKind::Iso8601Js => PluginGroup::Time,
            AssetKind::AntPathJs => PluginGroup::AntPath,
            AssetKind::MarkerClusterJs
            | AssetKind::MarkerClusterCss
            | AssetKind::MarkerClusterDefaultCss => PluginGroup::Clustering,
            AssetKind::DrawJs | AssetKind::DrawCss => PluginGroup::Draw,
            _ => PluginGroup::Core,
        }
    }
}

impl fmt::Display for AssetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown asset kind `{0}`")]
pub struct ParseAssetKindError(pub String);

impl FromStr for AssetKind {
    type Err = ParseAssetKindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        AssetKind::ALL
            .into_iter()
            .find(|k| k.key() == wanted)
            .ok_or_else(|| ParseAssetKindError(wanted.to_string()))
    }
}

impl TryFrom<String> for AssetKind {
    type Error = ParseAssetKindError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<AssetKind> for &'static str {
    fn from(kind: AssetKind) -> Self {
        kind.key()
    }
}

/// Whether an asset is loaded with `<script src>` or `<link href>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssetType {
    Script,
    Stylesheet,
}

/// The optional feature an asset belongs to; `Core` is always required.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PluginGroup {
    Core,
    Time,
    AntPath,
    Clustering,
    Draw,
}

impl fmt::Display for PluginGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PluginGroup::Core => "core",
            PluginGroup::Time => "time",
            PluginGroup::AntPath => "antpath",
            PluginGroup::Clustering => "clustering",
            PluginGroup::Draw => "draw",
        };
        f.write_str(name)
    }
}

/// Where one asset lives remotely and what it is called locally.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogEntry {
    pub kind: AssetKind,
    pub canonical_url: String,
    pub local_filename: &'static str,
}

impl CatalogEntry {
    pub fn asset_type(&self) -> AssetType {
        self.kind.asset_type()
    }

    pub fn group(&self) -> PluginGroup {
        self.kind.group()
    }
}

/// `(kind, canonical url, local filename, pattern)` for the standard catalog.
/// Patterns are anchored when compiled.
const STANDARD: [(AssetKind, &str, &str, &str); 20] = [
    (
        AssetKind::LeafletJs,
        "https://cdn.jsdelivr.net/npm/leaflet@1.9.3/dist/leaflet.js",
        "leaflet.js",
        r"https://cdn\.jsdelivr\.net/npm/leaflet@[^/]+/dist/leaflet(?:\.min)?\.js",
    ),
    (
        AssetKind::LeafletCss,
        "https://cdn.jsdelivr.net/npm/leaflet@1.9.3/dist/leaflet.css",
        "leaflet.css",
        r"https://cdn\.jsdelivr\.net/npm/leaflet@[^/]+/dist/leaflet(?:\.min)?\.css",
    ),
    (
        AssetKind::JqueryJs,
        "https://code.jquery.com/jquery-3.7.1.min.js",
        "jquery-3.7.1.min.js",
        r"https://code\.jquery\.com/jquery-\d+\.\d+\.\d+\.min\.js",
    ),
    (
        AssetKind::BootstrapJs,
        "https://cdn.jsdelivr.net/npm/bootstrap@5.2.2/dist/js/bootstrap.bundle.min.js",
        "bootstrap.bundle.min.js",
        r"https://cdn\.jsdelivr\.net/npm/bootstrap@[^/]+/dist/js/bootstrap\.bundle\.min\.js",
    ),
    (
        AssetKind::BootstrapCss,
        "https://cdn.jsdelivr.net/npm/bootstrap@5.2.2/dist/css/bootstrap.min.css",
        "bootstrap.min.css",
        r"https://cdn\.jsdelivr\.net/npm/bootstrap@[^/]+/dist/css/bootstrap\.min\.css",
    ),
    (
        AssetKind::BootstrapGlyphiconsCss,
        "https://netdna.bootstrapcdn.com/bootstrap/3.0.0/css/bootstrap-glyphicons.css",
        "bootstrap-glyphicons.css",
        r"https?://netdna\.bootstrapcdn\.com/bootstrap/\d+\.\d+\.\d+/css/bootstrap-glyphicons\.css",
    ),
    (
        AssetKind::FontAwesomeCss,
        "https://cdn.jsdelivr.net/npm/@fortawesome/fontawesome-free@6.2.0/css/all.min.css",
        "all.min.css",
        r"https://cdn\.jsdelivr\.net/npm/@fortawesome/fontawesome-free@[^/]+/css/all\.min\.css",
    ),
    (
        AssetKind::AwesomeMarkersJs,
        "https://cdnjs.cloudflare.com/ajax/libs/Leaflet.awesome-markers/2.0.2/leaflet.awesome-markers.js",
        "leaflet.awesome-markers.js",
        r"https://cdnjs\.cloudflare\.com/ajax/libs/Leaflet\.awesome-markers/\d+\.\d+\.\d+/leaflet\.awesome-markers\.js",
    ),
    (
        AssetKind::AwesomeMarkersCss,
        "https://cdnjs.cloudflare.com/ajax/libs/Leaflet.awesome-markers/2.0.2/leaflet.awesome-markers.css",
        "leaflet.awesome-markers.css",
        r"https://cdnjs\.cloudflare\.com/ajax/libs/Leaflet\.awesome-markers/\d+\.\d+\.\d+/leaflet\.awesome-markers\.css",
    ),
    (
        AssetKind::AwesomeMarkersRotateCss,
        "https://cdn.jsdelivr.net/gh/python-visualization/folium/folium/templates/leaflet.awesome.rotate.min.css",
        "leaflet.awesome.rotate.min.css",
        r"https://cdn\.jsdelivr\.net/gh/python-visualization/folium(?:@[^/]+)?/folium/templates/leaflet\.awesome\.rotate(?:\.min)?\.css",
    ),
    (
        AssetKind::TimeDimensionJs,
        "https://cdn.jsdelivr.net/npm/leaflet-timedimension@1.1.0/dist/leaflet.timedimension.min.js",
        "leaflet.timedimension.min.js",
        r"https://cdn\.jsdelivr\.net/npm/leaflet-timedimension@[^/]+/dist/leaflet\.timedimension(?:\.min)?\.js",
    ),
    (
        AssetKind::TimeDimensionCss,
        "https://cdn.jsdelivr.net/npm/leaflet-timedimension@1.1.0/dist/leaflet.timedimension.control.css",
        "leaflet.timedimension.control.css",
        r"https://cdn\.jsdelivr\.net/npm/leaflet-timedimension@[^/]+/dist/leaflet\.timedimension\.control(?:\.min)?\.css",
    ),
    (
        AssetKind::MomentJs,
        "https://cdn.jsdelivr.net/npm/moment@2.29.4/min/moment.min.js",
        "moment.min.js",
        r"https://(?:cdnjs\.cloudflare\.com/ajax/libs/moment\.js/\d+\.\d+\.\d+/moment\.min\.js|cdn\.jsdelivr\.net/npm/moment@[^/]+/min/moment\.min\.js)",
    ),
    (
        AssetKind::Iso8601Js,
        "https://cdn.jsdelivr.net/npm/iso8601-js-period@0.2.1/iso8601.min.js",
        "iso8601.min.js",
        r"https://cdn\.jsdelivr\.net/npm/iso8601-js-period@[^/]+/iso8601(?:\.min)?\.js",
    ),
    (
        AssetKind::AntPathJs,
        "https://cdn.jsdelivr.net/npm/leaflet-ant-path@1.3.0/dist/leaflet-ant-path.min.js",
        "leaflet-ant-path.min.js",
        r"https://cdn\.jsdelivr\.net/npm/leaflet-ant-path@[^/]+/dist/leaflet-ant-path(?:\.min)?\.js",
    ),
    (
        AssetKind::MarkerClusterJs,
        "https://cdnjs.cloudflare.com/ajax/libs/leaflet.markercluster/1.1.0/leaflet.markercluster.js",
        "leaflet.markercluster.js",
        r"https://cdnjs\.cloudflare\.com/ajax/libs/leaflet\.markercluster/\d+\.\d+\.\d+/leaflet\.markercluster(?:-src)?\.js",
    ),
    (
        AssetKind::MarkerClusterCss,
        "https://cdnjs.cloudflare.com/ajax/libs/leaflet.markercluster/1.1.0/MarkerCluster.css",
        "MarkerCluster.css",
        r"https://cdnjs\.cloudflare\.com/ajax/libs/leaflet\.markercluster/\d+\.\d+\.\d+/MarkerCluster\.css",
    ),
    (
        AssetKind::MarkerClusterDefaultCss,
        "https://cdnjs.cloudflare.com/ajax/libs/leaflet.markercluster/1.1.0/MarkerCluster.Default.css",
        "MarkerCluster.Default.css",
        r"https://cdnjs\.cloudflare\.com/ajax/libs/leaflet\.markercluster/\d+\.\d+\.\d+/MarkerCluster\.Default\.css",
    ),
    (
        AssetKind::DrawJs,
        "https://cdnjs.cloudflare.com/ajax/libs/leaflet.draw/1.0.2/leaflet.draw.js",
        "leaflet.draw.js",
        r"https://cdnjs\.cloudflare\.com/ajax/libs/leaflet\.draw/\d+\.\d+\.\d+/leaflet\.draw(?:-src)?\.js",
    ),
    (
        AssetKind::DrawCss,
        "https://cdnjs.cloudflare.com/ajax/libs/leaflet.draw/1.0.2/leaflet.draw.css",
        "leaflet.draw.css",
        r"https://cdnjs\.cloudflare\.com/ajax/libs/leaflet\.draw/\d+\.\d+\.\d+/leaflet\.draw(?:-src)?\.css",
    ),
];

static PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    STANDARD
        .iter()
        .map(|(_, _, _, pattern)| {
            Regex::new(&format!("^(?:{pattern})$")).expect("catalog pattern must compile")
        })
        .collect()
});

static STANDARD_CATALOG: LazyLock<Catalog> = LazyLock::new(|| Catalog {
    entries: STANDARD
        .iter()
        .map(|(kind, url, filename, _)| CatalogEntry {
            kind: *kind,
            canonical_url: url.to_string(),
            local_filename: filename,
        })
        .collect(),
});

/// Read-only table of AssetKind → [`CatalogEntry`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Catalog {
    /// Indexed by `AssetKind as usize`.
    entries: Vec<CatalogEntry>,
}

impl Catalog {
    /// The stock catalog, built on first use and shared for the process lifetime.
    pub fn standard() -> &'static Catalog {
        &STANDARD_CATALOG
    }

    /// Copy of this catalog with some canonical URLs replaced (mirrors,
    /// pinned versions). Local filenames never change.
    pub fn with_url_overrides(&self, overrides: &BTreeMap<AssetKind, String>) -> Catalog {
        let mut catalog = self.clone();
        for (kind, url) in overrides {
            catalog.entries[kind.index()].canonical_url = url.clone();
        }
        catalog
    }

    /// Total lookup: every kind has an entry.
    pub fn entry(&self, kind: AssetKind) -> &CatalogEntry {
        &self.entries[kind.index()]
    }

    pub fn entries(&self) -> impl Iterator<Item = &CatalogEntry> {
        self.entries.iter()
    }

    pub fn group(&self, group: PluginGroup) -> impl Iterator<Item = &CatalogEntry> {
        self.entries.iter().filter(move |e| e.group() == group)
    }

    /// Reverse lookup from a URL found in a document.
    ///
    /// Exact canonical matches win over pattern matches, so an overridden
    /// mirror URL resolves to its own kind even if it would also satisfy
    /// another kind's pattern.
    pub fn kind_for_url(&self, url: &str) -> Option<AssetKind> {
        let url = url.trim();
        if url.is_empty() {
            return None;
        }
        self.entries
            .iter()
            .find(|e| e.canonical_url == url)
            .or_else(|| {
                self.entries
                    .iter()
                    .find(|e| PATTERNS[e.kind.index()].is_match(url))
            })
            .map(|e| e.kind)
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Catalog::standard().clone()
    }
}
