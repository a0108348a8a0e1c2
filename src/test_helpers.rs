//! Shared test utilities for the leaflet-offline test suite.
//!
//! Provides a folium-style map document, fake asset files, and assertions
//! about which CDN references a document still carries.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let tmp = TempDir::new().unwrap();
//! write_assets(tmp.path(), &core_kinds());
//! let html = map_document(&Plugins { time: true, ..Default::default() });
//! assert_remote(&html, AssetKind::TimeDimensionJs);
//! ```

use std::path::Path;

use crate::catalog::{AssetKind, AssetType, Catalog, PluginGroup};
use crate::features::Plugins;

// =========================================================================
// Fixture setup
// =========================================================================

/// Deterministic fake content for an asset. Distinct per kind so tests can
/// tell which file ended up where.
pub fn asset_body(kind: AssetKind) -> String {
    match kind.asset_type() {
        AssetType::Script => format!("/* {kind} */\nwindow.__{kind} = true;"),
        AssetType::Stylesheet => format!("/* {kind} */\n.{kind} {{ color: red; }}"),
    }
}

/// Write [`asset_body`] for each kind under its catalog filename.
pub fn write_assets(dir: &Path, kinds: &[AssetKind]) {
    std::fs::create_dir_all(dir).unwrap();
    let catalog = Catalog::standard();
    for kind in kinds {
        std::fs::write(dir.join(catalog.entry(*kind).local_filename), asset_body(*kind)).unwrap();
    }
}

pub fn core_kinds() -> Vec<AssetKind> {
    Catalog::standard()
        .group(PluginGroup::Core)
        .map(|e| e.kind)
        .collect()
}

/// The tag a map generator emits for a kind's canonical URL.
pub fn asset_tag(kind: AssetKind) -> String {
    let url = &Catalog::standard().entry(kind).canonical_url;
    match kind.asset_type() {
        AssetType::Script => format!(r#"<script src="{url}"></script>"#),
        AssetType::Stylesheet => format!(r#"<link rel="stylesheet" href="{url}"/>"#),
    }
}

/// A document shaped like folium output: asset tags in the head, a map div,
/// and an inline script that builds the map.
pub fn map_document(plugins: &Plugins) -> String {
    let mut head = String::new();
    for entry in Catalog::standard().entries() {
        if plugins.includes(entry.group()) {
            head.push_str("    ");
            head.push_str(&asset_tag(entry.kind));
            head.push('\n');
        }
    }
    format!(
        r#"<!DOCTYPE html>
<html>
<head>
    <meta http-equiv="content-type" content="text/html; charset=UTF-8" />
    <script>L_NO_TOUCH = false; L_DISABLE_3D = false;</script>
    <style>html, body {{width: 100%;height: 100%;margin: 0;padding: 0;}}</style>
{head}    <meta name="viewport" content="width=device-width, initial-scale=1.0" />
</head>
<body>
    <div class="folium-map" id="map_1"></div>
</body>
<script>
    var map_1 = L.map("map_1", {{center: [51.5, -0.12], zoom: 12}});
    var tile_layer_1 = L.tileLayer("https://tile.openstreetmap.org/{{z}}/{{x}}/{{y}}.png", {{maxZoom: 19}});
    tile_layer_1.addTo(map_1);
</script>
</html>
"#
    )
}

// =========================================================================
// Assertions
// =========================================================================

/// Assert the document still references `kind` through its canonical URL.
pub fn assert_remote(html: &str, kind: AssetKind) {
    let url = &Catalog::standard().entry(kind).canonical_url;
    assert!(html.contains(url.as_str()), "expected {kind} to stay remote ({url})");
}

/// Assert the document no longer references `kind`'s canonical URL.
pub fn assert_not_remote(html: &str, kind: AssetKind) {
    let url = &Catalog::standard().entry(kind).canonical_url;
    assert!(!html.contains(url.as_str()), "{kind} still remote ({url})");
}
