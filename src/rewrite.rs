//! Document post-processing: point asset tags at local files or inline them.
//!
//! The input is an opaque HTML document produced by a map generator. Only two
//! tag shapes are ever rewritten:
//!
//! ```text
//! <script src="https://cdn.../leaflet.js"></script>        (script assets)
//! <link rel="stylesheet" href="https://cdn.../leaflet.css"/> (stylesheet assets)
//! ```
//!
//! ## Scanning
//!
//! The document is scanned once, left to right, by a single pattern whose
//! alternatives are HTML comments, whole `<script>…</script>` elements, whole
//! `<style>…</style>` elements and `<link>` tags. Comments, style bodies and
//! scripts without `src` are consumed and skipped. A `<link>` counts only when
//! its `rel` includes `stylesheet`. A CDN URL that appears inside map-building
//! JavaScript, inside an already-embedded asset, or inside a comment is never
//! touched. Every byte outside a rewritten tag is copied through in order,
//! unchanged apart from the optional tile template replacement.
//!
//! ## Modes
//!
//! | Mode | Resolved kind | Unresolved kind |
//! |------|---------------|-----------------|
//! | `RemotePassthrough` | unchanged | unchanged |
//! | `LocalReference` | URL attribute → local path | unchanged |
//! | `InlineEmbed` | tag → `<script>`/`<style>` with file content | as `LocalReference` |
//!
//! Embedded content is written verbatim between two newlines and is never
//! subject to tile replacement. An inlined stylesheet keeps its link's
//! `media`. A script that itself contains `</script` (or a stylesheet
//! containing `</style`) cannot be embedded without altering it, so that tag
//! falls back to a local reference.
//!
//! ## Idempotence
//!
//! A rewritten link no longer carries a catalog URL and an embedded block has
//! no `src`, so running [`process`] again over its own output changes nothing.

use crate::catalog::{AssetKind, AssetType, Catalog};
use crate::features::FeatureSet;
use crate::manifest::AssetManifest;
use maud::{Escaper, PreEscaped, html};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt::Write as _;
use std::ops::Range;
use std::path::{Component, Path, PathBuf};
use std::sync::LazyLock;

static TAG_SCAN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"(?is)<!--.*?-->",
        r"|<script\b(?P<script_attrs>[^>]*)>.*?</script\s*>",
        r"|<style\b[^>]*>.*?</style\s*>",
        r"|<link\b(?P<link_attrs>[^>]*)>",
    ))
    .expect("tag scan pattern must compile")
});

static ATTR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)(?:^|\s)(?P<name>[a-z][a-z0-9_:.-]*)\s*=\s*(?P<value>"[^"]*"|'[^']*'|[^\s"'=<>`]+)"#)
        .expect("attribute pattern must compile")
});

static OSM_TILES: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"https://(?:\{s\}\.)?tile\.openstreetmap\.org/\{z\}/\{x\}/\{y\}\.png")
        .expect("tile pattern must compile")
});

/// How asset references are written into the saved document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SaveMode {
    RemotePassthrough,
    LocalReference,
    InlineEmbed,
}

impl std::fmt::Display for SaveMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            SaveMode::RemotePassthrough => "remote",
            SaveMode::LocalReference => "local reference",
            SaveMode::InlineEmbed => "inline",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Default)]
pub struct RewriteOptions {
    /// Write local links relative to this directory (usually the output
    /// file's directory). `None` writes the manifest path as is.
    pub link_base: Option<PathBuf>,
    /// Replacement for the OpenStreetMap tile URL template.
    pub tiles_template: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum RewriteAction {
    /// URL attribute now points at `target`.
    Linked { target: String },
    /// Tag replaced by an inline block of `bytes` bytes.
    Embedded { bytes: usize },
}

/// One rewritten tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Rewrite {
    pub kind: AssetKind,
    #[serde(flatten)]
    pub action: RewriteAction,
}

#[derive(Debug, Clone, Default)]
pub struct ProcessedDocument {
    pub html: String,
    /// Rewritten tags in document order.
    pub rewrites: Vec<Rewrite>,
    /// Recognized kinds still referenced remotely.
    pub unresolved: BTreeSet<AssetKind>,
    /// The subset of `unresolved` the feature set requires.
    pub required_remote: BTreeSet<AssetKind>,
    /// Kinds whose content could not be embedded verbatim and were linked instead.
    pub not_embeddable: BTreeSet<AssetKind>,
    /// Number of tile URL templates replaced.
    pub tiles_replaced: usize,
}

/// A recognized asset tag in a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetReference {
    pub kind: AssetKind,
    pub url: String,
}

/// An external `<script src>` or `<link rel="stylesheet" href>` tag found by
/// the scanner.
struct Candidate {
    tag: Range<usize>,
    tag_type: AssetType,
    url: String,
    /// Span of the attribute value, quotes included.
    value: Range<usize>,
    /// Raw `media` attribute of a stylesheet link.
    media: Option<String>,
}

/// Span of the first `name=value` attribute in `attrs`, quotes included.
fn attribute<'a>(attrs: &'a str, name: &str) -> Option<regex::Match<'a>> {
    ATTR.captures_iter(attrs)
        .find(|c| c["name"].eq_ignore_ascii_case(name))?
        .name("value")
}

fn unquote(value: &str) -> &str {
    value.trim_matches(|c| c == '"' || c == '\'').trim()
}

fn candidates(document: &str) -> impl Iterator<Item = Candidate> + '_ {
    TAG_SCAN.captures_iter(document).filter_map(|caps| {
        let whole = caps.get(0)?;
        let (tag_type, attrs, wanted) = if let Some(attrs) = caps.name("script_attrs") {
            (AssetType::Script, attrs, "src")
        } else if let Some(attrs) = caps.name("link_attrs") {
            (AssetType::Stylesheet, attrs, "href")
        } else {
            return None;
        };
        let mut media = None;
        if tag_type == AssetType::Stylesheet {
            // Preloads, icons and other link relations are not stylesheets.
            let rel = attribute(attrs.as_str(), "rel")?;
            if !unquote(rel.as_str())
                .split_ascii_whitespace()
                .any(|t| t.eq_ignore_ascii_case("stylesheet"))
            {
                return None;
            }
            media = attribute(attrs.as_str(), "media").map(|m| unquote(m.as_str()).to_string());
        }
        let value = attribute(attrs.as_str(), wanted)?;
        Some(Candidate {
            tag: whole.range(),
            tag_type,
            url: unquote(value.as_str()).to_string(),
            value: attrs.start() + value.start()..attrs.start() + value.end(),
            media,
        })
    })
}

/// Every catalog asset referenced by an external tag, in document order.
pub fn find_references(document: &str, catalog: &Catalog) -> Vec<AssetReference> {
    candidates(document)
        .filter_map(|c| {
            let kind = catalog.kind_for_url(&c.url)?;
            (kind.asset_type() == c.tag_type).then_some(AssetReference { kind, url: c.url })
        })
        .collect()
}

/// Rewrite recognized asset tags according to `mode`.
pub fn process(
    document: &str,
    catalog: &Catalog,
    manifest: &AssetManifest,
    mode: SaveMode,
    features: &FeatureSet,
    options: &RewriteOptions,
) -> ProcessedDocument {
    let mut result = ProcessedDocument::default();
    let mut html = String::with_capacity(document.len());
    let mut copied = 0;

    for candidate in candidates(document) {
        let Some(kind) = catalog.kind_for_url(&candidate.url) else {
            continue;
        };
        if kind.asset_type() != candidate.tag_type {
            continue;
        }

        let replacement = match mode {
            SaveMode::RemotePassthrough => None,
            SaveMode::LocalReference => link_tag(document, &candidate, kind, manifest, options),
            SaveMode::InlineEmbed => match manifest.content(kind) {
                Some(content) if embeddable(kind, content) => {
                    let block = inline_block(kind, content, candidate.media.as_deref());
                    Some((
                        block,
                        Rewrite {
                            kind,
                            action: RewriteAction::Embedded {
                                bytes: content.len(),
                            },
                        },
                    ))
                }
                Some(_) => {
                    result.not_embeddable.insert(kind);
                    link_tag(document, &candidate, kind, manifest, options)
                }
                None => link_tag(document, &candidate, kind, manifest, options),
            },
        };

        match replacement {
            Some((text, rewrite)) => {
                result.tiles_replaced += copy_through(
                    &mut html,
                    &document[copied..candidate.tag.start],
                    options.tiles_template.as_deref(),
                );
                html.push_str(&text);
                copied = candidate.tag.end;
                result.rewrites.push(rewrite);
            }
            None => {
                result.unresolved.insert(kind);
            }
        }
    }
    result.tiles_replaced += copy_through(
        &mut html,
        &document[copied..],
        options.tiles_template.as_deref(),
    );

    // A kind linked in one tag but left remote in another is still remote.
    result.required_remote = result
        .unresolved
        .iter()
        .copied()
        .filter(|k| features.contains(*k))
        .collect();
    result.html = html;
    result
}

/// Append a span of the input document, replacing OpenStreetMap tile URLs
/// with `template` when one is set. Inserted blocks never pass through here,
/// so embedded content keeps its exact bytes. Returns the number replaced.
fn copy_through(html: &mut String, span: &str, template: Option<&str>) -> usize {
    let Some(template) = template else {
        html.push_str(span);
        return 0;
    };
    let mut replaced = 0;
    let mut last = 0;
    for tile in OSM_TILES.find_iter(span) {
        html.push_str(&span[last..tile.start()]);
        html.push_str(template);
        last = tile.end();
        replaced += 1;
    }
    html.push_str(&span[last..]);
    replaced
}

/// The candidate tag with its URL attribute pointed at the local file.
fn link_tag(
    document: &str,
    candidate: &Candidate,
    kind: AssetKind,
    manifest: &AssetManifest,
    options: &RewriteOptions,
) -> Option<(String, Rewrite)> {
    let path = manifest.path(kind)?;
    let target = link_target(path, options.link_base.as_deref());

    let mut tag = String::with_capacity(candidate.tag.len() + target.len());
    tag.push_str(&document[candidate.tag.start..candidate.value.start]);
    tag.push('"');
    // Writing into a String cannot fail.
    let _ = Escaper::new(&mut tag).write_str(&target);
    tag.push('"');
    tag.push_str(&document[candidate.value.end..candidate.tag.end]);

    Some((
        tag,
        Rewrite {
            kind,
            action: RewriteAction::Linked { target },
        },
    ))
}

fn embeddable(kind: AssetKind, content: &str) -> bool {
    let closing = match kind.asset_type() {
        AssetType::Script => "</script",
        AssetType::Stylesheet => "</style",
    };
    !content.to_ascii_lowercase().contains(closing)
}

/// `media` is copied from the source link so a scoped stylesheet stays scoped.
fn inline_block(kind: AssetKind, content: &str, media: Option<&str>) -> String {
    // Already attribute-encoded in the source document.
    let media = media.map(|m| PreEscaped(m.replace('"', "&quot;")));
    let markup = match kind.asset_type() {
        AssetType::Script => html! {
            script data-offline-asset=(kind.key()) { "\n" (PreEscaped(content)) "\n" }
        },
        AssetType::Stylesheet => html! {
            style data-offline-asset=(kind.key()) media=[media] { "\n" (PreEscaped(content)) "\n" }
        },
    };
    markup.into_string()
}

/// Render a local path for an HTML attribute, relative to `base` when given.
pub fn link_target(path: &Path, base: Option<&Path>) -> String {
    let rendered = match base {
        Some(base) => relative_path(path, base),
        None => path.to_path_buf(),
    };
    rendered.to_string_lossy().replace('\\', "/")
}

/// `path` expressed relative to the directory `base`.
///
/// Both sides are made absolute first. Paths on different roots (Windows
/// drives) are returned absolute.
fn relative_path(path: &Path, base: &Path) -> PathBuf {
    let (Ok(path), Ok(base)) = (std::path::absolute(path), std::path::absolute(base)) else {
        return path.to_path_buf();
    };
    let path: Vec<Component> = path.components().collect();
    let base: Vec<Component> = base.components().collect();
    if path.first() != base.first() {
        return path.iter().collect();
    }
    let common = path
        .iter()
        .zip(base.iter())
        .take_while(|(a, b)| a == b)
        .count();

    let mut relative = PathBuf::new();
    for _ in common..base.len() {
        relative.push("..");
    }
    for component in &path[common..] {
        relative.push(component.as_os_str());
    }
    relative
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::Plugins;
    use crate::manifest::{LoadContent, ResolvedAsset};
    use crate::test_helpers::*;
    use tempfile::TempDir;

    fn full_manifest(dir: &Path, plugins: &Plugins, load: LoadContent) -> AssetManifest {
        let kinds: Vec<AssetKind> = AssetKind::ALL
            .into_iter()
            .filter(|k| plugins.includes(k.group()))
            .collect();
        write_assets(dir, &kinds);
        AssetManifest::scan(Catalog::standard(), dir, load)
    }

    fn run(doc: &str, manifest: &AssetManifest, mode: SaveMode, plugins: &Plugins) -> ProcessedDocument {
        process(
            doc,
            Catalog::standard(),
            manifest,
            mode,
            &FeatureSet::from_plugins(plugins),
            &RewriteOptions::default(),
        )
    }

    #[test]
    fn passthrough_leaves_document_untouched() {
        let tmp = TempDir::new().unwrap();
        let plugins = Plugins::all();
        let doc = map_document(&plugins);
        let manifest = full_manifest(tmp.path(), &plugins, LoadContent::Contents);

        let out = run(&doc, &manifest, SaveMode::RemotePassthrough, &plugins);
        assert_eq!(out.html, doc);
        assert!(out.rewrites.is_empty());
        assert_eq!(out.unresolved.len(), AssetKind::ALL.len());
    }

    #[test]
    fn inline_embeds_every_resolved_kind() {
        let tmp = TempDir::new().unwrap();
        let plugins = Plugins {
            time: true,
            ..Default::default()
        };
        let doc = map_document(&plugins);
        let manifest = full_manifest(tmp.path(), &plugins, LoadContent::Contents);

        let out = run(&doc, &manifest, SaveMode::InlineEmbed, &plugins);
        for kind in FeatureSet::from_plugins(&plugins).iter() {
            assert_not_remote(&out.html, kind);
            assert!(out.html.contains(&asset_body(kind)), "{kind} content missing");
        }
        assert!(out.unresolved.is_empty());
        assert_eq!(out.rewrites.len(), 14);
        assert!(out.html.contains(
            "<script data-offline-asset=\"leaflet_js\">\n/* leaflet_js */\nwindow.__leaflet_js = true;\n</script>"
        ));
        assert!(out.html.contains("<style data-offline-asset=\"leaflet_css\">\n"));
    }

    #[test]
    fn inline_preserves_content_byte_for_byte() {
        let mut manifest = AssetManifest::new();
        let content = "a < b && c > d; s = \"&amp;\";\r\n\t// é";
        manifest.insert(
            AssetKind::LeafletJs,
            ResolvedAsset {
                path: PathBuf::from("/assets/leaflet.js"),
                content: Some(content.to_string()),
            },
        );
        let doc = format!("<head>{}</head>", asset_tag(AssetKind::LeafletJs));

        let out = run(&doc, &manifest, SaveMode::InlineEmbed, &Plugins::default());
        assert_eq!(
            out.html,
            format!("<head><script data-offline-asset=\"leaflet_js\">\n{content}\n</script></head>")
        );
        assert_eq!(
            out.rewrites,
            vec![Rewrite {
                kind: AssetKind::LeafletJs,
                action: RewriteAction::Embedded {
                    bytes: content.len()
                }
            }]
        );
    }

    #[test]
    fn local_reference_rewrites_only_the_url() {
        let mut manifest = AssetManifest::new();
        manifest.insert(
            AssetKind::LeafletCss,
            ResolvedAsset {
                path: PathBuf::from("/opt/assets/leaflet.css"),
                content: None,
            },
        );
        let doc = r#"<link rel="stylesheet" href="https://cdn.jsdelivr.net/npm/leaflet@1.9.3/dist/leaflet.css" data-x="1"/>"#;

        let out = run(doc, &manifest, SaveMode::LocalReference, &Plugins::default());
        assert_eq!(
            out.html,
            r#"<link rel="stylesheet" href="/opt/assets/leaflet.css" data-x="1"/>"#
        );
    }

    #[test]
    fn local_reference_falls_back_to_remote_when_unresolved() {
        let tmp = TempDir::new().unwrap();
        let plugins = Plugins {
            time: true,
            ..Default::default()
        };
        let doc = map_document(&plugins);
        write_assets(tmp.path(), &core_kinds());
        let manifest = AssetManifest::scan(Catalog::standard(), tmp.path(), LoadContent::PathsOnly);

        let out = run(&doc, &manifest, SaveMode::LocalReference, &plugins);
        assert_remote(&out.html, AssetKind::TimeDimensionJs);
        assert_remote(&out.html, AssetKind::MomentJs);
        assert_not_remote(&out.html, AssetKind::LeafletJs);
        assert_eq!(out.unresolved.len(), 4);
        assert_eq!(out.required_remote, out.unresolved);
    }

    #[test]
    fn inline_falls_back_to_link_without_content() {
        let tmp = TempDir::new().unwrap();
        let plugins = Plugins::default();
        let doc = map_document(&plugins);
        let manifest = full_manifest(tmp.path(), &plugins, LoadContent::PathsOnly);

        let out = run(&doc, &manifest, SaveMode::InlineEmbed, &plugins);
        assert!(out.unresolved.is_empty());
        assert!(out
            .rewrites
            .iter()
            .all(|r| matches!(r.action, RewriteAction::Linked { .. })));
    }

    #[test]
    fn script_containing_closing_tag_is_linked_not_embedded() {
        let mut manifest = AssetManifest::new();
        manifest.insert(
            AssetKind::JqueryJs,
            ResolvedAsset {
                path: PathBuf::from("/a/jquery-3.7.1.min.js"),
                content: Some("var s = '<script></SCRIPT>';".into()),
            },
        );
        let doc = asset_tag(AssetKind::JqueryJs);

        let out = run(&doc, &manifest, SaveMode::InlineEmbed, &Plugins::default());
        assert_eq!(out.html, r#"<script src="/a/jquery-3.7.1.min.js"></script>"#);
        assert!(out.not_embeddable.contains(&AssetKind::JqueryJs));
    }

    #[test]
    fn process_is_idempotent_in_every_mode() {
        let tmp = TempDir::new().unwrap();
        let plugins = Plugins::all();
        let doc = map_document(&plugins);
        // Leave one kind out so unresolved references are exercised too.
        let kinds: Vec<AssetKind> = AssetKind::ALL
            .into_iter()
            .filter(|k| *k != AssetKind::DrawCss)
            .collect();
        write_assets(tmp.path(), &kinds);
        let manifest = AssetManifest::scan(Catalog::standard(), tmp.path(), LoadContent::Contents);

        for mode in [
            SaveMode::RemotePassthrough,
            SaveMode::LocalReference,
            SaveMode::InlineEmbed,
        ] {
            let once = run(&doc, &manifest, mode, &plugins);
            let twice = run(&once.html, &manifest, mode, &plugins);
            assert_eq!(once.html, twice.html, "{mode} not idempotent");
            assert!(twice.rewrites.is_empty(), "{mode} rewrote twice");
        }
    }

    #[test]
    fn embedded_content_mentioning_cdn_tags_is_not_rewritten_again() {
        let mut manifest = AssetManifest::new();
        let tricky = format!("document.write('{}');", asset_tag(AssetKind::LeafletCss));
        manifest.insert(
            AssetKind::LeafletJs,
            ResolvedAsset {
                path: PathBuf::from("/a/leaflet.js"),
                content: Some(tricky.clone()),
            },
        );
        manifest.insert(
            AssetKind::LeafletCss,
            ResolvedAsset {
                path: PathBuf::from("/a/leaflet.css"),
                content: Some("x{}".into()),
            },
        );
        let doc = asset_tag(AssetKind::LeafletJs);

        let once = run(&doc, &manifest, SaveMode::InlineEmbed, &Plugins::default());
        assert!(once.html.contains(&tricky));
        let twice = run(&once.html, &manifest, SaveMode::InlineEmbed, &Plugins::default());
        assert_eq!(once.html, twice.html);
    }

    #[test]
    fn urls_outside_asset_tags_are_untouched() {
        let tmp = TempDir::new().unwrap();
        let plugins = Plugins::default();
        let manifest = full_manifest(tmp.path(), &plugins, LoadContent::Contents);
        let url = "https://cdn.jsdelivr.net/npm/leaflet@1.9.3/dist/leaflet.js";
        let doc = format!(
            "<!-- {tag} -->\n<script>var u = \"{url}\";</script>\n<p>{url}</p>\n<a href=\"{url}\">x</a>",
            tag = asset_tag(AssetKind::LeafletJs)
        );

        let out = run(&doc, &manifest, SaveMode::InlineEmbed, &plugins);
        assert_eq!(out.html, doc);
        assert!(out.rewrites.is_empty());
    }

    #[test]
    fn unknown_and_mismatched_references_are_left_alone() {
        let tmp = TempDir::new().unwrap();
        let manifest = full_manifest(tmp.path(), &Plugins::all(), LoadContent::Contents);
        let doc = concat!(
            r#"<script src="https://example.com/widget.js"></script>"#,
            r#"<link rel="preload" href="https://cdn.jsdelivr.net/npm/leaflet@1.9.3/dist/leaflet.js"/>"#,
            r#"<script data-src="https://cdn.jsdelivr.net/npm/leaflet@1.9.3/dist/leaflet.js"></script>"#,
        );

        let out = run(doc, &manifest, SaveMode::InlineEmbed, &Plugins::all());
        assert_eq!(out.html, doc);
        assert!(out.unresolved.is_empty());
    }

    #[test]
    fn attribute_quoting_variants_are_recognized() {
        let mut manifest = AssetManifest::new();
        manifest.insert(
            AssetKind::LeafletJs,
            ResolvedAsset {
                path: PathBuf::from("/a/leaflet.js"),
                content: None,
            },
        );
        let url = &Catalog::standard().entry(AssetKind::LeafletJs).canonical_url;
        for doc in [
            format!("<SCRIPT SRC='{url}'></SCRIPT>"),
            format!("<script defer src={url}></script>"),
            format!("<script\n  src = \"{url}\"\n></script >"),
        ] {
            let out = run(&doc, &manifest, SaveMode::LocalReference, &Plugins::default());
            assert!(out.html.contains("\"/a/leaflet.js\""), "{doc} -> {}", out.html);
            assert_eq!(out.rewrites.len(), 1);
        }
    }

    #[test]
    fn link_targets_are_escaped() {
        let mut manifest = AssetManifest::new();
        manifest.insert(
            AssetKind::LeafletJs,
            ResolvedAsset {
                path: PathBuf::from("/a&b/\"x\"/leaflet.js"),
                content: None,
            },
        );
        let out = run(
            &asset_tag(AssetKind::LeafletJs),
            &manifest,
            SaveMode::LocalReference,
            &Plugins::default(),
        );
        assert_eq!(
            out.html,
            r#"<script src="/a&amp;b/&quot;x&quot;/leaflet.js"></script>"#
        );
    }

    #[test]
    fn relative_links_use_link_base() {
        let mut manifest = AssetManifest::new();
        manifest.insert(
            AssetKind::LeafletJs,
            ResolvedAsset {
                path: PathBuf::from("/srv/maps/assets/leaflet.js"),
                content: None,
            },
        );
        let options = RewriteOptions {
            link_base: Some(PathBuf::from("/srv/maps/out")),
            ..Default::default()
        };
        let out = process(
            &asset_tag(AssetKind::LeafletJs),
            Catalog::standard(),
            &manifest,
            SaveMode::LocalReference,
            &FeatureSet::default(),
            &options,
        );
        assert_eq!(out.html, r#"<script src="../assets/leaflet.js"></script>"#);
    }

    #[test]
    fn relative_path_cases() {
        assert_eq!(
            relative_path(Path::new("/a/b/c.js"), Path::new("/a/b")),
            PathBuf::from("c.js")
        );
        assert_eq!(
            relative_path(Path::new("/a/x/c.js"), Path::new("/a/b/d")),
            PathBuf::from("../../x/c.js")
        );
    }

    #[test]
    fn tiles_template_replaces_osm_urls() {
        let doc = map_document(&Plugins::default());
        let options = RewriteOptions {
            tiles_template: Some("http://127.0.0.1:8080/{z}/{x}/{y}.png".into()),
            ..Default::default()
        };
        let out = process(
            &doc,
            Catalog::standard(),
            &AssetManifest::new(),
            SaveMode::LocalReference,
            &FeatureSet::default(),
            &options,
        );
        assert_eq!(out.tiles_replaced, 1);
        assert!(out.html.contains("L.tileLayer(\"http://127.0.0.1:8080/{z}/{x}/{y}.png\""));
        assert!(!out.html.contains("tile.openstreetmap.org"));
    }

    #[test]
    fn tiles_template_leaves_embedded_content_alone() {
        let mut manifest = AssetManifest::new();
        let content = "L.tileLayer('https://tile.openstreetmap.org/{z}/{x}/{y}.png');";
        manifest.insert(
            AssetKind::LeafletJs,
            ResolvedAsset {
                path: PathBuf::from("/assets/leaflet.js"),
                content: Some(content.to_string()),
            },
        );
        let doc = format!(
            "{}<script>L.tileLayer('https://{{s}}.tile.openstreetmap.org/{{z}}/{{x}}/{{y}}.png');</script>",
            asset_tag(AssetKind::LeafletJs)
        );
        let options = RewriteOptions {
            tiles_template: Some("http://127.0.0.1/{z}/{x}/{y}.png".into()),
            ..Default::default()
        };

        let out = process(
            &doc,
            Catalog::standard(),
            &manifest,
            SaveMode::InlineEmbed,
            &FeatureSet::default(),
            &options,
        );
        assert!(out.html.contains(&format!("\n{content}\n</script>")));
        assert!(out.html.ends_with("<script>L.tileLayer('http://127.0.0.1/{z}/{x}/{y}.png');</script>"));
        assert_eq!(out.tiles_replaced, 1);
    }

    #[test]
    fn only_stylesheet_links_are_assets() {
        let tmp = TempDir::new().unwrap();
        let manifest = full_manifest(tmp.path(), &Plugins::default(), LoadContent::Contents);
        let url = &Catalog::standard().entry(AssetKind::LeafletCss).canonical_url;
        let doc = format!(
            r#"<link rel="preload" as="style" href="{url}"><link href="{url}"><link rel=icon href="{url}">"#
        );

        let out = run(&doc, &manifest, SaveMode::InlineEmbed, &Plugins::default());
        assert_eq!(out.html, doc);
        assert!(out.rewrites.is_empty());
        assert!(find_references(&doc, Catalog::standard()).is_empty());

        let doc = format!(r#"<link rel="Alternate StyleSheet" href="{url}">"#);
        assert_eq!(find_references(&doc, Catalog::standard()).len(), 1);
    }

    #[test]
    fn inline_stylesheet_keeps_media() {
        let mut manifest = AssetManifest::new();
        manifest.insert(
            AssetKind::LeafletCss,
            ResolvedAsset {
                path: PathBuf::from("/assets/leaflet.css"),
                content: Some(".leaflet-map {}".into()),
            },
        );
        let url = &Catalog::standard().entry(AssetKind::LeafletCss).canonical_url;
        let doc = format!(r#"<link rel="stylesheet" media='print and (min-width: 10cm)' href="{url}">"#);

        let out = run(&doc, &manifest, SaveMode::InlineEmbed, &Plugins::default());
        assert_eq!(
            out.html,
            "<style data-offline-asset=\"leaflet_css\" media=\"print and (min-width: 10cm)\">\n.leaflet-map {}\n</style>"
        );
    }

    #[test]
    fn required_remote_only_counts_declared_features() {
        let plugins = Plugins {
            ant_path: true,
            ..Default::default()
        };
        let doc = map_document(&plugins);
        let out = process(
            &doc,
            Catalog::standard(),
            &AssetManifest::new(),
            SaveMode::LocalReference,
            &FeatureSet::from_kinds([AssetKind::LeafletJs]),
            &RewriteOptions::default(),
        );
        assert_eq!(out.unresolved.len(), 11);
        assert_eq!(
            out.required_remote,
            BTreeSet::from([AssetKind::LeafletJs])
        );
    }

    #[test]
    fn find_references_in_document_order() {
        let plugins = Plugins {
            draw: true,
            ..Default::default()
        };
        let refs = find_references(&map_document(&plugins), Catalog::standard());
        let kinds: Vec<AssetKind> = refs.iter().map(|r| r.kind).collect();
        assert_eq!(kinds.len(), 12);
        assert_eq!(kinds[0], AssetKind::LeafletJs);
        assert_eq!(kinds[11], AssetKind::DrawCss);
    }
}
