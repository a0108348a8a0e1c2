//! CLI output formatting.
//!
//! Every line leads with the asset kind key (`leaflet_js`), the same spelling
//! used in config files and `--asset` flags, so output can be pasted back
//! into a command. Paths and URLs are secondary context.
//!
//! # Output Format
//!
//! ## Fetch
//!
//! ```text
//! Fetching 14 assets → assets/
//!     leaflet_js: fetched (147.6 KB)
//!     jquery_js: skipped (already present)
//!     moment_js: FAILED HTTP status 404
//!
//! Fetched 12, skipped 1, failed 1
//!     moment_js: HTTP status 404
//! ```
//!
//! ## Embed
//!
//! ```text
//! Saved map.html (inline)
//!     leaflet_js: embedded (147.6 KB)
//!     leaflet_css: linked → assets/leaflet.css
//! Still remote
//!     timedimension_js
//! ```
//!
//! ## Check
//!
//! ```text
//! Assets
//!     leaflet_js
//!         https://cdn.jsdelivr.net/npm/leaflet@1.9.3/dist/leaflet.js
//! Remote URLs
//!     https://tile.openstreetmap.org/{z}/{x}/{y}.png
//! ```
//!
//! # Architecture
//!
//! Each view has a `format_*` function (returns `Vec<String>`) for testability
//! and a `print_*` wrapper that writes to stdout. Format functions are pure.

use crate::catalog::{Catalog, PluginGroup};
use crate::fetch::{FetchEvent, FetchReport};
use crate::rewrite::{AssetReference, RewriteAction};
use crate::save::SaveReport;

// ============================================================================
// Shared helpers
// ============================================================================

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

/// Human-readable byte count: `512 B`, `147.6 KB`, `1.3 MB`.
fn format_bytes(bytes: u64) -> String {
    const KB: f64 = 1000.0;
    let b = bytes as f64;
    if b < KB {
        format!("{bytes} B")
    } else if b < KB * KB {
        format!("{:.1} KB", b / KB)
    } else {
        format!("{:.1} MB", b / (KB * KB))
    }
}

fn print_lines(lines: &[String]) {
    for line in lines {
        println!("{}", line);
    }
}

// ============================================================================
// Fetch
// ============================================================================

/// Format a single fetch progress event.
pub fn format_fetch_event(event: &FetchEvent) -> Vec<String> {
    match event {
        FetchEvent::Started { target_dir, total } => {
            vec![format!("Fetching {} assets \u{2192} {}", total, target_dir.display())]
        }
        FetchEvent::Fetched { kind, bytes } => {
            vec![format!("{}{}: fetched ({})", indent(1), kind, format_bytes(*bytes))]
        }
        FetchEvent::Skipped { kind } => {
            vec![format!("{}{}: skipped (already present)", indent(1), kind)]
        }
        FetchEvent::Failed { kind, error } => {
            vec![format!("{}{}: FAILED {}", indent(1), kind, error)]
        }
    }
}

/// Summary after all events: counts, then each failure with its reason.
pub fn format_fetch_report(report: &FetchReport) -> Vec<String> {
    let mut lines = vec![format!(
        "Fetched {}, skipped {}, failed {}",
        report.succeeded.len(),
        report.skipped.len(),
        report.failed.len()
    )];
    for (kind, error) in &report.failed {
        lines.push(format!("{}{}: {}", indent(1), kind, error));
    }
    lines
}

pub fn print_fetch_report(report: &FetchReport) {
    print_lines(&format_fetch_report(report));
}

// ============================================================================
// Embed
// ============================================================================

pub fn format_save_report(report: &SaveReport) -> Vec<String> {
    let mut lines = vec![format!("Saved {} ({})", report.path.display(), report.mode)];

    for rewrite in &report.rewrites {
        let detail = match &rewrite.action {
            RewriteAction::Embedded { bytes } => {
                format!("embedded ({})", format_bytes(*bytes as u64))
            }
            RewriteAction::Linked { target } => format!("linked \u{2192} {}", target),
        };
        lines.push(format!("{}{}: {}", indent(1), rewrite.kind, detail));
    }

    if !report.not_embeddable.is_empty() {
        lines.push("Linked instead of inlined (content contains a closing tag)".to_string());
        for kind in &report.not_embeddable {
            lines.push(format!("{}{}", indent(1), kind));
        }
    }
    if !report.unreadable.is_empty() {
        lines.push("Unreadable".to_string());
        for (kind, reason) in &report.unreadable {
            lines.push(format!("{}{}: {}", indent(1), kind, reason));
        }
    }
    if !report.unresolved.is_empty() {
        lines.push("Still remote".to_string());
        for kind in &report.unresolved {
            lines.push(format!("{}{}", indent(1), kind));
        }
    }
    if report.tiles_replaced > 0 {
        lines.push(format!("Tile URLs replaced: {}", report.tiles_replaced));
    }
    if !report.remote_urls.is_empty() {
        lines.push(format!("Remote URLs ({})", report.remote_urls.len()));
        for url in &report.remote_urls {
            lines.push(format!("{}{}", indent(1), url));
        }
    }
    lines
}

pub fn print_save_report(report: &SaveReport) {
    print_lines(&format_save_report(report));
}

// ============================================================================
// Check
// ============================================================================

/// Recognized asset references followed by the remote URL audit.
pub fn format_check(references: &[AssetReference], remote_urls: &[String]) -> Vec<String> {
    let mut lines = Vec::new();
    if references.is_empty() {
        lines.push("No catalog assets referenced".to_string());
    } else {
        lines.push("Assets".to_string());
        for reference in references {
            lines.push(format!("{}{}", indent(1), reference.kind));
            lines.push(format!("{}{}", indent(2), reference.url));
        }
    }
    if remote_urls.is_empty() {
        lines.push("No remote URLs".to_string());
    } else {
        lines.push("Remote URLs".to_string());
        for url in remote_urls {
            lines.push(format!("{}{}", indent(1), url));
        }
    }
    lines
}

pub fn print_check(references: &[AssetReference], remote_urls: &[String]) {
    print_lines(&format_check(references, remote_urls));
}

// ============================================================================
// Catalog
// ============================================================================

/// Catalog grouped by plugin group.
///
/// ```text
/// core
///     leaflet_js → leaflet.js
///         https://cdn.jsdelivr.net/npm/leaflet@1.9.3/dist/leaflet.js
/// ```
pub fn format_catalog(catalog: &Catalog) -> Vec<String> {
    let mut lines = Vec::new();
    for group in [
        PluginGroup::Core,
        PluginGroup::Time,
        PluginGroup::AntPath,
        PluginGroup::Clustering,
        PluginGroup::Draw,
    ] {
        lines.push(group.to_string());
        for entry in catalog.group(group) {
            lines.push(format!(
                "{}{} \u{2192} {}",
                indent(1),
                entry.kind,
                entry.local_filename
            ));
            lines.push(format!("{}{}", indent(2), entry.canonical_url));
        }
    }
    lines
}

pub fn print_catalog(catalog: &Catalog) {
    print_lines(&format_catalog(catalog));
}
