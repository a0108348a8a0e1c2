//! Remote URL audit for saved documents.
//!
//! Lists absolute `http(s)` URLs that appear as quoted strings or CSS
//! `url(...)` values anywhere in a document, including embedded asset
//! content. Loopback hosts count as local. The audit is informational: a
//! tile URL or an attribution link is expected to stay remote.

use regex::Regex;
use std::collections::HashSet;
use std::net::IpAddr;
use std::sync::LazyLock;
use url::{Host, Url};

static REMOTE_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)(?:["']|url\(\s*)(?P<url>https?://[^"'\s<>()]+)"#)
        .expect("remote url pattern must compile")
});

/// Distinct non-loopback URLs, in order of first appearance.
pub fn remote_urls(html: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    REMOTE_URL
        .captures_iter(html)
        .filter_map(|caps| caps.name("url").map(|m| m.as_str()))
        .filter(|url| !is_loopback(url))
        .filter(|url| seen.insert(*url))
        .map(str::to_string)
        .collect()
}

/// Whether `url` points at this machine.
///
/// URL templates such as `https://{s}.tile.example.org/...` do not parse and
/// are treated as remote.
pub fn is_loopback(url: &str) -> bool {
    let Ok(parsed) = Url::parse(url) else {
        return false;
    };
    match parsed.host() {
        Some(Host::Domain(domain)) => domain.eq_ignore_ascii_case("localhost"),
        Some(Host::Ipv4(ip)) => IpAddr::V4(ip).is_loopback(),
        Some(Host::Ipv6(ip)) => IpAddr::V6(ip).is_loopback(),
        None => false,
    }
}
