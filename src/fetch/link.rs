//! Object identifiers inside links.

use regex::Regex;
use std::sync::OnceLock;

fn path_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"/d/([^/?#&]+)").expect("static regex"))
}

fn query_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"[?&]id=([^&#]+)").expect("static regex"))
}

/// Extract the storage object identifier from a link.
///
/// Recognised forms, in order:
/// - `https://drive.google.com/file/d/<id>/view`
/// - `https://drive.google.com/open?id=<id>`
/// - anything else is taken to be the identifier itself
pub fn extract_object_id(link: &str) -> String {
    let link = link.trim();

    if let Some(caps) = path_pattern().captures(link) {
        return caps[1].to_string();
    }
    if let Some(caps) = query_pattern().captures(link) {
        return caps[1].to_string();
    }

    link.to_string()
}
