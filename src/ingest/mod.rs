// src/ingest/mod.rs
pub mod providers;
pub mod types;

use sha2::{Digest, Sha256};

/// How much of a feed summary is kept; scoring never needs more.
const MAX_TEXT_CHARS: usize = 1500;

/// Normalize feed text for scoring: decode entities, strip markup, collapse
/// whitespace, cap the length.
pub fn normalize_text(s: &str) -> String {
    let mut out = html_escape::decode_html_entities(s).to_string();

    // Tags become spaces so adjacent words don't fuse across markup.
    static RE_TAGS: once_cell::sync::OnceCell<regex::Regex> = once_cell::sync::OnceCell::new();
    let re_tags = RE_TAGS.get_or_init(|| regex::Regex::new(r"(?is)</?[^>]+>").unwrap());
    out = re_tags.replace_all(&out, " ").to_string();

    // Smart quotes and guillemets to their ASCII equivalents.
    out = out
        .replace(['\u{201C}', '\u{201D}', '\u{00AB}', '\u{00BB}'], "\"")
        .replace(['\u{2018}', '\u{2019}'], "'");

    static RE_WS: once_cell::sync::OnceCell<regex::Regex> = once_cell::sync::OnceCell::new();
    let re_ws = RE_WS.get_or_init(|| regex::Regex::new(r"\s+").unwrap());
    out = re_ws.replace_all(&out, " ").to_string();
    out = out.trim().to_string();

    if out.chars().count() > MAX_TEXT_CHARS {
        out = out.chars().take(MAX_TEXT_CHARS).collect();
    }

    out
}

/// Stable identity for a logical item: unsalted SHA-256 over
/// (source, link-or-id, title), truncated to 16 hex chars. The same item
/// must hash to the same id across runs, so no randomness is intended here.
pub fn item_id(source: &str, link_or_id: &str, title: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(source.as_bytes());
    hasher.update(b"\n");
    hasher.update(link_or_id.as_bytes());
    hasher.update(b"\n");
    hasher.update(title.as_bytes());
    let digest = hasher.finalize();
    let mut out = String::with_capacity(16);
    for b in digest.iter().take(8) {
        use std::fmt::Write as _;
        let _ = write!(&mut out, "{:02x}", b);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_strips_tags_and_entities() {
        let s = "  <p>Nye&nbsp;krav til <b>emballasje</b></p>  ";
        assert_eq!(normalize_text(s), "Nye krav til emballasje");
    }

    #[test]
    fn normalize_collapses_whitespace() {
        assert_eq!(normalize_text("a\n\n  b\t c"), "a b c");
    }

    #[test]
    fn item_id_is_stable_and_distinguishes_fields() {
        let a = item_id("Høringer", "https://example.no/1", "Tittel");
        let b = item_id("Høringer", "https://example.no/1", "Tittel");
        assert_eq!(a, b);
        assert_eq!(a.len(), 16);

        let other_title = item_id("Høringer", "https://example.no/1", "Annen tittel");
        let other_source = item_id("Stortinget", "https://example.no/1", "Tittel");
        assert_ne!(a, other_title);
        assert_ne!(a, other_source);
    }
}
