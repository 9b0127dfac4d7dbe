// src/ingest/providers/lovdata.rs
//! Document source for monitored law pages (Lovdata et al.): fetches the
//! page, strips boilerplate blocks and markup, and hands cleaned text to the
//! change detector.

use anyhow::{Context, Result};
use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::fetch;
use crate::ingest::types::{DocumentPage, DocumentSource};

// Navigation, footers, and inline script/style never count as law text.
static RE_BOILERPLATE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?is)<script\b.*?</script\s*>|<style\b.*?</style\s*>|<nav\b.*?</nav\s*>|<footer\b.*?</footer\s*>|<header\b.*?</header\s*>",
    )
    .expect("boilerplate regex")
});
static RE_TAGS: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?is)</?[^>]+>").expect("tag regex"));
static RE_WS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("ws regex"));

/// Reduce a full HTML page to plain, whitespace-collapsed text.
pub fn strip_boilerplate(html: &str) -> String {
    let without_blocks = RE_BOILERPLATE.replace_all(html, " ");
    let without_tags = RE_TAGS.replace_all(&without_blocks, " ");
    let decoded = html_escape::decode_html_entities(&without_tags).to_string();
    RE_WS.replace_all(&decoded, " ").trim().to_string()
}

enum Mode {
    Fixture(String),
    Http { client: reqwest::Client },
}

pub struct LawPageSource {
    name: String,
    url: String,
    mode: Mode,
}

impl LawPageSource {
    pub fn from_fixture_str(name: &str, url: &str, html: &str) -> Self {
        Self {
            name: name.to_string(),
            url: url.to_string(),
            mode: Mode::Fixture(html.to_string()),
        }
    }

    pub fn from_url(name: &str, url: &str, client: reqwest::Client) -> Self {
        Self {
            name: name.to_string(),
            url: url.to_string(),
            mode: Mode::Http { client },
        }
    }
}

#[async_trait]
impl DocumentSource for LawPageSource {
    async fn fetch_page(&self) -> Result<DocumentPage> {
        let html = match &self.mode {
            Mode::Fixture(html) => html.clone(),
            Mode::Http { client } => fetch::get_text(client, &self.url, fetch::DEFAULT_ATTEMPTS)
                .await
                .with_context(|| format!("fetching law page `{}`", self.name))?,
        };
        Ok(DocumentPage {
            name: self.name.clone(),
            url: self.url.clone(),
            text: strip_boilerplate(&html),
        })
    }

    fn name(&self) -> &str {
        &self.name
    }
}
