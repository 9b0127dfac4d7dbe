// src/ingest/providers/feed.rs
//! Generic provider for the configured government news feeds.
//! Handles both RSS 2.0 (<rss><channel><item>) and Atom (<feed><entry>),
//! since the sources are split between the two.

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use quick_xml::de::from_str;
use serde::Deserialize;
use time::format_description::well_known::{Rfc2822, Rfc3339};
use time::{OffsetDateTime, UtcOffset};

use crate::fetch;
use crate::ingest::normalize_text;
use crate::ingest::types::{SourceItem, SourceProvider};

/* ---------------- RSS 2.0 ---------------- */

#[derive(Debug, Deserialize)]
struct Rss {
    channel: Channel,
}
#[derive(Debug, Deserialize)]
struct Channel {
    #[serde(rename = "item", default)]
    item: Vec<RssItem>,
}
#[derive(Debug, Deserialize)]
struct RssItem {
    title: Option<String>,
    link: Option<String>,
    #[serde(rename = "pubDate")]
    pub_date: Option<String>,
    description: Option<String>,
}

/* ---------------- Atom ---------------- */

#[derive(Debug, Deserialize)]
struct AtomFeed {
    #[serde(rename = "entry", default)]
    entry: Vec<AtomEntry>,
}
#[derive(Debug, Deserialize)]
struct AtomEntry {
    title: Option<String>,
    #[serde(rename = "link", default)]
    link: Vec<AtomLink>,
    updated: Option<String>,
    summary: Option<String>,
}
#[derive(Debug, Deserialize)]
struct AtomLink {
    #[serde(rename = "@href")]
    href: Option<String>,
}

fn parse_rfc2822_to_unix(ts: &str) -> u64 {
    OffsetDateTime::parse(ts, &Rfc2822)
        .ok()
        .map(|dt| dt.to_offset(UtcOffset::UTC).unix_timestamp())
        .and_then(|x| u64::try_from(x).ok())
        .unwrap_or(0)
}

fn parse_rfc3339_to_unix(ts: &str) -> u64 {
    OffsetDateTime::parse(ts, &Rfc3339)
        .ok()
        .map(|dt| dt.to_offset(UtcOffset::UTC).unix_timestamp())
        .and_then(|x| u64::try_from(x).ok())
        .unwrap_or(0)
}

enum Mode {
    Fixture(String),
    Http { url: String, client: reqwest::Client },
}

pub struct FeedProvider {
    name: String,
    hearing: bool,
    max_items: usize,
    mode: Mode,
}

impl FeedProvider {
    pub fn from_fixture_str(name: &str, xml: &str) -> Self {
        Self {
            name: name.to_string(),
            hearing: false,
            max_items: 15,
            mode: Mode::Fixture(xml.to_string()),
        }
    }

    pub fn from_url(name: &str, url: &str, client: reqwest::Client) -> Self {
        Self {
            name: name.to_string(),
            hearing: false,
            max_items: 15,
            mode: Mode::Http {
                url: url.to_string(),
                client,
            },
        }
    }

    pub fn hearing(mut self, hearing: bool) -> Self {
        self.hearing = hearing;
        self
    }

    pub fn max_items(mut self, max_items: usize) -> Self {
        self.max_items = max_items.max(1);
        self
    }

    fn parse_items(&self, xml: &str) -> Result<Vec<SourceItem>> {
        let xml_clean = scrub_html_entities_for_xml(xml);

        // RSS 2.0 first; fall back to Atom when the channel yields nothing.
        let mut out = match from_str::<Rss>(&xml_clean) {
            Ok(rss) => self.rss_items(rss),
            Err(_) => Vec::new(),
        };
        if out.is_empty() {
            let feed: AtomFeed = match from_str(&xml_clean) {
                Ok(feed) => feed,
                Err(e) => bail!("feed `{}` is neither RSS 2.0 nor Atom: {e}", self.name),
            };
            out = self.atom_items(feed);
        }

        out.truncate(self.max_items);
        Ok(out)
    }

    fn rss_items(&self, rss: Rss) -> Vec<SourceItem> {
        let mut out = Vec::with_capacity(rss.channel.item.len());
        for it in rss.channel.item {
            let title = normalize_text(it.title.as_deref().unwrap_or_default());
            let summary = normalize_text(it.description.as_deref().unwrap_or_default());
            let link = it.link.unwrap_or_default();
            if title.is_empty() && summary.is_empty() {
                continue;
            }
            out.push(SourceItem {
                source: self.name.clone(),
                title,
                link,
                summary,
                published_at: it
                    .pub_date
                    .as_deref()
                    .map(parse_rfc2822_to_unix)
                    .unwrap_or(0),
            });
        }
        out
    }

    fn atom_items(&self, feed: AtomFeed) -> Vec<SourceItem> {
        let mut out = Vec::with_capacity(feed.entry.len());
        for it in feed.entry {
            let title = normalize_text(it.title.as_deref().unwrap_or_default());
            let summary = normalize_text(it.summary.as_deref().unwrap_or_default());
            let link = it
                .link
                .into_iter()
                .find_map(|l| l.href)
                .unwrap_or_default();
            if title.is_empty() && summary.is_empty() {
                continue;
            }
            out.push(SourceItem {
                source: self.name.clone(),
                title,
                link,
                summary,
                published_at: it
                    .updated
                    .as_deref()
                    .map(parse_rfc3339_to_unix)
                    .unwrap_or(0),
            });
        }
        out
    }
}

#[async_trait]
impl SourceProvider for FeedProvider {
    async fn fetch_latest(&self) -> Result<Vec<SourceItem>> {
        match &self.mode {
            Mode::Fixture(xml) => self.parse_items(xml),
            Mode::Http { url, client } => {
                let body = fetch::get_text(client, url, fetch::DEFAULT_ATTEMPTS)
                    .await
                    .with_context(|| format!("fetching feed `{}`", self.name))?;
                self.parse_items(&body)
            }
        }
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn is_hearing(&self) -> bool {
        self.hearing
    }
}

// Government feeds embed named HTML entities the XML parser rejects; map the
// ones seen in practice to plain characters before deserializing.
fn scrub_html_entities_for_xml(s: &str) -> String {
    s.replace("&nbsp;", " ")
        .replace("&ndash;", "-")
        .replace("&mdash;", "-")
        .replace("&ldquo;", "\"")
        .replace("&rdquo;", "\"")
        .replace("&lsquo;", "'")
        .replace("&rsquo;", "'")
}
