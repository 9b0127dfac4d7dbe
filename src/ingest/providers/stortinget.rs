// src/ingest/providers/stortinget.rs
//! Stortinget open-data provider: the `saker` JSON export for the current
//! parliamentary session. Committee names are appended to the scored text,
//! since they often carry the only topical signal in short case titles.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{Datelike, Utc};
use serde::Deserialize;

use crate::fetch;
use crate::ingest::normalize_text;
use crate::ingest::types::{SourceItem, SourceProvider};

const EXPORT_URL: &str = "https://data.stortinget.no/eksport/saker";
const CASE_URL: &str = "https://www.stortinget.no/no/Saker-og-publikasjoner/Saker/Sak/?p=";

#[derive(Debug, Deserialize)]
struct SakerResponse {
    #[serde(default)]
    saker_liste: Vec<Sak>,
}

#[derive(Debug, Deserialize)]
struct Sak {
    id: i64,
    #[serde(default)]
    tittel: String,
    #[serde(default)]
    henvisning: Option<String>,
    #[serde(default)]
    komite: Option<Komite>,
}

#[derive(Debug, Deserialize)]
struct Komite {
    #[serde(default)]
    navn: String,
}

/// Parliamentary sessions run October through September.
pub fn current_session(now: chrono::DateTime<Utc>) -> String {
    let year = now.year();
    if now.month() >= 10 {
        format!("{}-{}", year, year + 1)
    } else {
        format!("{}-{}", year - 1, year)
    }
}

enum Mode {
    Fixture(String),
    Http { client: reqwest::Client },
}

pub struct StortingetProvider {
    mode: Mode,
    max_items: usize,
}

impl StortingetProvider {
    pub fn from_fixture_str(json: &str) -> Self {
        Self {
            mode: Mode::Fixture(json.to_string()),
            max_items: 100,
        }
    }

    pub fn from_client(client: reqwest::Client) -> Self {
        Self {
            mode: Mode::Http { client },
            max_items: 100,
        }
    }

    fn parse_items(&self, json: &str) -> Result<Vec<SourceItem>> {
        let resp: SakerResponse =
            serde_json::from_str(json).context("parsing stortinget saker json")?;

        let mut out = Vec::new();
        for sak in resp.saker_liste.into_iter().take(self.max_items) {
            let title = normalize_text(&sak.tittel);
            if title.is_empty() {
                continue;
            }
            let committee = sak.komite.map(|k| k.navn).unwrap_or_default();
            let summary = normalize_text(&match sak.henvisning {
                Some(h) if !h.is_empty() => format!("{committee} {h}"),
                _ => committee,
            });
            out.push(SourceItem {
                source: "Stortinget".to_string(),
                title,
                link: format!("{CASE_URL}{}", sak.id),
                summary,
                published_at: 0,
            });
        }
        Ok(out)
    }
}

#[async_trait]
impl SourceProvider for StortingetProvider {
    async fn fetch_latest(&self) -> Result<Vec<SourceItem>> {
        match &self.mode {
            Mode::Fixture(json) => self.parse_items(json),
            Mode::Http { client } => {
                let session = current_session(Utc::now());
                let url = format!("{EXPORT_URL}?sesjonid={session}&format=json");
                let body = fetch::get_text(client, &url, fetch::DEFAULT_ATTEMPTS)
                    .await
                    .context("fetching stortinget saker")?;
                self.parse_items(&body)
            }
        }
    }

    fn name(&self) -> &str {
        "Stortinget"
    }
}
