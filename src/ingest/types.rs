// src/ingest/types.rs
use anyhow::Result;

/// One news-like item handed to the relevance scorer.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize, PartialEq, Eq)]
pub struct SourceItem {
    pub source: String, // e.g. "Høringer", "Stortinget"
    pub title: String,
    pub link: String,
    pub summary: String,
    pub published_at: u64, // unix seconds, 0 when the feed omits it
}

impl SourceItem {
    /// The text blob the scorer evaluates.
    pub fn full_text(&self) -> String {
        if self.summary.is_empty() {
            self.title.clone()
        } else {
            format!("{} {}", self.title, self.summary)
        }
    }
}

#[async_trait::async_trait]
pub trait SourceProvider: Send + Sync {
    async fn fetch_latest(&self) -> Result<Vec<SourceItem>>;
    fn name(&self) -> &str;
    /// Hearing-type sources get a lower relevance bar in the scorer.
    fn is_hearing(&self) -> bool {
        false
    }
}

/// A monitored static document, fetched and boilerplate-stripped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentPage {
    pub name: String,
    pub url: String,
    pub text: String,
}

#[async_trait::async_trait]
pub trait DocumentSource: Send + Sync {
    async fn fetch_page(&self) -> Result<DocumentPage>;
    fn name(&self) -> &str;
}
