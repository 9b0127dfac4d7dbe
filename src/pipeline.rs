// src/pipeline.rs
//! Orchestration: fan out the configured sources, dedup and score what came
//! back, run the document change checks, and sweep old state.
//!
//! One source failing must never sink the run; failures are logged per source
//! and the scan only errors when every single source failed.

use anyhow::{bail, Result};
use chrono::{Duration, Utc};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use crate::change_detector::ChangeDetector;
use crate::ingest::types::{DocumentPage, DocumentSource, SourceItem, SourceProvider};
use crate::ingest::item_id;
use crate::report::Report;
use crate::scoring::Scorer;
use crate::store::{ChangeHit, RelevanceHit, Store};

/// Upper bound on simultaneous outbound fetches.
const MAX_CONCURRENT_FETCHES: usize = 6;

/// How much of an item's text ends up in the stored excerpt.
const EXCERPT_CHARS: usize = 300;

/// What one scan did, for logging and the caller's exit decision.
#[derive(Debug, Default, Clone, Copy)]
pub struct ScanOutcome {
    pub sources_ok: usize,
    pub sources_failed: usize,
    pub items_total: usize,
    pub items_new: usize,
    pub relevance_hits: usize,
    pub change_hits: usize,
    pub purged: usize,
}

struct FetchedBatch {
    source: String,
    hearing: bool,
    items: Vec<SourceItem>,
}

/// Run one full scan: fetch all sources and documents, score new items,
/// detect document drift, then apply retention.
pub async fn run_scan(
    store: &Store,
    scorer: &Scorer,
    detector: &ChangeDetector,
    providers: Vec<Arc<dyn SourceProvider>>,
    documents: Vec<Arc<dyn DocumentSource>>,
    retention_days: i64,
) -> Result<ScanOutcome> {
    let mut outcome = ScanOutcome::default();
    let total_sources = providers.len() + documents.len();
    let permits = Arc::new(Semaphore::new(MAX_CONCURRENT_FETCHES));

    let mut item_tasks: JoinSet<(String, bool, Result<Vec<SourceItem>>)> = JoinSet::new();
    for provider in providers {
        let permits = Arc::clone(&permits);
        item_tasks.spawn(async move {
            let _permit = permits.acquire_owned().await.ok();
            let name = provider.name().to_string();
            let hearing = provider.is_hearing();
            (name, hearing, provider.fetch_latest().await)
        });
    }

    let mut doc_tasks: JoinSet<(String, Result<DocumentPage>)> = JoinSet::new();
    for document in documents {
        let permits = Arc::clone(&permits);
        doc_tasks.spawn(async move {
            let _permit = permits.acquire_owned().await.ok();
            let name = document.name().to_string();
            (name, document.fetch_page().await)
        });
    }

    let mut batches = Vec::new();
    while let Some(joined) = item_tasks.join_next().await {
        let (source, hearing, fetched) = joined?;
        match fetched {
            Ok(items) => {
                tracing::info!(source = source.as_str(), count = items.len(), "fetched source");
                outcome.sources_ok += 1;
                batches.push(FetchedBatch {
                    source,
                    hearing,
                    items,
                });
            }
            Err(err) => {
                tracing::warn!(source = source.as_str(), error = %err, "source fetch failed");
                outcome.sources_failed += 1;
            }
        }
    }

    let mut pages = Vec::new();
    while let Some(joined) = doc_tasks.join_next().await {
        let (name, fetched) = joined?;
        match fetched {
            Ok(page) => {
                outcome.sources_ok += 1;
                pages.push(page);
            }
            Err(err) => {
                tracing::warn!(document = name.as_str(), error = %err, "document fetch failed");
                outcome.sources_failed += 1;
            }
        }
    }

    if total_sources > 0 && outcome.sources_ok == 0 {
        bail!("all {total_sources} sources failed");
    }

    for batch in batches {
        for item in batch.items {
            outcome.items_total += 1;
            let key = if item.link.is_empty() {
                &item.title
            } else {
                &item.link
            };
            let id = item_id(&batch.source, key, &item.title);
            if store.is_seen(&id)? {
                continue;
            }
            outcome.items_new += 1;

            let text = item.full_text();
            let scored = scorer.evaluate(&text, batch.hearing);
            if scored.is_relevant {
                outcome.relevance_hits += 1;
                tracing::info!(
                    source = batch.source.as_str(),
                    title = item.title.as_str(),
                    score = scored.score,
                    priority = scored.priority.label(),
                    "relevant item"
                );
                store.record_relevance_hit(&RelevanceHit {
                    source: batch.source.clone(),
                    title: item.title.clone(),
                    link: item.link.clone(),
                    excerpt: text.chars().take(EXCERPT_CHARS).collect(),
                    score: scored.score,
                    priority: scored.priority,
                    deadline_text: scored.deadline_text,
                    matched_keywords: scored.matched.into_iter().map(|m| m.term).collect(),
                    detected_at: Utc::now(),
                })?;
            }
            // Seen whether relevant or not; irrelevant items must not be
            // rescored on the next run.
            store.mark_seen(&id, &batch.source, &item.title)?;
        }
    }

    for page in pages {
        if let Some(change) = detector.check(store, &page.name, &page.text)? {
            outcome.change_hits += 1;
            store.record_change_hit(&ChangeHit {
                document_name: page.name.clone(),
                url: page.url.clone(),
                change_percent: change.change_percent,
                detected_at: Utc::now(),
            })?;
        }
    }

    outcome.purged = store.purge_older_than(retention_days)?;

    tracing::info!(
        sources_ok = outcome.sources_ok,
        sources_failed = outcome.sources_failed,
        items_new = outcome.items_new,
        relevance_hits = outcome.relevance_hits,
        change_hits = outcome.change_hits,
        purged = outcome.purged,
        "scan complete"
    );
    Ok(outcome)
}

/// Assemble a digest of everything recorded in the last `days` days.
pub fn run_report(store: &Store, days: i64) -> Result<Report> {
    let cutoff = Utc::now() - Duration::days(days);
    let hits = store.relevance_hits_since(cutoff)?;
    let changes = store.change_hits_since(cutoff)?;
    Ok(Report::new(days, changes, hits))
}
