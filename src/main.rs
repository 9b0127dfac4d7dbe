// src/main.rs
//! Binary entrypoint. Two run modes:
//!
//!   lovsonar scan     fetch all sources, score new items, detect changes
//!   lovsonar report   render and send the digest for the report window
//!
//! `scan` also mails a same-day digest when the run produced anything, so a
//! cron-driven deployment only needs the one mode.

use anyhow::{bail, Context, Result};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use lovsonar::catalog::Catalog;
use lovsonar::change_detector::ChangeDetector;
use lovsonar::config::{AppConfig, SourcesConfig};
use lovsonar::fetch;
use lovsonar::ingest::providers::feed::FeedProvider;
use lovsonar::ingest::providers::lovdata::LawPageSource;
use lovsonar::ingest::providers::stortinget::StortingetProvider;
use lovsonar::ingest::types::{DocumentSource, SourceProvider};
use lovsonar::notify::EmailSender;
use lovsonar::pipeline;
use lovsonar::scoring::{Scorer, ScorerConfig};
use lovsonar::store::Store;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let mode = std::env::args().nth(1).unwrap_or_else(|| "scan".to_string());
    let cfg = AppConfig::from_env();
    let store = Store::open(&cfg.db_path)?;

    match mode.as_str() {
        "scan" => scan(&cfg, &store).await,
        "report" => report(&store, cfg.report_days).await,
        other => bail!("unknown mode `{other}`, expected `scan` or `report`"),
    }
}

async fn scan(cfg: &AppConfig, store: &Store) -> Result<()> {
    let sources = SourcesConfig::load_default()?;
    let catalog = Catalog::load_default()?;
    let scorer = Scorer::new(catalog, ScorerConfig::default().with_env_overrides());
    let detector = ChangeDetector::new(cfg.change_threshold);
    let client = fetch::client(cfg.http_timeout)?;

    let mut providers: Vec<Arc<dyn SourceProvider>> = Vec::new();
    for feed in &sources.feeds {
        providers.push(Arc::new(
            FeedProvider::from_url(&feed.name, &feed.url, client.clone())
                .hearing(feed.hearing)
                .max_items(feed.max_items),
        ));
    }
    if sources.stortinget.enabled {
        providers.push(Arc::new(StortingetProvider::from_client(client.clone())));
    }

    let documents: Vec<Arc<dyn DocumentSource>> = sources
        .documents
        .iter()
        .map(|d| {
            Arc::new(LawPageSource::from_url(&d.name, &d.url, client.clone()))
                as Arc<dyn DocumentSource>
        })
        .collect();

    let outcome =
        pipeline::run_scan(store, &scorer, &detector, providers, documents, cfg.retention_days)
            .await
            .context("scan failed")?;

    if outcome.relevance_hits > 0 || outcome.change_hits > 0 {
        report(store, 1).await?;
    } else {
        tracing::info!("nothing new this scan");
    }
    Ok(())
}

async fn report(store: &Store, days: i64) -> Result<()> {
    let report = pipeline::run_report(store, days)?;
    println!("{}", report.render_text());

    if report.is_empty() {
        return Ok(());
    }
    match EmailSender::from_env()? {
        Some(sender) => sender.send(&report).await?,
        None => tracing::info!("SMTP not configured, report printed only"),
    }
    Ok(())
}
