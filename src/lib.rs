// src/lib.rs
// Public library surface for integration tests (and potential reuse).

pub mod catalog;
pub mod change_detector;
pub mod config;
pub mod deadline;
pub mod fetch;
pub mod pipeline;
pub mod report;
pub mod scoring;
pub mod store;

// Ingestion adapters (RSS feeds, Stortinget API, Lovdata pages)
pub mod ingest;

// Notifications
pub mod notify;

// ---- Re-exports for stable public API ----
pub use crate::catalog::{Catalog, Keyword};
pub use crate::change_detector::{ChangeDetector, ChangeResult};
pub use crate::scoring::{Priority, ScoredItem, Scorer, ScorerConfig};
pub use crate::store::Store;
