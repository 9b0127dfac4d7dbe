// src/store.rs
//! SQLite-backed state: the dedup set of already-processed items, the
//! per-document snapshots for change detection, and the recorded hits the
//! reporting step reads.
//!
//! One connection, serialized writes. All writes are single-row idempotent
//! upserts, so there is no partial-write corruption to worry about. The
//! scorer and detector never touch SQL directly; everything goes through
//! this repository.

use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Duration, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;
use std::sync::Mutex;

use crate::scoring::Priority;

/// Last-observed state of a monitored document. At most one row per name;
/// overwritten on every check.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentSnapshot {
    pub name: String,
    pub content_hash: String,
    pub truncated_text: String,
    pub checked_at: DateTime<Utc>,
}

/// A relevance hit recorded for reporting.
#[derive(Debug, Clone)]
pub struct RelevanceHit {
    pub source: String,
    pub title: String,
    pub link: String,
    pub excerpt: String,
    pub score: f64,
    pub priority: Priority,
    pub deadline_text: Option<String>,
    pub matched_keywords: Vec<String>,
    pub detected_at: DateTime<Utc>,
}

/// A document-change hit recorded for reporting.
#[derive(Debug, Clone)]
pub struct ChangeHit {
    pub document_name: String,
    pub url: String,
    pub change_percent: f64,
    pub detected_at: DateTime<Utc>,
}

pub struct Store {
    conn: Mutex<Connection>,
}

impl Store {
    /// Open (and initialize) the database at `path`.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("creating db directory {}", parent.display()))?;
            }
        }
        let conn = Connection::open(path)
            .with_context(|| format!("opening sqlite db at {}", path.display()))?;
        conn.pragma_update(None, "journal_mode", "WAL")
            .context("enabling WAL mode")?;
        Self::from_connection(conn)
    }

    /// In-memory store for tests.
    pub fn open_in_memory() -> Result<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS seen_items (
                 item_id    TEXT PRIMARY KEY,
                 source     TEXT NOT NULL,
                 title      TEXT NOT NULL,
                 first_seen TEXT NOT NULL
             );
             CREATE TABLE IF NOT EXISTS document_snapshots (
                 name           TEXT PRIMARY KEY,
                 content_hash   TEXT NOT NULL,
                 truncated_text TEXT NOT NULL,
                 checked_at     TEXT NOT NULL
             );
             CREATE TABLE IF NOT EXISTS sonar_hits (
                 id               INTEGER PRIMARY KEY AUTOINCREMENT,
                 source           TEXT NOT NULL,
                 title            TEXT NOT NULL,
                 link             TEXT NOT NULL,
                 excerpt          TEXT NOT NULL,
                 score            REAL NOT NULL,
                 priority         INTEGER NOT NULL,
                 deadline_text    TEXT,
                 matched_keywords TEXT NOT NULL,
                 detected_at      TEXT NOT NULL
             );
             CREATE TABLE IF NOT EXISTS radar_hits (
                 id             INTEGER PRIMARY KEY AUTOINCREMENT,
                 document_name  TEXT NOT NULL,
                 url            TEXT NOT NULL,
                 change_percent REAL NOT NULL,
                 detected_at    TEXT NOT NULL
             );",
        )
        .context("initializing schema")?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| anyhow!("store mutex poisoned"))
    }

    /* ---------------- dedup ---------------- */

    pub fn is_seen(&self, item_id: &str) -> Result<bool> {
        let conn = self.lock()?;
        let found: Option<i64> = conn
            .query_row(
                "SELECT 1 FROM seen_items WHERE item_id = ?1",
                params![item_id],
                |row| row.get(0),
            )
            .optional()?;
        Ok(found.is_some())
    }

    /// Idempotent: inserting an existing id is a no-op, not an error.
    pub fn mark_seen(&self, item_id: &str, source: &str, title: &str) -> Result<()> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT OR IGNORE INTO seen_items (item_id, source, title, first_seen)
             VALUES (?1, ?2, ?3, ?4)",
            params![item_id, source, title, Utc::now().to_rfc3339()],
        )
        .context("marking item seen")?;
        Ok(())
    }

    /// Delete seen-records (and hits) older than the cutoff. Returns the
    /// number of seen-records removed.
    pub fn purge_older_than(&self, days: i64) -> Result<usize> {
        let cutoff = (Utc::now() - Duration::days(days)).to_rfc3339();
        let conn = self.lock()?;
        let seen = conn.execute(
            "DELETE FROM seen_items WHERE first_seen < ?1",
            params![cutoff],
        )?;
        let sonar = conn.execute(
            "DELETE FROM sonar_hits WHERE detected_at < ?1",
            params![cutoff],
        )?;
        let radar = conn.execute(
            "DELETE FROM radar_hits WHERE detected_at < ?1",
            params![cutoff],
        )?;
        tracing::debug!(seen, sonar, radar, days, "retention sweep");
        Ok(seen)
    }

    #[doc(hidden)]
    pub fn seen_count(&self) -> Result<usize> {
        let conn = self.lock()?;
        let n: i64 = conn.query_row("SELECT COUNT(*) FROM seen_items", [], |row| row.get(0))?;
        Ok(n as usize)
    }

    /* ---------------- snapshots ---------------- */

    pub fn load_snapshot(&self, name: &str) -> Result<Option<DocumentSnapshot>> {
        let conn = self.lock()?;
        let snap = conn
            .query_row(
                "SELECT name, content_hash, truncated_text, checked_at
                 FROM document_snapshots WHERE name = ?1",
                params![name],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, String>(3)?,
                    ))
                },
            )
            .optional()?;
        match snap {
            Some((name, content_hash, truncated_text, checked_at)) => Ok(Some(DocumentSnapshot {
                name,
                content_hash,
                truncated_text,
                checked_at: parse_datetime(&checked_at)?,
            })),
            None => Ok(None),
        }
    }

    pub fn save_snapshot(&self, snapshot: &DocumentSnapshot) -> Result<()> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT OR REPLACE INTO document_snapshots (name, content_hash, truncated_text, checked_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                snapshot.name,
                snapshot.content_hash,
                snapshot.truncated_text,
                snapshot.checked_at.to_rfc3339()
            ],
        )
        .context("saving document snapshot")?;
        Ok(())
    }

    /* ---------------- hits ---------------- */

    pub fn record_relevance_hit(&self, hit: &RelevanceHit) -> Result<()> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO sonar_hits
                 (source, title, link, excerpt, score, priority, deadline_text, matched_keywords, detected_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                hit.source,
                hit.title,
                hit.link,
                hit.excerpt,
                hit.score,
                hit.priority.as_i64(),
                hit.deadline_text,
                hit.matched_keywords.join(","),
                hit.detected_at.to_rfc3339()
            ],
        )
        .context("recording relevance hit")?;
        Ok(())
    }

    pub fn record_change_hit(&self, hit: &ChangeHit) -> Result<()> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO radar_hits (document_name, url, change_percent, detected_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                hit.document_name,
                hit.url,
                hit.change_percent,
                hit.detected_at.to_rfc3339()
            ],
        )
        .context("recording change hit")?;
        Ok(())
    }

    pub fn relevance_hits_since(&self, cutoff: DateTime<Utc>) -> Result<Vec<RelevanceHit>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT source, title, link, excerpt, score, priority, deadline_text, matched_keywords, detected_at
             FROM sonar_hits
             WHERE detected_at >= ?1
             ORDER BY priority ASC, score DESC",
        )?;
        let mut rows = stmt.query(params![cutoff.to_rfc3339()])?;
        let mut hits = Vec::new();
        while let Some(row) = rows.next()? {
            hits.push(row_to_relevance_hit(row)?);
        }
        Ok(hits)
    }

    pub fn change_hits_since(&self, cutoff: DateTime<Utc>) -> Result<Vec<ChangeHit>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT document_name, url, change_percent, detected_at
             FROM radar_hits
             WHERE detected_at >= ?1
             ORDER BY change_percent DESC",
        )?;
        let mut rows = stmt.query(params![cutoff.to_rfc3339()])?;
        let mut hits = Vec::new();
        while let Some(row) = rows.next()? {
            hits.push(ChangeHit {
                document_name: row.get(0)?,
                url: row.get(1)?,
                change_percent: row.get(2)?,
                detected_at: parse_datetime(&row.get::<_, String>(3)?)?,
            });
        }
        Ok(hits)
    }

    /// Test seam: backdate a seen-record so retention sweeps can be exercised
    /// without waiting for real time to pass.
    #[doc(hidden)]
    pub fn backdate_seen(&self, item_id: &str, first_seen: DateTime<Utc>) -> Result<()> {
        let conn = self.lock()?;
        conn.execute(
            "UPDATE seen_items SET first_seen = ?1 WHERE item_id = ?2",
            params![first_seen.to_rfc3339(), item_id],
        )?;
        Ok(())
    }
}

fn row_to_relevance_hit(row: &Row) -> Result<RelevanceHit> {
    let matched: String = row.get(7)?;
    Ok(RelevanceHit {
        source: row.get(0)?,
        title: row.get(1)?,
        link: row.get(2)?,
        excerpt: row.get(3)?,
        score: row.get(4)?,
        priority: Priority::from_i64(row.get(5)?),
        deadline_text: row.get(6)?,
        matched_keywords: if matched.is_empty() {
            Vec::new()
        } else {
            matched.split(',').map(str::to_string).collect()
        },
        detected_at: parse_datetime(&row.get::<_, String>(8)?)?,
    })
}

fn parse_datetime(value: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|err| anyhow!("invalid datetime '{value}': {err}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mark_seen_is_idempotent() {
        let store = Store::open_in_memory().unwrap();
        assert!(!store.is_seen("abc").unwrap());
        store.mark_seen("abc", "Test", "Tittel").unwrap();
        store.mark_seen("abc", "Test", "Tittel").unwrap();
        assert!(store.is_seen("abc").unwrap());
        assert_eq!(store.seen_count().unwrap(), 1);
    }

    #[test]
    fn snapshot_is_overwritten_not_accumulated() {
        let store = Store::open_in_memory().unwrap();
        let first = DocumentSnapshot {
            name: "Åpenhetsloven".into(),
            content_hash: "aaa".into(),
            truncated_text: "gammel tekst".into(),
            checked_at: Utc::now(),
        };
        store.save_snapshot(&first).unwrap();
        let second = DocumentSnapshot {
            content_hash: "bbb".into(),
            truncated_text: "ny tekst".into(),
            ..first.clone()
        };
        store.save_snapshot(&second).unwrap();
        let loaded = store.load_snapshot("Åpenhetsloven").unwrap().unwrap();
        assert_eq!(loaded.content_hash, "bbb");
        assert_eq!(loaded.truncated_text, "ny tekst");
    }

    #[test]
    fn purge_removes_only_old_records() {
        let store = Store::open_in_memory().unwrap();
        store.mark_seen("old", "Test", "Gammel").unwrap();
        store.mark_seen("fresh", "Test", "Ny").unwrap();
        store
            .backdate_seen("old", Utc::now() - Duration::days(200))
            .unwrap();

        let removed = store.purge_older_than(180).unwrap();
        assert_eq!(removed, 1);
        assert!(!store.is_seen("old").unwrap());
        assert!(store.is_seen("fresh").unwrap());
    }

    #[test]
    fn open_creates_parent_dirs_and_persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("state").join("lovsonar.db");
        {
            let store = Store::open(&path).unwrap();
            store.mark_seen("abc", "Test", "Tittel").unwrap();
        }
        assert!(path.exists());

        let reopened = Store::open(&path).unwrap();
        assert!(reopened.is_seen("abc").unwrap());
    }

    #[test]
    fn relevance_hit_roundtrip() {
        let store = Store::open_in_memory().unwrap();
        let hit = RelevanceHit {
            source: "Høringer".into(),
            title: "Ny forskrift om byggevare".into(),
            link: "https://example.no/sak".into(),
            excerpt: "Ny forskrift om byggevare: høringsfrist 15. mars 2026".into(),
            score: 9.0,
            priority: Priority::High,
            deadline_text: Some("høringsfrist 15. mars 2026".into()),
            matched_keywords: vec!["byggevare".into(), "høringsfrist".into()],
            detected_at: Utc::now(),
        };
        store.record_relevance_hit(&hit).unwrap();

        let hits = store
            .relevance_hits_since(Utc::now() - Duration::days(1))
            .unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].priority, Priority::High);
        assert_eq!(hits[0].matched_keywords.len(), 2);
        assert_eq!(hits[0].deadline_text.as_deref(), Some("høringsfrist 15. mars 2026"));
    }
}
