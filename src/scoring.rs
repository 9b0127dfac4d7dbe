// src/scoring.rs
//! Relevance scoring: combines catalog matches into a score, a priority tier,
//! and an extracted deadline for one text blob.
//!
//! Pure over (text, catalog, config, clock) - no side effects, never fails.
//! Malformed or empty text degrades to "not relevant".

use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::catalog::{Catalog, Group};
use crate::deadline::{extract_deadline, Deadline};

/// Urgency tier driving how a hit is reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Priority {
    Critical,
    High,
    Medium,
    Low,
}

impl Priority {
    /// Stable integer encoding used in the store (1 = most urgent).
    pub fn as_i64(self) -> i64 {
        match self {
            Priority::Critical => 1,
            Priority::High => 2,
            Priority::Medium => 3,
            Priority::Low => 4,
        }
    }

    pub fn from_i64(v: i64) -> Priority {
        match v {
            1 => Priority::Critical,
            2 => Priority::High,
            3 => Priority::Medium,
            _ => Priority::Low,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Priority::Critical => "KRITISK",
            Priority::High => "HØY",
            Priority::Medium => "MEDIUM",
            Priority::Low => "LAV",
        }
    }
}

/// One matched catalog keyword, with enough context for reporting.
#[derive(Debug, Clone, PartialEq)]
pub struct KeywordMatch {
    pub term: String,
    pub weight: f64,
    pub group: Group,
    pub category: String,
}

/// Result of evaluating one text item.
#[derive(Debug, Clone)]
pub struct ScoredItem {
    pub score: f64,
    pub is_relevant: bool,
    pub priority: Priority,
    pub matched: Vec<KeywordMatch>,
    pub deadline: Option<NaiveDate>,
    pub deadline_text: Option<String>,
}

impl ScoredItem {
    fn not_relevant() -> Self {
        Self {
            score: 0.0,
            is_relevant: false,
            priority: Priority::Low,
            matched: Vec::new(),
            deadline: None,
            deadline_text: None,
        }
    }
}

/// Thresholds and multipliers. Deployment-tuned configuration, not law:
/// the historical script versions disagreed on exact constants, so all of
/// them are adjustable here.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct ScorerConfig {
    /// Minimum combined score for relevance.
    pub min_score: f64,
    /// A single keyword at or above this weight makes the item relevant alone.
    pub strong_signal: f64,
    /// Hearing-type documents pass with this much topic score; procedural
    /// urgency substitutes for topical strength.
    pub hearing_topic_min: f64,
    /// Score tier cutoffs.
    pub score_critical: f64,
    pub score_high: f64,
    pub score_medium: f64,
    /// Group multipliers.
    pub segment_multiplier: f64,
    pub topic_multiplier: f64,
    pub critical_multiplier: f64,
    /// A deadline within this many days of "now" escalates to CRITICAL.
    pub deadline_window_days: i64,
}

impl Default for ScorerConfig {
    fn default() -> Self {
        Self {
            min_score: 3.0,
            strong_signal: 2.5,
            hearing_topic_min: 1.5,
            score_critical: 10.0,
            score_high: 6.0,
            score_medium: 4.0,
            segment_multiplier: 1.5,
            topic_multiplier: 1.0,
            critical_multiplier: 2.0,
            deadline_window_days: 30,
        }
    }
}

pub const ENV_MIN_SCORE: &str = "LOVSONAR_MIN_SCORE";

impl ScorerConfig {
    /// Apply env overrides (currently the minimum relevance score).
    pub fn with_env_overrides(mut self) -> Self {
        if let Some(v) = std::env::var(ENV_MIN_SCORE)
            .ok()
            .and_then(|s| s.trim().parse::<f64>().ok())
        {
            self.min_score = v.max(0.0);
        }
        self
    }
}

/// The relevance scorer. Owns its catalog; constructed once at startup.
#[derive(Debug)]
pub struct Scorer {
    catalog: Catalog,
    cfg: ScorerConfig,
}

impl Scorer {
    pub fn new(catalog: Catalog, cfg: ScorerConfig) -> Self {
        Self { catalog, cfg }
    }

    pub fn config(&self) -> &ScorerConfig {
        &self.cfg
    }

    /// Evaluate `text` against the catalog. `hearing` marks hearing-type
    /// sources, which get a lower relevance bar.
    pub fn evaluate(&self, text: &str, hearing: bool) -> ScoredItem {
        self.evaluate_at(text, hearing, Utc::now().date_naive())
    }

    /// Same as [`evaluate`](Self::evaluate) with an explicit "today" so the
    /// deadline window is testable.
    pub fn evaluate_at(&self, text: &str, hearing: bool, today: NaiveDate) -> ScoredItem {
        if text.trim().is_empty() {
            return ScoredItem::not_relevant();
        }

        let lowered = text.to_lowercase();

        let (segment_matches, segment_sum) = self.match_group(Group::Segment, &lowered);
        let (topic_matches, topic_sum) = self.match_group(Group::Topic, &lowered);
        let (critical_matches, critical_sum) = self.match_group(Group::Critical, &lowered);

        let score = segment_sum * self.cfg.segment_multiplier
            + topic_sum * self.cfg.topic_multiplier
            + critical_sum * self.cfg.critical_multiplier;

        let strong_signal = topic_matches
            .iter()
            .chain(critical_matches.iter())
            .any(|m| m.weight >= self.cfg.strong_signal);

        let is_relevant = score >= self.cfg.min_score
            || strong_signal
            || (hearing && topic_sum >= self.cfg.hearing_topic_min);

        let mut matched = segment_matches;
        matched.extend(topic_matches);
        matched.extend(critical_matches);

        let deadline = extract_deadline(text);
        let (deadline_date, deadline_text) = match deadline {
            Some(Deadline { text, date }) => (date, Some(text)),
            None => (None, None),
        };

        let priority = if is_relevant {
            self.priority_for(score, deadline_date, today)
        } else {
            Priority::Low
        };

        tracing::debug!(
            target: "scoring",
            score,
            relevant = is_relevant,
            matches = matched.len(),
            deadline = ?deadline_date,
            "evaluated item"
        );

        ScoredItem {
            score,
            is_relevant,
            priority,
            matched,
            deadline: deadline_date,
            deadline_text,
        }
    }

    fn match_group(&self, group: Group, lowered: &str) -> (Vec<KeywordMatch>, f64) {
        let mut matches = Vec::new();
        let mut sum = 0.0;
        for ck in self.catalog.group(group) {
            if ck.is_match(lowered) {
                sum += ck.keyword.weight;
                matches.push(KeywordMatch {
                    term: ck.keyword.term.clone(),
                    weight: ck.keyword.weight,
                    group,
                    category: ck.keyword.category.clone(),
                });
            }
        }
        (matches, sum)
    }

    /// Ordered, first match wins: near-term deadline or a top score gives
    /// CRITICAL, then the HIGH/MEDIUM score tiers.
    fn priority_for(&self, score: f64, deadline: Option<NaiveDate>, today: NaiveDate) -> Priority {
        let near_deadline = deadline.is_some_and(|d| {
            let days = (d - today).num_days();
            (0..=self.cfg.deadline_window_days).contains(&days)
        });

        if near_deadline || score >= self.cfg.score_critical {
            Priority::Critical
        } else if score >= self.cfg.score_high {
            Priority::High
        } else if score >= self.cfg.score_medium {
            Priority::Medium
        } else {
            Priority::Low
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Catalog;

    const TEST_TOML: &str = r#"
[[segment]]
term = "byggevare"
weight = 2.0
category = "core"

[[segment]]
term = "trelast"
weight = 1.5
category = "core"

[[topic]]
term = "pfas"
weight = 2.5
category = "chemicals"
word_boundary = true

[[topic]]
term = "emballasje"
weight = 2.0
category = "packaging"

[[topic]]
term = "bærekraft"
weight = 1.5
category = "sustainability"

[[critical]]
term = "høringsfrist"
weight = 3.0
category = "deadline"
"#;

    fn scorer() -> Scorer {
        let catalog = Catalog::from_toml_str(TEST_TOML).expect("test catalog");
        Scorer::new(catalog, ScorerConfig::default())
    }

    #[test]
    fn empty_text_is_not_relevant() {
        let s = scorer();
        let r = s.evaluate("", false);
        assert_eq!(r.score, 0.0);
        assert!(!r.is_relevant);
        assert!(r.matched.is_empty());
    }

    #[test]
    fn unmatched_text_is_not_relevant() {
        let s = scorer();
        let r = s.evaluate("Statsbudsjettet legges frem i oktober.", false);
        assert!(!r.is_relevant);
        assert_eq!(r.priority, Priority::Low);
    }

    #[test]
    fn group_multipliers_apply() {
        let s = scorer();
        // byggevare (2.0 segment * 1.5) + emballasje (2.0 topic * 1.0) = 5.0
        let r = s.evaluate("Nye krav til emballasje for byggevarer", false);
        assert!(r.is_relevant);
        assert!((r.score - 5.0).abs() < 1e-9, "score was {}", r.score);
        assert_eq!(r.priority, Priority::Medium);
    }

    #[test]
    fn strong_signal_alone_is_relevant() {
        let s = scorer();
        // pfas weight 2.5 >= strong_signal, even though total 2.5 < min_score 3.0
        let r = s.evaluate("PFAS i produkter vurderes", false);
        assert!(r.is_relevant);
        assert!(r.score < s.config().min_score);
    }

    #[test]
    fn hearing_gets_lower_bar() {
        let s = scorer();
        // bærekraft alone: topic 1.5, total 1.5 < min_score, no strong signal
        let text = "Høring om bærekraft i offentlige anskaffelser";
        let normal = s.evaluate(text, false);
        let hearing = s.evaluate(text, true);
        assert!(!normal.is_relevant);
        assert!(hearing.is_relevant);
    }

    #[test]
    fn score_is_monotone_in_added_keywords() {
        let s = scorer();
        let base = s.evaluate("Nye regler for trelast", false);
        let more = s.evaluate("Nye regler for trelast og emballasje", false);
        let most = s.evaluate("Nye regler for trelast og emballasje, høringsfrist snart", false);
        assert!(more.score >= base.score);
        assert!(most.score >= more.score);
    }

    #[test]
    fn near_deadline_escalates_to_critical() {
        let s = scorer();
        let today = NaiveDate::from_ymd_opt(2026, 3, 1).unwrap();
        let text = "Ny forskrift om byggevare: høringsfrist 15. mars 2026";
        let r = s.evaluate_at(text, false, today);
        assert!(r.is_relevant);
        assert_eq!(r.priority, Priority::Critical);
        assert_eq!(r.deadline, NaiveDate::from_ymd_opt(2026, 3, 15));
    }

    #[test]
    fn far_deadline_falls_back_to_score_tier() {
        let s = scorer();
        let today = NaiveDate::from_ymd_opt(2025, 11, 1).unwrap();
        // byggevare 2.0*1.5 + høringsfrist 3.0*2.0 = 9.0 -> HIGH
        let text = "Ny forskrift om byggevare: høringsfrist 15. mars 2026";
        let r = s.evaluate_at(text, false, today);
        assert_eq!(r.priority, Priority::High);
        assert!((r.score - 9.0).abs() < 1e-9);
    }

    #[test]
    fn past_deadline_is_not_near_term() {
        let s = scorer();
        let today = NaiveDate::from_ymd_opt(2026, 4, 1).unwrap();
        let text = "Ny forskrift om byggevare: høringsfrist 15. mars 2026";
        let r = s.evaluate_at(text, false, today);
        assert_ne!(r.priority, Priority::Critical);
    }

    #[test]
    fn critical_implies_deadline_or_top_score() {
        let s = scorer();
        let today = NaiveDate::from_ymd_opt(2026, 1, 1).unwrap();
        let samples = [
            "Ny forskrift om byggevare: høringsfrist 15. januar 2026",
            "PFAS og emballasje i byggevarehandel, høringsfrist 1. juni 2026",
            "Trelast og bærekraft",
            "",
        ];
        for text in samples {
            let r = s.evaluate_at(text, false, today);
            if r.priority == Priority::Critical {
                let near = r.deadline.is_some_and(|d| (d - today).num_days() <= 30);
                assert!(
                    near || r.score >= s.config().score_critical,
                    "CRITICAL without near deadline or top score: {text:?}"
                );
            }
        }
    }

    #[test]
    fn priority_roundtrips_through_integer_encoding() {
        for p in [
            Priority::Critical,
            Priority::High,
            Priority::Medium,
            Priority::Low,
        ] {
            assert_eq!(Priority::from_i64(p.as_i64()), p);
        }
    }
}
