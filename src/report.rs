// src/report.rs
//! Digest rendering: plain-text and HTML versions of the same report, built
//! from the hits the store recorded. Document changes come first, then the
//! relevance hits grouped by priority.

use chrono::{DateTime, Utc};

use crate::scoring::Priority;
use crate::store::{ChangeHit, RelevanceHit};

#[derive(Debug)]
pub struct Report {
    pub generated_at: DateTime<Utc>,
    pub period_days: i64,
    pub changes: Vec<ChangeHit>,
    /// Sorted by priority, then score descending.
    pub hits: Vec<RelevanceHit>,
}

const PRIORITY_ORDER: [Priority; 4] = [
    Priority::Critical,
    Priority::High,
    Priority::Medium,
    Priority::Low,
];

impl Report {
    pub fn new(period_days: i64, changes: Vec<ChangeHit>, hits: Vec<RelevanceHit>) -> Self {
        Self {
            generated_at: Utc::now(),
            period_days,
            changes,
            hits,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty() && self.hits.is_empty()
    }

    pub fn subject(&self) -> String {
        let critical = self
            .hits
            .iter()
            .filter(|h| h.priority == Priority::Critical)
            .count();
        let prefix = if critical > 0 { "[KRITISK] " } else { "" };
        format!(
            "{prefix}LovSonar: {} regelverkstreff, {} dokumentendringer",
            self.hits.len(),
            self.changes.len()
        )
    }

    fn hits_for(&self, priority: Priority) -> impl Iterator<Item = &RelevanceHit> {
        self.hits.iter().filter(move |h| h.priority == priority)
    }

    pub fn render_text(&self) -> String {
        let mut out = String::new();
        out.push_str(&format!(
            "LovSonar-rapport {} (siste {} dager)\n",
            self.generated_at.format("%Y-%m-%d"),
            self.period_days
        ));
        out.push_str("==========================================\n\n");

        if self.is_empty() {
            out.push_str("Ingen treff i perioden.\n");
            return out;
        }

        if !self.changes.is_empty() {
            out.push_str("DOKUMENTENDRINGER\n-----------------\n");
            for c in &self.changes {
                out.push_str(&format!(
                    "* {} endret {:.2} % ({})\n  {}\n",
                    c.document_name,
                    c.change_percent,
                    c.detected_at.format("%Y-%m-%d"),
                    c.url
                ));
            }
            out.push('\n');
        }

        for priority in PRIORITY_ORDER {
            let mut any = false;
            for hit in self.hits_for(priority) {
                if !any {
                    out.push_str(&format!("{}\n-----------------\n", priority.label()));
                    any = true;
                }
                out.push_str(&format!(
                    "* [{}] {} (score {:.1})\n",
                    hit.source, hit.title, hit.score
                ));
                if let Some(frist) = &hit.deadline_text {
                    out.push_str(&format!("  Frist: {frist}\n"));
                }
                if !hit.matched_keywords.is_empty() {
                    out.push_str(&format!(
                        "  Nøkkelord: {}\n",
                        hit.matched_keywords.join(", ")
                    ));
                }
                if !hit.link.is_empty() {
                    out.push_str(&format!("  {}\n", hit.link));
                }
            }
            if any {
                out.push('\n');
            }
        }

        out
    }

    pub fn render_html(&self) -> String {
        let mut out = String::new();
        out.push_str("<html><body style=\"font-family: sans-serif;\">");
        out.push_str(&format!(
            "<h1>LovSonar-rapport {}</h1><p>Siste {} dager.</p>",
            self.generated_at.format("%Y-%m-%d"),
            self.period_days
        ));

        if self.is_empty() {
            out.push_str("<p>Ingen treff i perioden.</p></body></html>");
            return out;
        }

        if !self.changes.is_empty() {
            out.push_str("<h2>Dokumentendringer</h2><ul>");
            for c in &self.changes {
                out.push_str(&format!(
                    "<li><a href=\"{}\">{}</a> endret {:.2}&nbsp;% ({})</li>",
                    esc(&c.url),
                    esc(&c.document_name),
                    c.change_percent,
                    c.detected_at.format("%Y-%m-%d")
                ));
            }
            out.push_str("</ul>");
        }

        for priority in PRIORITY_ORDER {
            let mut any = false;
            for hit in self.hits_for(priority) {
                if !any {
                    let color = match priority {
                        Priority::Critical => "#c0392b",
                        Priority::High => "#d35400",
                        Priority::Medium => "#2c3e50",
                        Priority::Low => "#7f8c8d",
                    };
                    out.push_str(&format!(
                        "<h2 style=\"color: {color};\">{}</h2><ul>",
                        priority.label()
                    ));
                    any = true;
                }
                out.push_str("<li>");
                if hit.link.is_empty() {
                    out.push_str(&format!("<strong>{}</strong>", esc(&hit.title)));
                } else {
                    out.push_str(&format!(
                        "<a href=\"{}\"><strong>{}</strong></a>",
                        esc(&hit.link),
                        esc(&hit.title)
                    ));
                }
                out.push_str(&format!(" [{}] score {:.1}", esc(&hit.source), hit.score));
                if let Some(frist) = &hit.deadline_text {
                    out.push_str(&format!("<br/>Frist: {}", esc(frist)));
                }
                if !hit.matched_keywords.is_empty() {
                    out.push_str(&format!(
                        "<br/><small>Nøkkelord: {}</small>",
                        esc(&hit.matched_keywords.join(", "))
                    ));
                }
                out.push_str("</li>");
            }
            if any {
                out.push_str("</ul>");
            }
        }

        out.push_str("</body></html>");
        out
    }
}

fn esc(s: &str) -> String {
    html_escape::encode_text(s).to_string()
}
