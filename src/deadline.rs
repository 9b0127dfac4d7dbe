// src/deadline.rs
//! Deadline-phrase extraction from Norwegian regulatory text.
//!
//! Scans with an ordered list of date-phrase patterns ("høringsfrist 15. mars
//! 2026", "frist: 15.03.2026", "innen 1. juli 2026", "trer i kraft 1. januar
//! 2027"). The first pattern that matches wins. Month names go through a fixed
//! lookup table; an unknown month still yields the matched text, just without
//! a parsed date. No pattern match means no deadline, which is not an error.

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;

/// A deadline phrase found in text.
#[derive(Debug, Clone, PartialEq)]
pub struct Deadline {
    /// The full matched phrase, e.g. "høringsfrist 15. mars 2026".
    pub text: String,
    /// Parsed calendar date, when the day/month/year could be resolved.
    pub date: Option<NaiveDate>,
}

// Ordered: keyword + day + month name + year, then keyword + dd.mm.yyyy,
// then the softer "innen" / entry-into-force phrasings.
static MONTH_NAME_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"(?i)(?:høringsfrist|frist)[:\s]+(\d{1,2})\.?\s*([a-zA-ZæøåÆØÅ]+)\s+(\d{4})",
        r"(?i)innen\s+(\d{1,2})\.?\s*([a-zA-ZæøåÆØÅ]+)\s+(\d{4})",
        r"(?i)(?:trer i kraft|ikrafttredelse)[:\s]+(\d{1,2})\.?\s*([a-zA-ZæøåÆØÅ]+)\s+(\d{4})",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("deadline regex"))
    .collect()
});

static NUMERIC_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(?:høringsfrist|frist|deadline)[:\s]+(\d{1,2})\.(\d{1,2})\.(\d{4})")
        .expect("numeric deadline regex")
});

fn month_number(name: &str) -> Option<u32> {
    match name.to_lowercase().as_str() {
        "januar" => Some(1),
        "februar" => Some(2),
        "mars" => Some(3),
        "april" => Some(4),
        "mai" => Some(5),
        "juni" => Some(6),
        "juli" => Some(7),
        "august" => Some(8),
        "september" => Some(9),
        "oktober" => Some(10),
        "november" => Some(11),
        "desember" => Some(12),
        _ => None,
    }
}

/// Extract the first deadline phrase from `text`, if any.
pub fn extract_deadline(text: &str) -> Option<Deadline> {
    for re in MONTH_NAME_PATTERNS.iter() {
        if let Some(caps) = re.captures(text) {
            let day: u32 = caps[1].parse().ok()?;
            let year: i32 = caps[3].parse().ok()?;
            let date = month_number(&caps[2])
                .and_then(|month| NaiveDate::from_ymd_opt(year, month, day));
            return Some(Deadline {
                text: caps[0].to_string(),
                date,
            });
        }
    }

    if let Some(caps) = NUMERIC_PATTERN.captures(text) {
        let day: u32 = caps[1].parse().ok()?;
        let month: u32 = caps[2].parse().ok()?;
        let year: i32 = caps[3].parse().ok()?;
        return Some(Deadline {
            text: caps[0].to_string(),
            date: NaiveDate::from_ymd_opt(year, month, day),
        });
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_month_name_deadline() {
        let d = extract_deadline("Ny forskrift om byggevare: høringsfrist 15. mars 2026")
            .expect("deadline found");
        assert!(d.text.contains("15. mars 2026"));
        assert_eq!(d.date, NaiveDate::from_ymd_opt(2026, 3, 15));
    }

    #[test]
    fn extracts_numeric_deadline() {
        let d = extract_deadline("Frist: 01.07.2026 for innspill").expect("deadline found");
        assert_eq!(d.date, NaiveDate::from_ymd_opt(2026, 7, 1));
    }

    #[test]
    fn extracts_entry_into_force() {
        let d = extract_deadline("Forskriften trer i kraft 1. januar 2027")
            .expect("deadline found");
        assert_eq!(d.date, NaiveDate::from_ymd_opt(2027, 1, 1));
    }

    #[test]
    fn extracts_innen_phrase() {
        let d = extract_deadline("Innspill må sendes innen 30. september 2026").unwrap();
        assert_eq!(d.date, NaiveDate::from_ymd_opt(2026, 9, 30));
    }

    #[test]
    fn unknown_month_keeps_text_without_date() {
        let d = extract_deadline("høringsfrist 15. frimaire 2026").expect("phrase matched");
        assert!(d.date.is_none());
        assert!(d.text.contains("frimaire"));
    }

    #[test]
    fn no_pattern_no_deadline() {
        assert!(extract_deadline("Ingen datoer her.").is_none());
        assert!(extract_deadline("").is_none());
    }

    #[test]
    fn invalid_day_yields_no_date() {
        let d = extract_deadline("høringsfrist 31. februar 2026").unwrap();
        assert!(d.date.is_none());
    }
}
