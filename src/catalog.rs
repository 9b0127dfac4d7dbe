// src/catalog.rs
//! Weighted keyword catalog: the static vocabulary the scorer matches against,
//! partitioned into named groups (segment / topic / critical).
//!
//! Loaded once at startup from TOML and immutable thereafter. The catalog is
//! passed into the scorer explicitly, never referenced as global state, so
//! tests can run in parallel with different vocabularies.

use anyhow::{Context, Result};
use regex::Regex;
use serde::Deserialize;
use std::fs;
use std::path::Path;

pub const DEFAULT_KEYWORDS_PATH: &str = "config/keywords.toml";
pub const ENV_KEYWORDS_PATH: &str = "LOVSONAR_KEYWORDS_PATH";

/// Default vocabulary compiled into the binary; used when no file is present.
const BUILTIN_KEYWORDS: &str = include_str!("../config/keywords.toml");

/// The three keyword groups the scorer weighs differently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Group {
    /// Domain-identifying terms (is this about our industry at all?)
    Segment,
    /// Subject-matter terms (EU regulations, sustainability, chemicals, ...)
    Topic,
    /// Deadline / legal-action terms (hearing deadlines, entry into force)
    Critical,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct Keyword {
    pub term: String,
    pub weight: f64,
    pub category: String,
    /// Require token-boundary matching. Set for short/ambiguous terms like
    /// "dpp" or "epd" that would otherwise match inside unrelated words.
    /// Compound multi-word terms don't need it.
    #[serde(default)]
    pub word_boundary: bool,
}

/// A keyword with its matcher precompiled at load time.
#[derive(Debug)]
pub struct CompiledKeyword {
    pub keyword: Keyword,
    term_lower: String,
    boundary_re: Option<Regex>,
}

impl CompiledKeyword {
    fn compile(keyword: Keyword) -> Result<Self> {
        let term_lower = keyword.term.to_lowercase();
        let boundary_re = if keyword.word_boundary {
            let pattern = format!(r"\b{}\b", regex::escape(&term_lower));
            Some(
                Regex::new(&pattern)
                    .with_context(|| format!("keyword `{}` boundary regex", keyword.term))?,
            )
        } else {
            None
        };
        Ok(Self {
            keyword,
            term_lower,
            boundary_re,
        })
    }

    /// Match against already-lowercased text.
    pub fn is_match(&self, text_lower: &str) -> bool {
        match &self.boundary_re {
            Some(re) => re.is_match(text_lower),
            None => text_lower.contains(&self.term_lower),
        }
    }
}

/* ----------------------------
TOML schema
---------------------------- */

#[derive(Debug, Deserialize)]
struct CatalogRoot {
    #[serde(default)]
    segment: Vec<Keyword>,
    #[serde(default)]
    topic: Vec<Keyword>,
    #[serde(default)]
    critical: Vec<Keyword>,
}

/// Immutable, compiled keyword catalog.
#[derive(Debug)]
pub struct Catalog {
    segment: Vec<CompiledKeyword>,
    topic: Vec<CompiledKeyword>,
    critical: Vec<CompiledKeyword>,
}

impl Catalog {
    /// Load from TOML: `$LOVSONAR_KEYWORDS_PATH`, else `config/keywords.toml`,
    /// else the built-in default vocabulary.
    pub fn load_default() -> Result<Self> {
        if let Ok(p) = std::env::var(ENV_KEYWORDS_PATH) {
            return Self::from_path(Path::new(&p));
        }
        let default = Path::new(DEFAULT_KEYWORDS_PATH);
        if default.exists() {
            return Self::from_path(default);
        }
        Self::from_toml_str(BUILTIN_KEYWORDS)
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading keyword catalog from {}", path.display()))?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(toml_str: &str) -> Result<Self> {
        let root: CatalogRoot = toml::from_str(toml_str).context("parsing keyword catalog")?;
        Ok(Self {
            segment: compile_group(root.segment)?,
            topic: compile_group(root.topic)?,
            critical: compile_group(root.critical)?,
        })
    }

    pub fn group(&self, group: Group) -> &[CompiledKeyword] {
        match group {
            Group::Segment => &self.segment,
            Group::Topic => &self.topic,
            Group::Critical => &self.critical,
        }
    }

    /// All keywords across groups, in group order.
    pub fn all(&self) -> impl Iterator<Item = &CompiledKeyword> {
        self.segment
            .iter()
            .chain(self.topic.iter())
            .chain(self.critical.iter())
    }

    pub fn len(&self) -> usize {
        self.segment.len() + self.topic.len() + self.critical.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn compile_group(keywords: Vec<Keyword>) -> Result<Vec<CompiledKeyword>> {
    keywords.into_iter().map(CompiledKeyword::compile).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEST_TOML: &str = r#"
[[segment]]
term = "byggevare"
weight = 2.0
category = "core"

[[topic]]
term = "dpp"
weight = 2.5
category = "digital"
word_boundary = true

[[topic]]
term = "digitalt produktpass"
weight = 3.0
category = "digital"

[[critical]]
term = "høringsfrist"
weight = 3.0
category = "deadline"
"#;

    #[test]
    fn parses_groups() {
        let cat = Catalog::from_toml_str(TEST_TOML).expect("load test catalog");
        assert_eq!(cat.group(Group::Segment).len(), 1);
        assert_eq!(cat.group(Group::Topic).len(), 2);
        assert_eq!(cat.group(Group::Critical).len(), 1);
        assert_eq!(cat.len(), 4);
    }

    #[test]
    fn substring_match_is_case_insensitive_via_lowered_input() {
        let cat = Catalog::from_toml_str(TEST_TOML).unwrap();
        let kw = &cat.group(Group::Segment)[0];
        assert!(kw.is_match("ny forskrift om byggevarer"));
        assert!(!kw.is_match("ny forskrift om trelast"));
    }

    #[test]
    fn boundary_keyword_does_not_match_inside_words() {
        let cat = Catalog::from_toml_str(TEST_TOML).unwrap();
        let dpp = cat
            .group(Group::Topic)
            .iter()
            .find(|k| k.keyword.term == "dpp")
            .unwrap();
        assert!(dpp.is_match("krav om dpp for byggevarer"));
        // "dpp" embedded in another token must not count
        assert!(!dpp.is_match("oppdppost"));
    }

    #[test]
    fn multiword_terms_match_as_substring() {
        let cat = Catalog::from_toml_str(TEST_TOML).unwrap();
        let dp = cat
            .group(Group::Topic)
            .iter()
            .find(|k| k.keyword.term == "digitalt produktpass")
            .unwrap();
        assert!(dp.is_match("innfører digitalt produktpass i 2027"));
    }

    #[test]
    fn builtin_catalog_compiles() {
        let cat = Catalog::from_toml_str(BUILTIN_KEYWORDS).expect("builtin catalog");
        assert!(!cat.is_empty());
        assert!(cat.group(Group::Critical).iter().any(|k| k.keyword.term == "høringsfrist"));
    }
}
