//! Vertical lexicon: an ordered table of vertical name to trigger keywords.
//!
//! Keywords are compiled once into case-insensitive, word-bounded patterns so
//! classification never re-parses a regex.

use crate::error::{CrawlError, Result};
use regex::{Regex, RegexBuilder};
use std::fs;
use std::path::Path;

const GOVERNANCE: &[&str] = &[
    "governance", "policy", "capacity building", "municipal", "m&e", "fiscal",
    "monitoring and evaluation", "social audits", "fundraising", "management",
    "consulting", "consultant", "consultancy", "administration", "public",
    "government", "capacity", "impact", "evaluation", "dashboard", "data",
    "knowledge", "technology", "tool", "framework", "strategy", "csr",
    "philanthropy", "business", "entrepreneurship", "entrepreneurs", "shg",
];

const LEARNING: &[&str] = &[
    "education", "skill", "skills", "training", "life skills", "tvet", "student",
    "learning", "teaching", "development", "curriculum", "schools", "colleges",
    "educational", "ai", "skilling",
];

const SAFETY: &[&str] = &[
    "gender", "safety", "equity", "mobility", "transport", "sexual", "health",
    "public health", "security", "protection", "wellbeing", "wellness", "child",
    "children", "lgbtq", "queer", "women", "wash", "hygiene", "empowerment",
];

const CLIMATE: &[&str] = &[
    "climate", "resilience", "environment", "disaster", "sustainability", "green",
    "ecology", "conservation", "renewable", "pollution", "energy", "waste", "flood",
    "heat", "green buildings",
];

#[derive(Debug, Clone)]
pub struct Vertical {
    pub name: String,
    pub keywords: Vec<String>,
    patterns: Vec<Regex>,
}

impl Vertical {
    pub fn new(name: impl Into<String>, keywords: Vec<String>) -> Result<Self> {
        let name = name.into();
        let keywords: Vec<String> = keywords
            .into_iter()
            .map(|k| k.trim().to_lowercase())
            .filter(|k| !k.is_empty())
            .collect();

        let patterns = keywords
            .iter()
            .map(|k| {
                RegexBuilder::new(&format!(r"\b{}\b", regex::escape(k)))
                    .case_insensitive(true)
                    .build()
                    .map_err(|e| CrawlError::Lexicon(format!("{name}/{k}: {e}")))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            name,
            keywords,
            patterns,
        })
    }

    /// True on the first keyword found in `text`; later keywords are not tried.
    pub fn matches(&self, text: &str) -> bool {
        self.patterns.iter().any(|re| re.is_match(text))
    }
}

#[derive(Debug, Clone, Default)]
pub struct Lexicon {
    verticals: Vec<Vertical>,
}

impl Lexicon {
    pub fn new(verticals: Vec<Vertical>) -> Self {
        Self { verticals }
    }

    pub fn from_pairs<N, K>(pairs: impl IntoIterator<Item = (N, Vec<K>)>) -> Result<Self>
    where
        N: Into<String>,
        K: Into<String>,
    {
        let verticals = pairs
            .into_iter()
            .map(|(name, words)| Vertical::new(name, words.into_iter().map(Into::into).collect()))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self::new(verticals))
    }

    /// Built-in Governance / Learning / Safety / Climate table.
    pub fn builtin() -> Result<Self> {
        Self::from_pairs([
            ("Governance", GOVERNANCE.to_vec()),
            ("Learning", LEARNING.to_vec()),
            ("Safety", SAFETY.to_vec()),
            ("Climate", CLIMATE.to_vec()),
        ])
    }

    /// Parses `{"Vertical": ["keyword", ...], ...}` keeping the object's key order.
    pub fn from_json(json: &str) -> Result<Self> {
        let value: serde_json::Value = serde_json::from_str(json)?;
        let object = value
            .as_object()
            .ok_or_else(|| CrawlError::Lexicon("expected a JSON object of vertical -> keywords".into()))?;

        let pairs = object
            .iter()
            .map(|(name, words)| -> Result<(String, Vec<String>)> {
                let words: Vec<String> = serde_json::from_value(words.clone())?;
                Ok((name.clone(), words))
            })
            .collect::<Result<Vec<_>>>()?;

        Self::from_pairs(pairs)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let json = fs::read_to_string(path.as_ref())?;
        Self::from_json(&json)
    }

    pub fn verticals(&self) -> &[Vertical] {
        &self.verticals
    }

    pub fn is_empty(&self) -> bool {
        self.verticals.is_empty()
    }
}
