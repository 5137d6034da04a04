use crate::lexicon::Lexicon;
use std::fmt;

/// Rendered in place of a vertical list when nothing matched.
pub const NO_MATCH: &str = "N/A";

/// Matched vertical names, in lexicon declaration order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Verticals(Vec<String>);

impl Verticals {
    pub fn names(&self) -> &[String] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.iter().any(|v| v == name)
    }

    /// Comma-joined names, or [`NO_MATCH`].
    pub fn label(&self) -> String {
        if self.0.is_empty() {
            NO_MATCH.to_string()
        } else {
            self.0.join(", ")
        }
    }
}

impl fmt::Display for Verticals {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}

/// What an adapter does with a posting that matched no vertical.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NoMatchPolicy {
    /// Keep the posting, labelled [`NO_MATCH`].
    #[default]
    Label,
    /// Drop the posting.
    Drop,
}

impl NoMatchPolicy {
    pub fn keeps(&self, verticals: &Verticals) -> bool {
        match self {
            Self::Label => true,
            Self::Drop => !verticals.is_empty(),
        }
    }
}

pub fn classify(title: &str, description: &str, lexicon: &Lexicon) -> Verticals {
    let text = format!("{title} {description}").to_lowercase();

    let matched = lexicon
        .verticals()
        .iter()
        .filter(|vertical| vertical.matches(&text))
        .map(|vertical| vertical.name.clone())
        .collect();

    Verticals(matched)
}
