use crate::classifier::Verticals;

/// The single date a source reports for a posting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PostingDate {
    Deadline(String),
    /// For a source that shows only when a posting went up. None of the
    /// current sites do; the export column holds either kind.
    PostedOn(String),
}

impl PostingDate {
    /// `None` for blank text so an empty extraction never becomes a value.
    pub fn deadline(text: impl Into<String>) -> Option<Self> {
        let text = text.into();
        let text = text.trim();
        (!text.is_empty()).then(|| Self::Deadline(text.to_string()))
    }

    pub fn text(&self) -> &str {
        match self {
            Self::Deadline(text) | Self::PostedOn(text) => text,
        }
    }
}

/// A posting as one adapter extracted it.
#[derive(Debug, Clone, Default)]
pub struct RawPosting {
    pub title: String,
    pub description: Option<String>,
    pub location: Option<String>,
    pub verticals: Verticals,
    pub date: Option<PostingDate>,
    pub url: String,
}

impl RawPosting {
    pub fn new(title: String, url: String) -> Self {
        Self {
            title,
            url,
            ..Default::default()
        }
    }
}

/// One row of the combined dataset, with absent values explicit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanonicalPosting {
    pub source: String,
    pub title: String,
    pub description: Option<String>,
    pub matched_vertical: Option<String>,
    pub deadline_or_posting_date: Option<String>,
    pub apply_link: Option<String>,
}

impl CanonicalPosting {
    pub fn from_raw(source: &str, raw: RawPosting) -> Self {
        let non_empty = |text: String| {
            let trimmed = text.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        };

        Self {
            source: source.to_string(),
            title: raw.title.trim().to_string(),
            description: raw.description.and_then(non_empty),
            matched_vertical: Some(raw.verticals.label()),
            deadline_or_posting_date: raw.date.map(|date| date.text().to_string()),
            apply_link: non_empty(raw.url),
        }
    }
}
