use regex::Regex;
use std::collections::HashSet;
use std::sync::LazyLock;
use url::Url;

static HYPERLINK_FORMULA: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)^=HYPERLINK\(\s*"((?:[^"]|"")*)"\s*(?:[,;]\s*"(?:[^"]|"")*"\s*)?\)$"#)
        .expect("hyperlink formula pattern is valid")
});

/// Normalizes a link the way it is compared for duplicates: trimmed,
/// unwrapped from a spreadsheet hyperlink formula and resolved against `base`.
pub fn normalize_link(base: Option<&Url>, link: &str) -> String {
    let trimmed = link.trim();
    let raw = match HYPERLINK_FORMULA.captures(trimmed) {
        Some(caps) => caps[1].replace("\"\"", "\"").trim().to_string(),
        None => trimmed.to_string(),
    };

    if raw.is_empty() {
        return raw;
    }

    match Url::parse(&raw) {
        Ok(url) => url.to_string(),
        Err(url::ParseError::RelativeUrlWithoutBase) => match base {
            Some(base) => base
                .join(&raw)
                .map(|url| url.to_string())
                .unwrap_or_else(|_| format!("{}{}", base.as_str().trim_end_matches('/'), raw)),
            None => raw,
        },
        Err(_) => raw,
    }
}

/// Set of links already seen during one adapter run.
#[derive(Debug, Default)]
pub struct LinkDeduplicator {
    base: Option<Url>,
    seen: HashSet<String>,
}

impl LinkDeduplicator {
    pub fn new(base: Option<Url>) -> Self {
        Self {
            base,
            seen: HashSet::new(),
        }
    }

    pub fn with_base(base: &str) -> crate::Result<Self> {
        Ok(Self::new(Some(Url::parse(base)?)))
    }

    pub fn normalize(&self, link: &str) -> String {
        normalize_link(self.base.as_ref(), link)
    }

    /// Records the link and reports whether it was unseen.
    pub fn is_new(&mut self, link: &str) -> bool {
        let normalized = self.normalize(link);
        self.seen.insert(normalized)
    }

    /// Like [`is_new`](Self::is_new) but hands back the normalized link.
    pub fn admit(&mut self, link: &str) -> Option<String> {
        let normalized = self.normalize(link);
        self.seen.insert(normalized.clone()).then_some(normalized)
    }

    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}
