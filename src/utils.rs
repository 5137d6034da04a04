use rand::prelude::IndexedRandom;
use scraper::ElementRef;
use std::time::{Duration, Instant};

/// Sleeps for one of `delays_ms`, picked at random. No-op when empty.
pub fn random_delay(delays_ms: &[u64]) {
    if let Some(delay) = delays_ms.choose(&mut rand::rng()) {
        std::thread::sleep(Duration::from_millis(*delay));
    }
}

/// All text under `element`, trimmed.
pub fn text_of(element: ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}

/// Text nodes under `element`, each trimmed, blanks dropped, joined by `separator`.
pub fn joined_text(element: ElementRef<'_>, separator: &str) -> String {
    element
        .text()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(separator)
}

pub fn non_empty(text: String) -> Option<String> {
    if text.is_empty() { None } else { Some(text) }
}

/// Cooperative time budget for one adapter run.
#[derive(Debug, Clone, Copy)]
pub struct CrawlBudget {
    deadline: Option<Instant>,
}

impl CrawlBudget {
    pub fn start(limit: Option<Duration>) -> Self {
        Self {
            deadline: limit.map(|limit| Instant::now() + limit),
        }
    }

    pub fn unlimited() -> Self {
        Self { deadline: None }
    }

    pub fn exhausted(&self) -> bool {
        self.deadline.is_some_and(|deadline| Instant::now() >= deadline)
    }
}
