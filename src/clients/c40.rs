use crate::Result;
use crate::classifier::{NoMatchPolicy, classify};
use crate::crawler::{PostingFieldExtractor, SourceAdapter, load_page, selector};
use crate::dedup::LinkDeduplicator;
use crate::lexicon::Lexicon;
use crate::models::{PostingDate, RawPosting};
use crate::session::SessionFactory;
use crate::utils::{CrawlBudget, joined_text, non_empty, text_of};
use scraper::{ElementRef, Html};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

pub const C40_SOURCE: &str = "C40";

#[derive(Debug, Clone)]
pub struct C40CrawlConfig {
    pub careers_url: String,
    pub base_url: String,
    /// Job links are anchors whose href starts with this.
    pub link_prefix: String,
    pub listing_ready_selector: String,
    pub detail_ready_selector: String,
    /// Text of the span heading the paragraph before the deadline paragraph.
    pub deadline_marker: String,
    pub no_match: NoMatchPolicy,
    pub time_budget: Option<Duration>,
}

impl Default for C40CrawlConfig {
    fn default() -> Self {
        Self {
            careers_url: "https://c40.bamboohr.com/careers".to_string(),
            base_url: "https://c40.bamboohr.com".to_string(),
            link_prefix: "/careers/".to_string(),
            listing_ready_selector: "body".to_string(),
            detail_ready_selector: "body".to_string(),
            deadline_marker: "Application Process".to_string(),
            no_match: NoMatchPolicy::Label,
            time_budget: None,
        }
    }
}

/// A job link from the careers listing, with its anchor text as fallback title.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingLink {
    pub url: String,
    pub title: String,
}

/// BambooHR careers board: every job is read from its own detail page.
pub struct C40Client {
    config: C40CrawlConfig,
    lexicon: Arc<Lexicon>,
    sessions: Arc<dyn SessionFactory>,
}

impl C40Client {
    pub fn new(
        config: C40CrawlConfig,
        lexicon: Arc<Lexicon>,
        sessions: Arc<dyn SessionFactory>,
    ) -> Self {
        Self {
            config,
            lexicon,
            sessions,
        }
    }

    /// Unique job links in listing order.
    pub fn parse_listing(&self, html: &str) -> Result<Vec<ListingLink>> {
        let document = Html::parse_document(html);
        let anchor_selector = selector(&format!("a[href^='{}']", self.config.link_prefix))?;
        let mut dedup = LinkDeduplicator::with_base(&self.config.base_url)?;

        let links = document
            .select(&anchor_selector)
            .filter_map(|anchor| {
                let href = anchor.value().attr("href")?;
                let title = text_of(anchor);
                if title.is_empty() {
                    return None;
                }
                let url = dedup.admit(href)?;
                Some(ListingLink { url, title })
            })
            .collect();

        Ok(links)
    }

    /// `None` when the page has no description container: such a posting is unusable.
    pub fn parse_detail(&self, html: &str, link: &ListingLink) -> Option<RawPosting> {
        let document = Html::parse_document(html);

        let description = self.extract_description(&document)?;
        let title = self
            .extract_title(&document)
            .unwrap_or_else(|| link.title.clone());
        let deadline = self.extract_deadline(&document);
        let verticals = classify(&title, &description, &self.lexicon);

        Some(RawPosting {
            title,
            description: Some(description),
            verticals,
            date: deadline.and_then(PostingDate::deadline),
            ..RawPosting::new(String::new(), link.url.clone())
        })
    }

    fn description_container<'a>(&self, document: &'a Html) -> Option<ElementRef<'a>> {
        let container_selector = selector("div.BambooRichText").ok()?;
        document.select(&container_selector).next()
    }
}

impl PostingFieldExtractor for C40Client {
    fn extract_title(&self, fragment: &Html) -> Option<String> {
        let title_selector = selector("h3").ok()?;
        let title = text_of(fragment.select(&title_selector).next()?);
        non_empty(title)
    }

    fn extract_description(&self, fragment: &Html) -> Option<String> {
        let container = self.description_container(fragment)?;
        Some(joined_text(container, "\n"))
    }

    /// The paragraph right after the one holding the marker span.
    fn extract_deadline(&self, fragment: &Html) -> Option<String> {
        let container = self.description_container(fragment)?;
        let span_selector = selector("span").ok()?;

        let marker = container
            .select(&span_selector)
            .find(|span| text_of(*span).contains(&self.config.deadline_marker))?;

        let paragraph = marker
            .ancestors()
            .filter_map(ElementRef::wrap)
            .find(|el| el.value().name() == "p")?;

        let next = paragraph
            .next_siblings()
            .filter_map(ElementRef::wrap)
            .find(|el| el.value().name() == "p")?;

        non_empty(joined_text(next, " "))
    }
}

impl SourceAdapter for C40Client {
    fn source(&self) -> &str {
        C40_SOURCE
    }

    fn fetch(&self) -> Result<Vec<RawPosting>> {
        let budget = CrawlBudget::start(self.config.time_budget);
        let mut session = self.sessions.open()?;

        info!(source = C40_SOURCE, url = %self.config.careers_url, "loading careers listing");
        let listing = load_page(
            session.as_mut(),
            &self.config.careers_url,
            &self.config.listing_ready_selector,
        )?;
        let links = self.parse_listing(&listing)?;
        info!(source = C40_SOURCE, links = links.len(), "collected job links");

        let mut postings = Vec::new();
        for link in &links {
            if budget.exhausted() {
                warn!(source = C40_SOURCE, kept = postings.len(), "crawl budget exhausted");
                break;
            }

            let html = match load_page(
                session.as_mut(),
                &link.url,
                &self.config.detail_ready_selector,
            ) {
                Ok(html) => html,
                Err(e) if e.is_timeout() => {
                    warn!(source = C40_SOURCE, url = %link.url, error = %e, "detail page did not load");
                    continue;
                }
                Err(e) => return Err(e),
            };

            match self.parse_detail(&html, link) {
                Some(posting) if self.config.no_match.keeps(&posting.verticals) => {
                    debug!(source = C40_SOURCE, title = %posting.title, verticals = %posting.verticals, "posting extracted");
                    postings.push(posting);
                }
                Some(posting) => {
                    debug!(source = C40_SOURCE, title = %posting.title, "no vertical matched, dropped");
                }
                None => {
                    warn!(source = C40_SOURCE, url = %link.url, "no description container, skipped");
                }
            }
        }

        info!(source = C40_SOURCE, postings = postings.len(), "crawl finished");
        Ok(postings)
    }
}
