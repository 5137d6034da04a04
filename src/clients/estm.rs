use crate::Result;
use crate::classifier::{NoMatchPolicy, classify};
use crate::crawler::{PostingFieldExtractor, SourceAdapter, selector, with_detail_tab};
use crate::dedup::LinkDeduplicator;
use crate::lexicon::Lexicon;
use crate::models::{PostingDate, RawPosting};
use crate::session::{BrowserSession, SessionFactory};
use crate::utils::{CrawlBudget, non_empty, text_of};
use scraper::{ElementRef, Html};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

pub const ESTM_SOURCE: &str = "ESTM";

const CARD_SELECTOR: &str = "div.job-grid-item";

#[derive(Debug, Clone)]
pub struct EstmCrawlConfig {
    pub jobs_url: String,
    pub base_url: String,
    pub detail_ready_selector: String,
    /// Exact text of the label whose next sibling holds the deadline.
    pub deadline_label: String,
    pub no_match: NoMatchPolicy,
    pub time_budget: Option<Duration>,
}

impl Default for EstmCrawlConfig {
    fn default() -> Self {
        Self {
            jobs_url: "https://estm.fa.em2.oraclecloud.com/hcmUI/CandidateExperience/en/sites/CX_1/jobs?location=India&locationId=300000000440677&locationLevel=country&mode=location".to_string(),
            base_url: "https://estm.fa.em2.oraclecloud.com".to_string(),
            detail_ready_selector: "div.job-details__info-section".to_string(),
            deadline_label: "Apply Before".to_string(),
            no_match: NoMatchPolicy::Label,
            time_budget: None,
        }
    }
}

/// What a job tile on the listing shows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobCard {
    pub title: String,
    pub location: Option<String>,
    pub url: Option<String>,
}

/// Card references read from the listing tab.
///
/// Visiting a detail page changes the browser's tab state, after which the
/// cards read before it must not be trusted. The list is re-read from the
/// listing tab before the next card is touched.
#[derive(Debug)]
enum CardHandles {
    Live(Vec<JobCard>),
    Invalidated,
}

/// Oracle HCM candidate site: card data comes from the listing, the deadline
/// from each job's detail page opened in its own tab.
pub struct EstmClient {
    config: EstmCrawlConfig,
    lexicon: Arc<Lexicon>,
    sessions: Arc<dyn SessionFactory>,
}

impl EstmClient {
    pub fn new(
        config: EstmCrawlConfig,
        lexicon: Arc<Lexicon>,
        sessions: Arc<dyn SessionFactory>,
    ) -> Self {
        Self {
            config,
            lexicon,
            sessions,
        }
    }

    pub fn parse_cards(&self, html: &str) -> Result<Vec<JobCard>> {
        let document = Html::parse_document(html);
        let card_selector = selector(CARD_SELECTOR)?;

        let cards = document
            .select(&card_selector)
            .map(|card| {
                let fragment = Html::parse_fragment(&card.html());
                JobCard {
                    title: self.extract_title(&fragment).unwrap_or_default(),
                    location: self.extract_location(&fragment),
                    url: self.extract_url(&fragment),
                }
            })
            .collect();

        Ok(cards)
    }

    pub fn parse_deadline(&self, html: &str) -> Option<String> {
        self.extract_deadline(&Html::parse_document(html))
    }

    fn query_cards(&self, session: &mut dyn BrowserSession) -> Result<Vec<JobCard>> {
        session.wait_for(CARD_SELECTOR)?;
        let html = session.content()?;
        self.parse_cards(&html)
    }

    /// Deadline from the job's detail tab; absent when the tab never loads.
    fn visit_detail(&self, session: &mut dyn BrowserSession, url: &str) -> Result<Option<String>> {
        let ready = self.config.detail_ready_selector.clone();
        let visited = with_detail_tab(session, url, |tab| {
            tab.wait_for(&ready)?;
            let html = tab.content()?;
            Ok(self.parse_deadline(&html))
        });

        match visited {
            Ok(deadline) => Ok(deadline),
            Err(e) if e.is_timeout() => {
                warn!(source = ESTM_SOURCE, url, error = %e, "detail page did not load");
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }
}

impl PostingFieldExtractor for EstmClient {
    fn extract_title(&self, fragment: &Html) -> Option<String> {
        let title_selector = selector("span.job-tile__title").ok()?;
        let title = text_of(fragment.select(&title_selector).next()?);
        Some(title)
    }

    fn extract_url(&self, fragment: &Html) -> Option<String> {
        let anchor_selector = selector("a[href]").ok()?;
        let href = fragment.select(&anchor_selector).next()?.value().attr("href")?;
        non_empty(href.trim().to_string())
    }

    fn extract_location(&self, fragment: &Html) -> Option<String> {
        let location_selector = selector("span[data-bind*='primaryLocation']").ok()?;
        non_empty(text_of(fragment.select(&location_selector).next()?))
    }

    fn extract_deadline(&self, fragment: &Html) -> Option<String> {
        let span_selector = selector("span").ok()?;
        let label = fragment
            .select(&span_selector)
            .find(|span| text_of(*span) == self.config.deadline_label)?;

        let value = label
            .next_siblings()
            .filter_map(ElementRef::wrap)
            .find(|el| el.value().name() == "span")?;

        non_empty(text_of(value))
    }
}

impl SourceAdapter for EstmClient {
    fn source(&self) -> &str {
        ESTM_SOURCE
    }

    fn fetch(&self) -> Result<Vec<RawPosting>> {
        let budget = CrawlBudget::start(self.config.time_budget);
        let mut session = self.sessions.open()?;
        let mut dedup = LinkDeduplicator::with_base(&self.config.base_url)?;

        info!(source = ESTM_SOURCE, url = %self.config.jobs_url, "loading job listing");
        session.navigate(&self.config.jobs_url)?;

        let cards = self.query_cards(session.as_mut())?;
        info!(source = ESTM_SOURCE, cards = cards.len(), "found job cards");
        let mut handles = CardHandles::Live(cards);

        let mut postings = Vec::new();
        let mut index = 0;
        loop {
            if budget.exhausted() {
                warn!(source = ESTM_SOURCE, kept = postings.len(), "crawl budget exhausted");
                break;
            }

            let cards = match handles {
                CardHandles::Live(cards) => cards,
                CardHandles::Invalidated => {
                    debug!(source = ESTM_SOURCE, index, "re-reading job cards");
                    match self.query_cards(session.as_mut()) {
                        Ok(cards) => cards,
                        Err(e) if e.is_timeout() => {
                            warn!(source = ESTM_SOURCE, index, error = %e, "job cards did not reload, stopping");
                            break;
                        }
                        Err(e) => return Err(e),
                    }
                }
            };

            let Some(card) = cards.get(index).cloned() else {
                break;
            };
            index += 1;
            handles = CardHandles::Live(cards);

            let Some(url) = card.url.as_deref().and_then(|href| dedup.admit(href)) else {
                debug!(source = ESTM_SOURCE, title = %card.title, "card without new link skipped");
                continue;
            };

            let deadline = self.visit_detail(session.as_mut(), &url)?;
            handles = CardHandles::Invalidated;

            let verticals = classify(&card.title, "", &self.lexicon);
            if !self.config.no_match.keeps(&verticals) {
                debug!(source = ESTM_SOURCE, title = %card.title, "no vertical matched, dropped");
                continue;
            }

            postings.push(RawPosting {
                title: card.title,
                location: card.location,
                verticals,
                date: deadline.and_then(PostingDate::deadline),
                ..RawPosting::new(String::new(), url)
            });
        }

        info!(source = ESTM_SOURCE, postings = postings.len(), "crawl finished");
        Ok(postings)
    }
}
