use crate::Result;
use crate::classifier::{NoMatchPolicy, classify};
use crate::crawler::{PostingFieldExtractor, SourceAdapter, selector};
use crate::dedup::LinkDeduplicator;
use crate::lexicon::Lexicon;
use crate::models::{PostingDate, RawPosting};
use crate::pagination::PaginationController;
use crate::session::{BrowserSession, SessionFactory};
use crate::utils::{CrawlBudget, non_empty, text_of};
use scraper::{ElementRef, Html};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

pub const DEVELOPMENT_AID_SOURCE: &str = "DevelopmentAid";

const CARD_SELECTOR: &str = "a.search-card__title";

#[derive(Debug, Clone)]
pub struct DevelopmentAidCrawlConfig {
    pub search_url: String,
    pub base_url: String,
    /// Hard ceiling on result pages, whatever the pager still offers.
    pub max_pages: usize,
    pub no_match: NoMatchPolicy,
    pub time_budget: Option<Duration>,
}

impl Default for DevelopmentAidCrawlConfig {
    fn default() -> Self {
        Self {
            search_url: "https://www.developmentaid.org/tenders/search?locations=147".to_string(),
            base_url: "https://www.developmentaid.org".to_string(),
            max_pages: 10,
            no_match: NoMatchPolicy::Drop,
            time_budget: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TenderCard {
    pub title: String,
    pub href: String,
    pub deadline: Option<String>,
}

/// Tender search portal. Results are paged in place by clicking the next
/// page number, so the search page is loaded exactly once.
pub struct DevelopmentAidClient {
    config: DevelopmentAidCrawlConfig,
    lexicon: Arc<Lexicon>,
    sessions: Arc<dyn SessionFactory>,
}

impl DevelopmentAidClient {
    pub fn new(
        config: DevelopmentAidCrawlConfig,
        lexicon: Arc<Lexicon>,
        sessions: Arc<dyn SessionFactory>,
    ) -> Self {
        Self {
            config,
            lexicon,
            sessions,
        }
    }

    pub fn parse_cards(&self, html: &str) -> Result<Vec<TenderCard>> {
        let document = Html::parse_document(html);
        let card_selector = selector(CARD_SELECTOR)?;

        let cards = document
            .select(&card_selector)
            .filter_map(|anchor| {
                let fragment = Html::parse_fragment(&card_container(anchor).html());
                let href = self.extract_url(&fragment)?;
                let title = self
                    .extract_title(&fragment)
                    .unwrap_or_else(|| text_of(anchor));

                Some(TenderCard {
                    title,
                    href,
                    deadline: self.extract_deadline(&fragment),
                })
            })
            .collect();

        Ok(cards)
    }

    fn click_page(&self, session: &mut dyn BrowserSession, page: usize) -> bool {
        match session.click_button_labeled(&page.to_string()) {
            Ok(true) => true,
            Ok(false) => {
                info!(source = DEVELOPMENT_AID_SOURCE, page, "no control for next page");
                false
            }
            Err(e) => {
                warn!(source = DEVELOPMENT_AID_SOURCE, page, error = %e, "next page click failed");
                false
            }
        }
    }
}

/// The whole result card around a title anchor, or the anchor itself.
fn card_container(anchor: ElementRef<'_>) -> ElementRef<'_> {
    anchor
        .ancestors()
        .filter_map(ElementRef::wrap)
        .find(|el| el.value().classes().any(|class| class == "search-card"))
        .unwrap_or(anchor)
}

impl PostingFieldExtractor for DevelopmentAidClient {
    fn extract_title(&self, fragment: &Html) -> Option<String> {
        let title_selector = selector(CARD_SELECTOR).ok()?;
        let title = fragment.select(&title_selector).next()?.value().attr("title")?;
        non_empty(title.trim().to_string())
    }

    fn extract_url(&self, fragment: &Html) -> Option<String> {
        let title_selector = selector(CARD_SELECTOR).ok()?;
        let href = fragment.select(&title_selector).next()?.value().attr("href")?;
        non_empty(href.trim().to_string())
    }

    /// The span after the deadline block's label span. A block with only its
    /// label (or an empty value) has no deadline.
    fn extract_deadline(&self, fragment: &Html) -> Option<String> {
        let block_selector = selector("[class*='deadline']").ok()?;
        let span_selector = selector("span").ok()?;

        let block = fragment.select(&block_selector).next()?;
        let value = block.select(&span_selector).nth(1)?;
        non_empty(text_of(value))
    }
}

impl SourceAdapter for DevelopmentAidClient {
    fn source(&self) -> &str {
        DEVELOPMENT_AID_SOURCE
    }

    fn fetch(&self) -> Result<Vec<RawPosting>> {
        let budget = CrawlBudget::start(self.config.time_budget);
        let mut session = self.sessions.open()?;
        let mut dedup = LinkDeduplicator::with_base(&self.config.base_url)?;
        let mut controller = PaginationController::new(self.config.max_pages);

        info!(source = DEVELOPMENT_AID_SOURCE, url = %self.config.search_url, "loading tender search");
        session.navigate(&self.config.search_url)?;

        let mut postings = Vec::new();
        loop {
            if budget.exhausted() {
                warn!(
                    source = DEVELOPMENT_AID_SOURCE,
                    page = controller.current_page(),
                    "crawl budget exhausted"
                );
                controller.stop();
                break;
            }

            let Some(page) = controller
                .advance(|target| target == 1 || self.click_page(session.as_mut(), target))
            else {
                break;
            };

            let html = match session
                .wait_for(CARD_SELECTOR)
                .and_then(|()| session.content())
            {
                Ok(html) => html,
                Err(e) if e.is_timeout() && page > 1 => {
                    warn!(source = DEVELOPMENT_AID_SOURCE, page, error = %e, "results did not load, stopping");
                    controller.stop();
                    break;
                }
                Err(e) => return Err(e),
            };

            let cards = self.parse_cards(&html)?;
            info!(source = DEVELOPMENT_AID_SOURCE, page, cards = cards.len(), "scraping result page");

            for card in cards {
                let Some(url) = dedup.admit(&card.href) else {
                    continue;
                };

                let verticals = classify(&card.title, "", &self.lexicon);
                if !self.config.no_match.keeps(&verticals) {
                    debug!(source = DEVELOPMENT_AID_SOURCE, title = %card.title, "no vertical matched, dropped");
                    continue;
                }

                postings.push(RawPosting {
                    verticals,
                    date: card.deadline.and_then(PostingDate::deadline),
                    ..RawPosting::new(card.title, url)
                });
            }
        }

        info!(
            source = DEVELOPMENT_AID_SOURCE,
            pages = controller.current_page(),
            state = ?controller.state(),
            postings = postings.len(),
            "crawl finished"
        );
        Ok(postings)
    }
}
