use crate::error::{CrawlError, Result};
use crate::models::RawPosting;
use crate::session::BrowserSession;
use scraper::{Html, Selector};
use tracing::warn;

/// One external listing site.
pub trait SourceAdapter: Send + Sync {
    /// Non-empty name written to the `Source` column.
    fn source(&self) -> &str;

    /// Crawls the site from scratch. Postings come back classified,
    /// deduplicated and in listing order.
    fn fetch(&self) -> Result<Vec<RawPosting>>;
}

/// Per-site field readers over a parsed card or detail page.
///
/// Every reader is a field-level failure boundary: `None` means the field is
/// absent, never that the card is broken.
pub trait PostingFieldExtractor {
    fn extract_title(&self, fragment: &Html) -> Option<String>;

    fn extract_url(&self, _fragment: &Html) -> Option<String> {
        None
    }

    fn extract_description(&self, _fragment: &Html) -> Option<String> {
        None
    }

    fn extract_deadline(&self, _fragment: &Html) -> Option<String> {
        None
    }

    fn extract_location(&self, _fragment: &Html) -> Option<String> {
        None
    }
}

pub fn selector(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|_| CrawlError::InvalidSelector(css.to_string()))
}

/// Navigates and waits for `ready_selector`, returning the page's HTML.
pub fn load_page(
    session: &mut dyn BrowserSession,
    url: &str,
    ready_selector: &str,
) -> Result<String> {
    session.navigate(url)?;
    session.wait_for(ready_selector)?;
    session.content()
}

/// Runs `visit` with a detail tab open on `url`; the tab is closed and focus
/// returned on every path, including when `visit` fails.
pub fn with_detail_tab<T>(
    session: &mut dyn BrowserSession,
    url: &str,
    visit: impl FnOnce(&mut dyn BrowserSession) -> Result<T>,
) -> Result<T> {
    let tabs_before = session.tab_count();
    let opened = session.open_tab(url);

    let result = match opened {
        Ok(()) => visit(&mut *session),
        Err(e) => Err(e),
    };

    if session.tab_count() > tabs_before {
        if let Err(e) = session.close_tab() {
            warn!(url, error = %e, "failed to close detail tab");
            return Err(e);
        }
    }

    result
}
