//! Browser sessions.
//!
//! Adapters talk to a [`BrowserSession`] rather than to Chrome directly, and
//! get one from a [`SessionFactory`] at the start of every fetch. The session
//! is released when it goes out of scope, so every exit path closes the
//! browser.

use crate::error::{CrawlError, Result};
use crate::utils::random_delay;
use headless_chrome::util::Timeout;
use headless_chrome::{Browser, LaunchOptions, Tab};
use std::ffi::{OsStr, OsString};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub headless: bool,
    pub window_size: (u32, u32),
    pub user_agent: String,
    /// Bound on every "wait for element" and next-page lookup.
    pub wait_timeout: Duration,
    /// Pause after a wait succeeds, for client-side rendering to finish.
    pub settle_delay: Duration,
    /// One of these (ms) is slept before each navigation.
    pub politeness_delays_ms: Vec<u64>,
    /// Chrome is torn down after this long without any DevTools traffic.
    pub idle_timeout: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            headless: true,
            window_size: (1920, 1080),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            wait_timeout: Duration::from_secs(30),
            settle_delay: Duration::from_secs(2),
            politeness_delays_ms: vec![1000, 1500, 2000],
            idle_timeout: Duration::from_secs(120),
        }
    }
}

/// The browser operations the adapters rely on.
///
/// Tabs form a stack: [`open_tab`](Self::open_tab) pushes and focuses a new
/// tab, [`close_tab`](Self::close_tab) closes it and returns focus to the one
/// below. Every other call acts on the focused tab.
pub trait BrowserSession {
    fn navigate(&mut self, url: &str) -> Result<()>;

    /// Blocks until `selector` is present, up to the session's wait timeout.
    fn wait_for(&mut self, selector: &str) -> Result<()>;

    /// Current DOM of the focused tab, serialized.
    fn content(&mut self) -> Result<String>;

    fn open_tab(&mut self, url: &str) -> Result<()>;

    fn close_tab(&mut self) -> Result<()>;

    /// Clicks the button whose normalized text equals `label`.
    ///
    /// `Ok(false)` when no such button became clickable within the wait timeout.
    fn click_button_labeled(&mut self, label: &str) -> Result<bool>;

    fn tab_count(&self) -> usize;
}

pub trait SessionFactory: Send + Sync {
    fn open(&self) -> Result<Box<dyn BrowserSession>>;
}

pub struct ChromeSession {
    // Dropping the browser kills the Chrome process.
    browser: Browser,
    tabs: Vec<Arc<Tab>>,
    config: SessionConfig,
}

impl ChromeSession {
    pub fn launch(config: SessionConfig) -> Result<Self> {
        let user_agent = OsString::from(format!("--user-agent={}", config.user_agent));
        let args = vec![
            OsStr::new("--disable-blink-features=AutomationControlled"),
            OsStr::new("--disable-dev-shm-usage"),
            OsStr::new("--disable-gpu"),
            user_agent.as_os_str(),
        ];

        let browser = Browser::new(LaunchOptions {
            headless: config.headless,
            sandbox: false,
            window_size: Some(config.window_size),
            idle_browser_timeout: config.idle_timeout,
            args,
            ..Default::default()
        })
        .map_err(|e| CrawlError::browser("launch", e))?;

        let tab = browser
            .new_tab()
            .map_err(|e| CrawlError::browser("new tab", e))?;
        tab.set_default_timeout(config.wait_timeout);

        debug!(headless = config.headless, "chrome session started");
        Ok(Self {
            browser,
            tabs: vec![tab],
            config,
        })
    }

    fn active(&self) -> Result<&Arc<Tab>> {
        self.tabs
            .last()
            .ok_or_else(|| CrawlError::browser("focus", "no open tab"))
    }

    fn settle(&self) {
        if !self.config.settle_delay.is_zero() {
            std::thread::sleep(self.config.settle_delay);
        }
    }
}

impl BrowserSession for ChromeSession {
    fn navigate(&mut self, url: &str) -> Result<()> {
        random_delay(&self.config.politeness_delays_ms);
        let timeout = self.config.wait_timeout;
        let tab = self.active()?;
        tab.navigate_to(url)
            .and_then(|tab| tab.wait_until_navigated())
            .map_err(|e| navigation_error(url, e, timeout))?;
        Ok(())
    }

    fn wait_for(&mut self, selector: &str) -> Result<()> {
        let timeout = self.config.wait_timeout;
        let tab = self.active()?;
        if let Err(e) = tab.wait_for_element_with_custom_timeout(selector, timeout) {
            debug!(selector, error = %e, "wait failed");
            return Err(CrawlError::PageLoadTimeout {
                selector: selector.to_string(),
                timeout,
            });
        }
        self.settle();
        Ok(())
    }

    fn content(&mut self) -> Result<String> {
        self.active()?
            .get_content()
            .map_err(|e| CrawlError::browser("read content", e))
    }

    fn open_tab(&mut self, url: &str) -> Result<()> {
        let tab = self
            .browser
            .new_tab()
            .map_err(|e| CrawlError::browser("new tab", e))?;
        tab.set_default_timeout(self.config.wait_timeout);
        self.tabs.push(tab);
        self.navigate(url)
    }

    fn close_tab(&mut self) -> Result<()> {
        if self.tabs.len() < 2 {
            return Err(CrawlError::browser("close tab", "refusing to close the listing tab"));
        }

        if let Some(tab) = self.tabs.pop() {
            tab.close(true)
                .map_err(|e| CrawlError::browser("close tab", e))?;
        }

        self.active()?
            .activate()
            .map_err(|e| CrawlError::browser("refocus tab", e))?;
        Ok(())
    }

    fn click_button_labeled(&mut self, label: &str) -> Result<bool> {
        let timeout = self.config.wait_timeout;
        let xpath = format!(r#"//button[normalize-space()="{label}"]"#);
        let tab = self.active()?;

        let button = match tab.wait_for_xpath_with_custom_timeout(&xpath, timeout) {
            Ok(button) => button,
            Err(e) => {
                debug!(label, error = %e, "button not found");
                return Ok(false);
            }
        };

        let clicked = button
            .scroll_into_view()
            .and_then(|button| button.call_js_fn("function() { this.click(); }", vec![], false));
        if let Err(e) = clicked {
            warn!(label, error = %e, "button found but not clickable");
            return Ok(false);
        }

        self.settle();
        Ok(true)
    }

    fn tab_count(&self) -> usize {
        self.tabs.len()
    }
}

/// Chrome's bounded navigation wait gives up with `util::Timeout`; that is a
/// timeout for the adapters, anything else is a browser failure.
fn navigation_error(url: &str, err: anyhow::Error, timeout: Duration) -> CrawlError {
    if err.downcast_ref::<Timeout>().is_some() {
        CrawlError::NavigationTimeout {
            url: url.to_string(),
            timeout,
        }
    } else {
        CrawlError::browser(format!("navigate to {url}"), err)
    }
}

impl Drop for ChromeSession {
    fn drop(&mut self) {
        while self.tabs.len() > 1 {
            if let Some(tab) = self.tabs.pop() {
                let _ = tab.close(false);
            }
        }
        debug!("chrome session closed");
    }
}

/// Launches a fresh Chrome for every fetch.
#[derive(Debug, Clone, Default)]
pub struct ChromeSessionFactory {
    config: SessionConfig,
}

impl ChromeSessionFactory {
    pub fn new(config: SessionConfig) -> Self {
        Self { config }
    }
}

impl SessionFactory for ChromeSessionFactory {
    fn open(&self) -> Result<Box<dyn BrowserSession>> {
        Ok(Box::new(ChromeSession::launch(self.config.clone())?))
    }
}
