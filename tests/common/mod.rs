#![allow(dead_code)]

use posting_crawler::session::{BrowserSession, SessionFactory};
use posting_crawler::{CrawlError, Lexicon, RawPosting, Result, SourceAdapter};
use scraper::{Html, Selector};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Canned pages served by [`FakeSession`]. A url may have several pages,
/// reached by clicking numbered pager buttons.
#[derive(Debug, Default, Clone)]
pub struct FakeSite {
    pages: HashMap<String, Vec<String>>,
    broken: HashSet<String>,
    slow: HashSet<String>,
    stalls: HashMap<String, usize>,
    latency: Duration,
}

impl FakeSite {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn page(mut self, url: &str, html: &str) -> Self {
        self.pages.insert(url.to_string(), vec![html.to_string()]);
        self
    }

    pub fn paged(mut self, url: &str, pages: &[&str]) -> Self {
        self.pages
            .insert(url.to_string(), pages.iter().map(|p| p.to_string()).collect());
        self
    }

    /// Navigating to `url` fails with a browser error.
    pub fn broken(mut self, url: &str) -> Self {
        self.broken.insert(url.to_string());
        self
    }

    /// Navigating to `url` times out.
    pub fn slow(mut self, url: &str) -> Self {
        self.slow.insert(url.to_string());
        self
    }

    /// Waits for `selector` succeed `times` times, then time out.
    pub fn stall_after(mut self, selector: &str, times: usize) -> Self {
        self.stalls.insert(selector.to_string(), times);
        self
    }

    /// Every content read takes this long.
    pub fn latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Navigate(String),
    Content { tab: usize },
    OpenTab(String),
    CloseTab,
    Click(String),
}

#[derive(Debug, Default)]
pub struct Recorder {
    pub events: Vec<Event>,
    pub waits: HashMap<String, usize>,
    pub opened: usize,
    pub closed: usize,
}

#[derive(Clone)]
pub struct FakeSessionFactory {
    site: Arc<FakeSite>,
    pub recorder: Arc<Mutex<Recorder>>,
}

impl FakeSessionFactory {
    pub fn new(site: FakeSite) -> Self {
        Self {
            site: Arc::new(site),
            recorder: Arc::new(Mutex::new(Recorder::default())),
        }
    }

    pub fn events(&self) -> Vec<Event> {
        self.recorder.lock().unwrap().events.clone()
    }

    pub fn opened(&self) -> usize {
        self.recorder.lock().unwrap().opened
    }

    pub fn closed(&self) -> usize {
        self.recorder.lock().unwrap().closed
    }
}

impl SessionFactory for FakeSessionFactory {
    fn open(&self) -> Result<Box<dyn BrowserSession>> {
        self.recorder.lock().unwrap().opened += 1;
        Ok(Box::new(FakeSession {
            site: self.site.clone(),
            recorder: self.recorder.clone(),
            tabs: vec![FakeTab::default()],
        }))
    }
}

#[derive(Debug, Default, Clone)]
struct FakeTab {
    url: Option<String>,
    page: usize,
}

pub struct FakeSession {
    site: Arc<FakeSite>,
    recorder: Arc<Mutex<Recorder>>,
    tabs: Vec<FakeTab>,
}

impl FakeSession {
    fn record(&self, event: Event) {
        self.recorder.lock().unwrap().events.push(event);
    }

    fn active_html(&self) -> String {
        let Some(tab) = self.tabs.last() else {
            return String::new();
        };
        tab.url
            .as_ref()
            .and_then(|url| self.site.pages.get(url))
            .and_then(|pages| pages.get(tab.page))
            .cloned()
            .unwrap_or_default()
    }
}

impl BrowserSession for FakeSession {
    fn navigate(&mut self, url: &str) -> Result<()> {
        self.record(Event::Navigate(url.to_string()));
        if self.site.broken.contains(url) {
            return Err(CrawlError::browser(format!("navigate to {url}"), "connection reset"));
        }
        if self.site.slow.contains(url) {
            return Err(CrawlError::NavigationTimeout {
                url: url.to_string(),
                timeout: Duration::from_secs(30),
            });
        }
        if let Some(tab) = self.tabs.last_mut() {
            tab.url = Some(url.to_string());
            tab.page = 0;
        }
        Ok(())
    }

    fn wait_for(&mut self, selector: &str) -> Result<()> {
        let parsed = Selector::parse(selector)
            .map_err(|_| CrawlError::InvalidSelector(selector.to_string()))?;
        let attempt = {
            let mut recorder = self.recorder.lock().unwrap();
            let count = recorder.waits.entry(selector.to_string()).or_default();
            *count += 1;
            *count
        };
        let stalled = self
            .site
            .stalls
            .get(selector)
            .is_some_and(|&times| attempt > times);

        let document = Html::parse_document(&self.active_html());
        if !stalled && document.select(&parsed).next().is_some() {
            Ok(())
        } else {
            Err(CrawlError::PageLoadTimeout {
                selector: selector.to_string(),
                timeout: Duration::from_secs(30),
            })
        }
    }

    fn content(&mut self) -> Result<String> {
        self.record(Event::Content {
            tab: self.tabs.len() - 1,
        });
        if !self.site.latency.is_zero() {
            std::thread::sleep(self.site.latency);
        }
        Ok(self.active_html())
    }

    fn open_tab(&mut self, url: &str) -> Result<()> {
        self.record(Event::OpenTab(url.to_string()));
        self.tabs.push(FakeTab::default());
        self.navigate(url)
    }

    fn close_tab(&mut self) -> Result<()> {
        if self.tabs.len() < 2 {
            return Err(CrawlError::browser("close tab", "refusing to close the listing tab"));
        }
        self.record(Event::CloseTab);
        self.tabs.pop();
        Ok(())
    }

    fn click_button_labeled(&mut self, label: &str) -> Result<bool> {
        self.record(Event::Click(label.to_string()));

        let document = Html::parse_document(&self.active_html());
        let buttons = Selector::parse("button").unwrap();
        let present = document.select(&buttons).any(|button| {
            button.text().collect::<String>().split_whitespace().collect::<Vec<_>>().join(" ")
                == label
        });
        let Ok(number) = label.parse::<usize>() else {
            return Ok(false);
        };
        if !present || number == 0 {
            return Ok(false);
        }

        if let Some(tab) = self.tabs.last_mut() {
            tab.page = number - 1;
        }
        Ok(true)
    }

    fn tab_count(&self) -> usize {
        self.tabs.len()
    }
}

impl Drop for FakeSession {
    fn drop(&mut self) {
        if let Ok(mut recorder) = self.recorder.lock() {
            recorder.closed += 1;
        }
    }
}

pub fn lexicon() -> Arc<Lexicon> {
    Arc::new(Lexicon::builtin().unwrap())
}

/// Adapter with a scripted result, for orchestration tests.
pub enum Script {
    Rows(Vec<&'static str>),
    Fail,
    Panic,
}

pub struct ScriptedAdapter {
    pub name: &'static str,
    pub script: Script,
}

impl ScriptedAdapter {
    pub fn rows(name: &'static str, titles: Vec<&'static str>) -> Self {
        Self {
            name,
            script: Script::Rows(titles),
        }
    }
}

impl SourceAdapter for ScriptedAdapter {
    fn source(&self) -> &str {
        self.name
    }

    fn fetch(&self) -> Result<Vec<RawPosting>> {
        match &self.script {
            Script::Rows(titles) => Ok(titles
                .iter()
                .map(|title| {
                    RawPosting::new(
                        title.to_string(),
                        format!("https://{}.example/{}", self.name, title.replace(' ', "-")),
                    )
                })
                .collect()),
            Script::Fail => Err(CrawlError::PageLoadTimeout {
                selector: "a.search-card__title".into(),
                timeout: Duration::from_secs(30),
            }),
            Script::Panic => panic!("markup changed under {}", self.name),
        }
    }
}
