use crate::crawler::SourceAdapter;
use crate::models::{CanonicalPosting, RawPosting};
use crate::writer::save_to_csv;
use crate::{CrawlError, Result};
use rayon::ThreadPoolBuilder;
use rayon::prelude::*;
use std::any::Any;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::path::Path;
use tracing::{error, info, warn};

/// How one source fared in a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceOutcome {
    Collected { source: String, rows: usize },
    Failed { source: String, error: String },
}

impl SourceOutcome {
    pub fn source(&self) -> &str {
        match self {
            Self::Collected { source, .. } | Self::Failed { source, .. } => source,
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }
}

/// The merged dataset plus a per-source report.
#[derive(Debug, Clone)]
pub struct CrawlOutput {
    pub postings: Vec<CanonicalPosting>,
    pub outcomes: Vec<SourceOutcome>,
}

impl CrawlOutput {
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        save_to_csv(&self.postings, path)
            .inspect(|_| info!(path = %path.display(), rows = self.postings.len(), "combined file written"))
            .inspect_err(|e| error!(path = %path.display(), error = %e, "failed to write combined file"))
    }
}

#[derive(Default)]
pub struct CrawlPipeline {
    sources: Vec<Box<dyn SourceAdapter>>,
}

impl CrawlPipeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_source(mut self, source: impl SourceAdapter + 'static) -> Self {
        self.sources.push(Box::new(source));
        self
    }

    pub fn add_source(&mut self, source: Box<dyn SourceAdapter>) {
        self.sources.push(source);
    }

    pub fn sources(&self) -> impl Iterator<Item = &str> {
        self.sources.iter().map(|source| source.source())
    }

    /// Runs every source one after another.
    pub fn run(&self) -> Result<CrawlOutput> {
        run(&self.sources)
    }

    /// Runs sources on `thread_count` threads. Each source still owns its own
    /// browser, and the output keeps the order sources were added in.
    pub fn run_parallel(&self, thread_count: usize) -> Result<CrawlOutput> {
        let pool = ThreadPoolBuilder::new()
            .num_threads(thread_count.max(1))
            .build()?;

        let results = pool.install(|| {
            self.sources
                .par_iter()
                .map(|source| (source.source().to_string(), fetch_isolated(source.as_ref())))
                .collect::<Vec<_>>()
        });

        merge(results)
    }
}

/// Fetches every adapter in order and merges what succeeded.
///
/// A failing or panicking adapter contributes no rows and does not stop the
/// others. Fails with [`CrawlError::NoDataCollected`] when nothing was collected.
pub fn run(adapters: &[Box<dyn SourceAdapter>]) -> Result<CrawlOutput> {
    let results = adapters
        .iter()
        .map(|adapter| {
            info!(source = adapter.source(), "running source");
            (adapter.source().to_string(), fetch_isolated(adapter.as_ref()))
        })
        .collect();

    merge(results)
}

/// `fetch()` behind a failure boundary that also stops panics.
pub fn fetch_isolated(adapter: &dyn SourceAdapter) -> Result<Vec<RawPosting>> {
    if adapter.source().trim().is_empty() {
        return Err(CrawlError::InvalidAdapter("empty source name".into()));
    }

    catch_unwind(AssertUnwindSafe(|| adapter.fetch()))
        .unwrap_or_else(|panic| Err(CrawlError::AdapterPanic(panic_message(panic.as_ref()))))
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}

fn merge(results: Vec<(String, Result<Vec<RawPosting>>)>) -> Result<CrawlOutput> {
    let mut postings = Vec::new();
    let mut outcomes = Vec::with_capacity(results.len());

    for (source, result) in results {
        match result {
            Ok(raw) => {
                if raw.is_empty() {
                    warn!(source = %source, "source returned no data");
                } else {
                    info!(source = %source, rows = raw.len(), "source rows added");
                }
                outcomes.push(SourceOutcome::Collected {
                    source: source.clone(),
                    rows: raw.len(),
                });
                postings.extend(
                    raw.into_iter()
                        .map(|posting| CanonicalPosting::from_raw(&source, posting)),
                );
            }
            Err(e) => {
                error!(source = %source, error = %e, "source failed");
                outcomes.push(SourceOutcome::Failed {
                    source,
                    error: e.to_string(),
                });
            }
        }
    }

    if postings.is_empty() {
        error!("no data collected from any source");
        return Err(CrawlError::NoDataCollected);
    }

    Ok(CrawlOutput { postings, outcomes })
}
