use std::fmt::Display;
use std::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum CrawlError {
    /// The browser driver failed outside of a bounded wait.
    #[error("browser error during {operation}: {message}")]
    Browser { operation: String, message: String },

    #[error("timed out after {}s waiting for `{selector}`", timeout.as_secs())]
    PageLoadTimeout { selector: String, timeout: Duration },

    #[error("timed out after {}s loading {url}", timeout.as_secs())]
    NavigationTimeout { url: String, timeout: Duration },

    #[error("invalid selector `{0}`")]
    InvalidSelector(String),

    #[error("invalid url: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("lexicon error: {0}")]
    Lexicon(String),

    #[error("no data collected from any source")]
    NoDataCollected,

    #[error("invalid adapter: {0}")]
    InvalidAdapter(String),

    #[error("adapter panicked: {0}")]
    AdapterPanic(String),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("thread pool error: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

impl CrawlError {
    pub fn browser(operation: impl Into<String>, err: impl Display) -> Self {
        Self::Browser {
            operation: operation.into(),
            message: format!("{err:#}"),
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(
            self,
            Self::PageLoadTimeout { .. } | Self::NavigationTimeout { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, CrawlError>;
