pub mod classifier;
pub mod clients;
pub mod crawler;
pub mod dedup;
pub mod error;
pub mod lexicon;
pub mod models;
pub mod pagination;
pub mod pipeline;
pub mod session;
pub mod utils;
pub mod writer;

pub use classifier::{NO_MATCH, NoMatchPolicy, Verticals, classify};
pub use clients::{
    C40Client, C40CrawlConfig, DevelopmentAidClient, DevelopmentAidCrawlConfig, EstmClient,
    EstmCrawlConfig,
};
pub use crawler::SourceAdapter;
pub use dedup::LinkDeduplicator;
pub use error::{CrawlError, Result};
pub use lexicon::Lexicon;
pub use models::{CanonicalPosting, PostingDate, RawPosting};
pub use pagination::{PageState, PaginationController};
pub use pipeline::{CrawlOutput, CrawlPipeline, SourceOutcome};
pub use session::{BrowserSession, ChromeSessionFactory, SessionConfig, SessionFactory};
pub use writer::save_to_csv;
