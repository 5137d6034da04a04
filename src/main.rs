use anyhow::Context;
use clap::Parser;
use posting_crawler::{
    C40Client, C40CrawlConfig, ChromeSessionFactory, CrawlError, CrawlPipeline,
    DevelopmentAidClient, DevelopmentAidCrawlConfig, EstmClient, EstmCrawlConfig, Lexicon,
    SessionConfig, SessionFactory,
};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "posting-crawler", about = "Crawl job and tender boards into one CSV")]
struct Args {
    /// Combined output file
    #[arg(short, long, default_value = "output/Combined.csv")]
    output: PathBuf,

    /// JSON lexicon of vertical -> keywords (built-in lexicon when omitted)
    #[arg(short, long)]
    lexicon: Option<PathBuf>,

    /// Page ceiling for the tender search
    #[arg(long, default_value_t = 10)]
    max_pages: usize,

    /// Seconds to wait for any page element
    #[arg(long, default_value_t = 30)]
    timeout_secs: u64,

    /// Per-source crawl budget in seconds
    #[arg(long)]
    budget_secs: Option<u64>,

    /// Show the browser window
    #[arg(long)]
    headful: bool,

    /// Run sources on this many threads instead of one after another
    #[arg(long)]
    parallel: Option<usize>,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();

    let lexicon = match &args.lexicon {
        Some(path) => Lexicon::load(path)
            .with_context(|| format!("loading lexicon from {}", path.display()))?,
        None => Lexicon::builtin()?,
    };
    let lexicon = Arc::new(lexicon);

    let sessions: Arc<dyn SessionFactory> = Arc::new(ChromeSessionFactory::new(SessionConfig {
        headless: !args.headful,
        wait_timeout: Duration::from_secs(args.timeout_secs),
        ..Default::default()
    }));
    let budget = args.budget_secs.map(Duration::from_secs);

    let pipeline = CrawlPipeline::new()
        .with_source(EstmClient::new(
            EstmCrawlConfig {
                time_budget: budget,
                ..Default::default()
            },
            lexicon.clone(),
            sessions.clone(),
        ))
        .with_source(C40Client::new(
            C40CrawlConfig {
                time_budget: budget,
                ..Default::default()
            },
            lexicon.clone(),
            sessions.clone(),
        ))
        .with_source(DevelopmentAidClient::new(
            DevelopmentAidCrawlConfig {
                max_pages: args.max_pages,
                time_budget: budget,
                ..Default::default()
            },
            lexicon,
            sessions,
        ));

    info!(sources = ?pipeline.sources().collect::<Vec<_>>(), "starting crawl");
    let output = match args.parallel {
        Some(threads) => pipeline.run_parallel(threads),
        None => pipeline.run(),
    };

    let output = match output {
        Ok(output) => output,
        Err(CrawlError::NoDataCollected) => {
            error!("no data collected from any source, nothing written");
            std::process::exit(1);
        }
        Err(e) => return Err(e.into()),
    };

    for outcome in output.outcomes.iter().filter(|o| o.is_failure()) {
        error!(source = outcome.source(), "source contributed no rows");
    }

    output.save(&args.output)?;
    info!(path = %args.output.display(), rows = output.postings.len(), "done");
    Ok(())
}
