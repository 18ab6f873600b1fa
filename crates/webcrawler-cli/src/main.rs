use std::env;
use std::fs::File;
use std::num::NonZeroUsize;
use std::path::PathBuf;

use clap::Parser;
use tokio::runtime;
use webcrawler::{CrawlResult, Crawler, CrawlerConfig, HttpDownloader};

/// Depth-bounded breadth-first site crawler
#[derive(Debug, Parser)]
#[clap(version)]
pub struct Args {
    /// Seed URL to start crawling from
    pub url: String,
    /// Number of breadth-first levels to fetch (1 = only the seed)
    #[clap(long, short, default_value_t = 1)]
    pub depth: i32,
    /// Optional crawler yaml configuration file
    #[clap(env = "WEBCRAWLER_CONFIG", long)]
    pub crawler_config: Option<PathBuf>,
    /// Override the maximum number of concurrent downloads
    #[clap(long)]
    pub downloaders: Option<NonZeroUsize>,
    /// Override the maximum number of concurrent link extractions
    #[clap(long)]
    pub extractors: Option<NonZeroUsize>,
    /// Override the maximum number of concurrent downloads per host
    #[clap(long)]
    pub per_host: Option<NonZeroUsize>,
    /// Override the crawler's user agent
    #[clap(long)]
    pub user_agent: Option<String>,
    /// When quiet no logs are outputted
    #[clap(long, short)]
    pub quiet: bool,
}

impl TryFrom<&Args> for CrawlerConfig {
    type Error = anyhow::Error;

    fn try_from(args: &Args) -> Result<Self, Self::Error> {
        let mut conf = if let Some(file) = args.crawler_config.as_ref().map(File::open) {
            serde_yaml::from_reader(file?)?
        } else {
            CrawlerConfig::default()
        };
        if let Some(downloaders) = args.downloaders {
            conf.downloaders = downloaders;
        }
        if let Some(extractors) = args.extractors {
            conf.extractors = extractors;
        }
        if let Some(per_host) = args.per_host {
            conf.per_host = per_host;
        }
        Ok(conf)
    }
}

fn crawl(args: &Args) -> anyhow::Result<CrawlResult> {
    let conf = args.try_into()?;
    let downloader = match &args.user_agent {
        Some(ua) => HttpDownloader::new(ua),
        None => HttpDownloader::default(),
    };
    let crawler = Crawler::new(downloader, &conf);
    let rt = runtime::Builder::new_multi_thread().enable_all().build()?;
    let result = rt.block_on(crawler.crawl(&args.url, args.depth));
    crawler.close();
    result
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    if !args.quiet {
        if env::var("RUST_LOG").is_err() {
            env::set_var("RUST_LOG", "webcrawler=warn");
        }
        env_logger::init();
    }

    let result = crawl(&args)?;
    for url in &result.downloaded {
        println!("{url}");
    }
    for (url, err) in &result.errors {
        eprintln!("{url}: {err}");
    }
    Ok(())
}
