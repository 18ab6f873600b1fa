#[cfg(test)]
extern crate self as webcrawler;

mod barrier;
mod config;
mod crawler;
mod downloader;
mod error;
mod http;
mod throttle;

pub use config::CrawlerConfig;
pub use crawler::{CrawlResult, Crawler};
pub use downloader::{host_of, Downloader, Page};
pub use error::CrawlError;
pub use http::{HtmlPage, HttpDownloader};

pub use anyhow;

// Compiled as a unit-test module so that `impl Downloader for Arc<FakeSite>`
// is an impl of a local trait, which the orphan rule permits; as a separate
// integration-test crate the same impl is rejected (E0117).
#[cfg(test)]
#[path = "../tests/crawl.rs"]
mod crawl_tests;
