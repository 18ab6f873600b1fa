use std::future::Future;

use url::Url;

use crate::error::CrawlError;

/// A fetched page whose outbound links can be extracted.
pub trait Page: Send + 'static {
    /// Extracts the outbound absolute URLs of the page.
    fn links(&self) -> anyhow::Result<Vec<String>>;
}

/// Pluggable download capability consumed by the crawler.
///
/// Implementations must be safe to call concurrently from multiple
/// workers. See [`HttpDownloader`] for the reqwest-backed one.
///
/// [`HttpDownloader`]: crate::HttpDownloader
pub trait Downloader: Send + Sync + 'static {
    type Page: Page;

    /// Fetches a single URL.
    fn fetch(&self, url: &str) -> impl Future<Output = anyhow::Result<Self::Page>> + Send;
}

/// Resolves the host component of `url`.
pub fn host_of(url: &str) -> Result<String, CrawlError> {
    let parsed = Url::parse(url).map_err(|e| CrawlError::MalformedUrl(format!("{url}: {e}")))?;
    parsed
        .host_str()
        .map(str::to_owned)
        .ok_or_else(|| CrawlError::MalformedUrl(format!("{url}: no host")))
}
