use thiserror::Error;

/// A per-URL failure recorded during a crawl.
///
/// None of these abort the crawl or other in-flight work; they only show
/// up in the `errors` table of the final [`CrawlResult`].
///
/// [`CrawlResult`]: crate::CrawlResult
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CrawlError {
    /// The URL could not be resolved to a host, nothing was fetched.
    #[error("malformed url: {0}")]
    MalformedUrl(String),

    /// The download failed, no link extraction was attempted.
    #[error("fetch failed: {0}")]
    Fetch(String),

    /// The page was fetched but its links could not be extracted. The
    /// error is keyed by the URL of the page that was being parsed.
    #[error("link extraction failed: {0}")]
    Extract(String),
}
