use lazy_static::lazy_static;
use reqwest::header::USER_AGENT;
use scraper::{Html, Selector};
use url::Url;

use crate::downloader::{Downloader, Page};

lazy_static! {
    static ref HTTP_CLI: reqwest::Client = reqwest::ClientBuilder::new()
        .gzip(true)
        .deflate(true)
        .build()
        .unwrap();
    static ref LINK_SELECTOR: Selector = Selector::parse("a[href]").unwrap();
}

/// [`Downloader`] backed by a shared reqwest client.
#[derive(Debug, Clone)]
pub struct HttpDownloader {
    user_agent: String,
}

impl HttpDownloader {
    pub fn new(user_agent: impl Into<String>) -> Self {
        Self {
            user_agent: user_agent.into(),
        }
    }
}

impl Default for HttpDownloader {
    fn default() -> Self {
        Self::new(concat!("webcrawler/", env!("CARGO_PKG_VERSION")))
    }
}

impl Downloader for HttpDownloader {
    type Page = HtmlPage;

    async fn fetch(&self, url: &str) -> anyhow::Result<HtmlPage> {
        let base = Url::parse(url)?;
        let resp = HTTP_CLI
            .get(url)
            .header(USER_AGENT, &self.user_agent)
            .send()
            .await?
            .error_for_status()?;
        let body = resp.text().await?;
        Ok(HtmlPage { base, body })
    }
}

/// A fetched HTML page. Link extraction collects `a[href]` values and
/// resolves them against the page URL.
#[derive(Debug, Clone)]
pub struct HtmlPage {
    base: Url,
    body: String,
}

impl Page for HtmlPage {
    fn links(&self) -> anyhow::Result<Vec<String>> {
        let document = Html::parse_document(&self.body);
        let mut links = Vec::new();
        for element in document.select(&LINK_SELECTOR) {
            if let Some(href) = element.value().attr("href") {
                if let Some(link) = resolve_link(&self.base, href) {
                    links.push(link);
                }
            }
        }
        Ok(links)
    }
}

fn resolve_link(base: &Url, href: &str) -> Option<String> {
    // Anchors and non-navigational schemes are not crawlable.
    if href.starts_with('#')
        || href.starts_with("mailto:")
        || href.starts_with("tel:")
        || href.starts_with("javascript:")
    {
        return None;
    }
    let resolved = base.join(href).ok()?;
    match resolved.scheme() {
        "http" | "https" => Some(resolved.to_string()),
        _ => None,
    }
}
