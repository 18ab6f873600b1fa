use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use dashmap::{DashMap, DashSet};
use tokio::sync::Semaphore;

use crate::barrier::{WaveBarrier, WaveGuard};
use crate::config::CrawlerConfig;
use crate::downloader::{host_of, Downloader, Page};
use crate::error::CrawlError;
use crate::throttle::HostThrottle;

/// Outcome of a single crawl.
#[derive(Debug, Clone, Default)]
pub struct CrawlResult {
    /// Successfully downloaded URLs, in discovery order.
    pub downloaded: Vec<String>,
    /// Per-URL failures. A URL is in `downloaded` or here, never both.
    pub errors: HashMap<String, CrawlError>,
}

/// Breadth-first, depth-bounded site crawler.
///
/// Fetches a seed URL and its transitive outbound links wave by wave,
/// bounding concurrent downloads, concurrent link extractions and
/// concurrent downloads per host. Per-URL failures are recorded in the
/// result instead of aborting the crawl.
pub struct Crawler<D: Downloader> {
    inner: Arc<Inner<D>>,
}

struct Inner<D> {
    downloader: D,
    fetch_pool: Arc<Semaphore>,
    extract_pool: Arc<Semaphore>,
    hosts: HostThrottle,
    closed: AtomicBool,
}

/// State shared by all tasks of one breadth-first wave.
struct Wave {
    barrier: WaveBarrier,
    next: DashSet<String>,
}

impl<D: Downloader> Crawler<D> {
    pub fn new(downloader: D, config: &CrawlerConfig) -> Self {
        Self {
            inner: Arc::new(Inner {
                downloader,
                fetch_pool: Arc::new(Semaphore::new(config.downloaders.get())),
                extract_pool: Arc::new(Semaphore::new(config.extractors.get())),
                hosts: HostThrottle::new(config.per_host),
                closed: AtomicBool::new(false),
            }),
        }
    }

    /// Crawls `seed` and its transitive links, breadth first.
    ///
    /// `depth` is the number of waves of fetching: depth 1 fetches only
    /// the seed (its links are extracted but never fetched), depth N
    /// fetches N levels. A depth below 1 fetches nothing. Each crawl
    /// starts from empty state; URLs already seen in a previous crawl
    /// are fetched again.
    pub async fn crawl(&self, seed: &str, depth: i32) -> anyhow::Result<CrawlResult> {
        anyhow::ensure!(
            !self.inner.closed.load(Ordering::SeqCst),
            "crawler is closed"
        );

        let errors: Arc<DashMap<String, CrawlError>> = Arc::new(DashMap::new());
        let mut visited: HashSet<String> = HashSet::new();
        let mut order: Vec<String> = Vec::new();
        let mut frontier = vec![seed.to_string()];
        let mut remaining = depth;

        while remaining >= 1 && !frontier.is_empty() {
            let wave = Arc::new(Wave {
                barrier: WaveBarrier::new(),
                next: DashSet::new(),
            });
            for url in frontier.drain(..) {
                // Already-visited URLs never consume a barrier or host slot.
                if !visited.insert(url.clone()) {
                    continue;
                }
                order.push(url.clone());
                let guard = wave.barrier.enter();
                tokio::spawn(fetch_page(
                    self.inner.clone(),
                    url,
                    errors.clone(),
                    wave.clone(),
                    guard,
                ));
            }
            wave.barrier.drained().await;
            log::debug!("wave drained, discovered {} new urls", wave.next.len());
            frontier = wave.next.iter().map(|url| url.key().clone()).collect();
            remaining -= 1;
        }

        let downloaded = order
            .into_iter()
            .filter(|url| !errors.contains_key(url))
            .collect();
        let errors = errors
            .iter()
            .map(|e| (e.key().clone(), e.value().clone()))
            .collect();
        Ok(CrawlResult { downloaded, errors })
    }

    /// Shuts down both worker pools and every host gate.
    ///
    /// Idempotent. In-flight tasks finish or abandon on their next pool
    /// acquisition; later [`crawl`] calls fail.
    ///
    /// [`crawl`]: Crawler::crawl
    pub fn close(&self) {
        if !self.inner.closed.swap(true, Ordering::SeqCst) {
            self.inner.fetch_pool.close();
            self.inner.extract_pool.close();
            self.inner.hosts.close();
        }
    }
}

/// Fetch stage: one admitted URL, bounded by the downloader pool.
async fn fetch_page<D: Downloader>(
    inner: Arc<Inner<D>>,
    url: String,
    errors: Arc<DashMap<String, CrawlError>>,
    wave: Arc<Wave>,
    guard: WaveGuard,
) {
    let _exit = guard;

    let Ok(_worker) = inner.fetch_pool.clone().acquire_owned().await else {
        return;
    };
    let host = match host_of(&url) {
        Ok(host) => host,
        Err(e) => {
            log::warn!("skipping {url}: {e}");
            errors.insert(url, e);
            return;
        }
    };
    let Ok(_slot) = inner.hosts.acquire(&host).await else {
        return;
    };
    match inner.downloader.fetch(&url).await {
        Ok(page) => {
            let guard = wave.barrier.enter();
            tokio::spawn(extract_links::<D>(
                inner.clone(),
                url,
                page,
                errors,
                wave.clone(),
                guard,
            ));
        }
        Err(e) => {
            log::warn!("fetch failed for {url}: {e:#}");
            errors.insert(url, CrawlError::Fetch(format!("{e:#}")));
        }
    }
    // The host slot is released here, independent of the extraction.
}

/// Extraction stage: one fetched page, bounded by the extractor pool.
async fn extract_links<D: Downloader>(
    inner: Arc<Inner<D>>,
    url: String,
    page: D::Page,
    errors: Arc<DashMap<String, CrawlError>>,
    wave: Arc<Wave>,
    guard: WaveGuard,
) {
    let _exit = guard;

    let Ok(_worker) = inner.extract_pool.clone().acquire_owned().await else {
        return;
    };
    match page.links() {
        Ok(links) => {
            for link in links {
                wave.next.insert(link);
            }
        }
        Err(e) => {
            log::warn!("link extraction failed for {url}: {e:#}");
            errors.insert(url, CrawlError::Extract(format!("{e:#}")));
        }
    }
}
