use std::cmp;
use std::num::NonZeroUsize;

use serde::{Deserialize, Serialize};

/// Crawler sizing knobs. All values are fixed at construction time,
/// there is no dynamic reconfiguration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CrawlerConfig {
    /// Maximum number of concurrent page downloads
    #[serde(default = "default_downloaders")]
    pub downloaders: NonZeroUsize,

    /// Maximum number of concurrent link extractions
    #[serde(default = "default_extractors")]
    pub extractors: NonZeroUsize,

    /// Maximum number of concurrent downloads against a single host
    #[serde(default = "default_per_host")]
    pub per_host: NonZeroUsize,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            downloaders: default_downloaders(),
            extractors: default_extractors(),
            per_host: default_per_host(),
        }
    }
}

fn default_downloaders() -> NonZeroUsize {
    cmp::max(1, num_cpus::get()).try_into().unwrap()
}

fn default_extractors() -> NonZeroUsize {
    cmp::max(1, num_cpus::get().saturating_sub(2)).try_into().unwrap()
}

fn default_per_host() -> NonZeroUsize {
    4.try_into().unwrap()
}
