//! Search dispatch for "how do I ..." help.
//!
//! A thin facade over a video-search and a web-search provider. Provider
//! failures are soft: [`SearchDispatch`] logs them and reports "no result",
//! leaving the fallback order to the caller.

mod providers;

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{info, warn};

use souschef_shared::{Result, SearchOptions};

pub use providers::{DuckDuckGoSearch, YouTubeSearch};

/// Top result of a search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchHit {
    pub title: Option<String>,
    /// Display URL.
    pub url: String,
}

/// A free-text search backend returning at most one top result.
#[async_trait]
pub trait SearchProvider: Send + Sync {
    /// Provider name for tracing.
    fn name(&self) -> &str;

    async fn search(&self, query: &str) -> Result<Option<SearchHit>>;
}

/// Video provider plus web provider, with the shared query suffix applied.
pub struct SearchDispatch {
    video: Arc<dyn SearchProvider>,
    web: Arc<dyn SearchProvider>,
    query_suffix: String,
}

impl SearchDispatch {
    pub fn new(
        video: Arc<dyn SearchProvider>,
        web: Arc<dyn SearchProvider>,
        query_suffix: impl Into<String>,
    ) -> Self {
        Self {
            video,
            web,
            query_suffix: query_suffix.into(),
        }
    }

    /// YouTube for video, DuckDuckGo for web.
    pub fn from_options(opts: &SearchOptions) -> Result<Self> {
        let video = YouTubeSearch::new(&opts.video_base_url, opts.timeout)?;
        let web = DuckDuckGoSearch::new(&opts.web_base_url, opts.timeout)?;
        Ok(Self::new(Arc::new(video), Arc::new(web), opts.query_suffix.clone()))
    }

    pub async fn video(&self, query: &str) -> Option<SearchHit> {
        self.soft(self.video.as_ref(), query).await
    }

    pub async fn web(&self, query: &str) -> Option<SearchHit> {
        self.soft(self.web.as_ref(), query).await
    }

    async fn soft(&self, provider: &dyn SearchProvider, query: &str) -> Option<SearchHit> {
        let full = format!("{query}{}", self.query_suffix);
        match provider.search(&full).await {
            Ok(Some(hit)) => {
                info!(provider = provider.name(), url = %hit.url, "search hit");
                Some(hit)
            }
            Ok(None) => {
                info!(provider = provider.name(), "search returned nothing");
                None
            }
            Err(e) => {
                warn!(provider = provider.name(), error = %e, "search unavailable");
                None
            }
        }
    }
}
