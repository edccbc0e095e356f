//! HTTP search providers: a video site results page and an HTML web search.

use std::sync::LazyLock;
use std::time::Duration;

use async_trait::async_trait;
use regex::Regex;
use reqwest::Client;
use scraper::{Html, Selector};
use tracing::{debug, instrument};
use url::Url;

use souschef_shared::{Result, SousChefError};

use crate::{SearchHit, SearchProvider};

/// User-Agent string for search requests.
const USER_AGENT: &str = concat!("Mozilla/5.0 (compatible; Sous-chef/", env!("CARGO_PKG_VERSION"), ")");

fn build_client(timeout: Duration) -> Result<Client> {
    Client::builder()
        .user_agent(USER_AGENT)
        .timeout(timeout)
        .build()
        .map_err(|e| SousChefError::Network(format!("failed to build HTTP client: {e}")))
}

fn parse_base(base_url: &str) -> Result<Url> {
    Url::parse(base_url)
        .map_err(|e| SousChefError::config(format!("invalid search base URL '{base_url}': {e}")))
}

async fn get_text(client: &Client, url: Url, query: &[(&str, &str)]) -> Result<String> {
    let response = client
        .get(url.as_str())
        .query(query)
        .send()
        .await
        .map_err(|e| SousChefError::Search(format!("{url}: {e}")))?;

    let status = response.status();
    if !status.is_success() {
        return Err(SousChefError::Search(format!("{url}: HTTP {status}")));
    }

    response
        .text()
        .await
        .map_err(|e| SousChefError::Search(format!("{url}: failed to read body: {e}")))
}

// ---------------------------------------------------------------------------
// Video search
// ---------------------------------------------------------------------------

/// Scrapes the first video id out of a YouTube results page.
pub struct YouTubeSearch {
    client: Client,
    base_url: Url,
}

impl YouTubeSearch {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        Ok(Self {
            client: build_client(timeout)?,
            base_url: parse_base(base_url)?,
        })
    }
}

#[async_trait]
impl SearchProvider for YouTubeSearch {
    fn name(&self) -> &str {
        "youtube"
    }

    #[instrument(skip_all, fields(provider = "youtube"))]
    async fn search(&self, query: &str) -> Result<Option<SearchHit>> {
        let url = self
            .base_url
            .join("results")
            .map_err(|e| SousChefError::Search(e.to_string()))?;
        let body = get_text(&self.client, url, &[("search_query", query)]).await?;

        let Some(video_id) = first_video_id(&body) else {
            debug!("no video ids on results page");
            return Ok(None);
        };

        let mut watch = self
            .base_url
            .join("watch")
            .map_err(|e| SousChefError::Search(e.to_string()))?;
        watch.query_pairs_mut().append_pair("v", &video_id);

        Ok(Some(SearchHit {
            title: None,
            url: watch.to_string(),
        }))
    }
}

fn first_video_id(body: &str) -> Option<String> {
    static VIDEO_ID_RE: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(r#""videoId"\s*:\s*"([A-Za-z0-9_-]{11})""#).expect("valid regex")
    });

    VIDEO_ID_RE
        .captures(body)
        .map(|caps| caps[1].to_string())
}

// ---------------------------------------------------------------------------
// Web search
// ---------------------------------------------------------------------------

/// First organic result from DuckDuckGo's HTML endpoint.
pub struct DuckDuckGoSearch {
    client: Client,
    base_url: Url,
}

impl DuckDuckGoSearch {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        Ok(Self {
            client: build_client(timeout)?,
            base_url: parse_base(base_url)?,
        })
    }
}

#[async_trait]
impl SearchProvider for DuckDuckGoSearch {
    fn name(&self) -> &str {
        "duckduckgo"
    }

    #[instrument(skip_all, fields(provider = "duckduckgo"))]
    async fn search(&self, query: &str) -> Result<Option<SearchHit>> {
        let url = self
            .base_url
            .join("html/")
            .map_err(|e| SousChefError::Search(e.to_string()))?;
        let body = get_text(&self.client, url, &[("q", query)]).await?;
        Ok(first_web_result(&body))
    }
}

fn first_web_result(body: &str) -> Option<SearchHit> {
    let doc = Html::parse_document(body);
    let sel = Selector::parse("a.result__a").expect("valid selector");

    doc.select(&sel).find_map(|a| {
        let href = a.value().attr("href")?;
        let url = resolve_result_link(href)?;
        let title = a.text().collect::<String>().trim().to_string();
        Some(SearchHit {
            title: (!title.is_empty()).then_some(title),
            url,
        })
    })
}

/// Result links are wrapped in a redirect carrying the target in `uddg`.
fn resolve_result_link(href: &str) -> Option<String> {
    let absolute = if href.starts_with("//") {
        format!("https:{href}")
    } else {
        href.to_string()
    };
    let url = Url::parse(&absolute).ok()?;

    if let Some((_, target)) = url.query_pairs().find(|(k, _)| k == "uddg") {
        return Some(target.into_owned());
    }
    matches!(url.scheme(), "http" | "https").then(|| url.to_string())
}
