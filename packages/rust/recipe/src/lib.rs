//! Recipe document providers.
//!
//! This crate provides:
//! - [`RecipeSource`]: the seam the CLI loads a [`RecipeDocument`] through
//! - [`RecipeFetcher`]: HTTP fetch + adapter-based HTML extraction
//! - [`JsonFileSource`]: a recipe saved as `{name, ingredients, instructions}` JSON
//! - [`adapters`]: JSON-LD, microdata and generic extractors

pub mod adapters;

use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use scraper::Html;
use tracing::{info, instrument};
use url::Url;

use souschef_shared::{RecipeDocument, Result, SousChefError};

pub use adapters::{AdapterRegistry, GenericAdapter, JsonLdAdapter, MicrodataAdapter, RecipeAdapter};

/// User-Agent string for recipe requests.
const USER_AGENT: &str = concat!("Sous-chef/", env!("CARGO_PKG_VERSION"));

/// Default timeout for fetching a recipe page.
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Maximum number of redirects to follow.
const MAX_REDIRECTS: usize = 5;

/// Anything that can produce a recipe document.
#[async_trait]
pub trait RecipeSource: Send + Sync {
    async fn load(&self) -> Result<RecipeDocument>;
}

// ---------------------------------------------------------------------------
// RecipeFetcher
// ---------------------------------------------------------------------------

/// Fetches a recipe page over HTTP and extracts it with the adapter registry.
pub struct RecipeFetcher {
    client: Client,
    registry: AdapterRegistry,
    url: Url,
}

impl RecipeFetcher {
    pub fn new(url: Url) -> Result<Self> {
        Self::with_timeout(url, Duration::from_secs(DEFAULT_TIMEOUT_SECS))
    }

    pub fn with_timeout(url: Url, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
            .timeout(timeout)
            .build()
            .map_err(|e| SousChefError::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            registry: AdapterRegistry::new(),
            url,
        })
    }

    async fn fetch_html(&self) -> Result<String> {
        let url = &self.url;
        let response = self
            .client
            .get(url.as_str())
            .send()
            .await
            .map_err(|e| SousChefError::Fetch(format!("{url}: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(SousChefError::Fetch(format!("{url}: HTTP {status}")));
        }

        response
            .text()
            .await
            .map_err(|e| SousChefError::Fetch(format!("{url}: failed to read body: {e}")))
    }
}

#[async_trait]
impl RecipeSource for RecipeFetcher {
    #[instrument(skip_all, fields(url = %self.url))]
    async fn load(&self) -> Result<RecipeDocument> {
        let html = self.fetch_html().await?;
        let recipe = extract_recipe(&self.registry, &html)
            .map_err(|e| SousChefError::Fetch(format!("{}: {e}", self.url)))?;
        Ok(recipe)
    }
}

/// Run the registry over raw HTML.
pub fn extract_recipe(registry: &AdapterRegistry, html: &str) -> Result<RecipeDocument> {
    let doc = Html::parse_document(html);
    let (recipe, adapter) = registry
        .extract(&doc)
        .ok_or_else(|| SousChefError::validation("no recipe found on page"))?;

    info!(
        adapter,
        name = %recipe.name,
        ingredients = recipe.ingredients.len(),
        instructions = recipe.instructions.len(),
        "recipe extracted"
    );
    Ok(recipe)
}

// ---------------------------------------------------------------------------
// JsonFileSource
// ---------------------------------------------------------------------------

/// A recipe stored on disk as JSON.
pub struct JsonFileSource {
    path: PathBuf,
}

impl JsonFileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl RecipeSource for JsonFileSource {
    async fn load(&self) -> Result<RecipeDocument> {
        let content = std::fs::read_to_string(&self.path)
            .map_err(|e| SousChefError::io(&self.path, e))?;
        RecipeDocument::from_json(&content)
    }
}
