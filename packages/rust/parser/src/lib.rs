//! Parse-tree provider capability.
//!
//! Sous-chef never tags or parses text itself. A dependency parser (for
//! example a spaCy model behind a small HTTP service) turns each sentence
//! into tokens carrying a dependency label and a head index. This crate
//! defines the [`DependencyParser`] seam and an HTTP client for it.
//!
//! Wire format: `POST <endpoint>` with `{"text": "...", "model": "..."}`,
//! answered by `{"tokens": [{"text": "2", "dep": "nummod", "head": 1}, ...]}`.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use souschef_shared::{ParseTree, ParsedToken, ParserOptions, Result, SousChefError};

/// User-Agent string for parse requests.
const USER_AGENT: &str = concat!("Sous-chef/", env!("CARGO_PKG_VERSION"));

/// Turns one sentence into a dependency tree.
#[async_trait]
pub trait DependencyParser: Send + Sync {
    async fn parse(&self, sentence: &str) -> Result<ParseTree>;
}

#[derive(Debug, Serialize)]
struct ParseRequest<'a> {
    text: &'a str,
    model: &'a str,
}

#[derive(Debug, Deserialize)]
struct ParseResponse {
    tokens: Vec<ParsedToken>,
}

/// [`DependencyParser`] backed by an HTTP parse service.
pub struct HttpDependencyParser {
    client: Client,
    endpoint: String,
    model: String,
}

impl HttpDependencyParser {
    pub fn new(opts: &ParserOptions) -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(opts.timeout)
            .build()
            .map_err(|e| SousChefError::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            endpoint: opts.endpoint.clone(),
            model: opts.model.clone(),
        })
    }
}

#[async_trait]
impl DependencyParser for HttpDependencyParser {
    #[instrument(skip_all, fields(endpoint = %self.endpoint))]
    async fn parse(&self, sentence: &str) -> Result<ParseTree> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(&ParseRequest {
                text: sentence,
                model: &self.model,
            })
            .send()
            .await
            .map_err(|e| SousChefError::parse(format!("{}: {e}", self.endpoint)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(SousChefError::parse(format!(
                "{}: HTTP {status}",
                self.endpoint
            )));
        }

        let body: ParseResponse = response
            .json()
            .await
            .map_err(|e| SousChefError::parse(format!("malformed parse response: {e}")))?;

        debug!(tokens = body.tokens.len(), "sentence parsed");
        ParseTree::new(body.tokens)
    }
}
