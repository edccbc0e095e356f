//! ConceptNet-backed [`LexicalOracle`].
//!
//! Looks up `/c/en/<key>` and scans the returned edges. An edge id has the
//! shape `/a/[/r/IsA/,/c/en/ground_beef/n/,/c/en/food/]`: relation, subject
//! and object segments separated by commas.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, instrument};
use url::Url;

use souschef_shared::{OracleOptions, Result, SousChefError};

use crate::{LexicalOracle, OracleMatch, Relation, Term};

/// User-Agent string for oracle requests.
const USER_AGENT: &str = concat!("Sous-chef/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Deserialize)]
struct EdgePage {
    #[serde(default)]
    edges: Vec<Edge>,
}

/// One relation edge as returned by the API.
#[derive(Debug, Clone, Deserialize)]
pub struct Edge {
    #[serde(rename = "@id")]
    pub id: String,
    #[serde(default)]
    pub end: Option<EdgeNode>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EdgeNode {
    #[serde(default)]
    pub label: String,
}

/// Oracle client for a ConceptNet-compatible HTTP API.
pub struct ConceptNetOracle {
    client: Client,
    base_url: Url,
    limit: u32,
}

impl ConceptNetOracle {
    pub fn new(opts: &OracleOptions) -> Result<Self> {
        let base_url = Url::parse(&opts.base_url).map_err(|e| {
            SousChefError::config(format!("invalid oracle base_url '{}': {e}", opts.base_url))
        })?;
        if base_url.cannot_be_a_base() {
            return Err(SousChefError::config(format!(
                "oracle base_url '{base_url}' cannot carry a path"
            )));
        }

        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(opts.timeout)
            .build()
            .map_err(|e| SousChefError::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url,
            limit: opts.limit,
        })
    }

    fn concept_url(&self, key: &str) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().extend(["c", "en", key]);
        }
        url
    }

    async fn fetch_edges(&self, key: &str) -> Result<Vec<Edge>> {
        let url = self.concept_url(key);
        let response = self
            .client
            .get(url.as_str())
            .query(&[("offset", "0".to_string()), ("limit", self.limit.to_string())])
            .send()
            .await
            .map_err(|e| SousChefError::Oracle(format!("{url}: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(SousChefError::Oracle(format!("{url}: HTTP {status}")));
        }

        let page: EdgePage = response
            .json()
            .await
            .map_err(|e| SousChefError::Oracle(format!("{url}: malformed edge list: {e}")))?;
        Ok(page.edges)
    }
}

#[async_trait]
impl LexicalOracle for ConceptNetOracle {
    #[instrument(skip_all, fields(key = %term.key(), relation = ?relation))]
    async fn query(&self, term: &Term, relation: Relation) -> Result<OracleMatch> {
        let key = term.key();
        let edges = self.fetch_edges(&key).await?;
        let matched = edges.iter().any(|edge| edge_matches(edge, &key, relation));
        debug!(edges = edges.len(), matched, "oracle answered");

        Ok(if matched {
            OracleMatch::found(term.phrase())
        } else {
            OracleMatch::none()
        })
    }
}

/// Whether `edge` asserts `relation` for the concept `key`.
pub fn edge_matches(edge: &Edge, key: &str, relation: Relation) -> bool {
    let id = edge.id.to_lowercase();
    let mut segments = id.split(',');
    let (Some(rel), Some(subject), Some(object)) =
        (segments.next(), segments.next(), segments.next())
    else {
        return false;
    };
    let concept = format!("/{key}/");

    match relation {
        Relation::IsFood => {
            rel.contains("isa") && subject.contains(&concept) && object.contains("/food")
        }
        Relation::IsVerb => {
            let verb = format!("/{key}/v/");
            rel.contains("mannerof") && (subject.contains(&verb) || object.contains(&verb))
        }
        Relation::UsedForCooking => {
            let end_is_cook = match &edge.end {
                Some(node) if !node.label.is_empty() => node.label.eq_ignore_ascii_case("cook"),
                _ => object.contains("/cook/"),
            };
            rel.contains("usedfor") && subject.contains(&concept) && end_is_cook
        }
    }
}
