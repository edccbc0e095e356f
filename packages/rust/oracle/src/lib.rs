//! Lexical oracle client: "is X a food", "is X a verb", "is X used to cook".
//!
//! Every question goes through [`OracleClient`], which checks the static
//! [`Lexicon`] first, then a `(term, relation)` cache, and only then the
//! backing [`LexicalOracle`] (normally [`ConceptNetOracle`]). Backend
//! failures are soft: the client logs them and answers "no match" so that
//! extraction can continue with its fallback.

mod conceptnet;
mod lexicon;

use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use tracing::{debug, warn};

use souschef_shared::Result;

pub use conceptnet::{ConceptNetOracle, Edge, EdgeNode, edge_matches};
pub use lexicon::Lexicon;

// ---------------------------------------------------------------------------
// Query vocabulary
// ---------------------------------------------------------------------------

/// Relation asked of the oracle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Relation {
    /// `isa → food`
    IsFood,
    /// Used as a verb (manner-of check).
    IsVerb,
    /// `usedfor → cook`
    UsedForCooking,
}

/// A queried term: one literal word, or a modifier/head pair checked as a compound.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Term {
    Word(String),
    Pair { modifier: String, head: String },
}

impl Term {
    pub fn word(word: impl Into<String>) -> Self {
        Self::Word(word.into())
    }

    pub fn pair(modifier: impl Into<String>, head: impl Into<String>) -> Self {
        Self::Pair {
            modifier: modifier.into(),
            head: head.into(),
        }
    }

    /// Lookup key: lowercase, underscore-joined (`ground_beef`).
    pub fn key(&self) -> String {
        self.phrase().to_lowercase().replace(' ', "_")
    }

    /// Human-readable form (`ground beef`).
    pub fn phrase(&self) -> String {
        match self {
            Self::Word(w) => w.trim().to_string(),
            Self::Pair { modifier, head } => format!("{} {}", modifier.trim(), head.trim()),
        }
    }
}

/// Answer to one oracle query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OracleMatch {
    pub matched: bool,
    /// The matched phrase, when there was a match.
    pub phrase: Option<String>,
}

impl OracleMatch {
    pub fn found(phrase: impl Into<String>) -> Self {
        Self {
            matched: true,
            phrase: Some(phrase.into()),
        }
    }

    pub fn none() -> Self {
        Self {
            matched: false,
            phrase: None,
        }
    }
}

/// A read-only relation service. Queries must be idempotent.
#[async_trait]
pub trait LexicalOracle: Send + Sync {
    async fn query(&self, term: &Term, relation: Relation) -> Result<OracleMatch>;
}

// ---------------------------------------------------------------------------
// OracleClient
// ---------------------------------------------------------------------------

/// Allow-list, cache and soft-fail policy in front of a [`LexicalOracle`].
pub struct OracleClient {
    lexicon: Lexicon,
    backend: Arc<dyn LexicalOracle>,
    cache: DashMap<(String, Relation), OracleMatch>,
}

impl OracleClient {
    pub fn new(lexicon: Lexicon, backend: Arc<dyn LexicalOracle>) -> Self {
        Self {
            lexicon,
            backend,
            cache: DashMap::new(),
        }
    }

    /// Answer from the allow-list, the cache, or the backend, in that order.
    /// Only successful backend answers are cached.
    pub async fn query(&self, term: &Term, relation: Relation) -> Result<OracleMatch> {
        if let Some(hit) = self.allow_listed(term, relation) {
            return Ok(hit);
        }

        let cache_key = (term.key(), relation);
        if let Some(cached) = self.cache.get(&cache_key) {
            debug!(key = %cache_key.0, ?relation, "oracle cache hit");
            return Ok(cached.clone());
        }

        let answer = self.backend.query(term, relation).await?;
        self.cache.insert(cache_key, answer.clone());
        Ok(answer)
    }

    pub async fn is_food(&self, word: &str) -> bool {
        self.soft(&Term::word(word), Relation::IsFood).await.matched
    }

    pub async fn is_action(&self, word: &str) -> bool {
        self.soft(&Term::word(word), Relation::IsVerb).await.matched
    }

    pub async fn used_for_cooking(&self, word: &str) -> bool {
        self.soft(&Term::word(word), Relation::UsedForCooking)
            .await
            .matched
    }

    /// `Some("ground beef")` when `modifier head` is itself a food.
    pub async fn compound_food(&self, modifier: &str, head: &str) -> Option<String> {
        let term = Term::pair(modifier, head);
        let answer = self.soft(&term, Relation::IsFood).await;
        answer.matched.then(|| answer.phrase.unwrap_or_else(|| term.phrase()))
    }

    /// Number of cached backend answers.
    pub fn cached(&self) -> usize {
        self.cache.len()
    }

    fn allow_listed(&self, term: &Term, relation: Relation) -> Option<OracleMatch> {
        let listed = match (relation, term) {
            (Relation::IsFood, _) => self.lexicon.is_known_food(&term.phrase()),
            (Relation::IsVerb, Term::Word(w)) => self.lexicon.is_known_cooking_verb(w),
            _ => false,
        };
        listed.then(|| OracleMatch::found(term.phrase()))
    }

    async fn soft(&self, term: &Term, relation: Relation) -> OracleMatch {
        match self.query(term, relation).await {
            Ok(answer) => answer,
            Err(e) => {
                warn!(key = %term.key(), ?relation, error = %e, "oracle unavailable, treating as no match");
                OracleMatch::none()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use souschef_shared::SousChefError;

    /// Scripted backend: answers from a map, fails for keys in `failing`.
    #[derive(Default)]
    struct ScriptedOracle {
        answers: HashMap<(String, Relation), bool>,
        failing: Vec<String>,
        calls: AtomicUsize,
    }

    impl ScriptedOracle {
        fn with(mut self, key: &str, relation: Relation) -> Self {
            self.answers.insert((key.into(), relation), true);
            self
        }
    }

    #[async_trait]
    impl LexicalOracle for ScriptedOracle {
        async fn query(&self, term: &Term, relation: Relation) -> Result<OracleMatch> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let key = term.key();
            if self.failing.contains(&key) {
                return Err(SousChefError::Oracle(format!("{key}: timed out")));
            }
            Ok(match self.answers.get(&(key, relation)) {
                Some(true) => OracleMatch::found(term.phrase()),
                _ => OracleMatch::none(),
            })
        }
    }

    fn client(backend: Arc<ScriptedOracle>) -> OracleClient {
        OracleClient::new(Lexicon::default(), backend)
    }

    #[test]
    fn term_keys_are_underscore_joined() {
        assert_eq!(Term::pair("Ground", "Beef").key(), "ground_beef");
        assert_eq!(Term::pair("ground", "chicken broth").key(), "ground_chicken_broth");
        assert_eq!(Term::word("Skillet").key(), "skillet");
        assert_eq!(Term::pair("Ground", "Beef").phrase(), "Ground Beef");
    }

    #[tokio::test]
    async fn allow_list_short_circuits_backend() {
        let backend = Arc::new(ScriptedOracle::default());
        let oracle = client(backend.clone());

        assert!(oracle.is_food("Beef").await);
        assert!(oracle.is_action("place").await);
        assert_eq!(
            oracle.compound_food("soy", "sauce").await.as_deref(),
            Some("soy sauce")
        );
        assert_eq!(backend.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn repeated_queries_hit_the_cache() {
        let backend = Arc::new(ScriptedOracle::default().with("stir", Relation::IsVerb));
        let oracle = client(backend.clone());

        assert!(oracle.is_action("stir").await);
        assert!(oracle.is_action("Stir").await);
        assert!(!oracle.is_food("stir").await);

        // One call per distinct (term, relation).
        assert_eq!(backend.calls.load(Ordering::SeqCst), 2);
        assert_eq!(oracle.cached(), 2);
    }

    #[tokio::test]
    async fn failures_soft_fail_and_are_not_cached() {
        let backend = Arc::new(ScriptedOracle {
            failing: vec!["skillet".into()],
            ..Default::default()
        });
        let oracle = client(backend.clone());

        assert!(!oracle.used_for_cooking("skillet").await);
        assert!(!oracle.used_for_cooking("skillet").await);
        assert_eq!(backend.calls.load(Ordering::SeqCst), 2);
        assert_eq!(oracle.cached(), 0);

        let err = oracle
            .query(&Term::word("skillet"), Relation::UsedForCooking)
            .await
            .unwrap_err();
        assert!(matches!(err, SousChefError::Oracle(_)));
    }

    #[tokio::test]
    async fn compound_food_uses_backend_for_unknown_pairs() {
        let backend = Arc::new(ScriptedOracle::default().with("ground_beef", Relation::IsFood));
        let oracle = client(backend);

        assert_eq!(
            oracle.compound_food("ground", "beef").await.as_deref(),
            Some("ground beef")
        );
        assert_eq!(oracle.compound_food("lean", "beef").await, None);
    }
}
