//! End-to-end cooking session: recipe → predicates → conversation.

use std::time::Instant;

use tracing::{info, instrument};

use souschef_search::SearchDispatch;
use souschef_shared::{RecipeDocument, RecipePredicates, Result, SessionId};

use crate::extract::Extractor;
use crate::intent::IntentClassifier;
use crate::navigator::{Console, Navigator};

/// Which list a line belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    Ingredient,
    Instruction,
}

/// Progress callback for reporting extraction status.
pub trait ProgressReporter: Send + Sync {
    /// Called when entering a new phase.
    fn phase(&self, name: &str);
    /// Called after each line is turned into a predicate.
    fn line_extracted(&self, kind: LineKind, current: usize, total: usize);
    /// Called when the session is ready to converse.
    fn done(&self, session: &Session);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn phase(&self, _name: &str) {}
    fn line_extracted(&self, _kind: LineKind, _current: usize, _total: usize) {}
    fn done(&self, _session: &Session) {}
}

/// A recipe with its extracted predicates, ready for conversation.
#[derive(Debug)]
pub struct Session {
    id: SessionId,
    recipe: RecipeDocument,
    predicates: RecipePredicates,
}

impl Session {
    /// Extract the recipe's predicates. A recipe without steps is accepted.
    #[instrument(skip_all, fields(recipe = %recipe.name))]
    pub async fn prepare(
        recipe: RecipeDocument,
        extractor: &Extractor,
        progress: &dyn ProgressReporter,
    ) -> Result<Self> {
        let start = Instant::now();
        let id = SessionId::new();

        info!(%id, steps = recipe.instructions.len(), "preparing session");
        let predicates = extractor.extract(&recipe, progress).await?;

        let session = Self {
            id,
            recipe,
            predicates,
        };
        info!(id = %session.id, elapsed_ms = start.elapsed().as_millis() as u64, "session ready");
        progress.done(&session);
        Ok(session)
    }

    pub fn id(&self) -> &SessionId {
        &self.id
    }

    pub fn recipe(&self) -> &RecipeDocument {
        &self.recipe
    }

    pub fn predicates(&self) -> &RecipePredicates {
        &self.predicates
    }

    /// Greet the user and run the navigator until they are done.
    #[instrument(skip_all, fields(session = %self.id))]
    pub async fn converse(
        &self,
        search: &SearchDispatch,
        classifier: IntentClassifier,
        console: &mut dyn Console,
    ) -> Result<()> {
        console.say(&format!(
            "Thanks so much for your patience! We'll be working with {}.",
            self.recipe.name
        ));
        Navigator::new(&self.predicates, search, classifier)
            .run(console)
            .await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use souschef_oracle::{Lexicon, LexicalOracle, OracleClient, OracleMatch, Relation, Term};
    use souschef_parser::DependencyParser;
    use souschef_search::{SearchHit, SearchProvider};
    use souschef_shared::{ParseTree, ParsedToken, SousChefError};

    use super::*;

    /// Treats every sentence as a flat list of words under the first one.
    struct FlatParser;

    #[async_trait]
    impl DependencyParser for FlatParser {
        async fn parse(&self, sentence: &str) -> Result<ParseTree> {
            let tokens = sentence
                .split_whitespace()
                .enumerate()
                .map(|(i, word)| ParsedToken::new(word, if i == 0 { "ROOT" } else { "dep" }, 0))
                .collect();
            ParseTree::new(tokens)
        }
    }

    struct NoOracle;

    #[async_trait]
    impl LexicalOracle for NoOracle {
        async fn query(&self, _term: &Term, _relation: Relation) -> Result<OracleMatch> {
            Ok(OracleMatch::none())
        }
    }

    struct NoSearch;

    #[async_trait]
    impl SearchProvider for NoSearch {
        fn name(&self) -> &str {
            "none"
        }

        async fn search(&self, _query: &str) -> Result<Option<SearchHit>> {
            Ok(None)
        }
    }

    #[derive(Default)]
    struct CountingProgress {
        lines: AtomicUsize,
        done: AtomicUsize,
    }

    impl ProgressReporter for CountingProgress {
        fn phase(&self, _name: &str) {}
        fn line_extracted(&self, _kind: LineKind, _current: usize, _total: usize) {
            self.lines.fetch_add(1, Ordering::SeqCst);
        }
        fn done(&self, _session: &Session) {
            self.done.fetch_add(1, Ordering::SeqCst);
        }
    }

    struct Replay(Vec<&'static str>, Vec<String>);

    impl Console for Replay {
        fn say(&mut self, text: &str) {
            self.1.push(text.to_string());
        }
        fn ask(&mut self, _prompt: &str) -> Result<String> {
            if self.0.is_empty() {
                return Err(SousChefError::InputClosed);
            }
            Ok(self.0.remove(0).to_string())
        }
    }

    fn extractor() -> Extractor {
        let oracle = OracleClient::new(Lexicon::default(), Arc::new(NoOracle));
        Extractor::new(Arc::new(FlatParser), Arc::new(oracle))
    }

    fn recipe() -> RecipeDocument {
        RecipeDocument::new(
            "Toast",
            vec!["2 slices bread".to_string(), "butter".to_string()],
            vec!["Toast the bread.".to_string(), "Spread the butter.".to_string()],
        )
    }

    #[tokio::test]
    async fn prepare_reports_every_line() {
        let progress = CountingProgress::default();
        let session = Session::prepare(recipe(), &extractor(), &progress).await.unwrap();

        assert_eq!(session.predicates().ingredients.len(), 2);
        assert_eq!(session.predicates().total_steps(), 2);
        assert_eq!(session.predicates().ingredients[1].isa, "butter");
        assert_eq!(progress.lines.load(Ordering::SeqCst), 4);
        assert_eq!(progress.done.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn recipe_without_steps_goes_straight_to_farewell() {
        let recipe = RecipeDocument::new("Nothing", vec!["salt".to_string()], Vec::<String>::new());
        let progress = CountingProgress::default();
        let session = Session::prepare(recipe, &extractor(), &progress).await.unwrap();
        assert_eq!(session.predicates().total_steps(), 0);
        assert_eq!(progress.lines.load(Ordering::SeqCst), 1);
        assert_eq!(progress.done.load(Ordering::SeqCst), 1);

        let search = SearchDispatch::new(Arc::new(NoSearch), Arc::new(NoSearch), "");
        // No replies queued: any prompt would end the session with InputClosed.
        let mut console = Replay(Vec::new(), Vec::new());
        session
            .converse(&search, IntentClassifier::default(), &mut console)
            .await
            .unwrap();

        assert!(console.1[0].contains("We'll be working with Nothing."));
        assert!(console.1.last().unwrap().contains("enjoy your food"));
    }

    #[tokio::test]
    async fn converse_greets_and_finishes() {
        let session = Session::prepare(recipe(), &extractor(), &SilentProgress)
            .await
            .unwrap();
        let search = SearchDispatch::new(Arc::new(NoSearch), Arc::new(NoSearch), "");
        let mut console = Replay(vec!["2", "next", "next"], Vec::new());

        session
            .converse(&search, IntentClassifier::default(), &mut console)
            .await
            .unwrap();

        assert!(console.1[0].contains("We'll be working with Toast."));
        assert!(console.1.iter().any(|l| l.contains("The 2nd step is: Spread the butter.")));
        assert!(console.1.last().unwrap().contains("enjoy your food"));
    }
}
