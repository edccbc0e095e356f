//! Predicate extraction: dependency parse + lexical oracle → structured facts.
//!
//! Every ingredient line becomes an [`IngredientPredicate`] and every
//! instruction line an [`InstructionPredicate`]. Lines are processed with
//! bounded concurrency but results keep source order.

use std::pin::pin;
use std::sync::Arc;

use futures::{StreamExt, stream};
use tracing::{debug, info, instrument};

use souschef_oracle::OracleClient;
use souschef_parser::DependencyParser;
use souschef_shared::{
    IngredientPredicate, InstructionPredicate, ParseTree, PredicateKey, RecipeDocument,
    RecipePredicates, Result,
};

use crate::session::{LineKind, ProgressReporter};

/// Head nouns that only make sense together with the word before them
/// ("chicken broth", "pork loin").
pub const PAIRED_TERMS: &[&str] = &[
    "stock",
    "broth",
    "sauce",
    "loin",
    "tenderloin",
    "sirloin",
    "breast",
];

/// Stands in for a promoted compound phrase inside `IngredientPredicate::sentence`.
pub const MERGED_PLACEHOLDER: &str = "isa";

/// Default number of lines in flight at once.
pub const DEFAULT_CONCURRENCY: usize = 8;

/// Turns recipe lines into predicates.
pub struct Extractor {
    parser: Arc<dyn DependencyParser>,
    oracle: Arc<OracleClient>,
    concurrency: usize,
}

impl Extractor {
    pub fn new(parser: Arc<dyn DependencyParser>, oracle: Arc<OracleClient>) -> Self {
        Self {
            parser,
            oracle,
            concurrency: DEFAULT_CONCURRENCY,
        }
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Extract predicates for every line of `doc`.
    ///
    /// Oracle outages degrade to "no match" and never fail the run. A parser
    /// failure does, since there is no tree to walk.
    #[instrument(skip_all, fields(recipe = %doc.name))]
    pub async fn extract(
        &self,
        doc: &RecipeDocument,
        progress: &dyn ProgressReporter,
    ) -> Result<RecipePredicates> {
        progress.phase("Reading ingredients");
        let ingredients = self
            .run_ordered(&doc.ingredients, LineKind::Ingredient, progress, |i, line| {
                self.extract_ingredient(i, line)
            })
            .await?;

        progress.phase("Reading instructions");
        let instructions = self
            .run_ordered(&doc.instructions, LineKind::Instruction, progress, |i, line| {
                self.extract_instruction(i, line)
            })
            .await?;

        info!(
            ingredients = ingredients.len(),
            instructions = instructions.len(),
            cached = self.oracle.cached(),
            "predicates extracted"
        );

        Ok(RecipePredicates {
            ingredients,
            instructions,
        })
    }

    async fn run_ordered<'a, T, F, Fut>(
        &self,
        lines: &'a [String],
        kind: LineKind,
        progress: &dyn ProgressReporter,
        extract_line: F,
    ) -> Result<Vec<T>>
    where
        F: Fn(usize, &'a str) -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let total = lines.len();
        let mut results = pin!(
            stream::iter(lines.iter().enumerate())
                .map(|(i, line)| extract_line(i, line.as_str()))
                .buffered(self.concurrency)
        );

        let mut out = Vec::with_capacity(total);
        while let Some(result) = results.next().await {
            out.push(result?);
            progress.line_extracted(kind, out.len(), total);
        }
        Ok(out)
    }

    /// Build the predicate for ingredient line `index`.
    #[instrument(skip(self, line))]
    pub async fn extract_ingredient(&self, index: usize, line: &str) -> Result<IngredientPredicate> {
        let tree = self.parser.parse(line).await?;
        let Some(root) = tree.root() else {
            debug!("empty parse, keeping the whole line");
            let term = line.trim().to_string();
            return Ok(IngredientPredicate {
                key: PredicateKey {
                    term: term.clone(),
                    source_index: index,
                },
                isa: term,
                quantity: None,
                measurement: None,
                sentence: line.to_string(),
                line: line.to_string(),
            });
        };

        let resolved = self.resolve(&tree, root, LineKind::Ingredient).await;
        let mut term = tree.text(resolved).to_string();
        if resolved > 0 && is_paired(&term) {
            term = format!("{} {term}", tree.text(resolved - 1));
        }

        let mut isa = term.clone();
        let mut sentence = line.to_string();
        let mut quantity = None;
        let mut measurement = None;

        for child in tree.children(root) {
            let child_text = tree.text(child);
            if is_wordlike(child_text)
                && self
                    .oracle
                    .compound_food(&child_text.to_lowercase(), &term.to_lowercase())
                    .await
                    .is_some()
            {
                let merged = format!("{child_text} {term}");
                sentence = sentence.replace(&merged, MERGED_PLACEHOLDER);
                isa = merged;
            }

            for grandchild in tree.children(child) {
                let amount = tree.text(grandchild);
                if is_number(amount) {
                    quantity = amount.parse::<f64>().ok();
                    measurement = Some(child_text.to_string());
                }
            }
        }

        debug!(%isa, ?quantity, ?measurement, "ingredient resolved");
        Ok(IngredientPredicate {
            key: PredicateKey {
                term,
                source_index: index,
            },
            isa,
            quantity,
            measurement,
            sentence,
            line: line.to_string(),
        })
    }

    /// Build the predicate for instruction line `index`.
    #[instrument(skip(self, line))]
    pub async fn extract_instruction(
        &self,
        index: usize,
        line: &str,
    ) -> Result<InstructionPredicate> {
        let tree = self.parser.parse(line).await?;
        let Some(root) = tree.root() else {
            debug!("empty parse, keeping the whole line");
            return Ok(InstructionPredicate {
                step_index: index,
                primary_method: line.trim().to_string(),
                tool_for: None,
                sentence: line.to_string(),
            });
        };

        let resolved = self.resolve(&tree, root, LineKind::Instruction).await;
        let primary_method = tree.text(resolved).to_string();

        let mut tool_for = None;
        for child in tree.children(root) {
            let child_text = tree.text(child);
            if is_wordlike(child_text) && self.oracle.used_for_cooking(child_text).await {
                tool_for = Some(child_text.to_string());
            }
        }

        debug!(%primary_method, ?tool_for, "instruction resolved");
        Ok(InstructionPredicate {
            step_index: index,
            primary_method,
            tool_for,
            sentence: line.to_string(),
        })
    }

    /// The root if it classifies, else the first token that does, else the root anyway.
    async fn resolve(&self, tree: &ParseTree, root: usize, kind: LineKind) -> usize {
        if self.classify(tree.text(root), kind).await {
            return root;
        }

        for index in (0..tree.len()).filter(|&i| i != root) {
            let text = tree.text(index);
            if is_wordlike(text) && self.classify(text, kind).await {
                debug!(root = tree.text(root), chosen = text, "root replaced by scan");
                return index;
            }
        }

        debug!(root = tree.text(root), "no token classified, keeping syntactic root");
        root
    }

    async fn classify(&self, word: &str, kind: LineKind) -> bool {
        match kind {
            LineKind::Ingredient => self.oracle.is_food(&word.to_lowercase()).await,
            LineKind::Instruction => self.oracle.is_action(word).await,
        }
    }
}

fn is_paired(term: &str) -> bool {
    PAIRED_TERMS.iter().any(|p| term.eq_ignore_ascii_case(p))
}

fn is_wordlike(text: &str) -> bool {
    text.chars().any(char::is_alphabetic)
}

fn is_number(text: &str) -> bool {
    !text.is_empty() && text.chars().all(|c| c.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use std::collections::{HashMap, HashSet};
    use std::sync::Mutex;

    use async_trait::async_trait;
    use souschef_oracle::{Lexicon, LexicalOracle, OracleMatch, Relation, Term};
    use souschef_shared::{ParsedToken, SousChefError};

    use super::*;
    use crate::session::SilentProgress;

    /// Parser returning canned trees keyed by sentence.
    #[derive(Default)]
    struct ScriptedParser {
        trees: HashMap<String, Vec<(&'static str, &'static str, usize)>>,
    }

    impl ScriptedParser {
        fn with(mut self, sentence: &str, tokens: Vec<(&'static str, &'static str, usize)>) -> Self {
            self.trees.insert(sentence.to_string(), tokens);
            self
        }
    }

    #[async_trait]
    impl DependencyParser for ScriptedParser {
        async fn parse(&self, sentence: &str) -> Result<ParseTree> {
            let tokens = self
                .trees
                .get(sentence)
                .ok_or_else(|| SousChefError::parse(format!("no tree for {sentence:?}")))?;
            ParseTree::new(
                tokens
                    .iter()
                    .map(|(text, dep, head)| ParsedToken::new(*text, *dep, *head))
                    .collect(),
            )
        }
    }

    /// Oracle answering yes for listed `(key, relation)` pairs and counting calls.
    #[derive(Default)]
    struct ScriptedOracle {
        yes: HashSet<(String, Relation)>,
        calls: Mutex<Vec<String>>,
        fail: bool,
    }

    impl ScriptedOracle {
        fn yes(mut self, key: &str, relation: Relation) -> Self {
            self.yes.insert((key.to_string(), relation));
            self
        }

        fn failing() -> Self {
            Self {
                fail: true,
                ..Self::default()
            }
        }

        fn call_count(&self, key: &str) -> usize {
            self.calls.lock().unwrap().iter().filter(|k| *k == key).count()
        }
    }

    #[async_trait]
    impl LexicalOracle for ScriptedOracle {
        async fn query(&self, term: &Term, relation: Relation) -> Result<OracleMatch> {
            self.calls.lock().unwrap().push(term.key());
            if self.fail {
                return Err(SousChefError::Oracle("connection refused".into()));
            }
            if self.yes.contains(&(term.key(), relation)) {
                Ok(OracleMatch::found(term.phrase()))
            } else {
                Ok(OracleMatch::none())
            }
        }
    }

    fn extractor(parser: ScriptedParser, oracle: Arc<ScriptedOracle>) -> Extractor {
        let client = OracleClient::new(Lexicon::default(), oracle);
        Extractor::new(Arc::new(parser), Arc::new(client))
    }

    // -----------------------------------------------------------------------
    // Ingredients
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn paired_term_merges_with_preceding_token() {
        let parser = ScriptedParser::default()
            .with("chicken broth", vec![("chicken", "compound", 1), ("broth", "ROOT", 1)]);
        let ex = extractor(parser, Arc::new(ScriptedOracle::default()));

        let pred = ex.extract_ingredient(0, "chicken broth").await.unwrap();
        assert_eq!(pred.isa, "chicken broth");
        assert_eq!(pred.key.term, "chicken broth");
        assert_eq!(pred.key.source_index, 0);
    }

    #[tokio::test]
    async fn quantity_and_measurement_from_numeric_grandchild() {
        let parser = ScriptedParser::default().with(
            "2 cups chicken broth",
            vec![
                ("2", "nummod", 1),
                ("cups", "nmod", 3),
                ("chicken", "compound", 3),
                ("broth", "ROOT", 3),
            ],
        );
        let ex = extractor(parser, Arc::new(ScriptedOracle::default()));

        let pred = ex.extract_ingredient(1, "2 cups chicken broth").await.unwrap();
        assert_eq!(pred.isa, "chicken broth");
        assert_eq!(pred.quantity, Some(2.0));
        assert_eq!(pred.measurement.as_deref(), Some("cups"));
    }

    #[tokio::test]
    async fn symbolic_measurement_still_carries_quantity() {
        // "#" as shorthand for pounds.
        let parser = ScriptedParser::default().with(
            "3 # flour",
            vec![("3", "nummod", 1), ("#", "nmod", 2), ("flour", "ROOT", 2)],
        );
        let oracle = Arc::new(ScriptedOracle::default());
        let ex = extractor(parser, oracle.clone());

        let pred = ex.extract_ingredient(0, "3 # flour").await.unwrap();
        assert_eq!(pred.isa, "flour");
        assert_eq!(pred.quantity, Some(3.0));
        assert_eq!(pred.measurement.as_deref(), Some("#"));
        assert_eq!(oracle.call_count("#"), 0);
    }

    #[tokio::test]
    async fn compound_food_is_promoted_and_placeholdered() {
        let line = "1 pound ground beef";
        let parser = ScriptedParser::default().with(
            line,
            vec![
                ("1", "nummod", 1),
                ("pound", "nmod", 3),
                ("ground", "amod", 3),
                ("beef", "ROOT", 3),
            ],
        );
        let oracle = Arc::new(ScriptedOracle::default().yes("ground_beef", Relation::IsFood));
        let ex = extractor(parser, oracle);

        let pred = ex.extract_ingredient(0, line).await.unwrap();
        assert_eq!(pred.key.term, "beef");
        assert_eq!(pred.isa, "ground beef");
        assert_eq!(pred.sentence, "1 pound isa");
        assert_eq!(pred.line, line);
        assert_eq!(pred.quantity, Some(1.0));
        assert_eq!(pred.measurement.as_deref(), Some("pound"));
    }

    #[tokio::test]
    async fn non_food_root_falls_back_to_first_food_token() {
        let line = "fresh basil leaves";
        let parser = ScriptedParser::default().with(
            line,
            vec![("fresh", "amod", 2), ("basil", "compound", 2), ("leaves", "ROOT", 2)],
        );
        let oracle = Arc::new(ScriptedOracle::default().yes("basil", Relation::IsFood));
        let ex = extractor(parser, oracle);

        let pred = ex.extract_ingredient(0, line).await.unwrap();
        assert_eq!(pred.isa, "basil");
    }

    #[tokio::test]
    async fn nothing_classifies_keeps_syntactic_root() {
        let line = "a pinch of love";
        let parser = ScriptedParser::default().with(
            line,
            vec![("a", "det", 1), ("pinch", "ROOT", 1), ("of", "prep", 1), ("love", "pobj", 2)],
        );
        let ex = extractor(parser, Arc::new(ScriptedOracle::default()));

        let pred = ex.extract_ingredient(0, line).await.unwrap();
        assert_eq!(pred.isa, "pinch");
        assert_eq!(pred.quantity, None);
    }

    #[tokio::test]
    async fn empty_parse_keeps_trimmed_line() {
        let parser = ScriptedParser::default().with("  salt  ", vec![]);
        let ex = extractor(parser, Arc::new(ScriptedOracle::default()));

        let pred = ex.extract_ingredient(3, "  salt  ").await.unwrap();
        assert_eq!(pred.isa, "salt");
        assert_eq!(pred.key.source_index, 3);
    }

    // -----------------------------------------------------------------------
    // Instructions
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn instruction_root_verb_and_cooking_tool() {
        let line = "Heat the skillet";
        let parser = ScriptedParser::default().with(
            line,
            vec![("Heat", "ROOT", 0), ("the", "det", 2), ("skillet", "dobj", 0)],
        );
        let oracle = Arc::new(
            ScriptedOracle::default()
                .yes("heat", Relation::IsVerb)
                .yes("skillet", Relation::UsedForCooking),
        );
        let ex = extractor(parser, oracle);

        let pred = ex.extract_instruction(2, line).await.unwrap();
        assert_eq!(pred.step_index, 2);
        assert_eq!(pred.primary_method, "Heat");
        assert_eq!(pred.tool_for.as_deref(), Some("skillet"));
        assert_eq!(pred.sentence, line);
    }

    #[tokio::test]
    async fn allow_listed_verb_needs_no_backend() {
        let line = "Place the dough";
        let parser = ScriptedParser::default().with(
            line,
            vec![("Place", "ROOT", 0), ("the", "det", 2), ("dough", "dobj", 0)],
        );
        let oracle = Arc::new(ScriptedOracle::default());
        let ex = extractor(parser, oracle.clone());

        let pred = ex.extract_instruction(0, line).await.unwrap();
        assert_eq!(pred.primary_method, "Place");
        assert_eq!(pred.tool_for, None);
        assert_eq!(oracle.call_count("place"), 0);
    }

    #[tokio::test]
    async fn instruction_root_falls_back_to_scanned_verb() {
        let line = "For 20 minutes simmer";
        let parser = ScriptedParser::default().with(
            line,
            vec![
                ("For", "prep", 2),
                ("20", "nummod", 2),
                ("minutes", "ROOT", 2),
                ("simmer", "dep", 2),
            ],
        );
        let oracle = Arc::new(ScriptedOracle::default().yes("simmer", Relation::IsVerb));
        let ex = extractor(parser, oracle);

        let pred = ex.extract_instruction(0, line).await.unwrap();
        assert_eq!(pred.primary_method, "simmer");
    }

    // -----------------------------------------------------------------------
    // Whole documents
    // -----------------------------------------------------------------------

    fn chili() -> (RecipeDocument, ScriptedParser) {
        let doc = RecipeDocument::new(
            "Chili",
            vec!["1 onion".to_string(), "2 onion".to_string(), "salt".to_string()],
            vec!["Chop the onion".to_string(), "Salt the onion".to_string()],
        );
        let parser = ScriptedParser::default()
            .with("1 onion", vec![("1", "nummod", 1), ("onion", "ROOT", 1)])
            .with("2 onion", vec![("2", "nummod", 1), ("onion", "ROOT", 1)])
            .with("salt", vec![("salt", "ROOT", 0)])
            .with(
                "Chop the onion",
                vec![("Chop", "ROOT", 0), ("the", "det", 2), ("onion", "dobj", 0)],
            )
            .with(
                "Salt the onion",
                vec![("Salt", "ROOT", 0), ("the", "det", 2), ("onion", "dobj", 0)],
            );
        (doc, parser)
    }

    #[tokio::test]
    async fn one_record_per_line_in_source_order() {
        let (doc, parser) = chili();
        let oracle = Arc::new(
            ScriptedOracle::default()
                .yes("salt", Relation::IsFood)
                .yes("chop", Relation::IsVerb),
        );
        let ex = extractor(parser, oracle).with_concurrency(3);

        let preds = ex.extract(&doc, &SilentProgress).await.unwrap();
        assert_eq!(preds.ingredients.len(), 3);
        assert_eq!(preds.instructions.len(), 2);

        let indexes: Vec<usize> = preds.ingredients.iter().map(|p| p.key.source_index).collect();
        assert_eq!(indexes, vec![0, 1, 2]);
        assert_eq!(preds.instructions[0].primary_method, "Chop");
        assert_eq!(preds.instructions[1].step_index, 1);
    }

    #[tokio::test]
    async fn repeated_words_hit_the_cache() {
        let (doc, parser) = chili();
        let oracle = Arc::new(ScriptedOracle::default());
        let ex = extractor(parser, oracle.clone()).with_concurrency(1);

        ex.extract(&doc, &SilentProgress).await.unwrap();
        // Both steps scan "the" and "onion" as verbs and check "onion" as a tool.
        assert_eq!(oracle.call_count("the"), 1);
        assert_eq!(oracle.call_count("onion"), 2);
        // "salt" is an allow-listed food, so only its verb check reaches the backend.
        assert_eq!(oracle.call_count("salt"), 1);
    }

    #[tokio::test]
    async fn oracle_outage_still_yields_every_record() {
        let (doc, parser) = chili();
        let ex = extractor(parser, Arc::new(ScriptedOracle::failing()));

        let preds = ex.extract(&doc, &SilentProgress).await.unwrap();
        assert_eq!(preds.ingredients.len(), 3);
        assert!(preds.ingredients.iter().all(|p| !p.isa.is_empty()));
        assert_eq!(preds.instructions[1].primary_method, "Salt");
    }

    #[tokio::test]
    async fn parser_failure_propagates() {
        let doc = RecipeDocument::new("X", vec![], vec!["Unparsed step".to_string()]);
        let ex = extractor(ScriptedParser::default(), Arc::new(ScriptedOracle::default()));

        let err = ex.extract(&doc, &SilentProgress).await.unwrap_err();
        assert!(matches!(err, SousChefError::Parse { .. }));
    }
}
