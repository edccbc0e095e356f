//! Core domain types for Sous-chef sessions.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Result, SousChefError};

// ---------------------------------------------------------------------------
// SessionId
// ---------------------------------------------------------------------------

/// A UUID v7 wrapper identifying one cooking session (time-sortable).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(pub Uuid);

impl SessionId {
    /// Generate a new time-sortable session identifier.
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// RecipeDocument
// ---------------------------------------------------------------------------

/// A scraped recipe: a name plus ordered ingredient and instruction lines.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecipeDocument {
    /// Display name of the recipe.
    pub name: String,
    /// Ingredient lines in source order.
    pub ingredients: Vec<String>,
    /// Instruction sentences in source order.
    pub instructions: Vec<String>,
}

impl RecipeDocument {
    /// Build a document, collapsing whitespace and dropping blank lines.
    pub fn new(
        name: impl Into<String>,
        ingredients: impl IntoIterator<Item = String>,
        instructions: impl IntoIterator<Item = String>,
    ) -> Self {
        Self {
            name: normalize_line(&name.into()),
            ingredients: normalize_lines(ingredients),
            instructions: normalize_lines(instructions),
        }
    }

    /// Load a document from its JSON form (`{name, ingredients, instructions}`).
    pub fn from_json(json: &str) -> Result<Self> {
        let raw: RecipeDocument = serde_json::from_str(json)
            .map_err(|e| SousChefError::validation(format!("invalid recipe JSON: {e}")))?;
        Ok(Self::new(raw.name, raw.ingredients, raw.instructions))
    }
}

fn normalize_line(line: &str) -> String {
    line.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn normalize_lines(lines: impl IntoIterator<Item = String>) -> Vec<String> {
    lines
        .into_iter()
        .map(|l| normalize_line(&l))
        .filter(|l| !l.is_empty())
        .collect()
}

// ---------------------------------------------------------------------------
// Parse trees
// ---------------------------------------------------------------------------

/// One token of a dependency parse.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedToken {
    /// Surface text.
    pub text: String,
    /// Dependency label (`ROOT` marks the syntactic root).
    pub dep: String,
    /// Index of the head token; a root points at itself.
    pub head: usize,
}

impl ParsedToken {
    pub fn new(text: impl Into<String>, dep: impl Into<String>, head: usize) -> Self {
        Self {
            text: text.into(),
            dep: dep.into(),
            head,
        }
    }

    pub fn is_root(&self) -> bool {
        self.dep.eq_ignore_ascii_case("root")
    }
}

/// A sentence's tokens in order, linked by head indices.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParseTree {
    tokens: Vec<ParsedToken>,
}

impl ParseTree {
    /// Build a tree, rejecting head indices that point outside the sentence.
    pub fn new(tokens: Vec<ParsedToken>) -> Result<Self> {
        let len = tokens.len();
        if let Some((i, bad)) = tokens.iter().enumerate().find(|(_, t)| t.head >= len) {
            return Err(SousChefError::parse(format!(
                "token {i} ('{}') has head {} but the sentence has {len} tokens",
                bad.text, bad.head
            )));
        }
        Ok(Self { tokens })
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn text(&self, index: usize) -> &str {
        &self.tokens[index].text
    }

    /// Index of the first token flagged as root, or the first token if none is.
    pub fn root(&self) -> Option<usize> {
        self.tokens
            .iter()
            .position(ParsedToken::is_root)
            .or_else(|| (!self.tokens.is_empty()).then_some(0))
    }

    /// Direct syntactic children of `index`, in sentence order.
    pub fn children(&self, index: usize) -> impl Iterator<Item = usize> + '_ {
        self.tokens
            .iter()
            .enumerate()
            .filter(move |(i, t)| t.head == index && *i != index)
            .map(|(i, _)| i)
    }
}

// ---------------------------------------------------------------------------
// Predicates
// ---------------------------------------------------------------------------

/// Identity of an ingredient record: the resolved term plus its line index,
/// so repeated ingredients stay distinct.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PredicateKey {
    pub term: String,
    pub source_index: usize,
}

impl std::fmt::Display for PredicateKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.term, self.source_index)
    }
}

/// Structured facts about one ingredient line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IngredientPredicate {
    pub key: PredicateKey,
    /// Canonical food term (one or two words).
    pub isa: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quantity: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub measurement: Option<String>,
    /// The line, with a merged compound phrase replaced by a placeholder.
    pub sentence: String,
    /// The untouched source line, used for display.
    pub line: String,
}

/// Structured facts about one instruction line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstructionPredicate {
    /// Zero-based step index.
    pub step_index: usize,
    /// Resolved action verb.
    pub primary_method: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_for: Option<String>,
    pub sentence: String,
}

/// All predicates extracted from one recipe, in source order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecipePredicates {
    pub ingredients: Vec<IngredientPredicate>,
    pub instructions: Vec<InstructionPredicate>,
}

impl RecipePredicates {
    pub fn total_steps(&self) -> usize {
        self.instructions.len()
    }

    pub fn instruction(&self, step_index: usize) -> Option<&InstructionPredicate> {
        self.instructions.get(step_index)
    }

    /// Ingredients whose canonical term occurs in `sentence` (case-insensitive),
    /// in insertion order.
    pub fn ingredients_in<'a>(
        &'a self,
        sentence: &str,
    ) -> impl Iterator<Item = &'a IngredientPredicate> + 'a {
        let haystack = sentence.to_lowercase();
        self.ingredients
            .iter()
            .filter(move |ing| haystack.contains(&ing.isa.to_lowercase()))
    }
}
