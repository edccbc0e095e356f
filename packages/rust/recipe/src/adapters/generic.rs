//! Generic (fallback) recipe adapter.
//!
//! Looks for list items under containers whose class names mention
//! ingredients or directions, the way most blog templates mark them up.

use scraper::Html;
use souschef_shared::RecipeDocument;

use super::{RecipeAdapter, all_text};

const INGREDIENT_SELECTORS: &[&str] = &[
    ".recipe-ingredients li",
    ".ingredients li",
    r#"[class*="ingredient"] li"#,
];

const INSTRUCTION_SELECTORS: &[&str] = &[
    ".recipe-directions li",
    ".recipe-instructions li",
    ".directions li",
    ".instructions li",
    r#"[class*="instruction"] li"#,
    r#"[class*="direction"] li"#,
    "ol.steps li",
];

/// Generic adapter that works on arbitrary recipe blogs.
pub struct GenericAdapter;

impl RecipeAdapter for GenericAdapter {
    fn extract(&self, doc: &Html) -> Option<RecipeDocument> {
        let ingredients = first_non_empty(doc, INGREDIENT_SELECTORS);
        let instructions = first_non_empty(doc, INSTRUCTION_SELECTORS);

        if instructions.is_empty() {
            return None;
        }

        // Name falls back to the registry's page title lookup.
        Some(RecipeDocument::new(String::new(), ingredients, instructions))
    }

    fn name(&self) -> &str {
        "generic"
    }
}

fn first_non_empty(doc: &Html, selectors: &[&str]) -> Vec<String> {
    selectors
        .iter()
        .map(|sel| all_text(doc, sel))
        .find(|lines| lines.iter().any(|l| !l.trim().is_empty()))
        .unwrap_or_default()
}
