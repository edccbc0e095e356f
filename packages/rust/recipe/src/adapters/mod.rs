//! Recipe adapter trait and built-in adapters for HTML extraction.
//!
//! Adapters recognise one way a page can publish a recipe (JSON-LD,
//! microdata, plain lists) and pull out the name and the ordered lines.

mod generic;
mod jsonld;
mod microdata;

use scraper::{Html, Selector};
use souschef_shared::RecipeDocument;

pub use generic::GenericAdapter;
pub use jsonld::JsonLdAdapter;
pub use microdata::MicrodataAdapter;

// ---------------------------------------------------------------------------
// Trait
// ---------------------------------------------------------------------------

/// Trait for recipe extraction from a parsed page.
///
/// Adapters are tried in priority order; `GenericAdapter` is the always-last fallback.
pub trait RecipeAdapter: Send + Sync {
    /// Extract a recipe, or `None` if this adapter finds nothing it recognises.
    fn extract(&self, doc: &Html) -> Option<RecipeDocument>;

    /// Human-readable adapter name for tracing.
    fn name(&self) -> &str;
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

/// Holds registered adapters in priority order.
pub struct AdapterRegistry {
    adapters: Vec<Box<dyn RecipeAdapter>>,
}

impl AdapterRegistry {
    /// Create a registry with all built-in adapters (structured data first, generic last).
    pub fn new() -> Self {
        Self {
            adapters: vec![
                Box::new(JsonLdAdapter),
                Box::new(MicrodataAdapter),
                Box::new(GenericAdapter),
            ],
        }
    }

    /// First adapter result that has at least one instruction, with the adapter's name.
    /// A missing recipe name falls back to the page's `<h1>` or `<title>`.
    pub fn extract(&self, doc: &Html) -> Option<(RecipeDocument, &str)> {
        self.adapters.iter().find_map(|adapter| {
            let mut recipe = adapter.extract(doc)?;
            if recipe.instructions.is_empty() {
                return None;
            }
            if recipe.name.is_empty() {
                recipe.name = page_title(doc).unwrap_or_default();
            }
            Some((recipe, adapter.name()))
        })
    }
}

impl Default for AdapterRegistry {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Shared helpers
// ---------------------------------------------------------------------------

/// Text of the first element matching `selector`, trimmed, if non-empty.
pub(crate) fn first_text(doc: &Html, selector: &str) -> Option<String> {
    let sel = Selector::parse(selector).ok()?;
    doc.select(&sel)
        .map(|el| el.text().collect::<String>().trim().to_string())
        .find(|t| !t.is_empty())
}

/// Text of every element matching `selector`, in document order.
pub(crate) fn all_text(doc: &Html, selector: &str) -> Vec<String> {
    let Ok(sel) = Selector::parse(selector) else {
        return Vec::new();
    };
    doc.select(&sel)
        .map(|el| el.text().collect::<String>())
        .collect()
}

fn page_title(doc: &Html) -> Option<String> {
    first_text(doc, "h1").or_else(|| first_text(doc, "title"))
}
