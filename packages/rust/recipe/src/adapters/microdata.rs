//! schema.org `Recipe` published as HTML microdata (`itemprop` attributes).

use scraper::{ElementRef, Html, Selector};
use souschef_shared::RecipeDocument;

use super::{RecipeAdapter, all_text, first_text};

pub struct MicrodataAdapter;

impl RecipeAdapter for MicrodataAdapter {
    fn extract(&self, doc: &Html) -> Option<RecipeDocument> {
        let ingredients = all_text(
            doc,
            r#"[itemprop="recipeIngredient"], [itemprop="ingredients"]"#,
        );

        let steps_sel = Selector::parse(r#"[itemprop="recipeInstructions"]"#).unwrap();
        let instructions: Vec<String> = doc.select(&steps_sel).flat_map(step_lines).collect();

        if ingredients.is_empty() && instructions.is_empty() {
            return None;
        }

        let name = first_text(doc, r#"[itemtype*="schema.org/Recipe"] [itemprop="name"]"#)
            .unwrap_or_default();
        Some(RecipeDocument::new(name, ingredients, instructions))
    }

    fn name(&self) -> &str {
        "microdata"
    }
}

/// An instructions element is either a list of `<li>` steps or one block of text.
fn step_lines(el: ElementRef<'_>) -> Vec<String> {
    let li = Selector::parse("li").unwrap();
    let items: Vec<String> = el
        .select(&li)
        .map(|item| item.text().collect::<String>())
        .collect();

    if items.is_empty() {
        el.text()
            .collect::<String>()
            .lines()
            .map(str::to_string)
            .collect()
    } else {
        items
    }
}
