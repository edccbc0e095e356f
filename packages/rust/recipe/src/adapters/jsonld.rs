//! schema.org `Recipe` published as JSON-LD.
//!
//! Handles top-level objects, arrays and `@graph` containers, and the three
//! common `recipeInstructions` shapes: a plain string, `HowToStep` objects,
//! and `HowToSection`s nesting further steps.

use scraper::{Html, Selector};
use serde_json::Value;
use souschef_shared::RecipeDocument;
use tracing::debug;

use super::RecipeAdapter;

pub struct JsonLdAdapter;

impl RecipeAdapter for JsonLdAdapter {
    fn extract(&self, doc: &Html) -> Option<RecipeDocument> {
        let sel = Selector::parse(r#"script[type="application/ld+json"]"#).unwrap();

        doc.select(&sel).find_map(|script| {
            let raw = script.text().collect::<String>();
            let value: Value = match serde_json::from_str(&raw) {
                Ok(v) => v,
                Err(e) => {
                    debug!(error = %e, "skipping unparseable JSON-LD block");
                    return None;
                }
            };
            find_recipe(&value).map(recipe_from_node)
        })
    }

    fn name(&self) -> &str {
        "json-ld"
    }
}

fn is_recipe(node: &Value) -> bool {
    match node.get("@type") {
        Some(Value::String(t)) => t == "Recipe",
        Some(Value::Array(types)) => types.iter().any(|t| t == "Recipe"),
        _ => false,
    }
}

fn find_recipe(value: &Value) -> Option<&Value> {
    match value {
        Value::Array(items) => items.iter().find_map(find_recipe),
        Value::Object(map) => {
            if is_recipe(value) {
                return Some(value);
            }
            map.get("@graph").and_then(find_recipe)
        }
        _ => None,
    }
}

fn recipe_from_node(node: &Value) -> RecipeDocument {
    let name = node
        .get("name")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();

    let ingredients = node
        .get("recipeIngredient")
        .or_else(|| node.get("ingredients"))
        .map(strings)
        .unwrap_or_default();

    let mut instructions = Vec::new();
    if let Some(steps) = node.get("recipeInstructions") {
        collect_steps(steps, &mut instructions);
    }

    RecipeDocument::new(name, ingredients, instructions)
}

fn strings(value: &Value) -> Vec<String> {
    match value {
        Value::String(s) => vec![s.clone()],
        Value::Array(items) => items
            .iter()
            .filter_map(Value::as_str)
            .map(str::to_string)
            .collect(),
        _ => Vec::new(),
    }
}

fn collect_steps(value: &Value, out: &mut Vec<String>) {
    match value {
        Value::String(s) => out.extend(s.lines().map(str::to_string)),
        Value::Array(items) => items.iter().for_each(|item| collect_steps(item, out)),
        Value::Object(map) => {
            if let Some(children) = map.get("itemListElement") {
                collect_steps(children, out);
            } else if let Some(text) = map.get("text").or_else(|| map.get("name")) {
                collect_steps(text, out);
            }
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_string_instructions_split_by_line() {
        let html = r#"<script type="application/ld+json">
            {"@type": "Recipe", "name": "Toast",
             "recipeIngredient": "1 slice bread",
             "recipeInstructions": "Toast the bread.\nButter it."}
        </script>"#;
        let doc = Html::parse_document(html);
        let recipe = JsonLdAdapter.extract(&doc).expect("recipe");
        assert_eq!(recipe.ingredients, vec!["1 slice bread".to_string()]);
        assert_eq!(
            recipe.instructions,
            vec!["Toast the bread.".to_string(), "Butter it.".to_string()]
        );
    }

    #[test]
    fn skips_invalid_blocks_and_non_recipes() {
        let html = r#"
            <script type="application/ld+json">{ not json</script>
            <script type="application/ld+json">{"@type": "Organization", "name": "X"}</script>
        "#;
        let doc = Html::parse_document(html);
        assert!(JsonLdAdapter.extract(&doc).is_none());
    }
}
