//! Substitutes "that" / "those" in a help question with ingredients of the
//! current step.

use std::sync::LazyLock;

use regex::Regex;
use souschef_shared::RecipePredicates;

static THAT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bthat\b").expect("valid regex"));
static THOSE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bthose\b").expect("valid regex"));

/// Rewrite `command` against the ingredients mentioned in `step`.
///
/// "that" becomes the first matching ingredient term. "those" is dropped and
/// every matching term is appended, comma-separated. With no match the
/// command is returned unchanged (apart from removing "those").
pub fn resolve_referents(command: &str, step: &str, predicates: &RecipePredicates) -> String {
    if THAT.is_match(command) {
        return match predicates.ingredients_in(step).next() {
            Some(ingredient) => THAT
                .replace_all(command, ingredient.isa.as_str())
                .into_owned(),
            None => command.to_string(),
        };
    }

    if THOSE.is_match(command) {
        let mut terms: Vec<&str> = Vec::new();
        for ingredient in predicates.ingredients_in(step) {
            if !terms.contains(&ingredient.isa.as_str()) {
                terms.push(&ingredient.isa);
            }
        }

        let stripped = THOSE.replace_all(command, "");
        let collapsed = stripped.split_whitespace().collect::<Vec<_>>().join(" ");
        return if terms.is_empty() {
            collapsed
        } else {
            format!("{collapsed} {}", terms.join(", "))
        };
    }

    command.to_string()
}
