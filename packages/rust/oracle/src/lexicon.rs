//! Static allow-lists consulted before any oracle round-trip.

use std::collections::HashSet;

/// Foods the oracle is known to miss or answer slowly.
const KNOWN_FOODS: &[&str] = &[
    "tofu", "beef", "chicken", "pork", "pepperoni", "sausage", "turkey", "steak", "fish",
    "salmon", "shrimp", "lobster", "salami", "rennet", "poultry", "ham", "bacon", "lamb",
    "stock", "broth", "sauce", "loin", "tenderloin", "sirloin", "breast", "soy sauce", "milk",
    "cheese", "cream", "yogurt", "butter", "ghee", "coconut oil", "seasoning", "oregano", "salt",
    "oil", "onions", "onion",
];

/// ConceptNet rarely tags these as verbs.
const KNOWN_COOKING_VERBS: &[&str] = &["place"];

/// Allow-lists of foods and cooking verbs. Entries are stored lowercase.
#[derive(Debug, Clone)]
pub struct Lexicon {
    foods: HashSet<String>,
    cooking_verbs: HashSet<String>,
}

impl Default for Lexicon {
    fn default() -> Self {
        Self::new(std::iter::empty::<String>(), std::iter::empty::<String>())
    }
}

impl Lexicon {
    /// Built-in lists extended with `extra_foods` and `extra_verbs`.
    pub fn new(
        extra_foods: impl IntoIterator<Item = impl AsRef<str>>,
        extra_verbs: impl IntoIterator<Item = impl AsRef<str>>,
    ) -> Self {
        let foods = KNOWN_FOODS
            .iter()
            .map(|s| s.to_string())
            .chain(extra_foods.into_iter().map(|s| s.as_ref().trim().to_lowercase()))
            .collect();
        let cooking_verbs = KNOWN_COOKING_VERBS
            .iter()
            .map(|s| s.to_string())
            .chain(extra_verbs.into_iter().map(|s| s.as_ref().trim().to_lowercase()))
            .collect();
        Self {
            foods,
            cooking_verbs,
        }
    }

    /// `phrase` may be one word or a space-separated pair.
    pub fn is_known_food(&self, phrase: &str) -> bool {
        self.foods.contains(&phrase.to_lowercase())
    }

    pub fn is_known_cooking_verb(&self, word: &str) -> bool {
        self.cooking_verbs.contains(&word.to_lowercase())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn built_in_entries_match_case_insensitively() {
        let lex = Lexicon::default();
        assert!(lex.is_known_food("Beef"));
        assert!(lex.is_known_food("soy sauce"));
        assert!(!lex.is_known_food("spatula"));
        assert!(lex.is_known_cooking_verb("Place"));
        assert!(!lex.is_known_cooking_verb("stir"));
    }

    #[test]
    fn extras_extend_the_lists() {
        let lex = Lexicon::new(["Paneer "], ["blanch"]);
        assert!(lex.is_known_food("paneer"));
        assert!(lex.is_known_cooking_verb("BLANCH"));
        assert!(lex.is_known_food("tofu"));
    }
}
