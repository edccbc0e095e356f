//! Core domain logic for Sous-chef.
//!
//! This crate turns a [`RecipeDocument`](souschef_shared::RecipeDocument)
//! into predicates and walks the user through it:
//! - [`extract`]: dependency parse + lexical oracle → ingredient and instruction facts
//! - [`intent`]: free-text command classification
//! - [`referent`]: "that" / "those" substitution in help questions
//! - [`navigator`]: the step-navigation dialogue
//! - [`session`]: the end-to-end flow tying them together

pub mod extract;
pub mod intent;
pub mod navigator;
pub mod referent;
pub mod session;

pub use extract::Extractor;
pub use intent::{Intent, IntentClassifier, Ordinal, QuestionTemplate};
pub use navigator::{Console, NavigationState, Navigator, Screen};
pub use session::{LineKind, ProgressReporter, Session, SilentProgress};
