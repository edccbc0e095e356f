//! Shared types, error model, and configuration for Sous-chef.
//!
//! This crate is the foundation depended on by all other Sous-chef crates.
//! It provides:
//! - [`SousChefError`]: the unified error type
//! - Domain types ([`RecipeDocument`], [`ParseTree`], [`RecipePredicates`], [`SessionId`])
//! - Configuration ([`AppConfig`], runtime option structs, config loading)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, LexiconConfig, NavigationConfig, OracleConfig, OracleOptions, ParserConfig,
    ParserOptions, SearchConfig, SearchOptions, config_dir, config_file_path, init_config,
    load_config, load_config_from,
};
pub use error::{Result, SousChefError};
pub use types::{
    IngredientPredicate, InstructionPredicate, ParseTree, ParsedToken, PredicateKey,
    RecipeDocument, RecipePredicates, SessionId,
};
