//! Error types for Sous-chef.
//!
//! Library crates use [`SousChefError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.

use std::path::PathBuf;

/// Top-level error type for all Sous-chef operations.
#[derive(Debug, thiserror::Error)]
pub enum SousChefError {
    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// Network/HTTP error talking to an external collaborator.
    #[error("network error: {0}")]
    Network(String),

    /// The recipe page could not be fetched or did not contain a recipe.
    #[error("fetch error: {0}")]
    Fetch(String),

    /// The parse-tree provider failed or returned a malformed tree.
    #[error("parse error: {message}")]
    Parse { message: String },

    /// The lexical oracle could not answer (network failure, timeout, bad payload).
    #[error("oracle unavailable: {0}")]
    Oracle(String),

    /// A video or web search provider could not answer.
    #[error("search unavailable: {0}")]
    Search(String),

    /// A navigation request pointed outside `1..=total` steps.
    #[error("step {requested} is out of range (recipe has {total} steps)")]
    StepOutOfRange { requested: i64, total: usize },

    /// An internally generated value reached a branch that must be unreachable.
    #[error("invariant violation: {0}")]
    Invariant(String),

    /// The user's input stream was closed.
    #[error("input closed")]
    InputClosed,

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Data validation error (empty recipe, malformed JSON, etc.).
    #[error("validation error: {message}")]
    Validation { message: String },
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, SousChefError>;

impl SousChefError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Create a parse error from any displayable message.
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse {
            message: msg.into(),
        }
    }

    /// Create a validation error from any displayable message.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation {
            message: msg.into(),
        }
    }

    /// Create an invariant violation.
    pub fn invariant(msg: impl Into<String>) -> Self {
        Self::Invariant(msg.into())
    }

    /// Wrap a `std::io::Error` with a path for context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Whether this error must end the session instead of being recovered in-turn.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Invariant(_))
    }
}
