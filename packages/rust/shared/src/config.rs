//! Application configuration for Sous-chef.
//!
//! User config lives at `~/.souschef/souschef.toml`.
//! CLI flags override config file values, which override defaults.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SousChefError};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "souschef.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".souschef";

// ---------------------------------------------------------------------------
// Config structs (matching souschef.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Lexical oracle (ConceptNet) settings.
    #[serde(default)]
    pub oracle: OracleConfig,

    /// Dependency-parse service settings.
    #[serde(default)]
    pub parser: ParserConfig,

    /// Video and web search settings.
    #[serde(default)]
    pub search: SearchConfig,

    /// Extra allow-list entries.
    #[serde(default)]
    pub lexicon: LexiconConfig,

    /// Conversation tuning.
    #[serde(default)]
    pub navigation: NavigationConfig,
}

/// `[oracle]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OracleConfig {
    /// Base URL of the ConceptNet-compatible API.
    #[serde(default = "default_oracle_url")]
    pub base_url: String,

    /// Number of edges requested per lookup.
    #[serde(default = "default_oracle_limit")]
    pub limit: u32,

    /// Per-request timeout.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Maximum number of lines extracted concurrently.
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self {
            base_url: default_oracle_url(),
            limit: default_oracle_limit(),
            timeout_secs: default_timeout_secs(),
            concurrency: default_concurrency(),
        }
    }
}

fn default_oracle_url() -> String {
    "http://api.conceptnet.io".into()
}
fn default_oracle_limit() -> u32 {
    100
}
fn default_timeout_secs() -> u64 {
    10
}
fn default_concurrency() -> usize {
    8
}

/// `[parser]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParserConfig {
    /// Endpoint that accepts `{"text", "model"}` and returns a token list.
    #[serde(default = "default_parser_endpoint")]
    pub endpoint: String,

    /// Model name forwarded to the parse service.
    #[serde(default = "default_parser_model")]
    pub model: String,

    /// Per-request timeout.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            endpoint: default_parser_endpoint(),
            model: default_parser_model(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_parser_endpoint() -> String {
    "http://127.0.0.1:8080/parse".into()
}
fn default_parser_model() -> String {
    "en_core_web_sm".into()
}

/// `[search]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Base URL of the video search site.
    #[serde(default = "default_video_url")]
    pub video_base_url: String,

    /// Base URL of the HTML web search endpoint.
    #[serde(default = "default_web_url")]
    pub web_base_url: String,

    /// Per-request timeout.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Text appended to every help query.
    #[serde(default = "default_query_suffix")]
    pub query_suffix: String,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            video_base_url: default_video_url(),
            web_base_url: default_web_url(),
            timeout_secs: default_timeout_secs(),
            query_suffix: default_query_suffix(),
        }
    }
}

fn default_video_url() -> String {
    "https://www.youtube.com".into()
}
fn default_web_url() -> String {
    "https://html.duckduckgo.com".into()
}
fn default_query_suffix() -> String {
    " when it comes to cooking".into()
}

/// `[lexicon]` section. Entries extend the built-in allow-lists.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LexiconConfig {
    /// Words always accepted as foods.
    #[serde(default)]
    pub extra_foods: Vec<String>,

    /// Words always accepted as cooking actions.
    #[serde(default)]
    pub extra_cooking_verbs: Vec<String>,
}

/// `[navigation]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NavigationConfig {
    /// Question templates match when the edit distance is strictly below this.
    #[serde(default = "default_edit_threshold")]
    pub question_edit_threshold: usize,
}

impl Default for NavigationConfig {
    fn default() -> Self {
        Self {
            question_edit_threshold: default_edit_threshold(),
        }
    }
}

fn default_edit_threshold() -> usize {
    2
}

// ---------------------------------------------------------------------------
// Runtime options (merged from config + CLI flags)
// ---------------------------------------------------------------------------

/// Runtime oracle client options.
#[derive(Debug, Clone)]
pub struct OracleOptions {
    pub base_url: String,
    pub limit: u32,
    pub timeout: Duration,
    pub concurrency: usize,
    pub extra_foods: Vec<String>,
    pub extra_cooking_verbs: Vec<String>,
}

impl From<&AppConfig> for OracleOptions {
    fn from(config: &AppConfig) -> Self {
        Self {
            base_url: config.oracle.base_url.clone(),
            limit: config.oracle.limit,
            timeout: Duration::from_secs(config.oracle.timeout_secs),
            concurrency: config.oracle.concurrency.max(1),
            extra_foods: config.lexicon.extra_foods.clone(),
            extra_cooking_verbs: config.lexicon.extra_cooking_verbs.clone(),
        }
    }
}

/// Runtime parse-service options.
#[derive(Debug, Clone)]
pub struct ParserOptions {
    pub endpoint: String,
    pub model: String,
    pub timeout: Duration,
}

impl From<&AppConfig> for ParserOptions {
    fn from(config: &AppConfig) -> Self {
        Self {
            endpoint: config.parser.endpoint.clone(),
            model: config.parser.model.clone(),
            timeout: Duration::from_secs(config.parser.timeout_secs),
        }
    }
}

/// Runtime search options.
#[derive(Debug, Clone)]
pub struct SearchOptions {
    pub video_base_url: String,
    pub web_base_url: String,
    pub timeout: Duration,
    pub query_suffix: String,
}

impl From<&AppConfig> for SearchOptions {
    fn from(config: &AppConfig) -> Self {
        Self {
            video_base_url: config.search.video_base_url.clone(),
            web_base_url: config.search.web_base_url.clone(),
            timeout: Duration::from_secs(config.search.timeout_secs),
            query_suffix: config.search.query_suffix.clone(),
        }
    }
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.souschef/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| SousChefError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.souschef/souschef.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| SousChefError::io(path, e))?;

    toml::from_str(&content)
        .map_err(|e| SousChefError::config(format!("failed to parse {}: {e}", path.display())))
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| SousChefError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| SousChefError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| SousChefError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}
