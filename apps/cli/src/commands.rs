//! CLI command definitions, routing, and tracing setup.

use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;

use clap::{Args, Parser, Subcommand};
use color_eyre::eyre::{Result, eyre};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{error, info};
use url::Url;

use souschef_core::{
    Console, Extractor, IntentClassifier, LineKind, ProgressReporter, Session,
};
use souschef_oracle::{ConceptNetOracle, Lexicon, OracleClient};
use souschef_parser::HttpDependencyParser;
use souschef_recipe::{JsonFileSource, RecipeFetcher, RecipeSource};
use souschef_search::SearchDispatch;
use souschef_shared::{
    AppConfig, OracleOptions, ParserOptions, RecipeDocument, RecipePredicates, SearchOptions,
    SousChefError, init_config, load_config,
};

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// Sous-chef: talk your way through a recipe.
#[derive(Parser)]
#[command(
    name = "souschef",
    version,
    about = "A conversational cooking assistant that walks you through any online recipe.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Read a recipe and cook it step by step.
    Cook {
        #[command(flatten)]
        recipe: RecipeArgs,
    },

    /// Print the predicates extracted from a recipe.
    Extract {
        #[command(flatten)]
        recipe: RecipeArgs,

        /// Print JSON instead of a text listing.
        #[arg(long)]
        json: bool,
    },

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Where the recipe comes from, plus service overrides.
#[derive(Args)]
pub(crate) struct RecipeArgs {
    /// Recipe page URL.
    #[arg(required_unless_present = "file", conflicts_with = "file")]
    pub url: Option<String>,

    /// Load a saved recipe (`{name, ingredients, instructions}` JSON) instead.
    #[arg(long)]
    pub file: Option<PathBuf>,

    /// Dependency-parse service endpoint (overrides config).
    #[arg(long, env = "SOUSCHEF_PARSER_ENDPOINT")]
    pub parser_endpoint: Option<String>,

    /// ConceptNet base URL (overrides config).
    #[arg(long, env = "SOUSCHEF_ORACLE_URL")]
    pub oracle_url: Option<String>,
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags. Logs go to stderr; stdout is the conversation.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "souschef=warn",
        1 => "souschef=info",
        2 => "souschef=debug",
        _ => "souschef=trace",
    };

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .with_writer(io::stderr)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .with_writer(io::stderr)
                .init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Cook { recipe } => cmd_cook(&recipe).await,
        Command::Extract { recipe, json } => cmd_extract(&recipe, json).await,
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init().await,
            ConfigAction::Show => cmd_config_show().await,
        },
    }
}

// ---------------------------------------------------------------------------
// Command handlers
// ---------------------------------------------------------------------------

async fn cmd_cook(args: &RecipeArgs) -> Result<()> {
    let config = resolve_config(args)?;

    println!("Give me a moment while I read through the recipe...");
    let recipe = load_recipe(args).await?;
    let session = prepare(recipe, &config).await?;

    let search = SearchDispatch::from_options(&SearchOptions::from(&config))?;
    let classifier = IntentClassifier::new(config.navigation.question_edit_threshold);
    let mut console = StdConsole;

    match session.converse(&search, classifier, &mut console).await {
        Ok(()) => Ok(()),
        Err(SousChefError::InputClosed) => {
            info!(session = %session.id(), "input closed, ending session");
            println!();
            Ok(())
        }
        Err(e) if e.is_fatal() => {
            error!(session = %session.id(), error = %e, "navigator invariant violated");
            Err(color_eyre::eyre::Report::new(e).wrap_err("session aborted"))
        }
        Err(e) => Err(e.into()),
    }
}

async fn cmd_extract(args: &RecipeArgs, json: bool) -> Result<()> {
    let config = resolve_config(args)?;
    let recipe = load_recipe(args).await?;
    let session = prepare(recipe, &config).await?;

    if json {
        let out = serde_json::json!({
            "name": session.recipe().name,
            "ingredients": session.predicates().ingredients,
            "instructions": session.predicates().instructions,
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else {
        print_predicates(&session.recipe().name, session.predicates());
    }
    Ok(())
}

async fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

async fn cmd_config_show() -> Result<()> {
    let config: AppConfig = load_config()?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}

// ---------------------------------------------------------------------------
// Wiring
// ---------------------------------------------------------------------------

/// Config file values with CLI overrides applied.
fn resolve_config(args: &RecipeArgs) -> Result<AppConfig> {
    let mut config = load_config()?;
    if let Some(endpoint) = &args.parser_endpoint {
        config.parser.endpoint = endpoint.clone();
    }
    if let Some(base_url) = &args.oracle_url {
        config.oracle.base_url = base_url.clone();
    }
    Ok(config)
}

async fn load_recipe(args: &RecipeArgs) -> Result<RecipeDocument> {
    let source: Box<dyn RecipeSource> = match (&args.file, &args.url) {
        (Some(path), _) => Box::new(JsonFileSource::new(path)),
        (None, Some(url)) => {
            let url = Url::parse(url).map_err(|e| eyre!("invalid URL '{url}': {e}"))?;
            Box::new(RecipeFetcher::new(url)?)
        }
        (None, None) => return Err(eyre!("either a recipe URL or --file is required")),
    };
    Ok(source.load().await?)
}

fn build_extractor(config: &AppConfig) -> Result<Extractor> {
    let parser = HttpDependencyParser::new(&ParserOptions::from(config))?;

    let oracle_opts = OracleOptions::from(config);
    let backend = ConceptNetOracle::new(&oracle_opts)?;
    let lexicon = Lexicon::new(&oracle_opts.extra_foods, &oracle_opts.extra_cooking_verbs);
    let oracle = OracleClient::new(lexicon, Arc::new(backend));

    Ok(Extractor::new(Arc::new(parser), Arc::new(oracle))
        .with_concurrency(oracle_opts.concurrency))
}

async fn prepare(recipe: RecipeDocument, config: &AppConfig) -> Result<Session> {
    let extractor = build_extractor(config)?;
    let reporter = CliProgress::new();
    let result = Session::prepare(recipe, &extractor, &reporter).await;
    reporter.spinner.finish_and_clear();
    Ok(result?)
}

fn print_predicates(name: &str, predicates: &RecipePredicates) {
    println!("{name}");
    println!();
    println!("  Ingredients:");
    for ing in &predicates.ingredients {
        let amount = match (ing.quantity, &ing.measurement) {
            (Some(q), Some(m)) => format!("  ({q} {m})"),
            (Some(q), None) => format!("  ({q})"),
            _ => String::new(),
        };
        println!("    {:>2}. {}{amount}", ing.key.source_index + 1, ing.isa);
        println!("        {}", ing.line);
    }
    println!();
    println!("  Instructions:");
    for step in &predicates.instructions {
        let tool = step
            .tool_for
            .as_deref()
            .map(|t| format!("  [tool: {t}]"))
            .unwrap_or_default();
        println!("    {:>2}. {}{tool}", step.step_index + 1, step.primary_method);
        println!("        {}", step.sentence);
    }
    println!();
}

// ---------------------------------------------------------------------------
// Console
// ---------------------------------------------------------------------------

/// The conversation over stdin/stdout.
struct StdConsole;

impl Console for StdConsole {
    fn say(&mut self, text: &str) {
        println!("{text}");
    }

    fn ask(&mut self, prompt: &str) -> souschef_shared::Result<String> {
        let mut stdout = io::stdout().lock();
        write!(stdout, "{prompt}")
            .and_then(|_| stdout.flush())
            .map_err(|e| SousChefError::io("<stdout>", e))?;

        let mut line = String::new();
        let read = io::stdin()
            .lock()
            .read_line(&mut line)
            .map_err(|e| SousChefError::io("<stdin>", e))?;
        if read == 0 {
            return Err(SousChefError::InputClosed);
        }
        Ok(line.trim_end_matches(['\r', '\n']).to_string())
    }
}

// ---------------------------------------------------------------------------
// CLI progress reporter
// ---------------------------------------------------------------------------

/// CLI progress reporter using an indicatif spinner.
struct CliProgress {
    spinner: ProgressBar,
}

impl CliProgress {
    fn new() -> Self {
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {msg}")
                .unwrap()
                .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
        );
        spinner.enable_steady_tick(std::time::Duration::from_millis(80));
        Self { spinner }
    }
}

impl ProgressReporter for CliProgress {
    fn phase(&self, name: &str) {
        self.spinner.set_message(name.to_string());
    }

    fn line_extracted(&self, kind: LineKind, current: usize, total: usize) {
        let what = match kind {
            LineKind::Ingredient => "ingredient",
            LineKind::Instruction => "step",
        };
        self.spinner
            .set_message(format!("Reading {what} [{current}/{total}]"));
    }

    fn done(&self, session: &Session) {
        info!(
            session = %session.id(),
            steps = session.predicates().total_steps(),
            "recipe ready"
        );
        self.spinner.finish_and_clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cook_requires_url_or_file() {
        assert!(Cli::try_parse_from(["souschef", "cook"]).is_err());
        assert!(
            Cli::try_parse_from(["souschef", "cook", "https://x.test/r", "--file", "r.json"])
                .is_err()
        );

        let cli = Cli::try_parse_from(["souschef", "-vv", "cook", "--file", "r.json"]).unwrap();
        assert_eq!(cli.verbose, 2);
        match cli.command {
            Command::Cook { recipe } => {
                assert_eq!(recipe.file, Some(PathBuf::from("r.json")));
                assert!(recipe.url.is_none());
            }
            _ => panic!("expected cook"),
        }
    }

    #[test]
    fn extract_flags() {
        let cli = Cli::try_parse_from([
            "souschef",
            "extract",
            "https://x.test/r",
            "--json",
            "--parser-endpoint",
            "http://localhost:9000/parse",
        ])
        .unwrap();
        match cli.command {
            Command::Extract { recipe, json } => {
                assert!(json);
                assert_eq!(recipe.url.as_deref(), Some("https://x.test/r"));
                assert_eq!(
                    recipe.parser_endpoint.as_deref(),
                    Some("http://localhost:9000/parse")
                );
            }
            _ => panic!("expected extract"),
        }
    }
}
