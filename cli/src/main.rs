mod commands;
mod config;
mod spoonacular;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::process;
use tracing_subscriber::EnvFilter;

use crate::commands::{
    Engine, cmd_browse, cmd_favourites, cmd_popular, cmd_search, cmd_toggle, cmd_unfavourite,
};
use crate::config::Config;
use crate::spoonacular::SpoonacularClient;
use recipe_search_core::engine::EngineConfig;
use recipe_search_core::service::LocalFavorites;

#[derive(Parser)]
#[command(
    name = "recipes",
    version,
    about = "Search recipes and keep your favourites",
    long_about = "Search Spoonacular recipes from the terminal and keep a local list of favourites.\n\
                  Set SPOONACULAR_API_KEY (or write the key to the data directory) before use."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Search recipes by name or ingredient
    Search {
        /// Search query (blank searches the default term)
        query: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show a selection of popular recipes
    Popular {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// List favourite recipes
    #[command(alias = "favorites")]
    Favourites {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Add or remove a recipe from favourites
    Toggle {
        /// Recipe ID
        id: i64,
        /// Search query the recipe appears under (default: popular and the default search)
        #[arg(short, long)]
        query: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Remove a recipe from favourites
    #[command(alias = "unfavorite")]
    Unfavourite {
        /// Recipe ID
        id: i64,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Interactive search with live results
    Browse {
        /// Milliseconds to wait after typing stops before searching
        #[arg(long, default_value = "500")]
        debounce_ms: u64,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = Config::load()?;
    let store = LocalFavorites::open(&config.db_path)?;

    let mut engine_config = EngineConfig::default();
    if let Commands::Browse { debounce_ms } = &cli.command {
        engine_config.debounce = std::time::Duration::from_millis(*debounce_ms);
    }

    // Favourites-only commands work without an API key
    let api_key = match &cli.command {
        Commands::Favourites { .. } | Commands::Unfavourite { .. } => {
            config.load_api_key().unwrap_or_default()
        }
        _ => config.load_api_key()?,
    };
    let client = SpoonacularClient::new(api_key)?;
    let engine: Engine = Engine::new(client, store, engine_config);

    match cli.command {
        Commands::Search { query, json } => cmd_search(&engine, &query, json).await,
        Commands::Popular { json } => cmd_popular(&engine, json).await,
        Commands::Favourites { json } => cmd_favourites(&engine, json).await,
        Commands::Toggle { id, query, json } => cmd_toggle(&engine, id, query, json).await,
        Commands::Unfavourite { id, json } => cmd_unfavourite(&engine, id, json).await,
        Commands::Browse { .. } => cmd_browse(&engine).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_toggle_with_query() {
        let cli = Cli::try_parse_from(["recipes", "toggle", "716429", "-q", "pasta"]).unwrap();
        match cli.command {
            Commands::Toggle { id, query, json } => {
                assert_eq!(id, 716_429);
                assert_eq!(query.as_deref(), Some("pasta"));
                assert!(!json);
            }
            _ => panic!("expected toggle"),
        }
    }

    #[test]
    fn test_favorites_alias() {
        let cli = Cli::try_parse_from(["recipes", "favorites", "--json"]).unwrap();
        assert!(matches!(cli.command, Commands::Favourites { json: true }));
    }
}
