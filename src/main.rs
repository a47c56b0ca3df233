use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

/// petplates - Pet recipe compatibility and generation
#[derive(Parser)]
#[command(name = "petplates")]
#[command(about = "Pet recipe compatibility scoring and recommendations", long_about = None)]
struct Cli {
    /// Path to configuration file
    #[arg(long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server
    Serve {
        /// Server host address (overrides config file)
        #[arg(long)]
        host: Option<String>,

        /// Server port (overrides config file)
        #[arg(long)]
        port: Option<u16>,
    },
    /// Generate new recipes for a pet
    Generate {
        /// Pet profile JSON file
        #[arg(long)]
        pet: PathBuf,

        /// Number of recipes to generate
        #[arg(long)]
        count: Option<usize>,
    },
    /// Rank the recipe catalog for a pet
    Recommend {
        /// Pet profile JSON file
        #[arg(long)]
        pet: PathBuf,

        /// Maximum number of recipes to return
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Score one catalog recipe for a pet
    Score {
        /// Pet profile JSON file
        #[arg(long)]
        pet: PathBuf,

        /// Recipe id
        #[arg(long)]
        recipe: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = petplates::config::Config::load(cli.config.clone())?;
    config.validate().map_err(|e| anyhow::anyhow!(e))?;

    petplates::observability::init_observability(
        "petplates",
        env!("CARGO_PKG_VERSION"),
        &config.observability,
    )?;

    match cli.command {
        Commands::Serve { host, port } => petplates::cli::server::serve(config, host, port).await,
        Commands::Generate { pet, count } => petplates::cli::recipes::generate(config, &pet, count),
        Commands::Recommend { pet, limit } => {
            petplates::cli::recipes::recommend(config, &pet, limit).await
        }
        Commands::Score { pet, recipe } => petplates::cli::recipes::score(config, &pet, &recipe),
    }
}
