mod commands;
mod logging;

use clap::{ArgAction, Parser, Subcommand};
use color_eyre::eyre::{Result, WrapErr};
use std::path::PathBuf;

use keydex_core::Config;

#[derive(Parser)]
#[command(name = "keydex", version)]
#[command(about = "Index directory trees into a searchable catalog of files and keywords", long_about = None)]
struct Cli {
    /// Surface per-file failures (-v), debug output (-vv), trace (-vvv)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    /// Use this config file instead of the default locations
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Index every file below a directory
    Index {
        /// Directory to index
        dir: PathBuf,
    },
    /// Forget a directory and every file indexed below it
    Remove {
        dir: PathBuf,
    },
    /// Search file names and keywords
    Search {
        #[arg(required = true)]
        query: Vec<String>,
    },
    /// List registered directories
    Dirs {
        /// List blacklisted directories instead
        #[arg(long)]
        blacklisted: bool,
    },
    /// Exclude a directory from indexing
    Blacklist {
        dir: PathBuf,
    },
    /// Allow a directory to be indexed again
    Whitelist {
        dir: PathBuf,
    },
    /// Print the default configuration
    Config,
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => Config::from_file(path)
            .wrap_err_with(|| format!("loading config from {}", path.display()))?,
        None => Config::load().wrap_err("loading config")?,
    };
    config.indexer.verbose = cli.verbose > 0;

    logging::init(logging::level_for(&config.logging.level, cli.verbose));

    match cli.command {
        Commands::Index { dir } => commands::index(&config, &dir).await,
        Commands::Remove { dir } => commands::remove(&config, &dir),
        Commands::Search { query } => commands::search(&config, &query.join(" ")),
        Commands::Dirs { blacklisted } => commands::dirs(&config, blacklisted),
        Commands::Blacklist { dir } => commands::set_whitelisted(&config, &dir, false),
        Commands::Whitelist { dir } => commands::set_whitelisted(&config, &dir, true),
        Commands::Config => {
            print!("{}", Config::default_config_string());
            Ok(())
        }
    }
}
