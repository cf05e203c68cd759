use clap::{ArgAction, Parser, Subcommand};
use commands::{clear, config, movies, refresh, stats};
use std::path::PathBuf;

mod commands;
mod logging;
mod output;

#[derive(Parser)]
#[command(name = "cinehub")]
#[command(about = "CineHub - Barcelona cinema listings in one place")]
#[command(version)]
struct Cli {
    /// Enable verbose output (use multiple times for more verbosity: -v, -vv)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Output format
    #[arg(long, global = true, default_value = "human", value_enum)]
    output: output::OutputFormat,

    /// Also write logs to this file (rotated daily)
    #[arg(long, global = true, value_name = "PATH")]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List movies showing at the configured theaters
    #[command(long_about = "List movies with their showtimes. With --month or --date the listing is read from the snapshot store, scraping the theaters on a miss. Without either flag every cached movie is listed and nothing is fetched.")]
    Movies {
        /// Month to list (YYYY-MM)
        #[arg(long, value_name = "YYYY-MM", conflicts_with = "date")]
        month: Option<String>,

        /// Single day to list (YYYY-MM-DD)
        #[arg(long, value_name = "YYYY-MM-DD")]
        date: Option<String>,

        /// Ignore cached snapshots and scrape again
        #[arg(long, action = ArgAction::SetTrue)]
        refresh: bool,
    },
    /// Scrape the theaters again and replace the snapshots
    #[command(long_about = "Force a fresh scrape of every configured theater for one month (the current month by default) and store the result. With --date only that day's movies are printed, but the whole month is refreshed.")]
    Refresh {
        /// Month to refresh (YYYY-MM)
        #[arg(long, value_name = "YYYY-MM", conflicts_with = "date")]
        month: Option<String>,

        /// Refresh the month containing this day (YYYY-MM-DD)
        #[arg(long, value_name = "YYYY-MM-DD")]
        date: Option<String>,
    },
    /// Show snapshot store statistics
    Stats,
    /// Delete every stored snapshot
    Clear,
    /// Show or create the configuration file
    Config {
        #[command(subcommand)]
        cmd: ConfigCommands,
    },
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Show the effective configuration (masks the API key)
    Show {
        /// Show the full TMDB API key
        #[arg(long, action = ArgAction::SetTrue)]
        full: bool,
    },
    /// Write a default configuration file
    Init {
        /// Overwrite an existing configuration file
        #[arg(long, action = ArgAction::SetTrue)]
        force: bool,

        /// Store this TMDB API key in the credentials file
        #[arg(long, value_name = "KEY")]
        tmdb_api_key: Option<String>,
    },
}

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();

    logging::init_logging_with_file(cli.verbose, cli.quiet, cli.log_file)
        .map_err(|e| color_eyre::eyre::eyre!("{}", e))?;

    let output = output::Output::new(cli.output, cli.quiet);

    match cli.command {
        Commands::Movies { month, date, refresh } => movies::run_movies(month, date, refresh, &output).await,
        Commands::Refresh { month, date } => refresh::run_refresh(month, date, &output).await,
        Commands::Stats => stats::run_stats(&output),
        Commands::Clear => clear::run_clear(&output),
        Commands::Config { cmd } => config::run_config(cmd, &output),
    }
}
