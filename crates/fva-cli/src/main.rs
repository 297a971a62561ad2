mod analysis;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "fva-cli")]
#[command(about = "Franchise visit analytics command line interface")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Parse a CSV export from disk and persist its rows
    Ingest {
        /// Path to the CSV file
        file: PathBuf,
        /// Parse and report counts without writing to the database
        #[arg(long)]
        dry_run: bool,
    },
    /// Show whole-table averages for the stored rows
    Stats,
    /// Rank region/age groups by estimated monthly revenue
    Report {
        /// Hide groups with fewer samples than this
        #[arg(long, default_value = "5")]
        min_samples: usize,
    },
    /// Delete every stored row
    Reset {
        /// Confirm the deletion
        #[arg(long)]
        yes: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let pool = fva_db::connect_pool_from_env().await?;
    fva_db::run_migrations(&pool).await?;

    match cli.command {
        Commands::Ingest { file, dry_run } => analysis::run_ingest(&pool, &file, dry_run).await,
        Commands::Stats => analysis::run_stats(&pool).await,
        Commands::Report { min_samples } => analysis::run_report(&pool, min_samples).await,
        Commands::Reset { yes } => analysis::run_reset(&pool, yes).await,
    }
}
