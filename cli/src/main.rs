mod commands;
mod config;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process;
use tracing_subscriber::EnvFilter;

use crate::commands::{
    cmd_delete, cmd_edit, cmd_export_consumption, cmd_export_varieties, cmd_history,
    cmd_import_consumption, cmd_import_varieties, cmd_log, cmd_stats, cmd_summary,
    cmd_variety_add, cmd_variety_delete, cmd_variety_list, cmd_variety_set_caffeine,
};
use crate::config::Config;
use cuppa_core::db::Database;

#[derive(Parser)]
#[command(
    name = "cuppa",
    version,
    about = "A simple coffee consumption tracker CLI",
    long_about = "\n
       ( (
        ) )
     ........
     |      |]
     \\      /
      `----'
  know what you're drinking.
"
)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Log cups of a variety for a day
    Log {
        /// Number of cups
        cups: i64,
        /// Variety name (must exist in the catalog)
        variety: String,
        /// Date to log for (YYYY-MM-DD or today/yesterday, default: today)
        #[arg(long)]
        date: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show one day's entries and caffeine (defaults to today)
    Summary {
        /// Date to show (YYYY-MM-DD or today/yesterday, default: today)
        date: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show per-day totals for the last N days
    History {
        /// Number of days to cover
        #[arg(short, long, default_value = "7")]
        days: u32,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show caffeine statistics and the per-variety breakdown
    Stats {
        /// Restrict to the last N days (default: everything)
        #[arg(short, long)]
        days: Option<u32>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Delete a consumption entry by ID
    Delete {
        /// Entry ID to delete
        entry_id: i64,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Apply a bulk-edited entries CSV against the ledger
    ///
    /// The file uses the consumption export columns (id,date,cups,variety).
    /// Rows missing from the file are deleted, changed rows are updated,
    /// and rows with a blank or unknown id are inserted as new entries.
    Edit {
        /// Path to the edited CSV
        file: PathBuf,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Manage the variety catalog
    Variety {
        #[command(subcommand)]
        command: VarietyCommands,
    },
    /// Import varieties or consumption entries from CSV
    Import {
        #[command(subcommand)]
        command: ImportCommands,
    },
    /// Export varieties or consumption entries as CSV
    Export {
        #[command(subcommand)]
        command: ExportCommands,
    },
}

#[derive(Subcommand)]
enum VarietyCommands {
    /// Add a variety
    Add {
        /// Variety name
        name: String,
        /// Caffeine per cup in milligrams
        #[arg(long, default_value = "0")]
        caffeine: i64,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// List all varieties
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Overwrite a variety's caffeine-per-cup value
    SetCaffeine {
        /// Variety name
        name: String,
        /// New caffeine per cup in milligrams
        caffeine_mg: i64,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Delete varieties by name (varieties still in use are refused)
    Delete {
        /// Variety names to delete
        #[arg(required = true)]
        names: Vec<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
enum ImportCommands {
    /// Import varieties from a `name,caffeine_mg` CSV
    Varieties {
        /// Path to the CSV file
        file: PathBuf,
        /// Preview import without making changes
        #[arg(long)]
        dry_run: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Import consumption entries from a `date,cups,variety` CSV
    Consumption {
        /// Path to the CSV file
        file: PathBuf,
        /// Preview import without making changes
        #[arg(long)]
        dry_run: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
enum ExportCommands {
    /// Export the variety catalog as CSV
    Varieties {
        /// Write to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Export the consumption ledger as CSV
    Consumption {
        /// Write to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn main() {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env()
    };
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();

    if let Err(e) = run(cli) {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = Config::load()?;
    let db = Database::open(&config.db_path)?;
    tracing::debug!(path = %config.db_path.display(), "database opened");

    match cli.command {
        Commands::Log {
            cups,
            variety,
            date,
            json,
        } => cmd_log(&db, cups, &variety, date, json),
        Commands::Summary { date, json } => cmd_summary(&db, date, json),
        Commands::History { days, json } => cmd_history(&db, days, json),
        Commands::Stats { days, json } => cmd_stats(&db, days, json),
        Commands::Delete { entry_id, json } => cmd_delete(&db, entry_id, json),
        Commands::Edit { file, json } => cmd_edit(&db, &file, json),
        Commands::Variety { command } => match command {
            VarietyCommands::Add {
                name,
                caffeine,
                json,
            } => cmd_variety_add(&db, &name, caffeine, json),
            VarietyCommands::List { json } => cmd_variety_list(&db, json),
            VarietyCommands::SetCaffeine {
                name,
                caffeine_mg,
                json,
            } => cmd_variety_set_caffeine(&db, &name, caffeine_mg, json),
            VarietyCommands::Delete { names, json } => cmd_variety_delete(&db, &names, json),
        },
        Commands::Import { command } => match command {
            ImportCommands::Varieties {
                file,
                dry_run,
                json,
            } => cmd_import_varieties(&db, &file, dry_run, json),
            ImportCommands::Consumption {
                file,
                dry_run,
                json,
            } => cmd_import_consumption(&db, &file, dry_run, json),
        },
        Commands::Export { command } => match command {
            ExportCommands::Varieties { output } => cmd_export_varieties(&db, output.as_deref()),
            ExportCommands::Consumption { output } => {
                cmd_export_consumption(&db, output.as_deref())
            }
        },
    }
}
