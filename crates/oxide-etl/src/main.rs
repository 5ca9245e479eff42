//! oxide-etl CLI
//!
//! Reads rows from a SQLite database and prints SQL for another dialect.

mod export;
mod params;
mod source;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use sqlx::sqlite::SqlitePoolOptions;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use oxide_etl_core::sql_utils::PopulateOptions;
use oxide_etl_core::{driver, ConversionParams};

use crate::export::Mode;
use crate::source::SourceQuery;

/// Move query results between SQL dialects.
#[derive(Parser)]
#[command(name = "oxide-etl")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Database URL (SQLite path or connection string).
    #[arg(short, long, env = "DATABASE_URL", default_value = "sqlite:db.sqlite3")]
    database: String,

    /// JSON file with date, time and timestamp formats.
    #[arg(short, long)]
    params: Option<PathBuf>,

    /// Enable verbose output.
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print a create table statement for the shape of a query result.
    Ddl {
        /// Source query.
        #[arg(short, long)]
        query: String,

        /// Target table name.
        #[arg(short, long)]
        table: String,

        /// Target dialect (generic, oracle, sqlserver, postgres, mysql, sqlite).
        #[arg(short = 'D', long, default_value = "generic")]
        dialect: String,

        /// Comma-delimited primary key fields.
        #[arg(short, long)]
        key: Option<String>,
    },

    /// Print one statement per row of a query result.
    Export {
        /// Source query.
        #[arg(short, long)]
        query: String,

        /// Target table name.
        #[arg(short, long)]
        table: String,

        /// Target dialect (generic, oracle, sqlserver, postgres, mysql, sqlite).
        #[arg(short = 'D', long, default_value = "generic")]
        dialect: String,

        /// Statement kind.
        #[arg(short, long, value_enum, default_value_t = Mode::Insert)]
        mode: Mode,

        /// Comma-delimited key fields for update, delete and merge.
        #[arg(short, long)]
        key: Option<String>,

        /// Stop after this many rows.
        #[arg(long)]
        max_rows: Option<usize>,

        /// Skip rows identical to an earlier row.
        #[arg(long)]
        unique: bool,

        /// Filter expression, e.g. `amount > 10 and region <> 'north'`.
        #[arg(short, long)]
        filter: Option<String>,

        /// Sort expression, e.g. `region desc, id`.
        #[arg(short, long)]
        sort: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let log_level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let conversion = match &cli.params {
        Some(path) => params::load(path)?,
        None => ConversionParams::default(),
    };

    // Connect to database
    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect(&cli.database)
        .await?;

    match cli.command {
        Commands::Ddl {
            query,
            table,
            dialect,
            key,
        } => {
            let target = driver::by_name(&dialect)?;
            let request = SourceQuery {
                query,
                table,
                key,
                // Only the column shape is needed.
                options: PopulateOptions {
                    max_rows: Some(0),
                    ..PopulateOptions::default()
                },
                ..SourceQuery::default()
            };
            let ds = source::load(&pool, &request).await?;
            print!("{}", export::ddl(&ds, target.as_ref())?);
        }

        Commands::Export {
            query,
            table,
            dialect,
            mode,
            key,
            max_rows,
            unique,
            filter,
            sort,
        } => {
            let target = driver::by_name(&dialect)?;
            let request = SourceQuery {
                query,
                table,
                key: key.clone(),
                filter,
                options: PopulateOptions {
                    unique,
                    max_rows,
                    ..PopulateOptions::default()
                },
            };
            let mut ds = source::load(&pool, &request).await?;
            if let Some(sort) = sort {
                ds.sort_by_string(&sort)?;
            }
            export::normalize_temporal_text(&mut ds, &conversion);
            let sql = export::statements(&ds, target.as_ref(), mode, key.as_deref())?;
            print!("{sql}");
            info!(
                records = ds.record_count(),
                dialect = target.name(),
                "export finished"
            );
        }
    }

    Ok(())
}
