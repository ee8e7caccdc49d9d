//! rq: compile, render and run RSQL filter queries.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod commands;
mod error;

#[derive(Parser)]
#[command(name = "rq")]
#[command(about = "RSQL filter queries - compile to SQL, render inline, run on DuckDB")]
#[command(version)]
struct Cli {
    /// Config file (default: $RSQL_CONFIG, then the platform config dir)
    #[arg(short = 'c', long = "config", global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short = 'v', long = "verbose", global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile a query into a parameterized SQL fragment and its arguments
    #[command(visible_alias = "c")]
    Compile {
        /// Filter query (e.g. "name==bob;age=gt=30", "status=in=(open,closed)")
        query: String,

        /// Entity from the config file (column mapping and key policy)
        #[arg(short = 'e', long = "entity")]
        entity: Option<String>,

        /// Allow only these keys (repeatable, `prefix*` accepted)
        #[arg(short = 'a', long = "allow")]
        allow: Vec<String>,

        /// Reject these keys (repeatable, `prefix*` accepted)
        #[arg(short = 'd', long = "deny")]
        deny: Vec<String>,

        /// Target dialect (overrides config)
        #[arg(short = 'D', long = "dialect")]
        dialect: Option<filter::Dialect>,

        /// Output format: sql, json
        #[arg(short = 'f', long = "format", default_value = "sql")]
        format: String,

        /// Expand list arguments into one placeholder per value
        #[arg(short = 'x', long = "expand")]
        expand: bool,
    },

    /// Render a query with values inline
    #[command(visible_alias = "r")]
    Render {
        /// Filter query
        query: String,

        /// Target: mysql, mongo
        #[arg(short = 'D', long = "dialect", value_enum, default_value = "mysql")]
        dialect: InlineDialect,
    },

    /// Run a query against a table in a DuckDB database
    #[command(visible_alias = "s")]
    Select {
        /// Filter query
        query: String,

        /// DuckDB database file
        #[arg(long = "db")]
        db: PathBuf,

        /// Table to filter
        #[arg(short = 't', long = "table")]
        table: String,

        /// Entity from the config file (column mapping and key policy)
        #[arg(short = 'e', long = "entity")]
        entity: Option<String>,

        /// Maximum number of rows
        #[arg(short = 'n', long = "limit")]
        limit: Option<usize>,

        /// Output format: table, json
        #[arg(short = 'f', long = "format", default_value = "table")]
        format: String,
    },
}

#[derive(Clone, Copy, ValueEnum)]
pub enum InlineDialect {
    Mysql,
    Mongo,
}

fn main() {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"))
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();

    let result = commands::load_config(cli.config.as_deref()).and_then(|config| match cli.command {
        Commands::Compile { query, entity, allow, deny, dialect, format, expand } => {
            let opts = commands::CompileOptions {
                entity: entity.as_deref(),
                allow,
                deny,
                dialect,
                format: &format,
                expand,
            };
            commands::compile(&config, &query, &opts)
        }
        Commands::Render { query, dialect } => commands::render(&config, &query, dialect),
        Commands::Select { query, db, table, entity, limit, format } => {
            commands::select(&config, &query, &db, &table, entity.as_deref(), limit, &format)
        }
    });

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
