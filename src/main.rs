// ABOUTME: CLI entry point for sqldatadump
// ABOUTME: Parses flags, merges config file values, and runs the export

use clap::Parser;
use sqldatadump::commands;
use sqldatadump::config::{load_config_file, ConfigOverrides};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "sqldatadump")]
#[command(
    about = "Export SQL Server table data as batched INSERT statement files",
    long_about = None
)]
struct Cli {
    /// Root directory to export to
    #[arg(long)]
    directory: Option<PathBuf>,
    /// Schema to export [default: dbo]
    #[arg(long)]
    schema: Option<String>,
    /// Number of rows per INSERT statement [default: 1000]
    #[arg(long, alias = "rowsPerBatch")]
    rows_per_batch: Option<usize>,
    /// Number of INSERT statements per file [default: 10]
    #[arg(long, alias = "batchesPerFile")]
    batches_per_file: Option<usize>,
    /// Tables that should be ignored (comma-separated)
    #[arg(long, alias = "ignoreTables", value_delimiter = ',')]
    ignore_tables: Option<Vec<String>>,
    /// TOML file with default values for the options above
    #[arg(long)]
    config: Option<PathBuf>,
    /// Start every file with a comment naming the export source
    #[arg(long)]
    header: bool,
    /// Trust the server certificate without validation
    #[arg(long)]
    trust_cert: bool,
    /// <username>:<password>@<address>:<port>/<database>
    connection: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging - default to INFO level if RUST_LOG not set
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let flags = ConfigOverrides {
        directory: cli.directory,
        schema: cli.schema,
        rows_per_batch: cli.rows_per_batch,
        batches_per_file: cli.batches_per_file,
        ignore_tables: cli.ignore_tables,
        header: cli.header.then_some(true),
    };
    let file = match cli.config {
        Some(path) => load_config_file(&path)?,
        None => ConfigOverrides::default(),
    };
    let config = flags.or(file).resolve()?;

    commands::export(&cli.connection, config, cli.trust_cert).await?;

    Ok(())
}
