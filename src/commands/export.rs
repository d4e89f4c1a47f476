// ABOUTME: Export command: dump every table of a schema as INSERT files
// ABOUTME: Validates input, opens the SQL Server connection, and drives the table exporter

use crate::config::ExportConfig;
use crate::export::{header_comment, ExportSummary, TableExporter};
use crate::mssql::{self, ConnectionDetails, MssqlSource};
use anyhow::{Context, Result};

/// Export all base tables of `config.schema` into `config.directory`
///
/// The connection string and configuration are validated and the output
/// directory is created before any database interaction. The first error
/// aborts the run.
///
/// # Arguments
///
/// * `connection_string` - `<username>:<password>@<address>:<port>/<database>`
/// * `config` - Resolved export settings
/// * `trust_cert` - Accept the server certificate without validation
pub async fn export(
    connection_string: &str,
    config: ExportConfig,
    trust_cert: bool,
) -> Result<ExportSummary> {
    config.validate()?;
    let details = ConnectionDetails::parse(connection_string)?;

    let header = config
        .header
        .then(|| header_comment(&details.address, &details.database, &config.schema));

    tracing::info!(
        "Exporting schema '{}' of database '{}' to {}",
        crate::utils::sanitize_identifier(&config.schema),
        crate::utils::sanitize_identifier(&details.database),
        config.directory.display()
    );
    if !config.ignore_tables.is_empty() {
        tracing::info!("Ignoring tables: {}", config.ignore_tables.tables().join(", "));
    }

    let mut exporter = TableExporter::new(config, header)?;

    let client = mssql::connect(&details, trust_cert).await?;
    let mut source = MssqlSource::new(client);

    let summary = exporter.export_schema(&mut source).await?;

    source
        .close()
        .await
        .context("Export finished but the connection did not close cleanly")?;

    Ok(summary)
}
