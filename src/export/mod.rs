// ABOUTME: Table data export as batched INSERT statement files
// ABOUTME: Enumerates tables, renders INSERT batches, groups them into files and writes them

pub mod writer;

pub use writer::OutputWriter;

use crate::chunk::chunk_slices;
use crate::config::ExportConfig;
use crate::filters::IgnoreList;
use crate::metadata::{assemble_tables, TableIdentity, TableMetadata};
use crate::source::DataSource;
use crate::utils::{
    format_bytes, format_duration, quote_identifier, sanitize_file_component, sanitize_identifier,
};
use crate::value::{Row, SqlValue};
use anyhow::{Context, Result};
use std::path::PathBuf;
use std::time::Instant;

/// Outcome of exporting a single table
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TableExport {
    pub rows: usize,
    pub files: Vec<PathBuf>,
}

/// Totals for a whole run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExportSummary {
    pub tables: usize,
    pub rows: usize,
    pub files: usize,
    pub bytes: u64,
}

/// Read column metadata for every exportable table in `schema`
///
/// Tables named in `ignore` never make it into the result.
pub async fn enumerate_tables<S>(
    source: &mut S,
    schema: &str,
    ignore: &IgnoreList,
) -> Result<Vec<TableMetadata>>
where
    S: DataSource + ?Sized,
{
    let records = source
        .fetch_column_records(schema)
        .await
        .with_context(|| format!("Failed to enumerate tables in schema '{}'", schema))?;

    let tables = assemble_tables(ignore.retain_records(records));

    tracing::info!(
        "Found {} table(s) to export in schema '{}'",
        tables.len(),
        sanitize_identifier(schema)
    );

    Ok(tables)
}

/// `[catalog].[schema].[table]`
pub fn qualified_name(identity: &TableIdentity) -> String {
    format!(
        "{}.{}.{}",
        quote_identifier(&identity.catalog),
        quote_identifier(&identity.schema),
        quote_identifier(&identity.name)
    )
}

fn column_list(table: &TableMetadata) -> String {
    table
        .column_names()
        .map(quote_identifier)
        .collect::<Vec<_>>()
        .join(", ")
}

/// SELECT naming every column in ordinal order
///
/// # Examples
///
/// ```
/// # use sqldatadump::export::select_statement;
/// # use sqldatadump::metadata::{assemble_tables, Column, ColumnRecord, TableIdentity};
/// let record = |name: &str, ordinal| ColumnRecord {
///     table: TableIdentity::new("shop", "dbo", "Widgets"),
///     column: Column {
///         name: name.to_string(),
///         ordinal_position: ordinal,
///         is_nullable: false,
///         data_type: "int".to_string(),
///     },
/// };
/// let tables = assemble_tables(vec![record("Id", 1), record("Name", 2)]);
/// assert_eq!(
///     select_statement(&tables[0]),
///     "SELECT [Id], [Name] FROM [shop].[dbo].[Widgets]"
/// );
/// ```
pub fn select_statement(table: &TableMetadata) -> String {
    format!(
        "SELECT {} FROM {}",
        column_list(table),
        qualified_name(&table.identity)
    )
}

/// `INSERT INTO <table> (<columns>) VALUES` with the same column order as the SELECT
pub fn insert_prefix(table: &TableMetadata) -> String {
    format!(
        "INSERT INTO {} ({}) VALUES",
        qualified_name(&table.identity),
        column_list(table)
    )
}

/// Render one row as a parenthesized value list in column order
///
/// Columns absent from the row are written as NULL.
pub fn render_row(table: &TableMetadata, row: &Row) -> String {
    let values = table
        .column_names()
        .map(|name| {
            row.get(name)
                .map_or_else(|| SqlValue::Null.to_sql_literal(), SqlValue::to_sql_literal)
        })
        .collect::<Vec<_>>()
        .join(", ");
    format!("({})", values)
}

/// Render rows as multi-row INSERT statements of at most `rows_per_batch` rows
pub fn render_insert_statements(
    table: &TableMetadata,
    rows: &[Row],
    rows_per_batch: usize,
) -> Vec<String> {
    let prefix = insert_prefix(table);

    chunk_slices(rows, rows_per_batch)
        .into_iter()
        .map(|batch| {
            let values = batch
                .iter()
                .map(|row| format!("\n  {}", render_row(table, row)))
                .collect::<Vec<_>>()
                .join(",");
            format!("{}{}", prefix, values)
        })
        .collect()
}

/// Comment block placed at the top of each file when headers are enabled
pub fn header_comment(address: &str, database: &str, schema: &str) -> String {
    format!(
        "/*\n\tData Dump Created by sqldatadump\n\n\tData Exported from {}/{}/{}\n*/\n\n",
        address, database, schema
    )
}

/// Wrap a group of statements in an IDENTITY_INSERT ON/OFF bracket
pub fn render_file(
    identity: &TableIdentity,
    statements: &[String],
    header: Option<&str>,
) -> String {
    let target = format!(
        "{}.{}",
        quote_identifier(&identity.schema),
        quote_identifier(&identity.name)
    );

    format!(
        "{}SET IDENTITY_INSERT {} ON\n\n{}\n\nSET IDENTITY_INSERT {} OFF\n",
        header.unwrap_or(""),
        target,
        statements.join("\n\n"),
        target
    )
}

/// `<catalog>_<schema>_<table>` with unsafe file-name characters replaced
pub fn file_stem(identity: &TableIdentity) -> String {
    format!(
        "{}_{}_{}",
        sanitize_file_component(&identity.catalog),
        sanitize_file_component(&identity.schema),
        sanitize_file_component(&identity.name)
    )
}

/// `<stem>_<group>.sql`, group index 1-based
pub fn group_file_name(stem: &str, group_index: usize) -> String {
    format!("{}_{}.sql", stem, group_index)
}

/// Exports tables one at a time into an output directory
#[derive(Debug)]
pub struct TableExporter {
    config: ExportConfig,
    writer: OutputWriter,
    header: Option<String>,
}

impl TableExporter {
    /// Prepare the output directory for `config`
    ///
    /// `header` is written verbatim at the top of every file.
    pub fn new(config: ExportConfig, header: Option<String>) -> Result<Self> {
        let writer = OutputWriter::create(&config.directory)?;
        Ok(Self {
            config,
            writer,
            header,
        })
    }

    /// Enumerate the configured schema and export every table in order
    ///
    /// Stops at the first error; files already written stay on disk.
    pub async fn export_schema<S>(&mut self, source: &mut S) -> Result<ExportSummary>
    where
        S: DataSource + ?Sized,
    {
        let started = Instant::now();
        let tables = enumerate_tables(
            &mut *source,
            &self.config.schema,
            &self.config.ignore_tables,
        )
        .await?;

        let mut summary = ExportSummary::default();
        for table in &tables {
            let exported = self.export_table(&mut *source, table).await?;
            summary.tables += 1;
            summary.rows += exported.rows;
            summary.files += exported.files.len();
        }
        summary.bytes = self.writer.bytes_written();

        tracing::info!(
            "✓ Exported {} row(s) from {} table(s) into {} file(s) ({}) in {}",
            summary.rows,
            summary.tables,
            summary.files,
            format_bytes(summary.bytes),
            format_duration(started.elapsed())
        );

        Ok(summary)
    }

    /// Fetch, render and write one table
    pub async fn export_table<S>(
        &mut self,
        source: &mut S,
        table: &TableMetadata,
    ) -> Result<TableExport>
    where
        S: DataSource + ?Sized,
    {
        let table_label = sanitize_identifier(&table.identity.to_string());
        let started = Instant::now();

        let select = select_statement(table);
        let rows = source
            .fetch_rows(&select)
            .await
            .with_context(|| format!("Failed to fetch rows from {}", table_label))?;
        tracing::info!(
            "Retrieved {} row(s) from {} in {}",
            rows.len(),
            table_label,
            format_duration(started.elapsed())
        );

        let render_started = Instant::now();
        let statements = render_insert_statements(table, &rows, self.config.rows_per_batch);
        let row_count = rows.len();
        drop(rows);
        tracing::info!(
            "Created {} insert statement(s) for {} in {}",
            statements.len(),
            table_label,
            format_duration(render_started.elapsed())
        );

        let write_started = Instant::now();
        let groups = chunk_slices(&statements, self.config.batches_per_file);
        let stem = if groups.is_empty() {
            String::new()
        } else {
            self.writer
                .claim_stem(&table.identity.to_string(), &file_stem(&table.identity))
        };

        let mut files = Vec::new();
        for (index, group) in groups.into_iter().enumerate() {
            let contents = render_file(&table.identity, group, self.header.as_deref());
            let path = self
                .writer
                .write_file(&group_file_name(&stem, index + 1), &contents)
                .with_context(|| format!("Failed to write export file for {}", table_label))?;
            files.push(path);
        }
        tracing::info!(
            "Wrote {} file(s) for {} in {}",
            files.len(),
            table_label,
            format_duration(write_started.elapsed())
        );

        tracing::info!(
            "✓ Completed data dump for {} in {}",
            table_label,
            format_duration(started.elapsed())
        );

        Ok(TableExport {
            rows: row_count,
            files,
        })
    }
}
