// ABOUTME: SQL Server introspection and data reading
// ABOUTME: Reads column metadata from INFORMATION_SCHEMA and table rows for export

use crate::metadata::{Column, ColumnRecord, TableIdentity};
use crate::source::DataSource;
use crate::value::Row;
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use futures::TryStreamExt;
use tiberius::Client;
use tokio::net::TcpStream;
use tokio_util::compat::Compat;

const COLUMN_METADATA_QUERY: &str = r#"
    SELECT c.TABLE_CATALOG, c.TABLE_SCHEMA, c.TABLE_NAME, c.COLUMN_NAME,
           c.ORDINAL_POSITION, c.IS_NULLABLE, c.DATA_TYPE
    FROM INFORMATION_SCHEMA.COLUMNS c
    JOIN INFORMATION_SCHEMA.TABLES t
        ON c.TABLE_CATALOG = t.TABLE_CATALOG
        AND c.TABLE_SCHEMA = t.TABLE_SCHEMA
        AND c.TABLE_NAME = t.TABLE_NAME
    WHERE t.TABLE_TYPE = 'BASE TABLE'
        AND c.TABLE_SCHEMA = @P1
    ORDER BY c.TABLE_SCHEMA, c.TABLE_NAME, c.ORDINAL_POSITION
"#;

/// Export source backed by a live SQL Server connection
pub struct MssqlSource {
    client: Client<Compat<TcpStream>>,
}

impl MssqlSource {
    pub fn new(client: Client<Compat<TcpStream>>) -> Self {
        Self { client }
    }

    /// Close the underlying connection
    pub async fn close(self) -> Result<()> {
        self.client
            .close()
            .await
            .context("Failed to close SQL Server connection")
    }
}

#[async_trait]
impl DataSource for MssqlSource {
    async fn fetch_column_records(&mut self, schema: &str) -> Result<Vec<ColumnRecord>> {
        tracing::info!("Reading column metadata for schema '{}'", schema);

        let rows = self
            .client
            .query(COLUMN_METADATA_QUERY, &[&schema])
            .await
            .with_context(|| format!("Failed to query column metadata for schema '{}'", schema))?
            .into_first_result()
            .await
            .with_context(|| format!("Failed to read column metadata for schema '{}'", schema))?;

        let records = rows
            .iter()
            .map(parse_column_record)
            .collect::<Result<Vec<_>>>()?;

        tracing::info!(
            "Found {} column(s) in schema '{}'",
            records.len(),
            schema
        );

        Ok(records)
    }

    async fn fetch_rows(&mut self, select: &str) -> Result<Vec<Row>> {
        let mut stream = self
            .client
            .query(select, &[])
            .await
            .with_context(|| format!("Failed to execute query: {}", select))?
            .into_row_stream();

        let mut rows = Vec::new();
        let mut column_names: Option<Vec<String>> = None;

        while let Some(row) = stream
            .try_next()
            .await
            .with_context(|| format!("Failed to read rows for query: {}", select))?
        {
            let names = column_names.get_or_insert_with(|| {
                row.columns()
                    .iter()
                    .map(|c| c.name().to_string())
                    .collect()
            });
            rows.push(crate::mssql::converter::row_to_values(row, names)?);
        }

        Ok(rows)
    }
}

fn parse_column_record(row: &tiberius::Row) -> Result<ColumnRecord> {
    let ordinal_position: i32 = row
        .try_get("ORDINAL_POSITION")
        .context("Failed to decode ORDINAL_POSITION")?
        .ok_or_else(|| anyhow!("ORDINAL_POSITION was NULL"))?;

    Ok(ColumnRecord {
        table: TableIdentity {
            catalog: required_text(row, "TABLE_CATALOG")?,
            schema: required_text(row, "TABLE_SCHEMA")?,
            name: required_text(row, "TABLE_NAME")?,
        },
        column: Column {
            name: required_text(row, "COLUMN_NAME")?,
            ordinal_position,
            is_nullable: parse_is_nullable(&required_text(row, "IS_NULLABLE")?),
            data_type: required_text(row, "DATA_TYPE")?,
        },
    })
}

fn required_text(row: &tiberius::Row, column: &str) -> Result<String> {
    row.try_get::<&str, _>(column)
        .with_context(|| format!("Failed to decode {}", column))?
        .map(str::to_string)
        .ok_or_else(|| anyhow!("{} was NULL", column))
}

fn parse_is_nullable(raw: &str) -> bool {
    raw.trim().eq_ignore_ascii_case("YES")
}
