// ABOUTME: Query interface the exporter needs from a database connection
// ABOUTME: Implemented over tiberius for SQL Server and in memory for tests

use crate::metadata::ColumnRecord;
use crate::value::Row;
use anyhow::Result;
use async_trait::async_trait;

/// Read-only access to the database being exported
///
/// The connection is used sequentially: first for metadata, then once per
/// table for its rows.
#[async_trait]
pub trait DataSource: Send {
    /// Column metadata for every base table in `schema`
    ///
    /// Records are ordered by schema, table name, then ordinal position.
    async fn fetch_column_records(&mut self, schema: &str) -> Result<Vec<ColumnRecord>>;

    /// Run a SELECT and return every row keyed by column name, in the order
    /// the database produced them. No rows is an empty vector, not an error.
    async fn fetch_rows(&mut self, select: &str) -> Result<Vec<Row>>;
}
