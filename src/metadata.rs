// ABOUTME: Table and column metadata read from INFORMATION_SCHEMA
// ABOUTME: Assembles flat (table, column) records into per-table column lists

use std::collections::HashMap;
use std::fmt;

/// Fully qualified identity of a table
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TableIdentity {
    pub catalog: String,
    pub schema: String,
    pub name: String,
}

impl TableIdentity {
    pub fn new(
        catalog: impl Into<String>,
        schema: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            catalog: catalog.into(),
            schema: schema.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for TableIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}].[{}].[{}]", self.catalog, self.schema, self.name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    pub name: String,
    /// 1-based position within the table
    pub ordinal_position: i32,
    pub is_nullable: bool,
    pub data_type: String,
}

/// One row of the column metadata query
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnRecord {
    pub table: TableIdentity,
    pub column: Column,
}

/// Columns of a single table in ordinal order, plus a lookup by name
#[derive(Debug, Clone)]
pub struct TableMetadata {
    pub identity: TableIdentity,
    columns: Vec<Column>,
    column_map: HashMap<String, Column>,
}

impl TableMetadata {
    fn new(identity: TableIdentity) -> Self {
        Self {
            identity,
            columns: Vec::new(),
            column_map: HashMap::new(),
        }
    }

    fn push_column(&mut self, column: Column) {
        // A repeated name keeps both list entries; the map keeps the last one
        self.column_map.insert(column.name.clone(), column.clone());
        self.columns.push(column);
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.column_map.get(name)
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.name.as_str())
    }
}

/// Group flat column records into one `TableMetadata` per table
///
/// Records must arrive grouped by table and ordered by ordinal position within
/// each table. A new table starts whenever the identity changes from the
/// previous record; tables keep their first-seen order and columns are kept
/// exactly as they arrive.
pub fn assemble_tables(records: impl IntoIterator<Item = ColumnRecord>) -> Vec<TableMetadata> {
    let mut tables: Vec<TableMetadata> = Vec::new();

    for record in records {
        let starts_new_table = tables
            .last()
            .map_or(true, |current| current.identity != record.table);
        if starts_new_table {
            tables.push(TableMetadata::new(record.table));
        }
        if let Some(current) = tables.last_mut() {
            current.push_column(record.column);
        }
    }

    tracing::debug!("Assembled metadata for {} table(s)", tables.len());

    tables
}
