// ABOUTME: Table filtering for selective export
// ABOUTME: Handles the comma-separated ignore-table list

use crate::metadata::ColumnRecord;

/// Tables that must never be exported
///
/// Matching is case-sensitive and exact on the bare table name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IgnoreList {
    tables: Vec<String>,
}

impl IgnoreList {
    /// Creates a list from already separated table names
    pub fn new<I, S>(tables: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let tables = tables
            .into_iter()
            .map(|t| t.as_ref().trim().to_string())
            .filter(|t| !t.is_empty())
            .collect();
        Self { tables }
    }

    /// Parses the `--ignore-tables` flag value
    ///
    /// # Examples
    ///
    /// ```
    /// # use sqldatadump::filters::IgnoreList;
    /// let ignore = IgnoreList::parse(" AuditLog, __EFMigrationsHistory ,");
    /// assert!(ignore.contains("AuditLog"));
    /// assert!(!ignore.contains("auditlog"));
    /// assert_eq!(ignore.len(), 2);
    /// ```
    pub fn parse(raw: &str) -> Self {
        Self::new(raw.split(','))
    }

    /// Creates an empty list (export everything)
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn tables(&self) -> &[String] {
        &self.tables
    }

    pub fn contains(&self, table_name: &str) -> bool {
        self.tables.iter().any(|t| t == table_name)
    }

    /// Determines if a table should be exported
    pub fn should_export_table(&self, table_name: &str) -> bool {
        !self.contains(table_name)
    }

    /// Drops metadata records belonging to ignored tables
    pub fn retain_records(&self, records: Vec<ColumnRecord>) -> Vec<ColumnRecord> {
        if self.is_empty() {
            return records;
        }
        records
            .into_iter()
            .filter(|r| self.should_export_table(&r.table.name))
            .collect()
    }
}
