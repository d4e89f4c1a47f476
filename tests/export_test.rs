// ABOUTME: Integration tests for the table export workflow
// ABOUTME: Drives enumeration, batching and file writing against an in-memory source

use anyhow::{bail, Result};
use async_trait::async_trait;
use sqldatadump::config::ExportConfig;
use sqldatadump::export::{enumerate_tables, TableExporter};
use sqldatadump::filters::IgnoreList;
use sqldatadump::metadata::{Column, ColumnRecord, TableIdentity};
use sqldatadump::source::DataSource;
use sqldatadump::value::{Row, SqlValue};
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

/// In-memory stand-in for a database connection
#[derive(Default)]
struct MemorySource {
    records: Vec<ColumnRecord>,
    rows: HashMap<String, Vec<Row>>,
    failing_table: Option<String>,
    selects: Vec<String>,
}

impl MemorySource {
    fn with_table(mut self, table: &str, columns: &[(&str, &str)], rows: Vec<Row>) -> Self {
        for (i, (name, data_type)) in columns.iter().enumerate() {
            self.records.push(ColumnRecord {
                table: TableIdentity::new("shop", "dbo", table),
                column: Column {
                    name: name.to_string(),
                    ordinal_position: i as i32 + 1,
                    is_nullable: i > 0,
                    data_type: data_type.to_string(),
                },
            });
        }
        self.rows.insert(table.to_string(), rows);
        self
    }

    fn failing_on(mut self, table: &str) -> Self {
        self.failing_table = Some(table.to_string());
        self
    }
}

#[async_trait]
impl DataSource for MemorySource {
    async fn fetch_column_records(&mut self, schema: &str) -> Result<Vec<ColumnRecord>> {
        Ok(self
            .records
            .iter()
            .filter(|r| r.table.schema == schema)
            .cloned()
            .collect())
    }

    async fn fetch_rows(&mut self, select: &str) -> Result<Vec<Row>> {
        self.selects.push(select.to_string());

        let table = select
            .rsplit_once(".[")
            .map(|(_, name)| name.trim_end_matches(']').to_string())
            .unwrap_or_default();

        if self.failing_table.as_deref() == Some(table.as_str()) {
            bail!("Invalid object name '{}'", table);
        }

        Ok(self.rows.get(&table).cloned().unwrap_or_default())
    }
}

fn widget(id: i64, name: &str) -> Row {
    let mut row = Row::new();
    row.insert("Id".to_string(), SqlValue::Int(id));
    row.insert("Name".to_string(), SqlValue::from(name));
    row
}

fn config(dir: &Path, rows_per_batch: usize, batches_per_file: usize) -> ExportConfig {
    ExportConfig {
        directory: dir.to_path_buf(),
        schema: "dbo".to_string(),
        rows_per_batch,
        batches_per_file,
        ignore_tables: IgnoreList::empty(),
        header: false,
    }
}

fn sql_files(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

const WIDGET_COLUMNS: &[(&str, &str)] = &[("Id", "int"), ("Name", "varchar")];

#[tokio::test]
async fn test_one_row_per_file() {
    let out = TempDir::new().unwrap();
    let mut source = MemorySource::default().with_table(
        "Widgets",
        WIDGET_COLUMNS,
        vec![widget(1, "a"), widget(2, "b")],
    );

    let mut exporter = TableExporter::new(config(out.path(), 1, 1), None).unwrap();
    let summary = exporter.export_schema(&mut source).await.unwrap();

    assert_eq!(summary.tables, 1);
    assert_eq!(summary.rows, 2);
    assert_eq!(summary.files, 2);
    assert_eq!(
        sql_files(out.path()),
        vec!["shop_dbo_Widgets_1.sql", "shop_dbo_Widgets_2.sql"]
    );

    let first = fs::read_to_string(out.path().join("shop_dbo_Widgets_1.sql")).unwrap();
    assert_eq!(
        first,
        "SET IDENTITY_INSERT [dbo].[Widgets] ON\n\n\
         INSERT INTO [shop].[dbo].[Widgets] ([Id], [Name]) VALUES\n  (1, 'a')\n\n\
         SET IDENTITY_INSERT [dbo].[Widgets] OFF\n"
    );

    let second = fs::read_to_string(out.path().join("shop_dbo_Widgets_2.sql")).unwrap();
    assert!(second.contains("VALUES\n  (2, 'b')\n"));
    assert_eq!(second.matches("INSERT INTO").count(), 1);
    assert!(second.starts_with("SET IDENTITY_INSERT [dbo].[Widgets] ON"));
    assert!(second.ends_with("SET IDENTITY_INSERT [dbo].[Widgets] OFF\n"));
}

#[tokio::test]
async fn test_batches_and_files_are_bounded() {
    let out = TempDir::new().unwrap();
    let rows = (1..=5).map(|i| widget(i, "w")).collect();
    let mut source = MemorySource::default().with_table("Widgets", WIDGET_COLUMNS, rows);

    let mut exporter = TableExporter::new(config(out.path(), 2, 2), None).unwrap();
    let summary = exporter.export_schema(&mut source).await.unwrap();

    // 5 rows -> 3 statements (2, 2, 1) -> 2 files (2, 1)
    assert_eq!(summary.files, 2);

    let first = fs::read_to_string(out.path().join("shop_dbo_Widgets_1.sql")).unwrap();
    assert_eq!(first.matches("INSERT INTO").count(), 2);
    assert!(first.contains("(1, 'w'),\n  (2, 'w')"));
    assert!(first.contains("(3, 'w'),\n  (4, 'w')"));

    let second = fs::read_to_string(out.path().join("shop_dbo_Widgets_2.sql")).unwrap();
    assert_eq!(second.matches("INSERT INTO").count(), 1);
    assert!(second.contains("VALUES\n  (5, 'w')\n"));
}

#[tokio::test]
async fn test_ignored_tables_are_never_exported() {
    let out = TempDir::new().unwrap();
    let mut source = MemorySource::default()
        .with_table("AuditLog", &[("Id", "int")], vec![])
        .with_table("Widgets", WIDGET_COLUMNS, vec![widget(1, "a")]);

    let tables = enumerate_tables(&mut source, "dbo", &IgnoreList::parse("AuditLog"))
        .await
        .unwrap();
    assert_eq!(tables.len(), 1);
    assert_eq!(tables[0].identity.name, "Widgets");

    let mut cfg = config(out.path(), 10, 10);
    cfg.ignore_tables = IgnoreList::parse("AuditLog");
    let mut exporter = TableExporter::new(cfg, None).unwrap();
    exporter.export_schema(&mut source).await.unwrap();

    assert_eq!(sql_files(out.path()), vec!["shop_dbo_Widgets_1.sql"]);
    assert!(source.selects.iter().all(|s| !s.contains("AuditLog")));
}

#[tokio::test]
async fn test_empty_table_writes_no_files() {
    let out = TempDir::new().unwrap();
    let mut source = MemorySource::default().with_table("Empty", &[("Id", "int")], vec![]);

    let mut exporter = TableExporter::new(config(out.path(), 10, 10), None).unwrap();
    let summary = exporter.export_schema(&mut source).await.unwrap();

    assert_eq!(summary.tables, 1);
    assert_eq!(summary.rows, 0);
    assert_eq!(summary.files, 0);
    assert!(sql_files(out.path()).is_empty());
}

#[tokio::test]
async fn test_tables_are_exported_in_enumeration_order() {
    let out = TempDir::new().unwrap();
    let mut source = MemorySource::default()
        .with_table("Alpha", &[("Id", "int")], vec![])
        .with_table("Beta", &[("Id", "int")], vec![])
        .with_table("Gamma", &[("Id", "int")], vec![]);

    let mut exporter = TableExporter::new(config(out.path(), 10, 10), None).unwrap();
    exporter.export_schema(&mut source).await.unwrap();

    assert_eq!(
        source.selects,
        vec![
            "SELECT [Id] FROM [shop].[dbo].[Alpha]",
            "SELECT [Id] FROM [shop].[dbo].[Beta]",
            "SELECT [Id] FROM [shop].[dbo].[Gamma]",
        ]
    );
}

#[tokio::test]
async fn test_fetch_error_aborts_the_run() {
    let out = TempDir::new().unwrap();
    let mut source = MemorySource::default()
        .with_table("Alpha", WIDGET_COLUMNS, vec![widget(1, "a")])
        .with_table("Beta", WIDGET_COLUMNS, vec![widget(2, "b")])
        .with_table("Gamma", WIDGET_COLUMNS, vec![widget(3, "c")])
        .failing_on("Beta");

    let mut exporter = TableExporter::new(config(out.path(), 10, 10), None).unwrap();
    let err = exporter.export_schema(&mut source).await.unwrap_err();

    assert!(format!("{:#}", err).contains("Invalid object name 'Beta'"));
    assert_eq!(source.selects.len(), 2);
    assert_eq!(sql_files(out.path()), vec!["shop_dbo_Alpha_1.sql"]);
}

#[tokio::test]
async fn test_tables_differing_only_in_case_get_separate_files() {
    let out = TempDir::new().unwrap();
    let mut source = MemorySource::default()
        .with_table("Users", WIDGET_COLUMNS, vec![widget(1, "upper")])
        .with_table("users", WIDGET_COLUMNS, vec![widget(2, "lower")])
        .with_table("a/b", WIDGET_COLUMNS, vec![widget(3, "slash")])
        .with_table("a_b", WIDGET_COLUMNS, vec![widget(4, "underscore")]);

    let mut exporter = TableExporter::new(config(out.path(), 10, 10), None).unwrap();
    let summary = exporter.export_schema(&mut source).await.unwrap();

    assert_eq!(summary.tables, 4);
    assert_eq!(summary.files, 4);
    assert_eq!(
        sql_files(out.path()),
        vec![
            "shop_dbo_Users_1.sql",
            "shop_dbo_a_b_1.sql",
            "shop_dbo_a_b_2_1.sql",
            "shop_dbo_users_2_1.sql",
        ]
    );

    let lower = fs::read_to_string(out.path().join("shop_dbo_users_2_1.sql")).unwrap();
    assert!(lower.contains("INSERT INTO [shop].[dbo].[users]"));
    assert!(lower.contains("(2, 'lower')"));

    let underscore = fs::read_to_string(out.path().join("shop_dbo_a_b_2_1.sql")).unwrap();
    assert!(underscore.contains("(4, 'underscore')"));
}

#[tokio::test]
async fn test_values_are_rendered_per_type() {
    let out = TempDir::new().unwrap();
    let mut row = Row::new();
    row.insert("Id".to_string(), SqlValue::Int(7));
    row.insert("Name".to_string(), SqlValue::from("O'Brien"));
    row.insert("Active".to_string(), SqlValue::Bool(true));
    row.insert("Price".to_string(), SqlValue::Float(9.5));
    row.insert("Note".to_string(), SqlValue::Null);

    let mut source = MemorySource::default().with_table(
        "People",
        &[
            ("Id", "int"),
            ("Name", "nvarchar"),
            ("Active", "bit"),
            ("Price", "float"),
            ("Note", "nvarchar"),
        ],
        vec![row],
    );

    let mut exporter = TableExporter::new(config(out.path(), 10, 10), None).unwrap();
    exporter.export_schema(&mut source).await.unwrap();

    let contents = fs::read_to_string(out.path().join("shop_dbo_People_1.sql")).unwrap();
    assert!(contents.contains(
        "([Id], [Name], [Active], [Price], [Note]) VALUES\n  (7, 'O''Brien', 1, 9.500000, NULL)"
    ));
}

#[tokio::test]
async fn test_header_is_written_when_configured() {
    let out = TempDir::new().unwrap();
    let mut source =
        MemorySource::default().with_table("Widgets", WIDGET_COLUMNS, vec![widget(1, "a")]);

    let header = sqldatadump::export::header_comment("db.local", "shop", "dbo");
    let mut exporter = TableExporter::new(config(out.path(), 10, 10), Some(header)).unwrap();
    exporter.export_schema(&mut source).await.unwrap();

    let contents = fs::read_to_string(out.path().join("shop_dbo_Widgets_1.sql")).unwrap();
    assert!(contents.starts_with("/*\n\tData Dump Created by sqldatadump"));
    assert!(contents.contains("Data Exported from db.local/shop/dbo"));
}

#[tokio::test]
async fn test_output_directory_is_created() {
    let root = TempDir::new().unwrap();
    let nested = root.path().join("dumps").join("today");
    let mut source =
        MemorySource::default().with_table("Widgets", WIDGET_COLUMNS, vec![widget(1, "a")]);

    let mut exporter = TableExporter::new(config(&nested, 10, 10), None).unwrap();
    exporter.export_schema(&mut source).await.unwrap();

    assert_eq!(sql_files(&nested), vec!["shop_dbo_Widgets_1.sql"]);
}

#[tokio::test]
async fn test_other_schemas_are_not_exported() {
    let out = TempDir::new().unwrap();
    let mut source =
        MemorySource::default().with_table("Widgets", WIDGET_COLUMNS, vec![widget(1, "a")]);

    let mut cfg = config(out.path(), 10, 10);
    cfg.schema = "sales".to_string();
    let mut exporter = TableExporter::new(cfg, None).unwrap();
    let summary = exporter.export_schema(&mut source).await.unwrap();

    assert_eq!(summary.tables, 0);
    assert!(sql_files(out.path()).is_empty());
}

#[tokio::test]
async fn test_malformed_connection_string_fails_before_any_output() {
    let root = TempDir::new().unwrap();
    let target = root.path().join("never-created");

    let err = sqldatadump::commands::export("sa@localhost/db", config(&target, 10, 10), false)
        .await
        .unwrap_err();

    assert!(err.to_string().contains("Expected format"));
    assert!(!target.exists());
}

#[tokio::test]
async fn test_zero_batch_size_fails_before_any_output() {
    let root = TempDir::new().unwrap();
    let target = root.path().join("never-created");

    let result =
        sqldatadump::commands::export("sa:pw@localhost:1433/db", config(&target, 0, 10), false)
            .await;

    assert!(result.is_err());
    assert!(!target.exists());
}
