// ABOUTME: Export configuration from CLI flags and optional TOML files
// ABOUTME: Merges file values under explicit flags and validates batch sizes

use crate::filters::IgnoreList;
use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_SCHEMA: &str = "dbo";
pub const DEFAULT_ROWS_PER_BATCH: usize = 1000;
pub const DEFAULT_BATCHES_PER_FILE: usize = 10;

/// Fully resolved settings for one export run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportConfig {
    pub directory: PathBuf,
    pub schema: String,
    pub rows_per_batch: usize,
    pub batches_per_file: usize,
    pub ignore_tables: IgnoreList,
    /// Prefix every file with a comment naming the export source
    pub header: bool,
}

impl ExportConfig {
    /// Rejects settings that would make the export meaningless
    ///
    /// Runs before any database interaction.
    pub fn validate(&self) -> Result<()> {
        if self.directory.as_os_str().is_empty() {
            bail!("Output directory is required (--directory)");
        }
        if self.schema.trim().is_empty() {
            bail!("Schema cannot be empty (--schema)");
        }
        if self.rows_per_batch == 0 {
            bail!("--rows-per-batch must be a positive number");
        }
        if self.batches_per_file == 0 {
            bail!("--batches-per-file must be a positive number");
        }
        Ok(())
    }
}

/// Optional settings as they appear in a TOML config file or on the command line
///
/// ```toml
/// directory = "./dump"
/// schema = "sales"
/// rows_per_batch = 500
/// batches_per_file = 20
/// ignore_tables = ["__EFMigrationsHistory", "AuditLog"]
/// header = true
/// ```
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ConfigOverrides {
    pub directory: Option<PathBuf>,
    pub schema: Option<String>,
    pub rows_per_batch: Option<usize>,
    pub batches_per_file: Option<usize>,
    pub ignore_tables: Option<Vec<String>>,
    pub header: Option<bool>,
}

impl ConfigOverrides {
    /// Values from `self` win; unset values fall back to `fallback`
    pub fn or(self, fallback: ConfigOverrides) -> ConfigOverrides {
        ConfigOverrides {
            directory: self.directory.or(fallback.directory),
            schema: self.schema.or(fallback.schema),
            rows_per_batch: self.rows_per_batch.or(fallback.rows_per_batch),
            batches_per_file: self.batches_per_file.or(fallback.batches_per_file),
            ignore_tables: self.ignore_tables.or(fallback.ignore_tables),
            header: self.header.or(fallback.header),
        }
    }

    /// Fill remaining gaps with built-in defaults and validate
    pub fn resolve(self) -> Result<ExportConfig> {
        let config = ExportConfig {
            directory: self.directory.unwrap_or_default(),
            schema: self.schema.unwrap_or_else(|| DEFAULT_SCHEMA.to_string()),
            rows_per_batch: self.rows_per_batch.unwrap_or(DEFAULT_ROWS_PER_BATCH),
            batches_per_file: self.batches_per_file.unwrap_or(DEFAULT_BATCHES_PER_FILE),
            ignore_tables: self
                .ignore_tables
                .map(IgnoreList::new)
                .unwrap_or_default(),
            header: self.header.unwrap_or(false),
        };
        config.validate()?;
        Ok(config)
    }
}

pub fn load_config_file(path: &Path) -> Result<ConfigOverrides> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file at {}", path.display()))?;
    let parsed: ConfigOverrides = toml::from_str(&raw)
        .with_context(|| format!("Failed to parse TOML config at {}", path.display()))?;
    Ok(parsed)
}
