// ABOUTME: Writes generated SQL files into the output directory
// ABOUTME: Hands out collision-free file stems and persists each file atomically

use anyhow::{bail, Context, Result};
use std::collections::{HashMap, HashSet};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Destination for the `.sql` files of one export run
#[derive(Debug)]
pub struct OutputWriter {
    directory: PathBuf,
    /// Lower-cased stem -> the table that claimed it
    stems: HashMap<String, String>,
    written: HashSet<String>,
    bytes_written: u64,
}

impl OutputWriter {
    /// Create the output directory (and parents) if needed
    pub fn create(directory: &Path) -> Result<Self> {
        fs::create_dir_all(directory).with_context(|| {
            format!("Failed to create output directory {}", directory.display())
        })?;

        Ok(Self {
            directory: directory.to_path_buf(),
            stems: HashMap::new(),
            written: HashSet::new(),
            bytes_written: 0,
        })
    }

    pub fn bytes_written(&self) -> u64 {
        self.bytes_written
    }

    /// Reserve a file stem for `owner` (a fully qualified table name)
    ///
    /// Returns `stem` unchanged unless a different owner already holds it,
    /// compared case-insensitively. In that case `_2`, `_3`, ... is appended
    /// until the name is free. Group file names append `_<digits>.sql`, so
    /// distinct stems never produce the same file name.
    pub fn claim_stem(&mut self, owner: &str, stem: &str) -> String {
        let mut candidate = stem.to_string();
        let mut suffix = 1;

        loop {
            match self.stems.get(&candidate.to_lowercase()) {
                None => break,
                Some(holder) if holder == owner => return candidate,
                Some(_) => {
                    suffix += 1;
                    candidate = format!("{}_{}", stem, suffix);
                }
            }
        }

        if candidate != stem {
            tracing::warn!(
                "File name {} is already used by another table; writing {} as {}",
                stem,
                owner,
                candidate
            );
        }

        self.stems.insert(candidate.to_lowercase(), owner.to_string());
        candidate
    }

    /// Write `contents` to `file_name` inside the output directory
    ///
    /// The file appears under its final name only once it is complete.
    /// Writing the same name twice in one run is an error.
    pub fn write_file(&mut self, file_name: &str, contents: &str) -> Result<PathBuf> {
        let key = file_name.to_lowercase();
        if self.written.contains(&key) {
            bail!(
                "Output file name collision: {} was already written in this run",
                file_name
            );
        }

        let path = self.directory.join(file_name);

        let mut tmp = tempfile::NamedTempFile::new_in(&self.directory).with_context(|| {
            format!(
                "Failed to create temp file in {}",
                self.directory.display()
            )
        })?;
        tmp.write_all(contents.as_bytes())
            .with_context(|| format!("Failed to write {}", path.display()))?;

        // temp files are created 0600
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            tmp.as_file()
                .set_permissions(fs::Permissions::from_mode(0o644))
                .with_context(|| format!("Failed to set permissions on {}", path.display()))?;
        }

        tmp.persist(&path)
            .with_context(|| format!("Failed to persist {}", path.display()))?;

        self.written.insert(key);
        self.bytes_written += contents.len() as u64;

        tracing::debug!("Wrote {} ({} bytes)", path.display(), contents.len());

        Ok(path)
    }
}
