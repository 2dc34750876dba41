//! Module search-path variable (e.g. `PYTHONPATH`) built up during an install.
//!
//! Entries are kept in priority order: the most recently prepended directory
//! comes first. The ambient value of the variable is never inherited while
//! installing, so every install step sees exactly the configured entries.

use crate::core::error::{StagerError, StagerResult};
use crate::core::path::ensure_dir;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Command;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchPath {
    var: String,
    entries: Vec<PathBuf>,
}

impl SearchPath {
    pub fn new(var: impl Into<String>) -> Self {
        Self {
            var: var.into(),
            entries: Vec::new(),
        }
    }

    /// Name of the environment variable.
    pub fn var(&self) -> &str {
        &self.var
    }

    pub fn entries(&self) -> &[PathBuf] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Create `dir` if needed and put it at the front of the path.
    /// A directory already present is moved to the front instead of duplicated.
    pub fn prepend_create(&mut self, dir: &Path) -> StagerResult<()> {
        ensure_dir(dir)?;
        self.entries.retain(|e| e != dir);
        self.entries.insert(0, dir.to_path_buf());
        Ok(())
    }

    /// Add an entry with the lowest priority. The directory is not created.
    pub fn append(&mut self, dir: &Path) {
        if !self.entries.iter().any(|e| e == dir) {
            self.entries.push(dir.to_path_buf());
        }
    }

    /// Joined value using the platform separator (`:` or `;`).
    pub fn value(&self) -> StagerResult<OsString> {
        std::env::join_paths(&self.entries).map_err(|e| {
            StagerError::Path(format!("Cannot build {} from entries: {}", self.var, e))
        })
    }

    /// Set the variable on a child process.
    pub fn apply(&self, cmd: &mut Command) -> StagerResult<()> {
        cmd.env(&self.var, self.value()?);
        Ok(())
    }
}
