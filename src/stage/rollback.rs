use crate::core::StagerResult;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

/// Manages rollback for failed installations
///
/// Tracks what an install run created: the keg directory (only when the
/// run created it) and the wrappers it published outside of it.
#[derive(Debug, Default)]
pub struct RollbackManager {
    created_dirs: Vec<PathBuf>,
    created_files: Vec<PathBuf>,
}

impl RollbackManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Remove `dir` on rollback
    pub fn track_dir(&mut self, dir: &Path) {
        self.created_dirs.push(dir.to_path_buf());
    }

    /// Remove these files on rollback
    pub fn track_files(&mut self, files: &[PathBuf]) {
        self.created_files.extend_from_slice(files);
    }

    /// Check if there is anything to roll back
    pub fn has_changes(&self) -> bool {
        !self.created_dirs.is_empty() || !self.created_files.is_empty()
    }

    /// Handle a failed install: report, then roll back unless asked to keep it
    pub fn abort(&self, keep_failed: bool) {
        if keep_failed {
            eprintln!("\n⚠️  Installation failed. Keeping partial install (--keep-failed)");
        } else if self.has_changes() {
            eprintln!("\n⚠️  Installation failed. Rolling back...");
            if let Err(rollback_err) = self.rollback() {
                warn!("rollback failed: {}", rollback_err);
                eprintln!("❌ Rollback failed: {}", rollback_err);
            } else {
                eprintln!("✓ Rollback completed");
            }
        }
    }

    /// Remove everything tracked, newest first
    pub fn rollback(&self) -> StagerResult<()> {
        for file in self.created_files.iter().rev() {
            if file.symlink_metadata().is_ok() {
                fs::remove_file(file)?;
            }
        }
        for dir in self.created_dirs.iter().rev() {
            if dir.exists() {
                fs::remove_dir_all(dir)?;
                eprintln!("✓ Removed {}", dir.display());
            }
        }
        Ok(())
    }
}
