use crate::core::path::{receipt_file, RECEIPT_FILE_NAME};
use crate::core::{StagerError, StagerResult};
use crate::formula::{Formula, Resource};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;
use walkdir::WalkDir;

/// Record of a completed install, stored in the keg
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstallReceipt {
    pub name: String,
    pub version: String,
    pub installed_at: DateTime<Utc>,
    pub python: String,
    pub python_version: String,
    pub search_path_var: String,
    /// Search-path entries baked into the wrappers, highest priority first
    pub search_path: Vec<PathBuf>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub extra_paths: Vec<PathBuf>,
    /// Main package: URL, or the local directory given with `--source`
    pub source: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_checksum: Option<String>,
    pub resources: Vec<Resource>,
    pub bin_dir: PathBuf,
    pub executables: Vec<PathBuf>,
}

impl InstallReceipt {
    /// Load the receipt of a keg, if it has one
    pub fn load(keg: &Path) -> StagerResult<Option<Self>> {
        let path = receipt_file(keg);
        if !path.is_file() {
            return Ok(None);
        }
        let content = fs::read_to_string(&path)?;
        let receipt = serde_json::from_str(&content).map_err(|e| {
            StagerError::Path(format!("Corrupt receipt {}: {}", path.display(), e))
        })?;
        Ok(Some(receipt))
    }

    pub fn save(&self, keg: &Path) -> StagerResult<()> {
        let content = serde_json::to_string_pretty(self)?;
        fs::write(receipt_file(keg), content)?;
        Ok(())
    }

    /// Whether this receipt describes installing `formula` from `source`
    /// with the given interpreter
    pub fn matches(
        &self,
        formula: &Formula,
        source: &str,
        python: &str,
        python_version: &str,
    ) -> StagerResult<bool> {
        let resources: Vec<Resource> = formula.ordered_resources()?.into_iter().cloned().collect();
        Ok(self.name == formula.name
            && self.version == formula.version
            && self.source == source
            && normalized(&self.source_checksum) == normalized(&formula.checksum)
            && self.resources == resources
            && self.python == python
            && self.python_version == python_version
            && self.search_path_var == formula.search_path_var
            && self.extra_paths == formula.extra_paths)
    }
}

fn normalized(checksum: &Option<String>) -> Option<String> {
    checksum
        .as_deref()
        .map(|c| c.trim().to_ascii_lowercase())
        .filter(|c| !c.is_empty())
}

/// An installed keg and the receipt found in it
#[derive(Debug, Clone)]
pub struct InstalledKeg {
    pub path: PathBuf,
    pub receipt: InstallReceipt,
}

/// Every keg in the cellar with a readable receipt, sorted by name then
/// version. Unreadable receipts are skipped with a warning.
pub fn list_installed(cellar: &Path) -> StagerResult<Vec<InstalledKeg>> {
    if !cellar.is_dir() {
        return Ok(Vec::new());
    }

    let mut kegs = Vec::new();
    for entry in WalkDir::new(cellar).min_depth(3).max_depth(3) {
        let entry = entry?;
        if entry.file_name() != RECEIPT_FILE_NAME || !entry.file_type().is_file() {
            continue;
        }
        let Some(keg) = entry.path().parent() else {
            continue;
        };
        match InstallReceipt::load(keg) {
            Ok(Some(receipt)) => kegs.push(InstalledKeg {
                path: keg.to_path_buf(),
                receipt,
            }),
            Ok(None) => {}
            Err(e) => warn!(keg = %keg.display(), "skipping keg: {}", e),
        }
    }

    kegs.sort_by(|a, b| {
        a.receipt
            .name
            .cmp(&b.receipt.name)
            .then_with(|| a.receipt.version.cmp(&b.receipt.version))
    });
    Ok(kegs)
}
