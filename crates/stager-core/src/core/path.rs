use crate::core::error::{StagerError, StagerResult};
use std::path::{Path, PathBuf};

/// Name of the receipt written into every installed keg.
pub const RECEIPT_FILE_NAME: &str = "INSTALL_RECEIPT.json";

/// Get the Stager home directory
///
/// Platform-specific locations:
/// - Windows: %APPDATA%\stager
/// - Linux: ~/.config/stager
/// - macOS: ~/Library/Application Support/stager
pub fn stager_home() -> StagerResult<PathBuf> {
    let config_dir = dirs::config_dir()
        .ok_or_else(|| StagerError::Path("Could not determine config directory".to_string()))?;
    Ok(config_dir.join("stager"))
}

/// Get the cache directory
///
/// Platform-specific locations:
/// - Windows: %LOCALAPPDATA%\stager\cache
/// - Linux: ~/.cache/stager
/// - macOS: ~/Library/Caches/stager
pub fn cache_dir() -> StagerResult<PathBuf> {
    let cache_dir = dirs::cache_dir()
        .ok_or_else(|| StagerError::Path("Could not determine cache directory".to_string()))?;
    Ok(cache_dir.join("stager"))
}

/// Get the config file path (`<stager_home>/config.yaml`)
pub fn config_file() -> StagerResult<PathBuf> {
    Ok(stager_home()?.join("config.yaml"))
}

/// Get the default cellar, the directory holding every installed keg
///
/// Platform-specific locations:
/// - Windows: %LOCALAPPDATA%\stager\Cellar
/// - Linux: ~/.local/share/stager/Cellar
/// - macOS: ~/Library/Application Support/stager/Cellar
pub fn default_cellar() -> StagerResult<PathBuf> {
    let data_dir = dirs::data_local_dir()
        .ok_or_else(|| StagerError::Path("Could not determine data directory".to_string()))?;
    Ok(data_dir.join("stager").join("Cellar"))
}

/// Versioned install directory of one formula (`<cellar>/<name>/<version>`)
pub fn keg_dir(cellar: &Path, name: &str, version: &str) -> PathBuf {
    cellar.join(name).join(version)
}

/// Private prefix inside a keg where packages are installed (`<keg>/libexec`)
pub fn libexec_dir(keg: &Path) -> PathBuf {
    keg.join("libexec")
}

/// Public executables of a keg (`<keg>/bin`), where wrappers go by default
pub fn keg_bin_dir(keg: &Path) -> PathBuf {
    keg.join("bin")
}

/// Install receipt path (`<keg>/INSTALL_RECEIPT.json`)
pub fn receipt_file(keg: &Path) -> PathBuf {
    keg.join(RECEIPT_FILE_NAME)
}

/// Isolated prefix for staged dependencies (`<prefix>/vendor`)
pub fn vendor_dir(prefix: &Path) -> PathBuf {
    prefix.join("vendor")
}

/// Executables installed under a prefix (`<prefix>/bin`)
pub fn prefix_bin_dir(prefix: &Path) -> PathBuf {
    prefix.join("bin")
}

/// `site-packages` of a prefix for the given `X.Y` python version
pub fn site_packages_dir(prefix: &Path, python_version: &str) -> PathBuf {
    prefix
        .join("lib")
        .join(format!("python{}", python_version))
        .join("site-packages")
}

/// Ensure a directory exists, creating it if necessary
pub fn ensure_dir(path: &Path) -> StagerResult<()> {
    if !path.exists() {
        std::fs::create_dir_all(path)?;
    }
    Ok(())
}

/// True when `dir` is missing or contains no entries
pub fn is_empty_dir(dir: &Path) -> StagerResult<bool> {
    if !dir.exists() {
        return Ok(true);
    }
    Ok(std::fs::read_dir(dir)?.next().is_none())
}
