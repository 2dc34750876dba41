use crate::core::path::ensure_dir;
use crate::core::{SearchPath, StagerResult};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Writes wrapper scripts that set the search-path variable before running
/// the real executable.
pub struct WrapperGenerator {
    search_path: SearchPath,
}

impl WrapperGenerator {
    pub fn new(search_path: SearchPath) -> Self {
        Self { search_path }
    }

    /// Wrap every executable in `src_bin` into `bin_dir`.
    ///
    /// Returns the wrappers written, sorted by name.
    pub fn publish(&self, src_bin: &Path, bin_dir: &Path) -> StagerResult<Vec<PathBuf>> {
        let executables = find_executables(src_bin)?;
        if executables.is_empty() {
            return Ok(Vec::new());
        }

        ensure_dir(bin_dir)?;
        let mut published = Vec::with_capacity(executables.len());
        for target in executables {
            let wrapper = self.write_wrapper(&target, bin_dir)?;
            debug!(target = %target.display(), wrapper = %wrapper.display(), "wrote wrapper");
            published.push(wrapper);
        }
        Ok(published)
    }

    #[cfg(unix)]
    fn write_wrapper(&self, target: &Path, bin_dir: &Path) -> StagerResult<PathBuf> {
        use std::os::unix::fs::PermissionsExt;

        let name = target.file_name().unwrap_or_default();
        let wrapper = bin_dir.join(name);
        // A stale wrapper may be a symlink into an old keg
        if wrapper.symlink_metadata().is_ok() {
            fs::remove_file(&wrapper)?;
        }
        fs::write(&wrapper, self.unix_script(target)?)?;
        fs::set_permissions(&wrapper, fs::Permissions::from_mode(0o755))?;
        Ok(wrapper)
    }

    #[cfg(windows)]
    fn write_wrapper(&self, target: &Path, bin_dir: &Path) -> StagerResult<PathBuf> {
        let stem = target.file_stem().unwrap_or_default();
        let mut name = stem.to_os_string();
        name.push(".cmd");
        let wrapper = bin_dir.join(name);
        fs::write(&wrapper, self.windows_script(target)?)?;
        Ok(wrapper)
    }

    /// POSIX shell wrapper
    pub fn unix_script(&self, target: &Path) -> StagerResult<String> {
        let var = self.search_path.var();
        let value = self.search_path.value()?;
        Ok(format!(
            "#!/bin/sh\n\
             {var}={value}\"${{{var}:+:${var}}}\"\n\
             export {var}\n\
             exec {target} \"$@\"\n",
            var = var,
            value = shell_quote(&value.to_string_lossy()),
            target = shell_quote(&target.to_string_lossy()),
        ))
    }

    /// `cmd.exe` wrapper
    pub fn windows_script(&self, target: &Path) -> StagerResult<String> {
        let var = self.search_path.var();
        let value = self.search_path.value()?;
        Ok(format!(
            "@echo off\r\n\
             set \"{var}={value};%{var}%\"\r\n\
             \"{target}\" %*\r\n",
            var = var,
            value = value.to_string_lossy(),
            target = target.display(),
        ))
    }
}

/// Executable regular files directly inside `dir`, sorted
pub fn find_executables(dir: &Path) -> StagerResult<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }
    let mut found = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        // Follows symlinks so linked executables are published too
        let metadata = match fs::metadata(&path) {
            Ok(m) => m,
            Err(_) => continue,
        };
        if metadata.is_file() && is_executable(&metadata) {
            found.push(path);
        }
    }
    found.sort();
    Ok(found)
}

#[cfg(unix)]
fn is_executable(metadata: &fs::Metadata) -> bool {
    use std::os::unix::fs::PermissionsExt;
    metadata.permissions().mode() & 0o111 != 0
}

#[cfg(not(unix))]
fn is_executable(_metadata: &fs::Metadata) -> bool {
    true
}

fn shell_quote(s: &str) -> String {
    format!("'{}'", s.replace('\'', r"'\''"))
}
