//! Installing built wheels (`.whl`) without running any Python tooling.

use crate::core::path::{ensure_dir, prefix_bin_dir, site_packages_dir};
use crate::core::{StagerError, StagerResult};
use std::fs;
use std::io::{self, Read, Write};
use std::path::{Component, Path, PathBuf};
use tracing::debug;
use zip::ZipArchive;

/// Where one archive member of a wheel is installed
#[derive(Debug, PartialEq, Eq)]
enum Destination {
    Lib(PathBuf),
    Script(PathBuf),
    Data(PathBuf),
}

/// Installs wheels into a prefix for a given interpreter
pub struct WheelInstaller {
    interpreter: PathBuf,
    python_version: String,
}

impl WheelInstaller {
    pub fn new(interpreter: PathBuf, python_version: impl Into<String>) -> Self {
        Self {
            interpreter,
            python_version: python_version.into(),
        }
    }

    /// Unpack `wheel` into `prefix`.
    ///
    /// Library files land in the prefix's site-packages, `.data/scripts` and
    /// generated `console_scripts` launchers in `<prefix>/bin`. Returns the
    /// executables written.
    pub fn install(&self, label: &str, wheel: &Path, prefix: &Path) -> StagerResult<Vec<PathBuf>> {
        let file = fs::File::open(wheel)?;
        let mut archive =
            ZipArchive::new(file).map_err(|e| StagerError::fetch(label, format!("bad wheel: {}", e)))?;

        let site_packages = site_packages_dir(prefix, &self.python_version);
        let bin_dir = prefix_bin_dir(prefix);
        ensure_dir(&site_packages)?;

        let mut scripts = Vec::new();
        let mut entry_points = None;

        for i in 0..archive.len() {
            let mut entry = archive
                .by_index(i)
                .map_err(|e| StagerError::fetch(label, format!("bad wheel: {}", e)))?;
            if entry.is_dir() {
                continue;
            }
            let relative = entry
                .enclosed_name()
                .map(Path::to_path_buf)
                .ok_or_else(|| {
                    StagerError::fetch(label, format!("unsafe path in wheel: {}", entry.name()))
                })?;

            if is_entry_points_file(&relative) {
                let mut text = String::new();
                entry.read_to_string(&mut text)?;
                entry_points = Some(text.clone());
                write_file(&site_packages.join(&relative), text.as_bytes())?;
                continue;
            }

            match classify(&relative, &site_packages, &bin_dir, prefix)
                .ok_or_else(|| {
                    StagerError::fetch(
                        label,
                        format!("unknown wheel data directory: {}", relative.display()),
                    )
                })? {
                Destination::Lib(dest) | Destination::Data(dest) => {
                    let mut data = Vec::new();
                    entry.read_to_end(&mut data)?;
                    write_file(&dest, &data)?;
                }
                Destination::Script(dest) => {
                    let mut data = Vec::new();
                    entry.read_to_end(&mut data)?;
                    let data = self.rewrite_shebang(data);
                    write_file(&dest, &data)?;
                    make_executable(&dest)?;
                    scripts.push(dest);
                }
            }
        }

        if let Some(text) = entry_points {
            for (name, target) in console_scripts(&text) {
                let dest = bin_dir.join(&name);
                let launcher = self.launcher_script(&target).ok_or_else(|| {
                    StagerError::fetch(label, format!("invalid entry point '{}'", target))
                })?;
                write_file(&dest, launcher.as_bytes())?;
                make_executable(&dest)?;
                scripts.push(dest);
            }
        }

        debug!(resource = %label, scripts = scripts.len(), "installed wheel");
        Ok(scripts)
    }

    /// `#!python` and `#!pythonw` become the real interpreter
    fn rewrite_shebang(&self, data: Vec<u8>) -> Vec<u8> {
        let first_line_end = data.iter().position(|&b| b == b'\n').unwrap_or(data.len());
        let first_line = String::from_utf8_lossy(&data[..first_line_end]);
        let first_line = first_line.trim_end_matches('\r');
        if first_line != "#!python" && first_line != "#!pythonw" {
            return data;
        }
        let mut out = format!("#!{}", self.interpreter.display()).into_bytes();
        out.extend_from_slice(&data[first_line_end..]);
        out
    }

    /// Launcher for a `module:attr` entry point, as pip writes them
    fn launcher_script(&self, target: &str) -> Option<String> {
        let target = match target.split_once('[') {
            Some((before, _)) => before.trim(),
            None => target.trim(),
        };
        let (module, attr) = target.split_once(':')?;
        let (module, attr) = (module.trim(), attr.trim());
        if module.is_empty() || attr.is_empty() {
            return None;
        }
        let import_name = attr.split('.').next()?;

        Some(format!(
            "#!{python}\n\
             # -*- coding: utf-8 -*-\n\
             import re\n\
             import sys\n\
             from {module} import {import_name}\n\
             if __name__ == '__main__':\n    \
             sys.argv[0] = re.sub(r'(-script\\.pyw|\\.exe)?$', '', sys.argv[0])\n    \
             sys.exit({attr}())\n",
            python = self.interpreter.display(),
            module = module,
            import_name = import_name,
            attr = attr,
        ))
    }
}

fn is_entry_points_file(relative: &Path) -> bool {
    let mut components = relative.components();
    match (components.next(), components.next(), components.next()) {
        (Some(Component::Normal(dir)), Some(Component::Normal(file)), None) => {
            dir.to_string_lossy().ends_with(".dist-info") && file == "entry_points.txt"
        }
        _ => false,
    }
}

fn classify(
    relative: &Path,
    site_packages: &Path,
    bin_dir: &Path,
    prefix: &Path,
) -> Option<Destination> {
    let mut components = relative.components();
    let first = components.next()?;
    let is_data_dir = matches!(first, Component::Normal(name) if name.to_string_lossy().ends_with(".data"));
    if !is_data_dir {
        return Some(Destination::Lib(site_packages.join(relative)));
    }

    let kind = components.next()?;
    let rest: PathBuf = components.collect();
    if rest.as_os_str().is_empty() {
        return None;
    }
    match kind.as_os_str().to_str()? {
        "scripts" => Some(Destination::Script(bin_dir.join(rest))),
        "purelib" | "platlib" => Some(Destination::Lib(site_packages.join(rest))),
        "data" => Some(Destination::Data(prefix.join(rest))),
        "headers" => Some(Destination::Data(prefix.join("include").join(rest))),
        _ => None,
    }
}

/// `(name, module:attr)` pairs of the `[console_scripts]` section
fn console_scripts(entry_points: &str) -> Vec<(String, String)> {
    let mut in_section = false;
    let mut scripts = Vec::new();
    for line in entry_points.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') || line.starts_with(';') {
            continue;
        }
        if line.starts_with('[') && line.ends_with(']') {
            in_section = &line[1..line.len() - 1] == "console_scripts";
            continue;
        }
        if !in_section {
            continue;
        }
        if let Some((name, target)) = line.split_once('=') {
            let name = name.trim();
            if !name.is_empty() && !name.contains(['/', '\\']) {
                scripts.push((name.to_string(), target.trim().to_string()));
            }
        }
    }
    scripts
}

fn write_file(dest: &Path, data: &[u8]) -> StagerResult<()> {
    if let Some(parent) = dest.parent() {
        ensure_dir(parent)?;
    }
    let mut file = fs::File::create(dest)?;
    io::copy(&mut &data[..], &mut file)?;
    file.flush()?;
    Ok(())
}

fn make_executable(path: &Path) -> StagerResult<()> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(path, fs::Permissions::from_mode(0o755))?;
    }
    #[cfg(not(unix))]
    let _ = path;
    Ok(())
}
