use stager::config::Config;
use stager::core::{StagerError, StagerResult};
use stager::stage::{list_installed, InstalledKeg};
use std::fs;
use std::path::Path;

pub fn run(name: &str, version: Option<&str>) -> StagerResult<()> {
    let config = Config::load()?;
    uninstall_from(&config.get_cellar()?, name, version)
}

pub fn uninstall_from(cellar: &Path, name: &str, version: Option<&str>) -> StagerResult<()> {
    let installed: Vec<InstalledKeg> = list_installed(cellar)?
        .into_iter()
        .filter(|k| k.receipt.name == name)
        .collect();

    let installed_keg = match version {
        Some(v) => installed
            .into_iter()
            .find(|k| k.receipt.version == v)
            .ok_or_else(|| StagerError::Path(format!("{} {} is not installed", name, v)))?,
        None => match installed.len() {
            0 => return Err(StagerError::Path(format!("{} is not installed", name))),
            1 => installed.into_iter().next().ok_or_else(|| {
                StagerError::Path(format!("{} is not installed", name))
            })?,
            _ => {
                let versions: Vec<_> = installed
                    .iter()
                    .map(|k| k.receipt.version.as_str())
                    .collect();
                return Err(StagerError::Config(format!(
                    "Several versions of {} are installed ({}); pass --version",
                    name,
                    versions.join(", ")
                )));
            }
        },
    };

    let InstalledKeg { path: keg, receipt } = installed_keg;

    // Wrappers published outside the keg are removed with it
    for exe in &receipt.executables {
        if !exe.starts_with(&keg) && exe.symlink_metadata().is_ok() {
            fs::remove_file(exe)?;
        }
    }
    fs::remove_dir_all(&keg)?;

    // Drop the empty <cellar>/<name> directory
    if let Some(parent) = keg.parent() {
        if fs::read_dir(parent)?.next().is_none() {
            fs::remove_dir(parent)?;
        }
    }

    println!("✓ Uninstalled {} {}", receipt.name, receipt.version);
    Ok(())
}
