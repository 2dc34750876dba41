use stager::config::Config;
use stager::core::StagerResult;
use stager::stage::list_installed;
use std::path::Path;

pub fn run() -> StagerResult<()> {
    let config = Config::load()?;
    list_cellar(&config.get_cellar()?)
}

pub fn list_cellar(cellar: &Path) -> StagerResult<()> {
    let kegs = list_installed(cellar)?;

    if kegs.is_empty() {
        println!("No formulae installed.");
        return Ok(());
    }

    println!("Installed formulae:");
    for keg in kegs {
        let receipt = &keg.receipt;
        println!(
            "  {} {} (python {}, {} resource(s), installed {})",
            receipt.name,
            receipt.version,
            receipt.python_version,
            receipt.resources.len(),
            receipt.installed_at.format("%Y-%m-%d")
        );
        for exe in &receipt.executables {
            if let Some(name) = exe.file_name() {
                println!("    → {}", name.to_string_lossy());
            }
        }
    }

    Ok(())
}
