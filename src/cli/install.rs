use stager::core::path::{keg_bin_dir, keg_dir};
use stager::core::StagerResult;
use stager::di::ServiceContainer;
use stager::formula::Formula;
use stager::stage::{InstallOutcome, Stager, StagerOptions};
use std::path::PathBuf;

pub struct InstallOptions {
    pub formula: PathBuf,
    pub prefix: Option<PathBuf>,
    pub bin_dir: Option<PathBuf>,
    pub source: Option<PathBuf>,
    pub force: bool,
    pub keep_failed: bool,
}

pub async fn run(options: InstallOptions) -> StagerResult<()> {
    let formula = Formula::load(&options.formula)?;
    let container = ServiceContainer::new()?;
    run_with_container(&container, &formula, options).await
}

pub async fn run_with_container(
    container: &ServiceContainer,
    formula: &Formula,
    options: InstallOptions,
) -> StagerResult<()> {
    let keg = match options.prefix {
        Some(prefix) => prefix,
        None => keg_dir(&container.config().cellar()?, &formula.name, &formula.version),
    };
    let bin_dir = options.bin_dir.unwrap_or_else(|| keg_bin_dir(&keg));

    println!("Installing {} {}", formula.name, formula.version);

    let mut stager = Stager::for_formula(container, formula)?.with_progress(true);
    let stager_options = StagerOptions {
        force: options.force,
        keep_failed: options.keep_failed,
        source_override: options.source,
    };

    match stager
        .install_formula(formula, &keg, &bin_dir, &stager_options)
        .await?
    {
        InstallOutcome::Installed(receipt) => {
            println!(
                "✓ Installed {} {} ({} resource(s)) to {}",
                receipt.name,
                receipt.version,
                receipt.resources.len(),
                keg.display()
            );
            if receipt.executables.is_empty() {
                println!("  No executables were published");
            } else {
                println!("  Executables:");
                for exe in &receipt.executables {
                    println!("    {}", exe.display());
                }
            }
        }
        InstallOutcome::AlreadyInstalled(receipt) => {
            println!(
                "✓ {} {} is already installed in {} (installed {})",
                receipt.name,
                receipt.version,
                keg.display(),
                receipt.installed_at.format("%Y-%m-%d %H:%M UTC")
            );
        }
    }

    Ok(())
}
