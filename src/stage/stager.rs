//! The install pipeline: vendor the resources, install the main package,
//! publish wrapped executables.

use super::extractor::PackageExtractor;
use super::python::{resolve_interpreter, InstallCommand};
use super::receipt::InstallReceipt;
use super::rollback::RollbackManager;
use super::wheel::WheelInstaller;
use super::wrappers::WrapperGenerator;
use crate::cache::archive_extension;
use crate::core::path::{
    is_empty_dir, libexec_dir, prefix_bin_dir, site_packages_dir, vendor_dir,
};
use crate::core::{SearchPath, StagerError, StagerResult};
use crate::di::{Fetcher, InstallRunner, ServiceContainer};
use crate::fetch::fetch_verified;
use crate::formula::{Formula, Resource};
use chrono::Utc;
use indicatif::{ProgressBar, ProgressStyle};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Where the main package comes from
#[derive(Debug, Clone)]
pub enum MainSource {
    /// Fetched and verified like any resource
    Remote(Resource),
    /// An unpacked source tree, installed as-is
    Local { name: String, path: PathBuf },
}

impl MainSource {
    pub fn name(&self) -> &str {
        match self {
            MainSource::Remote(resource) => &resource.name,
            MainSource::Local { name, .. } => name,
        }
    }

    /// URL or directory, as recorded in the receipt
    pub fn describe(&self) -> String {
        match self {
            MainSource::Remote(resource) => resource.url.clone(),
            MainSource::Local { path, .. } => path.display().to_string(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct StagerOptions {
    /// Replace whatever the keg holds
    pub force: bool,
    /// Leave a failed install in place for inspection
    pub keep_failed: bool,
    /// Install the main package from this directory instead of its URL
    pub source_override: Option<PathBuf>,
}

#[derive(Debug)]
pub enum InstallOutcome {
    Installed(InstallReceipt),
    /// The keg already holds this exact formula; nothing was done
    AlreadyInstalled(InstallReceipt),
}

/// Stages dependencies into an isolated prefix and installs a package on top
pub struct Stager {
    fetcher: Arc<dyn Fetcher>,
    runner: Arc<dyn InstallRunner>,
    extractor: PackageExtractor,
    python: String,
    python_version: String,
    search_path: SearchPath,
    extra_paths: Vec<PathBuf>,
    show_progress: bool,
}

impl Stager {
    pub fn new(
        container: &ServiceContainer,
        python: impl Into<String>,
        python_version: impl Into<String>,
        search_path_var: &str,
    ) -> Self {
        Self {
            fetcher: container.fetcher.clone(),
            runner: container.runner.clone(),
            extractor: PackageExtractor::new(container.cache.staging_dir()),
            python: python.into(),
            python_version: python_version.into(),
            search_path: SearchPath::new(search_path_var),
            extra_paths: Vec::new(),
            show_progress: false,
        }
    }

    /// Stager configured from a formula.
    ///
    /// The python version is asked from the interpreter unless the formula
    /// pins it.
    pub fn for_formula(container: &ServiceContainer, formula: &Formula) -> StagerResult<Self> {
        let python = formula
            .python
            .clone()
            .unwrap_or_else(|| container.config().python().to_string());
        let python_version = match &formula.python_version {
            Some(version) => version.clone(),
            None => container.runner.python_version(&python)?,
        };
        debug!(%python, %python_version, "selected interpreter");

        Ok(Self::new(container, python, python_version, &formula.search_path_var)
            .with_extra_paths(formula.extra_paths.clone()))
    }

    /// Directories appended to the search path after the staged ones
    pub fn with_extra_paths(mut self, extra_paths: Vec<PathBuf>) -> Self {
        self.extra_paths = extra_paths;
        self
    }

    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    pub fn python_version(&self) -> &str {
        &self.python_version
    }

    pub fn search_path(&self) -> &SearchPath {
        &self.search_path
    }

    /// Fetch a resource and check it against its declared checksum
    pub async fn fetch_verified(&self, resource: &Resource) -> StagerResult<PathBuf> {
        fetch_verified(self.fetcher.as_ref(), resource).await
    }

    /// Fetch, verify and install each resource, in order, into
    /// `<target_prefix>/vendor`. The first failure aborts the run.
    pub async fn install_all(
        &mut self,
        resources: &[Resource],
        target_prefix: &Path,
    ) -> StagerResult<()> {
        let vendor = vendor_dir(target_prefix);
        self.search_path
            .prepend_create(&site_packages_dir(&vendor, &self.python_version))?;
        self.append_extra_paths();

        let pb = self.progress(resources.len() as u64);
        for resource in resources {
            pb.set_message(resource.name.clone());
            let archive = self.fetch_verified(resource).await?;
            self.install_archive(&resource.name, &archive, &vendor)?;
            info!(resource = %resource.name, "staged");
            pb.inc(1);
        }
        pb.finish_and_clear();
        Ok(())
    }

    /// Install the main package into `target_prefix` with the vendored
    /// dependencies importable.
    pub async fn install_main_package(
        &mut self,
        source: &MainSource,
        target_prefix: &Path,
    ) -> StagerResult<()> {
        let vendor_site = site_packages_dir(&vendor_dir(target_prefix), &self.python_version);
        if !self.search_path.entries().contains(&vendor_site) {
            self.search_path.prepend_create(&vendor_site)?;
        }
        self.search_path
            .prepend_create(&site_packages_dir(target_prefix, &self.python_version))?;
        self.append_extra_paths();

        match source {
            MainSource::Remote(resource) => {
                let archive = self.fetch_verified(resource).await?;
                self.install_archive(&resource.name, &archive, target_prefix)?;
            }
            MainSource::Local { name, path } => {
                if !path.is_dir() {
                    return Err(StagerError::Path(format!(
                        "Source directory {} does not exist",
                        path.display()
                    )));
                }
                self.run_setup(name, path, target_prefix)?;
            }
        }
        info!(package = %source.name(), "installed main package");
        Ok(())
    }

    /// Wrap every executable of `<target_prefix>/bin` into `bin_dir`
    pub fn publish_executables(
        &self,
        target_prefix: &Path,
        bin_dir: &Path,
    ) -> StagerResult<Vec<PathBuf>> {
        WrapperGenerator::new(self.search_path.clone())
            .publish(&prefix_bin_dir(target_prefix), bin_dir)
    }

    /// Full install of a formula into `keg`, with prefix-state checks,
    /// rollback and an install receipt.
    pub async fn install_formula(
        &mut self,
        formula: &Formula,
        keg: &Path,
        bin_dir: &Path,
        options: &StagerOptions,
    ) -> StagerResult<InstallOutcome> {
        check_dependencies(&formula.depends_on)?;

        let source = match &options.source_override {
            Some(path) => MainSource::Local {
                name: formula.name.clone(),
                path: path.clone(),
            },
            None => MainSource::Remote(formula.main_resource()),
        };

        if let Some(receipt) = self.check_prefix(formula, &source, keg, options.force)? {
            return Ok(InstallOutcome::AlreadyInstalled(receipt));
        }

        for skipped in formula.skipped_resources() {
            warn!(resource = %skipped.name, "not listed in install_order, skipping");
        }

        let mut rollback = RollbackManager::new();
        if !keg.exists() {
            rollback.track_dir(keg);
        }
        fs::create_dir_all(keg)?;

        match self
            .run_install(formula, &source, keg, bin_dir, &mut rollback)
            .await
        {
            Ok(receipt) => Ok(InstallOutcome::Installed(receipt)),
            Err(e) => {
                rollback.abort(options.keep_failed);
                Err(e)
            }
        }
    }

    /// Returns the existing receipt when the keg already holds this install.
    /// Clears the keg when `force` is set.
    fn check_prefix(
        &self,
        formula: &Formula,
        source: &MainSource,
        keg: &Path,
        force: bool,
    ) -> StagerResult<Option<InstallReceipt>> {
        let conflict = match InstallReceipt::load(keg)? {
            Some(receipt) => {
                if !force
                    && receipt.matches(
                        formula,
                        &source.describe(),
                        &self.python,
                        &self.python_version,
                    )?
                {
                    return Ok(Some(receipt));
                }
                format!(
                    "{} holds {} {} installed from different inputs",
                    keg.display(),
                    receipt.name,
                    receipt.version
                )
            }
            None if is_empty_dir(keg)? => return Ok(None),
            None => format!("{} is not empty and has no install receipt", keg.display()),
        };

        if !force {
            return Err(StagerError::PrefixConflict(conflict));
        }
        warn!(keg = %keg.display(), "removing existing install (--force)");
        fs::remove_dir_all(keg)?;
        Ok(None)
    }

    async fn run_install(
        &mut self,
        formula: &Formula,
        source: &MainSource,
        keg: &Path,
        bin_dir: &Path,
        rollback: &mut RollbackManager,
    ) -> StagerResult<InstallReceipt> {
        let target_prefix = libexec_dir(keg);
        let resources: Vec<Resource> = formula.ordered_resources()?.into_iter().cloned().collect();

        self.install_all(&resources, &target_prefix).await?;
        self.install_main_package(source, &target_prefix).await?;

        let executables = self.publish_tracked(&target_prefix, keg, bin_dir, rollback)?;
        if executables.is_empty() {
            warn!(package = %formula.name, "package installed no executables");
        }

        let receipt = InstallReceipt {
            name: formula.name.clone(),
            version: formula.version.clone(),
            installed_at: Utc::now(),
            python: self.python.clone(),
            python_version: self.python_version.clone(),
            search_path_var: self.search_path.var().to_string(),
            search_path: self.search_path.entries().to_vec(),
            extra_paths: self.extra_paths.clone(),
            source: source.describe(),
            source_checksum: match source {
                MainSource::Remote(resource) => resource.checksum.clone(),
                MainSource::Local { .. } => None,
            },
            resources,
            bin_dir: bin_dir.to_path_buf(),
            executables,
        };
        receipt.save(keg)?;
        Ok(receipt)
    }

    /// Publish wrappers, registering the ones this run creates outside the
    /// keg for rollback. Files it overwrites are left alone on rollback.
    fn publish_tracked(
        &self,
        target_prefix: &Path,
        keg: &Path,
        bin_dir: &Path,
        rollback: &mut RollbackManager,
    ) -> StagerResult<Vec<PathBuf>> {
        if bin_dir.starts_with(keg) {
            return self.publish_executables(target_prefix, bin_dir);
        }

        let existing = existing_entries(bin_dir)?;
        let published = self.publish_executables(target_prefix, bin_dir)?;
        let created: Vec<PathBuf> = published
            .iter()
            .filter(|path| !existing.contains(*path))
            .cloned()
            .collect();
        rollback.track_files(&created);
        Ok(published)
    }

    fn install_archive(&self, label: &str, archive: &Path, prefix: &Path) -> StagerResult<()> {
        if archive_extension(&archive.to_string_lossy()) == Some("whl") {
            let installer =
                WheelInstaller::new(resolve_interpreter(&self.python), self.python_version.clone());
            installer.install(label, archive, prefix)?;
            return Ok(());
        }

        let source_root = self.extractor.extract(label, archive)?;
        let result = self.run_setup(label, &source_root, prefix);
        self.extractor.cleanup(label);
        result
    }

    fn run_setup(&self, label: &str, source_root: &Path, prefix: &Path) -> StagerResult<()> {
        let command =
            InstallCommand::setup_py(label, &self.python, source_root, prefix, &self.search_path)?;
        self.runner.run(&command)
    }

    fn append_extra_paths(&mut self) {
        for path in &self.extra_paths {
            self.search_path.append(path);
        }
    }

    fn progress(&self, len: u64) -> ProgressBar {
        if !self.show_progress {
            return ProgressBar::hidden();
        }
        let pb = ProgressBar::new(len);
        let style = ProgressStyle::default_bar()
            .template("  Staging [{bar:30.cyan/blue}] {pos}/{len} {msg}")
            .map(|s| s.progress_chars("#>-"))
            .unwrap_or_else(|_| ProgressStyle::default_bar());
        pb.set_style(style);
        pb
    }
}

/// Paths currently present in `dir` (empty when it does not exist)
fn existing_entries(dir: &Path) -> StagerResult<HashSet<PathBuf>> {
    if !dir.is_dir() {
        return Ok(HashSet::new());
    }
    let mut entries = HashSet::new();
    for entry in fs::read_dir(dir)? {
        entries.insert(entry?.path());
    }
    Ok(entries)
}

/// Fail unless every named executable is on PATH
pub fn check_dependencies(depends_on: &[String]) -> StagerResult<()> {
    let missing: Vec<&str> = depends_on
        .iter()
        .filter(|dep| which::which(dep.as_str()).is_err())
        .map(String::as_str)
        .collect();
    if missing.is_empty() {
        Ok(())
    } else {
        Err(StagerError::Config(format!(
            "Required executables not found on PATH: {}",
            missing.join(", ")
        )))
    }
}
