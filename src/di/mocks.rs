//! Mock implementations of service traits for testing

use super::traits::{ConfigProvider, Fetcher, InstallRunner};
use crate::core::{StagerError, StagerResult};
use crate::formula::Resource;
use crate::stage::python::InstallCommand;
use async_trait::async_trait;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Mock configuration provider for testing
///
/// # Example
///
/// ```
/// use stager::di::mocks::MockConfigProvider;
/// use stager::di::ConfigProvider;
/// use std::path::PathBuf;
///
/// let mut config = MockConfigProvider::default();
/// config.cellar = PathBuf::from("/tmp/test-cellar");
///
/// assert_eq!(config.cellar().unwrap(), PathBuf::from("/tmp/test-cellar"));
/// ```
#[derive(Clone)]
pub struct MockConfigProvider {
    pub cache_dir: PathBuf,
    pub cellar: PathBuf,
    pub python: String,
    pub fetch_timeout: Duration,
}

impl Default for MockConfigProvider {
    fn default() -> Self {
        Self {
            cache_dir: PathBuf::from("/tmp/stager-test-cache"),
            cellar: PathBuf::from("/tmp/stager-test-cellar"),
            python: "python3".to_string(),
            fetch_timeout: Duration::from_secs(5),
        }
    }
}

impl ConfigProvider for MockConfigProvider {
    fn cache_dir(&self) -> StagerResult<PathBuf> {
        Ok(self.cache_dir.clone())
    }

    fn cellar(&self) -> StagerResult<PathBuf> {
        Ok(self.cellar.clone())
    }

    fn python(&self) -> &str {
        &self.python
    }

    fn fetch_timeout(&self) -> Duration {
        self.fetch_timeout
    }
}

/// Mock fetcher for testing
///
/// Serves pre-registered bytes by URL, writing them under `root`, and
/// records every fetch in order.
///
/// # Example
///
/// ```
/// use stager::di::mocks::MockFetcher;
///
/// let fetcher = MockFetcher::new(std::env::temp_dir().join("stager-mock-fetch"));
/// fetcher.add_source("https://example.com/click-6.2.tar.gz", b"bytes".to_vec());
///
/// assert!(fetcher.fetched().is_empty());
/// ```
#[derive(Clone)]
pub struct MockFetcher {
    root: PathBuf,
    sources: Arc<Mutex<HashMap<String, Vec<u8>>>>,
    fetched: Arc<Mutex<Vec<String>>>,
    evicted: Arc<Mutex<Vec<String>>>,
}

impl MockFetcher {
    /// Create a new mock fetcher storing downloads under `root`
    pub fn new(root: PathBuf) -> Self {
        Self {
            root,
            sources: Arc::new(Mutex::new(HashMap::new())),
            fetched: Arc::new(Mutex::new(Vec::new())),
            evicted: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Register the bytes served for a URL
    pub fn add_source(&self, url: &str, content: Vec<u8>) {
        self.sources
            .lock()
            .unwrap()
            .insert(url.to_string(), content);
    }

    /// Names of fetched resources, in fetch order
    pub fn fetched(&self) -> Vec<String> {
        self.fetched.lock().unwrap().clone()
    }

    /// Names of evicted resources
    pub fn evicted(&self) -> Vec<String> {
        self.evicted.lock().unwrap().clone()
    }

    fn path_for(&self, resource: &Resource) -> PathBuf {
        let file_name = resource
            .url
            .rsplit('/')
            .next()
            .filter(|n| !n.is_empty())
            .unwrap_or("archive.tar.gz");
        self.root.join(&resource.name).join(file_name)
    }
}

#[async_trait]
impl Fetcher for MockFetcher {
    async fn fetch(&self, resource: &Resource) -> StagerResult<PathBuf> {
        self.fetched.lock().unwrap().push(resource.name.clone());

        let content = self
            .sources
            .lock()
            .unwrap()
            .get(&resource.url)
            .cloned()
            .ok_or_else(|| StagerError::fetch(&resource.name, "HTTP 404 Not Found"))?;

        let path = self.path_for(resource);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, content)?;
        Ok(path)
    }

    fn cached(&self, resource: &Resource) -> Option<PathBuf> {
        let path = self.path_for(resource);
        path.is_file().then_some(path)
    }

    fn evict(&self, resource: &Resource) -> StagerResult<()> {
        self.evicted.lock().unwrap().push(resource.name.clone());
        let path = self.path_for(resource);
        if path.exists() {
            fs::remove_file(path)?;
        }
        Ok(())
    }
}

/// Mock install runner for testing
///
/// Records every command instead of running it. Can be told to fail for a
/// given resource, or to drop executables into `<prefix>/bin` the way a
/// real `setup.py install` would.
#[derive(Clone)]
pub struct MockInstallRunner {
    python_version: String,
    commands: Arc<Mutex<Vec<InstallCommand>>>,
    fail_on: Arc<Mutex<Option<String>>>,
    scripts: Arc<Mutex<HashMap<String, Vec<String>>>>,
}

impl MockInstallRunner {
    pub fn new(python_version: &str) -> Self {
        Self {
            python_version: python_version.to_string(),
            commands: Arc::new(Mutex::new(Vec::new())),
            fail_on: Arc::new(Mutex::new(None)),
            scripts: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Make the install of `label` exit non-zero
    pub fn fail_on(&self, label: &str) {
        *self.fail_on.lock().unwrap() = Some(label.to_string());
    }

    /// Create these executables under `<prefix>/bin` when `label` installs
    pub fn add_scripts(&self, label: &str, names: &[&str]) {
        self.scripts.lock().unwrap().insert(
            label.to_string(),
            names.iter().map(|n| n.to_string()).collect(),
        );
    }

    /// Recorded commands, in run order
    pub fn commands(&self) -> Vec<InstallCommand> {
        self.commands.lock().unwrap().clone()
    }

    /// Labels of recorded commands, in run order
    pub fn labels(&self) -> Vec<String> {
        self.commands
            .lock()
            .unwrap()
            .iter()
            .map(|c| c.label.clone())
            .collect()
    }

    fn write_script(bin_dir: &Path, name: &str) -> StagerResult<()> {
        fs::create_dir_all(bin_dir)?;
        let path = bin_dir.join(name);
        fs::write(&path, "#!/bin/sh\necho mock\n")?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&path, fs::Permissions::from_mode(0o755))?;
        }
        Ok(())
    }
}

impl InstallRunner for MockInstallRunner {
    fn python_version(&self, _python: &str) -> StagerResult<String> {
        Ok(self.python_version.clone())
    }

    fn run(&self, command: &InstallCommand) -> StagerResult<()> {
        self.commands.lock().unwrap().push(command.clone());

        if self.fail_on.lock().unwrap().as_deref() == Some(command.label.as_str()) {
            return Err(StagerError::InstallStep {
                resource: command.label.clone(),
                status: "exit status: 1".to_string(),
                output: "error: mock install failure".to_string(),
            });
        }

        if let Some(names) = self.scripts.lock().unwrap().get(&command.label) {
            let bin_dir = command.prefix.join("bin");
            for name in names {
                Self::write_script(&bin_dir, name)?;
            }
        }

        Ok(())
    }
}
