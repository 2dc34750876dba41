//! Trait definitions for dependency injection

use crate::core::StagerResult;
use crate::formula::Resource;
use crate::stage::python::InstallCommand;
use async_trait::async_trait;
use std::path::PathBuf;
use std::time::Duration;

/// Trait for configuration access
///
/// Provides read-only access to application configuration.
/// Implementations should be thread-safe (Send + Sync).
pub trait ConfigProvider: Send + Sync {
    /// Get the cache directory path
    fn cache_dir(&self) -> StagerResult<PathBuf>;

    /// Get the directory holding installed kegs
    fn cellar(&self) -> StagerResult<PathBuf>;

    /// Default interpreter
    fn python(&self) -> &str;

    /// Timeout for a single download
    fn fetch_timeout(&self) -> Duration;
}

/// Trait for fetching resource archives
///
/// Implementations only move bytes; integrity is checked by the caller.
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Fetch a resource's archive to local storage and return its path
    async fn fetch(&self, resource: &Resource) -> StagerResult<PathBuf>;

    /// Local path of an already fetched archive, if there is one
    fn cached(&self, resource: &Resource) -> Option<PathBuf>;

    /// Forget a fetched archive so the next fetch starts over
    fn evict(&self, resource: &Resource) -> StagerResult<()>;
}

/// Trait for running a package's own install procedure
pub trait InstallRunner: Send + Sync {
    /// `MAJOR.MINOR` version of an interpreter
    fn python_version(&self, python: &str) -> StagerResult<String>;

    /// Run an install command, failing with `InstallStep` on a non-zero exit
    fn run(&self, command: &InstallCommand) -> StagerResult<()>;
}
