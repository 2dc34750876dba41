//! Service container for dependency injection

use super::traits::{ConfigProvider, Fetcher, InstallRunner};
use crate::cache::Cache;
use crate::config::Config;
use crate::core::StagerResult;
use crate::fetch::HttpFetcher;
use crate::stage::python::SystemRunner;
use std::sync::Arc;

/// Service container for dependency injection
///
/// Holds the services an install needs behind trait objects, so tests can
/// inject mocks in place of the network and the Python toolchain.
#[derive(Clone)]
pub struct ServiceContainer {
    pub config: Arc<dyn ConfigProvider>,
    pub cache: Cache,
    pub fetcher: Arc<dyn Fetcher>,
    pub runner: Arc<dyn InstallRunner>,
}

impl ServiceContainer {
    /// Create a new service container with production implementations
    ///
    /// Loads config from disk, creates the cache in the configured directory
    /// and builds the HTTP fetcher.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Config file cannot be loaded or created
    /// - Cache directory cannot be created
    /// - The HTTP client cannot be built
    pub fn new() -> StagerResult<Self> {
        let config = Config::load()?;
        Self::from_config(config)
    }

    /// Build production services from an already loaded config
    pub fn from_config(config: Config) -> StagerResult<Self> {
        let cache = Cache::new(config.get_cache_dir()?)?;
        cache.init()?;
        let fetcher = HttpFetcher::new(cache.clone(), config.fetch_timeout())?;

        Ok(Self {
            config: Arc::new(config),
            cache,
            fetcher: Arc::new(fetcher),
            runner: Arc::new(SystemRunner::new()),
        })
    }

    /// Create a service container with custom provider implementations
    ///
    /// This is primarily useful for testing, where you can inject mock
    /// implementations of each service.
    pub fn with_providers(
        config: Arc<dyn ConfigProvider>,
        cache: Cache,
        fetcher: Arc<dyn Fetcher>,
        runner: Arc<dyn InstallRunner>,
    ) -> Self {
        Self {
            config,
            cache,
            fetcher,
            runner,
        }
    }

    pub fn config(&self) -> &dyn ConfigProvider {
        self.config.as_ref()
    }
}
