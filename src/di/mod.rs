//! Dependency injection infrastructure for Stager
//!
//! The stager talks to the network and to child processes only through the
//! traits in this module, so tests can swap in the mocks.
//!
//! # Example (Production)
//! ```no_run
//! use stager::di::ServiceContainer;
//!
//! # fn example() -> stager::core::StagerResult<()> {
//! let container = ServiceContainer::new()?;
//! # Ok(())
//! # }
//! ```
//!
//! # Example (Testing)
//! ```
//! use stager::cache::Cache;
//! use stager::di::{ServiceContainer, mocks::*};
//! use std::sync::Arc;
//!
//! # fn example() -> stager::core::StagerResult<()> {
//! let temp = std::env::temp_dir().join("stager-doc-example");
//! let config = Arc::new(MockConfigProvider::default());
//! let fetcher = Arc::new(MockFetcher::new(temp.join("downloads")));
//! let runner = Arc::new(MockInstallRunner::new("3.11"));
//! let cache = Cache::new(temp.join("cache"))?;
//!
//! let container = ServiceContainer::with_providers(config, cache, fetcher, runner);
//! # Ok(())
//! # }
//! ```

pub mod container;
pub mod mocks;
pub mod traits;

// Re-export key types
pub use container::ServiceContainer;
pub use traits::{ConfigProvider, Fetcher, InstallRunner};
