//! Stager: a staged dependency installer for pinned Python formulae
//!
//! This crate provides the main Stager library, re-exporting core functionality
//! from `stager-core` and organizing the modules that fetch, verify, vendor
//! and wrap a formula's packages.

pub use stager_core::{format_error_with_help, ErrorHelp, SearchPath, StagerError, StagerResult};

/// Core module re-exported from stager-core.
pub mod core {
    pub use stager_core::core::*;
    pub use stager_core::*;

    /// Path module re-exported from stager-core.
    pub mod path {
        pub use stager_core::core::path::*;
    }
}

/// Configuration management.
pub mod config;

/// Download cache.
pub mod cache;

/// Formula manifests and checksums.
pub mod formula;

/// Fetching resource archives.
pub mod fetch;

/// Dependency injection infrastructure.
pub mod di;

/// Extraction, installation, wrappers and receipts.
pub mod stage;
