//! Core utilities shared by the Stager CLI and library.
//!
//! Holds the error type, filesystem layout helpers and the search-path
//! builder used to make vendored packages importable.

pub mod core;
pub mod search_path;

pub use core::error::{StagerError, StagerResult};
pub use core::error_help::{format_error_with_help, ErrorHelp};
pub use search_path::SearchPath;
