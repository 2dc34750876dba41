//! Integration tests module
//!
//! This module contains all integration tests for stager CLI commands.

pub mod common;
pub mod config;
pub mod fetch;
pub mod install;
pub mod list;
pub mod verify;
