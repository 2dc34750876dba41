pub mod config;
pub mod fetch;
pub mod install;
pub mod list;
pub mod uninstall;
pub mod verify;
