//! Staging: unpack, install and wrap.

pub mod extractor;
pub mod python;
pub mod receipt;
pub mod rollback;
pub mod stager;
pub mod wheel;
pub mod wrappers;

pub use receipt::{list_installed, InstallReceipt, InstalledKeg};
pub use stager::{InstallOutcome, MainSource, Stager, StagerOptions};
