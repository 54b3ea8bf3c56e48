pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;

pub use adapters::process::SystemRunner;
pub use config::{Settings, TomlConfig};
pub use core::{
    bootstrap::{BootstrapContext, Bootstrapper},
    engine::{BootstrapEngine, Command, RunOutcome},
};
pub use utils::error::{BootstrapError, Result};
