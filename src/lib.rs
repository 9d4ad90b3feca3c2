pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use crate::config::cli::CliConfig;

pub use crate::config::CheckSettings;
pub use crate::core::{
    engine::CheckEngine, sandbox::SandboxBuilder, verifier::CommandVerifier, CheckMode,
};
pub use crate::utils::error::{CheckError, Result};
