#[cfg(feature = "cli")]
pub mod cli;
pub mod toml_config;

use crate::core::verifier::{DEFAULT_ARGS, DEFAULT_PROGRAM};
use crate::core::{CheckMode, ConfigProvider};
use crate::utils::error::{CheckError, Result};
use crate::utils::validation::{self, Validate};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_PUBLISHED_NAMESPACE: &str = "claude_sdk_rs";
pub const DEFAULT_LOCAL_NAMESPACE: &str = "tutorial_sdk";
pub const DEFAULT_PRODUCT_PACKAGE: &str = "claude-sdk-rs";
pub const DEFAULT_EXTENSION: &str = "md";

/// `docs/tutorials` next to this crate's manifest.
pub fn default_docs_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("docs")
        .join("tutorials")
}

/// Cargo target directory shared by every sandbox, kept between runs.
pub fn default_target_dir() -> PathBuf {
    std::env::temp_dir().join("tutorial-check-target")
}

/// Fully resolved settings: defaults, then the TOML file, then CLI flags.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckSettings {
    pub docs_dir: PathBuf,
    pub extension: String,
    pub mode: CheckMode,
    pub published_namespace: String,
    pub local_namespace: String,
    pub product_package: String,
    pub product_path: Option<PathBuf>,
    /// Falls back to the mode's default when unset.
    pub timeout_secs: Option<u64>,
    pub verifier_program: String,
    pub verifier_args: Vec<String>,
    pub target_dir: PathBuf,
    /// Build dependencies once, untimed, before the first block.
    pub warm_up: bool,
    pub warn_skipped: bool,
}

impl Default for CheckSettings {
    fn default() -> Self {
        Self {
            docs_dir: default_docs_dir(),
            extension: DEFAULT_EXTENSION.to_string(),
            mode: CheckMode::default(),
            published_namespace: DEFAULT_PUBLISHED_NAMESPACE.to_string(),
            local_namespace: DEFAULT_LOCAL_NAMESPACE.to_string(),
            product_package: DEFAULT_PRODUCT_PACKAGE.to_string(),
            product_path: None,
            timeout_secs: None,
            verifier_program: DEFAULT_PROGRAM.to_string(),
            verifier_args: DEFAULT_ARGS.iter().map(|a| a.to_string()).collect(),
            target_dir: default_target_dir(),
            warm_up: true,
            warn_skipped: false,
        }
    }
}

impl ConfigProvider for CheckSettings {
    fn docs_dir(&self) -> &Path {
        &self.docs_dir
    }

    fn extension(&self) -> &str {
        &self.extension
    }

    fn mode(&self) -> CheckMode {
        self.mode
    }

    fn published_namespace(&self) -> &str {
        &self.published_namespace
    }

    fn local_namespace(&self) -> &str {
        &self.local_namespace
    }

    fn product_package(&self) -> &str {
        &self.product_package
    }

    fn product_path(&self) -> Option<&Path> {
        self.product_path.as_deref()
    }

    fn timeout(&self) -> Duration {
        self.timeout_secs
            .map(Duration::from_secs)
            .unwrap_or_else(|| self.mode.default_timeout())
    }

    fn target_dir(&self) -> &Path {
        &self.target_dir
    }

    fn warm_up(&self) -> bool {
        self.warm_up
    }

    fn warn_skipped(&self) -> bool {
        self.warn_skipped
    }
}

impl Validate for CheckSettings {
    fn validate(&self) -> Result<()> {
        validation::validate_path("docs.dir", &self.docs_dir.to_string_lossy())?;
        validation::validate_extension("docs.extension", &self.extension)?;
        validation::validate_identifier("sandbox.published_namespace", &self.published_namespace)?;
        validation::validate_identifier("sandbox.local_namespace", &self.local_namespace)?;
        validation::validate_non_empty_string("verifier.program", &self.verifier_program)?;
        validation::validate_path("verifier.target_dir", &self.target_dir.to_string_lossy())?;

        if let Some(secs) = self.timeout_secs {
            validation::validate_positive_number("verifier.timeout_secs", secs, 1)?;
        }

        if self.mode == CheckMode::FullCompile {
            validation::validate_non_empty_string("sandbox.product_package", &self.product_package)?;
            let product_path = validation::validate_required_field("sandbox.product_path", &self.product_path)?;
            if !product_path.join("Cargo.toml").is_file() {
                return Err(CheckError::InvalidConfigValueError {
                    field: "sandbox.product_path".to_string(),
                    value: product_path.display().to_string(),
                    reason: "No Cargo.toml found there".to_string(),
                });
            }
        }

        Ok(())
    }
}
