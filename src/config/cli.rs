use crate::config::toml_config::TomlConfig;
use crate::config::CheckSettings;
use crate::core::CheckMode;
use crate::utils::error::Result;
use clap::Parser;
use std::path::PathBuf;

#[derive(Debug, Clone, Default, Parser)]
#[command(name = "tutorial-check")]
#[command(about = "Compile-check the Rust samples embedded in markdown tutorials")]
pub struct CliConfig {
    /// Directory holding the tutorial documents [default: docs/tutorials next to this crate]
    #[arg(long)]
    pub docs_dir: Option<PathBuf>,

    /// File extension of tutorial documents
    #[arg(long)]
    pub extension: Option<String>,

    /// How product references are resolved
    #[arg(long, value_enum)]
    pub mode: Option<CheckMode>,

    /// Path to a tutorial-check.toml configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Product crate used in full-compile mode
    #[arg(long)]
    pub product_path: Option<PathBuf>,

    /// Per-block verification timeout [default: 15 syntax-only, 30 full-compile]
    #[arg(long)]
    pub timeout_secs: Option<u64>,

    /// Cargo target directory shared by all sandboxes [default: <tmp>/tutorial-check-target]
    #[arg(long)]
    pub target_dir: Option<PathBuf>,

    /// Skip the untimed dependency build before the first block
    #[arg(long)]
    pub no_warm_up: bool,

    /// Write the run report as JSON to this path
    #[arg(long)]
    pub report: Option<PathBuf>,

    /// Warn about blocks skipped by the relevance filter and unterminated fences
    #[arg(long)]
    pub warn_skipped: bool,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Emit logs as JSON lines")]
    pub json_logs: bool,
}

impl CliConfig {
    /// Defaults, then the config file, then flags given on the command line.
    pub fn resolve(&self) -> Result<CheckSettings> {
        let mut settings = CheckSettings::default();

        if let Some(path) = &self.config {
            tracing::info!("📁 Loading configuration from: {}", path.display());
            TomlConfig::from_file(path)?.apply_to(&mut settings);
        }

        if let Some(dir) = &self.docs_dir {
            settings.docs_dir = dir.clone();
        }
        if let Some(extension) = &self.extension {
            settings.extension = extension.clone();
        }
        if let Some(mode) = self.mode {
            settings.mode = mode;
        }
        if let Some(path) = &self.product_path {
            settings.product_path = Some(path.clone());
        }
        if let Some(secs) = self.timeout_secs {
            settings.timeout_secs = Some(secs);
        }
        if let Some(dir) = &self.target_dir {
            settings.target_dir = dir.clone();
        }
        if self.no_warm_up {
            settings.warm_up = false;
        }
        if self.warn_skipped {
            settings.warn_skipped = true;
        }

        Ok(settings)
    }
}
