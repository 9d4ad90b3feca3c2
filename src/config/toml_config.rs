use crate::config::CheckSettings;
use crate::core::CheckMode;
use crate::utils::error::{CheckError, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

fn env_var_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\$\{([^}]+)\}").expect("valid env var regex"))
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TomlConfig {
    #[serde(default)]
    pub docs: DocsConfig,
    #[serde(default)]
    pub sandbox: SandboxConfig,
    #[serde(default)]
    pub verifier: VerifierConfig,
    /// Directory relative paths are resolved against; set by `from_file`.
    #[serde(skip)]
    pub base_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DocsConfig {
    pub dir: Option<PathBuf>,
    pub extension: Option<String>,
    pub warn_skipped: Option<bool>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SandboxConfig {
    pub mode: Option<CheckMode>,
    pub published_namespace: Option<String>,
    pub local_namespace: Option<String>,
    pub product_package: Option<String>,
    pub product_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VerifierConfig {
    pub program: Option<String>,
    pub args: Option<Vec<String>>,
    pub timeout_secs: Option<u64>,
    pub target_dir: Option<PathBuf>,
    pub warm_up: Option<bool>,
}

impl TomlConfig {
    /// Loads a config file; relative paths inside it resolve against its directory.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            CheckError::config(format!("cannot read {}: {}", path.display(), e))
        })?;
        let mut config = Self::from_toml_str(&content)?;
        config.base_dir = path.parent().map(Path::to_path_buf);
        Ok(config)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content);

        toml::from_str(&processed_content)
            .map_err(|e| CheckError::config(format!("TOML parsing error: {}", e)))
    }

    /// Replaces `${VAR}` with the environment value; unknown variables stay as written.
    fn substitute_env_vars(content: &str) -> String {
        env_var_regex()
            .replace_all(content, |caps: &regex::Captures| {
                let var_name = &caps[1];
                std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
            })
            .into_owned()
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        match &self.base_dir {
            Some(base) if path.is_relative() => base.join(path),
            _ => path.to_path_buf(),
        }
    }

    /// Overlays every value present in the file onto `settings`.
    pub fn apply_to(&self, settings: &mut CheckSettings) {
        if let Some(dir) = &self.docs.dir {
            settings.docs_dir = self.resolve(dir);
        }
        if let Some(extension) = &self.docs.extension {
            settings.extension = extension.clone();
        }
        if let Some(warn) = self.docs.warn_skipped {
            settings.warn_skipped = warn;
        }

        if let Some(mode) = self.sandbox.mode {
            settings.mode = mode;
        }
        if let Some(ns) = &self.sandbox.published_namespace {
            settings.published_namespace = ns.clone();
        }
        if let Some(ns) = &self.sandbox.local_namespace {
            settings.local_namespace = ns.clone();
        }
        if let Some(package) = &self.sandbox.product_package {
            settings.product_package = package.clone();
        }
        if let Some(path) = &self.sandbox.product_path {
            settings.product_path = Some(self.resolve(path));
        }

        if let Some(program) = &self.verifier.program {
            settings.verifier_program = program.clone();
        }
        if let Some(args) = &self.verifier.args {
            settings.verifier_args = args.clone();
        }
        if let Some(secs) = self.verifier.timeout_secs {
            settings.timeout_secs = Some(secs);
        }
        if let Some(dir) = &self.verifier.target_dir {
            settings.target_dir = self.resolve(dir);
        }
        if let Some(warm_up) = self.verifier.warm_up {
            settings.warm_up = warm_up;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_parse_full_config() {
        let toml_content = r#"
[docs]
dir = "/srv/docs/tutorials"
extension = "markdown"
warn_skipped = true

[sandbox]
mode = "full-compile"
published_namespace = "my_sdk"
local_namespace = "local_sdk"
product_package = "my-sdk"
product_path = "/srv/my-sdk"

[verifier]
program = "cargo"
args = ["clippy", "--quiet"]
timeout_secs = 45
target_dir = "/var/cache/tutorial-check"
warm_up = false
"#;

        let config = TomlConfig::from_toml_str(toml_content).unwrap();
        let mut settings = CheckSettings::default();
        config.apply_to(&mut settings);

        assert_eq!(settings.docs_dir, PathBuf::from("/srv/docs/tutorials"));
        assert_eq!(settings.extension, "markdown");
        assert!(settings.warn_skipped);
        assert_eq!(settings.mode, CheckMode::FullCompile);
        assert_eq!(settings.published_namespace, "my_sdk");
        assert_eq!(settings.local_namespace, "local_sdk");
        assert_eq!(settings.product_package, "my-sdk");
        assert_eq!(settings.product_path, Some(PathBuf::from("/srv/my-sdk")));
        assert_eq!(settings.verifier_args, vec!["clippy", "--quiet"]);
        assert_eq!(settings.timeout_secs, Some(45));
        assert_eq!(settings.target_dir, PathBuf::from("/var/cache/tutorial-check"));
        assert!(!settings.warm_up);
    }

    #[test]
    fn test_empty_config_keeps_defaults() {
        let config = TomlConfig::from_toml_str("").unwrap();
        let mut settings = CheckSettings::default();
        config.apply_to(&mut settings);

        let defaults = CheckSettings::default();
        assert_eq!(settings.docs_dir, defaults.docs_dir);
        assert_eq!(settings.mode, CheckMode::SyntaxOnly);
        assert_eq!(settings.verifier_program, "cargo");
    }

    #[test]
    fn test_env_var_substitution() {
        std::env::set_var("TUTORIAL_CHECK_TEST_PRODUCT", "/opt/product");

        let config = TomlConfig::from_toml_str(
            r#"
[sandbox]
product_path = "${TUTORIAL_CHECK_TEST_PRODUCT}"
local_namespace = "${TUTORIAL_CHECK_UNSET_VARIABLE}"
"#,
        )
        .unwrap();

        assert_eq!(config.sandbox.product_path, Some(PathBuf::from("/opt/product")));
        assert_eq!(
            config.sandbox.local_namespace.as_deref(),
            Some("${TUTORIAL_CHECK_UNSET_VARIABLE}")
        );

        std::env::remove_var("TUTORIAL_CHECK_TEST_PRODUCT");
    }

    #[test]
    fn test_relative_paths_resolve_against_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[docs]\ndir = \"docs/tutorials\"\n\n[sandbox]\nproduct_path = \"..\"").unwrap();

        let config = TomlConfig::from_file(file.path()).unwrap();
        let mut settings = CheckSettings::default();
        config.apply_to(&mut settings);

        let base = file.path().parent().unwrap();
        assert_eq!(settings.docs_dir, base.join("docs/tutorials"));
        assert_eq!(settings.product_path, Some(base.join("..")));
    }

    #[test]
    fn test_unknown_keys_and_bad_mode_rejected() {
        assert!(TomlConfig::from_toml_str("[docs]\nfolder = \"x\"").is_err());
        assert!(TomlConfig::from_toml_str("[sandbox]\nmode = \"fast\"").is_err());
    }

    #[test]
    fn test_missing_file_is_config_error() {
        let err = TomlConfig::from_file("/no/such/tutorial-check.toml").unwrap_err();
        assert!(matches!(err, CheckError::ConfigError { .. }));
    }
}
