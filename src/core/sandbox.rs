use crate::core::CheckMode;
use crate::utils::error::{CheckError, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

pub const STUB_LIBRARY: &str = include_str!("../../templates/stub_lib.rs");

const SANDBOX_PACKAGE: &str = "tutorial-sandbox";
const SANDBOX_BIN: &str = "tutorial-example";
const SANDBOX_DIR_PREFIX: &str = "tutorial-check-";

// Pinned loosely: only needs to agree with the stub library and the usual tutorial imports.
const COMMON_DEPENDENCIES: &str = r#"tokio = { version = "1", features = ["full"] }
serde = { version = "1", features = ["derive"] }
serde_json = "1"
futures = "0.3"
"#;

/// An ephemeral cargo project holding one harness. Dropping it removes the
/// whole tree, whichever way verification ended.
#[derive(Debug)]
pub struct SandboxProject {
    dir: TempDir,
    pub manifest_file: PathBuf,
    pub stub_library_file: Option<PathBuf>,
    pub entry_file: PathBuf,
}

impl SandboxProject {
    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Removes the tree now and reports removal errors instead of ignoring them.
    pub fn close(self) -> Result<()> {
        self.dir.close()?;
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct SandboxBuilder {
    mode: CheckMode,
    local_namespace: String,
    product_package: String,
    product_path: Option<PathBuf>,
    temp_root: Option<PathBuf>,
}

impl SandboxBuilder {
    pub fn syntax_only(local_namespace: impl Into<String>) -> Self {
        Self {
            mode: CheckMode::SyntaxOnly,
            local_namespace: local_namespace.into(),
            product_package: String::new(),
            product_path: None,
            temp_root: None,
        }
    }

    pub fn full_compile(
        local_namespace: impl Into<String>,
        product_package: impl Into<String>,
        product_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            mode: CheckMode::FullCompile,
            local_namespace: local_namespace.into(),
            product_package: product_package.into(),
            product_path: Some(product_path.into()),
            temp_root: None,
        }
    }

    /// Creates sandboxes under `root` instead of the system temp directory.
    pub fn with_temp_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.temp_root = Some(root.into());
        self
    }

    pub fn mode(&self) -> CheckMode {
        self.mode
    }

    pub fn manifest(&self) -> Result<String> {
        let mut manifest = format!(
            "[package]\nname = \"{}\"\nversion = \"0.0.0\"\nedition = \"2021\"\npublish = false\n\n",
            SANDBOX_PACKAGE
        );

        if self.mode == CheckMode::SyntaxOnly {
            manifest.push_str(&format!(
                "[lib]\nname = \"{}\"\npath = \"src/lib.rs\"\n\n",
                self.local_namespace
            ));
        }

        manifest.push_str(&format!(
            "[[bin]]\nname = \"{}\"\npath = \"src/main.rs\"\n\n[dependencies]\n",
            SANDBOX_BIN
        ));

        if self.mode == CheckMode::FullCompile {
            let product_path = self.product_path.as_ref().ok_or_else(|| {
                CheckError::MissingConfigError {
                    field: "sandbox.product_path".to_string(),
                }
            })?;
            let product_path = product_path.canonicalize().unwrap_or_else(|_| product_path.clone());
            // toml quoting escapes backslashes in Windows paths
            let quoted_path = toml::Value::String(product_path.display().to_string());
            manifest.push_str(&format!(
                "{} = {{ path = {}, package = \"{}\" }}\n",
                self.local_namespace, quoted_path, self.product_package
            ));
        }

        manifest.push_str(COMMON_DEPENDENCIES);
        // An empty workspace table keeps the sandbox out of any enclosing workspace.
        manifest.push_str("\n[workspace]\n");
        Ok(manifest)
    }

    pub fn build(&self, harness_source: &str) -> Result<SandboxProject> {
        let mut builder = tempfile::Builder::new();
        builder.prefix(SANDBOX_DIR_PREFIX);
        let dir = match &self.temp_root {
            Some(root) => builder.tempdir_in(root),
            None => builder.tempdir(),
        }
        .map_err(|e| CheckError::sandbox(format!("cannot create sandbox directory: {}", e)))?;

        let src_dir = dir.path().join("src");
        fs::create_dir_all(&src_dir)?;

        let manifest_file = dir.path().join("Cargo.toml");
        fs::write(&manifest_file, self.manifest()?)?;

        let stub_library_file = match self.mode {
            CheckMode::SyntaxOnly => {
                let path = src_dir.join("lib.rs");
                fs::write(&path, STUB_LIBRARY)?;
                Some(path)
            }
            CheckMode::FullCompile => None,
        };

        let entry_file = src_dir.join("main.rs");
        fs::write(&entry_file, harness_source)?;

        tracing::debug!("Sandbox ready at {}", dir.path().display());
        Ok(SandboxProject {
            dir,
            manifest_file,
            stub_library_file,
            entry_file,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_syntax_only_sandbox_layout() {
        let builder = SandboxBuilder::syntax_only("tutorial_sdk");
        let sandbox = builder.build("fn main() {}\n").unwrap();

        let manifest = fs::read_to_string(&sandbox.manifest_file).unwrap();
        assert!(manifest.contains("name = \"tutorial_sdk\""));
        assert!(manifest.contains("tokio = { version = \"1\", features = [\"full\"] }"));
        assert!(manifest.contains("[workspace]"));

        let stub = sandbox.stub_library_file.as_ref().unwrap();
        assert_eq!(fs::read_to_string(stub).unwrap(), STUB_LIBRARY);
        assert_eq!(fs::read_to_string(&sandbox.entry_file).unwrap(), "fn main() {}\n");
    }

    #[test]
    fn test_full_compile_manifest_uses_path_dependency() {
        let product = TempDir::new().unwrap();
        let builder =
            SandboxBuilder::full_compile("tutorial_sdk", "claude-sdk-rs", product.path());
        let sandbox = builder.build("fn main() {}\n").unwrap();

        let manifest = fs::read_to_string(&sandbox.manifest_file).unwrap();
        assert!(manifest.contains("tutorial_sdk = { path = "));
        assert!(manifest.contains("package = \"claude-sdk-rs\""));
        assert!(!manifest.contains("[lib]"));
        assert!(sandbox.stub_library_file.is_none());
        assert!(!sandbox.path().join("src/lib.rs").exists());
    }

    #[test]
    fn test_manifest_parses_as_toml() {
        let product = TempDir::new().unwrap();
        for builder in [
            SandboxBuilder::syntax_only("tutorial_sdk"),
            SandboxBuilder::full_compile("tutorial_sdk", "claude-sdk-rs", product.path()),
        ] {
            let manifest = builder.manifest().unwrap();
            let parsed: toml::Table = toml::from_str(&manifest).unwrap();
            let name = parsed
                .get("package")
                .and_then(|p| p.get("name"))
                .and_then(|n| n.as_str());
            assert_eq!(name, Some("tutorial-sandbox"));
            assert!(parsed
                .get("dependencies")
                .and_then(|d| d.get("tokio"))
                .is_some());
        }
    }

    #[test]
    fn test_each_build_gets_a_fresh_directory() {
        let root = TempDir::new().unwrap();
        let builder = SandboxBuilder::syntax_only("tutorial_sdk").with_temp_root(root.path());

        let first = builder.build("fn main() {}").unwrap();
        let second = builder.build("fn main() {}").unwrap();
        assert_ne!(first.path(), second.path());
        assert!(first.path().starts_with(root.path()));
    }

    #[test]
    fn test_sandbox_removed_on_drop() {
        let builder = SandboxBuilder::syntax_only("tutorial_sdk");
        let sandbox = builder.build("fn main() {}").unwrap();
        let path = sandbox.path().to_path_buf();
        assert!(path.exists());

        drop(sandbox);
        assert!(!path.exists());
    }

    #[test]
    fn test_sandbox_close_removes_tree() {
        let builder = SandboxBuilder::syntax_only("tutorial_sdk");
        let sandbox = builder.build("fn main() {}").unwrap();
        let path = sandbox.path().to_path_buf();

        sandbox.close().unwrap();
        assert!(!path.exists());
    }

    #[test]
    fn test_unwritable_root_is_sandbox_error() {
        let builder = SandboxBuilder::syntax_only("tutorial_sdk")
            .with_temp_root("/definitely/not/a/real/dir");
        let err = builder.build("fn main() {}").unwrap_err();
        assert!(matches!(err, CheckError::SandboxError { .. }));
    }
}
