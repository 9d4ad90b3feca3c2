use crate::domain::model::{CheckMode, Verdict};
use crate::utils::error::Result;
use async_trait::async_trait;
use std::path::Path;
use std::time::Duration;

pub trait ConfigProvider: Send + Sync {
    fn docs_dir(&self) -> &Path;
    fn extension(&self) -> &str;
    fn mode(&self) -> CheckMode;
    fn published_namespace(&self) -> &str;
    fn local_namespace(&self) -> &str;
    fn product_package(&self) -> &str;
    fn product_path(&self) -> Option<&Path>;
    fn timeout(&self) -> Duration;
    fn target_dir(&self) -> &Path;
    fn warm_up(&self) -> bool;
    fn warn_skipped(&self) -> bool;
}

/// The external oracle that accepts or rejects a sandbox project.
#[async_trait]
pub trait Verifier: Send + Sync {
    /// Checks the project rooted at `project_dir`. Timeouts and spawn failures
    /// are failed verdicts, not errors.
    async fn verify(&self, project_dir: &Path) -> Verdict;

    /// Called once before the first block with a throwaway project, untimed.
    async fn prepare(&self, _project_dir: &Path) -> Result<()> {
        Ok(())
    }
}
