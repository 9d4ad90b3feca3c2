use crate::core::extract::extract_blocks;
use crate::core::filter::RelevanceFilter;
use crate::core::harness::HarnessSynthesizer;
use crate::core::report::{source_preview, ReportPrinter};
use crate::core::sandbox::SandboxBuilder;
use crate::core::{
    CheckMode, CodeBlock, ConfigProvider, Document, DocumentReport, RunReport, Verdict,
    VerificationOutcome, Verifier,
};
use crate::utils::error::{CheckError, Result};
use std::io::Write;
use std::path::PathBuf;
use std::time::Instant;
use tokio::sync::OnceCell;

/// Compiled once, untimed, before the first block so the dependency build is
/// not charged against any block's timeout.
const WARM_UP_BLOCK: &str = "fn main() {}";

/// Drives every document and block through extraction, filtering, harness
/// synthesis, sandboxing and verification, one block at a time.
pub struct CheckEngine<V: Verifier> {
    verifier: V,
    filter: RelevanceFilter,
    synthesizer: HarnessSynthesizer,
    sandbox: SandboxBuilder,
    docs_dir: PathBuf,
    extension: String,
    warn_skipped: bool,
    warm_up: bool,
    warmed_up: OnceCell<()>,
}

impl<V: Verifier> CheckEngine<V> {
    pub fn new(
        verifier: V,
        filter: RelevanceFilter,
        synthesizer: HarnessSynthesizer,
        sandbox: SandboxBuilder,
        docs_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            verifier,
            filter,
            synthesizer,
            sandbox,
            docs_dir: docs_dir.into(),
            extension: crate::config::DEFAULT_EXTENSION.to_string(),
            warn_skipped: false,
            warm_up: false,
            warmed_up: OnceCell::new(),
        }
    }

    pub fn from_config<C: ConfigProvider>(config: &C, verifier: V) -> Result<Self> {
        let sandbox = match config.mode() {
            CheckMode::SyntaxOnly => SandboxBuilder::syntax_only(config.local_namespace()),
            CheckMode::FullCompile => {
                let product_path = config.product_path().ok_or_else(|| {
                    CheckError::MissingConfigError {
                        field: "sandbox.product_path".to_string(),
                    }
                })?;
                SandboxBuilder::full_compile(
                    config.local_namespace(),
                    config.product_package(),
                    product_path,
                )
            }
        };

        Ok(Self {
            verifier,
            filter: RelevanceFilter::new(config.published_namespace()),
            synthesizer: HarnessSynthesizer::new(
                config.published_namespace(),
                config.local_namespace(),
            ),
            sandbox,
            docs_dir: config.docs_dir().to_path_buf(),
            extension: config.extension().to_string(),
            warn_skipped: config.warn_skipped(),
            warm_up: config.warm_up(),
            warmed_up: OnceCell::new(),
        })
    }

    pub fn with_warn_skipped(mut self, warn_skipped: bool) -> Self {
        self.warn_skipped = warn_skipped;
        self
    }

    pub fn with_warm_up(mut self, warm_up: bool) -> Self {
        self.warm_up = warm_up;
        self
    }

    /// Documents directly inside the docs dir with the configured extension,
    /// sorted by file name.
    pub fn discover_documents(&self) -> Result<Vec<PathBuf>> {
        if !self.docs_dir.is_dir() {
            return Err(CheckError::MissingDocsDirError {
                path: self.docs_dir.clone(),
            });
        }

        let mut documents = Vec::new();
        for entry in std::fs::read_dir(&self.docs_dir)? {
            let path = entry?.path();
            let matches = path.is_file()
                && path
                    .extension()
                    .and_then(|ext| ext.to_str())
                    .is_some_and(|ext| ext == self.extension);
            if matches {
                documents.push(path);
            }
        }
        documents.sort_by(|a, b| a.file_name().cmp(&b.file_name()));

        tracing::debug!(
            "Found {} *.{} documents in {}",
            documents.len(),
            self.extension,
            self.docs_dir.display()
        );
        Ok(documents)
    }

    /// Blocks worth checking, in document order.
    pub fn relevant_blocks(&self, document: &Document) -> Vec<CodeBlock> {
        let mut blocks = extract_blocks(&document.text);
        let mut relevant = Vec::new();

        for block in blocks.by_ref() {
            if self.filter.is_relevant(&block.raw_text) {
                relevant.push(block);
            } else {
                self.report_skipped(&format!(
                    "{}: block {} has no entry point or product import, skipped",
                    document.name,
                    block.display_number()
                ));
            }
        }

        if let Some(line) = blocks.dangling_opener() {
            self.report_skipped(&format!(
                "{}: code fence opened at line {} is never closed, ignored",
                document.name, line
            ));
        }

        relevant
    }

    fn report_skipped(&self, message: &str) {
        if self.warn_skipped {
            tracing::warn!("⚠️ {}", message);
        } else {
            tracing::debug!("{}", message);
        }
    }

    async fn warm_up_verifier(&self) {
        let harness = self.synthesizer.synthesize(WARM_UP_BLOCK);
        let project = match self.sandbox.build(&harness.source) {
            Ok(project) => project,
            Err(e) => {
                tracing::warn!("⚠️ Skipping verifier warm-up: {}", e);
                return;
            }
        };

        tracing::info!("🔥 Warming up the verifier (not timed)");
        let started = Instant::now();
        match self.verifier.prepare(project.path()).await {
            Ok(()) => tracing::info!("Verifier ready after {:.1}s", started.elapsed().as_secs_f32()),
            Err(e) => tracing::warn!(
                "⚠️ Verifier warm-up failed, blocks may time out: {} ({})",
                e,
                e.recovery_suggestion()
            ),
        }

        if let Err(e) = project.close() {
            tracing::warn!("Failed to remove warm-up sandbox: {}", e);
        }
    }

    /// Checks one block in its own sandbox. Never fails: sandbox problems
    /// become a failed outcome for this block only.
    pub async fn check_block(&self, block: &CodeBlock) -> VerificationOutcome {
        if self.warm_up {
            self.warmed_up.get_or_init(|| self.warm_up_verifier()).await;
        }

        let started = Instant::now();
        let harness = self.synthesizer.synthesize(&block.raw_text);

        let verdict = match self.sandbox.build(&harness.source) {
            Ok(project) => {
                let verdict = self.verifier.verify(project.path()).await;
                if let Err(e) = project.close() {
                    tracing::warn!("Failed to remove sandbox: {}", e);
                }
                verdict
            }
            Err(e) => {
                tracing::error!("❌ Sandbox for block {} failed: {}", block.display_number(), e);
                Verdict::fail(format!("Failed to prepare sandbox: {}", e))
            }
        };

        let source_preview = if verdict.passed {
            String::new()
        } else {
            source_preview(&block.raw_text)
        };

        VerificationOutcome {
            block_ordinal: block.ordinal,
            passed: verdict.passed,
            diagnostic: verdict.diagnostic,
            source_preview,
            duration: started.elapsed(),
        }
    }

    pub async fn check_document<W: Write>(
        &self,
        document: &Document,
        printer: &mut ReportPrinter<W>,
    ) -> Result<DocumentReport> {
        printer.document_started(&document.name)?;

        let mut outcomes = Vec::new();
        for block in self.relevant_blocks(document) {
            let outcome = self.check_block(&block).await;
            printer.block_finished(&outcome)?;
            outcomes.push(outcome);
        }

        let report = DocumentReport::new(&document.name, outcomes);
        printer.document_finished(&report)?;
        Ok(report)
    }

    pub async fn run<W: Write>(&self, out: W) -> Result<RunReport> {
        let documents = self.discover_documents()?;
        let mode = self.sandbox.mode();

        let mut printer = ReportPrinter::new(out);
        printer.banner(mode, &self.docs_dir)?;
        tracing::info!("🚀 Checking {} documents ({} mode)", documents.len(), mode.label());

        let mut report = RunReport::new(mode);
        for path in documents {
            let document_report = match std::fs::read_to_string(&path) {
                Ok(text) => {
                    let document = Document::new(path, text);
                    self.check_document(&document, &mut printer).await?
                }
                Err(e) => {
                    let name = Document::new(path, String::new()).name;
                    tracing::error!("❌ Cannot read {}: {}", name, e);
                    printer.document_started(&name)?;
                    printer.document_unreadable(&e.to_string())?;
                    DocumentReport::unreadable(name, e.to_string())
                }
            };
            report.documents.push(document_report);
        }

        printer.summary(&report)?;
        tracing::info!(
            "Checked {} blocks, {} failed",
            report.total_blocks(),
            report.failed_blocks()
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::path::Path;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use tempfile::TempDir;

    /// Records every harness it is asked to verify and fails those containing `FAIL`.
    #[derive(Default)]
    struct RecordingVerifier {
        seen: Mutex<Vec<String>>,
        prepared: AtomicUsize,
    }

    #[async_trait]
    impl Verifier for RecordingVerifier {
        async fn verify(&self, project_dir: &Path) -> Verdict {
            let source = std::fs::read_to_string(project_dir.join("src/main.rs")).unwrap();
            let failed = source.contains("FAIL");
            self.seen.lock().unwrap().push(source);
            if failed {
                Verdict::fail("error: forced failure")
            } else {
                Verdict::pass()
            }
        }

        async fn prepare(&self, project_dir: &Path) -> Result<()> {
            assert!(project_dir.join("src/main.rs").is_file());
            self.prepared.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    fn engine(docs_dir: &Path) -> CheckEngine<RecordingVerifier> {
        CheckEngine::new(
            RecordingVerifier::default(),
            RelevanceFilter::new("claude_sdk_rs"),
            HarnessSynthesizer::new("claude_sdk_rs", "tutorial_sdk"),
            SandboxBuilder::syntax_only("tutorial_sdk"),
            docs_dir,
        )
    }

    fn document(text: &str) -> Document {
        Document::new(PathBuf::from("guide.md"), text.to_string())
    }

    #[test]
    fn test_discovery_is_sorted_and_non_recursive() {
        let dir = TempDir::new().unwrap();
        for name in ["b.md", "a.md", "notes.txt", "c.MD"] {
            std::fs::write(dir.path().join(name), "").unwrap();
        }
        std::fs::create_dir(dir.path().join("nested")).unwrap();
        std::fs::write(dir.path().join("nested/d.md"), "").unwrap();

        let found = engine(dir.path()).discover_documents().unwrap();
        let names: Vec<String> = found
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["a.md", "b.md"]);
    }

    #[test]
    fn test_missing_docs_dir() {
        let err = engine(Path::new("/no/such/docs")).discover_documents().unwrap_err();
        assert!(matches!(err, CheckError::MissingDocsDirError { .. }));
    }

    #[test]
    fn test_irrelevant_blocks_produce_no_outcome() {
        let doc = document(
            "```rust\nlet x = 1;\n```\n```rust\nuse claude_sdk_rs::Client;\n```\n```rust\nfn helper() {}\n```",
        );
        let blocks = engine(Path::new(".")).relevant_blocks(&doc);
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].ordinal, 1);
    }

    #[tokio::test]
    async fn test_check_block_cleans_up_sandbox() {
        let dir = TempDir::new().unwrap();
        let engine = CheckEngine::new(
            RecordingVerifier::default(),
            RelevanceFilter::new("claude_sdk_rs"),
            HarnessSynthesizer::new("claude_sdk_rs", "tutorial_sdk"),
            SandboxBuilder::syntax_only("tutorial_sdk").with_temp_root(dir.path()),
            dir.path(),
        );
        let block = CodeBlock {
            ordinal: 0,
            raw_text: "fn main() {}".to_string(),
        };

        let outcome = engine.check_block(&block).await;
        assert!(outcome.passed);
        assert!(outcome.source_preview.is_empty());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_sandbox_failure_is_isolated_to_block() {
        let engine = CheckEngine::new(
            RecordingVerifier::default(),
            RelevanceFilter::new("claude_sdk_rs"),
            HarnessSynthesizer::new("claude_sdk_rs", "tutorial_sdk"),
            SandboxBuilder::syntax_only("tutorial_sdk").with_temp_root("/no/such/tmp"),
            ".",
        );
        let doc = document("```rust\nfn main() {}\n```\n```rust\nfn main() { let a = 1; }\n```");

        let mut printer = ReportPrinter::new(Vec::new());
        let report = engine.check_document(&doc, &mut printer).await.unwrap();

        assert_eq!(report.block_count, 2);
        assert!(!report.all_passed);
        assert!(report.outcomes[0].diagnostic.contains("Failed to prepare sandbox"));
        assert!(engine.verifier.seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_failures_do_not_stop_later_blocks() {
        let doc = document(
            "```rust\nfn main() { FAIL }\n```\n\n```rust\nuse claude_sdk_rs::Client;\nlet c = Client::new();\n```",
        );
        let engine = engine(Path::new("."));
        let mut printer = ReportPrinter::new(Vec::new());
        let report = engine.check_document(&doc, &mut printer).await.unwrap();

        assert_eq!(report.block_count, 2);
        assert!(!report.outcomes[0].passed);
        assert!(report.outcomes[1].passed);
        assert!(report.outcomes[0].source_preview.contains("FAIL"));

        let seen = engine.verifier.seen.lock().unwrap();
        assert!(seen[1].contains("use tutorial_sdk::Client;"));

        let out = String::from_utf8(printer.into_inner()).unwrap();
        let fail_at = out.find("Block 1 failed").unwrap();
        let pass_at = out.find("Block 2 passed").unwrap();
        assert!(fail_at < pass_at);
    }

    #[tokio::test]
    async fn test_warm_up_runs_once_before_first_block() {
        let doc = document("```rust\nfn main() {}\n```\n```rust\nfn main() { let b = 2; }\n```");
        let engine = engine(Path::new(".")).with_warm_up(true);
        let mut printer = ReportPrinter::new(Vec::new());
        let report = engine.check_document(&doc, &mut printer).await.unwrap();

        assert!(report.all_passed);
        assert_eq!(engine.verifier.prepared.load(Ordering::SeqCst), 1);
        assert_eq!(engine.verifier.seen.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_no_warm_up_without_relevant_blocks() {
        let doc = document("```rust\nlet x = 1;\n```");
        let engine = engine(Path::new(".")).with_warm_up(true);
        let mut printer = ReportPrinter::new(Vec::new());
        engine.check_document(&doc, &mut printer).await.unwrap();

        assert_eq!(engine.verifier.prepared.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_warm_up_disabled() {
        let doc = document("```rust\nfn main() {}\n```");
        let engine = engine(Path::new("."));
        let mut printer = ReportPrinter::new(Vec::new());
        engine.check_document(&doc, &mut printer).await.unwrap();

        assert_eq!(engine.verifier.prepared.load(Ordering::SeqCst), 0);
    }
}
