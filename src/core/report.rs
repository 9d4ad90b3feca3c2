use crate::core::{CheckMode, DocumentReport, RunReport, VerificationOutcome};
use crate::utils::error::Result;
use std::io::Write;
use std::path::Path;

const RULE: &str = "==================================================";
pub const MAX_DIAGNOSTIC_CHARS: usize = 600;
pub const MAX_DIAGNOSTIC_LINES: usize = 12;
pub const MAX_PREVIEW_LINES: usize = 8;

/// Numbered first lines of a block, for failure output.
pub fn source_preview(raw_text: &str) -> String {
    let total = raw_text.lines().count();
    let mut preview: Vec<String> = raw_text
        .lines()
        .take(MAX_PREVIEW_LINES)
        .enumerate()
        .map(|(i, line)| format!("{:>3} | {}", i + 1, line))
        .collect();
    if total > MAX_PREVIEW_LINES {
        preview.push(format!("    | ... ({} more lines)", total - MAX_PREVIEW_LINES));
    }
    preview.join("\n")
}

pub fn truncate_diagnostic(diagnostic: &str) -> String {
    let lines: Vec<&str> = diagnostic.trim().lines().collect();
    let mut truncated = lines.len() > MAX_DIAGNOSTIC_LINES;

    let mut excerpt = lines
        .into_iter()
        .take(MAX_DIAGNOSTIC_LINES)
        .collect::<Vec<_>>()
        .join("\n");
    if excerpt.chars().count() > MAX_DIAGNOSTIC_CHARS {
        excerpt = excerpt.chars().take(MAX_DIAGNOSTIC_CHARS).collect();
        truncated = true;
    }
    if truncated {
        excerpt.push_str("\n...");
    }
    excerpt
}

fn indented(text: &str, prefix: &str) -> String {
    text.lines()
        .map(|line| format!("{}{}", prefix, line))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Streams human-readable progress lines as blocks are checked.
pub struct ReportPrinter<W: Write> {
    out: W,
}

impl<W: Write> ReportPrinter<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn line(&mut self, text: &str) -> Result<()> {
        writeln!(self.out, "{}", text)?;
        self.out.flush()?;
        Ok(())
    }

    pub fn banner(&mut self, mode: CheckMode, docs_dir: &Path) -> Result<()> {
        self.line(&format!("🧪 Checking tutorial code samples ({} mode)", mode.label()))?;
        self.line(&format!("📁 Docs: {}", docs_dir.display()))?;
        self.line(RULE)
    }

    pub fn document_started(&mut self, name: &str) -> Result<()> {
        self.line("")?;
        self.line(&format!("📄 {}", name))
    }

    pub fn document_unreadable(&mut self, error: &str) -> Result<()> {
        self.line(&format!("  ❌ Could not read document: {}", error))
    }

    pub fn block_finished(&mut self, outcome: &VerificationOutcome) -> Result<()> {
        let number = outcome.block_ordinal + 1;
        if outcome.passed {
            return self.line(&format!(
                "  ✅ Block {} passed ({} ms)",
                number,
                outcome.duration.as_millis()
            ));
        }

        self.line(&format!("  ❌ Block {} failed", number))?;
        self.line("     Error:")?;
        self.line(&indented(&truncate_diagnostic(&outcome.diagnostic), "       "))?;
        if !outcome.source_preview.is_empty() {
            self.line("     Code:")?;
            self.line(&indented(&outcome.source_preview, "       "))?;
        }
        Ok(())
    }

    pub fn document_finished(&mut self, report: &DocumentReport) -> Result<()> {
        if report.error.is_some() {
            return Ok(());
        }
        if report.block_count == 0 {
            return self.line("  ⏭️  No testable blocks");
        }
        if report.all_passed {
            self.line(&format!("  ✅ All {} blocks passed", report.block_count))
        } else {
            self.line(&format!(
                "  ❌ {}/{} blocks failed",
                report.failed_blocks(),
                report.block_count
            ))
        }
    }

    pub fn summary(&mut self, report: &RunReport) -> Result<()> {
        let total = report.total_blocks();
        self.line("")?;
        self.line(RULE)?;
        self.line(&format!(
            "📊 Summary: {}/{} documents passed, {}/{} blocks passed",
            report.passed_documents(),
            report.documents.len(),
            total - report.failed_blocks(),
            total
        ))?;
        if report.passed() {
            self.line("✅ All tutorial samples compile")
        } else {
            self.line("❌ Some tutorial samples failed to compile")
        }
    }
}

/// Writes the run report as pretty JSON.
pub fn write_json_report(report: &RunReport, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let json = serde_json::to_string_pretty(report)?;
    std::fs::write(path, json)?;
    tracing::info!("📝 JSON report written to {}", path.display());
    Ok(())
}
