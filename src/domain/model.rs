use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// A markdown document read from the tutorials directory.
#[derive(Debug, Clone)]
pub struct Document {
    pub path: PathBuf,
    pub name: String,
    pub text: String,
}

impl Document {
    pub fn new(path: PathBuf, text: String) -> Self {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Self { path, name, text }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeBlock {
    /// 0-based position among the document's extracted blocks.
    pub ordinal: usize,
    pub raw_text: String,
}

impl CodeBlock {
    /// 1-based number shown to users.
    pub fn display_number(&self) -> usize {
        self.ordinal + 1
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
pub enum CheckMode {
    /// Resolve product references against generated stub declarations.
    #[default]
    SyntaxOnly,
    /// Depend on the real product crate through a path dependency.
    FullCompile,
}

impl CheckMode {
    pub fn default_timeout(&self) -> Duration {
        match self {
            CheckMode::SyntaxOnly => Duration::from_secs(15),
            CheckMode::FullCompile => Duration::from_secs(30),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            CheckMode::SyntaxOnly => "syntax-only",
            CheckMode::FullCompile => "full-compile",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verdict {
    pub passed: bool,
    pub diagnostic: String,
}

impl Verdict {
    pub fn pass() -> Self {
        Self {
            passed: true,
            diagnostic: String::new(),
        }
    }

    pub fn fail(diagnostic: impl Into<String>) -> Self {
        Self {
            passed: false,
            diagnostic: diagnostic.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerificationOutcome {
    pub block_ordinal: usize,
    pub passed: bool,
    pub diagnostic: String,
    /// Numbered first lines of the block as the author wrote it; empty on success.
    pub source_preview: String,
    #[serde(with = "duration_millis")]
    pub duration: Duration,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentReport {
    pub document_name: String,
    pub block_count: usize,
    pub outcomes: Vec<VerificationOutcome>,
    pub all_passed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl DocumentReport {
    pub fn new(document_name: impl Into<String>, outcomes: Vec<VerificationOutcome>) -> Self {
        let all_passed = outcomes.iter().all(|o| o.passed);
        Self {
            document_name: document_name.into(),
            block_count: outcomes.len(),
            outcomes,
            all_passed,
            error: None,
        }
    }

    /// A document that could not be read counts as failed.
    pub fn unreadable(document_name: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            document_name: document_name.into(),
            block_count: 0,
            outcomes: Vec::new(),
            all_passed: false,
            error: Some(error.into()),
        }
    }

    pub fn failed_blocks(&self) -> usize {
        self.outcomes.iter().filter(|o| !o.passed).count()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub mode: CheckMode,
    pub started_at: DateTime<Utc>,
    pub documents: Vec<DocumentReport>,
}

impl RunReport {
    pub fn new(mode: CheckMode) -> Self {
        Self {
            mode,
            started_at: Utc::now(),
            documents: Vec::new(),
        }
    }

    pub fn passed(&self) -> bool {
        self.documents.iter().all(|d| d.all_passed)
    }

    pub fn total_blocks(&self) -> usize {
        self.documents.iter().map(|d| d.block_count).sum()
    }

    pub fn failed_blocks(&self) -> usize {
        self.documents.iter().map(|d| d.failed_blocks()).sum()
    }

    pub fn passed_documents(&self) -> usize {
        self.documents.iter().filter(|d| d.all_passed).count()
    }

    pub fn exit_code(&self) -> i32 {
        if self.passed() {
            0
        } else {
            1
        }
    }
}

mod duration_millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        Ok(Duration::from_millis(u64::deserialize(deserializer)?))
    }
}
