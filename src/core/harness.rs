use crate::core::filter::{async_entry_regex, sync_entry_regex};
use regex::{NoExpand, Regex};
use std::sync::OnceLock;

pub const SUCCESS_MARKER: &str = "Tutorial example compiled successfully";

const ENTRY_SIGNATURE: &str =
    "#[tokio::main]\nasync fn main() -> Result<(), Box<dyn std::error::Error>> {\n";

fn definition_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"(?m)^\s*(?:pub(?:\([^)]*\))?\s+)?(?:(?:async|const|unsafe)\s+)*(?:fn|struct|enum|impl|trait|type|mod)\b|\bmacro_rules!",
        )
        .expect("valid definition regex")
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HarnessKind {
    /// Already has an entry point; passed through.
    CompleteProgram,
    /// Statements and expressions only; wrapped in an entry point.
    Snippet,
    /// Defines items without an entry point; one is appended.
    Definitions,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Harness {
    pub kind: HarnessKind,
    pub source: String,
}

/// Entry markers are checked first: a complete program also contains `fn`.
pub fn classify(text: &str) -> HarnessKind {
    if async_entry_regex().is_match(text) || sync_entry_regex().is_match(text) {
        HarnessKind::CompleteProgram
    } else if definition_regex().is_match(text) {
        HarnessKind::Definitions
    } else {
        HarnessKind::Snippet
    }
}

/// Turns raw tutorial blocks into compilable `main.rs` sources.
#[derive(Debug, Clone)]
pub struct HarnessSynthesizer {
    published: Regex,
    local_namespace: String,
}

impl HarnessSynthesizer {
    pub fn new(published_namespace: &str, local_namespace: &str) -> Self {
        let pattern = format!(r"\b{}\b", regex::escape(published_namespace));
        Self {
            published: Regex::new(&pattern).expect("escaped namespace forms a valid regex"),
            local_namespace: local_namespace.to_string(),
        }
    }

    pub fn rewrite_namespace(&self, raw_text: &str) -> String {
        self.published
            .replace_all(raw_text, NoExpand(&self.local_namespace))
            .into_owned()
    }

    pub fn synthesize(&self, raw_text: &str) -> Harness {
        let normalized = self.rewrite_namespace(raw_text);
        let kind = classify(&normalized);

        let source = match kind {
            HarnessKind::CompleteProgram => normalized,
            HarnessKind::Snippet => format!(
                "{}{}\n    println!(\"{}\");\n    Ok(())\n}}\n",
                ENTRY_SIGNATURE, normalized, SUCCESS_MARKER
            ),
            HarnessKind::Definitions => {
                format!("{}\n\n{}    Ok(())\n}}\n", normalized, ENTRY_SIGNATURE)
            }
        };

        tracing::debug!("Synthesized {:?} harness ({} bytes)", kind, source.len());
        Harness { kind, source }
    }
}
