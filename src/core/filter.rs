use regex::Regex;
use std::sync::OnceLock;

pub(crate) fn async_entry_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"#\[tokio::main\b").expect("valid async entry regex"))
}

pub(crate) fn sync_entry_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\bfn\s+main\s*\(").expect("valid sync entry regex"))
}

/// Decides whether a block is a runnable unit worth checking.
#[derive(Debug, Clone)]
pub struct RelevanceFilter {
    product_import: Regex,
}

impl RelevanceFilter {
    /// `namespace` is the product crate as tutorials import it, e.g. `claude_sdk_rs`.
    pub fn new(namespace: &str) -> Self {
        let pattern = format!(r"\buse\s+{}\s*::", regex::escape(namespace));
        Self {
            product_import: Regex::new(&pattern).expect("escaped namespace forms a valid regex"),
        }
    }

    pub fn is_relevant(&self, raw_text: &str) -> bool {
        async_entry_regex().is_match(raw_text)
            || self.product_import.is_match(raw_text)
            || sync_entry_regex().is_match(raw_text)
    }
}
