use crate::core::CodeBlock;

pub const DEFAULT_LANGUAGE: &str = "rust";
const FENCE: &str = "```";

/// Lazily yields the fenced blocks tagged with `language`, in document order.
///
/// A block opens on a line that is exactly ```` ```rust ```` (surrounding
/// whitespace ignored) and closes on the next line that is exactly ```` ``` ````.
/// An opener with no closer before the end of the text is dropped; its line
/// number is kept in [`Blocks::dangling_opener`] once the iterator is drained.
///
/// The iterator is `Clone`, so a sequence can be replayed from any point.
#[derive(Debug, Clone)]
pub struct Blocks<'a> {
    lines: std::iter::Enumerate<std::str::Lines<'a>>,
    opener: String,
    next_ordinal: usize,
    dangling_opener: Option<usize>,
}

pub fn extract_blocks(text: &str) -> Blocks<'_> {
    extract_blocks_tagged(text, DEFAULT_LANGUAGE)
}

pub fn extract_blocks_tagged<'a>(text: &'a str, language: &str) -> Blocks<'a> {
    Blocks {
        lines: text.lines().enumerate(),
        opener: format!("{}{}", FENCE, language),
        next_ordinal: 0,
        dangling_opener: None,
    }
}

impl Blocks<'_> {
    /// 1-based line of an unterminated opener, if one was hit.
    pub fn dangling_opener(&self) -> Option<usize> {
        self.dangling_opener
    }
}

impl Iterator for Blocks<'_> {
    type Item = CodeBlock;

    fn next(&mut self) -> Option<CodeBlock> {
        let opened_at = loop {
            let (index, line) = self.lines.next()?;
            if line.trim() == self.opener {
                break index;
            }
        };

        let mut body: Vec<&str> = Vec::new();
        for (_, line) in self.lines.by_ref() {
            if line.trim() == FENCE {
                let block = CodeBlock {
                    ordinal: self.next_ordinal,
                    raw_text: body.join("\n"),
                };
                self.next_ordinal += 1;
                return Some(block);
            }
            body.push(line);
        }

        tracing::debug!("Unterminated code fence opened at line {}", opened_at + 1);
        self.dangling_opener = Some(opened_at + 1);
        None
    }
}
