use std::fmt;

use crate::base::{LineCol, LineIndex, TextRange};

use super::codes::{ErrorCode, ErrorFamily};
use super::context::ParseContext;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Severity {
    #[default]
    Error,
    Warning,
}

/// A secondary location, such as the `{` an unclosed brace was opened at
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelatedInfo {
    pub message: String,
    pub range: TextRange,
}

impl RelatedInfo {
    pub fn new(message: impl Into<String>, range: TextRange) -> Self {
        Self {
            message: message.into(),
            range,
        }
    }
}

/// A diagnostic for one ERROR node or MISSING token of a finished tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntaxError {
    pub message: String,
    /// The ERROR node's range, or the empty range of a MISSING token
    pub range: TextRange,
    pub code: ErrorCode,
    pub severity: Severity,
    pub context: ParseContext,
    pub hint: Option<String>,
    pub related: Vec<RelatedInfo>,
}

impl SyntaxError {
    pub fn new(
        code: ErrorCode,
        range: TextRange,
        context: ParseContext,
        message: impl Into<String>,
    ) -> Self {
        Self {
            message: message.into(),
            range,
            code,
            severity: Severity::Error,
            context,
            hint: None,
            related: Vec::new(),
        }
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }

    pub fn with_related(mut self, info: RelatedInfo) -> Self {
        self.related.push(info);
        self
    }

    pub fn has_related(&self) -> bool {
        !self.related.is_empty()
    }

    /// Lexical errors are about the text, everything else about structure.
    pub fn is_lexical(&self) -> bool {
        self.code.family() == ErrorFamily::Lexical
    }

    pub fn start(&self, index: &LineIndex) -> LineCol {
        index.line_col(self.range.start())
    }

    /// `line:col: E0202: message`, 1-based, with hint and notes on
    /// following lines.
    pub fn render(&self, index: &LineIndex) -> String {
        let at = self.start(index);
        let mut out = format!("{}:{}: {self}", at.line + 1, at.col + 1);
        if let Some(hint) = &self.hint {
            out.push_str("\n  hint: ");
            out.push_str(hint);
        }
        for related in &self.related {
            let at = index.line_col(related.range.start());
            let (line, col) = (at.line + 1, at.col + 1);
            out.push_str(&format!("\n  note: {} at {line}:{col}", related.message));
        }
        out
    }
}

impl fmt::Display for SyntaxError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}
