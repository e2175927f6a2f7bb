use serde::Serialize;

use crate::api::ApiIdentity;
use crate::callsite::TextRange;
use crate::fix::InlineFix;

/// Name under which findings are reported.
pub const CHECK_NAME: &str = "InlineMeInliner";

pub const CHECK_SUMMARY: &str = "Callers of this API should be inlined.";

/// Tag attached to every finding, for downstream filtering.
pub const FINDING_TAG: &str = "JavaInlineMe";

/// Applicability of an automated suggestion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Applicability {
    MachineApplicable,
    MaybeIncorrect,
}

impl Applicability {
    pub fn as_str(&self) -> &'static str {
        match self {
            Applicability::MachineApplicable => "machine-applicable",
            Applicability::MaybeIncorrect => "maybe-incorrect",
        }
    }
}

/// Single position in a source file (1-based row/column).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Position {
    pub row: usize,
    pub column: usize,
}

/// Location of a finding: byte range plus 1-based line/column endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Span {
    pub start_byte: usize,
    pub end_byte: usize,
    pub start: Position,
    pub end: Position,
}

impl Span {
    /// Resolve a byte range against `source`. Columns count characters.
    #[must_use]
    pub fn from_range(source: &str, range: TextRange) -> Self {
        Self {
            start_byte: range.start,
            end_byte: range.end,
            start: position_at(source, range.start),
            end: position_at(source, range.end),
        }
    }
}

fn position_at(source: &str, offset: usize) -> Position {
    let mut row = 1;
    let mut column = 1;
    for (i, c) in source.char_indices() {
        if i >= offset {
            break;
        }
        if c == '\n' {
            row += 1;
            column = 1;
        } else {
            column += 1;
        }
    }
    Position { row, column }
}

/// A call site that should be inlined, with the fix that does it.
#[derive(Debug, Clone, Serialize)]
#[must_use]
pub struct Finding {
    pub check: &'static str,
    pub tag: &'static str,
    pub severity: &'static str,
    pub file: Option<String>,
    pub span: Span,
    pub message: String,
    pub api: ApiIdentity,
    pub fix: InlineFix,
    pub applicability: Applicability,
}

impl Finding {
    /// `range` is the reported node: the call, or the statement it deletes.
    pub fn new(api: ApiIdentity, range: TextRange, fix: InlineFix, validated: bool) -> Self {
        Self {
            check: CHECK_NAME,
            tag: FINDING_TAG,
            severity: "warning",
            file: None,
            span: Span {
                start_byte: range.start,
                end_byte: range.end,
                start: Position { row: 0, column: 0 },
                end: Position { row: 0, column: 0 },
            },
            message: api.message(),
            api,
            fix,
            applicability: if validated {
                Applicability::MachineApplicable
            } else {
                Applicability::MaybeIncorrect
            },
        }
    }

    /// Attach the file and resolve line/column positions against its source.
    pub fn located(mut self, file: impl Into<String>, source: &str) -> Self {
        self.file = Some(file.into());
        self.span = Span::from_range(
            source,
            TextRange::new(self.span.start_byte, self.span.end_byte),
        );
        self
    }

    pub fn render_pretty(&self) -> String {
        let file = self.file.as_deref().unwrap_or("<input>");
        let replacement = if self.fix.edit.replacement.is_empty() {
            "delete statement".to_string()
        } else {
            format!("`{}`", self.fix.edit.replacement)
        };
        format!(
            "{file}:{}:{}: {}: {} [{}]\n  = fix ({}): {replacement}",
            self.span.start.row,
            self.span.start.column,
            self.severity,
            self.message,
            self.check,
            self.applicability.as_str(),
        )
    }

    pub fn render_github(&self) -> String {
        let file = self.file.as_deref().unwrap_or("<input>");
        format!(
            "::warning file={file},line={},col={},endLine={},endColumn={},title={}::{}",
            self.span.start.row,
            self.span.start.column,
            self.span.end.row,
            self.span.end.column,
            self.check,
            self.message.replace('\n', "%0A"),
        )
    }
}
