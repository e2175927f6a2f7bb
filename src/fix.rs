//! Fix representation and pure text-edit application.
//!
//! All functions work on strings and byte offsets - no file I/O.
//!
//! ## Safety Guarantees
//!
//! - Edits are validated against the source before application
//! - Edits are applied in reverse order to preserve byte offsets
//! - Overlapping edits are deferred, never merged

use serde::Serialize;
use thiserror::Error;

use crate::callsite::TextRange;

/// Error type for fix application operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FixError {
    #[error("Edit range [{start}..{end}) exceeds source length {source_len}")]
    InvalidRange {
        start: usize,
        end: usize,
        source_len: usize,
    },

    #[error("Edit start {start} is after edit end {end}")]
    InvalidEditOrder { start: usize, end: usize },

    #[error("Edit range [{start}..{end}) does not fall on character boundaries")]
    NotCharBoundary { start: usize, end: usize },
}

/// A single contiguous text replacement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TextEdit {
    /// Starting byte offset (inclusive).
    pub start_byte: usize,
    /// Ending byte offset (exclusive).
    pub end_byte: usize,
    /// Text to insert in place of the range [start_byte..end_byte).
    pub replacement: String,
}

impl TextEdit {
    pub fn new(start_byte: usize, end_byte: usize, replacement: impl Into<String>) -> Self {
        Self {
            start_byte,
            end_byte,
            replacement: replacement.into(),
        }
    }

    /// Create a deletion edit (removes text, inserts nothing).
    pub fn delete(range: TextRange) -> Self {
        Self::new(range.start, range.end, String::new())
    }

    /// Create an insertion edit (inserts text at a position).
    pub fn insert(byte_offset: usize, text: impl Into<String>) -> Self {
        Self::new(byte_offset, byte_offset, text)
    }

    pub fn replace(range: TextRange, replacement: impl Into<String>) -> Self {
        Self::new(range.start, range.end, replacement)
    }

    pub fn range(&self) -> TextRange {
        TextRange::new(self.start_byte, self.end_byte)
    }

    /// Returns true if this edit overlaps with another.
    ///
    /// Two insertions at the same offset overlap; an insertion touching the
    /// boundary of a replacement does not.
    pub fn overlaps_with(&self, other: &TextEdit) -> bool {
        if self.start_byte == self.end_byte && other.start_byte == other.end_byte {
            return self.start_byte == other.start_byte;
        }
        self.start_byte < other.end_byte && other.start_byte < self.end_byte
    }

    /// Validates that this edit has a valid range for `source`.
    pub fn validate(&self, source: &str) -> Result<(), FixError> {
        if self.start_byte > self.end_byte {
            return Err(FixError::InvalidEditOrder {
                start: self.start_byte,
                end: self.end_byte,
            });
        }

        if self.end_byte > source.len() {
            return Err(FixError::InvalidRange {
                start: self.start_byte,
                end: self.end_byte,
                source_len: source.len(),
            });
        }

        if !source.is_char_boundary(self.start_byte) || !source.is_char_boundary(self.end_byte) {
            return Err(FixError::NotCharBoundary {
                start: self.start_byte,
                end: self.end_byte,
            });
        }

        Ok(())
    }
}

/// One atomic rewrite of a call site: the edit plus the imports it needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InlineFix {
    pub edit: TextEdit,
    pub imports_to_add: Vec<String>,
    pub static_imports_to_add: Vec<String>,
}

impl InlineFix {
    pub fn builder() -> FixBuilder {
        FixBuilder::default()
    }

    /// True if applying this fix introduces any import or static import.
    pub fn adds_imports(&self) -> bool {
        !self.imports_to_add.is_empty() || !self.static_imports_to_add.is_empty()
    }

    pub fn is_deletion(&self) -> bool {
        self.edit.replacement.is_empty() && self.edit.start_byte < self.edit.end_byte
    }
}

/// Accumulates import requirements while a fix is being synthesized.
#[derive(Debug, Clone, Default)]
pub struct FixBuilder {
    imports: Vec<String>,
    static_imports: Vec<String>,
}

impl FixBuilder {
    pub fn add_import(&mut self, qualified_name: impl Into<String>) -> &mut Self {
        push_unique(&mut self.imports, qualified_name.into());
        self
    }

    pub fn add_static_import(&mut self, qualified_member: impl Into<String>) -> &mut Self {
        push_unique(&mut self.static_imports, qualified_member.into());
        self
    }

    pub fn imports(&self) -> &[String] {
        &self.imports
    }

    pub fn static_imports(&self) -> &[String] {
        &self.static_imports
    }

    pub fn replace(self, range: TextRange, replacement: impl Into<String>) -> InlineFix {
        InlineFix {
            edit: TextEdit::replace(range, replacement),
            imports_to_add: self.imports,
            static_imports_to_add: self.static_imports,
        }
    }

    pub fn delete(self, range: TextRange) -> InlineFix {
        InlineFix {
            edit: TextEdit::delete(range),
            imports_to_add: self.imports,
            static_imports_to_add: self.static_imports,
        }
    }
}

fn push_unique(list: &mut Vec<String>, item: String) {
    if !list.contains(&item) {
        list.push(item);
    }
}

/// Outcome of applying a batch of edits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppliedEdits {
    pub source: String,
    pub applied: usize,
    /// Edits that overlapped an earlier accepted edit and were left for a later pass.
    pub deferred: Vec<TextEdit>,
}

/// Apply edits to source code, deferring any that overlap an earlier one.
///
/// Edits are accepted in input order; accepted edits are then applied from
/// the end of the file to the start so earlier byte offsets stay valid.
///
/// # Example
///
/// ```rust
/// use inline_me::fix::{TextEdit, apply_edits};
///
/// let source = "a.old(1); b.old(2);";
/// let edits = vec![
///     TextEdit::new(1, 8, ".fresh(1)"),
///     TextEdit::new(11, 18, ".fresh(2)"),
/// ];
///
/// let result = apply_edits(source, &edits).unwrap();
/// assert_eq!(result.source, "a.fresh(1); b.fresh(2);");
/// ```
pub fn apply_edits(source: &str, edits: &[TextEdit]) -> Result<AppliedEdits, FixError> {
    for edit in edits {
        edit.validate(source)?;
    }

    let mut accepted: Vec<&TextEdit> = Vec::with_capacity(edits.len());
    let mut deferred = Vec::new();
    for edit in edits {
        if accepted.iter().any(|prior| prior.overlaps_with(edit)) {
            deferred.push(edit.clone());
        } else {
            accepted.push(edit);
        }
    }

    // An insertion sharing its offset with a replacement's start goes last.
    accepted.sort_by(|a, b| {
        b.start_byte
            .cmp(&a.start_byte)
            .then(b.end_byte.cmp(&a.end_byte))
    });

    let mut result = source.to_string();
    for edit in &accepted {
        result.replace_range(edit.start_byte..edit.end_byte, &edit.replacement);
    }

    Ok(AppliedEdits {
        source: result,
        applied: accepted.len(),
        deferred,
    })
}

/// Apply a single edit to source code (convenience wrapper).
pub fn apply_edit(source: &str, edit: &TextEdit) -> Result<String, FixError> {
    apply_edits(source, std::slice::from_ref(edit)).map(|applied| applied.source)
}
