//! Normalized view of one matched call expression.

use serde::{Deserialize, Serialize};

use crate::error::{InlineMeError, InlineResult};

/// Half-open byte range `[start, end)` in the source file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TextRange {
    pub start: usize,
    pub end: usize,
}

impl TextRange {
    pub const fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains_range(&self, other: TextRange) -> bool {
        self.start <= other.start && other.end <= self.end
    }

    /// Slice `source` by this range, `None` if out of bounds or off a char boundary.
    pub fn slice<'a>(&self, source: &'a str) -> Option<&'a str> {
        source.get(self.start..self.end)
    }
}

/// Handle to a real expression in the source: where it is and how it is spelled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExprHandle {
    pub range: TextRange,
    pub text: String,
}

impl ExprHandle {
    pub fn new(range: TextRange, text: impl Into<String>) -> Self {
        Self {
            range,
            text: text.into(),
        }
    }
}

/// Keyword used as the whole method select in `this(...)` / `super(...)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SelfKeyword {
    This,
    Super,
}

impl SelfKeyword {
    pub fn as_str(&self) -> &'static str {
        match self {
            SelfKeyword::This => "this",
            SelfKeyword::Super => "super",
        }
    }
}

/// How the call was spelled in source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallKind {
    /// `recv.m(args)`, `m(args)`, `this(args)` or `super(args)`.
    Method {
        receiver: Option<ExprHandle>,
        keyword: Option<SelfKeyword>,
    },
    /// `new T(args)`; `class_text` is the source of `T`.
    Constructor { class_text: String },
}

/// Resolved identity of the invoked method or constructor.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetSymbol {
    /// Fully qualified name of the declaring class.
    pub owner: String,
    /// Simple method name (`<init>` for constructors).
    pub name: String,
    /// Enclosing package of the declaration.
    pub package: String,
    /// Declared parameter names, in order.
    #[serde(default)]
    pub params: Vec<String>,
    #[serde(default)]
    pub varargs: bool,
    #[serde(default)]
    pub constructor: bool,
    /// Whether the declaration carries `@Deprecated`.
    #[serde(default)]
    pub deprecated: bool,
}

impl TargetSymbol {
    /// `FullyQualifiedClassName#methodName`.
    pub fn method_id(&self) -> String {
        format!("{}#{}", self.owner, self.name)
    }
}

/// One concrete invocation of an API, ready for the rewrite engine.
///
/// Built through [`CallSite::new`] for both call kinds, which enforces the
/// arity precondition the engine relies on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallSite {
    kind: CallKind,
    target: TargetSymbol,
    arguments: Vec<String>,
    call: ExprHandle,
    expression_statement: Option<TextRange>,
}

impl CallSite {
    /// `expression_statement` is the range of the enclosing statement when
    /// the call is that statement's entire expression.
    pub fn new(
        kind: CallKind,
        target: TargetSymbol,
        arguments: Vec<String>,
        call: ExprHandle,
        expression_statement: Option<TextRange>,
    ) -> InlineResult<Self> {
        let declared = target.params.len();
        let actual = arguments.len();
        let arity_ok = if target.varargs {
            actual + 1 >= declared
        } else {
            actual == declared
        };
        if !arity_ok {
            return Err(InlineMeError::ArityMismatch {
                api: target.method_id(),
                declared,
                actual,
                varargs: target.varargs,
            });
        }

        if let CallKind::Method {
            receiver: Some(receiver),
            ..
        } = &kind
        {
            crate::inline_ensure!(
                call.range.contains_range(receiver.range),
                "receiver range {:?} lies outside call range {:?}",
                receiver.range,
                call.range
            );
        }

        Ok(Self {
            kind,
            target,
            arguments,
            call,
            expression_statement,
        })
    }

    pub fn kind(&self) -> &CallKind {
        &self.kind
    }

    pub fn target(&self) -> &TargetSymbol {
        &self.target
    }

    pub fn is_constructor(&self) -> bool {
        matches!(self.kind, CallKind::Constructor { .. })
    }

    pub fn is_varargs_target(&self) -> bool {
        self.target.varargs
    }

    pub fn declared_param_names(&self) -> &[String] {
        &self.target.params
    }

    pub fn argument_texts(&self) -> &[String] {
        &self.arguments
    }

    /// True when a varargs target is called with nothing in the varargs slot.
    pub fn has_empty_varargs(&self) -> bool {
        self.target.varargs && self.arguments.len() + 1 == self.target.params.len()
    }

    /// Source spelling of the receiver, `None` for static and unqualified calls.
    pub fn receiver_text(&self) -> Option<String> {
        match &self.kind {
            CallKind::Method {
                keyword: Some(keyword),
                ..
            } => Some(keyword.as_str().to_string()),
            CallKind::Method { receiver, .. } => receiver
                .as_ref()
                .map(|r| r.text.clone())
                .filter(|text| !text.is_empty()),
            CallKind::Constructor { class_text } => Some(format!("new {class_text}")),
        }
    }

    /// The receiver expression, when one exists in source.
    pub fn receiver_expr(&self) -> Option<&ExprHandle> {
        match &self.kind {
            CallKind::Method { receiver, .. } => receiver.as_ref(),
            CallKind::Constructor { .. } => None,
        }
    }

    pub fn whole_call_range(&self) -> TextRange {
        self.call.range
    }

    /// Source text of the whole call expression.
    pub fn call_text(&self) -> &str {
        &self.call.text
    }

    pub fn enclosing_statement(&self) -> Option<TextRange> {
        self.expression_statement
    }

    pub fn is_expression_statement(&self) -> bool {
        self.expression_statement.is_some()
    }
}
