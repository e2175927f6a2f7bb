use thiserror::Error;

/// Result alias for errors emitted by the inliner internals.
pub type InlineResult<T> = Result<T, InlineMeError>;

/// Structured error type for inliner subsystems.
///
/// Only construction-time problems surface here. A call site the engine
/// declines to rewrite is a `Verdict::NoMatch`, never an error.
#[derive(Debug, Error)]
pub enum InlineMeError {
    #[error("malformed inlining metadata for {api}: {reason}")]
    MalformedMetadata { api: String, reason: String },

    #[error(
        "argument count mismatch for {api}: {actual} argument(s) for {declared} declared parameter(s), varargs={varargs}"
    )]
    ArityMismatch {
        api: String,
        declared: usize,
        actual: usize,
        varargs: bool,
    },

    #[error("invalid call-site manifest: {0}")]
    Manifest(String),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("{0}")]
    Other(String),
}

impl InlineMeError {
    pub fn malformed(api: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::MalformedMetadata {
            api: api.into(),
            reason: reason.into(),
        }
    }

    pub fn manifest(msg: impl Into<String>) -> Self {
        Self::Manifest(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn other(msg: impl Into<String>) -> Self {
        Self::Other(msg.into())
    }
}

/// Convenience macro mirroring `anyhow::bail!` but returning InlineMeError.
#[macro_export]
macro_rules! inline_bail {
    ($($arg:tt)*) => {
        return Err($crate::error::InlineMeError::other(format!($($arg)*)));
    };
}

/// Convenience macro mirroring `anyhow::ensure!`.
#[macro_export]
macro_rules! inline_ensure {
    ($cond:expr, $($arg:tt)*) => {
        if !($cond) {
            $crate::inline_bail!($($arg)*);
        }
    };
}
