//! Side-effect queries on receiver expressions.

use crate::callsite::ExprHandle;

/// Answers whether evaluating an expression may have observable effects.
///
/// Only consulted when a receiver pass-through would leave a bare receiver
/// as a statement. Implementations must err on the side of `true`.
pub trait SideEffectOracle {
    fn has_side_effect(&self, expr: &ExprHandle) -> bool;
}

impl<F> SideEffectOracle for F
where
    F: Fn(&ExprHandle) -> bool,
{
    fn has_side_effect(&self, expr: &ExprHandle) -> bool {
        self(expr)
    }
}

/// Conservative oracle working on the expression's spelling alone.
///
/// Names, dotted field chains, `this`/`super` and literals are pure.
/// Everything else (calls, `new`, assignments, increments, casts, array
/// access) is assumed to have a side effect.
#[derive(Debug, Clone, Copy, Default)]
pub struct LexicalSideEffects;

impl SideEffectOracle for LexicalSideEffects {
    fn has_side_effect(&self, expr: &ExprHandle) -> bool {
        let text = expr.text.trim();
        !(is_literal(text) || is_name_chain(text))
    }
}

fn is_identifier(segment: &str) -> bool {
    let mut chars = segment.chars();
    match chars.next() {
        Some(c) if c.is_alphabetic() || c == '_' || c == '$' => {}
        _ => return false,
    }
    chars.all(|c| c.is_alphanumeric() || c == '_' || c == '$')
}

fn is_name_chain(text: &str) -> bool {
    !text.is_empty() && text.split('.').map(str::trim).all(is_identifier) && text != "new"
}

fn is_literal(text: &str) -> bool {
    if matches!(text, "true" | "false" | "null") {
        return true;
    }
    if text.len() >= 2
        && ((text.starts_with('"') && text.ends_with('"'))
            || (text.starts_with('\'') && text.ends_with('\'')))
    {
        return true;
    }
    let digits = text.strip_prefix('-').unwrap_or(text);
    digits.starts_with(|c: char| c.is_ascii_digit())
        && digits
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '_')
}
