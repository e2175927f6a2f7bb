//! Whole-word, literal-safe text substitution over replacement templates.
//!
//! Every search key goes through [`regex::escape`] and every replacement is
//! copied in verbatim, so neither side is ever read as a pattern. `$1` in an
//! argument stays `$1`.

use std::sync::LazyLock;

use regex::Regex;

use crate::error::{InlineMeError, InlineResult};

static THIS_QUALIFIER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\bthis\.\b").expect("static pattern"));

fn compile(pattern: &str) -> InlineResult<Regex> {
    Regex::new(pattern)
        .map_err(|err| InlineMeError::other(format!("bad substitution pattern {pattern:?}: {err}")))
}

/// Remove every `this.` qualifier, leaving the bare member names.
pub fn strip_this_qualifier(template: &str) -> String {
    THIS_QUALIFIER.replace_all(template, "").into_owned()
}

/// Text bound to one declared parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParameterBinding {
    pub name: String,
    pub value: String,
    /// Set on the terminal varargs parameter when the call passes no varargs.
    pub empty_varargs: bool,
}

/// Tokens a template may spell, with what each one becomes.
///
/// Lookups follow a fixed precedence: `this` first, then imported type
/// names, then parameter names.
#[derive(Debug, Clone, Copy, Default)]
pub struct Substitutions<'a> {
    /// Receiver text standing in for whole-word `this`; `None` leaves `this` alone.
    pub receiver: Option<&'a str>,
    /// `(simple name, spelling)` of each imported type.
    pub types: &'a [(String, String)],
    pub parameters: &'a [ParameterBinding],
}

enum Token<'a> {
    Literal(&'a str),
    Parameter(&'a ParameterBinding),
}

impl<'a> Substitutions<'a> {
    fn lookup(&self, word: &str) -> Option<Token<'a>> {
        if word == "this" {
            if let Some(receiver) = self.receiver {
                return Some(Token::Literal(receiver));
            }
        }
        if let Some((_, spelling)) = self.types.iter().find(|(simple, _)| simple == word) {
            return Some(Token::Literal(spelling.as_str()));
        }
        self.parameters
            .iter()
            .find(|binding| binding.name == word)
            .map(Token::Parameter)
    }

    fn words(&self) -> Vec<String> {
        let mut words: Vec<&str> = Vec::new();
        if self.receiver.is_some() {
            words.push("this");
        }
        words.extend(self.types.iter().map(|(simple, _)| simple.as_str()));
        words.extend(self.parameters.iter().map(|binding| binding.name.as_str()));
        words.retain(|word| !word.is_empty());
        words.sort_unstable();
        words.dedup();
        words.into_iter().map(regex::escape).collect()
    }

    /// Rewrite `template` in one left-to-right pass over its own text.
    ///
    /// Inserted text is never scanned again, so a receiver, a qualified type
    /// or an argument that happens to spell another token stays as written.
    /// A parameter directly followed by `(` is a call to a method sharing its
    /// name and is left alone. For an empty varargs binding, one `,\s*` right
    /// before the name goes too; this is how an empty varargs slot disappears
    /// from `g(a, rest)`.
    pub fn apply(&self, template: &str) -> InlineResult<String> {
        let words = self.words();
        if words.is_empty() {
            return Ok(template.to_string());
        }
        let re = compile(&format!(
            r"(?P<comma>,\s*)?\b(?P<name>{})\b",
            words.join("|")
        ))?;

        let mut out = String::with_capacity(template.len());
        let mut last = 0;
        for caps in re.captures_iter(template) {
            let (Some(whole), Some(name)) = (caps.get(0), caps.name("name")) else {
                continue;
            };
            out.push_str(&template[last..whole.start()]);
            let comma = caps.name("comma").map_or("", |comma| comma.as_str());
            let called = template[whole.end()..].starts_with('(');
            match self.lookup(name.as_str()) {
                Some(Token::Literal(text)) => {
                    out.push_str(comma);
                    out.push_str(text);
                }
                Some(Token::Parameter(binding)) if !called => {
                    if !binding.empty_varargs {
                        out.push_str(comma);
                    }
                    out.push_str(&binding.value);
                }
                _ => out.push_str(whole.as_str()),
            }
            last = whole.end();
        }
        out.push_str(&template[last..]);
        Ok(out)
    }
}

/// Substitute every parameter name with its bound argument text in one pass.
pub fn replace_parameters(template: &str, bindings: &[ParameterBinding]) -> InlineResult<String> {
    Substitutions {
        parameters: bindings,
        ..Default::default()
    }
    .apply(template)
}
