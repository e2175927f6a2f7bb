//! The call-site rewrite engine.
//!
//! [`Inliner::inline`] binds a [`CallSite`] to its [`InliningTemplate`] and
//! produces a [`Verdict`]: either nothing, or one atomic replacement plus the
//! imports it needs. The engine holds no mutable state; a verdict is a pure
//! function of the call site, the template, the settings and the answers of
//! the collaborators in [`InlineEnv`].

use itertools::Itertools;

use crate::api::ApiIdentity;
use crate::callsite::CallSite;
use crate::comments::contains_comments;
use crate::config::InlinerSettings;
use crate::diagnostics::Finding;
use crate::error::InlineResult;
use crate::fix::InlineFix;
use crate::imports::{ImportTable, simple_name};
use crate::oracle::SideEffectOracle;
use crate::substitute::{Substitutions, strip_this_qualifier};

pub use crate::substitute::ParameterBinding;
use crate::template::InliningTemplate;
use crate::telemetry_debug;
use crate::verify::FixVerifier;

/// Why a call site was left alone. Never reported to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoMatchReason {
    /// The target carries no inlining template.
    NotAnnotated,
    /// The API id matches none of the configured prefixes.
    PrefixFiltered,
    /// The call's source text holds a comment.
    ContainsComments,
    /// The speculative compile of the fixed source failed or timed out.
    FixDoesNotCompile,
    /// Verification is enabled but no verifier was supplied.
    VerifierUnavailable,
    /// A substitution pattern could not be built.
    SubstitutionFailed,
}

impl NoMatchReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            NoMatchReason::NotAnnotated => "not-annotated",
            NoMatchReason::PrefixFiltered => "prefix-filtered",
            NoMatchReason::ContainsComments => "contains-comments",
            NoMatchReason::FixDoesNotCompile => "fix-does-not-compile",
            NoMatchReason::VerifierUnavailable => "verifier-unavailable",
            NoMatchReason::SubstitutionFailed => "substitution-failed",
        }
    }
}

/// Outcome of the engine for one call site.
#[derive(Debug, Clone)]
pub enum Verdict {
    NoMatch(NoMatchReason),
    Rewrite(Finding),
}

impl Verdict {
    pub fn finding(&self) -> Option<&Finding> {
        match self {
            Verdict::Rewrite(finding) => Some(finding),
            Verdict::NoMatch(_) => None,
        }
    }

    pub fn into_finding(self) -> Option<Finding> {
        match self {
            Verdict::Rewrite(finding) => Some(finding),
            Verdict::NoMatch(_) => None,
        }
    }

    pub fn no_match_reason(&self) -> Option<NoMatchReason> {
        match self {
            Verdict::NoMatch(reason) => Some(*reason),
            Verdict::Rewrite(_) => None,
        }
    }
}

/// Per-file collaborators the engine consults.
#[derive(Clone, Copy)]
pub struct InlineEnv<'a> {
    pub imports: &'a dyn ImportTable,
    pub side_effects: &'a dyn SideEffectOracle,
    pub verifier: Option<&'a dyn FixVerifier>,
}

impl<'a> InlineEnv<'a> {
    pub fn new(imports: &'a dyn ImportTable, side_effects: &'a dyn SideEffectOracle) -> Self {
        Self {
            imports,
            side_effects,
            verifier: None,
        }
    }

    #[must_use]
    pub fn with_verifier(mut self, verifier: &'a dyn FixVerifier) -> Self {
        self.verifier = Some(verifier);
        self
    }
}

/// Bind argument texts to declared parameter names.
///
/// A varargs parameter takes every trailing argument joined by `", "`, or the
/// empty string when the call leaves the varargs slot empty.
pub fn bind_arguments(site: &CallSite) -> Vec<ParameterBinding> {
    let names = site.declared_param_names();
    let args = site.argument_texts();

    let positional = |count: usize| {
        names
            .iter()
            .zip(args)
            .take(count)
            .map(|(name, value)| ParameterBinding {
                name: name.clone(),
                value: value.clone(),
                empty_varargs: false,
            })
            .collect::<Vec<_>>()
    };

    let Some((varargs_name, _)) = names.split_last().filter(|_| site.is_varargs_target()) else {
        return positional(names.len());
    };

    let fixed = names.len() - 1;
    let mut bindings = positional(fixed);
    bindings.push(if site.has_empty_varargs() {
        ParameterBinding {
            name: varargs_name.clone(),
            value: String::new(),
            empty_varargs: true,
        }
    } else {
        ParameterBinding {
            name: varargs_name.clone(),
            value: args[fixed..].iter().join(", "),
            empty_varargs: false,
        }
    });
    bindings
}

/// Rewrites calls to APIs annotated for inlining.
#[derive(Debug, Clone, Default)]
pub struct Inliner {
    settings: InlinerSettings,
}

impl Inliner {
    pub fn new(settings: InlinerSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &InlinerSettings {
        &self.settings
    }

    /// Decide what to do with one call site.
    ///
    /// `template` is what the annotation decoder found on the call's target;
    /// `None` means the target is not annotated.
    pub fn inline(
        &self,
        site: &CallSite,
        template: Option<&InliningTemplate>,
        env: &InlineEnv<'_>,
    ) -> Verdict {
        let Some(template) = template else {
            return Verdict::NoMatch(NoMatchReason::NotAnnotated);
        };

        let api = ApiIdentity::new(site.target(), template);
        if !api.matches_prefixes(&self.settings.api_prefixes) {
            telemetry_debug!(api = %api.method_id(), "skipping call site outside configured prefixes");
            return Verdict::NoMatch(NoMatchReason::PrefixFiltered);
        }

        if self.settings.skip_callsites_with_comments && contains_comments(site.call_text()) {
            telemetry_debug!(api = %api.method_id(), "skipping call site with comments");
            return Verdict::NoMatch(NoMatchReason::ContainsComments);
        }

        match self.rewrite(site, template, api, env) {
            Ok(verdict) => verdict,
            Err(err) => {
                telemetry_debug!(error = %err, "substitution failed");
                Verdict::NoMatch(NoMatchReason::SubstitutionFailed)
            }
        }
    }

    fn rewrite(
        &self,
        site: &CallSite,
        template: &InliningTemplate,
        api: ApiIdentity,
        env: &InlineEnv<'_>,
    ) -> InlineResult<Verdict> {
        let mut builder = InlineFix::builder();

        let mut type_names = Vec::with_capacity(template.imports().len());
        for import in template.imports() {
            let spelling = env.imports.qualify(import, &mut builder);
            type_names.push((simple_name(import).to_string(), spelling));
        }
        for member in template.static_imports() {
            builder.add_static_import(member.clone());
        }

        let bindings = bind_arguments(site);

        let mut replacement = template.replacement().to_string();
        let mut range = site.whole_call_range();

        // Leave the receiver's own text untouched so that a receiver which is
        // itself a rewritten call in a fluent chain does not overlap this edit.
        if let Some(receiver) = site.receiver_expr() {
            if replacement.starts_with("this.") {
                range.start = receiver.range.end;
                replacement.replace_range(.."this".len(), "");
            }
        }

        let receiver_text = site.receiver_text();
        match receiver_text.as_deref() {
            None => replacement = strip_this_qualifier(&replacement),
            Some(_) if replacement == "this" => {
                if let Some(verdict) = self.delete_statement(site, template, &api, env) {
                    return Ok(verdict);
                }
            }
            Some(_) => {}
        }

        // Receiver, then types, then parameters, all in one pass so that
        // inserted text is never matched again.
        let replacement = Substitutions {
            receiver: receiver_text.as_deref(),
            types: &type_names,
            parameters: &bindings,
        }
        .apply(&replacement)?;

        let fix = builder.replace(range, replacement);

        if self.settings.check_fix_compiles && !fix.adds_imports() {
            let Some(verifier) = env.verifier else {
                return Ok(Verdict::NoMatch(NoMatchReason::VerifierUnavailable));
            };
            if !verifier.compiles_with(&fix) {
                telemetry_debug!(api = %api.method_id(), "inlined fix does not compile");
                return Ok(Verdict::NoMatch(NoMatchReason::FixDoesNotCompile));
            }
        }

        Ok(Verdict::Rewrite(Finding::new(
            api,
            site.whole_call_range(),
            fix,
            template.is_validated(),
        )))
    }

    /// `foo.noop();` with a pure `foo` cannot become `foo;`, so drop the statement.
    fn delete_statement(
        &self,
        site: &CallSite,
        template: &InliningTemplate,
        api: &ApiIdentity,
        env: &InlineEnv<'_>,
    ) -> Option<Verdict> {
        let statement = site.enclosing_statement()?;
        let receiver = site.receiver_expr()?;
        if env.side_effects.has_side_effect(receiver) {
            return None;
        }
        let fix = InlineFix::builder().delete(statement);
        Some(Verdict::Rewrite(Finding::new(
            api.clone(),
            statement,
            fix,
            template.is_validated(),
        )))
    }
}
