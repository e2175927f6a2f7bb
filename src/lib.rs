//! Call-site rewrite engine for APIs annotated with `@InlineMe`.
//!
//! The crate consumes call sites resolved by an external front end (see
//! [`manifest`]) and produces findings whose fixes replace each call with the
//! API's replacement template, bound to the call's receiver and arguments.

#![allow(clippy::new_without_default)] // Engines require explicit construction

pub mod api;
pub mod callsite;
pub mod cli;
pub mod comments;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod fix;
pub mod fixer;
pub mod imports;
pub mod inliner;
pub mod manifest;
pub mod oracle;
pub mod substitute;
pub mod telemetry;
pub mod template;
pub mod verify;

use std::time::Duration;

pub use crate::callsite::{CallKind, CallSite, ExprHandle, SelfKeyword, TargetSymbol, TextRange};
pub use crate::config::InlinerSettings;
pub use crate::diagnostics::Finding;
pub use crate::error::{InlineMeError, InlineResult};
pub use crate::fix::{InlineFix, TextEdit};
pub use crate::inliner::{InlineEnv, Inliner, NoMatchReason, Verdict};
pub use crate::template::InliningTemplate;

use crate::imports::SourceImports;
use crate::manifest::LoadedManifest;
use crate::verify::{CommandVerifier, DEFAULT_TIMEOUT};

/// Runs the [`Inliner`] over whole files, wiring up the per-file collaborators.
pub struct InlineEngine {
    inliner: Inliner,
    verify_command: Vec<String>,
    verify_timeout: Duration,
}

impl InlineEngine {
    /// Create an engine without a verification command.
    pub fn new(settings: InlinerSettings) -> Self {
        Self {
            inliner: Inliner::new(settings),
            verify_command: Vec::new(),
            verify_timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Compile command used when `check_fix_compiles` is on.
    #[must_use]
    pub fn with_verify_command(mut self, command: Vec<String>, timeout: Duration) -> Self {
        self.verify_command = command;
        self.verify_timeout = timeout;
        self
    }

    pub fn inliner(&self) -> &Inliner {
        &self.inliner
    }

    /// Inline every recorded call site of one file, in manifest order.
    pub fn inline_manifest(&self, loaded: &LoadedManifest) -> Vec<Finding> {
        let file = loaded.source_path.display().to_string();
        instrument_block!("inline_manifest", {
            let imports = SourceImports::parse(&loaded.source);
            let verifier = (!self.verify_command.is_empty()).then(|| {
                CommandVerifier::new(
                    &loaded.source_path,
                    &loaded.source,
                    self.verify_command.clone(),
                )
                .with_timeout(self.verify_timeout)
            });

            let mut env = InlineEnv::new(&imports, loaded.side_effects());
            if let Some(verifier) = &verifier {
                env = env.with_verifier(verifier);
            }

            let mut findings = Vec::new();
            for entry in &loaded.entries {
                match self.inliner.inline(&entry.site, entry.template.as_ref(), &env) {
                    Verdict::Rewrite(finding) => {
                        findings.push(finding.located(file.clone(), &loaded.source));
                    }
                    Verdict::NoMatch(reason) => {
                        telemetry_debug!(
                            api = %entry.site.target().method_id(),
                            reason = reason.as_str(),
                            "call site left alone"
                        );
                    }
                }
            }
            telemetry_info!(file = %file, findings = findings.len(), "inlined manifest");
            findings
        })
    }
}
