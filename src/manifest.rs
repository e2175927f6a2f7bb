//! Call-site manifests recorded by an external front end.
//!
//! A front end that parses and resolves the target language records each
//! matched call as byte ranges into the source file, together with the
//! resolved target and its decoded annotations. This module turns those
//! records back into [`CallSite`] values through the single construction path.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::callsite::{CallKind, CallSite, ExprHandle, SelfKeyword, TargetSymbol, TextRange};
use crate::error::{InlineMeError, InlineResult};
use crate::oracle::{LexicalSideEffects, SideEffectOracle};
use crate::template::{DecodedAnnotations, InliningTemplate};

/// File suffix identifying manifests when walking directories.
pub const MANIFEST_SUFFIX: &str = ".inlineme.json";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordKind {
    Method,
    Constructor,
}

/// One matched call, as recorded by the front end.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CallSiteRecord {
    pub target: TargetSymbol,
    #[serde(default)]
    pub annotations: DecodedAnnotations,
    pub kind: RecordKind,
    /// Range of the whole call expression.
    pub call: TextRange,
    /// Receiver expression of a method call, if any.
    #[serde(default)]
    pub receiver: Option<TextRange>,
    /// Set for bare `this(...)` / `super(...)` calls.
    #[serde(default)]
    pub keyword: Option<SelfKeyword>,
    /// Class name expression of a constructor call.
    #[serde(default, rename = "class")]
    pub class_name: Option<TextRange>,
    #[serde(default)]
    pub arguments: Vec<TextRange>,
    /// Enclosing statement, when the call is the statement's whole expression.
    #[serde(default)]
    pub statement: Option<TextRange>,
    /// Side-effect answer from the front end's analysis, if it ran one.
    #[serde(default)]
    pub receiver_side_effects: Option<bool>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Manifest {
    /// Source file, relative to the manifest's directory.
    pub source: PathBuf,
    #[serde(default)]
    pub call_sites: Vec<CallSiteRecord>,
}

fn slice(source: &str, range: TextRange, what: &str) -> InlineResult<String> {
    range
        .slice(source)
        .map(str::to_string)
        .ok_or_else(|| InlineMeError::manifest(format!("{what} range {range:?} is not valid source")))
}

impl CallSiteRecord {
    pub fn to_call_site(&self, source: &str) -> InlineResult<CallSite> {
        let call = ExprHandle::new(self.call, slice(source, self.call, "call")?);

        let kind = match self.kind {
            RecordKind::Method => CallKind::Method {
                receiver: self
                    .receiver
                    .map(|range| {
                        slice(source, range, "receiver").map(|text| ExprHandle::new(range, text))
                    })
                    .transpose()?,
                keyword: self.keyword,
            },
            RecordKind::Constructor => {
                let range = self.class_name.ok_or_else(|| {
                    InlineMeError::manifest(format!(
                        "constructor call to {} has no class range",
                        self.target.method_id()
                    ))
                })?;
                CallKind::Constructor {
                    class_text: slice(source, range, "class")?,
                }
            }
        };

        let arguments = self
            .arguments
            .iter()
            .map(|&range| slice(source, range, "argument"))
            .collect::<InlineResult<Vec<_>>>()?;

        if let Some(statement) = self.statement {
            if !statement.contains_range(self.call) {
                return Err(InlineMeError::manifest(format!(
                    "statement {statement:?} does not contain call {:?}",
                    self.call
                )));
            }
        }

        CallSite::new(kind, self.target.clone(), arguments, call, self.statement)
    }

    pub fn template(&self) -> InlineResult<Option<InliningTemplate>> {
        InliningTemplate::from_annotations(&self.target.method_id(), &self.annotations)
    }
}

/// A call site with its decoded template.
#[derive(Debug, Clone)]
pub struct ManifestEntry {
    pub site: CallSite,
    pub template: Option<InliningTemplate>,
}

/// Manifest plus the source it points at, fully decoded.
#[derive(Debug, Clone)]
pub struct LoadedManifest {
    pub manifest_path: PathBuf,
    pub source_path: PathBuf,
    pub source: String,
    pub entries: Vec<ManifestEntry>,
    side_effects: RecordedSideEffects,
}

impl LoadedManifest {
    /// Decode `manifest` against `source`. Malformed metadata is fatal.
    pub fn from_parts(
        manifest_path: PathBuf,
        source_path: PathBuf,
        source: String,
        manifest: &Manifest,
    ) -> InlineResult<Self> {
        let mut entries = Vec::with_capacity(manifest.call_sites.len());
        let mut answers = HashMap::new();
        for record in &manifest.call_sites {
            let site = record.to_call_site(&source)?;
            if let (Some(range), Some(answer)) = (record.receiver, record.receiver_side_effects) {
                answers.insert(range, answer);
            }
            entries.push(ManifestEntry {
                site,
                template: record.template()?,
            });
        }
        Ok(Self {
            manifest_path,
            source_path,
            source,
            entries,
            side_effects: RecordedSideEffects { answers },
        })
    }

    pub fn side_effects(&self) -> &RecordedSideEffects {
        &self.side_effects
    }
}

/// Side-effect answers recorded in the manifest, lexical analysis otherwise.
#[derive(Debug, Clone, Default)]
pub struct RecordedSideEffects {
    answers: HashMap<TextRange, bool>,
}

impl SideEffectOracle for RecordedSideEffects {
    fn has_side_effect(&self, expr: &ExprHandle) -> bool {
        match self.answers.get(&expr.range) {
            Some(answer) => *answer,
            None => LexicalSideEffects.has_side_effect(expr),
        }
    }
}

pub fn is_manifest_path(path: &Path) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .is_some_and(|name| name.ends_with(MANIFEST_SUFFIX))
}

/// Read a manifest file and the source file it refers to.
pub fn load_manifest(path: &Path) -> Result<LoadedManifest> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read manifest: {}", path.display()))?;
    let manifest: Manifest = serde_json::from_str(&raw)
        .with_context(|| format!("failed to parse manifest: {}", path.display()))?;

    let base = path.parent().unwrap_or_else(|| Path::new("."));
    let source_path = base.join(&manifest.source);
    let source = std::fs::read_to_string(&source_path)
        .with_context(|| format!("failed to read source file: {}", source_path.display()))?;

    LoadedManifest::from_parts(path.to_path_buf(), source_path, source, &manifest)
        .with_context(|| format!("invalid manifest: {}", path.display()))
}

/// Expand files and directories into the manifest files they contain.
pub fn collect_manifests(paths: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut manifests = Vec::new();
    for path in paths {
        if path.is_dir() {
            for entry in walkdir::WalkDir::new(path).sort_by_file_name() {
                let entry = entry
                    .with_context(|| format!("failed to walk directory: {}", path.display()))?;
                if entry.file_type().is_file() && is_manifest_path(entry.path()) {
                    manifests.push(entry.into_path());
                }
            }
        } else {
            manifests.push(path.clone());
        }
    }
    Ok(manifests)
}
