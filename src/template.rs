//! Decoded inlining metadata for a retiring API.
//!
//! The annotation decoder lives outside this crate; it hands over the raw
//! attribute values as [`DecodedAnnotations`]. [`InliningTemplate`] is the
//! validated, immutable form the rewrite engine reads.

use serde::{Deserialize, Serialize};

use crate::error::{InlineMeError, InlineResult};

/// Simple name of the annotation marking an API for inlining.
pub const INLINE_ME: &str = "InlineMe";

/// Simple name of the annotation that opts a template out of validation.
pub const VALIDATION_DISABLED: &str = "InlineMeValidationDisabled";

/// Attribute values of an `@InlineMe` annotation, as decoded upstream.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InlineMeAttributes {
    pub replacement: String,
    #[serde(default)]
    pub imports: Vec<String>,
    #[serde(default, rename = "staticImports", alias = "static_imports")]
    pub static_imports: Vec<String>,
}

/// Raw annotations found directly on a target declaration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecodedAnnotations {
    #[serde(default, rename = "InlineMe", alias = "inline_me")]
    pub inline_me: Option<InlineMeAttributes>,

    /// `value` strings of `@InlineMeValidationDisabled`, if present.
    #[serde(
        default,
        rename = "InlineMeValidationDisabled",
        alias = "validation_disabled"
    )]
    pub validation_disabled: Option<Vec<String>>,
}

/// Immutable description of how calls to one retiring API are rewritten.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InliningTemplate {
    replacement: String,
    imports: Vec<String>,
    static_imports: Vec<String>,
    validation_disabled: Option<String>,
}

impl InliningTemplate {
    /// Build a template from already-validated parts.
    ///
    /// Fails with `MalformedMetadata` when the replacement is empty or the
    /// validation-disabled reason is blank.
    pub fn new(
        api: &str,
        replacement: impl Into<String>,
        imports: Vec<String>,
        static_imports: Vec<String>,
        validation_disabled: Option<String>,
    ) -> InlineResult<Self> {
        let replacement = replacement.into();
        if replacement.trim().is_empty() {
            return Err(InlineMeError::malformed(api, "replacement is empty"));
        }
        if let Some(reason) = &validation_disabled {
            if reason.trim().is_empty() {
                return Err(InlineMeError::malformed(
                    api,
                    format!("@{VALIDATION_DISABLED} carries a blank reason"),
                ));
            }
        }
        Ok(Self {
            replacement,
            imports,
            static_imports,
            validation_disabled,
        })
    }

    /// Decode the template for `api` from its raw annotations.
    ///
    /// Returns `Ok(None)` when the declaration is not annotated with
    /// `@InlineMe`. A validation-disabled annotation must carry exactly one
    /// reason string.
    pub fn from_annotations(
        api: &str,
        annotations: &DecodedAnnotations,
    ) -> InlineResult<Option<Self>> {
        let Some(attrs) = &annotations.inline_me else {
            return Ok(None);
        };

        let reason = match annotations.validation_disabled.as_deref() {
            None => None,
            Some([reason]) => Some(reason.clone()),
            Some(values) => {
                return Err(InlineMeError::malformed(
                    api,
                    format!(
                        "@{VALIDATION_DISABLED} must carry exactly one reason, found {}",
                        values.len()
                    ),
                ));
            }
        };

        Self::new(
            api,
            attrs.replacement.clone(),
            attrs.imports.clone(),
            attrs.static_imports.clone(),
            reason,
        )
        .map(Some)
    }

    pub fn replacement(&self) -> &str {
        &self.replacement
    }

    pub fn imports(&self) -> &[String] {
        &self.imports
    }

    pub fn static_imports(&self) -> &[String] {
        &self.static_imports
    }

    /// Justification given when the template was not mechanically verified.
    pub fn validation_disabled(&self) -> Option<&str> {
        self.validation_disabled.as_deref()
    }

    pub fn is_validated(&self) -> bool {
        self.validation_disabled.is_none()
    }
}
