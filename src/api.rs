use serde::Serialize;

use crate::callsite::TargetSymbol;
use crate::template::InliningTemplate;

/// Human-readable and filterable identity of a retiring API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApiIdentity {
    class_name: String,
    method_name: String,
    package_name: String,
    is_constructor: bool,
    is_deprecated: bool,
    extra_message: String,
}

impl ApiIdentity {
    pub fn new(target: &TargetSymbol, template: &InliningTemplate) -> Self {
        let extra_message = template
            .validation_disabled()
            .map(|reason| format!(" NOTE: this is an unvalidated inlining! Reasoning: {reason}"))
            .unwrap_or_default();
        Self {
            class_name: target.owner.clone(),
            method_name: target.name.clone(),
            package_name: target.package.clone(),
            is_constructor: target.constructor,
            is_deprecated: target.deprecated,
            extra_message,
        }
    }

    pub fn class_name(&self) -> &str {
        &self.class_name
    }

    pub fn method_name(&self) -> &str {
        &self.method_name
    }

    pub fn package_name(&self) -> &str {
        &self.package_name
    }

    pub fn is_constructor(&self) -> bool {
        self.is_constructor
    }

    pub fn is_deprecated(&self) -> bool {
        self.is_deprecated
    }

    pub fn extra_message(&self) -> &str {
        &self.extra_message
    }

    /// Returns `FullyQualifiedClassName#methodName`.
    pub fn method_id(&self) -> String {
        format!("{}#{}", self.class_name, self.method_name)
    }

    /// Short markdown name, e.g. `` `Outer.Inner.method()` ``.
    pub fn short_name(&self) -> String {
        let prefix = format!("{}.", self.package_name);
        let readable = if self.package_name.is_empty() {
            self.class_name.as_str()
        } else {
            self.class_name
                .strip_prefix(prefix.as_str())
                .unwrap_or(&self.class_name)
        };
        format!("`{}.{}()`", readable, self.method_name)
    }

    /// Last segment of the qualified class name.
    pub fn simple_class_name(&self) -> &str {
        self.class_name
            .rsplit('.')
            .next()
            .unwrap_or(&self.class_name)
    }

    pub fn message(&self) -> String {
        format!(
            "Migrate (via inlining) away from {}{}.{}",
            if self.is_deprecated { "deprecated " } else { "" },
            self.short_name(),
            self.extra_message
        )
    }

    /// True if no prefixes are configured or `method_id` starts with one of them.
    pub fn matches_prefixes<'a>(&self, prefixes: impl IntoIterator<Item = &'a String>) -> bool {
        let id = self.method_id();
        let mut prefixes = prefixes.into_iter().peekable();
        if prefixes.peek().is_none() {
            return true;
        }
        prefixes.any(|prefix| id.starts_with(prefix.as_str()))
    }
}
