//! Import table of a target file.
//!
//! The rewrite engine asks the table how a type should be spelled at the
//! call site; the table decides between the simple name (importing it when
//! needed) and the fully qualified name (when the simple name is taken).

use std::sync::LazyLock;

use regex::Regex;

use crate::fix::{FixBuilder, TextEdit};

static TYPE_DECLARATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)(?:^|[^.\w$])(?:class|interface|enum|record)\s+([A-Za-z_$][\w$]*)")
        .expect("static pattern")
});

/// Import-aware spelling of types in one target file.
pub trait ImportTable {
    /// Spell `qualified_name` for use in the target file, recording any
    /// import that spelling requires on `fix`.
    fn qualify(&self, qualified_name: &str, fix: &mut FixBuilder) -> String;
}

/// Last dot-separated segment of a qualified name.
pub fn simple_name(qualified_name: &str) -> &str {
    qualified_name
        .rsplit('.')
        .next()
        .unwrap_or(qualified_name)
}

fn package_part(qualified_name: &str) -> &str {
    qualified_name
        .rsplit_once('.')
        .map(|(package, _)| package)
        .unwrap_or("")
}

/// Import table scanned from a Java-like source file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceImports {
    package: Option<String>,
    imports: Vec<String>,
    static_imports: Vec<String>,
    /// Simple names of types declared in the file itself.
    declared_types: Vec<String>,
    package_end: Option<usize>,
    imports_end: Option<usize>,
}

impl SourceImports {
    pub fn parse(source: &str) -> Self {
        let mut table = SourceImports::default();
        let mut offset = 0;
        for line in source.split_inclusive('\n') {
            let line_end = offset + line.len();
            let trimmed = line.trim();
            if let Some(rest) = trimmed.strip_prefix("package ") {
                table.package = Some(statement_body(rest).to_string());
                table.package_end = Some(line_end);
            } else if let Some(rest) = trimmed.strip_prefix("import ") {
                let rest = rest.trim_start();
                if let Some(member) = rest.strip_prefix("static ") {
                    table.static_imports.push(statement_body(member).to_string());
                } else {
                    table.imports.push(statement_body(rest).to_string());
                }
                table.imports_end = Some(line_end);
            }
            offset = line_end;
        }
        table.declared_types = TYPE_DECLARATION
            .captures_iter(source)
            .filter_map(|caps| caps.get(1))
            .map(|name| name.as_str().to_string())
            .collect();
        table
    }

    pub fn package(&self) -> Option<&str> {
        self.package.as_deref()
    }

    pub fn imports(&self) -> &[String] {
        &self.imports
    }

    pub fn static_imports(&self) -> &[String] {
        &self.static_imports
    }

    pub fn declared_types(&self) -> &[String] {
        &self.declared_types
    }

    fn declares_other_type(&self, qualified_name: &str) -> bool {
        let simple = simple_name(qualified_name);
        let own = match self.package.as_deref() {
            Some(package) => format!("{package}.{simple}"),
            None => simple.to_string(),
        };
        own != qualified_name && self.declared_types.iter().any(|name| name == simple)
    }

    fn is_visible_without_import(&self, qualified_name: &str) -> bool {
        let package = package_part(qualified_name);
        package == "java.lang"
            || self.package.as_deref() == Some(package)
            || self.imports.iter().any(|import| {
                import == qualified_name
                    || import
                        .strip_suffix(".*")
                        .is_some_and(|wildcard| wildcard == package)
            })
    }

    /// Build one insertion edit adding the imports the file does not have yet.
    ///
    /// New imports go after the last existing import, else after the package
    /// declaration, else at the top of the file.
    pub fn insertion_edit(
        &self,
        source: &str,
        imports: &[String],
        static_imports: &[String],
    ) -> Option<TextEdit> {
        let mut lines = String::new();
        for import in imports {
            if !self.imports.contains(import) && !self.is_visible_without_import(import) {
                lines.push_str(&format!("import {import};\n"));
            }
        }
        for member in static_imports {
            if !self.static_imports.contains(member) {
                lines.push_str(&format!("import static {member};\n"));
            }
        }
        if lines.is_empty() {
            return None;
        }

        let needs_newline = |end: usize| end > 0 && !source[..end].ends_with('\n');
        let edit = match (self.imports_end, self.package_end) {
            (Some(end), _) => {
                let prefix = if needs_newline(end) { "\n" } else { "" };
                TextEdit::insert(end, format!("{prefix}{lines}"))
            }
            (None, Some(end)) => {
                let prefix = if needs_newline(end) { "\n\n" } else { "\n" };
                TextEdit::insert(end, format!("{prefix}{lines}"))
            }
            (None, None) => TextEdit::insert(0, format!("{lines}\n")),
        };
        Some(edit)
    }
}

fn statement_body(rest: &str) -> &str {
    rest.split(';').next().unwrap_or(rest).trim()
}

impl ImportTable for SourceImports {
    fn qualify(&self, qualified_name: &str, fix: &mut FixBuilder) -> String {
        let simple = simple_name(qualified_name);
        if self.declares_other_type(qualified_name) {
            return qualified_name.to_string();
        }
        if self.is_visible_without_import(qualified_name) {
            return simple.to_string();
        }

        let clashes = |imports: &[String]| {
            imports
                .iter()
                .any(|import| import != qualified_name && simple_name(import) == simple)
        };
        if clashes(&self.imports) || clashes(fix.imports()) {
            return qualified_name.to_string();
        }

        fix.add_import(qualified_name);
        simple.to_string()
    }
}
