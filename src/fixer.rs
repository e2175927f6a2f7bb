//! Auto-fix application module.
//!
//! This module applies the fixes carried by findings to a source file:
//! call-site edits plus the import insertions they require.

use std::fmt::Write;
use std::path::Path;

use crate::diagnostics::Finding;
use crate::fix::{FixError, TextEdit, apply_edits};
use crate::imports::SourceImports;

/// Result of applying fixes to a source file.
#[derive(Debug)]
pub struct FixResult {
    /// The modified source code.
    pub fixed_source: String,
    /// Number of call-site fixes applied.
    pub fixes_applied: usize,
    /// Fixes left for a later pass because they overlap an applied one.
    pub fixes_deferred: usize,
}

/// Apply the fixes of `findings` to `source`.
///
/// Findings are accepted in order. A fix whose edit overlaps an accepted one
/// (two rewrites in the same fluent chain, say) is deferred; running the
/// inliner again on the fixed source picks it up. Imports are added only for
/// accepted fixes.
pub fn apply_fixes(source: &str, findings: &[Finding]) -> Result<FixResult, FixError> {
    let mut accepted: Vec<&Finding> = Vec::new();
    let mut deferred = 0;
    for finding in findings {
        finding.fix.edit.validate(source)?;
        if accepted
            .iter()
            .any(|prior| prior.fix.edit.overlaps_with(&finding.fix.edit))
        {
            deferred += 1;
        } else {
            accepted.push(finding);
        }
    }

    let mut imports: Vec<String> = Vec::new();
    let mut static_imports: Vec<String> = Vec::new();
    for finding in &accepted {
        for import in &finding.fix.imports_to_add {
            if !imports.contains(import) {
                imports.push(import.clone());
            }
        }
        for member in &finding.fix.static_imports_to_add {
            if !static_imports.contains(member) {
                static_imports.push(member.clone());
            }
        }
    }

    let mut edits: Vec<TextEdit> = accepted.iter().map(|f| f.fix.edit.clone()).collect();
    if let Some(insertion) =
        SourceImports::parse(source).insertion_edit(source, &imports, &static_imports)
    {
        edits.push(insertion);
    }

    let applied = apply_edits(source, &edits)?;
    Ok(FixResult {
        fixed_source: applied.source,
        fixes_applied: accepted.len(),
        fixes_deferred: deferred,
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DiffOp<'a> {
    Equal(&'a str),
    Delete(&'a str),
    Insert(&'a str),
}

/// Above this many table cells the changed middle is shown as one block.
const MAX_LCS_CELLS: usize = 4_000_000;

fn diff_lines<'a>(a: &[&'a str], b: &[&'a str]) -> Vec<DiffOp<'a>> {
    let prefix = a.iter().zip(b).take_while(|(x, y)| x == y).count();
    let suffix = a[prefix..]
        .iter()
        .rev()
        .zip(b[prefix..].iter().rev())
        .take_while(|(x, y)| x == y)
        .count();
    let a_mid = &a[prefix..a.len() - suffix];
    let b_mid = &b[prefix..b.len() - suffix];

    let mut ops: Vec<DiffOp<'a>> = a[..prefix].iter().copied().map(DiffOp::Equal).collect();

    if a_mid.len().saturating_mul(b_mid.len()) > MAX_LCS_CELLS {
        ops.extend(a_mid.iter().copied().map(DiffOp::Delete));
        ops.extend(b_mid.iter().copied().map(DiffOp::Insert));
    } else {
        let (n, m) = (a_mid.len(), b_mid.len());
        let mut table = vec![0u32; (n + 1) * (m + 1)];
        let idx = |i: usize, j: usize| i * (m + 1) + j;
        for i in (0..n).rev() {
            for j in (0..m).rev() {
                table[idx(i, j)] = if a_mid[i] == b_mid[j] {
                    table[idx(i + 1, j + 1)] + 1
                } else {
                    table[idx(i + 1, j)].max(table[idx(i, j + 1)])
                };
            }
        }
        let (mut i, mut j) = (0, 0);
        while i < n && j < m {
            if a_mid[i] == b_mid[j] {
                ops.push(DiffOp::Equal(a_mid[i]));
                i += 1;
                j += 1;
            } else if table[idx(i + 1, j)] >= table[idx(i, j + 1)] {
                ops.push(DiffOp::Delete(a_mid[i]));
                i += 1;
            } else {
                ops.push(DiffOp::Insert(b_mid[j]));
                j += 1;
            }
        }
        ops.extend(a_mid[i..].iter().copied().map(DiffOp::Delete));
        ops.extend(b_mid[j..].iter().copied().map(DiffOp::Insert));
    }

    ops.extend(a[a.len() - suffix..].iter().copied().map(DiffOp::Equal));
    ops
}

/// Generate a unified diff between original and fixed source.
///
/// Includes context lines (3 lines before and after each change) for better readability.
pub fn format_diff(original: &str, fixed: &str, path: &Path) -> String {
    format_diff_with_context(original, fixed, path, 3)
}

/// Generate a unified diff with configurable context lines.
pub fn format_diff_with_context(
    original: &str,
    fixed: &str,
    path: &Path,
    context: usize,
) -> String {
    let orig_lines: Vec<&str> = original.lines().collect();
    let fixed_lines: Vec<&str> = fixed.lines().collect();
    let ops = diff_lines(&orig_lines, &fixed_lines);

    let changes: Vec<usize> = ops
        .iter()
        .enumerate()
        .filter(|(_, op)| !matches!(op, DiffOp::Equal(_)))
        .map(|(i, _)| i)
        .collect();
    if changes.is_empty() {
        return String::new();
    }

    // Group changes into hunks with context
    let mut hunks: Vec<(usize, usize)> = Vec::new();
    for &i in &changes {
        let start = i.saturating_sub(context);
        let end = (i + context + 1).min(ops.len());
        match hunks.last_mut() {
            Some((_, hunk_end)) if start <= *hunk_end => *hunk_end = end,
            _ => hunks.push((start, end)),
        }
    }

    let path_str = path.display().to_string();
    let mut output = String::new();
    let _ = writeln!(output, "--- a/{path_str}");
    let _ = writeln!(output, "+++ b/{path_str}");

    for (start, end) in hunks {
        let old_before = ops[..start]
            .iter()
            .filter(|op| !matches!(op, DiffOp::Insert(_)))
            .count();
        let new_before = ops[..start]
            .iter()
            .filter(|op| !matches!(op, DiffOp::Delete(_)))
            .count();
        let hunk = &ops[start..end];
        let old_size = hunk
            .iter()
            .filter(|op| !matches!(op, DiffOp::Insert(_)))
            .count();
        let new_size = hunk
            .iter()
            .filter(|op| !matches!(op, DiffOp::Delete(_)))
            .count();
        let header_start = |before: usize, size: usize| if size == 0 { before } else { before + 1 };

        let _ = writeln!(
            output,
            "@@ -{},{} +{},{} @@",
            header_start(old_before, old_size),
            old_size,
            header_start(new_before, new_size),
            new_size
        );
        for op in hunk {
            let _ = match op {
                DiffOp::Equal(line) => writeln!(output, " {line}"),
                DiffOp::Delete(line) => writeln!(output, "-{line}"),
                DiffOp::Insert(line) => writeln!(output, "+{line}"),
            };
        }
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::ApiIdentity;
    use crate::callsite::{TargetSymbol, TextRange};
    use crate::fix::InlineFix;
    use crate::template::InliningTemplate;

    fn finding(range: TextRange, replacement: &str, imports: &[&str]) -> Finding {
        let template = InliningTemplate::new("t", "x", vec![], vec![], None).unwrap();
        let api = ApiIdentity::new(&TargetSymbol::default(), &template);
        let mut builder = InlineFix::builder();
        for import in imports {
            builder.add_import(*import);
        }
        Finding::new(api, range, builder.replace(range, replacement), true)
    }

    #[test]
    fn applies_fix_and_imports() {
        let source = "package p;\n\nimport q.A;\n\nclass C { int x = a.old(); }\n";
        let start = source.find("a.old()").unwrap();
        let range = TextRange::new(start, start + "a.old()".len());
        let result = apply_fixes(source, &[finding(range, "B.fresh(a)", &["r.B"])]).unwrap();
        assert_eq!(
            result.fixed_source,
            "package p;\n\nimport q.A;\nimport r.B;\n\nclass C { int x = B.fresh(a); }\n"
        );
        assert_eq!(result.fixes_applied, 1);
        assert_eq!(result.fixes_deferred, 0);
    }

    #[test]
    fn overlapping_fix_is_deferred_with_its_imports() {
        let source = "class C { int x = a.b().c(); }\n";
        let start = source.find("a.b()").unwrap();
        let inner = finding(TextRange::new(start, start + 5), "a.d()", &[]);
        let outer = finding(TextRange::new(start, start + 9), "z", &["r.Z"]);
        let result = apply_fixes(source, &[inner, outer]).unwrap();
        assert_eq!(result.fixed_source, "class C { int x = a.d().c(); }\n");
        assert_eq!(result.fixes_deferred, 1);
    }

    #[test]
    fn test_format_diff() {
        let original = "import a.B;\nclass C {\n  void m() { x.old(); }\n}\n";
        let fixed = "import a.B;\nimport a.D;\nclass C {\n  void m() { x.fresh(); }\n}\n";
        let diff = format_diff(original, fixed, Path::new("C.java"));
        insta::assert_snapshot!(diff, @r"
        --- a/C.java
        +++ b/C.java
        @@ -1,4 +1,5 @@
         import a.B;
        +import a.D;
         class C {
        -  void m() { x.old(); }
        +  void m() { x.fresh(); }
         }
        ");
    }

    #[test]
    fn identical_sources_have_empty_diff() {
        assert!(format_diff("a\nb\n", "a\nb\n", Path::new("x")).is_empty());
    }
}
