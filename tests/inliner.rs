//! Behavior of the rewrite engine on realistic call sites.

mod support;

use inline_me::error::InlineMeError;
use inline_me::imports::SourceImports;
use inline_me::manifest::{LoadedManifest, Manifest};
use inline_me::template::{DecodedAnnotations, InlineMeAttributes};
use inline_me::verify::FixVerifier;
use inline_me::{
    CallKind, CallSite, ExprHandle, InlineEngine, InlineEnv, InlineFix, InlinerSettings,
    InliningTemplate, NoMatchReason, SelfKeyword, TextRange,
};
use support::{
    constructor_call, inline, inline_verified, method_call, range_of, rewritten, target, template,
};

const WIDGET: &str = "com.example.Widget";

// ============================================================================
// Varargs binding
// ============================================================================

#[test]
fn empty_varargs_leaves_no_trailing_comma() {
    let source = "class C { void m() { recv.f(x); } }";
    let site = method_call(
        source,
        "recv.f(x)",
        Some("recv"),
        &["x"],
        target(WIDGET, "f", &["a", "rest"], true),
        false,
    );
    let verdict = inline(source, &site, &template("this.g(a, rest)", &[]), InlinerSettings::default());
    assert_eq!(verdict.finding().unwrap().fix.edit.replacement, ".g(x)");
    assert_eq!(rewritten(source, &verdict), "class C { void m() { recv.g(x); } }");
}

#[test]
fn trailing_varargs_are_joined() {
    let source = r#"class C { void m() { recv.f(x, "p", "q"); } }"#;
    let site = method_call(
        source,
        r#"recv.f(x, "p", "q")"#,
        Some("recv"),
        &["x", r#""p""#, r#""q""#],
        target(WIDGET, "f", &["a", "rest"], true),
        false,
    );
    let verdict = inline(source, &site, &template("this.g(a, rest)", &[]), InlinerSettings::default());
    assert_eq!(
        rewritten(source, &verdict),
        r#"class C { void m() { recv.g(x, "p", "q"); } }"#
    );
}

#[test]
fn non_varargs_arity_mismatch_is_rejected_at_construction() {
    let err = CallSite::new(
        CallKind::Method {
            receiver: None,
            keyword: None,
        },
        target(WIDGET, "f", &["a", "b"], false),
        vec!["x".to_string()],
        ExprHandle::new(TextRange::new(0, 4), "f(x)"),
        None,
    )
    .unwrap_err();
    assert!(matches!(err, InlineMeError::ArityMismatch { .. }));
}

// ============================================================================
// Receiver pass-through
// ============================================================================

const NOOP_STATEMENT: &str = "class C {\n  void m() {\n    foo.noop();\n  }\n}\n";

#[test]
fn pass_through_statement_with_pure_receiver_is_deleted() {
    let site = method_call(
        NOOP_STATEMENT,
        "foo.noop()",
        Some("foo"),
        &[],
        target(WIDGET, "noop", &[], false),
        true,
    );
    let verdict = inline(NOOP_STATEMENT, &site, &template("this", &[]), InlinerSettings::default());
    let finding = verdict.finding().unwrap();
    assert!(finding.fix.is_deletion());
    assert_eq!(finding.fix.edit.range(), range_of(NOOP_STATEMENT, "foo.noop();"));
    assert_eq!(
        rewritten(NOOP_STATEMENT, &verdict),
        "class C {\n  void m() {\n    \n  }\n}\n"
    );
}

#[test]
fn pass_through_statement_with_impure_receiver_keeps_receiver() {
    let source = "class C { void m() { make().noop(); } }";
    let site = method_call(
        source,
        "make().noop()",
        Some("make()"),
        &[],
        target(WIDGET, "noop", &[], false),
        true,
    );
    let verdict = inline(source, &site, &template("this", &[]), InlinerSettings::default());
    assert!(!verdict.finding().unwrap().fix.is_deletion());
    assert_eq!(rewritten(source, &verdict), "class C { void m() { make(); } }");
}

#[test]
fn pass_through_inside_expression_substitutes_receiver() {
    let source = "class C { void m() { int n = foo.noop().hashCode(); } }";
    let site = method_call(
        source,
        "foo.noop()",
        Some("foo"),
        &[],
        target(WIDGET, "noop", &[], false),
        true,
    );
    let verdict = inline(source, &site, &template("this", &[]), InlinerSettings::default());
    assert_eq!(
        rewritten(source, &verdict),
        "class C { void m() { int n = foo.hashCode(); } }"
    );
}

// ============================================================================
// `this.` narrowing
// ============================================================================

#[test]
fn this_prefixed_template_leaves_receiver_untouched() {
    let source = "class C { void m() { x.old(y); } }";
    let site = method_call(
        source,
        "x.old(y)",
        Some("x"),
        &["y"],
        target(WIDGET, "old", &["a"], false),
        true,
    );
    let verdict = inline(source, &site, &template("this.bar(a)", &[]), InlinerSettings::default());
    let edit = &verdict.finding().unwrap().fix.edit;
    let receiver = range_of(source, "x.old").start..range_of(source, "x.old").start + 1;
    assert!(edit.start_byte >= receiver.end);
    assert_eq!(edit.replacement, ".bar(y)");
    assert_eq!(rewritten(source, &verdict), "class C { void m() { x.bar(y); } }");
}

#[test]
fn fluent_chain_rewrites_do_not_overlap() {
    let source = "class C { void m() { a.old1().old2(); } }";
    let inner = method_call(
        source,
        "a.old1()",
        Some("a"),
        &[],
        target(WIDGET, "old1", &[], false),
        false,
    );
    let outer = method_call(
        source,
        "a.old1().old2()",
        Some("a.old1()"),
        &[],
        target(WIDGET, "old2", &[], false),
        true,
    );
    let settings = InlinerSettings::default();
    let inner = inline(source, &inner, &template("this.new1()", &[]), settings.clone())
        .into_finding()
        .unwrap();
    let outer = inline(source, &outer, &template("this.new2()", &[]), settings)
        .into_finding()
        .unwrap();
    assert!(!inner.fix.edit.overlaps_with(&outer.fix.edit));

    let result = inline_me::fixer::apply_fixes(source, &[inner, outer]).unwrap();
    assert_eq!(result.fixes_applied, 2);
    assert_eq!(
        result.fixed_source,
        "class C { void m() { a.new1().new2(); } }"
    );
}

// ============================================================================
// Static, constructor and keyword calls
// ============================================================================

#[test]
fn static_call_strips_this_qualifiers() {
    let source = "class C { int m() { return old(y); } }";
    let site = method_call(
        source,
        "old(y)",
        None,
        &["y"],
        target(WIDGET, "old", &["a"], false),
        false,
    );
    let verdict = inline(
        source,
        &site,
        &template("this.helper(a, this.size)", &[]),
        InlinerSettings::default(),
    );
    assert_eq!(
        rewritten(source, &verdict),
        "class C { int m() { return helper(y, size); } }"
    );
}

#[test]
fn constructor_call_is_rewritten_to_factory() {
    let source = "package com.example.app;\n\
                  \n\
                  import com.example.Widget;\n\
                  \n\
                  class C {\n  Widget w = new Widget(5);\n}\n";
    let site = constructor_call(
        source,
        "new Widget(5)",
        "Widget",
        &["5"],
        target(WIDGET, "<init>", &["size"], false),
    );
    let verdict = inline(
        source,
        &site,
        &template("Widget.ofSize(size)", &[WIDGET]),
        InlinerSettings::default(),
    );
    let finding = verdict.finding().unwrap();
    assert!(finding.fix.imports_to_add.is_empty());
    assert!(rewritten(source, &verdict).contains("Widget w = Widget.ofSize(5);"));
}

#[test]
fn super_keyword_call_substitutes_keyword() {
    let source = "class C extends B { C(int x) { super(x); } }";
    let call = range_of(source, "super(x)");
    let site = CallSite::new(
        CallKind::Method {
            receiver: None,
            keyword: Some(SelfKeyword::Super),
        },
        target("com.example.B", "<init>", &["a"], false),
        vec!["x".to_string()],
        ExprHandle::new(call, "super(x)"),
        None,
    )
    .unwrap();
    let verdict = inline(source, &site, &template("this(a, 0)", &[]), InlinerSettings::default());
    assert_eq!(verdict.finding().unwrap().fix.edit.replacement, "super(x, 0)");
}

// ============================================================================
// Imports and substitution hazards
// ============================================================================

#[test]
fn missing_import_is_added_and_simple_name_used() {
    let source = "package com.example.app;\n\nclass C {\n  void m() { w.old(); }\n}\n";
    let site = method_call(
        source,
        "w.old()",
        Some("w"),
        &[],
        target(WIDGET, "old", &[], false),
        true,
    );
    let verdict = inline(
        source,
        &site,
        &template("Helpers.fresh(this)", &["com.example.Helpers"]),
        InlinerSettings::default(),
    );
    assert_eq!(
        verdict.finding().unwrap().fix.imports_to_add,
        vec!["com.example.Helpers".to_string()]
    );
    assert_eq!(
        rewritten(source, &verdict),
        "package com.example.app;\n\nimport com.example.Helpers;\n\nclass C {\n  void m() { Helpers.fresh(w); }\n}\n"
    );
}

#[test]
fn clashing_type_is_qualified_without_touching_longer_names() {
    let source = "package com.example.app;\n\nimport other.Foo;\n\nclass C {\n  int n = old(y);\n}\n";
    let site = method_call(
        source,
        "old(y)",
        None,
        &["y"],
        target(WIDGET, "old", &["a"], false),
        false,
    );
    let verdict = inline(
        source,
        &site,
        &template("FooBar.x(Foo.of(a, abc))", &["com.lib.Foo"]),
        InlinerSettings::default(),
    );
    let finding = verdict.finding().unwrap();
    assert!(finding.fix.imports_to_add.is_empty());
    assert_eq!(finding.fix.edit.replacement, "FooBar.x(com.lib.Foo.of(y, abc))");
}

#[test]
fn static_imports_are_carried_verbatim() {
    let source = "class C {\n  int n = old(y);\n}\n";
    let site = method_call(
        source,
        "old(y)",
        None,
        &["y"],
        target(WIDGET, "old", &["a"], false),
        false,
    );
    let template = InliningTemplate::new(
        "test",
        "requireNonNull(a)",
        Vec::new(),
        vec!["java.util.Objects.requireNonNull".to_string()],
        None,
    )
    .unwrap();
    let verdict = inline(source, &site, &template, InlinerSettings::default());
    assert_eq!(
        rewritten(source, &verdict),
        "import static java.util.Objects.requireNonNull;\n\nclass C {\n  int n = requireNonNull(y);\n}\n"
    );
}

#[test]
fn argument_text_with_regex_metacharacters_is_literal() {
    let source = r#"class C { void m() { recv.f(s.replaceAll("$1", "\\d+")); } }"#;
    let arg = r#"s.replaceAll("$1", "\\d+")"#;
    let call = format!("recv.f({arg})");
    let site = method_call(
        source,
        &call,
        Some("recv"),
        &[arg],
        target(WIDGET, "f", &["a"], false),
        false,
    );
    let verdict = inline(source, &site, &template("this.g(a)", &[]), InlinerSettings::default());
    assert_eq!(
        verdict.finding().unwrap().fix.edit.replacement,
        format!(".g({arg})")
    );
}

#[test]
fn argument_containing_parameter_name_is_not_resubstituted() {
    let source = "class C { void m() { recv.f(b, a + ab); } }";
    let site = method_call(
        source,
        "recv.f(b, a + ab)",
        Some("recv"),
        &["b", "a + ab"],
        target(WIDGET, "f", &["a", "b"], false),
        false,
    );
    let verdict = inline(source, &site, &template("this.g(a, b)", &[]), InlinerSettings::default());
    assert_eq!(
        verdict.finding().unwrap().fix.edit.replacement,
        ".g(b, a + ab)"
    );
}

#[test]
fn qualified_type_spelling_is_not_resubstituted_by_parameters() {
    let source = "package com.example.app;\n\nimport other.Foo;\n\nclass C {\n  int n = old(y);\n}\n";
    let site = method_call(
        source,
        "old(y)",
        None,
        &["y"],
        target(WIDGET, "old", &["lib"], false),
        false,
    );
    let verdict = inline(
        source,
        &site,
        &template("Foo.of(lib)", &["com.lib.Foo"]),
        InlinerSettings::default(),
    );
    assert_eq!(verdict.finding().unwrap().fix.edit.replacement, "com.lib.Foo.of(y)");
}

#[test]
fn receiver_named_like_a_parameter_is_kept() {
    let source = "class C { void m() { list.copyTo(other); } }";
    let site = method_call(
        source,
        "list.copyTo(other)",
        Some("list"),
        &["other"],
        target(WIDGET, "copyTo", &["list"], false),
        true,
    );
    let verdict = inline(
        source,
        &site,
        &template("Lists.copy(this, list)", &[]),
        InlinerSettings::default(),
    );
    assert_eq!(
        verdict.finding().unwrap().fix.edit.replacement,
        "Lists.copy(list, other)"
    );
}

// ============================================================================
// Filtering
// ============================================================================

#[test]
fn prefix_filter_limits_rewritten_apis() {
    let source = "class C { void m() { w.oldMethod(); } }";
    let settings =
        InlinerSettings::default().with_prefixes(["com.example.Widget#".to_string()]);
    let template = template("this.newMethod()", &[]);

    let widget = method_call(
        source,
        "w.oldMethod()",
        Some("w"),
        &[],
        target(WIDGET, "oldMethod", &[], false),
        true,
    );
    assert!(inline(source, &widget, &template, settings.clone()).finding().is_some());

    let other = method_call(
        source,
        "w.oldMethod()",
        Some("w"),
        &[],
        target("com.example.Other", "oldMethod", &[], false),
        true,
    );
    assert_eq!(
        inline(source, &other, &template, settings).no_match_reason(),
        Some(NoMatchReason::PrefixFiltered)
    );
}

#[test]
fn call_with_comment_is_skipped_by_default() {
    let source = "class C { void m() { recv.f(/* keep */ x); } }";
    let site = method_call(
        source,
        "recv.f(/* keep */ x)",
        Some("recv"),
        &["x"],
        target(WIDGET, "f", &["a"], false),
        true,
    );
    let template = template("this.g(a)", &[]);
    assert_eq!(
        inline(source, &site, &template, InlinerSettings::default()).no_match_reason(),
        Some(NoMatchReason::ContainsComments)
    );

    let keep = InlinerSettings::default().skip_callsites_with_comments(false);
    assert_eq!(
        inline(source, &site, &template, keep).finding().unwrap().fix.edit.replacement,
        ".g(x)"
    );
}

#[test]
fn rewritten_call_to_plain_api_is_not_matched_again() {
    let source = "class C { void m() { x.old(y); } }";
    let site = method_call(
        source,
        "x.old(y)",
        Some("x"),
        &["y"],
        target(WIDGET, "old", &["a"], false),
        true,
    );
    let first = inline(source, &site, &template("this.bar(a)", &[]), InlinerSettings::default());
    let again = inline(source, &site, &template("this.bar(a)", &[]), InlinerSettings::default());
    assert_eq!(
        first.finding().unwrap().fix,
        again.finding().unwrap().fix
    );

    let fixed = rewritten(source, &first);
    let start = fixed.find("x.bar(y)").unwrap();
    let manifest: Manifest = serde_json::from_value(serde_json::json!({
        "source": "C.java",
        "call_sites": [{
            "target": { "owner": WIDGET, "name": "bar", "package": "com.example", "params": ["a"] },
            "annotations": {},
            "kind": "method",
            "call": { "start": start, "end": start + "x.bar(y)".len() },
            "receiver": { "start": start, "end": start + 1 },
            "arguments": [{ "start": start + 6, "end": start + 7 }]
        }]
    }))
    .unwrap();
    let loaded =
        LoadedManifest::from_parts("C.inlineme.json".into(), "C.java".into(), fixed, &manifest)
            .unwrap();
    let entry = &loaded.entries[0];
    assert!(entry.template.is_none());

    let imports = SourceImports::parse(&loaded.source);
    let env = InlineEnv::new(&imports, loaded.side_effects());
    let engine = InlineEngine::new(InlinerSettings::default());
    assert_eq!(
        engine
            .inliner()
            .inline(&entry.site, entry.template.as_ref(), &env)
            .no_match_reason(),
        Some(NoMatchReason::NotAnnotated)
    );
    assert!(engine.inline_manifest(&loaded).is_empty());
}

// ============================================================================
// Metadata and verification
// ============================================================================

#[test]
fn validation_disabled_without_reason_is_fatal() {
    let annotations = DecodedAnnotations {
        inline_me: Some(InlineMeAttributes {
            replacement: "this.y()".to_string(),
            ..Default::default()
        }),
        validation_disabled: Some(Vec::new()),
    };
    let err = InliningTemplate::from_annotations("com.example.Widget#old", &annotations)
        .unwrap_err();
    assert!(matches!(err, InlineMeError::MalformedMetadata { .. }));
}

#[test]
fn unvalidated_template_is_reported_with_reason() {
    let source = "class C { void m() { x.old(); } }";
    let site = method_call(
        source,
        "x.old()",
        Some("x"),
        &[],
        target(WIDGET, "old", &[], false),
        true,
    );
    let template = InliningTemplate::new(
        "test",
        "this.fresh()",
        Vec::new(),
        Vec::new(),
        Some("overloads differ".to_string()),
    )
    .unwrap();
    let verdict = inline(source, &site, &template, InlinerSettings::default());
    let finding = verdict.finding().unwrap();
    assert_eq!(
        finding.message,
        "Migrate (via inlining) away from `Widget.old()`. NOTE: this is an unvalidated inlining! Reasoning: overloads differ"
    );
    assert_eq!(finding.applicability.as_str(), "maybe-incorrect");
}

#[test]
fn fix_that_does_not_compile_is_discarded() {
    let source = "class C { void m() { x.old(y); } }";
    let site = method_call(
        source,
        "x.old(y)",
        Some("x"),
        &["y"],
        target(WIDGET, "old", &["a"], false),
        true,
    );
    let template = template("this.bar(a)", &[]);

    let reject = |_: &InlineFix| false;
    assert_eq!(
        inline_verified(source, &site, &template, &reject).no_match_reason(),
        Some(NoMatchReason::FixDoesNotCompile)
    );

    let accept = |fix: &InlineFix| fix.edit.replacement == ".bar(y)";
    let verifier: &dyn FixVerifier = &accept;
    assert!(inline_verified(source, &site, &template, verifier).finding().is_some());
}
