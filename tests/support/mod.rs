#![allow(dead_code)]

use inline_me::fixer;
use inline_me::imports::SourceImports;
use inline_me::oracle::LexicalSideEffects;
use inline_me::verify::FixVerifier;
use inline_me::{
    CallKind, CallSite, ExprHandle, InlineEnv, Inliner, InlinerSettings, InliningTemplate,
    TargetSymbol, TextRange, Verdict,
};

pub fn range_of(source: &str, needle: &str) -> TextRange {
    let start = source
        .find(needle)
        .unwrap_or_else(|| panic!("`{needle}` not found in source"));
    TextRange::new(start, start + needle.len())
}

pub fn target(owner: &str, name: &str, params: &[&str], varargs: bool) -> TargetSymbol {
    TargetSymbol {
        owner: owner.to_string(),
        name: name.to_string(),
        package: owner
            .rsplit_once('.')
            .map(|(package, _)| package.to_string())
            .unwrap_or_default(),
        params: params.iter().map(|p| p.to_string()).collect(),
        varargs,
        constructor: name == "<init>",
        deprecated: false,
    }
}

pub fn template(replacement: &str, imports: &[&str]) -> InliningTemplate {
    InliningTemplate::new(
        "test",
        replacement,
        imports.iter().map(|i| i.to_string()).collect(),
        Vec::new(),
        None,
    )
    .expect("valid template")
}

/// Locate `args` in order inside the call's parentheses.
fn argument_texts(source: &str, call: TextRange, args: &[&str]) -> Vec<String> {
    let call_text = call.slice(source).expect("call in bounds");
    let mut cursor = call.start + call_text.find('(').expect("call has parentheses") + 1;
    args.iter()
        .map(|arg| {
            let offset = source[cursor..]
                .find(arg)
                .unwrap_or_else(|| panic!("argument `{arg}` not found"));
            cursor += offset + arg.len();
            arg.to_string()
        })
        .collect()
}

/// Statement range when the call is followed directly by `;`.
fn statement_of(source: &str, call: TextRange, standalone: bool) -> Option<TextRange> {
    (standalone && source[call.end..].starts_with(';'))
        .then(|| TextRange::new(call.start, call.end + 1))
}

/// `call` is the first occurrence of the call text; its receiver, when given,
/// is the prefix of the call.
pub fn method_call(
    source: &str,
    call: &str,
    receiver: Option<&str>,
    args: &[&str],
    target: TargetSymbol,
    standalone: bool,
) -> CallSite {
    let range = range_of(source, call);
    let receiver = receiver.map(|text| {
        assert!(call.starts_with(text), "receiver must prefix the call");
        ExprHandle::new(TextRange::new(range.start, range.start + text.len()), text)
    });
    CallSite::new(
        CallKind::Method {
            receiver,
            keyword: None,
        },
        target,
        argument_texts(source, range, args),
        ExprHandle::new(range, call),
        statement_of(source, range, standalone),
    )
    .expect("well-formed call site")
}

pub fn constructor_call(
    source: &str,
    call: &str,
    class_text: &str,
    args: &[&str],
    target: TargetSymbol,
) -> CallSite {
    let range = range_of(source, call);
    CallSite::new(
        CallKind::Constructor {
            class_text: class_text.to_string(),
        },
        target,
        argument_texts(source, range, args),
        ExprHandle::new(range, call),
        None,
    )
    .expect("well-formed call site")
}

pub fn inline(
    source: &str,
    site: &CallSite,
    template: &InliningTemplate,
    settings: InlinerSettings,
) -> Verdict {
    let imports = SourceImports::parse(source);
    let env = InlineEnv::new(&imports, &LexicalSideEffects);
    Inliner::new(settings).inline(site, Some(template), &env)
}

pub fn inline_verified(
    source: &str,
    site: &CallSite,
    template: &InliningTemplate,
    verifier: &dyn FixVerifier,
) -> Verdict {
    let imports = SourceImports::parse(source);
    let env = InlineEnv::new(&imports, &LexicalSideEffects).with_verifier(verifier);
    Inliner::new(InlinerSettings::default().check_fix_compiles(true))
        .inline(site, Some(template), &env)
}

/// Apply a verdict's fix (and imports) to the source.
pub fn rewritten(source: &str, verdict: &Verdict) -> String {
    let finding = verdict.finding().expect("expected a rewrite");
    fixer::apply_fixes(source, std::slice::from_ref(finding))
        .expect("fix applies")
        .fixed_source
}
