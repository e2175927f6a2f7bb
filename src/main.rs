use clap::Parser;
use inline_me::InlineEngine;
use inline_me::cli::{Args, CheckArgs, Command, OutputFormat};
use inline_me::config::{
    self, CHECK_FIX_COMPILES_FLAG, InlineMeConfig, InlinerSettings, PREFIX_FLAG,
    SKIP_COMMENTS_FLAG,
};
use inline_me::diagnostics::{CHECK_NAME, CHECK_SUMMARY, Finding};
use inline_me::fixer;
use inline_me::manifest::{self, LoadedManifest};
use std::path::PathBuf;
use std::process::ExitCode;

fn main() -> ExitCode {
    inline_me::telemetry::init_tracing();
    match run() {
        Ok(code) => code,
        Err(err) => {
            eprintln!("{err:#}");
            ExitCode::from(2)
        }
    }
}

fn run() -> anyhow::Result<ExitCode> {
    let args = Args::parse();

    match args.command {
        Some(Command::Explain) => {
            explain();
            Ok(ExitCode::SUCCESS)
        }
        Some(Command::Check(check)) => check_command(check),
        None => check_command(args.check),
    }
}

fn explain() {
    println!("name: {CHECK_NAME}");
    println!("description: {CHECK_SUMMARY}");
    println!("flags:");
    println!("  {PREFIX_FLAG}=<p1,p2,...>  only inline APIs whose id starts with a prefix");
    println!("  {SKIP_COMMENTS_FLAG}=<bool>  leave call sites with comments alone (default true)");
    println!("  {CHECK_FIX_COMPILES_FLAG}=<bool>  decline fixes that do not compile (default false)");
}

/// Config file settings, then `-X` flags, then dedicated CLI options.
fn resolve_settings(args: &CheckArgs, cfg: Option<&InlineMeConfig>) -> anyhow::Result<InlinerSettings> {
    let mut settings = cfg.map(InlineMeConfig::settings).unwrap_or_default();
    for flag in &args.flags {
        settings.apply_flag(flag)?;
    }
    if !args.prefix.is_empty() {
        settings.api_prefixes.clear();
        settings = settings.with_prefixes(args.prefix.iter().cloned());
    }
    if args.keep_comment_callsites {
        settings = settings.skip_callsites_with_comments(false);
    }
    if args.check_fix_compiles {
        settings = settings.check_fix_compiles(true);
    }
    Ok(settings)
}

fn check_command(args: CheckArgs) -> anyhow::Result<ExitCode> {
    if args.paths.is_empty() {
        anyhow::bail!("no manifest paths given");
    }

    let start_dir = infer_start_dir(&args)?;
    let loaded_cfg = config::load_config(args.config.as_deref(), &start_dir)?;
    let cfg = loaded_cfg.as_ref().map(|(_path, cfg)| cfg);

    let settings = resolve_settings(&args, cfg)?;
    let mut engine = InlineEngine::new(settings);
    if let Some(cfg) = cfg {
        if !cfg.verify.command.is_empty() {
            engine = engine.with_verify_command(cfg.verify.command.clone(), cfg.verify.timeout());
        }
    }

    let manifests = manifest::collect_manifests(&args.paths)?;
    let mut loaded = Vec::with_capacity(manifests.len());
    let mut findings: Vec<Vec<Finding>> = Vec::with_capacity(manifests.len());
    for path in &manifests {
        let file = manifest::load_manifest(path)?;
        findings.push(engine.inline_manifest(&file));
        loaded.push(file);
    }

    if args.fix || args.diff {
        return fix_command(&args, &loaded, &findings);
    }

    let all: Vec<&Finding> = findings.iter().flatten().collect();
    match args.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&all)?),
        OutputFormat::Pretty => {
            for finding in &all {
                println!("{}", finding.render_pretty());
            }
        }
        OutputFormat::Github => {
            for finding in &all {
                println!("{}", finding.render_github());
            }
        }
    }

    if args.deny_warnings && !all.is_empty() {
        Ok(ExitCode::from(1))
    } else {
        Ok(ExitCode::SUCCESS)
    }
}

/// Handle --fix and --diff: apply each file's findings once.
///
/// Manifest ranges refer to the source as recorded, so deferred fixes need
/// the front end to re-record the rewritten file before another pass.
fn fix_command(
    args: &CheckArgs,
    loaded: &[LoadedManifest],
    findings: &[Vec<Finding>],
) -> anyhow::Result<ExitCode> {
    let mut total_fixed = 0usize;
    let mut total_deferred = 0usize;
    let mut files_modified = 0usize;

    for (file, file_findings) in loaded.iter().zip(findings) {
        if file_findings.is_empty() {
            continue;
        }
        let result = fixer::apply_fixes(&file.source, file_findings)?;
        total_fixed += result.fixes_applied;
        total_deferred += result.fixes_deferred;

        if args.diff {
            let diff = fixer::format_diff(&file.source, &result.fixed_source, &file.source_path);
            if !diff.is_empty() {
                print!("{diff}");
            }
        } else if result.fixed_source != file.source {
            std::fs::write(&file.source_path, &result.fixed_source)?;
            files_modified += 1;
        }
    }

    if args.diff {
        eprintln!("{total_fixed} fix(es) would be applied");
    } else {
        eprintln!("Applied {total_fixed} fix(es) to {files_modified} file(s)");
    }
    if total_deferred > 0 {
        eprintln!("{total_deferred} overlapping fix(es) deferred; re-record and run again to apply");
    }

    if args.deny_warnings && total_fixed + total_deferred > 0 {
        Ok(ExitCode::from(1))
    } else {
        Ok(ExitCode::SUCCESS)
    }
}

fn infer_start_dir(args: &CheckArgs) -> anyhow::Result<PathBuf> {
    let base = match args.paths.first() {
        Some(p) => p.clone(),
        None => std::env::current_dir()?,
    };

    let base = if base.is_file() {
        base.parent()
            .map(|p| p.to_path_buf())
            .unwrap_or_else(|| PathBuf::from("."))
    } else {
        base
    };

    Ok(base)
}
