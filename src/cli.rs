use clap::{Args as ClapArgs, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// InlineMe CLI options.
#[derive(Debug, Parser)]
#[command(
    name = "inline-me",
    version,
    about = "Inline calls to APIs annotated with @InlineMe",
    args_conflicts_with_subcommands = true,
    subcommand_precedence_over_arg = true
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Command>,

    #[command(flatten)]
    pub check: CheckArgs,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Inline call sites recorded in manifest files or directories.
    Check(CheckArgs),

    /// Explain the InlineMe check and its flags.
    Explain,
}

#[derive(Debug, Clone, ClapArgs)]
pub struct CheckArgs {
    /// Manifest files (`*.inlineme.json`) or directories containing them.
    #[arg(value_name = "PATH")]
    pub paths: Vec<PathBuf>,

    /// Output format.
    #[arg(long, value_enum, default_value_t = OutputFormat::Pretty)]
    pub format: OutputFormat,

    /// Config file; defaults to the nearest `inline-me.toml` above the first path.
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Only inline APIs whose `Class#method` id starts with one of these (comma-separated).
    #[arg(long, value_delimiter = ',')]
    pub prefix: Vec<String>,

    /// Also inline call sites whose source contains comments.
    #[arg(long)]
    pub keep_comment_callsites: bool,

    /// Decline fixes that do not compile (needs `[verify] command` in config).
    #[arg(long)]
    pub check_fix_compiles: bool,

    /// Checker flags as `KEY=VALUE`, e.g. `-X InlineMe:Prefix=com.example`.
    #[arg(short = 'X', value_name = "KEY=VALUE")]
    pub flags: Vec<String>,

    /// Rewrite source files in place.
    #[arg(long, conflicts_with = "diff")]
    pub fix: bool,

    /// Print the fixes as a unified diff instead of findings.
    #[arg(long)]
    pub diff: bool,

    /// Exit with code 1 if any findings are emitted.
    #[arg(long)]
    pub deny_warnings: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    Pretty,
    Json,
    Github,
}
