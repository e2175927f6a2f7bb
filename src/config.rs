use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{InlineMeError, InlineResult};

pub const DEFAULT_CONFIG_FILE_NAME: &str = "inline-me.toml";

/// Restricts rewriting to APIs whose `Class#method` id starts with a prefix.
pub const PREFIX_FLAG: &str = "InlineMe:Prefix";
pub const SKIP_COMMENTS_FLAG: &str = "InlineMe:SkipInliningsWithComments";
pub const CHECK_FIX_COMPILES_FLAG: &str = "InlineMe:CheckFixCompiles";

/// Immutable engine configuration, threaded explicitly into `Inliner::new`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlinerSettings {
    /// Empty means every annotated API is rewritten.
    pub api_prefixes: BTreeSet<String>,
    pub skip_callsites_with_comments: bool,
    pub check_fix_compiles: bool,
}

impl Default for InlinerSettings {
    fn default() -> Self {
        Self {
            api_prefixes: BTreeSet::new(),
            skip_callsites_with_comments: true,
            check_fix_compiles: false,
        }
    }
}

impl InlinerSettings {
    #[must_use]
    pub fn with_prefixes(mut self, prefixes: impl IntoIterator<Item = String>) -> Self {
        self.api_prefixes
            .extend(prefixes.into_iter().filter(|p| !p.is_empty()));
        self
    }

    #[must_use]
    pub fn skip_callsites_with_comments(mut self, skip: bool) -> Self {
        self.skip_callsites_with_comments = skip;
        self
    }

    #[must_use]
    pub fn check_fix_compiles(mut self, check: bool) -> Self {
        self.check_fix_compiles = check;
        self
    }

    /// Apply one `Key=Value` flag in the `InlineMe:*` namespace.
    ///
    /// `InlineMe:Prefix` replaces the prefix set with a comma-separated list.
    pub fn apply_flag(&mut self, flag: &str) -> InlineResult<()> {
        let (key, value) = flag
            .split_once('=')
            .ok_or_else(|| InlineMeError::config(format!("flag `{flag}` is not KEY=VALUE")))?;
        match key.trim() {
            PREFIX_FLAG => {
                self.api_prefixes = value
                    .split(',')
                    .map(str::trim)
                    .filter(|p| !p.is_empty())
                    .map(str::to_string)
                    .collect();
            }
            SKIP_COMMENTS_FLAG => self.skip_callsites_with_comments = parse_bool(key, value)?,
            CHECK_FIX_COMPILES_FLAG => self.check_fix_compiles = parse_bool(key, value)?,
            other => {
                return Err(InlineMeError::config(format!("unknown flag `{other}`")));
            }
        }
        Ok(())
    }

    pub fn from_flags<'a>(flags: impl IntoIterator<Item = &'a str>) -> InlineResult<Self> {
        let mut settings = Self::default();
        for flag in flags {
            settings.apply_flag(flag)?;
        }
        Ok(settings)
    }
}

fn parse_bool(key: &str, value: &str) -> InlineResult<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" => Ok(true),
        "false" => Ok(false),
        other => Err(InlineMeError::config(format!(
            "flag `{key}` expects true or false, got `{other}`"
        ))),
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct InlineMeConfig {
    #[serde(default)]
    pub inliner: InlinerConfig,

    #[serde(default)]
    pub verify: VerifyConfig,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct InlinerConfig {
    #[serde(default)]
    pub prefixes: Vec<String>,

    pub skip_callsites_with_comments: Option<bool>,

    pub check_fix_compiles: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VerifyConfig {
    /// Compile command; `{file}` is replaced by the speculative copy's path.
    #[serde(default)]
    pub command: Vec<String>,

    pub timeout_secs: Option<u64>,
}

impl VerifyConfig {
    pub fn timeout(&self) -> Duration {
        self.timeout_secs
            .map(Duration::from_secs)
            .unwrap_or(crate::verify::DEFAULT_TIMEOUT)
    }
}

impl InlineMeConfig {
    pub fn settings(&self) -> InlinerSettings {
        let defaults = InlinerSettings::default();
        InlinerSettings {
            api_prefixes: BTreeSet::new(),
            skip_callsites_with_comments: self
                .inliner
                .skip_callsites_with_comments
                .unwrap_or(defaults.skip_callsites_with_comments),
            check_fix_compiles: self
                .inliner
                .check_fix_compiles
                .unwrap_or(defaults.check_fix_compiles),
        }
        .with_prefixes(self.inliner.prefixes.iter().cloned())
    }
}

pub fn find_config_file(start_dir: &Path) -> Option<PathBuf> {
    let mut cur = Some(start_dir);
    while let Some(dir) = cur {
        let candidate = dir.join(DEFAULT_CONFIG_FILE_NAME);
        if candidate.is_file() {
            return Some(candidate);
        }
        cur = dir.parent();
    }
    None
}

pub fn load_config_file(path: &Path) -> Result<InlineMeConfig> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config file: {}", path.display()))?;
    let cfg: InlineMeConfig = toml::from_str(&raw)
        .with_context(|| format!("failed to parse config file: {}", path.display()))?;
    Ok(cfg)
}

pub fn load_config(
    explicit_path: Option<&Path>,
    start_dir: &Path,
) -> Result<Option<(PathBuf, InlineMeConfig)>> {
    if let Some(p) = explicit_path {
        let cfg = load_config_file(p)?;
        return Ok(Some((p.to_path_buf(), cfg)));
    }

    let Some(p) = find_config_file(start_dir) else {
        return Ok(None);
    };
    let cfg = load_config_file(&p)?;
    Ok(Some((p, cfg)))
}
