//! Speculative "does the fix still compile" checks.

use std::path::Path;
use std::process::{Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};

use crate::fix::{InlineFix, apply_edit};
use crate::telemetry_debug;

/// Default upper bound on a single verification compile.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

const POLL_INTERVAL: Duration = Duration::from_millis(20);

/// Decides whether the target file still compiles once `fix` is applied.
///
/// Implementations must work on a copy; the real file is never touched.
/// Anything short of a confirmed success (errors, timeouts) is `false`.
pub trait FixVerifier {
    fn compiles_with(&self, fix: &InlineFix) -> bool;
}

impl<F> FixVerifier for F
where
    F: Fn(&InlineFix) -> bool,
{
    fn compiles_with(&self, fix: &InlineFix) -> bool {
        self(fix)
    }
}

/// Verifier that runs an external compile command on an edited temp copy.
///
/// Each `{file}` in the command arguments becomes the path of the
/// speculative copy, which keeps the original file name.
#[derive(Debug, Clone)]
pub struct CommandVerifier<'a> {
    source: &'a str,
    file_name: String,
    command: Vec<String>,
    timeout: Duration,
}

impl<'a> CommandVerifier<'a> {
    pub fn new(source_path: &Path, source: &'a str, command: Vec<String>) -> Self {
        let file_name = source_path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "Source.java".to_string());
        Self {
            source,
            file_name,
            command,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn try_compile(&self, fix: &InlineFix) -> Result<bool> {
        let edited = apply_edit(self.source, &fix.edit)?;
        let dir = tempfile::tempdir().context("failed to create speculative directory")?;
        let path = dir.path().join(&self.file_name);
        std::fs::write(&path, edited)
            .with_context(|| format!("failed to write {}", path.display()))?;

        let (program, args) = self
            .command
            .split_first()
            .context("verification command is empty")?;
        let file_arg = path.display().to_string();
        let mut child = Command::new(program)
            .args(args.iter().map(|arg| arg.replace("{file}", &file_arg)))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .with_context(|| format!("failed to spawn `{program}`"))?;

        let deadline = Instant::now() + self.timeout;
        loop {
            if let Some(status) = child.try_wait()? {
                return Ok(status.success());
            }
            if Instant::now() >= deadline {
                let _ = child.kill();
                let _ = child.wait();
                telemetry_debug!(timeout = ?self.timeout, "verification compile timed out");
                return Ok(false);
            }
            thread::sleep(POLL_INTERVAL);
        }
    }
}

impl FixVerifier for CommandVerifier<'_> {
    fn compiles_with(&self, fix: &InlineFix) -> bool {
        match self.try_compile(fix) {
            Ok(compiles) => compiles,
            Err(err) => {
                telemetry_debug!(error = %format!("{err:#}"), "verification failed to run");
                false
            }
        }
    }
}
