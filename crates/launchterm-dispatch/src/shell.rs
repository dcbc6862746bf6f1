//! Boundary to the underlying system shell.

use std::path::PathBuf;

use launchterm_types::error::Result;

/// Runs lines through a system shell.
///
/// The bridge owns its own notion of the working directory; after each run
/// the fallback trigger copies [`ShellBridge::current_dir`] into the
/// execution context.
pub trait ShellBridge: Send + Sync {
    /// Run `line` to completion. Output goes wherever the bridge sends it.
    fn run(&self, line: &str, elevated: bool) -> Result<()>;

    /// Working directory as of the end of the last run.
    fn current_dir(&self) -> PathBuf;
}
