//! Shell bridge backed by a real shell process.

use std::path::PathBuf;
use std::process::Command;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use launchterm_dispatch::ShellBridge;
use launchterm_types::config::ShellPrefs;
use launchterm_types::error::{LaunchError, Result};
use launchterm_types::output::{OutputCategory, OutputSink};

/// Marks the line carrying the shell's final working directory.
const CWD_MARKER: &str = "__launchterm_cwd__:";

/// Runs each line as `<program> -c <line>` and forwards its output.
///
/// Every run starts in the directory the previous run ended in, so `cd`
/// sticks across lines even though each line is a fresh process.
pub struct ProcessShell {
    program: String,
    root_program: Option<String>,
    cwd: Mutex<PathBuf>,
    output: Arc<dyn OutputSink>,
}

impl ProcessShell {
    pub fn new(prefs: &ShellPrefs, start_dir: PathBuf, output: Arc<dyn OutputSink>) -> Self {
        Self {
            program: prefs.program.clone(),
            root_program: prefs.root_program.clone(),
            cwd: Mutex::new(start_dir),
            output,
        }
    }

    fn lock_cwd(&self) -> MutexGuard<'_, PathBuf> {
        self.cwd.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn program(&self, elevated: bool) -> &str {
        match (&self.root_program, elevated) {
            (Some(root), true) => root,
            _ => &self.program,
        }
    }
}

/// Wrap `line` so the shell reports its final directory and keeps the
/// line's exit status.
fn wrap_script(line: &str) -> String {
    format!(
        "{line}\n__launchterm_status=$?\nprintf '\\n{CWD_MARKER}%s\\n' \"$PWD\"\nexit $__launchterm_status"
    )
}

/// Split shell stdout into visible text and the reported directory.
fn split_marker(stdout: &str) -> (String, Option<PathBuf>) {
    let mut cwd = None;
    let mut lines = Vec::new();
    for line in stdout.lines() {
        match line.strip_prefix(CWD_MARKER) {
            Some(dir) => cwd = Some(PathBuf::from(dir)),
            None => lines.push(line),
        }
    }
    let text = lines.join("\n").trim_end().to_string();
    (text, cwd)
}

impl ShellBridge for ProcessShell {
    fn run(&self, line: &str, elevated: bool) -> Result<()> {
        let program = self.program(elevated);
        let cwd = self.current_dir();
        log::debug!("Running '{line}' with {program} in {}", cwd.display());

        let out = Command::new(program)
            .arg("-c")
            .arg(wrap_script(line))
            .current_dir(&cwd)
            .output()
            .map_err(|e| LaunchError::Shell(format!("failed to start '{program}': {e}")))?;

        let (text, new_cwd) = split_marker(&String::from_utf8_lossy(&out.stdout));
        if !text.is_empty() {
            self.output.on_output(&text, OutputCategory::Output);
        }
        let stderr = String::from_utf8_lossy(&out.stderr);
        let stderr = stderr.trim_end();
        if !stderr.is_empty() {
            self.output.on_output(stderr, OutputCategory::Output);
        }
        if let Some(dir) = new_cwd {
            *self.lock_cwd() = dir;
        }

        if out.status.success() {
            Ok(())
        } else {
            Err(LaunchError::Shell(match out.status.code() {
                Some(code) => format!("'{line}' exited with status {code}"),
                None => format!("'{line}' was terminated by a signal"),
            }))
        }
    }

    fn current_dir(&self) -> PathBuf {
        self.lock_cwd().clone()
    }
}
