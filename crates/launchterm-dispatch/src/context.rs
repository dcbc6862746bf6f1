//! The execution context shared by every trigger and command.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use launchterm_types::config::Preferences;
use launchterm_types::output::{OutputCategory, OutputSink};

use crate::alias::AliasTable;
use crate::apps::AppResolver;
use crate::redirect::Redirector;
use crate::registry::CommandRegistry;
use crate::shell::ShellBridge;

/// External services the interpreter calls into.
pub struct Collaborators {
    pub aliases: Arc<dyn AliasTable>,
    pub shell: Arc<dyn ShellBridge>,
    pub apps: Arc<dyn AppResolver>,
    pub output: Arc<dyn OutputSink>,
}

/// Shared mutable state passed to every trigger and built-in command.
///
/// One instance lives for the whole interpreter, behind an `Arc` so worker
/// threads can hold it. Working directory and last-command label are
/// written by workers and read by later dispatches; each sits behind its
/// own mutex.
pub struct ExecutionContext {
    cwd: Mutex<PathBuf>,
    last_command: Mutex<Option<String>>,
    /// Alias table.
    pub aliases: Arc<dyn AliasTable>,
    /// System shell bridge.
    pub shell: Arc<dyn ShellBridge>,
    /// Installed-application resolver.
    pub apps: Arc<dyn AppResolver>,
    /// Where results and notifications go.
    pub output: Arc<dyn OutputSink>,
    /// Built-in commands.
    pub registry: CommandRegistry,
    /// Display toggles and templates.
    pub prefs: Preferences,
    /// The single redirection session slot.
    pub redirector: Redirector,
}

impl ExecutionContext {
    /// Build a context. The working directory starts at the shell bridge's.
    pub fn new(registry: CommandRegistry, collab: Collaborators, prefs: Preferences) -> Self {
        let cwd = collab.shell.current_dir();
        Self {
            cwd: Mutex::new(cwd),
            last_command: Mutex::new(None),
            aliases: collab.aliases,
            shell: collab.shell,
            apps: collab.apps,
            output: collab.output,
            registry,
            prefs,
            redirector: Redirector::new(),
        }
    }

    /// Current working directory.
    pub fn cwd(&self) -> PathBuf {
        lock(&self.cwd).clone()
    }

    /// Replace the working directory.
    pub fn set_cwd(&self, path: impl AsRef<Path>) {
        *lock(&self.cwd) = path.as_ref().to_path_buf();
    }

    /// Label of the most recent line handed to the built-in trigger.
    pub fn last_command(&self) -> Option<String> {
        lock(&self.last_command).clone()
    }

    pub fn set_last_command(&self, line: &str) {
        *lock(&self.last_command) = Some(line.to_string());
    }

    /// Push text to the output sink.
    pub fn emit(&self, text: &str, category: OutputCategory) {
        self.output.on_output(text, category);
    }
}

/// Lock a mutex, recovering the data if a holder panicked.
pub(crate) fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    match m.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}
