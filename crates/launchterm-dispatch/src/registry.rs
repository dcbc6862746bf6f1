//! Built-in command trait and registry.
//!
//! The registry only answers "which command is this line, and are its
//! arguments acceptable". Running the command is the built-in trigger's job.

use std::collections::HashMap;
use std::sync::Arc;

use launchterm_types::error::Result;

use crate::context::ExecutionContext;
use crate::worker::StopToken;

/// Output produced by a command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandOutput {
    /// Plain text.
    Text(String),
    /// Command produced no visible output.
    None,
}

/// Expected kind of one positional argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgKind {
    /// Any single word.
    Text,
    /// A signed integer.
    Int,
    /// Every remaining word, joined by spaces, as one argument.
    Rest,
}

/// A single built-in command.
pub trait Command: Send + Sync {
    /// The command name (what the user types).
    fn name(&self) -> &str;

    /// One-line description for `help`.
    fn description(&self) -> &str;

    /// Usage string (e.g. "uninstall <label>").
    fn usage(&self) -> &str;

    /// Fewest arguments accepted.
    fn min_args(&self) -> usize {
        0
    }

    /// Most arguments accepted, counting a `Rest` argument as one.
    fn max_args(&self) -> usize {
        0
    }

    /// Kind of each positional argument. Missing entries default to `Text`.
    fn arg_shape(&self) -> &[ArgKind] {
        &[]
    }

    /// Breaks name conflicts at registration; higher wins.
    fn priority(&self) -> i32 {
        0
    }

    /// Whether the command may start a redirection session.
    ///
    /// Such commands run to completion before the claim is reported, so
    /// the session is active by the time `dispatch` returns.
    fn starts_session(&self) -> bool {
        false
    }

    /// Execute the command. Runs on a worker thread.
    fn execute(
        &self,
        args: &[String],
        ctx: &ExecutionContext,
        stop: &StopToken,
    ) -> Result<CommandOutput>;
}

/// A line that named a registered command with acceptable arguments.
pub struct Resolved {
    pub command: Arc<dyn Command>,
    pub args: Vec<String>,
}

impl std::fmt::Debug for Resolved {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Resolved")
            .field("command", &self.command.name())
            .field("args", &self.args)
            .finish()
    }
}

/// Registry of built-in commands, keyed by lowercase name.
#[derive(Default)]
pub struct CommandRegistry {
    commands: HashMap<String, Arc<dyn Command>>,
}

impl CommandRegistry {
    /// Create an empty command registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a command.
    ///
    /// If a command with the same name exists, the one with the higher
    /// priority stays; on a tie the new one replaces the old.
    pub fn register(&mut self, cmd: Box<dyn Command>) {
        let key = cmd.name().to_lowercase();
        if let Some(existing) = self.commands.get(&key) {
            if existing.priority() > cmd.priority() {
                log::debug!("Keeping '{key}' (priority {})", existing.priority());
                return;
            }
        }
        self.commands.insert(key, Arc::from(cmd));
    }

    /// Look up a command by name (case-insensitive).
    pub fn get(&self, name: &str) -> Option<Arc<dyn Command>> {
        self.commands.get(&name.to_lowercase()).map(Arc::clone)
    }

    /// All registered commands, sorted by name.
    pub fn commands(&self) -> Vec<Arc<dyn Command>> {
        let mut cmds: Vec<_> = self.commands.values().map(Arc::clone).collect();
        cmds.sort_by(|a, b| a.name().cmp(b.name()));
        cmds
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Resolve a normalized line to a command and validated arguments.
    ///
    /// Returns `None` for an unknown name or arguments that do not fit the
    /// command's arity and shape.
    pub fn resolve(&self, line: &str) -> Option<Resolved> {
        let mut words = line.split_whitespace();
        let name = words.next()?;
        let command = self.get(name)?;
        let words: Vec<&str> = words.collect();
        let args = shape_args(&words, command.arg_shape())?;
        if args.len() < command.min_args() || args.len() > command.max_args() {
            return None;
        }
        Some(Resolved { command, args })
    }
}

/// Apply an argument shape to raw words.
fn shape_args(words: &[&str], shape: &[ArgKind]) -> Option<Vec<String>> {
    let mut args = Vec::with_capacity(words.len());
    for (i, word) in words.iter().enumerate() {
        match shape.get(i).copied().unwrap_or(ArgKind::Text) {
            ArgKind::Text => args.push((*word).to_string()),
            ArgKind::Int => {
                word.parse::<i64>().ok()?;
                args.push((*word).to_string());
            },
            ArgKind::Rest => {
                args.push(words[i..].join(" "));
                break;
            },
        }
    }
    Some(args)
}
