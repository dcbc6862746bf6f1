//! Test doubles shared by the unit tests in this crate.

use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use launchterm_types::config::Preferences;
use launchterm_types::error::{LaunchError, Result};
use launchterm_types::output::{MemorySink, OutputSink};

use crate::alias::{AliasTable, MemoryAliasTable};
use crate::apps::{AppResolver, AppScope, LaunchInfo};
use crate::builtins::register_builtins;
use crate::context::{Collaborators, ExecutionContext, lock};
use crate::engine::Dispatcher;
use crate::redirect::{RedirectCommand, RedirectionListener};
use crate::registry::{ArgKind, Command, CommandOutput, CommandRegistry};
use crate::shell::ShellBridge;
use crate::worker::StopToken;

/// Shell bridge that records lines instead of running them.
///
/// `cd <dir>` changes the reported directory; `fail-in-shell` fails.
pub struct RecordingShell {
    runs: Mutex<Vec<(String, bool)>>,
    cwd: Mutex<PathBuf>,
    gate: Mutex<Option<Receiver<()>>>,
}

impl RecordingShell {
    pub fn new() -> Self {
        Self {
            runs: Mutex::new(Vec::new()),
            cwd: Mutex::new(PathBuf::from("/home")),
            gate: Mutex::new(None),
        }
    }

    /// A shell whose first run blocks until the returned sender fires.
    pub fn blocking() -> (Self, Sender<()>) {
        let (tx, rx) = mpsc::channel();
        let shell = Self::new();
        *lock(&shell.gate) = Some(rx);
        (shell, tx)
    }

    /// Completed runs, in completion order.
    pub fn runs(&self) -> Vec<(String, bool)> {
        lock(&self.runs).clone()
    }
}

impl ShellBridge for RecordingShell {
    fn run(&self, line: &str, elevated: bool) -> Result<()> {
        let gate = lock(&self.gate).take();
        if let Some(gate) = gate {
            let _ = gate.recv();
        }
        lock(&self.runs).push((line.to_string(), elevated));
        if let Some(dir) = line.strip_prefix("cd ") {
            *lock(&self.cwd) = PathBuf::from(dir);
        }
        if line == "fail-in-shell" {
            return Err(LaunchError::Shell("exit status 127".into()));
        }
        Ok(())
    }

    fn current_dir(&self) -> PathBuf {
        lock(&self.cwd).clone()
    }
}

/// App resolver over a fixed list.
///
/// Shown: Browser, Notes, Broken (launch fails). Hidden: Vault.
pub struct StaticApps {
    apps: Vec<(LaunchInfo, bool)>,
    launched: Mutex<Vec<String>>,
    uninstalled: Mutex<Vec<String>>,
}

fn info(label: &str) -> LaunchInfo {
    LaunchInfo {
        name: format!("{label}Activity"),
        package: format!("org.example.{}", label.to_lowercase()),
        label: label.to_string(),
    }
}

impl StaticApps {
    pub fn new() -> Self {
        Self {
            apps: vec![
                (info("Browser"), false),
                (info("Notes"), false),
                (info("Broken"), false),
                (info("Vault"), true),
            ],
            launched: Mutex::new(Vec::new()),
            uninstalled: Mutex::new(Vec::new()),
        }
    }

    pub fn launched(&self) -> Vec<String> {
        lock(&self.launched).clone()
    }

    pub fn uninstalled(&self) -> Vec<String> {
        lock(&self.uninstalled).clone()
    }

    fn in_scope(&self, scope: AppScope) -> impl Iterator<Item = &LaunchInfo> {
        self.apps
            .iter()
            .filter(move |(_, hidden)| match scope {
                AppScope::Shown => !hidden,
                AppScope::Hidden => *hidden,
                AppScope::All => true,
            })
            .map(|(info, _)| info)
    }
}

impl AppResolver for StaticApps {
    fn find_by_label(&self, text: &str, scope: AppScope) -> Option<LaunchInfo> {
        self.in_scope(scope)
            .find(|i| i.label.eq_ignore_ascii_case(text))
            .cloned()
    }

    fn search(&self, query: &str, scope: AppScope) -> Vec<LaunchInfo> {
        let query = query.to_lowercase();
        let mut found: Vec<LaunchInfo> = self
            .in_scope(scope)
            .filter(|i| i.label.to_lowercase().contains(&query))
            .cloned()
            .collect();
        found.sort_by(|a, b| a.label.cmp(&b.label));
        found
    }

    fn launch(&self, info: &LaunchInfo) -> Result<()> {
        if info.label == "Broken" {
            return Err(LaunchError::App("Broken: no launcher activity".into()));
        }
        lock(&self.launched).push(info.label.clone());
        Ok(())
    }

    fn uninstall(&self, info: &LaunchInfo) -> Result<()> {
        lock(&self.uninstalled).push(info.label.clone());
        Ok(())
    }

    fn refresh(&self) -> Result<()> {
        Ok(())
    }
}

/// Records listener calls as `request:<name>` / `end:<name>`.
#[derive(Default)]
pub struct ListenerLog {
    events: Mutex<Vec<String>>,
}

impl ListenerLog {
    pub fn events(&self) -> Vec<String> {
        lock(&self.events).clone()
    }
}

impl RedirectionListener for ListenerLog {
    fn on_redirection_request(&self, command: &dyn RedirectCommand) {
        lock(&self.events).push(format!("request:{}", command.name()));
    }

    fn on_redirection_end(&self, command: &dyn RedirectCommand) {
        lock(&self.events).push(format!("end:{}", command.name()));
    }
}

/// `list [words...]` replies `listing <words>`.
struct ListCmd;
impl Command for ListCmd {
    fn name(&self) -> &str {
        "list"
    }
    fn description(&self) -> &str {
        "Echo a listing"
    }
    fn usage(&self) -> &str {
        "list [args...]"
    }
    fn max_args(&self) -> usize {
        1
    }
    fn arg_shape(&self) -> &[ArgKind] {
        &[ArgKind::Rest]
    }
    fn execute(
        &self,
        args: &[String],
        _ctx: &ExecutionContext,
        _stop: &StopToken,
    ) -> Result<CommandOutput> {
        Ok(CommandOutput::Text(format!("listing {}", args.join(" "))))
    }
}

/// Always fails while executing.
struct ExplodeCmd;
impl Command for ExplodeCmd {
    fn name(&self) -> &str {
        "explode"
    }
    fn description(&self) -> &str {
        "Fail"
    }
    fn usage(&self) -> &str {
        "explode"
    }
    fn execute(
        &self,
        _args: &[String],
        _ctx: &ExecutionContext,
        _stop: &StopToken,
    ) -> Result<CommandOutput> {
        Err(LaunchError::Command("kaboom".into()))
    }
}

/// Takes a while after claiming.
struct SlowCmd;
impl Command for SlowCmd {
    fn name(&self) -> &str {
        "slow"
    }
    fn description(&self) -> &str {
        "Sleep, then reply"
    }
    fn usage(&self) -> &str {
        "slow"
    }
    fn execute(
        &self,
        _args: &[String],
        _ctx: &ExecutionContext,
        _stop: &StopToken,
    ) -> Result<CommandOutput> {
        thread::sleep(Duration::from_millis(100));
        Ok(CommandOutput::Text("slow done".into()))
    }
}

/// Runs until asked to stop.
struct SpinCmd;
impl Command for SpinCmd {
    fn name(&self) -> &str {
        "spin"
    }
    fn description(&self) -> &str {
        "Loop until stopped"
    }
    fn usage(&self) -> &str {
        "spin"
    }
    fn execute(
        &self,
        _args: &[String],
        _ctx: &ExecutionContext,
        stop: &StopToken,
    ) -> Result<CommandOutput> {
        while !stop.is_stopped() {
            thread::sleep(Duration::from_millis(1));
        }
        Ok(CommandOutput::Text("spin stopped".into()))
    }
}

/// A dispatcher wired to test doubles, with handles to each of them.
pub struct Harness {
    pub dispatcher: Dispatcher,
    pub sink: Arc<MemorySink>,
    pub shell: Arc<RecordingShell>,
    pub apps: Arc<StaticApps>,
    pub aliases: Arc<MemoryAliasTable>,
}

impl Harness {
    pub fn new() -> Self {
        Self::build(RecordingShell::new(), Preferences::default())
    }

    pub fn with_prefs(edit: impl FnOnce(&mut Preferences)) -> Self {
        let mut prefs = Preferences::default();
        edit(&mut prefs);
        Self::build(RecordingShell::new(), prefs)
    }

    pub fn with_blocking_shell() -> (Self, Sender<()>) {
        let (shell, release) = RecordingShell::blocking();
        (Self::build(shell, Preferences::default()), release)
    }

    fn build(shell: RecordingShell, prefs: Preferences) -> Self {
        let sink = Arc::new(MemorySink::new());
        let shell = Arc::new(shell);
        let apps = Arc::new(StaticApps::new());
        let aliases = Arc::new(MemoryAliasTable::new());

        let mut registry = CommandRegistry::new();
        register_builtins(&mut registry);
        registry.register(Box::new(ListCmd));
        registry.register(Box::new(ExplodeCmd));
        registry.register(Box::new(SlowCmd));
        registry.register(Box::new(SpinCmd));

        let ctx = ExecutionContext::new(
            registry,
            Collaborators {
                aliases: Arc::clone(&aliases) as Arc<dyn AliasTable>,
                shell: Arc::clone(&shell) as Arc<dyn ShellBridge>,
                apps: Arc::clone(&apps) as Arc<dyn AppResolver>,
                output: Arc::clone(&sink) as Arc<dyn OutputSink>,
            },
            prefs,
        );
        Self {
            dispatcher: Dispatcher::new(ctx),
            sink,
            shell,
            apps,
            aliases,
        }
    }
}
