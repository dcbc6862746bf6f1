//! Line front end: recall, periodic messages and the prompt.

use std::sync::{Arc, Mutex};

use launchterm_dispatch::{Dispatcher, History, RedirectCommand, RedirectionListener};
use launchterm_types::config::{Messager, TerminalPrefs};
use launchterm_types::output::{OutputCategory, OutputSink};

/// Repeats the previous line.
const RECALL: &str = "!!";

// ---- prompt hint ----

/// Remembers which redirected command is waiting for input.
#[derive(Default)]
struct HintListener {
    active: Mutex<Option<String>>,
}

impl HintListener {
    fn active(&self) -> Option<String> {
        match self.active.lock() {
            Ok(a) => a.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    fn set(&self, value: Option<String>) {
        match self.active.lock() {
            Ok(mut a) => *a = value,
            Err(poisoned) => *poisoned.into_inner() = value,
        }
    }
}

impl RedirectionListener for HintListener {
    fn on_redirection_request(&self, command: &dyn RedirectCommand) {
        self.set(Some(command.name().to_string()));
    }

    fn on_redirection_end(&self, _command: &dyn RedirectCommand) {
        self.set(None);
    }
}

// ---- terminal ----

/// Feeds user lines into the dispatcher.
pub struct Terminal {
    dispatcher: Dispatcher,
    output: Arc<dyn OutputSink>,
    history: History,
    messagers: Vec<Messager>,
    submitted: usize,
    hint: Arc<HintListener>,
}

impl Terminal {
    pub fn new(dispatcher: Dispatcher, output: Arc<dyn OutputSink>, prefs: &TerminalPrefs) -> Self {
        let hint = Arc::new(HintListener::default());
        dispatcher.set_redirection_listener(Arc::clone(&hint) as Arc<dyn RedirectionListener>);
        let messagers = prefs
            .messagers
            .iter()
            .filter(|m| m.every > 0)
            .cloned()
            .collect();
        Self {
            dispatcher,
            output,
            history: History::new(prefs.history_size),
            messagers,
            submitted: 0,
            hint,
        }
    }

    /// Handle one raw input line.
    ///
    /// `!!` repeats the previous line. Blank lines skip history and
    /// messagers but still reach the dispatcher, where an active session
    /// may consume them.
    pub fn submit(&mut self, raw: &str) {
        let mut line = raw.trim().to_string();
        if line == RECALL {
            match self.history.back() {
                Some(prev) => line = prev.to_string(),
                None => {
                    self.output
                        .on_output("No previous command.", OutputCategory::Output);
                    return;
                },
            }
        }
        if !line.is_empty() {
            self.submitted += 1;
            for m in &self.messagers {
                if self.submitted % m.every == 0 {
                    self.output.on_output(&m.message, OutputCategory::Output);
                }
            }
            self.output.on_output(&line, OutputCategory::Input);
            self.history.push(&line);
        }
        self.dispatcher.submit(&line);
    }

    /// `[command] > ` while a session waits for input, else `<cwd> > `.
    pub fn prompt(&self) -> String {
        match self.hint.active() {
            Some(name) => format!("[{name}] > "),
            None => format!("{} > ", self.dispatcher.context().cwd().display()),
        }
    }

    /// Wait for running workers to finish.
    pub fn shutdown(&self) {
        self.dispatcher.join_workers();
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use launchterm_dispatch::{
        AliasTable, AppResolver, AppScope, Collaborators, CommandRegistry, ExecutionContext,
        LaunchInfo, MemoryAliasTable, ShellBridge, register_builtins,
    };
    use launchterm_types::config::Preferences;
    use launchterm_types::error::Result;
    use launchterm_types::output::MemorySink;

    use super::*;

    struct NoShell;
    impl ShellBridge for NoShell {
        fn run(&self, _line: &str, _elevated: bool) -> Result<()> {
            Ok(())
        }
        fn current_dir(&self) -> PathBuf {
            PathBuf::from("/work")
        }
    }

    struct TwoApps;
    impl AppResolver for TwoApps {
        fn find_by_label(&self, _text: &str, _scope: AppScope) -> Option<LaunchInfo> {
            None
        }
        fn search(&self, _query: &str, _scope: AppScope) -> Vec<LaunchInfo> {
            ["Maps", "Mail"]
                .iter()
                .map(|l| LaunchInfo {
                    name: format!("{l}Main"),
                    package: String::new(),
                    label: l.to_string(),
                })
                .collect()
        }
        fn launch(&self, _info: &LaunchInfo) -> Result<()> {
            Ok(())
        }
        fn uninstall(&self, _info: &LaunchInfo) -> Result<()> {
            Ok(())
        }
        fn refresh(&self) -> Result<()> {
            Ok(())
        }
    }

    fn terminal(prefs: TerminalPrefs) -> (Terminal, Arc<MemorySink>) {
        let sink = Arc::new(MemorySink::new());
        let mut registry = CommandRegistry::new();
        register_builtins(&mut registry);
        let ctx = ExecutionContext::new(
            registry,
            Collaborators {
                aliases: Arc::new(MemoryAliasTable::new()) as Arc<dyn AliasTable>,
                shell: Arc::new(NoShell) as Arc<dyn ShellBridge>,
                apps: Arc::new(TwoApps) as Arc<dyn AppResolver>,
                output: Arc::clone(&sink) as Arc<dyn OutputSink>,
            },
            Preferences::default(),
        );
        let output = Arc::clone(&sink) as Arc<dyn OutputSink>;
        (Terminal::new(Dispatcher::new(ctx), output, &prefs), sink)
    }

    #[test]
    fn submit_echoes_and_records() {
        let (mut t, sink) = terminal(TerminalPrefs::default());
        t.submit("  pwd  ");
        t.shutdown();
        assert_eq!(
            sink.entries(),
            vec![
                ("pwd".to_string(), OutputCategory::Input),
                ("/work".to_string(), OutputCategory::Output),
            ]
        );
        assert_eq!(t.history.back(), Some("pwd"));
    }

    #[test]
    fn recall_repeats_previous_line() {
        let (mut t, sink) = terminal(TerminalPrefs::default());
        t.submit("!!");
        assert_eq!(sink.texts(), vec!["No previous command."]);
        sink.clear();

        t.submit("pwd");
        t.shutdown();
        t.submit("!!");
        t.shutdown();
        assert_eq!(sink.texts(), vec!["pwd", "/work", "pwd", "/work"]);
        assert_eq!(t.history.len(), 2);
    }

    #[test]
    fn blank_lines_skip_history() {
        let (mut t, sink) = terminal(TerminalPrefs::default());
        t.submit("   ");
        assert!(t.history.is_empty());
        assert!(sink.entries().is_empty());
    }

    #[test]
    fn messagers_fire_every_n_commands() {
        let prefs = TerminalPrefs {
            history_size: 10,
            messagers: vec![
                Messager {
                    every: 2,
                    message: "tip".to_string(),
                },
                Messager {
                    every: 0,
                    message: "never".to_string(),
                },
            ],
        };
        let (mut t, sink) = terminal(prefs);
        for _ in 0..4 {
            t.submit("aliases");
            t.shutdown();
        }
        let tips = sink.texts().iter().filter(|s| *s == "tip").count();
        assert_eq!(tips, 2);
        assert!(!sink.texts().iter().any(|s| s == "never"));
    }

    #[test]
    fn prompt_follows_sessions() {
        let (mut t, _sink) = terminal(TerminalPrefs::default());
        assert_eq!(t.prompt(), "/work > ");
        t.submit("pick ma");
        t.shutdown();
        assert_eq!(t.prompt(), "[pick] > ");
        t.submit("q");
        assert_eq!(t.prompt(), "/work > ");
    }
}
