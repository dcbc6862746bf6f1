//! launchterm entry point.
//!
//! Reads lines from stdin and hands each one to the dispatcher: aliases,
//! then built-in commands, then app labels, then the system shell.
//! Output is printed as it arrives. EOF waits for running work and exits.

mod aliases;
mod apps;
mod shell;
mod sink;
mod terminal;

use std::io::{BufRead, IsTerminal, Write};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};

use aliases::FileAliasTable;
use apps::ConfigAppResolver;
use launchterm_dispatch::{
    AliasTable, AppResolver, Collaborators, CommandRegistry, Dispatcher, ExecutionContext,
    MemoryAliasTable, ShellBridge, register_builtins,
};
use launchterm_types::config::Preferences;
use launchterm_types::output::OutputSink;
use shell::ProcessShell;
use sink::StdoutSink;
use terminal::Terminal;

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    // Resolve config from CLI arg or LAUNCHTERM_CONFIG; defaults otherwise.
    let config_path = std::env::args()
        .nth(1)
        .or_else(|| std::env::var("LAUNCHTERM_CONFIG").ok())
        .map(PathBuf::from);
    let prefs = match &config_path {
        Some(path) => Preferences::load(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => Preferences::default(),
    };
    log::info!(
        "Starting launchterm ({} apps, shell {})",
        prefs.apps.len(),
        prefs.shell.program
    );

    let stdin = std::io::stdin();
    let interactive = stdin.is_terminal();
    let output: Arc<dyn OutputSink> = Arc::new(StdoutSink::new(!interactive));

    let start_dir = std::env::current_dir().context("reading current directory")?;
    let shell = ProcessShell::new(&prefs.shell, start_dir, Arc::clone(&output));

    let aliases: Arc<dyn AliasTable> = match &prefs.paths.aliases {
        Some(path) => Arc::new(
            FileAliasTable::open(path.clone())
                .with_context(|| format!("loading aliases {}", path.display()))?,
        ),
        None => Arc::new(MemoryAliasTable::new()),
    };
    let apps = Arc::new(ConfigAppResolver::new(config_path, prefs.apps.clone()));

    let mut registry = CommandRegistry::new();
    register_builtins(&mut registry);
    log::info!("Registered {} commands", registry.len());

    let terminal_prefs = prefs.terminal.clone();
    let ctx = ExecutionContext::new(
        registry,
        Collaborators {
            aliases,
            shell: Arc::new(shell) as Arc<dyn ShellBridge>,
            apps: Arc::clone(&apps) as Arc<dyn AppResolver>,
            output: Arc::clone(&output),
        },
        prefs,
    );
    let mut terminal = Terminal::new(Dispatcher::new(ctx), output, &terminal_prefs);

    let mut line = String::new();
    loop {
        if interactive {
            let mut out = std::io::stdout().lock();
            write!(out, "{}", terminal.prompt())?;
            out.flush()?;
        }
        line.clear();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }
        terminal.submit(&line);
    }

    terminal.shutdown();
    log::info!("launchterm exiting ({} launched apps still running)", apps.running());
    Ok(())
}
