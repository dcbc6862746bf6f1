//! The four resolution strategies of the trigger chain.
//!
//! Order is fixed by the dispatcher: alias, built-in, application label,
//! system shell. The shell trigger claims everything, so it must be last.

use std::sync::{Arc, mpsc};

use launchterm_types::error::{LaunchError, Result};
use launchterm_types::output::OutputCategory;

use crate::apps::{AppScope, launch_with_notice};
use crate::context::ExecutionContext;
use crate::engine::DispatchScope;
use crate::registry::{CommandOutput, Resolved};
use crate::worker::StopToken;

/// Outcome of asking a trigger about a line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Claim {
    /// The trigger handled the line; the text (if any) is the dispatch result.
    Claimed(Option<String>),
    /// Try the next trigger.
    NotClaimed,
}

/// One resolution strategy.
///
/// An `Err` from `attempt` aborts the chain walk for this line and becomes
/// a diagnostic. Failures after claiming are reported as output instead.
pub trait Trigger: Send + Sync {
    fn name(&self) -> &'static str;

    fn attempt(&self, input: &str, scope: &DispatchScope<'_>) -> Result<Claim>;
}

// ---------------------------------------------------------------------------
// alias
// ---------------------------------------------------------------------------

/// Claims exact alias names and dispatches their expansion instead.
pub struct AliasTrigger;

impl Trigger for AliasTrigger {
    fn name(&self) -> &'static str {
        "alias"
    }

    fn attempt(&self, input: &str, scope: &DispatchScope<'_>) -> Result<Claim> {
        let ctx = scope.context();
        let Some(expansion) = ctx.aliases.lookup(input) else {
            return Ok(Claim::NotClaimed);
        };
        if ctx.prefs.behavior.show_alias_content {
            ctx.emit(
                &format!("{input} --> [{expansion}]"),
                OutputCategory::Output,
            );
        }
        log::debug!("Alias '{input}' -> '{expansion}'");
        Ok(Claim::Claimed(scope.redispatch(&expansion)?))
    }
}

// ---------------------------------------------------------------------------
// built-in
// ---------------------------------------------------------------------------

/// Claims lines naming a registered built-in with acceptable arguments.
///
/// Resolution and execution both happen on a worker. The calling thread
/// waits only for the claim decision, delivered over a one-shot channel;
/// the command then keeps running and writes its result to the sink.
/// Commands that start a session report the claim after they finish.
pub struct BuiltinTrigger;

impl Trigger for BuiltinTrigger {
    fn name(&self) -> &'static str {
        "builtin"
    }

    fn attempt(&self, input: &str, scope: &DispatchScope<'_>) -> Result<Claim> {
        let ctx = Arc::clone(scope.context());
        let line = input.to_string();
        let (claim_tx, claim_rx) = mpsc::sync_channel::<bool>(1);

        scope.spawn_worker("builtin", move |stop| {
            ctx.set_last_command(&line);
            // A send fails only if the dispatcher stopped waiting.
            let Some(resolved) = ctx.registry.resolve(&line) else {
                let _ = claim_tx.send(false);
                return;
            };
            let early = resolved.command.starts_session();
            if !early {
                let _ = claim_tx.send(true);
            }
            run_resolved(&resolved, &ctx, &stop);
            if early {
                let _ = claim_tx.send(true);
            }
        })?;

        match claim_rx.recv() {
            Ok(true) => Ok(Claim::Claimed(None)),
            Ok(false) => Ok(Claim::NotClaimed),
            Err(_) => Err(LaunchError::Worker(format!(
                "built-in worker for '{input}' exited before deciding"
            ))),
        }
    }
}

/// Execute a resolved built-in and report its result to the sink.
fn run_resolved(resolved: &Resolved, ctx: &ExecutionContext, stop: &StopToken) {
    match resolved.command.execute(&resolved.args, ctx, stop) {
        Ok(CommandOutput::Text(text)) => ctx.emit(&text, OutputCategory::Output),
        Ok(CommandOutput::None) => {},
        Err(e) => {
            log::warn!("Built-in '{}' failed: {e}", resolved.command.name());
            ctx.emit(&format!("error: {e}"), OutputCategory::Output);
        },
    }
}

// ---------------------------------------------------------------------------
// application label
// ---------------------------------------------------------------------------

/// Claims lines that are exactly the label of a shown application.
pub struct AppTrigger;

impl Trigger for AppTrigger {
    fn name(&self) -> &'static str {
        "app"
    }

    fn attempt(&self, input: &str, scope: &DispatchScope<'_>) -> Result<Claim> {
        let ctx = scope.context();
        let Some(info) = ctx.apps.find_by_label(input, AppScope::Shown) else {
            return Ok(Claim::NotClaimed);
        };
        launch_with_notice(ctx, &info)?;
        Ok(Claim::Claimed(None))
    }
}

// ---------------------------------------------------------------------------
// system shell
// ---------------------------------------------------------------------------

/// Claims everything; runs the line through the shell bridge on a worker.
pub struct ShellTrigger;

impl Trigger for ShellTrigger {
    fn name(&self) -> &'static str {
        "shell"
    }

    fn attempt(&self, input: &str, scope: &DispatchScope<'_>) -> Result<Claim> {
        let ctx = Arc::clone(scope.context());
        let line = input.to_string();
        let elevated = ctx.prefs.shell.elevated;

        scope.spawn_worker("shell", move |_stop| {
            if let Err(e) = ctx.shell.run(&line, elevated) {
                log::warn!("Shell run of '{line}' failed: {e}");
                ctx.emit(&format!("error: {e}"), OutputCategory::Output);
            }
            ctx.set_cwd(ctx.shell.current_dir());
        })?;
        Ok(Claim::Claimed(None))
    }
}
