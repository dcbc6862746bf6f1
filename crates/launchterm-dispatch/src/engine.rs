//! The dispatch entry point.

use std::sync::Arc;

use launchterm_types::error::{LaunchError, Result};
use launchterm_types::output::OutputCategory;

use crate::context::ExecutionContext;
use crate::redirect::RedirectionListener;
use crate::trigger::{AliasTrigger, AppTrigger, BuiltinTrigger, Claim, ShellTrigger, Trigger};
use crate::worker::{StopToken, WorkerSet};

/// Deepest alias-of-alias chain followed before giving up.
pub const MAX_ALIAS_DEPTH: usize = 16;

/// Trim a line and collapse every run of whitespace to one space.
pub fn normalize(raw: &str) -> String {
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Routes each input line to the active redirection session or the
/// trigger chain.
pub struct Dispatcher {
    ctx: Arc<ExecutionContext>,
    triggers: [Box<dyn Trigger>; 4],
    workers: WorkerSet,
}

/// What a trigger sees of the dispatcher during one `attempt`.
pub struct DispatchScope<'a> {
    dispatcher: &'a Dispatcher,
    depth: usize,
}

impl DispatchScope<'_> {
    pub fn context(&self) -> &Arc<ExecutionContext> {
        &self.dispatcher.ctx
    }

    /// Dispatch `text` as if it had been typed, one alias level deeper.
    pub fn redispatch(&self, text: &str) -> Result<Option<String>> {
        if self.depth >= MAX_ALIAS_DEPTH {
            return Err(LaunchError::Alias(format!(
                "expansion nested deeper than {MAX_ALIAS_DEPTH} levels"
            )));
        }
        Ok(self.dispatcher.dispatch_at(text, self.depth + 1))
    }

    /// Start a worker thread tracked by the dispatcher.
    pub fn spawn_worker<F>(&self, name: &str, f: F) -> Result<()>
    where
        F: FnOnce(StopToken) + Send + 'static,
    {
        self.dispatcher.workers.spawn(name, f)
    }
}

impl Dispatcher {
    /// Create a dispatcher with the standard trigger chain.
    pub fn new(ctx: ExecutionContext) -> Self {
        Self {
            ctx: Arc::new(ctx),
            triggers: [
                Box::new(AliasTrigger),
                Box::new(BuiltinTrigger),
                Box::new(AppTrigger),
                // Claims unconditionally; keep last.
                Box::new(ShellTrigger),
            ],
            workers: WorkerSet::new(),
        }
    }

    pub fn context(&self) -> &Arc<ExecutionContext> {
        &self.ctx
    }

    /// Trigger names in chain order.
    pub fn trigger_names(&self) -> [&'static str; 4] {
        [
            self.triggers[0].name(),
            self.triggers[1].name(),
            self.triggers[2].name(),
            self.triggers[3].name(),
        ]
    }

    /// Dispatch one line and return its immediate textual result.
    ///
    /// Work done on workers reports through the output sink instead. Any
    /// failure comes back as an `error: ...` string.
    pub fn dispatch(&self, raw: &str) -> Option<String> {
        self.dispatch_at(raw, 0)
    }

    /// Input sink: dispatch `line` and push a returned result to the
    /// output sink.
    pub fn submit(&self, line: &str) {
        if let Some(text) = self.dispatch(line) {
            if !text.is_empty() {
                self.ctx.emit(&text, OutputCategory::Output);
            }
        }
    }

    /// A permission the active session needed was denied.
    pub fn permission_denied(&self) {
        if self.ctx.redirector.cleanup() {
            log::info!("Permission denied; redirection cancelled");
        }
    }

    pub fn set_redirection_listener(&self, listener: Arc<dyn RedirectionListener>) {
        self.ctx.redirector.set_listener(listener);
    }

    /// Number of workers still running.
    pub fn active_workers(&self) -> usize {
        self.workers.active()
    }

    /// Ask every running worker to stop. Workers may ignore it.
    pub fn stop_workers(&self) {
        self.workers.stop_all();
    }

    /// Block until every worker started so far has finished.
    pub fn join_workers(&self) {
        self.workers.join_all();
    }

    fn dispatch_at(&self, raw: &str, depth: usize) -> Option<String> {
        let input = normalize(raw);

        if let Some(reply) = self.ctx.redirector.feed(&input, &self.ctx) {
            return match reply {
                Ok(text) => text,
                Err(e) => Some(format!("error: {e}")),
            };
        }

        if input.is_empty() {
            return None;
        }

        let scope = DispatchScope {
            dispatcher: self,
            depth,
        };
        for trigger in &self.triggers {
            match trigger.attempt(&input, &scope) {
                Ok(Claim::Claimed(out)) => {
                    log::debug!("'{input}' claimed by {} trigger", trigger.name());
                    return out;
                },
                Ok(Claim::NotClaimed) => {},
                Err(e) => {
                    log::warn!("{} trigger failed on '{input}': {e}", trigger.name());
                    return Some(format!("error: {e}"));
                },
            }
        }
        None
    }
}
