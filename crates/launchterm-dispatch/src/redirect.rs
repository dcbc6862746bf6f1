//! Redirection sessions: commands that consume several input lines.
//!
//! At most one session exists at a time. While it is active every
//! submitted line goes to the session's continuation instead of the
//! trigger chain. The slot is guarded by a single mutex; continuations and
//! listeners always run with that mutex released.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use launchterm_types::error::{LaunchError, Result};

use crate::context::{ExecutionContext, lock};

/// What the session should do after a continuation returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RedirectStep {
    /// Stay active; the next line is session data.
    Continue,
    /// Stay active; the next line is a yes/no gate answer.
    AwaitPermission,
    /// End the session.
    Finish,
}

/// Result of feeding one line to a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedirectReply {
    pub text: Option<String>,
    pub step: RedirectStep,
}

impl RedirectReply {
    pub fn continue_with(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            step: RedirectStep::Continue,
        }
    }

    pub fn await_permission(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            step: RedirectStep::AwaitPermission,
        }
    }

    pub fn finish(text: Option<String>) -> Self {
        Self {
            text,
            step: RedirectStep::Finish,
        }
    }
}

/// Read-only view of a session handed to its continuation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionSnapshot {
    /// Values collected before the session started.
    pub before: Vec<String>,
    /// Lines received since the session started.
    pub after: Vec<String>,
    /// Whether the line being handled is a gate answer.
    pub awaiting_permission: bool,
}

/// The in-progress half of a multi-step command.
pub trait RedirectCommand: Send + Sync {
    /// Name shown to listeners (e.g. for a prompt hint).
    fn name(&self) -> &str;

    /// Handle one line. `input` is the normalized line; when
    /// `session.awaiting_permission` is set it was not added to `after`.
    fn on_redirect(
        &self,
        input: &str,
        session: &SessionSnapshot,
        ctx: &ExecutionContext,
    ) -> Result<RedirectReply>;
}

/// Notified when a session starts and ends.
pub trait RedirectionListener: Send + Sync {
    fn on_redirection_request(&self, command: &dyn RedirectCommand);
    fn on_redirection_end(&self, command: &dyn RedirectCommand);
}

struct Session {
    id: u64,
    command: Arc<dyn RedirectCommand>,
    before: Vec<String>,
    after: Vec<String>,
    awaiting_permission: bool,
}

impl Session {
    fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            before: self.before.clone(),
            after: self.after.clone(),
            awaiting_permission: self.awaiting_permission,
        }
    }
}

/// Owner of the single redirection slot.
pub struct Redirector {
    slot: Mutex<Option<Session>>,
    listener: Mutex<Option<Arc<dyn RedirectionListener>>>,
    next_id: AtomicU64,
}

impl Default for Redirector {
    fn default() -> Self {
        Self::new()
    }
}

impl Redirector {
    pub fn new() -> Self {
        Self {
            slot: Mutex::new(None),
            listener: Mutex::new(None),
            next_id: AtomicU64::new(1),
        }
    }

    /// Install the start/end listener, replacing any previous one.
    pub fn set_listener(&self, listener: Arc<dyn RedirectionListener>) {
        *lock(&self.listener) = Some(listener);
    }

    pub fn is_active(&self) -> bool {
        lock(&self.slot).is_some()
    }

    pub fn is_awaiting_permission(&self) -> bool {
        lock(&self.slot)
            .as_ref()
            .is_some_and(|s| s.awaiting_permission)
    }

    /// Name of the in-progress command, if any.
    pub fn active_command(&self) -> Option<String> {
        lock(&self.slot)
            .as_ref()
            .map(|s| s.command.name().to_string())
    }

    /// Snapshot of the active session.
    pub fn snapshot(&self) -> Option<SessionSnapshot> {
        lock(&self.slot).as_ref().map(Session::snapshot)
    }

    /// Start a session for `command`.
    ///
    /// Fails if a session is already active; the existing one is left
    /// untouched.
    pub fn prepare(
        &self,
        command: Arc<dyn RedirectCommand>,
        before: Vec<String>,
        awaiting_permission: bool,
    ) -> Result<()> {
        {
            let mut slot = lock(&self.slot);
            if let Some(active) = slot.as_ref() {
                return Err(LaunchError::Redirect(format!(
                    "'{}' is already waiting for input",
                    active.command.name()
                )));
            }
            *slot = Some(Session {
                id: self.next_id.fetch_add(1, Ordering::Relaxed),
                command: Arc::clone(&command),
                before,
                after: Vec::new(),
                awaiting_permission,
            });
        }
        log::info!(
            "Redirection started by '{}'{}",
            command.name(),
            if awaiting_permission {
                " (awaiting permission)"
            } else {
                ""
            }
        );
        if let Some(listener) = self.listener() {
            listener.on_redirection_request(command.as_ref());
        }
        Ok(())
    }

    /// End the active session, if any. Returns whether one ended.
    ///
    /// Also the handler for an external permission-denied event.
    pub fn cleanup(&self) -> bool {
        self.end(None)
    }

    /// Feed a line to the active session.
    ///
    /// Returns `None` when no session is active. A continuation failure
    /// ends the session and is returned as the error.
    pub(crate) fn feed(
        &self,
        input: &str,
        ctx: &ExecutionContext,
    ) -> Option<Result<Option<String>>> {
        let (id, command, snapshot) = {
            let mut slot = lock(&self.slot);
            let session = slot.as_mut()?;
            if !session.awaiting_permission {
                session.after.push(input.to_string());
            }
            (session.id, Arc::clone(&session.command), session.snapshot())
        };

        let reply = match command.on_redirect(input, &snapshot, ctx) {
            Ok(reply) => reply,
            Err(e) => {
                log::warn!("Redirection '{}' failed: {e}", command.name());
                self.end(Some(id));
                return Some(Err(e));
            },
        };

        match reply.step {
            RedirectStep::Finish => {
                self.end(Some(id));
            },
            RedirectStep::Continue | RedirectStep::AwaitPermission => {
                let mut slot = lock(&self.slot);
                if let Some(session) = slot.as_mut().filter(|s| s.id == id) {
                    session.awaiting_permission = reply.step == RedirectStep::AwaitPermission;
                }
            },
        }
        Some(Ok(reply.text))
    }

    /// Clear the slot (only if it still holds session `id`, when given)
    /// and notify the listener.
    fn end(&self, id: Option<u64>) -> bool {
        let ended = {
            let mut slot = lock(&self.slot);
            let matches = slot
                .as_ref()
                .is_some_and(|s| id.is_none_or(|id| id == s.id));
            if matches { slot.take() } else { None }
        };
        let Some(mut session) = ended else {
            return false;
        };
        session.before.clear();
        session.after.clear();
        log::info!("Redirection by '{}' ended", session.command.name());
        if let Some(listener) = self.listener() {
            listener.on_redirection_end(session.command.as_ref());
        }
        true
    }

    fn listener(&self) -> Option<Arc<dyn RedirectionListener>> {
        lock(&self.listener).as_ref().map(Arc::clone)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{Harness, ListenerLog};

    /// Collects lines until it sees "done".
    struct Collect;

    impl RedirectCommand for Collect {
        fn name(&self) -> &str {
            "collect"
        }
        fn on_redirect(
            &self,
            input: &str,
            session: &SessionSnapshot,
            _ctx: &ExecutionContext,
        ) -> Result<RedirectReply> {
            if input == "done" {
                return Ok(RedirectReply::finish(Some(session.after.join(","))));
            }
            Ok(RedirectReply::continue_with(format!(
                "{} of {}",
                session.after.len(),
                session.before.len()
            )))
        }
    }

    /// Fails on every line.
    struct Broken;

    impl RedirectCommand for Broken {
        fn name(&self) -> &str {
            "broken"
        }
        fn on_redirect(
            &self,
            _input: &str,
            _session: &SessionSnapshot,
            _ctx: &ExecutionContext,
        ) -> Result<RedirectReply> {
            Err(LaunchError::Command("cannot continue".into()))
        }
    }

    /// Records whether each line arrived as a gate answer.
    struct Gate;

    impl RedirectCommand for Gate {
        fn name(&self) -> &str {
            "gate"
        }
        fn on_redirect(
            &self,
            input: &str,
            session: &SessionSnapshot,
            _ctx: &ExecutionContext,
        ) -> Result<RedirectReply> {
            if session.awaiting_permission {
                return Ok(RedirectReply::continue_with(format!("gate:{input}")));
            }
            Ok(RedirectReply::await_permission(format!(
                "data:{input} after={}",
                session.after.len()
            )))
        }
    }

    #[test]
    fn idle_feed_returns_none() {
        let h = Harness::new();
        let ctx = h.dispatcher.context();
        assert!(ctx.redirector.feed("x", ctx).is_none());
        assert!(!ctx.redirector.is_active());
    }

    #[test]
    fn collects_after_buffer_until_finish() {
        let h = Harness::new();
        let ctx = h.dispatcher.context();
        ctx.redirector
            .prepare(Arc::new(Collect), vec!["seed".into()], false)
            .unwrap();
        assert_eq!(
            ctx.redirector.feed("a", ctx).unwrap().unwrap().as_deref(),
            Some("1 of 1")
        );
        assert_eq!(
            ctx.redirector.feed("b", ctx).unwrap().unwrap().as_deref(),
            Some("2 of 1")
        );
        assert_eq!(
            ctx.redirector.feed("done", ctx).unwrap().unwrap().as_deref(),
            Some("a,b,done")
        );
        assert!(!ctx.redirector.is_active());
    }

    #[test]
    fn second_prepare_is_rejected() {
        let h = Harness::new();
        let ctx = h.dispatcher.context();
        ctx.redirector
            .prepare(Arc::new(Collect), Vec::new(), false)
            .unwrap();
        let err = ctx
            .redirector
            .prepare(Arc::new(Gate), Vec::new(), true)
            .unwrap_err();
        assert!(matches!(err, LaunchError::Redirect(_)));
        assert_eq!(ctx.redirector.active_command().as_deref(), Some("collect"));
        assert!(!ctx.redirector.is_awaiting_permission());
    }

    #[test]
    fn gate_answers_are_not_buffered() {
        let h = Harness::new();
        let ctx = h.dispatcher.context();
        ctx.redirector
            .prepare(Arc::new(Gate), Vec::new(), false)
            .unwrap();
        assert_eq!(
            ctx.redirector.feed("one", ctx).unwrap().unwrap().as_deref(),
            Some("data:one after=1")
        );
        assert!(ctx.redirector.is_awaiting_permission());
        assert_eq!(
            ctx.redirector.feed("y", ctx).unwrap().unwrap().as_deref(),
            Some("gate:y")
        );
        let snap = ctx.redirector.snapshot().unwrap();
        assert_eq!(snap.after, vec!["one"]);
        assert!(!snap.awaiting_permission);
    }

    #[test]
    fn failure_ends_session() {
        let h = Harness::new();
        let ctx = h.dispatcher.context();
        ctx.redirector
            .prepare(Arc::new(Broken), Vec::new(), false)
            .unwrap();
        let result = ctx.redirector.feed("anything", ctx).unwrap();
        assert!(result.is_err());
        assert!(!ctx.redirector.is_active());
    }

    #[test]
    fn cleanup_notifies_listener_once() {
        let h = Harness::new();
        let log = Arc::new(ListenerLog::default());
        let ctx = h.dispatcher.context();
        ctx.redirector
            .set_listener(Arc::clone(&log) as Arc<dyn RedirectionListener>);
        ctx.redirector
            .prepare(Arc::new(Collect), Vec::new(), false)
            .unwrap();
        assert!(ctx.redirector.cleanup());
        assert!(!ctx.redirector.cleanup());
        assert_eq!(
            log.events(),
            vec!["request:collect".to_string(), "end:collect".to_string()]
        );
    }
}
