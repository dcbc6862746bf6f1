//! Command dispatch engine.
//!
//! Every submitted line goes through the [`Dispatcher`]. If a redirection
//! session is active the line is handed to the session's continuation.
//! Otherwise the fixed trigger chain (alias, built-in, application label,
//! system shell) is walked in order and the first trigger that claims the
//! line handles it. Built-ins and shell runs execute on worker threads and
//! push their results into the context's output sink.

pub mod alias;
pub mod apps;
mod builtins;
pub mod context;
mod engine;
mod history;
pub mod redirect;
mod registry;
pub mod shell;
mod trigger;
mod worker;

#[cfg(test)]
mod testing;

/// In-memory alias table.
pub use alias::{AliasTable, MemoryAliasTable};
/// Application lookup and launch.
pub use apps::{AppResolver, AppScope, LaunchInfo};
/// Register the built-in commands (help, refresh, aliases, pwd, uninstall, pick).
pub use builtins::register_builtins;
/// Shared state passed to every trigger and command.
pub use context::{Collaborators, ExecutionContext};
/// The dispatch entry point.
pub use engine::{DispatchScope, Dispatcher, MAX_ALIAS_DEPTH, normalize};
/// Bounded command history with back/next browsing.
pub use history::History;
/// Multi-step command sessions.
pub use redirect::{
    RedirectCommand, RedirectReply, RedirectStep, RedirectionListener, Redirector, SessionSnapshot,
};
/// Built-in command trait and registry.
pub use registry::{ArgKind, Command, CommandOutput, CommandRegistry, Resolved};
/// System shell bridge.
pub use shell::ShellBridge;
/// Trigger chain members.
pub use trigger::{AliasTrigger, AppTrigger, BuiltinTrigger, Claim, ShellTrigger, Trigger};
/// Cooperative stop flag handed to workers.
pub use worker::StopToken;
