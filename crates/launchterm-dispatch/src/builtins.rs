//! Built-in commands.

use std::sync::Arc;

use launchterm_types::error::{LaunchError, Result};

use crate::apps::{AppScope, LaunchInfo, launch_with_notice};
use crate::context::ExecutionContext;
use crate::redirect::{RedirectCommand, RedirectReply, SessionSnapshot};
use crate::registry::{ArgKind, Command, CommandOutput, CommandRegistry};
use crate::worker::StopToken;

/// Invalid replies a `pick` session tolerates before giving up.
const MAX_PICK_ATTEMPTS: usize = 5;

/// Register all built-in commands into a registry.
pub fn register_builtins(reg: &mut CommandRegistry) {
    reg.register(Box::new(HelpCmd));
    reg.register(Box::new(RefreshCmd));
    reg.register(Box::new(AliasesCmd));
    reg.register(Box::new(PwdCmd));
    reg.register(Box::new(UninstallCmd));
    reg.register(Box::new(PickCmd));
}

// ---------------------------------------------------------------------------
// help
// ---------------------------------------------------------------------------

struct HelpCmd;
impl Command for HelpCmd {
    fn name(&self) -> &str {
        "help"
    }
    fn description(&self) -> &str {
        "List available commands"
    }
    fn usage(&self) -> &str {
        "help [command]"
    }
    fn max_args(&self) -> usize {
        1
    }
    fn execute(
        &self,
        args: &[String],
        ctx: &ExecutionContext,
        _stop: &StopToken,
    ) -> Result<CommandOutput> {
        if let Some(name) = args.first() {
            let cmd = ctx
                .registry
                .get(name)
                .ok_or_else(|| LaunchError::Command(format!("unknown command: {name}")))?;
            return Ok(CommandOutput::Text(format!(
                "{}\n  {}\n  Usage: {}",
                cmd.name(),
                cmd.description(),
                cmd.usage()
            )));
        }

        let cmds = ctx.registry.commands();
        let mut out = format!("Commands ({}):\n", cmds.len());
        for cmd in &cmds {
            out.push_str(&format!("  {:12} {}\n", cmd.name(), cmd.description()));
        }
        out.push_str("\nType 'help <command>' for details.");
        Ok(CommandOutput::Text(out))
    }
}

// ---------------------------------------------------------------------------
// refresh
// ---------------------------------------------------------------------------

struct RefreshCmd;
impl Command for RefreshCmd {
    fn name(&self) -> &str {
        "refresh"
    }
    fn description(&self) -> &str {
        "Reload aliases and installed apps"
    }
    fn usage(&self) -> &str {
        "refresh"
    }
    fn priority(&self) -> i32 {
        3
    }
    fn execute(
        &self,
        _args: &[String],
        ctx: &ExecutionContext,
        _stop: &StopToken,
    ) -> Result<CommandOutput> {
        ctx.apps.refresh()?;
        ctx.aliases.reload()?;
        Ok(CommandOutput::Text("Refreshed.".to_string()))
    }
}

// ---------------------------------------------------------------------------
// aliases
// ---------------------------------------------------------------------------

struct AliasesCmd;
impl Command for AliasesCmd {
    fn name(&self) -> &str {
        "aliases"
    }
    fn description(&self) -> &str {
        "List defined aliases"
    }
    fn usage(&self) -> &str {
        "aliases"
    }
    fn execute(
        &self,
        _args: &[String],
        ctx: &ExecutionContext,
        _stop: &StopToken,
    ) -> Result<CommandOutput> {
        let entries = ctx.aliases.entries();
        if entries.is_empty() {
            return Ok(CommandOutput::Text("No aliases defined.".to_string()));
        }
        let lines: Vec<String> = entries
            .iter()
            .map(|(name, expansion)| format!("{name} --> [{expansion}]"))
            .collect();
        Ok(CommandOutput::Text(lines.join("\n")))
    }
}

// ---------------------------------------------------------------------------
// pwd
// ---------------------------------------------------------------------------

struct PwdCmd;
impl Command for PwdCmd {
    fn name(&self) -> &str {
        "pwd"
    }
    fn description(&self) -> &str {
        "Print working directory"
    }
    fn usage(&self) -> &str {
        "pwd"
    }
    fn execute(
        &self,
        _args: &[String],
        ctx: &ExecutionContext,
        _stop: &StopToken,
    ) -> Result<CommandOutput> {
        Ok(CommandOutput::Text(ctx.cwd().display().to_string()))
    }
}

// ---------------------------------------------------------------------------
// uninstall
// ---------------------------------------------------------------------------

struct UninstallCmd;
impl Command for UninstallCmd {
    fn name(&self) -> &str {
        "uninstall"
    }
    fn description(&self) -> &str {
        "Remove an app (asks for confirmation)"
    }
    fn usage(&self) -> &str {
        "uninstall <label>"
    }
    fn min_args(&self) -> usize {
        1
    }
    fn max_args(&self) -> usize {
        1
    }
    fn arg_shape(&self) -> &[ArgKind] {
        &[ArgKind::Rest]
    }
    fn starts_session(&self) -> bool {
        true
    }
    fn execute(
        &self,
        args: &[String],
        ctx: &ExecutionContext,
        _stop: &StopToken,
    ) -> Result<CommandOutput> {
        let label = args
            .first()
            .ok_or_else(|| LaunchError::Command("uninstall: missing label".to_string()))?;
        let info = ctx
            .apps
            .find_by_label(label, AppScope::All)
            .ok_or_else(|| LaunchError::Command(format!("uninstall: no app labelled '{label}'")))?;
        let prompt = format!("Uninstall {}? [y/n]", info.label);
        ctx.redirector.prepare(
            Arc::new(UninstallPrompt {
                info: info.clone(),
            }),
            vec![info.label],
            true,
        )?;
        Ok(CommandOutput::Text(prompt))
    }
}

/// Waits for the yes/no answer of an `uninstall`.
struct UninstallPrompt {
    info: LaunchInfo,
}

impl RedirectCommand for UninstallPrompt {
    fn name(&self) -> &str {
        "uninstall"
    }

    fn on_redirect(
        &self,
        input: &str,
        _session: &SessionSnapshot,
        ctx: &ExecutionContext,
    ) -> Result<RedirectReply> {
        match input.to_ascii_lowercase().as_str() {
            "y" | "yes" => {
                ctx.apps.uninstall(&self.info)?;
                Ok(RedirectReply::finish(Some(format!(
                    "Uninstalled {}.",
                    self.info.label
                ))))
            },
            "n" | "no" => Ok(RedirectReply::finish(Some("Aborted.".to_string()))),
            _ => Ok(RedirectReply::await_permission("Please answer y or n.")),
        }
    }
}

// ---------------------------------------------------------------------------
// pick
// ---------------------------------------------------------------------------

struct PickCmd;
impl Command for PickCmd {
    fn name(&self) -> &str {
        "pick"
    }
    fn description(&self) -> &str {
        "Search apps by label and choose one to launch"
    }
    fn usage(&self) -> &str {
        "pick <query>"
    }
    fn min_args(&self) -> usize {
        1
    }
    fn max_args(&self) -> usize {
        1
    }
    fn arg_shape(&self) -> &[ArgKind] {
        &[ArgKind::Rest]
    }
    fn starts_session(&self) -> bool {
        true
    }
    fn execute(
        &self,
        args: &[String],
        ctx: &ExecutionContext,
        _stop: &StopToken,
    ) -> Result<CommandOutput> {
        let query = args
            .first()
            .ok_or_else(|| LaunchError::Command("pick: missing query".to_string()))?;
        let mut found = ctx.apps.search(query, AppScope::Shown);
        match found.len() {
            0 => Ok(CommandOutput::Text(format!("No app matches '{query}'."))),
            1 => {
                let info = found.remove(0);
                launch_with_notice(ctx, &info)?;
                Ok(CommandOutput::None)
            },
            _ => {
                let mut out = String::new();
                for (i, info) in found.iter().enumerate() {
                    out.push_str(&format!("{}. {}\n", i + 1, info.label));
                }
                out.push_str("Type a number, or q to cancel.");
                let labels = found.iter().map(|i| i.label.clone()).collect();
                ctx.redirector
                    .prepare(Arc::new(PickPrompt { candidates: found }), labels, false)?;
                Ok(CommandOutput::Text(out))
            },
        }
    }
}

/// Waits for the number of the app to launch.
struct PickPrompt {
    candidates: Vec<LaunchInfo>,
}

impl RedirectCommand for PickPrompt {
    fn name(&self) -> &str {
        "pick"
    }

    fn on_redirect(
        &self,
        input: &str,
        session: &SessionSnapshot,
        ctx: &ExecutionContext,
    ) -> Result<RedirectReply> {
        if input.is_empty() || input.eq_ignore_ascii_case("q") {
            return Ok(RedirectReply::finish(Some("Cancelled.".to_string())));
        }
        let choice = input
            .parse::<usize>()
            .ok()
            .and_then(|n| n.checked_sub(1))
            .and_then(|idx| self.candidates.get(idx));
        if let Some(info) = choice {
            launch_with_notice(ctx, info)?;
            return Ok(RedirectReply::finish(None));
        }
        if session.after.len() >= MAX_PICK_ATTEMPTS {
            return Ok(RedirectReply::finish(Some(
                "Too many invalid choices; cancelled.".to_string(),
            )));
        }
        Ok(RedirectReply::continue_with(format!(
            "Type a number between 1 and {}, or q to cancel.",
            session.before.len()
        )))
    }
}
