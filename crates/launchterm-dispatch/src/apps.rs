//! Installed-application boundary and the launch notification template.

use launchterm_types::error::Result;
use launchterm_types::output::OutputCategory;

use crate::context::ExecutionContext;

/// Everything needed to launch one application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchInfo {
    /// Application (component) name.
    pub name: String,
    /// Package identifier.
    pub package: String,
    /// Public label the user types.
    pub label: String,
}

/// Which applications a lookup considers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppScope {
    /// Apps visible to the user.
    Shown,
    /// Apps the user has hidden.
    Hidden,
    /// Both.
    All,
}

/// Resolves labels to launchable applications.
pub trait AppResolver: Send + Sync {
    /// Exact (case-insensitive) label match within `scope`.
    fn find_by_label(&self, text: &str, scope: AppScope) -> Option<LaunchInfo>;

    /// Apps whose label contains `query` (case-insensitive), sorted by label.
    fn search(&self, query: &str, scope: AppScope) -> Vec<LaunchInfo>;

    /// Start the application.
    fn launch(&self, info: &LaunchInfo) -> Result<()>;

    /// Remove the application.
    fn uninstall(&self, info: &LaunchInfo) -> Result<()>;

    /// Re-enumerate installed applications.
    fn refresh(&self) -> Result<()>;
}

/// Fill the launch notification template.
///
/// Placeholders are case-insensitive: `%a` app name, `%p` package,
/// `%l` public label, `%n` newline. Anything else is copied through.
pub fn format_launch(template: &str, info: &LaunchInfo) -> String {
    let mut out = String::with_capacity(template.len() + info.label.len());
    let mut chars = template.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '%' {
            out.push(c);
            continue;
        }
        let replacement = match chars.peek().map(|n| n.to_ascii_lowercase()) {
            Some('a') => Some(info.name.as_str()),
            Some('p') => Some(info.package.as_str()),
            Some('l') => Some(info.label.as_str()),
            Some('n') => Some("\n"),
            _ => None,
        };
        match replacement {
            Some(r) => {
                out.push_str(r);
                chars.next();
            },
            None => out.push('%'),
        }
    }
    out
}

/// Emit the launch notification (if enabled) and launch `info`.
pub fn launch_with_notice(ctx: &ExecutionContext, info: &LaunchInfo) -> Result<()> {
    let behavior = &ctx.prefs.behavior;
    if behavior.show_launch_history {
        let notice = format_launch(&behavior.app_launch_format, info);
        ctx.emit(&notice, OutputCategory::General);
    }
    log::info!("Launching {} ({})", info.label, info.package);
    ctx.apps.launch(info)
}
