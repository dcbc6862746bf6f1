//! Preferences loaded from `launchterm.toml`.
//!
//! Every field has a default, so an empty file (or no file at all) gives a
//! working configuration.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{LaunchError, Result};

/// Top-level preferences.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Preferences {
    #[serde(default)]
    pub behavior: BehaviorPrefs,
    #[serde(default)]
    pub shell: ShellPrefs,
    #[serde(default)]
    pub terminal: TerminalPrefs,
    #[serde(default)]
    pub paths: PathPrefs,
    /// Installed applications known to the config-backed resolver.
    #[serde(default, rename = "app")]
    pub apps: Vec<AppEntry>,
}

/// Display toggles and templates used while dispatching.
#[derive(Debug, Clone, Deserialize)]
pub struct BehaviorPrefs {
    /// Echo `<alias> --> [<expansion>]` before running an alias.
    #[serde(default)]
    pub show_alias_content: bool,
    /// Emit a notification line when an application is launched.
    #[serde(default = "default_true")]
    pub show_launch_history: bool,
    /// Launch notification template. `%a` app name, `%p` package,
    /// `%l` label, `%n` newline (all case-insensitive).
    #[serde(default = "default_app_launch_format")]
    pub app_launch_format: String,
}

impl Default for BehaviorPrefs {
    fn default() -> Self {
        Self {
            show_alias_content: false,
            show_launch_history: true,
            app_launch_format: default_app_launch_format(),
        }
    }
}

/// Settings for the system shell fallback.
#[derive(Debug, Clone, Deserialize)]
pub struct ShellPrefs {
    /// Shell binary invoked as `<program> -c <line>`.
    #[serde(default = "default_shell_program")]
    pub program: String,
    /// Shell used for elevated runs. Without it, elevated runs use `program`.
    #[serde(default)]
    pub root_program: Option<String>,
    /// Whether the fallback asks the bridge for an elevated run.
    #[serde(default = "default_true")]
    pub elevated: bool,
}

impl Default for ShellPrefs {
    fn default() -> Self {
        Self {
            program: default_shell_program(),
            root_program: None,
            elevated: true,
        }
    }
}

/// Front end settings.
#[derive(Debug, Clone, Deserialize)]
pub struct TerminalPrefs {
    /// Number of submitted lines kept in the history ring.
    #[serde(default = "default_history_size")]
    pub history_size: usize,
    /// Periodic messages.
    #[serde(default, rename = "messager")]
    pub messagers: Vec<Messager>,
}

impl Default for TerminalPrefs {
    fn default() -> Self {
        Self {
            history_size: default_history_size(),
            messagers: Vec::new(),
        }
    }
}

/// A message printed every `every` submitted commands.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Messager {
    pub every: usize,
    pub message: String,
}

/// File locations.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PathPrefs {
    /// Alias file, one `name=expansion` per line.
    #[serde(default)]
    pub aliases: Option<PathBuf>,
}

/// An installed application entry.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AppEntry {
    /// What the user types to launch it.
    pub label: String,
    /// Application (component) name, `%a` in the launch template.
    pub name: String,
    /// Package identifier, `%p` in the launch template.
    #[serde(default)]
    pub package: String,
    /// Program and arguments started on launch. Quotes and backslashes
    /// group words as in a shell; nothing else is interpreted.
    pub exec: String,
    /// Hidden apps are not matched by label.
    #[serde(default)]
    pub hidden: bool,
}

fn default_true() -> bool {
    true
}

fn default_app_launch_format() -> String {
    "--> %a".to_string()
}

fn default_shell_program() -> String {
    "sh".to_string()
}

fn default_history_size() -> usize {
    40
}

impl Preferences {
    /// Parse preferences from a TOML string.
    pub fn from_toml_str(toml_str: &str) -> Result<Self> {
        toml::from_str(toml_str).map_err(|e| LaunchError::Config(format!("launchterm.toml: {e}")))
    }

    /// Load preferences from a file.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let prefs = Self::from_toml_str(&text)?;
        log::debug!(
            "Loaded preferences from {} ({} apps)",
            path.display(),
            prefs.apps.len()
        );
        Ok(prefs)
    }
}
