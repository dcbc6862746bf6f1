//! Application resolver backed by the `[[app]]` entries of the config.

use std::path::PathBuf;
use std::process::{Child, Command, Stdio};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, PoisonError, RwLock};
use std::thread;

use launchterm_dispatch::{AppResolver, AppScope, LaunchInfo};
use launchterm_types::config::{AppEntry, Preferences};
use launchterm_types::error::{LaunchError, Result};

/// Apps listed in the config file. Launching spawns the entry's `exec`
/// line and reaps it on a background thread; uninstalling forgets the
/// entry until the next refresh.
pub struct ConfigAppResolver {
    config_path: Option<PathBuf>,
    apps: RwLock<Vec<AppEntry>>,
    running: Arc<AtomicUsize>,
}

impl ConfigAppResolver {
    pub fn new(config_path: Option<PathBuf>, apps: Vec<AppEntry>) -> Self {
        Self {
            config_path,
            apps: RwLock::new(apps),
            running: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Launched apps that have not exited (and been reaped) yet.
    pub fn running(&self) -> usize {
        self.running.load(Ordering::Acquire)
    }

    fn reap(&self, label: &str, mut child: Child) {
        let running = Arc::clone(&self.running);
        running.fetch_add(1, Ordering::AcqRel);
        let label_owned = label.to_string();
        let spawned = thread::Builder::new()
            .name(format!("launchterm-reap-{label}"))
            .spawn(move || {
                match child.wait() {
                    Ok(status) => log::debug!("{label_owned} exited with {status}"),
                    Err(e) => log::warn!("Waiting on {label_owned} failed: {e}"),
                }
                running.fetch_sub(1, Ordering::AcqRel);
            });
        if let Err(e) = spawned {
            self.running.fetch_sub(1, Ordering::AcqRel);
            log::warn!("Cannot watch {label} for exit: {e}");
        }
    }

    fn entries(&self, scope: AppScope) -> Vec<AppEntry> {
        let apps = self.apps.read().unwrap_or_else(PoisonError::into_inner);
        apps.iter()
            .filter(|a| match scope {
                AppScope::Shown => !a.hidden,
                AppScope::Hidden => a.hidden,
                AppScope::All => true,
            })
            .cloned()
            .collect()
    }

    fn exec_for(&self, info: &LaunchInfo) -> Option<String> {
        self.entries(AppScope::All)
            .into_iter()
            .find(|a| a.label == info.label && a.package == info.package)
            .map(|a| a.exec)
    }
}

/// Split an `exec` line into words. Single quotes keep text literally,
/// double quotes group words, and a backslash escapes the next character.
fn split_exec(line: &str) -> Result<Vec<String>> {
    let mut words = Vec::new();
    let mut current = String::new();
    let mut in_word = false;
    let mut chars = line.chars();
    let mut quote: Option<char> = None;

    while let Some(ch) = chars.next() {
        match (quote, ch) {
            (Some(q), c) if c == q => quote = None,
            (Some('"'), '\\') => match chars.next() {
                Some(next @ ('"' | '\\')) => current.push(next),
                Some(next) => {
                    current.push('\\');
                    current.push(next);
                },
                None => current.push('\\'),
            },
            (Some(_), c) => current.push(c),
            (None, '\'' | '"') => {
                quote = Some(ch);
                in_word = true;
            },
            (None, '\\') => {
                if let Some(next) = chars.next() {
                    current.push(next);
                }
                in_word = true;
            },
            (None, c) if c.is_whitespace() => {
                if in_word {
                    words.push(std::mem::take(&mut current));
                    in_word = false;
                }
            },
            (None, c) => {
                current.push(c);
                in_word = true;
            },
        }
    }

    if let Some(q) = quote {
        return Err(LaunchError::App(format!("unterminated {q} quote in exec line")));
    }
    if in_word {
        words.push(current);
    }
    Ok(words)
}

fn launch_info(entry: &AppEntry) -> LaunchInfo {
    LaunchInfo {
        name: entry.name.clone(),
        package: entry.package.clone(),
        label: entry.label.clone(),
    }
}

impl AppResolver for ConfigAppResolver {
    fn find_by_label(&self, text: &str, scope: AppScope) -> Option<LaunchInfo> {
        self.entries(scope)
            .iter()
            .find(|a| a.label.eq_ignore_ascii_case(text))
            .map(launch_info)
    }

    fn search(&self, query: &str, scope: AppScope) -> Vec<LaunchInfo> {
        let query = query.to_lowercase();
        let mut found: Vec<LaunchInfo> = self
            .entries(scope)
            .iter()
            .filter(|a| a.label.to_lowercase().contains(&query))
            .map(launch_info)
            .collect();
        found.sort_by(|a, b| a.label.cmp(&b.label));
        found
    }

    fn launch(&self, info: &LaunchInfo) -> Result<()> {
        let exec = self
            .exec_for(info)
            .ok_or_else(|| LaunchError::App(format!("{} is no longer installed", info.label)))?;
        let words = split_exec(&exec)?;
        let (program, args) = words
            .split_first()
            .ok_or_else(|| LaunchError::App(format!("{}: empty exec line", info.label)))?;
        let child = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| LaunchError::App(format!("{}: {e}", info.label)))?;
        self.reap(&info.label, child);
        Ok(())
    }

    fn uninstall(&self, info: &LaunchInfo) -> Result<()> {
        let mut apps = self.apps.write().unwrap_or_else(PoisonError::into_inner);
        let before = apps.len();
        apps.retain(|a| !(a.label == info.label && a.package == info.package));
        if apps.len() == before {
            return Err(LaunchError::App(format!("{} is not installed", info.label)));
        }
        Ok(())
    }

    fn refresh(&self) -> Result<()> {
        let Some(path) = &self.config_path else {
            return Ok(());
        };
        let prefs = Preferences::load(path)?;
        log::info!("Refreshed {} apps from {}", prefs.apps.len(), path.display());
        *self.apps.write().unwrap_or_else(PoisonError::into_inner) = prefs.apps;
        Ok(())
    }
}
