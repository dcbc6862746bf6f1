//! Alias table boundary and the alias file format.

use std::collections::BTreeMap;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use launchterm_types::error::{LaunchError, Result};

/// Maps short names to expansion text.
pub trait AliasTable: Send + Sync {
    /// Expansion for `name`, if it is an alias.
    fn lookup(&self, name: &str) -> Option<String>;

    /// Every alias, sorted by name.
    fn entries(&self) -> Vec<(String, String)>;

    /// Re-read the backing store.
    fn reload(&self) -> Result<()>;
}

/// Parse alias file text.
///
/// One `name=expansion` per line. Blank lines and lines starting with `#`
/// are skipped. Whitespace around the name and the expansion is trimmed.
pub fn parse_aliases(text: &str) -> Result<Vec<(String, String)>> {
    let mut out = Vec::new();
    for (idx, raw) in text.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let Some((name, expansion)) = line.split_once('=') else {
            return Err(LaunchError::Alias(format!(
                "line {}: expected name=expansion",
                idx + 1
            )));
        };
        let name = name.trim();
        let expansion = expansion.trim();
        if name.is_empty() || name.contains(char::is_whitespace) {
            return Err(LaunchError::Alias(format!(
                "line {}: invalid alias name '{name}'",
                idx + 1
            )));
        }
        if expansion.is_empty() {
            return Err(LaunchError::Alias(format!(
                "line {}: alias '{name}' has no expansion",
                idx + 1
            )));
        }
        out.push((name.to_string(), expansion.to_string()));
    }
    Ok(out)
}

/// An alias table held entirely in memory.
#[derive(Debug, Default)]
pub struct MemoryAliasTable {
    aliases: RwLock<BTreeMap<String, String>>,
}

impl MemoryAliasTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a table from `(name, expansion)` pairs.
    pub fn with_aliases<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let map = pairs
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        Self {
            aliases: RwLock::new(map),
        }
    }

    /// Add or replace an alias.
    pub fn set(&self, name: &str, expansion: &str) {
        self.write().insert(name.to_string(), expansion.to_string());
    }

    /// Remove an alias.
    pub fn remove(&self, name: &str) {
        self.write().remove(name);
    }

    /// Replace the whole table.
    pub fn replace_all(&self, pairs: Vec<(String, String)>) {
        *self.write() = pairs.into_iter().collect();
    }

    fn read(&self) -> RwLockReadGuard<'_, BTreeMap<String, String>> {
        self.aliases.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, BTreeMap<String, String>> {
        self.aliases.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl AliasTable for MemoryAliasTable {
    fn lookup(&self, name: &str) -> Option<String> {
        self.read().get(name).cloned()
    }

    fn entries(&self) -> Vec<(String, String)> {
        self.read()
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    fn reload(&self) -> Result<()> {
        // Nothing backs an in-memory table.
        Ok(())
    }
}
