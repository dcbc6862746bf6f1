//! Alias table backed by a text file.

use std::path::PathBuf;

use launchterm_dispatch::alias::parse_aliases;
use launchterm_dispatch::{AliasTable, MemoryAliasTable};
use launchterm_types::error::Result;

/// Aliases read from a `name=expansion` file. A missing file means no
/// aliases.
pub struct FileAliasTable {
    path: PathBuf,
    table: MemoryAliasTable,
}

impl FileAliasTable {
    /// Open the table and read the file once.
    pub fn open(path: PathBuf) -> Result<Self> {
        let table = Self {
            path,
            table: MemoryAliasTable::new(),
        };
        table.reload()?;
        Ok(table)
    }
}

impl AliasTable for FileAliasTable {
    fn lookup(&self, name: &str) -> Option<String> {
        self.table.lookup(name)
    }

    fn entries(&self) -> Vec<(String, String)> {
        self.table.entries()
    }

    fn reload(&self) -> Result<()> {
        let pairs = match std::fs::read_to_string(&self.path) {
            Ok(text) => parse_aliases(&text)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Vec::new(),
            Err(e) => return Err(e.into()),
        };
        log::info!("Loaded {} aliases from {}", pairs.len(), self.path.display());
        self.table.replace_all(pairs);
        Ok(())
    }
}
