//! Output categories and the sink that receives interpreter output.

use std::sync::Mutex;

/// What kind of text is being pushed to the front end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OutputCategory {
    /// Echo of the line the user submitted.
    Input,
    /// Result text of a command.
    Output,
    /// Asynchronous notification (e.g. from a collaborator).
    Notification,
    /// Anything else, such as launch history lines.
    General,
}

/// Receiver for interpreter output.
///
/// Called from the dispatching thread and from any number of worker
/// threads at once, so implementations must do their own locking.
pub trait OutputSink: Send + Sync {
    /// Push one chunk of text.
    fn on_output(&self, text: &str, category: OutputCategory);
}

/// An output sink that keeps everything in memory.
///
/// Used by tests and by front ends that render output later.
#[derive(Debug, Default)]
pub struct MemorySink {
    lines: Mutex<Vec<(String, OutputCategory)>>,
}

impl MemorySink {
    /// Create an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of every chunk received so far.
    pub fn entries(&self) -> Vec<(String, OutputCategory)> {
        self.lines.lock().map(|l| l.clone()).unwrap_or_default()
    }

    /// Snapshot of the text of every chunk received so far.
    pub fn texts(&self) -> Vec<String> {
        self.entries().into_iter().map(|(t, _)| t).collect()
    }

    /// Drop everything received so far.
    pub fn clear(&self) {
        if let Ok(mut lines) = self.lines.lock() {
            lines.clear();
        }
    }
}

impl OutputSink for MemorySink {
    fn on_output(&self, text: &str, category: OutputCategory) {
        // A poisoned lock means a writer panicked mid-push; keep going.
        let mut lines = match self.lines.lock() {
            Ok(l) => l,
            Err(poisoned) => poisoned.into_inner(),
        };
        lines.push((text.to_string(), category));
    }
}
