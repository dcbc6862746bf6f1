//! Command history ring.

use std::collections::VecDeque;

/// Bounded list of submitted lines with a browse cursor.
pub struct History {
    lines: VecDeque<String>,
    capacity: usize,
    /// `None` when not browsing; otherwise the index shown last.
    cursor: Option<usize>,
}

impl History {
    pub fn new(capacity: usize) -> Self {
        Self {
            lines: VecDeque::with_capacity(capacity),
            capacity,
            cursor: None,
        }
    }

    pub fn push(&mut self, line: &str) {
        self.cursor = None;
        if self.capacity == 0 {
            return;
        }
        if self.lines.len() == self.capacity {
            self.lines.pop_front();
        }
        self.lines.push_back(line.to_string());
    }

    /// Step to an older line. Stays on the oldest once reached.
    pub fn back(&mut self) -> Option<&str> {
        if self.lines.is_empty() {
            return None;
        }
        let idx = match self.cursor {
            None => self.lines.len() - 1,
            Some(0) => 0,
            Some(i) => i - 1,
        };
        self.cursor = Some(idx);
        self.lines.get(idx).map(String::as_str)
    }

    /// Step to a newer line. Walking past the newest yields an empty line.
    pub fn next(&mut self) -> Option<&str> {
        let idx = self.cursor? + 1;
        if idx >= self.lines.len() {
            self.cursor = None;
            return Some("");
        }
        self.cursor = Some(idx);
        self.lines.get(idx).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn clear(&mut self) {
        self.lines.clear();
        self.cursor = None;
    }
}
