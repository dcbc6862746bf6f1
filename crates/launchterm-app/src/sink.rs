//! Output sink writing to stdout.

use std::io::Write;

use launchterm_types::output::{OutputCategory, OutputSink};

/// Prints every chunk on its own line(s).
///
/// Input echoes are only printed when stdin is not a terminal, so piped
/// scripts show what was run while interactive users don't see double.
pub struct StdoutSink {
    echo_input: bool,
}

impl StdoutSink {
    pub fn new(echo_input: bool) -> Self {
        Self { echo_input }
    }
}

/// Render a chunk the way it is printed.
pub fn render(text: &str, category: OutputCategory) -> String {
    match category {
        OutputCategory::Input => format!("> {}", text.trim()),
        OutputCategory::Output => text.trim_end().to_string(),
        OutputCategory::Notification | OutputCategory::General => text.to_string(),
    }
}

impl OutputSink for StdoutSink {
    fn on_output(&self, text: &str, category: OutputCategory) {
        if category == OutputCategory::Input && !self.echo_input {
            return;
        }
        let rendered = render(text, category);
        if rendered.is_empty() {
            return;
        }
        // Holding the lock keeps one chunk's lines together.
        let mut out = std::io::stdout().lock();
        if writeln!(out, "{rendered}").and_then(|()| out.flush()).is_err() {
            log::debug!("stdout closed; dropped output");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_input_echo() {
        assert_eq!(render("  ls -a ", OutputCategory::Input), "> ls -a");
    }

    #[test]
    fn render_output_trims_trailing_newlines() {
        assert_eq!(render("a\nb\n\n", OutputCategory::Output), "a\nb");
    }

    #[test]
    fn render_general_is_verbatim() {
        assert_eq!(render("--> App\n", OutputCategory::General), "--> App\n");
    }
}
