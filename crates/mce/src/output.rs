//! Colored terminal output utilities.

use console::{Style, Term};

/// Terminal output formatter.
///
/// Results go to stdout, diagnostics to stderr.
pub(crate) struct Output {
    out: Term,
    err: Term,
    red: Style,
    dim: Style,
    cyan_bold: Style,
}

impl Output {
    /// Create a new output formatter.
    #[must_use]
    pub(crate) fn new() -> Self {
        Self {
            out: Term::stdout(),
            err: Term::stderr(),
            red: Style::new().red(),
            dim: Style::new().dim(),
            cyan_bold: Style::new().cyan().bold(),
        }
    }

    /// Print command output to stdout.
    pub(crate) fn content(&self, msg: &str) {
        let _ = self.out.write_line(msg);
    }

    /// Print an info message.
    pub(crate) fn info(&self, msg: &str) {
        let _ = self.err.write_line(msg);
    }

    /// Print an error message (red).
    pub(crate) fn error(&self, msg: &str) {
        let _ = self.err.write_line(&self.red.apply_to(msg).to_string());
    }

    /// Style text as secondary.
    pub(crate) fn dim(&self, msg: &str) -> String {
        self.dim.apply_to(msg).to_string()
    }

    /// Style text as highlighted (cyan bold).
    pub(crate) fn highlight(&self, msg: &str) -> String {
        self.cyan_bold.apply_to(msg).to_string()
    }
}
