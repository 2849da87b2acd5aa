use std::io::{self, Write};

use stock::render::Shell;

/// Status line, refresh control and notices printed to the terminal.
pub struct TerminalShell<O, E> {
    out: O,
    err: E,
    refresh_enabled: bool,
    status: String,
}

impl TerminalShell<io::Stdout, io::Stderr> {
    pub fn stdio() -> Self {
        Self::new(io::stdout(), io::stderr())
    }
}

impl<O: Write, E: Write> TerminalShell<O, E> {
    pub fn new(out: O, err: E) -> Self {
        Self {
            out,
            err,
            refresh_enabled: true,
            status: "Ready".to_string(),
        }
    }

    pub fn refresh_enabled(&self) -> bool {
        self.refresh_enabled
    }

    pub fn status(&self) -> &str {
        &self.status
    }

    /// Plain output that is neither status nor a notice.
    pub fn print(&mut self, text: &str) {
        let _ = writeln!(self.out, "{text}");
    }

    pub fn prompt(&mut self) {
        let _ = write!(self.out, "> ");
        let _ = self.out.flush();
    }
}

impl<O: Write, E: Write> Shell for TerminalShell<O, E> {
    fn set_status(&mut self, text: &str) {
        self.status = text.to_string();
        let _ = writeln!(self.out, "[{text}]");
    }

    fn set_refresh_enabled(&mut self, enabled: bool) {
        self.refresh_enabled = enabled;
    }

    fn notify_error(&mut self, title: &str, message: &str) {
        let _ = writeln!(self.err, "!! {title}: {message}");
        let _ = self.err.flush();
    }
}
