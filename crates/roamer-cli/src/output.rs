//! Output formatting for scripted runs and tool listings

use console::{style, Term};
use roamer::{ToolSpec, ERROR_PREFIX};

/// Writes payloads to stdout and status lines to stderr
#[derive(Debug)]
pub struct Printer {
    out: Term,
    err: Term,
    /// Whether to use colors
    pub use_color: bool,
    /// Quiet mode
    pub quiet: bool,
}

impl Default for Printer {
    fn default() -> Self {
        Self::new(true, false)
    }
}

impl Printer {
    /// Create a new printer
    #[must_use]
    pub fn new(use_color: bool, quiet: bool) -> Self {
        Self {
            out: Term::stdout(),
            err: Term::stderr(),
            use_color,
            quiet,
        }
    }

    /// Print one step's payload under a numbered heading
    pub fn step(&self, index: usize, tool: &str, payload: &str) {
        if !self.quiet {
            let heading = format!("[{index}] {tool}");
            let heading = if !self.use_color {
                heading
            } else if is_error_payload(payload) {
                style(heading).red().bold().to_string()
            } else {
                style(heading).cyan().bold().to_string()
            };
            let _ = self.out.write_line(&heading);
        }
        let _ = self.out.write_line(payload);
    }

    /// Print a per-step status line to stderr
    pub fn status(&self, index: usize, tool: &str, ok: bool) {
        let _ = self.err.write_line(&status_line(index, tool, ok, self.use_color));
    }

    /// Print the run summary
    pub fn summary(&self, steps: usize, errors: usize) {
        if self.quiet && errors == 0 {
            return;
        }
        let line = format!("{steps} steps, {errors} errors");
        let line = match (self.use_color, errors) {
            (false, _) => line,
            (true, 0) => style(line).green().bold().to_string(),
            (true, _) => style(line).yellow().bold().to_string(),
        };
        let _ = self.err.write_line(&line);
    }

    /// Print a success message
    pub fn success(&self, message: &str) {
        if self.quiet {
            return;
        }
        let prefix = if self.use_color {
            style("✓").green().bold().to_string()
        } else {
            "OK".to_string()
        };
        let _ = self.err.write_line(&format!("{prefix} {message}"));
    }

    /// Print the tool list, one tool per line
    pub fn tools(&self, specs: &[ToolSpec]) {
        for spec in specs {
            let name = if self.use_color {
                style(spec.name).bold().to_string()
            } else {
                spec.name.to_string()
            };
            let _ = self.out.write_line(&format!("{name:<20} {}", spec.description));
        }
    }
}

/// `PASS [2] gesture` / `FAIL [3] gesture`, or ✓/✗ when coloured
#[must_use]
pub fn status_line(index: usize, tool: &str, ok: bool, use_color: bool) -> String {
    let prefix = match (use_color, ok) {
        (true, true) => style("✓").green().bold().to_string(),
        (true, false) => style("✗").red().bold().to_string(),
        (false, true) => "PASS".to_string(),
        (false, false) => "FAIL".to_string(),
    };
    format!("{prefix} [{index}] {tool}")
}

/// Whether a tool payload reports an error
#[must_use]
pub fn is_error_payload(payload: &str) -> bool {
    payload.starts_with(ERROR_PREFIX)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_is_error_payload() {
        assert!(is_error_payload("Error: Unknown tool: x"));
        assert!(!is_error_payload("{\"action\": \"tap\"}"));
        assert!(!is_error_payload("Could not understand action: Error page"));
    }

    #[test]
    fn test_status_line_plain() {
        assert_eq!(status_line(2, "gesture", true, false), "PASS [2] gesture");
        assert_eq!(status_line(3, "gesture", false, false), "FAIL [3] gesture");
    }

    #[test]
    fn test_printer_flags() {
        let printer = Printer::new(false, true);
        assert!(printer.quiet);
        assert!(!printer.use_color);
        let printer = Printer::default();
        assert!(printer.use_color);
    }
}
