//! Run summary rendering
//!
//! `summarize` turns a sealed report into the text block printed at the end
//! of a run. Styling goes through a small formatter capability so the CLI
//! can pick ANSI or plain output once at startup (no TTY, `NO_COLOR`).

use crate::publish::RunReport;

/// Styles one summary line. Implementations must not buffer or print.
pub trait LineFormatter: Send + Sync {
    fn heading(&self, text: &str) -> String;
    fn success(&self, text: &str) -> String;
    fn warning(&self, text: &str) -> String;
    fn fatal(&self, text: &str) -> String;
}

/// ANSI escape styling for interactive terminals.
pub struct AnsiFormatter;

impl LineFormatter for AnsiFormatter {
    fn heading(&self, text: &str) -> String {
        format!("\x1b[1m{text}\x1b[0m")
    }

    fn success(&self, text: &str) -> String {
        format!("\x1b[32m  + {text}\x1b[0m")
    }

    fn warning(&self, text: &str) -> String {
        format!("\x1b[33m  ! {text}\x1b[0m")
    }

    fn fatal(&self, text: &str) -> String {
        format!("\x1b[31m  x {text}\x1b[0m")
    }
}

/// Unstyled output for pipes and CI logs.
pub struct PlainFormatter;

impl LineFormatter for PlainFormatter {
    fn heading(&self, text: &str) -> String {
        text.to_string()
    }

    fn success(&self, text: &str) -> String {
        format!("  + {text}")
    }

    fn warning(&self, text: &str) -> String {
        format!("  ! {text}")
    }

    fn fatal(&self, text: &str) -> String {
        format!("  x {text}")
    }
}

/// Render the full summary block: counts, per-entry lines in execution
/// order, and elapsed wall-clock seconds.
#[must_use]
pub fn summarize(report: &RunReport, fmt: &dyn LineFormatter) -> String {
    let mut lines = Vec::new();

    lines.push(fmt.heading(&format!(
        "Publish run: {} succeeded, {} warnings, {} failed ({:.1}s)",
        report.successes().len(),
        report.warnings().len(),
        report.fatals().len(),
        report.elapsed().as_secs_f64(),
    )));

    for entry in report.successes() {
        lines.push(fmt.success(entry));
    }
    for entry in report.warnings() {
        lines.push(fmt.warning(entry));
    }
    for entry in report.fatals() {
        lines.push(fmt.fatal(entry));
    }

    lines.join("\n")
}
