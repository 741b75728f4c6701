use std::io::Write;

use console::Style;

/// Colour of a status label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    /// Something was done (`Locking`, `Adding`).
    Action,
    /// Nothing changed (`Fresh`).
    Info,
    Warn,
}

impl Tone {
    fn style(self) -> Style {
        match self {
            Tone::Action => Style::new().green().bold(),
            Tone::Info => Style::new().cyan().bold(),
            Tone::Warn => Style::new().yellow().bold(),
        }
    }
}

/// Format a Cargo-style status line: `     Locking 3 packages`.
///
/// The label is right-aligned to 12 columns.
pub fn format_status(tone: Tone, label: &str, message: &str) -> String {
    format!("{:>12} {message}", tone.style().apply_to(label))
}

/// Print a status line to stderr.
pub fn status(tone: Tone, label: &str, message: &str) {
    let _ = writeln!(std::io::stderr(), "{}", format_status(tone, label, message));
}
