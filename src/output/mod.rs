//! Terminal styling for Polaris
//!
//! Operator-facing messages go to stderr so stdout only ever carries the
//! rendered audit report.

use owo_colors::OwoColorize;
use std::io::Write;

/// Print a success message with a green checkmark
pub fn success(message: &str) {
    // Pastel mint green: RGB(152, 225, 152)
    eprintln!(
        "{} {}",
        "✓".truecolor(152, 225, 152).bold(),
        message.bright_white()
    );
}

/// Print an error message with a red X
pub fn error(message: &str) {
    // Pastel coral/salmon: RGB(255, 160, 160)
    eprintln!(
        "{} {}",
        "✗".truecolor(255, 160, 160).bold(),
        message.bright_white()
    );
}

/// Print a warning message with a yellow warning symbol
pub fn warning(message: &str) {
    // Pastel cream/yellow: RGB(255, 230, 160)
    eprintln!(
        "{} {}",
        "⚠".truecolor(255, 230, 160).bold(),
        message.bright_white()
    );
}

/// Print an info message with a blue info symbol
pub fn info(message: &str) {
    // Pastel sky blue: RGB(160, 200, 255)
    eprintln!(
        "{} {}",
        "ℹ".truecolor(160, 200, 255).bold(),
        message.bright_white()
    );
}

/// Print a dimmed/muted message
pub fn dimmed(message: &str) {
    // Brighter grey: RGB(160, 160, 160)
    eprintln!("{}", message.truecolor(160, 160, 160));
}

/// Print a message in lavender/light purple (for values like URLs, paths, etc.)
pub fn lavender(message: &str) {
    // Pastel lavender: RGB(181, 174, 254)
    eprintln!("{}", message.truecolor(181, 174, 254));
}

/// Write report bytes to stdout untouched
pub fn raw(bytes: &[u8]) -> std::io::Result<()> {
    let mut stdout = std::io::stdout().lock();
    stdout.write_all(bytes)?;
    stdout.flush()
}

/// Colors for inline labels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelColor {
    Green,
    Yellow,
    Red,
    Blue,
    Grey,
    White,
}

/// Style `text` with `color`, or return it unchanged when color is disabled
pub fn paint(text: &str, color: LabelColor, enabled: bool) -> String {
    if !enabled {
        return text.to_string();
    }

    match color {
        // Pastel mint green: RGB(152, 225, 152)
        LabelColor::Green => text.truecolor(152, 225, 152).to_string(),
        // Pastel cream/yellow: RGB(255, 230, 160)
        LabelColor::Yellow => text.truecolor(255, 230, 160).to_string(),
        // Pastel coral/salmon: RGB(255, 160, 160)
        LabelColor::Red => text.truecolor(255, 160, 160).to_string(),
        // Pastel sky blue: RGB(160, 200, 255)
        LabelColor::Blue => text.truecolor(160, 200, 255).bold().to_string(),
        // Brighter grey: RGB(160, 160, 160)
        LabelColor::Grey => text.truecolor(160, 160, 160).to_string(),
        LabelColor::White => text.bright_white().bold().to_string(),
    }
}
