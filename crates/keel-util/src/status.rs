//! Right-aligned, coloured status lines on stderr.

use std::io::Write;

use console::Style;

/// Print `label` in bold green, padded to 12 columns, then `message`.
pub fn status(label: &str, message: &str) {
    print_line(Style::new().green().bold(), label, message);
}

/// Like [`status`] in bold cyan, for informational lines.
pub fn status_info(label: &str, message: &str) {
    print_line(Style::new().cyan().bold(), label, message);
}

/// Like [`status`] in bold yellow.
pub fn status_warn(label: &str, message: &str) {
    print_line(Style::new().yellow().bold(), label, message);
}

/// Like [`status`] in bold red.
pub fn status_error(label: &str, message: &str) {
    print_line(Style::new().red().bold(), label, message);
}

fn print_line(style: Style, label: &str, message: &str) {
    let _ = writeln!(std::io::stderr(), "{}", format_line(&style, label, message));
}

fn format_line(style: &Style, label: &str, message: &str) -> String {
    format!("{:>12} {message}", style.apply_to(label))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn label_is_right_aligned() {
        let line = format_line(&Style::new(), "Resolved", "org/a");
        assert_eq!(line, "    Resolved org/a");
    }
}
