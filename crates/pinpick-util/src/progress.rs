//! Terminal status lines and spinners. Everything goes to stderr so stdout
//! stays clean for reports.

use std::io::Write;
use std::time::Duration;

use console::Style;
use indicatif::{ProgressBar, ProgressStyle};

/// Write `{label:>12} {message}` with the label in `style`.
fn line(style: Style, label: &str, message: &str) {
    let _ = writeln!(
        std::io::stderr(),
        "{:>12} {message}",
        style.bold().apply_to(label)
    );
}

/// An action in progress, e.g. `  Installing numpy==1.26.4`. Green.
pub fn status(label: &str, message: &str) {
    line(Style::new().green(), label, message);
}

/// Informational, nothing changed. Cyan.
pub fn status_info(label: &str, message: &str) {
    line(Style::new().cyan(), label, message);
}

pub fn status_warn(label: &str, message: &str) {
    line(Style::new().yellow(), label, message);
}

/// A per-package failure that does not stop the run. Red.
pub fn status_error(label: &str, message: &str) {
    line(Style::new().red(), label, message);
}

/// Ticking spinner for registry and interpreter calls. Finish it with
/// [`ProgressBar::finish_and_clear`] before printing anything else.
pub fn spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
        pb.set_style(style);
    }
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(80));
    pb
}
