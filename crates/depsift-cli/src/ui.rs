//! Status messages printed to stderr.

use owo_colors::OwoColorize;
use std::sync::atomic::{AtomicBool, Ordering};

static COLORS: AtomicBool = AtomicBool::new(true);
static QUIET: AtomicBool = AtomicBool::new(false);

/// Decide once whether status messages are colored and whether they are
/// printed at all. `--quiet` leaves only errors.
pub fn init(no_color: bool, quiet: bool) {
    COLORS.store(!no_color && crate::logger::should_use_colors(), Ordering::Relaxed);
    QUIET.store(quiet, Ordering::Relaxed);
}

fn colors() -> bool {
    COLORS.load(Ordering::Relaxed)
}

fn quiet() -> bool {
    QUIET.load(Ordering::Relaxed)
}

pub fn success(message: &str) {
    if quiet() {
        return;
    }
    if colors() {
        eprintln!("{} {}", "✓".green().bold(), message);
    } else {
        eprintln!("✓ {message}");
    }
}

pub fn info(message: &str) {
    if quiet() {
        return;
    }
    if colors() {
        eprintln!("{} {}", "ℹ".blue().bold(), message);
    } else {
        eprintln!("ℹ {message}");
    }
}

pub fn warning(message: &str) {
    if quiet() {
        return;
    }
    if colors() {
        eprintln!("{} {}", "⚠".yellow().bold(), message.yellow());
    } else {
        eprintln!("⚠ {message}");
    }
}

/// Singular or plural noun for a count.
pub fn plural(count: usize, one: &str, many: &str) -> String {
    if count == 1 {
        format!("{count} {one}")
    } else {
        format!("{count} {many}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plural() {
        assert_eq!(plural(1, "file", "files"), "1 file");
        assert_eq!(plural(0, "file", "files"), "0 files");
        assert_eq!(plural(3, "dependency", "dependencies"), "3 dependencies");
    }
}
