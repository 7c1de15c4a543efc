//! Logging setup for the depsift CLI.
//!
//! The library crates only emit `tracing` events; this module installs the
//! subscriber that prints them.
//!
//! # Example
//!
//! ```rust,no_run
//! use depsift_cli::logger::init_logger;
//! use tracing::info;
//!
//! init_logger(false, false, false);
//! info!("Starting build");
//! ```

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

const VERBOSE_FILTER: &str = "depsift=debug,depsift_cli=debug,depsift_plugin_package_json=debug";
const QUIET_FILTER: &str = "depsift=error,depsift_cli=error";
const DEFAULT_FILTER: &str = "depsift=info,depsift_cli=info";

/// Initialize the tracing subscriber.
///
/// Level selection, in order:
/// 1. `--verbose`: debug for depsift crates
/// 2. `--quiet`: errors only
/// 3. `RUST_LOG`
/// 4. info for depsift crates
pub fn init_logger(verbose: bool, quiet: bool, no_color: bool) {
    let filter = if verbose {
        EnvFilter::new(VERBOSE_FILTER)
    } else if quiet {
        EnvFilter::new(QUIET_FILTER)
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
    };

    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_level(true)
        .with_ansi(!no_color && should_use_colors())
        .compact();

    // A second initialization (tests, embedding) keeps the first subscriber.
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .try_init();
}

/// Whether stderr output should be colored.
///
/// `NO_COLOR` disables colors, `FORCE_COLOR` forces them, otherwise the
/// terminal decides.
pub fn should_use_colors() -> bool {
    if std::env::var_os("NO_COLOR").is_some() {
        return false;
    }
    if std::env::var_os("FORCE_COLOR").is_some() {
        return true;
    }
    console::Term::stderr().features().colors_supported()
}
