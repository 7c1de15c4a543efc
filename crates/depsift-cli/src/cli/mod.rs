//! Command-line interface definition.
//!
//! - `depsift build` - run the framework build and assemble deployable output
//! - `depsift manifest` - narrow package.json from a recorded list of module
//!   resolutions

mod commands;

use clap::Parser;

pub use commands::{BuildArgs, Command, ManifestArgs};

/// depsift - production package.json for bundled JavaScript projects
#[derive(Parser, Debug)]
#[command(
    name = "depsift",
    version,
    about = "Production package.json and deployable output for bundled JavaScript projects",
    long_about = "depsift records which external packages a bundle actually uses and writes\n\
                  a package.json declaring exactly those. It can also wrap a framework's\n\
                  production build and assemble a deployable output directory."
)]
pub struct Cli {
    /// Enable verbose logging (debug level)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,
}
