use clap::{Args, Subcommand};
use std::path::PathBuf;

/// Available depsift subcommands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Build a project and assemble its deployable output
    ///
    /// Runs the framework build command in the project root, then writes a
    /// production package.json, the lockfile, the framework config and the
    /// public directory into the output path.
    Build(BuildArgs),

    /// Write package.json for a recorded list of module resolutions
    ///
    /// Reads one resolution per line and keeps only the packages the
    /// exclude matchers classify as external.
    Manifest(ManifestArgs),
}

/// Arguments for the build command
#[derive(Args, Debug, Default)]
pub struct BuildArgs {
    /// Path to the config file (default: <workspace-root>/depsift.config.json)
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Workspace root holding the root package.json (default: current directory)
    #[arg(long, value_name = "DIR")]
    pub workspace_root: Option<PathBuf>,

    /// Project name used when the project has no package.json
    #[arg(long, value_name = "NAME")]
    pub project: Option<String>,

    /// Project root, relative to the workspace root
    #[arg(long, value_name = "DIR")]
    pub root: Option<PathBuf>,

    /// Output directory, relative to the workspace root
    #[arg(short, long, value_name = "DIR")]
    pub output_path: Option<PathBuf>,

    /// Keep devDependencies in the written package.json
    #[arg(long)]
    pub include_dev_dependencies: bool,

    /// Copy the workspace lockfile into the output
    #[arg(long)]
    pub generate_lockfile: bool,

    /// Framework config file to carry over (e.g. next.config.js)
    #[arg(long, value_name = "FILE")]
    pub framework_config: Option<String>,

    /// Value for scripts.start in the written package.json
    #[arg(long, value_name = "COMMAND")]
    pub start_script: Option<String>,

    /// Framework build command, given after `--`
    ///
    /// Examples:
    ///   depsift build -- next build
    ///   depsift build --root apps/web -- npx vite build
    #[arg(last = true, value_name = "COMMAND")]
    pub command: Vec<String>,
}

/// Arguments for the manifest command
#[derive(Args, Debug, Default)]
pub struct ManifestArgs {
    /// File with one resolution per line: `resolved[<TAB>importer]`
    #[arg(short, long, value_name = "FILE")]
    pub modules: PathBuf,

    /// Path to the config file (default: <workspace-root>/depsift.config.json)
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Workspace root; resolved paths are relativized against it
    #[arg(long, value_name = "DIR")]
    pub workspace_root: Option<PathBuf>,

    /// Project name used when the project has no package.json
    #[arg(long, value_name = "NAME")]
    pub project: Option<String>,

    /// Project root, relative to the workspace root
    #[arg(long, value_name = "DIR")]
    pub root: Option<PathBuf>,

    /// Treat this package path and everything below it as external
    #[arg(short, long, value_name = "PREFIX")]
    pub exclude: Vec<String>,

    /// Treat modules matching this regular expression as external
    #[arg(long, value_name = "REGEX")]
    pub exclude_pattern: Vec<String>,

    /// Directory to write package.json into (default: print to stdout)
    #[arg(long, value_name = "DIR")]
    pub out: Option<PathBuf>,
}
