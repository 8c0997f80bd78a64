#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::doc_markdown)]

mod commands;
mod git;
mod logging;

use clap::Parser;
use miette::Result;
use rescope_core::config::REGISTRY_ENV;
use rescope_core::Config;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "rescope")]
#[command(author, version, about = "Fork npm packages under a new scope", long_about = None)]
struct Cli {
    /// Increase logging verbosity (-v for INFO, -vv for DEBUG, -vvv for TRACE)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Emit JSON formatted output (stable, machine-readable)
    #[arg(long, global = true)]
    json: bool,

    /// Override the working directory
    #[arg(long, global = true, value_name = "PATH")]
    cwd: Option<PathBuf>,

    /// Registry used to look up already published forks
    #[arg(long, global = true, value_name = "URL", env = REGISTRY_ENV)]
    registry: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Print version information
    Version,

    /// Patch package.json and JavaScript files
    ///
    /// Example: rescope patch --scope @fork --package "@origin/*"
    Patch {
        #[command(flatten)]
        selection: Selection,
    },

    /// Patch, publish the packages with npm, then revert the patch with git
    Publish {
        #[command(flatten)]
        selection: Selection,

        /// Publish with public access
        #[arg(long)]
        public: bool,
    },
}

/// Flags shared by `patch` and `publish`.
#[derive(clap::Args, Debug)]
struct Selection {
    /// Scope of the forked packages (e.g. @fork)
    #[arg(long, value_name = "SCOPE")]
    scope: String,

    /// Package name or pattern of the packages to patch (repeatable)
    #[arg(long = "package", value_name = "PATTERN")]
    packages: Vec<String>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Determine working directory
    let cwd = cli
        .cwd
        .or_else(|| std::env::current_dir().ok())
        .unwrap_or_else(|| PathBuf::from("."));
    let cwd = dunce::canonicalize(&cwd).unwrap_or(cwd);

    let config = Config::new(cwd)
        .with_verbosity(cli.verbose)
        .with_json_logs(cli.json)
        .with_registry(cli.registry);

    logging::init(config.verbosity, config.json_logs);

    match cli.command {
        Some(Commands::Version) | None => commands::version::run(),
        Some(Commands::Patch { selection }) => {
            let _span = tracing::info_span!("rescope", cmd = "patch", cwd = %config.cwd.display())
                .entered();
            commands::patch::run(&config, &selection.scope, &selection.packages)
        }
        Some(Commands::Publish { selection, public }) => {
            let _span =
                tracing::info_span!("rescope", cmd = "publish", cwd = %config.cwd.display())
                    .entered();
            commands::publish::run(&config, &selection.scope, &selection.packages, public)
        }
    }
}
