use clap::{Parser, Subcommand};
use stager::core::StagerError;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

mod cli;

/// Environment variable holding the log filter
const LOG_ENV: &str = "STAGER_LOG";

#[derive(Parser)]
#[command(name = "stager")]
#[command(about = "Staged dependency installer for pinned Python formulae")]
#[command(version)]
struct Cli {
    /// Show debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Install a formula: vendor its resources, install it, wrap its executables
    Install {
        /// Path to the formula file
        formula: PathBuf,
        /// Install into this directory instead of the cellar
        #[arg(long)]
        prefix: Option<PathBuf>,
        /// Publish wrapper scripts here (default: <prefix>/bin)
        #[arg(long)]
        bin_dir: Option<PathBuf>,
        /// Install the main package from a local source tree
        #[arg(long)]
        source: Option<PathBuf>,
        /// Replace an existing installation
        #[arg(long)]
        force: bool,
        /// Keep a failed installation for inspection
        #[arg(long)]
        keep_failed: bool,
    },
    /// Download and verify every archive of a formula without installing
    Fetch {
        /// Path to the formula file
        formula: PathBuf,
    },
    /// Verify already downloaded archives against their checksums
    Verify {
        /// Path to the formula file
        formula: PathBuf,
    },
    /// List installed formulae
    List,
    /// Remove an installed formula
    Uninstall {
        /// Formula name
        name: String,
        /// Version to remove (required when several are installed)
        #[arg(long)]
        version: Option<String>,
    },
    /// Run a formula's test commands against its installation
    Test {
        /// Path to the formula file
        formula: PathBuf,
        /// Installation directory, when installed with --prefix
        #[arg(long)]
        prefix: Option<PathBuf>,
    },
    /// Configure global settings
    #[command(subcommand)]
    Config(ConfigCommands),
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Show the current configuration
    Show,
    /// Set a configuration value
    Set {
        /// One of: cache_dir, cellar, python, fetch_timeout_secs
        key: String,
        value: String,
    },
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match cli.command {
        Commands::Install {
            formula,
            prefix,
            bin_dir,
            source,
            force,
            keep_failed,
        } => {
            cli::install::run(cli::install::InstallOptions {
                formula,
                prefix,
                bin_dir,
                source,
                force,
                keep_failed,
            })
            .await
        }
        Commands::Fetch { formula } => cli::fetch::run(&formula).await,
        Commands::Verify { formula } => cli::verify::run(&formula),
        Commands::List => cli::list::run(),
        Commands::Uninstall { name, version } => cli::uninstall::run(&name, version.as_deref()),
        Commands::Test { formula, prefix } => cli::test::run(&formula, prefix),
        Commands::Config(cmd) => match cmd {
            ConfigCommands::Show => cli::config::show(),
            ConfigCommands::Set { key, value } => cli::config::set(&key, &value),
        },
    };

    // Handle result and exit codes
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => match &e {
            StagerError::SubprocessExit(code) => {
                // The failing command already printed its own output
                ExitCode::from(u8::try_from(*code).unwrap_or(1))
            }
            _ => {
                eprintln!("\n{}", stager::format_error_with_help(&e));
                ExitCode::FAILURE
            }
        },
    }
}
