//! buildconf CLI: configure a source tree for a compiler, OS and processor.

mod commands;
mod host;
mod settings;

use std::path::{Path, PathBuf};
use std::process;

use buildconf_resolve::HostProbe;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use commands::configure::ConfigureArgs;
use commands::list::ListKind;
use settings::Settings;

#[derive(Parser)]
#[command(name = "buildconf", version, about = "Configure a source tree for a target platform")]
struct Cli {
    /// Settings file (default: buildconf.toml in the working directory)
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,
    /// Log resolution decisions to stderr
    #[arg(long, short, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve the target and generate the Makefile, build.h and config files
    Configure(ConfigureArgs),
    /// List modules, architectures, operating systems or compilers
    List {
        /// What to list
        #[arg(value_enum)]
        kind: ListKind,
    },
    /// Show what processor autodetection finds on this host
    Detect,
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::from_default_env().add_directive(tracing::Level::DEBUG.into())
    } else {
        EnvFilter::builder()
            .with_default_directive(tracing::Level::WARN.into())
            .from_env_lossy()
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = run(cli);
    if let Err(e) = result {
        eprintln!("error: {e:#}");
        process::exit(1);
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    // The working directory is the source root; paths are emitted relative to it.
    let root = Path::new("");
    let settings = match &cli.config {
        Some(path) => Settings::load(path)?,
        None => Settings::find_and_load(root)?,
    };

    match cli.command {
        Commands::Configure(args) => {
            let command_line = std::env::args().collect::<Vec<_>>().join(" ");
            let host = host::build_host(command_line);
            commands::configure::run(root, &settings, &args, &HostProbe::detect(), &host)
        }

        Commands::List { kind } => {
            let store = commands::load_store(root, &settings)?;
            commands::list::run(&store, kind)
        }

        Commands::Detect => {
            let store = commands::load_store(root, &settings)?;
            commands::detect::run(&store, &HostProbe::detect())
        }
    }
}
