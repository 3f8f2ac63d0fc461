mod cmd;
mod output;
mod root;

use clap::{Parser, Subcommand};
use cmd::{project::ProjectSubcommand, user::UserSubcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "archdraft",
    about = "Draft project specifications with Gemini and keep them per user",
    version,
    propagate_version = true
)]
struct Cli {
    /// Project root (default: nearest directory holding archdraft.yaml, else cwd)
    #[arg(long, global = true, env = "ARCHDRAFT_ROOT")]
    root: Option<PathBuf>,

    /// Output as JSON
    #[arg(long, global = true, short = 'j')]
    json: bool,

    /// Gemini API key
    #[arg(long, global = true, env = "GEMINI_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write archdraft.yaml (if missing) and create the database
    Init,

    /// Run the JSON API server
    Serve {
        /// Port to listen on (default: server.port from archdraft.yaml)
        #[arg(long)]
        port: Option<u16>,

        /// Open the health endpoint in a browser once listening
        #[arg(long)]
        open: bool,
    },

    /// Register accounts and check credentials
    User {
        #[command(subcommand)]
        subcommand: UserSubcommand,
    },

    /// Generate, regenerate and manage stored projects
    Project {
        #[command(subcommand)]
        subcommand: ProjectSubcommand,
    },
}

fn main() {
    let cli = Cli::parse();

    let default_level = match &cli.command {
        Commands::Serve { .. } => tracing::Level::INFO,
        _ => tracing::Level::WARN,
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(default_level.into()),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let root = root::resolve_root(cli.root.as_deref());
    let api_key = cli.api_key.filter(|k| !k.trim().is_empty());

    let result = match cli.command {
        Commands::Init => cmd::init::run(&root),
        Commands::Serve { port, open } => cmd::serve::run(&root, port, open, api_key),
        Commands::User { subcommand } => cmd::user::run(&root, subcommand, cli.json),
        Commands::Project { subcommand } => cmd::project::run(&root, subcommand, api_key, cli.json),
    };

    if let Err(e) = result {
        // Print the full error chain (anyhow's alternate Display)
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}
