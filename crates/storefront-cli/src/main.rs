mod cmd;
mod output;

use clap::{Parser, Subcommand};
use cmd::{config::ConfigSubcommand, store::StoreSubcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "storefront",
    about = "Multi-store storefront router: serve tenant-scoped HTTP and manage the store registry",
    version,
    propagate_version = true
)]
struct Cli {
    /// Config file (default: ./storefront.yaml)
    #[arg(long, global = true, env = "STOREFRONT_CONFIG")]
    config: Option<PathBuf>,

    /// Registry database file, overrides `registry.path` from the config
    #[arg(long, global = true, env = "STOREFRONT_DB")]
    db: Option<PathBuf>,

    /// Output as JSON
    #[arg(long, global = true, short = 'j')]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server
    Serve {
        /// Port to listen on (overrides server.port)
        #[arg(long)]
        port: Option<u16>,
        /// Address to bind (overrides server.bind)
        #[arg(long)]
        bind: Option<String>,
    },

    /// Manage stores and their routing configs
    Store {
        #[command(subcommand)]
        subcommand: StoreSubcommand,
    },

    /// Inspect and validate the config file
    Config {
        #[command(subcommand)]
        subcommand: ConfigSubcommand,
    },

    /// Show which store a Host value resolves to
    Resolve {
        /// Host header value, e.g. shop1.example.com:9000
        host: String,
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
        .init();

    let ctx = cmd::Context::new(cli.config, cli.db);

    let result = match cli.command {
        Commands::Serve { port, bind } => cmd::serve::run(&ctx, port, bind),
        Commands::Store { subcommand } => cmd::store::run(&ctx, subcommand, cli.json),
        Commands::Config { subcommand } => cmd::config::run(&ctx, subcommand, cli.json),
        Commands::Resolve { host } => cmd::resolve::run(&ctx, &host, cli.json),
    };

    if let Err(e) = result {
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}
