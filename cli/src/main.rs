use clap::{Parser, Subcommand};

mod commands;
mod util;

use commands::build::BuildArgs;
use commands::config::ConfigCommands;
use commands::render::RenderArgs;

#[derive(Parser)]
#[command(name = "divbridge", version, about = "divbridge CLI: render DivKit widgets and manage stored screens")]
struct Cli {
    /// API base URL
    #[arg(long, env = "DIVBRIDGE_API_URL", default_value = "http://localhost:3000")]
    api_url: String,

    /// Owner of stored configs (sent as x-user-id; the API defaults to "anonymous")
    #[arg(long, env = "DIVBRIDGE_USER_ID")]
    user_id: Option<String>,

    /// Log to stderr (RUST_LOG overrides the level)
    #[arg(long, short = 'v', global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check API health
    Health,
    /// List registered builder functions
    Functions {
        /// Skip pretty-printing (raw JSON for piping)
        #[arg(long)]
        raw: bool,
    },
    /// Build one widget through the API
    Build(BuildArgs),
    /// Build one widget locally without the API
    Render(RenderArgs),
    /// Stored screen configs
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();

    if cli.verbose {
        tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| "divbridge_core=debug,divbridge_cli=debug".into()),
            )
            .with_writer(std::io::stderr)
            .init();
    }

    let code = match cli.command {
        Commands::Health => commands::health::run(&cli.api_url).await,
        Commands::Functions { raw } => commands::health::functions(&cli.api_url, raw).await,
        Commands::Build(args) => commands::build::run(&cli.api_url, args).await,
        Commands::Render(args) => commands::render::run(args),
        Commands::Config { command } => {
            commands::config::run(&cli.api_url, cli.user_id.as_deref(), command).await
        }
    };

    std::process::exit(code);
}
