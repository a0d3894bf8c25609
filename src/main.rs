use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use brick::logging::{LogOptions, init_logging};
use brick::site_config::DEFAULT_CONFIG_FILE;

mod cmd;

#[derive(Parser)]
#[command(name = "brick")]
#[command(version, about = "Back-end for the Brick property marketing site")]
pub struct Cli {
    /// Path to brick.toml
    #[arg(short, long, global = true, env = "BRICK_CONFIG", default_value = DEFAULT_CONFIG_FILE)]
    pub config: PathBuf,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    pub log_json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the HTTP server
    Serve {
        /// Port to serve on
        #[arg(short, long)]
        port: Option<u16>,

        /// Interface to bind
        #[arg(long)]
        host: Option<String>,

        /// Database path
        #[arg(long)]
        db_path: Option<PathBuf>,

        /// Enable dev mode (permissive CORS, bind on all interfaces)
        #[arg(long)]
        dev: bool,
    },
    /// Create the database and run migrations, then exit
    InitDb {
        /// Database path
        #[arg(long)]
        db_path: Option<PathBuf>,
    },
    /// Print the SHA-256 digest to use as auth.admin_password_sha256
    HashPassword { password: String },
    /// View or validate configuration
    Config {
        #[command(subcommand)]
        command: Option<ConfigCommands>,
    },
}

#[derive(Subcommand, Clone)]
pub enum ConfigCommands {
    /// Show effective configuration
    Show,
    /// Validate configuration and show any warnings
    Validate,
    /// Write a default brick.toml
    Init,
}

#[tokio::main]
async fn main() -> Result<()> {
    // A missing .env is the normal case.
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();

    match &cli.command {
        Commands::Serve {
            port,
            host,
            db_path,
            dev,
        } => {
            let config = cmd::load_config(&cli)?;
            let _guard = init_logging(&LogOptions {
                verbose: cli.verbose,
                json: cli.log_json || config.logging.json,
                dir: config.logging.dir.clone(),
                filter: config.logging.filter.clone(),
            })?;
            cmd::cmd_serve(
                config,
                cmd::ServeOverrides {
                    port: *port,
                    host: host.clone(),
                    db_path: db_path.clone(),
                    dev: *dev,
                },
            )
            .await?;
        }
        Commands::InitDb { db_path } => {
            let config = cmd::load_config(&cli)?;
            cmd::cmd_init_db(&config, db_path.clone())?;
        }
        Commands::HashPassword { password } => cmd::cmd_hash_password(password),
        Commands::Config { command } => cmd::cmd_config(&cli, command.clone())?,
    }

    Ok(())
}
