//! Configuration view and validation commands (`brick config`).

use anyhow::Result;
use brick::site_config::BrickToml;

use super::super::{Cli, ConfigCommands};

/// Defaults, then `brick.toml` (if present), then `BRICK_*` environment.
pub fn load_config(cli: &Cli) -> Result<BrickToml> {
    let mut config = BrickToml::load_or_default(&cli.config)?;
    config.apply_env()?;
    Ok(config)
}

pub fn cmd_config(cli: &Cli, command: Option<ConfigCommands>) -> Result<()> {
    let config_path = &cli.config;

    match command {
        None | Some(ConfigCommands::Show) => {
            println!();
            println!("Brick Configuration");
            println!("===================");
            println!();
            if config_path.exists() {
                println!("Config file: {}", config_path.display());
            } else {
                println!("No brick.toml found at {}; using defaults.", config_path.display());
            }
            println!();

            let mut config = load_config(cli)?;
            // Never echo the signing secret.
            config.auth.jwt_secret = "********".to_string();
            println!("Effective values (with env overrides):");
            println!();
            print!("{}", toml::to_string_pretty(&config)?);
            println!();
        }
        Some(ConfigCommands::Validate) => {
            println!();
            println!("Validating configuration...");
            println!();

            if !config_path.exists() {
                println!("No brick.toml found. Using defaults.");
            }
            let config = load_config(cli)?;
            let warnings = config.validate();

            if warnings.is_empty() {
                println!("Configuration is valid.");
            } else {
                println!("Configuration warnings:");
                for warning in warnings {
                    println!("  - {}", warning);
                }
            }
            println!();
        }
        Some(ConfigCommands::Init) => {
            if config_path.exists() {
                println!("brick.toml already exists at {}", config_path.display());
                println!("Delete it first if you want to recreate it.");
                return Ok(());
            }

            BrickToml::default().save(config_path)?;

            println!("Created brick.toml at {}", config_path.display());
            println!();
            println!("Next steps:");
            println!("  - run 'brick hash-password <PASSWORD>' and set [auth] admin_password_sha256");
            println!("  - set [auth] jwt_secret (or BRICK_JWT_SECRET)");
            println!("  - list your site in [server] allowed_origins");
            println!();
        }
    }

    Ok(())
}
