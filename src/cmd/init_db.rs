//! Database bootstrap command (`brick init-db`).

use std::path::PathBuf;

use anyhow::{Context, Result};
use brick::site::db::SiteDb;
use brick::site_config::BrickToml;

pub fn cmd_init_db(config: &BrickToml, db_path: Option<PathBuf>) -> Result<()> {
    let db_path = db_path.unwrap_or_else(|| config.server.db_path.clone());
    if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).context("Failed to create database directory")?;
    }
    SiteDb::new(&db_path)?;
    println!("Database initialized at {}", db_path.display());
    Ok(())
}
