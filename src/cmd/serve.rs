//! HTTP server command (`brick serve`).

use std::path::PathBuf;

use anyhow::Result;
use brick::site_config::BrickToml;

/// Flags that override `brick.toml` and `BRICK_*` values.
pub struct ServeOverrides {
    pub port: Option<u16>,
    pub host: Option<String>,
    pub db_path: Option<PathBuf>,
    pub dev: bool,
}

impl ServeOverrides {
    fn apply(self, config: &mut BrickToml) {
        if let Some(port) = self.port {
            config.server.port = port;
        }
        if let Some(host) = self.host {
            config.server.host = host;
        }
        if let Some(db_path) = self.db_path {
            config.server.db_path = db_path;
        }
        if self.dev {
            config.server.dev_mode = true;
        }
    }
}

pub async fn cmd_serve(mut config: BrickToml, overrides: ServeOverrides) -> Result<()> {
    overrides.apply(&mut config);
    brick::site::server::start_server(&config).await
}
