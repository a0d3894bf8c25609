//! Site configuration read from `brick.toml`.
//!
//! Values are layered: built-in defaults, then the TOML file, then
//! environment variables (a `.env` file is honoured), then CLI flags.
//!
//! # Configuration File Format
//!
//! ```toml
//! [server]
//! host = "127.0.0.1"
//! port = 3000
//! db_path = "data/brick.db"
//! dev_mode = false
//! allowed_origins = ["https://brickproperty.com"]
//!
//! [auth]
//! admin_username = "admin"
//! admin_password_sha256 = "5e884898da28047151d0e56f8dc6292773603d0d6aabbdd62a11ef721d1542d8"
//! jwt_secret = "change-me"
//! token_ttl_hours = 24
//!
//! [analytics]
//! utc_offset_minutes = 420
//! active_window_secs = 300
//! live_interval_secs = 5
//! retention_days = 400
//!
//! [logging]
//! json = false
//! dir = "logs"
//! ```

use std::path::{Path, PathBuf};

use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::analytics::{AnalyticsSettings, utc_offset};
use crate::errors::ConfigError;

/// Default location of the config file, relative to the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "brick.toml";

/// JWT secret shipped in the defaults; `validate` warns while it is in use.
pub const DEFAULT_JWT_SECRET: &str = "brick-dev-secret-change-me";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerSection {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,
    /// Permissive CORS and bind on all interfaces.
    #[serde(default)]
    pub dev_mode: bool,
    /// Origins allowed by CORS outside dev mode. Empty means same-origin only.
    #[serde(default)]
    pub allowed_origins: Vec<String>,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_db_path() -> PathBuf {
    PathBuf::from("data/brick.db")
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            db_path: default_db_path(),
            dev_mode: false,
            allowed_origins: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthSection {
    #[serde(default = "default_admin_username")]
    pub admin_username: String,
    /// Hex SHA-256 digest of the admin password (`brick hash-password`).
    #[serde(default)]
    pub admin_password_sha256: Option<String>,
    #[serde(default = "default_jwt_secret")]
    pub jwt_secret: String,
    #[serde(default = "default_token_ttl_hours")]
    pub token_ttl_hours: u64,
    #[serde(default = "default_issuer")]
    pub issuer: String,
}

fn default_admin_username() -> String {
    "admin".to_string()
}

fn default_jwt_secret() -> String {
    DEFAULT_JWT_SECRET.to_string()
}

fn default_token_ttl_hours() -> u64 {
    24
}

fn default_issuer() -> String {
    "brick".to_string()
}

impl Default for AuthSection {
    fn default() -> Self {
        Self {
            admin_username: default_admin_username(),
            admin_password_sha256: None,
            jwt_secret: default_jwt_secret(),
            token_ttl_hours: default_token_ttl_hours(),
            issuer: default_issuer(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyticsSection {
    /// Local time zone for hourly and daily buckets (WIB by default).
    #[serde(default = "default_utc_offset_minutes")]
    pub utc_offset_minutes: i32,
    #[serde(default = "default_active_window_secs")]
    pub active_window_secs: u64,
    /// Interval between live snapshots on the SSE and WebSocket feeds.
    #[serde(default = "default_live_interval_secs")]
    pub live_interval_secs: u64,
    #[serde(default = "default_retention_days")]
    pub retention_days: u64,
}

fn default_utc_offset_minutes() -> i32 {
    7 * 60
}

fn default_active_window_secs() -> u64 {
    300
}

fn default_live_interval_secs() -> u64 {
    5
}

fn default_retention_days() -> u64 {
    400
}

impl Default for AnalyticsSection {
    fn default() -> Self {
        Self {
            utc_offset_minutes: default_utc_offset_minutes(),
            active_window_secs: default_active_window_secs(),
            live_interval_secs: default_live_interval_secs(),
            retention_days: default_retention_days(),
        }
    }
}

impl AnalyticsSection {
    pub fn settings(&self) -> AnalyticsSettings {
        AnalyticsSettings {
            offset: utc_offset(self.utc_offset_minutes),
            active_window: Duration::seconds(self.active_window_secs.min(86_400 * 365) as i64),
            retention: Duration::days(self.retention_days.min(365 * 100) as i64),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoggingSection {
    /// Emit JSON lines instead of human-readable output.
    #[serde(default)]
    pub json: bool,
    /// Directory for daily rolling log files. Console only when unset.
    #[serde(default)]
    pub dir: Option<PathBuf>,
    /// `EnvFilter` directive used when `RUST_LOG` is not set.
    #[serde(default)]
    pub filter: Option<String>,
}

/// The complete brick.toml configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BrickToml {
    #[serde(default)]
    pub server: ServerSection,
    #[serde(default)]
    pub auth: AuthSection,
    #[serde(default)]
    pub analytics: AnalyticsSection,
    #[serde(default)]
    pub logging: LoggingSection,
}

impl BrickToml {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Parse configuration from a TOML string.
    pub fn parse(content: &str) -> anyhow::Result<Self> {
        use anyhow::Context;
        toml::from_str(content).context("Failed to parse brick.toml")
    }

    /// Load from `path`, or return defaults if the file does not exist.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Save configuration to a TOML file.
    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        use anyhow::Context;
        let content = toml::to_string_pretty(self).context("Failed to serialize brick.toml")?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;
        Ok(())
    }

    /// Apply `BRICK_*` environment overrides from the process environment.
    pub fn apply_env(&mut self) -> Result<(), ConfigError> {
        self.apply_env_with(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary lookup (testable without touching
    /// the process environment).
    pub fn apply_env_with(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(), ConfigError> {
        if let Some(host) = lookup("BRICK_HOST") {
            self.server.host = host;
        }
        if let Some(port) = lookup("BRICK_PORT") {
            self.server.port = port.parse().map_err(|_| ConfigError::InvalidValue {
                key: "BRICK_PORT".to_string(),
                message: format!("'{}' is not a port number", port),
            })?;
        }
        if let Some(db_path) = lookup("BRICK_DB_PATH") {
            self.server.db_path = PathBuf::from(db_path);
        }
        if let Some(user) = lookup("BRICK_ADMIN_USER") {
            self.auth.admin_username = user;
        }
        if let Some(hash) = lookup("BRICK_ADMIN_PASSWORD_SHA256") {
            self.auth.admin_password_sha256 = Some(hash.to_lowercase());
        }
        if let Some(secret) = lookup("BRICK_JWT_SECRET") {
            self.auth.jwt_secret = secret;
        }
        Ok(())
    }

    /// Validate the configuration and return human-readable warnings.
    pub fn validate(&self) -> Vec<String> {
        let mut warnings = Vec::new();

        if self.server.port == 0 {
            warnings.push("server.port is 0; the OS will pick a random port".to_string());
        }
        if self.auth.jwt_secret == DEFAULT_JWT_SECRET {
            warnings.push(
                "auth.jwt_secret is the built-in default; set BRICK_JWT_SECRET in production"
                    .to_string(),
            );
        } else if self.auth.jwt_secret.len() < 16 {
            warnings.push("auth.jwt_secret is shorter than 16 characters".to_string());
        }
        match &self.auth.admin_password_sha256 {
            None => warnings.push(
                "auth.admin_password_sha256 is not set; admin login is disabled".to_string(),
            ),
            Some(hash) if hash.len() != 64 || hex::decode(hash).is_err() => warnings.push(
                "auth.admin_password_sha256 is not a 64-character hex SHA-256 digest".to_string(),
            ),
            Some(_) => {}
        }
        if self.auth.token_ttl_hours == 0 {
            warnings.push(
                "auth.token_ttl_hours is 0; issued tokens expire immediately".to_string(),
            );
        }
        if utc_offset(self.analytics.utc_offset_minutes).local_minus_utc()
            != self.analytics.utc_offset_minutes.saturating_mul(60)
        {
            warnings.push(format!(
                "analytics.utc_offset_minutes = {} is out of range; UTC will be used",
                self.analytics.utc_offset_minutes
            ));
        }
        if self.analytics.live_interval_secs == 0 {
            warnings.push("analytics.live_interval_secs is 0; 1 second will be used".to_string());
        }
        if self.server.dev_mode && !self.server.allowed_origins.is_empty() {
            warnings.push(
                "server.allowed_origins is ignored while dev_mode is on (CORS is permissive)"
                    .to_string(),
            );
        }

        warnings
    }
}
