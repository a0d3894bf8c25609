//! Typed error hierarchy for the Brick back-end.
//!
//! - `SiteError`: content, analytics and auth failures raised while serving
//!   a request
//! - `ConfigError`: problems loading or validating `brick.toml`

use thiserror::Error;

/// Errors from the site subsystem (storage, handlers, auth).
#[derive(Debug, Error)]
pub enum SiteError {
    #[error("Blog post '{key}' not found")]
    BlogNotFound { key: String },

    #[error("Testimonial {id} not found")]
    TestimonialNotFound { id: i64 },

    #[error("Gallery item {id} not found")]
    GalleryNotFound { id: i64 },

    #[error("{0}")]
    Validation(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Could not allocate a unique slug for '{base}'")]
    SlugExhausted { base: String },

    #[error("Database error: {0}")]
    Database(#[source] anyhow::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl SiteError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }
}

/// Errors from configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {source}")]
    Read {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file at {path}: {source}")]
    Parse {
        path: std::path::PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Invalid value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}
