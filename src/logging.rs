//! `tracing` subscriber setup for the `brick` binary.
//!
//! Console output is human-readable by default and JSON lines with
//! `--log-json`. When `[logging] dir` is set, a daily rolling file is
//! written alongside the console through a non-blocking writer; the
//! returned guard must live as long as the process or buffered lines are
//! lost.

use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    EnvFilter, Layer, Registry, fmt, layer::SubscriberExt, util::SubscriberInitExt,
};

pub const DEFAULT_FILTER: &str = "brick=info,tower_http=info";
pub const VERBOSE_FILTER: &str = "brick=debug,tower_http=debug";
pub const LOG_FILE_PREFIX: &str = "brick.log";

#[derive(Debug, Clone, Default)]
pub struct LogOptions {
    pub verbose: bool,
    pub json: bool,
    pub dir: Option<PathBuf>,
    /// Directive from `brick.toml`; `RUST_LOG` still wins.
    pub filter: Option<String>,
}

/// Pick the filter directive: `RUST_LOG`, then `--verbose`, then the
/// configured directive, then the built-in default.
pub fn filter_directive(opts: &LogOptions, rust_log: Option<&str>) -> String {
    if let Some(env) = rust_log.filter(|v| !v.trim().is_empty()) {
        return env.to_string();
    }
    if opts.verbose {
        return VERBOSE_FILTER.to_string();
    }
    opts.filter
        .as_deref()
        .filter(|f| !f.trim().is_empty())
        .unwrap_or(DEFAULT_FILTER)
        .to_string()
}

/// Install the global subscriber.
pub fn init_logging(opts: &LogOptions) -> Result<Option<WorkerGuard>> {
    let rust_log = std::env::var("RUST_LOG").ok();
    let directive = filter_directive(opts, rust_log.as_deref());
    let filter = EnvFilter::try_new(&directive)
        .with_context(|| format!("Invalid log filter '{}'", directive))?;

    let mut layers: Vec<Box<dyn Layer<Registry> + Send + Sync>> = Vec::new();
    if opts.json {
        layers.push(fmt::layer().json().with_writer(std::io::stderr).boxed());
    } else {
        layers.push(fmt::layer().with_target(false).with_writer(std::io::stderr).boxed());
    }

    let guard = match &opts.dir {
        Some(dir) => {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create log directory {}", dir.display()))?;
            let appender = tracing_appender::rolling::daily(dir, LOG_FILE_PREFIX);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let file_layer = fmt::layer().with_ansi(false).with_writer(writer);
            if opts.json {
                layers.push(file_layer.json().boxed());
            } else {
                layers.push(file_layer.boxed());
            }
            Some(guard)
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(layers.with_filter(filter))
        .try_init()
        .context("Failed to install tracing subscriber")?;

    Ok(guard)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_directive() {
        assert_eq!(filter_directive(&LogOptions::default(), None), DEFAULT_FILTER);
    }

    #[test]
    fn test_rust_log_wins() {
        let opts = LogOptions {
            verbose: true,
            filter: Some("brick=warn".into()),
            ..Default::default()
        };
        assert_eq!(filter_directive(&opts, Some("trace")), "trace");
        assert_eq!(filter_directive(&opts, Some("  ")), VERBOSE_FILTER);
    }

    #[test]
    fn test_configured_directive() {
        let opts = LogOptions {
            filter: Some("brick=warn".into()),
            ..Default::default()
        };
        assert_eq!(filter_directive(&opts, None), "brick=warn");
    }

    #[test]
    fn test_directives_parse() {
        assert!(EnvFilter::try_new(DEFAULT_FILTER).is_ok());
        assert!(EnvFilter::try_new(VERBOSE_FILTER).is_ok());
    }
}
