use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use axum::{
    Router,
    http::{HeaderValue, Method, header},
    routing::get,
};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

use super::api::{self, AppState, SharedState};
use super::auth::AuthService;
use super::db::{DbHandle, SiteDb};
use super::live;
use crate::site_config::BrickToml;

/// Configuration for the site server.
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub db_path: std::path::PathBuf,
    pub dev_mode: bool,
    pub allowed_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
            db_path: std::path::PathBuf::from("data/brick.db"),
            dev_mode: false,
            allowed_origins: Vec::new(),
        }
    }
}

impl From<&BrickToml> for ServerConfig {
    fn from(config: &BrickToml) -> Self {
        Self {
            host: config.server.host.clone(),
            port: config.server.port,
            db_path: config.server.db_path.clone(),
            dev_mode: config.server.dev_mode,
            allowed_origins: config.server.allowed_origins.clone(),
        }
    }
}

impl ServerConfig {
    /// CORS policy: permissive in dev mode, otherwise only the listed
    /// origins. `None` means same-origin only.
    pub fn cors_layer(&self) -> Option<CorsLayer> {
        if self.dev_mode {
            return Some(CorsLayer::permissive());
        }
        let origins: Vec<HeaderValue> = self
            .allowed_origins
            .iter()
            .filter_map(|origin| match HeaderValue::from_str(origin) {
                Ok(value) => Some(value),
                Err(_) => {
                    tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                    None
                }
            })
            .collect();
        if origins.is_empty() {
            return None;
        }
        Some(
            CorsLayer::new()
                .allow_origin(AllowOrigin::list(origins))
                .allow_methods([
                    Method::GET,
                    Method::POST,
                    Method::PUT,
                    Method::PATCH,
                    Method::DELETE,
                ])
                .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]),
        )
    }
}

/// Build the full application router: REST API, admin WebSocket, tracing
/// and CORS layers.
pub fn build_router(state: Arc<AppState>, config: &ServerConfig) -> Router {
    let mut app = api::api_router()
        .route("/ws", get(live::ws_handler))
        .with_state(state)
        .layer(TraceLayer::new_for_http());

    if let Some(cors) = config.cors_layer() {
        app = app.layer(cors);
    }
    app
}

/// Open the database and assemble shared state from `brick.toml`.
pub fn build_state(config: &BrickToml) -> Result<Arc<AppState>> {
    let db_path = &config.server.db_path;
    if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).context("Failed to create database directory")?;
    }
    let db = SiteDb::new(db_path).context("Failed to initialize site database")?;
    tracing::info!(path = %db_path.display(), "Database ready");

    Ok(Arc::new(AppState::new(
        DbHandle::new(db),
        AuthService::from_config(&config.auth),
        config.analytics.settings(),
        Duration::from_secs(config.analytics.live_interval_secs),
    )))
}

/// Start the site server and block until shutdown.
pub async fn start_server(config: &BrickToml) -> Result<()> {
    for warning in config.validate() {
        tracing::warn!("{}", warning);
    }

    let server_config = ServerConfig::from(config);
    let state = build_state(config)?;

    let host = if server_config.dev_mode {
        "0.0.0.0"
    } else {
        server_config.host.as_str()
    };
    let addr = format!("{}:{}", host, server_config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    let local_addr = listener.local_addr()?;
    tracing::info!(addr = %local_addr, dev_mode = server_config.dev_mode, "Brick server listening");

    serve_until(listener, state, &server_config, shutdown_signal()).await?;
    tracing::info!("Server shut down gracefully");
    Ok(())
}

/// Serve on `listener` until `signal` resolves. Open SSE streams and
/// WebSockets are then closed so the graceful drain can finish.
pub async fn serve_until(
    listener: tokio::net::TcpListener,
    state: SharedState,
    server_config: &ServerConfig,
    signal: impl Future<Output = ()> + Send + 'static,
) -> Result<()> {
    let broadcaster = live::spawn_live_broadcaster(state.clone());
    let app = build_router(state.clone(), server_config);

    let result = axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            signal.await;
            state.begin_shutdown();
        })
        .await
        .context("Server error");

    broadcaster.abort();
    result
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for Ctrl+C; shutting down");
        return;
    }
    tracing::info!("Shutdown signal received");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::site::api::test_support::{admin_token, test_state};
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    #[tokio::test]
    async fn test_router_serves_health() {
        let app = build_router(test_state(), &ServerConfig::default());
        let request = Request::builder()
            .uri("/health")
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&body[..], b"ok");
    }

    #[tokio::test]
    async fn test_router_mounts_ws_route() {
        let app = build_router(test_state(), &ServerConfig::default());
        let request = Request::builder().uri("/ws").body(Body::empty()).unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_graceful_shutdown_closes_sse_clients() {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};

        let state = test_state();
        let token = admin_token(&state);
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (stop_tx, stop_rx) = tokio::sync::oneshot::channel::<()>();
        let server = tokio::spawn(async move {
            let signal = async move {
                let _ = stop_rx.await;
            };
            serve_until(listener, state, &ServerConfig::default(), signal).await
        });

        let mut client = tokio::net::TcpStream::connect(addr).await.unwrap();
        let request = format!(
            "GET /api/analitik/stream?token={} HTTP/1.1\r\nHost: localhost\r\nAccept: text/event-stream\r\n\r\n",
            token
        );
        client.write_all(request.as_bytes()).await.unwrap();
        let mut buf = [0u8; 1024];
        let n = client.read(&mut buf).await.unwrap();
        assert!(String::from_utf8_lossy(&buf[..n]).starts_with("HTTP/1.1 200"));

        stop_tx.send(()).unwrap();
        let finished = tokio::time::timeout(Duration::from_secs(5), server)
            .await
            .expect("server should stop while an SSE client is connected");
        finished.unwrap().unwrap();
    }

    #[tokio::test]
    async fn test_unknown_route_is_404() {
        let app = build_router(test_state(), &ServerConfig::default());
        let request = Request::builder()
            .uri("/api/properti")
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_cors_allows_listed_origin() {
        let config = ServerConfig {
            allowed_origins: vec!["https://brickproperty.com".to_string()],
            ..ServerConfig::default()
        };
        let app = build_router(test_state(), &config);
        let request = Request::builder()
            .uri("/health")
            .header("origin", "https://brickproperty.com")
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(
            response
                .headers()
                .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
                .unwrap(),
            "https://brickproperty.com"
        );
    }

    #[tokio::test]
    async fn test_cors_ignores_unlisted_origin() {
        let config = ServerConfig {
            allowed_origins: vec!["https://brickproperty.com".to_string()],
            ..ServerConfig::default()
        };
        let app = build_router(test_state(), &config);
        let request = Request::builder()
            .uri("/health")
            .header("origin", "https://evil.example")
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert!(
            response
                .headers()
                .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
                .is_none()
        );
    }

    #[test]
    fn test_cors_layer_selection() {
        assert!(ServerConfig::default().cors_layer().is_none());
        let dev = ServerConfig {
            dev_mode: true,
            ..ServerConfig::default()
        };
        assert!(dev.cors_layer().is_some());
    }

    #[test]
    fn test_build_state_creates_database_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let mut config = BrickToml::default();
        config.server.db_path = dir.path().join("nested").join("brick.db");
        let state = build_state(&config).unwrap();
        assert!(config.server.db_path.exists());
        assert_eq!(state.live_interval, Duration::from_secs(5));
    }

    #[test]
    fn test_server_config_from_toml() {
        let mut toml = BrickToml::default();
        toml.server.port = 8088;
        toml.server.dev_mode = true;
        let config = ServerConfig::from(&toml);
        assert_eq!(config.port, 8088);
        assert!(config.dev_mode);
    }
}
