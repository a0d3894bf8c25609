use std::sync::Arc;
use std::time::Duration;

use axum::{
    Json, Router,
    extract::{
        FromRequest, FromRequestParts,
        rejection::{JsonRejection, PathRejection, QueryRejection},
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, patch, post, put},
};
use chrono::Utc;
use serde::Serialize;
use tokio::sync::{broadcast, watch};

use super::auth::AuthService;
use super::db::DbHandle;
use super::handlers::{analytics, auth, blog, dashboard, gallery, testimonial};
use crate::analytics::{AnalyticsSettings, RealtimeSnapshot};
use crate::errors::SiteError;

// ── Shared application state ──────────────────────────────────────────

pub struct AppState {
    pub db: DbHandle,
    /// Serialized `WsMessage`s for the admin WebSocket feed.
    pub ws_tx: broadcast::Sender<String>,
    /// Live analytics snapshots for the SSE stream.
    pub live_tx: broadcast::Sender<RealtimeSnapshot>,
    pub auth: AuthService,
    pub analytics: AnalyticsSettings,
    pub live_interval: Duration,
    /// Flipped to `true` when the server starts shutting down.
    shutdown_tx: watch::Sender<bool>,
}

pub type SharedState = Arc<AppState>;

impl AppState {
    pub fn new(
        db: DbHandle,
        auth: AuthService,
        analytics: AnalyticsSettings,
        live_interval: Duration,
    ) -> Self {
        let (ws_tx, _) = broadcast::channel(256);
        let (live_tx, _) = broadcast::channel(16);
        let (shutdown_tx, _) = watch::channel(false);
        Self {
            db,
            ws_tx,
            live_tx,
            auth,
            analytics,
            live_interval: live_interval.max(Duration::from_secs(1)),
            shutdown_tx,
        }
    }

    /// Tell long-lived responses (SSE streams, WebSockets) to finish.
    pub fn begin_shutdown(&self) {
        self.shutdown_tx.send_replace(true);
    }

    /// Resolves once [`AppState::begin_shutdown`] has been called.
    pub fn shutdown_signalled(&self) -> impl std::future::Future<Output = ()> + Send + 'static + use<> {
        let mut rx = self.shutdown_tx.subscribe();
        async move {
            let _ = rx.wait_for(|down| *down).await;
        }
    }
}

// ── Response envelope ─────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct Envelope<T> {
    pub data: T,
}

/// Wrap a success payload as `{"data": ...}`.
pub fn data<T: Serialize>(value: T) -> Json<Envelope<T>> {
    Json(Envelope { data: value })
}

/// `{"message": ...}` body used by deletes.
pub fn message(msg: &str) -> Json<serde_json::Value> {
    Json(serde_json::json!({ "message": msg }))
}

/// Millisecond clock reading used for slug fragments.
pub fn now_millis() -> u64 {
    u64::try_from(Utc::now().timestamp_millis()).unwrap_or_default()
}

// ── Error handling ────────────────────────────────────────────────────

#[derive(Debug)]
pub enum ApiError {
    NotFound(String),
    BadRequest(String),
    Unauthorized(String),
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg),
            ApiError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };
        (status, Json(serde_json::json!({"error": message}))).into_response()
    }
}

impl From<SiteError> for ApiError {
    fn from(err: SiteError) -> Self {
        match err {
            SiteError::BlogNotFound { .. } => {
                ApiError::NotFound("Artikel blog tidak ditemukan".to_string())
            }
            SiteError::TestimonialNotFound { .. } => {
                ApiError::NotFound("Testimonial tidak ditemukan".to_string())
            }
            SiteError::GalleryNotFound { .. } => {
                ApiError::NotFound("Data galeri tidak ditemukan".to_string())
            }
            SiteError::Validation(msg) => ApiError::BadRequest(msg),
            SiteError::Unauthorized(msg) => ApiError::Unauthorized(msg),
            other => {
                tracing::error!(error = %other, "Request failed");
                ApiError::Internal("Terjadi kesalahan pada server".to_string())
            }
        }
    }
}

// ── Extractors ────────────────────────────────────────────────────────

/// `axum::Json` that rejects with an `{"error": ...}` body.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);

/// `axum::extract::Path` that rejects with an `{"error": ...}` body.
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(ApiError))]
pub struct ApiPath<T>(pub T);

/// `axum::extract::Query` that rejects with an `{"error": ...}` body.
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(ApiError))]
pub struct ApiQuery<T>(pub T);

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        tracing::debug!(error = %rejection.body_text(), "Rejected JSON body");
        ApiError::BadRequest("Data JSON tidak valid".to_string())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        tracing::debug!(error = %rejection.body_text(), "Rejected path parameter");
        ApiError::BadRequest("Parameter URL tidak valid".to_string())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        tracing::debug!(error = %rejection.body_text(), "Rejected query string");
        ApiError::BadRequest("Parameter query tidak valid".to_string())
    }
}

// ── Router ────────────────────────────────────────────────────────────

pub fn api_router() -> Router<SharedState> {
    Router::new()
        .route("/api/auth/login", post(auth::login))
        .route("/api/auth/verify", post(auth::verify))
        .route("/api/blog", get(blog::list_blogs).post(blog::create_blog))
        .route(
            "/api/blog/{key}",
            get(blog::get_blog)
                .put(blog::update_blog)
                .delete(blog::delete_blog),
        )
        .route(
            "/api/testimonial",
            get(testimonial::list_testimonials).post(testimonial::submit_testimonial),
        )
        .route(
            "/api/testimonial/{id}",
            put(testimonial::update_testimonial)
                .delete(testimonial::delete_testimonial),
        )
        .route(
            "/api/testimonial/{id}/status",
            patch(testimonial::set_testimonial_status),
        )
        .route(
            "/api/galeri",
            get(gallery::list_gallery).post(gallery::create_gallery_item),
        )
        .route(
            "/api/galeri/{id}",
            get(gallery::get_gallery_item)
                .put(gallery::update_gallery_item)
                .delete(gallery::delete_gallery_item),
        )
        .route(
            "/api/analitik",
            get(analytics::summary).post(analytics::track_page_view),
        )
        .route("/api/analitik/realtime", get(analytics::realtime))
        .route("/api/analitik/stream", get(analytics::stream))
        .route("/api/dashboard/recent", get(dashboard::recent_activity))
        .route("/health", get(health_check))
}

async fn health_check() -> &'static str {
    "ok"
}

// ── Tests ─────────────────────────────────────────────────────────────
