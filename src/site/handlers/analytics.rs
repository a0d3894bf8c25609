use std::str::FromStr;

use axum::{
    extract::State,
    http::{HeaderMap, HeaderValue, StatusCode, header},
    response::{
        IntoResponse,
        sse::{Event, KeepAlive, Sse},
    },
};
use chrono::Utc;
use futures_util::{Stream, StreamExt, stream};
use serde::{Deserialize, Serialize};
use tokio_stream::wrappers::BroadcastStream;

use crate::analytics::visitor::{
    new_visitor_id, normalize_page, sanitize_visitor_id, visitor_cookie,
    visitor_from_cookie_header,
};
use crate::analytics::{Period, summarize};
use crate::site::api::{ApiError, ApiJson, ApiQuery, SharedState, data};
use crate::site::auth::{AdminClaims, LiveAdminClaims};
use crate::site::live::current_snapshot;

/// Beacon payload sent by the page renderer on every page view.
#[derive(Debug, Default, Deserialize)]
pub struct TrackRequest {
    #[serde(default)]
    pub halaman: String,
    #[serde(default)]
    pub visitor_id: Option<String>,
    #[serde(default)]
    pub referrer: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct TrackResponse {
    pub visitor_id: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct SummaryQuery {
    pub period: Option<String>,
}

pub async fn track_page_view(
    State(state): State<SharedState>,
    headers: HeaderMap,
    ApiJson(req): ApiJson<TrackRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let page = normalize_page(&req.halaman);
    let from_cookie = headers
        .get(header::COOKIE)
        .and_then(|v| v.to_str().ok())
        .and_then(visitor_from_cookie_header);
    let known = req
        .visitor_id
        .as_deref()
        .and_then(sanitize_visitor_id)
        .or(from_cookie);
    let issued = known.is_none();
    let visitor_id = known.unwrap_or_else(new_visitor_id);
    let user_agent = headers
        .get(header::USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let referrer = req.referrer;

    let vid = visitor_id.clone();
    let view = state
        .db
        .call(move |db| {
            Ok(db.record_page_view(
                &page,
                &vid,
                referrer.as_deref(),
                user_agent.as_deref(),
                Utc::now(),
            )?)
        })
        .await?;
    tracing::debug!(page = %view.page, visitor_id = %view.visitor_id, "Page view recorded");

    let mut response = (StatusCode::CREATED, data(TrackResponse { visitor_id })).into_response();
    if issued {
        let cookie = HeaderValue::from_str(&visitor_cookie(&view.visitor_id))
            .map_err(|e| ApiError::Internal(e.to_string()))?;
        response.headers_mut().insert(header::SET_COOKIE, cookie);
    }
    Ok(response)
}

pub async fn summary(
    State(state): State<SharedState>,
    AdminClaims(_): AdminClaims,
    ApiQuery(query): ApiQuery<SummaryQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let period = match query.period.as_deref().filter(|p| !p.is_empty()) {
        Some(p) => Period::from_str(p)
            .map_err(|_| ApiError::BadRequest(format!("Periode tidak valid: {}", p)))?,
        None => Period::default(),
    };
    let settings = state.analytics;
    let now = Utc::now();
    let since = period
        .window_start(now, settings.offset)
        .min(now - settings.active_window);
    let views = state
        .db
        .call(move |db| Ok(db.page_views_since(since)?))
        .await?;
    Ok(data(summarize(&views, period, now, &settings)))
}

pub async fn realtime(
    State(state): State<SharedState>,
    AdminClaims(_): AdminClaims,
) -> Result<impl IntoResponse, ApiError> {
    let snapshot = current_snapshot(&state).await?;
    Ok(data(snapshot))
}

/// Server-Sent Events feed: the current snapshot right away, then every
/// snapshot the live broadcaster publishes, until the server shuts down.
/// Frames are unnamed so `EventSource.onmessage` receives them.
pub async fn stream(
    State(state): State<SharedState>,
    LiveAdminClaims(admin): LiveAdminClaims,
) -> Result<Sse<impl Stream<Item = Result<Event, axum::Error>>>, ApiError> {
    let initial = current_snapshot(&state).await?;
    let updates = BroadcastStream::new(state.live_tx.subscribe())
        .filter_map(|received| async move { received.ok() });
    tracing::info!(admin = %admin.sub, "Analytics SSE stream opened");

    let events = stream::once(async move { initial })
        .chain(updates)
        .map(|snapshot| Event::default().json_data(&snapshot))
        .take_until(state.shutdown_signalled());
    Ok(Sse::new(events).keep_alive(KeepAlive::default()))
}
