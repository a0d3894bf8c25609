//! Live admin feeds.
//!
//! A single background task computes a [`RealtimeSnapshot`] every
//! `live_interval` and fans it out to the SSE stream (`live_tx`) and the
//! WebSocket feed (`ws_tx`). Content handlers push their change events onto
//! `ws_tx` through [`broadcast_message`]. The same task prunes page views
//! past the retention window once per local day.

use axum::{
    body::Bytes,
    extract::{
        State,
        ws::{Message, WebSocket, WebSocketUpgrade, rejection::WebSocketUpgradeRejection},
    },
    response::{IntoResponse, Response},
};
use chrono::{NaiveDate, Utc};
use futures_util::{SinkExt, StreamExt, stream::SplitSink, stream::SplitStream};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::Instant;

use super::api::{AppState, SharedState};
use super::auth::LiveAdminClaims;
use super::models::*;
use crate::analytics::period::{local_date, local_midnight};
use crate::analytics::{RealtimeSnapshot, realtime_snapshot};
use crate::errors::SiteError;

/// How often to send WebSocket Ping frames.
const PING_INTERVAL: Duration = Duration::from_secs(30);

/// How long to wait for a Pong response before considering the connection dead.
const PONG_TIMEOUT: Duration = Duration::from_secs(60);

// ── WebSocket message types ──────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum WsMessage {
    AnalyticsSnapshot(RealtimeSnapshot),

    BlogCreated {
        post: BlogPost,
    },
    BlogUpdated {
        post: BlogPost,
    },
    BlogDeleted {
        id: i64,
        slug: String,
    },

    TestimonialSubmitted {
        testimonial: Testimonial,
    },
    TestimonialModerated {
        testimonial: Testimonial,
    },
    TestimonialDeleted {
        id: i64,
    },

    GalleryCreated {
        item: GalleryItem,
    },
    GalleryUpdated {
        item: GalleryItem,
    },
    GalleryDeleted {
        id: i64,
    },
}

/// Serialize and broadcast a WsMessage to all connected WebSocket clients.
/// Returns silently even if no clients are connected.
pub fn broadcast_message(tx: &broadcast::Sender<String>, msg: &WsMessage) {
    match serde_json::to_string(msg) {
        Ok(json) => {
            let _ = tx.send(json);
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to serialize WsMessage");
        }
    }
}

// ── Snapshots ────────────────────────────────────────────────────────

/// Compute the live counters from the page views recorded so far today.
pub async fn current_snapshot(state: &AppState) -> Result<RealtimeSnapshot, SiteError> {
    let settings = state.analytics;
    let now = Utc::now();
    let today_start = local_midnight(local_date(now, settings.offset), settings.offset);
    let since = today_start.min(now - settings.active_window);
    let views = state
        .db
        .call(move |db| Ok(db.page_views_since(since)?))
        .await?;
    Ok(realtime_snapshot(&views, now, &settings))
}

/// Spawn the task that publishes snapshots and prunes old page views.
pub fn spawn_live_broadcaster(state: SharedState) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(state.live_interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        let mut last_prune: Option<NaiveDate> = None;

        loop {
            ticker.tick().await;

            let today = local_date(Utc::now(), state.analytics.offset);
            if last_prune != Some(today) {
                prune_expired(&state).await;
                last_prune = Some(today);
            }

            if state.live_tx.receiver_count() == 0 && state.ws_tx.receiver_count() == 0 {
                continue;
            }
            match current_snapshot(&state).await {
                Ok(snapshot) => {
                    let _ = state.live_tx.send(snapshot.clone());
                    broadcast_message(&state.ws_tx, &WsMessage::AnalyticsSnapshot(snapshot));
                }
                Err(e) => tracing::warn!(error = %e, "Failed to compute live snapshot"),
            }
        }
    })
}

async fn prune_expired(state: &AppState) {
    let cutoff = Utc::now() - state.analytics.retention;
    match state
        .db
        .call(move |db| Ok(db.prune_page_views(cutoff)?))
        .await
    {
        Ok(0) => tracing::debug!("No expired page views to prune"),
        Ok(removed) => tracing::info!(removed, cutoff = %cutoff, "Pruned expired page views"),
        Err(e) => tracing::warn!(error = %e, "Failed to prune page views"),
    }
}

// ── WebSocket handler ────────────────────────────────────────────────

/// Admin WebSocket. The token is checked before the upgrade; browsers pass
/// it as `?token=`.
pub async fn ws_handler(
    State(state): State<SharedState>,
    LiveAdminClaims(claims): LiveAdminClaims,
    ws: Result<WebSocketUpgrade, WebSocketUpgradeRejection>,
) -> Response {
    let ws = match ws {
        Ok(ws) => ws,
        Err(rejection) => return rejection.into_response(),
    };

    let rx = state.ws_tx.subscribe();
    let shutdown = state.shutdown_signalled();
    ws.on_upgrade(move |socket| async move {
        tracing::info!(admin = %claims.sub, "Admin WebSocket connected");
        let (sender, receiver) = socket.split();
        run_socket_loop(sender, receiver, rx, shutdown).await;
        tracing::info!(admin = %claims.sub, "Admin WebSocket disconnected");
    })
}

/// Last sign of life from a WebSocket peer.
#[derive(Debug, Clone, Copy)]
struct Heartbeat {
    last_pong: Instant,
}

impl Heartbeat {
    fn new(now: Instant) -> Self {
        Self { last_pong: now }
    }

    fn pong(&mut self, now: Instant) {
        self.last_pong = now;
    }

    /// True once [`PONG_TIMEOUT`] has passed without a Pong.
    fn is_dead(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.last_pong) >= PONG_TIMEOUT
    }
}

/// Core WebSocket loop with ping/pong keepalive.
///
/// Combines broadcast forwarding, client message receiving, and periodic
/// ping/pong health checking into a single select loop. A peer that sends
/// no Pong for [`PONG_TIMEOUT`] is dropped, and every socket closes when
/// the server shuts down.
async fn run_socket_loop(
    mut sender: SplitSink<WebSocket, Message>,
    mut receiver: SplitStream<WebSocket>,
    mut rx: broadcast::Receiver<String>,
    shutdown: impl Future<Output = ()>,
) {
    let mut heartbeat = Heartbeat::new(Instant::now());
    let mut ping_interval = tokio::time::interval(PING_INTERVAL);
    // First tick completes immediately.
    ping_interval.tick().await;
    let mut shutdown = std::pin::pin!(shutdown);

    loop {
        tokio::select! {
            _ = &mut shutdown => {
                tracing::debug!("Closing WebSocket for shutdown");
                break;
            }

            _ = ping_interval.tick() => {
                if heartbeat.is_dead(Instant::now()) {
                    tracing::debug!("WebSocket pong timeout");
                    break;
                }
                if sender.send(Message::Ping(Bytes::new())).await.is_err() {
                    break;
                }
            }

            result = rx.recv() => {
                match result {
                    Ok(msg) => {
                        if sender.send(Message::Text(msg.into())).await.is_err() {
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::debug!(skipped, "WebSocket client lagged");
                        continue;
                    }
                }
            }

            msg = receiver.next() => {
                match msg {
                    Some(Ok(Message::Pong(_))) => heartbeat.pong(Instant::now()),
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(_)) => {}
                    Some(Err(_)) => break,
                }
            }
        }
    }

    let _ = sender.send(Message::Close(None)).await;
}

// ── Tests ────────────────────────────────────────────────────────────
