//! Brick site back-end: REST API, admin auth and live analytics feeds.
//!
//! ## Overview
//!
//! Public pages fetch content (blog posts, approved testimonials, gallery
//! items) from the REST endpoints and send a tracking beacon on every page
//! view. The admin console uses the same endpoints with a bearer token to
//! edit content and moderate testimonials, and watches live visitor counts
//! over SSE or WebSocket.
//!
//! ## Module Map
//!
//! ```text
//! ┌──────────┐   HTTP   ┌──────────────────────────────────────────────────┐
//! │  Pages / │ ───────> │  server.rs  (Router, CORS, TraceLayer)           │
//! │  Admin   │ <─────── │    └─ api.rs  (AppState, ApiError, routes)       │
//! └──────────┘ SSE / WS │         │                                        │
//!                       │         │ handlers/{blog,testimonial,gallery,    │
//!                       │         │           analytics,auth,dashboard}    │
//!                       │         v                                        │
//!                       │  db.rs  (SiteDb via DbHandle, SQLite)            │
//!                       │         ^                                        │
//!                       │         │ page_views_since() every tick          │
//!                       │  live.rs  (snapshot broadcaster, /ws feed)       │
//!                       └──────────────────────────────────────────────────┘
//! ```
//!
//! ## Supporting Modules
//!
//! | Module     | Responsibility                                             |
//! |------------|------------------------------------------------------------|
//! | `models`   | Entities and request payloads with Indonesian wire names   |
//! | `auth`     | Admin login, JWT issue/verify, `AdminClaims` extractor     |
//! | `live`     | `WsMessage` enum + `broadcast_message()` helper            |
//!
//! ## Typical Request Flow (publish a blog post)
//!
//! 1. `POST /api/blog` → `AdminClaims` checks the bearer token
//! 2. `BlogInput::validate()` rejects blank required fields with 400
//! 3. `SiteDb::create_blog()` derives the slug and resolves collisions
//! 4. `WsMessage::BlogCreated` is broadcast to connected admin sockets

pub mod api;
pub mod auth;
pub mod db;
pub mod handlers;
pub mod live;
pub mod models;
pub mod server;
