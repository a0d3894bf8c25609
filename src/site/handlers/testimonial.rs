use std::str::FromStr;

use axum::{extract::State, http::StatusCode, response::IntoResponse};
use serde::Deserialize;

use crate::errors::SiteError;
use crate::site::api::{ApiError, ApiJson, ApiPath, ApiQuery, SharedState, data, message};
use crate::site::auth::{AdminClaims, MaybeAdmin};
use crate::site::live::{WsMessage, broadcast_message};
use crate::site::models::{StatusUpdate, TestimonialInput, TestimonialStatus};

#[derive(Debug, Default, Deserialize)]
pub struct TestimonialListQuery {
    pub status: Option<String>,
}

/// Anonymous callers only see approved testimonials; admins see every
/// status and may filter with `?status=`.
pub async fn list_testimonials(
    State(state): State<SharedState>,
    viewer: MaybeAdmin,
    ApiQuery(query): ApiQuery<TestimonialListQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let status = if viewer.is_admin() {
        match query.status.as_deref().filter(|s| !s.is_empty()) {
            Some(s) => Some(TestimonialStatus::from_str(s).map_err(ApiError::BadRequest)?),
            None => None,
        }
    } else {
        Some(TestimonialStatus::Disetujui)
    };
    let testimonials = state
        .db
        .call(move |db| Ok(db.list_testimonials(status)?))
        .await?;
    Ok(data(testimonials))
}

/// Public submission. Always lands in moderation.
pub async fn submit_testimonial(
    State(state): State<SharedState>,
    ApiJson(input): ApiJson<TestimonialInput>,
) -> Result<impl IntoResponse, ApiError> {
    let rating = input.validate()?;
    let testimonial = state
        .db
        .call(move |db| Ok(db.create_testimonial(&input, rating, TestimonialStatus::Menunggu)?))
        .await?;
    tracing::info!(testimonial_id = testimonial.id, rating, "Testimonial submitted");
    broadcast_message(
        &state.ws_tx,
        &WsMessage::TestimonialSubmitted {
            testimonial: testimonial.clone(),
        },
    );
    Ok((StatusCode::CREATED, data(testimonial)))
}

pub async fn update_testimonial(
    State(state): State<SharedState>,
    AdminClaims(admin): AdminClaims,
    ApiPath(id): ApiPath<i64>,
    ApiJson(input): ApiJson<TestimonialInput>,
) -> Result<impl IntoResponse, ApiError> {
    let rating = input.validate()?;
    let updated = state
        .db
        .call(move |db| Ok(db.update_testimonial(id, &input, rating)?))
        .await?;
    let testimonial = updated.ok_or(SiteError::TestimonialNotFound { id })?;
    tracing::info!(testimonial_id = id, admin = %admin.sub, "Testimonial updated");
    broadcast_message(
        &state.ws_tx,
        &WsMessage::TestimonialModerated {
            testimonial: testimonial.clone(),
        },
    );
    Ok(data(testimonial))
}

pub async fn set_testimonial_status(
    State(state): State<SharedState>,
    AdminClaims(admin): AdminClaims,
    ApiPath(id): ApiPath<i64>,
    ApiJson(req): ApiJson<StatusUpdate>,
) -> Result<impl IntoResponse, ApiError> {
    let status = req.status;
    let updated = state
        .db
        .call(move |db| Ok(db.set_testimonial_status(id, status)?))
        .await?;
    let testimonial = updated.ok_or(SiteError::TestimonialNotFound { id })?;
    tracing::info!(
        testimonial_id = id,
        status = status.as_str(),
        admin = %admin.sub,
        "Testimonial moderated"
    );
    broadcast_message(
        &state.ws_tx,
        &WsMessage::TestimonialModerated {
            testimonial: testimonial.clone(),
        },
    );
    Ok(data(testimonial))
}

pub async fn delete_testimonial(
    State(state): State<SharedState>,
    AdminClaims(admin): AdminClaims,
    ApiPath(id): ApiPath<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let deleted = state
        .db
        .call(move |db| Ok(db.delete_testimonial(id)?))
        .await?;
    if !deleted {
        return Err(SiteError::TestimonialNotFound { id }.into());
    }
    tracing::info!(testimonial_id = id, admin = %admin.sub, "Testimonial deleted");
    broadcast_message(&state.ws_tx, &WsMessage::TestimonialDeleted { id });
    Ok(message("Testimonial berhasil dihapus"))
}

#[cfg(test)]
mod tests {
    use crate::site::api::api_router;
    use crate::site::api::test_support::*;
    use axum::Router;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    async fn submit(app: &Router, body: serde_json::Value) -> (StatusCode, serde_json::Value) {
        let request = Request::builder()
            .method("POST")
            .uri("/api/testimonial")
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        (status, body_json(response.into_body()).await)
    }

    async fn list(app: &Router, uri: &str, auth: Option<&str>) -> Vec<serde_json::Value> {
        let mut builder = Request::builder().uri(uri);
        if let Some(auth) = auth {
            builder = builder.header("authorization", auth);
        }
        let response = app
            .clone()
            .oneshot(builder.body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body: serde_json::Value = body_json(response.into_body()).await;
        body["data"].as_array().unwrap().clone()
    }

    #[tokio::test]
    async fn test_public_submission_is_pending_and_hidden() {
        let state = test_state();
        let auth = bearer(&state);
        let app = api_router().with_state(state);

        let (status, body) = submit(
            &app,
            serde_json::json!({"nama": "Sari", "pesan": "Agen sangat membantu", "status": "disetujui"}),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["data"]["status"], "menunggu");
        assert_eq!(body["data"]["rating"], 5);

        assert!(list(&app, "/api/testimonial", None).await.is_empty());
        assert_eq!(list(&app, "/api/testimonial", Some(&auth)).await.len(), 1);
        assert_eq!(
            list(&app, "/api/testimonial?status=menunggu", Some(&auth)).await.len(),
            1
        );
        assert!(
            list(&app, "/api/testimonial?status=ditolak", Some(&auth))
                .await
                .is_empty()
        );
    }

    #[tokio::test]
    async fn test_submission_validation() {
        let app = test_app();
        let (status, body) = submit(&app, serde_json::json!({"nama": "Budi"})).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Nama dan pesan harus diisi");

        let (status, body) =
            submit(&app, serde_json::json!({"nama": "Budi", "pesan": "Oke", "rating": 9})).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Rating harus antara 1 dan 5");
    }

    #[tokio::test]
    async fn test_moderation_publishes_testimonial() {
        let state = test_state();
        let auth = bearer(&state);
        let app = api_router().with_state(state.clone());
        let mut rx = state.ws_tx.subscribe();

        let (_, body) =
            submit(&app, serde_json::json!({"nama": "Dewi", "pesan": "Mantap", "rating": 4})).await;
        let id = body["data"]["id"].as_i64().unwrap();
        let submitted: serde_json::Value = serde_json::from_str(&rx.recv().await.unwrap()).unwrap();
        assert_eq!(submitted["type"], "TestimonialSubmitted");

        let request = Request::builder()
            .method("PATCH")
            .uri(format!("/api/testimonial/{}/status", id))
            .header("content-type", "application/json")
            .header("authorization", &auth)
            .body(Body::from(serde_json::json!({"status": "disetujui"}).to_string()))
            .unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let moderated: serde_json::Value = serde_json::from_str(&rx.recv().await.unwrap()).unwrap();
        assert_eq!(moderated["type"], "TestimonialModerated");
        assert_eq!(moderated["data"]["testimonial"]["status"], "disetujui");

        let public = list(&app, "/api/testimonial", None).await;
        assert_eq!(public.len(), 1);
        assert_eq!(public[0]["nama"], "Dewi");
        assert_eq!(public[0]["rating"], 4);
    }

    #[tokio::test]
    async fn test_admin_edit_and_delete() {
        let state = test_state();
        let auth = bearer(&state);
        let app = api_router().with_state(state);
        let (_, body) = submit(&app, serde_json::json!({"nama": "Rina", "pesan": "Bagus"})).await;
        let id = body["data"]["id"].as_i64().unwrap();

        let request = Request::builder()
            .method("PUT")
            .uri(format!("/api/testimonial/{}", id))
            .header("content-type", "application/json")
            .header("authorization", &auth)
            .body(Body::from(
                serde_json::json!({"nama": "Rina S.", "peran": "Pembeli rumah", "pesan": "Bagus sekali", "rating": 5, "status": "ditolak"})
                    .to_string(),
            ))
            .unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body: serde_json::Value = body_json(response.into_body()).await;
        assert_eq!(body["data"]["peran"], "Pembeli rumah");
        assert_eq!(body["data"]["status"], "ditolak");

        let delete = |auth: Option<String>| {
            let mut builder = Request::builder()
                .method("DELETE")
                .uri(format!("/api/testimonial/{}", id));
            if let Some(auth) = auth {
                builder = builder.header("authorization", auth);
            }
            builder.body(Body::empty()).unwrap()
        };
        let response = app.clone().oneshot(delete(None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let response = app.clone().oneshot(delete(Some(auth.clone()))).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let response = app.oneshot(delete(Some(auth))).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_invalid_status_filter_is_rejected_for_admin() {
        let state = test_state();
        let auth = bearer(&state);
        let app = api_router().with_state(state);
        let request = Request::builder()
            .uri("/api/testimonial?status=approved")
            .header("authorization", auth)
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
