use axum::{extract::State, http::StatusCode, response::IntoResponse};
use serde::Deserialize;

use crate::errors::SiteError;
use crate::site::api::{
    ApiError, ApiJson, ApiPath, ApiQuery, SharedState, data, message, now_millis,
};
use crate::site::auth::AdminClaims;
use crate::site::live::{WsMessage, broadcast_message};
use crate::site::models::BlogInput;

#[derive(Debug, Default, Deserialize)]
pub struct BlogListQuery {
    pub kategori: Option<String>,
    pub limit: Option<i64>,
}

pub async fn list_blogs(
    State(state): State<SharedState>,
    ApiQuery(query): ApiQuery<BlogListQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let category = query.kategori.filter(|k| !k.trim().is_empty());
    let limit = query.limit;
    let posts = state
        .db
        .call(move |db| Ok(db.list_blogs(category.as_deref(), limit)?))
        .await?;
    Ok(data(posts))
}

pub async fn get_blog(
    State(state): State<SharedState>,
    ApiPath(key): ApiPath<String>,
) -> Result<impl IntoResponse, ApiError> {
    let lookup = key.clone();
    let post = state
        .db
        .call(move |db| Ok(db.get_blog(&lookup)?))
        .await?;
    match post {
        Some(post) => Ok(data(post)),
        None => Err(SiteError::BlogNotFound { key }.into()),
    }
}

pub async fn create_blog(
    State(state): State<SharedState>,
    AdminClaims(admin): AdminClaims,
    ApiJson(input): ApiJson<BlogInput>,
) -> Result<impl IntoResponse, ApiError> {
    input.validate()?;
    let millis = now_millis();
    let post = state
        .db
        .call(move |db| db.create_blog(&input, millis))
        .await?;
    tracing::info!(post_id = post.id, slug = %post.slug, admin = %admin.sub, "Blog post created");
    broadcast_message(&state.ws_tx, &WsMessage::BlogCreated { post: post.clone() });
    Ok((StatusCode::CREATED, data(post)))
}

pub async fn update_blog(
    State(state): State<SharedState>,
    AdminClaims(admin): AdminClaims,
    ApiPath(key): ApiPath<String>,
    ApiJson(input): ApiJson<BlogInput>,
) -> Result<impl IntoResponse, ApiError> {
    input.validate()?;
    let millis = now_millis();
    let post = state
        .db
        .call(move |db| db.update_blog(&key, &input, millis))
        .await?;
    tracing::info!(post_id = post.id, slug = %post.slug, admin = %admin.sub, "Blog post updated");
    broadcast_message(&state.ws_tx, &WsMessage::BlogUpdated { post: post.clone() });
    Ok(data(post))
}

pub async fn delete_blog(
    State(state): State<SharedState>,
    AdminClaims(admin): AdminClaims,
    ApiPath(key): ApiPath<String>,
) -> Result<impl IntoResponse, ApiError> {
    let lookup = key.clone();
    let removed = state
        .db
        .call(move |db| Ok(db.delete_blog(&lookup)?))
        .await?;
    match removed {
        Some(post) => {
            tracing::info!(post_id = post.id, admin = %admin.sub, "Blog post deleted");
            broadcast_message(
                &state.ws_tx,
                &WsMessage::BlogDeleted {
                    id: post.id,
                    slug: post.slug,
                },
            );
            Ok(message("Artikel blog berhasil dihapus"))
        }
        None => Err(SiteError::BlogNotFound { key }.into()),
    }
}

#[cfg(test)]
mod tests {
    use crate::site::api::api_router;
    use crate::site::api::test_support::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    fn post_body(title: &str) -> Body {
        Body::from(
            serde_json::json!({
                "judul": title,
                "ringkasan": "Ringkasan singkat",
                "konten": "Isi artikel",
                "penulis": "Tim Brick",
                "kategori": "Tips"
            })
            .to_string(),
        )
    }

    #[tokio::test]
    async fn test_list_blogs_empty() {
        let app = test_app();
        let request = Request::builder()
            .uri("/api/blog")
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body: serde_json::Value = body_json(response.into_body()).await;
        assert_eq!(body["data"], serde_json::json!([]));
    }

    #[tokio::test]
    async fn test_create_blog_requires_admin() {
        let app = test_app();
        let request = Request::builder()
            .method("POST")
            .uri("/api/blog")
            .header("content-type", "application/json")
            .body(post_body("Rumah Baru"))
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let body: serde_json::Value = body_json(response.into_body()).await;
        assert!(body["error"].is_string());
    }

    #[tokio::test]
    async fn test_create_get_update_delete_blog() {
        let state = test_state();
        let auth = bearer(&state);
        let app = api_router().with_state(state.clone());
        let mut rx = state.ws_tx.subscribe();

        let request = Request::builder()
            .method("POST")
            .uri("/api/blog")
            .header("content-type", "application/json")
            .header("authorization", &auth)
            .body(post_body("Rumah Baru di BSD"))
            .unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        let created: serde_json::Value = body_json(response.into_body()).await;
        assert_eq!(created["data"]["slug"], "rumah-baru-di-bsd");
        assert_eq!(created["data"]["penulis"], "Tim Brick");
        let id = created["data"]["id"].as_i64().unwrap();

        let event: serde_json::Value = serde_json::from_str(&rx.recv().await.unwrap()).unwrap();
        assert_eq!(event["type"], "BlogCreated");
        assert_eq!(event["data"]["post"]["judul"], "Rumah Baru di BSD");

        // Lookup by slug and by id.
        for uri in ["/api/blog/rumah-baru-di-bsd".to_string(), format!("/api/blog/{}", id)] {
            let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
            let response = app.clone().oneshot(request).await.unwrap();
            assert_eq!(response.status(), StatusCode::OK);
            let body: serde_json::Value = body_json(response.into_body()).await;
            assert_eq!(body["data"]["id"], id);
        }

        let request = Request::builder()
            .method("PUT")
            .uri(format!("/api/blog/{}", id))
            .header("content-type", "application/json")
            .header("authorization", &auth)
            .body(post_body("Rumah Baru di BSD City"))
            .unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let updated: serde_json::Value = body_json(response.into_body()).await;
        assert_eq!(updated["data"]["slug"], "rumah-baru-di-bsd-city");

        let request = Request::builder()
            .method("DELETE")
            .uri("/api/blog/rumah-baru-di-bsd-city")
            .header("authorization", &auth)
            .body(Body::empty())
            .unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body: serde_json::Value = body_json(response.into_body()).await;
        assert_eq!(body["message"], "Artikel blog berhasil dihapus");

        let request = Request::builder()
            .uri(format!("/api/blog/{}", id))
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body: serde_json::Value = body_json(response.into_body()).await;
        assert_eq!(body["error"], "Artikel blog tidak ditemukan");
    }

    #[tokio::test]
    async fn test_create_blog_validation() {
        let state = test_state();
        let auth = bearer(&state);
        let app = api_router().with_state(state);
        let request = Request::builder()
            .method("POST")
            .uri("/api/blog")
            .header("content-type", "application/json")
            .header("authorization", auth)
            .body(Body::from(serde_json::json!({"judul": "Tanpa isi"}).to_string()))
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body: serde_json::Value = body_json(response.into_body()).await;
        assert_eq!(body["error"], "Judul, ringkasan, konten, dan penulis harus diisi");
    }

    #[tokio::test]
    async fn test_create_blog_rejects_unparseable_publication_date() {
        let state = test_state();
        let auth = bearer(&state);
        let app = api_router().with_state(state);
        let request = Request::builder()
            .method("POST")
            .uri("/api/blog")
            .header("content-type", "application/json")
            .header("authorization", auth)
            .body(Body::from(
                serde_json::json!({
                    "judul": "Lama",
                    "ringkasan": "Ringkasan",
                    "konten": "Isi",
                    "penulis": "Tim Brick",
                    "tanggal_publikasi": "besok"
                })
                .to_string(),
            ))
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body: serde_json::Value = body_json(response.into_body()).await;
        assert_eq!(body["error"], "Format tanggal_publikasi tidak valid");
    }

    #[tokio::test]
    async fn test_duplicate_titles_get_distinct_slugs() {
        let state = test_state();
        let auth = bearer(&state);
        let app = api_router().with_state(state);
        let mut slugs = Vec::new();
        for _ in 0..2 {
            let request = Request::builder()
                .method("POST")
                .uri("/api/blog")
                .header("content-type", "application/json")
                .header("authorization", &auth)
                .body(post_body("Villa Bali"))
                .unwrap();
            let response = app.clone().oneshot(request).await.unwrap();
            let body: serde_json::Value = body_json(response.into_body()).await;
            slugs.push(body["data"]["slug"].as_str().unwrap().to_string());
        }
        assert_eq!(slugs[0], "villa-bali");
        assert!(slugs[1].starts_with("villa-bali-"));
        assert_eq!(slugs[1].len(), "villa-bali-".len() + 6);
    }

    #[tokio::test]
    async fn test_list_blogs_category_filter() {
        let state = test_state();
        let auth = bearer(&state);
        let app = api_router().with_state(state);
        let request = Request::builder()
            .method("POST")
            .uri("/api/blog")
            .header("content-type", "application/json")
            .header("authorization", &auth)
            .body(post_body("Tips KPR"))
            .unwrap();
        app.clone().oneshot(request).await.unwrap();

        let request = Request::builder()
            .uri("/api/blog?kategori=Berita")
            .body(Body::empty())
            .unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        let body: serde_json::Value = body_json(response.into_body()).await;
        assert_eq!(body["data"].as_array().unwrap().len(), 0);

        let request = Request::builder()
            .uri("/api/blog?kategori=Tips&limit=5")
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        let body: serde_json::Value = body_json(response.into_body()).await;
        assert_eq!(body["data"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_delete_missing_blog_is_404() {
        let state = test_state();
        let auth = bearer(&state);
        let app = api_router().with_state(state);
        let request = Request::builder()
            .method("DELETE")
            .uri("/api/blog/tidak-ada")
            .header("authorization", auth)
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
