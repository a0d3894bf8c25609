use axum::{extract::State, http::StatusCode, response::IntoResponse};
use serde::Deserialize;

use crate::errors::SiteError;
use crate::site::api::{ApiError, ApiJson, ApiPath, ApiQuery, SharedState, data, message};
use crate::site::auth::AdminClaims;
use crate::site::live::{WsMessage, broadcast_message};
use crate::site::models::GalleryInput;

#[derive(Debug, Default, Deserialize)]
pub struct GalleryListQuery {
    pub limit: Option<i64>,
}

pub async fn list_gallery(
    State(state): State<SharedState>,
    ApiQuery(query): ApiQuery<GalleryListQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let limit = query.limit;
    let items = state.db.call(move |db| Ok(db.list_gallery(limit)?)).await?;
    Ok(data(items))
}

pub async fn get_gallery_item(
    State(state): State<SharedState>,
    ApiPath(id): ApiPath<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let item = state
        .db
        .call(move |db| Ok(db.get_gallery_item(id)?))
        .await?
        .ok_or(SiteError::GalleryNotFound { id })?;
    Ok(data(item))
}

pub async fn create_gallery_item(
    State(state): State<SharedState>,
    AdminClaims(admin): AdminClaims,
    ApiJson(input): ApiJson<GalleryInput>,
) -> Result<impl IntoResponse, ApiError> {
    input.validate()?;
    let item = state
        .db
        .call(move |db| Ok(db.create_gallery_item(&input)?))
        .await?;
    tracing::info!(gallery_id = item.id, admin = %admin.sub, "Gallery item created");
    broadcast_message(&state.ws_tx, &WsMessage::GalleryCreated { item: item.clone() });
    Ok((StatusCode::CREATED, data(item)))
}

pub async fn update_gallery_item(
    State(state): State<SharedState>,
    AdminClaims(admin): AdminClaims,
    ApiPath(id): ApiPath<i64>,
    ApiJson(input): ApiJson<GalleryInput>,
) -> Result<impl IntoResponse, ApiError> {
    input.validate()?;
    let item = state
        .db
        .call(move |db| Ok(db.update_gallery_item(id, &input)?))
        .await?
        .ok_or(SiteError::GalleryNotFound { id })?;
    tracing::info!(gallery_id = id, admin = %admin.sub, "Gallery item updated");
    broadcast_message(&state.ws_tx, &WsMessage::GalleryUpdated { item: item.clone() });
    Ok(data(item))
}

pub async fn delete_gallery_item(
    State(state): State<SharedState>,
    AdminClaims(admin): AdminClaims,
    ApiPath(id): ApiPath<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let deleted = state
        .db
        .call(move |db| Ok(db.delete_gallery_item(id)?))
        .await?;
    match deleted {
        true => {
            tracing::info!(gallery_id = id, admin = %admin.sub, "Gallery item deleted");
            broadcast_message(&state.ws_tx, &WsMessage::GalleryDeleted { id });
            Ok(message("Data galeri berhasil dihapus"))
        }
        false => Err(SiteError::GalleryNotFound { id }.into()),
    }
}
