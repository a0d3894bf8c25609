use axum::{Json, extract::State, response::IntoResponse};
use serde::{Deserialize, Serialize};

use crate::site::api::{ApiError, ApiJson, SharedState};

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub success: bool,
    pub token: String,
}

#[derive(Debug, Deserialize)]
pub struct VerifyRequest {
    #[serde(default)]
    pub token: String,
}

#[derive(Debug, Serialize)]
pub struct VerifyResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
}

pub async fn login(
    State(state): State<SharedState>,
    ApiJson(req): ApiJson<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let token = state.auth.login(req.username.trim(), &req.password)?;
    Ok(Json(LoginResponse {
        success: true,
        token,
    }))
}

/// Always 200; `success` tells the console whether to keep the session.
pub async fn verify(
    State(state): State<SharedState>,
    ApiJson(req): ApiJson<VerifyRequest>,
) -> impl IntoResponse {
    let user = state.auth.verify_token(req.token.trim()).ok().map(|c| c.sub);
    Json(VerifyResponse {
        success: user.is_some(),
        user,
    })
}
