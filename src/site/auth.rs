//! Admin authentication.
//!
//! There is a single admin account configured in `brick.toml`: a username
//! and the hex SHA-256 digest of its password. A successful login yields an
//! HS256 JWT which the admin console sends back as `Authorization: Bearer`.

use std::convert::Infallible;

use axum::extract::{FromRequestParts, Query};
use axum::http::{HeaderMap, header, request::Parts};
use chrono::Utc;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

use super::api::{ApiError, SharedState};
use crate::errors::SiteError;
use crate::site_config::AuthSection;

/// JWT claims carried by an admin session token.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Claims {
    /// Admin username.
    pub sub: String,
    /// Issued at (seconds since epoch).
    pub iat: i64,
    /// Expiration (seconds since epoch).
    pub exp: i64,
    pub iss: String,
}

pub struct AuthService {
    username: String,
    password_sha256: Option<String>,
    secret: String,
    ttl_secs: i64,
    issuer: String,
}

impl AuthService {
    pub fn from_config(auth: &AuthSection) -> Self {
        Self {
            username: auth.admin_username.clone(),
            password_sha256: auth
                .admin_password_sha256
                .as_ref()
                .map(|h| h.trim().to_lowercase()),
            secret: auth.jwt_secret.clone(),
            ttl_secs: i64::try_from(auth.token_ttl_hours.saturating_mul(3600)).unwrap_or(i64::MAX),
            issuer: auth.issuer.clone(),
        }
    }

    /// Check credentials and issue a session token.
    pub fn login(&self, username: &str, password: &str) -> Result<String, SiteError> {
        let Some(expected) = &self.password_sha256 else {
            tracing::warn!("Admin login attempted but no password hash is configured");
            return Err(SiteError::Unauthorized("Username atau password salah".to_string()));
        };
        let user_ok = Sha256::digest(username.as_bytes())
            .as_slice()
            .ct_eq(Sha256::digest(self.username.as_bytes()).as_slice());
        let pass_ok = hash_password(password).as_bytes().ct_eq(expected.as_bytes());
        if !bool::from(user_ok & pass_ok) {
            tracing::warn!(username = %username, "Rejected admin login");
            return Err(SiteError::Unauthorized("Username atau password salah".to_string()));
        }
        tracing::info!(username = %username, "Admin logged in");
        self.issue_token(username)
    }

    pub fn issue_token(&self, subject: &str) -> Result<String, SiteError> {
        self.issue_token_at(subject, Utc::now().timestamp())
    }

    fn issue_token_at(&self, subject: &str, issued_at: i64) -> Result<String, SiteError> {
        let claims = Claims {
            sub: subject.to_string(),
            iat: issued_at,
            exp: issued_at.saturating_add(self.ttl_secs),
            iss: self.issuer.clone(),
        };
        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )
        .map_err(|e| SiteError::Other(anyhow::anyhow!("Failed to create JWT: {e}")))
    }

    /// Decode and validate a token (signature, expiry, issuer).
    pub fn verify_token(&self, token: &str) -> Result<Claims, SiteError> {
        let mut validation = Validation::default();
        validation.set_issuer(&[&self.issuer]);
        decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.secret.as_bytes()),
            &validation,
        )
        .map(|data| data.claims)
        .map_err(|e| {
            tracing::debug!(error = %e, "Rejected JWT");
            SiteError::Unauthorized("Token tidak valid atau kedaluwarsa".to_string())
        })
    }
}

/// Hex SHA-256 digest of `password`, as stored in `admin_password_sha256`.
pub fn hash_password(password: &str) -> String {
    hex::encode(Sha256::digest(password.as_bytes()))
}

/// The token from an `Authorization: Bearer <token>` header, if any.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

#[derive(Debug, Default, Deserialize)]
struct TokenQuery {
    token: Option<String>,
}

/// The bearer token, or failing that the `?token=` query parameter.
pub fn request_token(parts: &Parts) -> Option<String> {
    if let Some(token) = bearer_token(&parts.headers) {
        return Some(token.to_string());
    }
    let Query(query) = Query::<TokenQuery>::try_from_uri(&parts.uri).ok()?;
    query.token.filter(|t| !t.trim().is_empty())
}

// ── Extractors ────────────────────────────────────────────────────────

/// Rejects the request with 401 unless it carries a valid admin token.
#[derive(Debug, Clone)]
pub struct AdminClaims(pub Claims);

impl FromRequestParts<SharedState> for AdminClaims {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &SharedState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(&parts.headers)
            .ok_or_else(|| ApiError::Unauthorized("Token tidak ditemukan".to_string()))?;
        let claims = state.auth.verify_token(token)?;
        Ok(AdminClaims(claims))
    }
}

/// [`AdminClaims`] for clients that cannot set request headers
/// (`EventSource`, browser WebSockets): the token may come from `?token=`.
#[derive(Debug, Clone)]
pub struct LiveAdminClaims(pub Claims);

impl FromRequestParts<SharedState> for LiveAdminClaims {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &SharedState,
    ) -> Result<Self, Self::Rejection> {
        let token = request_token(parts)
            .ok_or_else(|| ApiError::Unauthorized("Token tidak ditemukan".to_string()))?;
        let claims = state.auth.verify_token(&token)?;
        Ok(LiveAdminClaims(claims))
    }
}

/// Admin claims when a valid token is present; anonymous otherwise.
#[derive(Debug, Clone)]
pub struct MaybeAdmin(pub Option<Claims>);

impl MaybeAdmin {
    pub fn is_admin(&self) -> bool {
        self.0.is_some()
    }
}

impl FromRequestParts<SharedState> for MaybeAdmin {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &SharedState,
    ) -> Result<Self, Self::Rejection> {
        let claims = bearer_token(&parts.headers).and_then(|t| state.auth.verify_token(t).ok());
        Ok(MaybeAdmin(claims))
    }
}
