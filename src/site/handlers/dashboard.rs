use axum::{extract::State, response::IntoResponse};

use crate::site::api::{ApiError, SharedState, data};
use crate::site::auth::AdminClaims;

/// Number of entries on the dashboard's recent-activity panel.
pub const RECENT_ACTIVITY_LIMIT: usize = 10;

pub async fn recent_activity(
    State(state): State<SharedState>,
    AdminClaims(_): AdminClaims,
) -> Result<impl IntoResponse, ApiError> {
    let activities = state
        .db
        .call(|db| Ok(db.recent_activity(RECENT_ACTIVITY_LIMIT)?))
        .await?;
    Ok(data(activities))
}
