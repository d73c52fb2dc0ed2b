use axum::{
    Json,
    extract::{Extension, State},
};

use crate::{AppState, error::AppError, phone, routes::auth::User, utils::Claims};

use super::model::{MeResponse, UpdateProfileRequest};

#[axum::debug_handler]
pub async fn get_me(
    Extension(claims): Extension<Claims>,
    State(state): State<AppState>,
) -> Result<Json<MeResponse>, AppError> {
    let user = User::find_by_id(&state.pool, claims.sub)
        .await?
        .ok_or(AppError::NotFound("User not found"))?;

    Ok(Json(MeResponse { user }))
}

/// A supplied phone is re-normalized so the stored identity stays
/// canonical even when edited through the profile.
#[axum::debug_handler]
pub async fn update_me(
    Extension(claims): Extension<Claims>,
    State(state): State<AppState>,
    Json(req): Json<UpdateProfileRequest>,
) -> Result<Json<MeResponse>, AppError> {
    let canonical = match req.phone.as_deref() {
        Some(raw) => Some(phone::normalize(raw)?),
        None => None,
    };

    let user = User::update_profile(
        &state.pool,
        claims.sub,
        req.full_name.as_deref(),
        canonical.as_deref(),
        req.city.as_deref(),
    )
    .await?
    .ok_or(AppError::NotFound("User not found"))?;

    Ok(Json(MeResponse { user }))
}
