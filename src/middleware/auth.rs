use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use axum_extra::{
    TypedHeader,
    headers::{Authorization, authorization::Bearer},
};

use crate::{AppState, error::AppError, utils::verify_token};

/// Guards protected routes. A missing header is reported separately from a
/// bad or expired token; the verified claims are stored as a request
/// extension for the handlers behind this middleware.
pub async fn auth_middleware(
    State(state): State<AppState>,
    bearer: Option<TypedHeader<Authorization<Bearer>>>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let TypedHeader(authorization) = bearer.ok_or(AppError::Unauthorized)?;

    let claims =
        verify_token(authorization.token(), &state.config).ok_or(AppError::InvalidToken)?;

    request.extensions_mut().insert(claims);
    Ok(next.run(request).await)
}
