use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use validator::ValidationErrors;

/// Error taxonomy for the auth flows. Every handler returns
/// `Result<_, AppError>` and the mapping to a status code and JSON body
/// lives here, so flows never build error responses by hand.
#[derive(Debug)]
pub enum AppError {
    /// Malformed request body, with per-field details.
    Validation(ValidationErrors),
    /// Raw phone input that does not normalize to a canonical identity.
    InvalidPhone,
    /// Duplicate registration for an existing canonical phone.
    PhoneExists,
    /// Unknown phone/user, with the flow-specific message.
    NotFound(&'static str),
    /// Bad password, inactive account or unknown phone at login. One
    /// message for all three cases so callers cannot probe which failed.
    InvalidCredentials,
    /// Missing bearer token on a protected route.
    Unauthorized,
    /// Token present but failed signature or expiry checks.
    InvalidToken,
    /// OTP missing, consumed, wrong, or past its expiry window.
    InvalidOrExpiredCode,
    /// Account must be verified before this flow applies.
    NotActivated,
    /// Anything unexpected. Logged server-side, generic to the caller.
    Internal(String),
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    code: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<Vec<FieldError>>,
}

#[derive(Serialize)]
struct FieldError {
    field: String,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error, code, details) = match self {
            AppError::Validation(errors) => (
                StatusCode::BAD_REQUEST,
                "Validation error".to_string(),
                None,
                Some(field_errors(&errors)),
            ),
            AppError::InvalidPhone => (
                StatusCode::BAD_REQUEST,
                "Invalid phone number format".to_string(),
                None,
                None,
            ),
            AppError::PhoneExists => (
                StatusCode::BAD_REQUEST,
                "This phone number is already registered. If this is your number, \
                 please login or recover your password if you forgot it."
                    .to_string(),
                Some("PHONE_EXISTS"),
                None,
            ),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.to_string(), None, None),
            AppError::InvalidCredentials => (
                StatusCode::UNAUTHORIZED,
                "Invalid phone number or password".to_string(),
                None,
                None,
            ),
            AppError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                "Unauthorized".to_string(),
                None,
                None,
            ),
            AppError::InvalidToken => (
                StatusCode::UNAUTHORIZED,
                "Invalid or expired token".to_string(),
                None,
                None,
            ),
            AppError::InvalidOrExpiredCode => (
                StatusCode::BAD_REQUEST,
                "Invalid or expired OTP".to_string(),
                None,
                None,
            ),
            AppError::NotActivated => (
                StatusCode::BAD_REQUEST,
                "Account not activated. Please verify your phone number first.".to_string(),
                None,
                None,
            ),
            AppError::Internal(detail) => {
                tracing::error!("internal error: {detail}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                    None,
                    None,
                )
            }
        };

        (status, Json(ErrorBody { error, code, details })).into_response()
    }
}

fn field_errors(errors: &ValidationErrors) -> Vec<FieldError> {
    errors
        .field_errors()
        .iter()
        .flat_map(|(field, errs)| {
            errs.iter().map(|e| FieldError {
                field: field.to_string(),
                message: e
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| e.code.to_string()),
            })
        })
        .collect()
}

impl From<ValidationErrors> for AppError {
    fn from(errors: ValidationErrors) -> Self {
        AppError::Validation(errors)
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        AppError::Internal(format!("database error: {err}"))
    }
}

impl From<bcrypt::BcryptError> for AppError {
    fn from(err: bcrypt::BcryptError) -> Self {
        AppError::Internal(format!("password hashing error: {err}"))
    }
}

impl From<jsonwebtoken::errors::Error> for AppError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        AppError::Internal(format!("token error: {err}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_follow_taxonomy() {
        assert_eq!(
            AppError::InvalidPhone.into_response().status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::PhoneExists.into_response().status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::NotFound("User not found").into_response().status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::InvalidCredentials.into_response().status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AppError::InvalidToken.into_response().status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AppError::InvalidOrExpiredCode.into_response().status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::Internal("boom".into()).into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
