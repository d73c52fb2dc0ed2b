use axum::{Json, extract::State};
use validator::Validate;

use crate::{
    AppState,
    error::AppError,
    phone,
    utils::{generate_token, hash_password, verify_password},
};

use super::model::{
    AuthResponse, ForgotPasswordRequest, ForgotPasswordResponse, LoginRequest, Otp,
    RegisterRequest, RegisterResponse, ResetPasswordRequest, SendOtpRequest, SendOtpResponse,
    Session, User, VerifyOtpRequest,
};

/// Mints a token for the account and persists the matching session row.
async fn issue_session(state: &AppState, user: &User) -> Result<String, AppError> {
    let (token, _) = generate_token(user.id, &user.phone, &user.full_name, &state.config)?;
    Session::create(&state.pool, &state.config, user.id, &token).await?;
    Ok(token)
}

/// Creates an inactive account and issues its verification OTP. The
/// existence pre-check is advisory; the unique index on `phone` decides
/// conflicts when concurrent registrations race.
#[axum::debug_handler]
pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<Json<RegisterResponse>, AppError> {
    req.validate()?;
    let canonical = phone::normalize(&req.phone)?;

    if User::find_by_phone(&state.pool, &canonical).await?.is_some() {
        return Err(AppError::PhoneExists);
    }

    let password_hash = hash_password(&req.password)?;
    let user = User::create(
        &state.pool,
        &canonical,
        &req.full_name,
        &password_hash,
        &req.city,
    )
    .await?;

    let otp = Otp::issue(&state.pool, &state.config, &canonical).await?;

    Ok(Json(RegisterResponse {
        message: "Registration successful. Please verify your phone number with the OTP sent."
            .into(),
        user: user.to_public(),
        otp: state.config.expose_dev_otp.then_some(otp),
    }))
}

/// Unknown phone, wrong password and inactive account all map to the same
/// 401 so the endpoint cannot be used to enumerate accounts.
#[axum::debug_handler]
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, AppError> {
    req.validate()?;
    let canonical = phone::normalize(&req.phone)?;

    let user = User::find_by_phone(&state.pool, &canonical)
        .await?
        .ok_or(AppError::InvalidCredentials)?;

    if !user.is_active {
        return Err(AppError::InvalidCredentials);
    }
    if !verify_password(&req.password, &user.password_hash)? {
        return Err(AppError::InvalidCredentials);
    }

    let token = issue_session(&state, &user).await?;
    Ok(Json(AuthResponse {
        message: "Login successful".into(),
        user: user.to_public(),
        token,
    }))
}

/// Issues a code for an already-canonical phone. No account check: codes
/// may be requested before the account is activated, or re-requested after
/// a crash left an account without one.
#[axum::debug_handler]
pub async fn send_otp(
    State(state): State<AppState>,
    Json(req): Json<SendOtpRequest>,
) -> Result<Json<SendOtpResponse>, AppError> {
    req.validate()?;
    if !phone::is_canonical(&req.phone) {
        return Err(AppError::InvalidPhone);
    }

    let otp = Otp::issue(&state.pool, &state.config, &req.phone).await?;

    Ok(Json(SendOtpResponse {
        message: "OTP sent successfully".into(),
        otp: state.config.expose_dev_otp.then_some(otp),
    }))
}

/// Consumes a valid code and activates the account. The staging bypass
/// skips the code store but never the account lookup.
#[axum::debug_handler]
pub async fn verify_otp(
    State(state): State<AppState>,
    Json(req): Json<VerifyOtpRequest>,
) -> Result<Json<AuthResponse>, AppError> {
    req.validate()?;
    let canonical = phone::normalize(&req.phone)?;

    let consumed = if Otp::is_test_bypass(&state.config, &canonical, &req.code) {
        None
    } else {
        Some(
            Otp::find_valid(&state.pool, &canonical, &req.code)
                .await?
                .ok_or(AppError::InvalidOrExpiredCode)?,
        )
    };

    let user = User::activate(&state.pool, &canonical)
        .await?
        .ok_or(AppError::NotFound("User not found"))?;

    if let Some(record) = consumed {
        Otp::delete(&state.pool, record.id).await?;
    }

    let token = issue_session(&state, &user).await?;
    Ok(Json(AuthResponse {
        message: "Account verified successfully".into(),
        user: user.to_public(),
        token,
    }))
}

/// Starts the reset flow for a verified account. Unlike login this leaks
/// account existence by design: the caller is recovering a known account.
#[axum::debug_handler]
pub async fn forgot_password(
    State(state): State<AppState>,
    Json(req): Json<ForgotPasswordRequest>,
) -> Result<Json<ForgotPasswordResponse>, AppError> {
    req.validate()?;
    let canonical = phone::normalize(&req.phone)?;

    let user = User::find_by_phone(&state.pool, &canonical)
        .await?
        .ok_or(AppError::NotFound("No account found with this phone number"))?;

    if !user.is_active {
        return Err(AppError::NotActivated);
    }

    Otp::issue(&state.pool, &state.config, &canonical).await?;

    Ok(Json(ForgotPasswordResponse {
        message: "OTP sent to your phone number. Please check your SMS.".into(),
        phone: phone::display(&canonical),
    }))
}

/// Validates a code, stores the new password hash and signs the caller in.
/// Activation is not required: a never-verified account may still reset
/// its password.
#[axum::debug_handler]
pub async fn reset_password(
    State(state): State<AppState>,
    Json(req): Json<ResetPasswordRequest>,
) -> Result<Json<AuthResponse>, AppError> {
    req.validate()?;
    let canonical = phone::normalize(&req.phone)?;

    let consumed = if Otp::is_test_bypass(&state.config, &canonical, &req.code) {
        None
    } else {
        Some(
            Otp::find_valid(&state.pool, &canonical, &req.code)
                .await?
                .ok_or(AppError::InvalidOrExpiredCode)?,
        )
    };

    let password_hash = hash_password(&req.new_password)?;
    let user = User::update_password(&state.pool, &canonical, &password_hash)
        .await?
        .ok_or(AppError::NotFound("User not found"))?;

    if let Some(record) = consumed {
        Otp::delete(&state.pool, record.id).await?;
    }

    let token = issue_session(&state, &user).await?;
    Ok(Json(AuthResponse {
        message: "Password reset successfully".into(),
        user: user.to_public(),
        token,
    }))
}
