use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;
use validator::Validate;

use crate::{config::Config, error::AppError, phone};

/// Fixed staging pair accepted by verify/reset when `enable_test_otp` is
/// set. The account behind the phone must still exist.
pub const TEST_PHONE: &str = "+263771234567";
pub const TEST_CODE: &str = "123456";

#[derive(Debug, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub full_name: String,
    pub phone: String,
    pub city: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Account subset returned by the auth flows; the phone is stripped of the
/// country prefix for display.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: Uuid,
    pub full_name: String,
    pub phone: String,
    pub city: String,
    pub is_active: bool,
}

const USER_COLUMNS: &str = "id, full_name, phone, city, password_hash, is_active, created_at, updated_at";

impl User {
    pub fn to_public(&self) -> UserResponse {
        UserResponse {
            id: self.id,
            full_name: self.full_name.clone(),
            phone: phone::display(&self.phone),
            city: self.city.clone(),
            is_active: self.is_active,
        }
    }

    pub async fn find_by_phone(pool: &PgPool, phone: &str) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE phone = $1"
        ))
        .bind(phone)
        .fetch_optional(pool)
        .await
    }

    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Inserts a new inactive account. The unique index on `phone` is the
    /// authoritative duplicate guard; a violation surfaces as the conflict
    /// error even when the caller's pre-check raced.
    pub async fn create(
        pool: &PgPool,
        phone: &str,
        full_name: &str,
        password_hash: &str,
        city: &str,
    ) -> Result<Self, AppError> {
        sqlx::query_as::<_, User>(&format!(
            "INSERT INTO users (id, full_name, phone, city, password_hash, is_active) \
             VALUES ($1, $2, $3, $4, $5, false) \
             RETURNING {USER_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(full_name)
        .bind(phone)
        .bind(city)
        .bind(password_hash)
        .fetch_one(pool)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db) if db.is_unique_violation() => AppError::PhoneExists,
            _ => AppError::from(e),
        })
    }

    /// Marks the account verified. Activation happens at most once per
    /// account; repeating the update is a no-op.
    pub async fn activate(pool: &PgPool, phone: &str) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, User>(&format!(
            "UPDATE users SET is_active = true, updated_at = now() \
             WHERE phone = $1 \
             RETURNING {USER_COLUMNS}"
        ))
        .bind(phone)
        .fetch_optional(pool)
        .await
    }

    pub async fn update_password(
        pool: &PgPool,
        phone: &str,
        password_hash: &str,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, User>(&format!(
            "UPDATE users SET password_hash = $1, updated_at = now() \
             WHERE phone = $2 \
             RETURNING {USER_COLUMNS}"
        ))
        .bind(password_hash)
        .bind(phone)
        .fetch_optional(pool)
        .await
    }

    /// Partial profile update; unspecified fields keep their values.
    pub async fn update_profile(
        pool: &PgPool,
        id: Uuid,
        full_name: Option<&str>,
        phone: Option<&str>,
        city: Option<&str>,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, User>(&format!(
            "UPDATE users SET \
               full_name = COALESCE($1, full_name), \
               phone = COALESCE($2, phone), \
               city = COALESCE($3, city), \
               updated_at = now() \
             WHERE id = $4 \
             RETURNING {USER_COLUMNS}"
        ))
        .bind(full_name)
        .bind(phone)
        .bind(city)
        .bind(id)
        .fetch_optional(pool)
        .await
    }
}

#[derive(Debug, FromRow)]
pub struct Otp {
    pub id: Uuid,
    pub phone: String,
    pub code: String,
    pub expires_at: DateTime<Utc>,
}

impl Otp {
    /// Uniformly random 6-digit code; leading zeros are valid.
    pub fn generate_code() -> String {
        format!("{:06}", rand::thread_rng().gen_range(0..1_000_000u32))
    }

    /// Stores a fresh code for the phone and logs it in place of the SMS
    /// send. Outstanding codes for the same phone are left alone unless
    /// `invalidate_prior_otps` is set.
    pub async fn issue(pool: &PgPool, config: &Config, phone: &str) -> Result<String, sqlx::Error> {
        if config.invalidate_prior_otps {
            sqlx::query("DELETE FROM otps WHERE phone = $1")
                .bind(phone)
                .execute(pool)
                .await?;
        }

        let code = Self::generate_code();
        let expires_at = Utc::now() + Duration::seconds(config.otp_ttl().as_secs() as i64);

        sqlx::query("INSERT INTO otps (id, phone, code, expires_at) VALUES ($1, $2, $3, $4)")
            .bind(Uuid::new_v4())
            .bind(phone)
            .bind(&code)
            .bind(expires_at)
            .execute(pool)
            .await?;

        tracing::info!("[MOCK SMS] OTP for {}: {}", phone, code);
        Ok(code)
    }

    /// Looks up a non-expired code matching both phone and code exactly.
    /// Expired rows stay in place; expiry is enforced here, not by a
    /// purge job.
    pub async fn find_valid(
        pool: &PgPool,
        phone: &str,
        code: &str,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Otp>(
            "SELECT id, phone, code, expires_at FROM otps \
             WHERE phone = $1 AND code = $2 AND expires_at > now() \
             ORDER BY expires_at DESC LIMIT 1",
        )
        .bind(phone)
        .bind(code)
        .fetch_optional(pool)
        .await
    }

    /// Single-use: the flow that validated the code deletes it.
    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<(), sqlx::Error> {
        sqlx::query("DELETE FROM otps WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(())
    }

    pub fn is_test_bypass(config: &Config, phone: &str, code: &str) -> bool {
        config.enable_test_otp && phone == TEST_PHONE && code == TEST_CODE
    }
}

#[derive(Debug, FromRow)]
pub struct Session {
    pub id: Uuid,
    pub user_id: Uuid,
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

impl Session {
    /// Persists the session row backing a freshly minted token. Sessions
    /// are never updated; expiry is the only invalidation path.
    pub async fn create(
        pool: &PgPool,
        config: &Config,
        user_id: Uuid,
        token: &str,
    ) -> Result<Self, sqlx::Error> {
        let expires_at = Utc::now() + Duration::seconds(config.session_ttl().as_secs() as i64);

        sqlx::query_as::<_, Session>(
            "INSERT INTO sessions (id, user_id, token, expires_at) \
             VALUES ($1, $2, $3, $4) \
             RETURNING id, user_id, token, expires_at",
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(token)
        .bind(expires_at)
        .fetch_one(pool)
        .await
    }
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    #[validate(length(min = 2, message = "Full name must be at least 2 characters"))]
    pub full_name: String,
    #[validate(length(min = 8, message = "Phone number is required"))]
    pub phone: String,
    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub password: String,
    #[validate(length(min = 2, message = "City is required"))]
    pub city: String,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    #[validate(length(min = 8, message = "Phone number is required"))]
    pub phone: String,
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SendOtpRequest {
    #[validate(length(min = 1, message = "Phone number is required"))]
    pub phone: String,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct VerifyOtpRequest {
    #[validate(length(min = 8, message = "Phone number is required"))]
    pub phone: String,
    #[validate(length(equal = 6, message = "OTP must be 6 digits"))]
    pub code: String,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ForgotPasswordRequest {
    #[validate(length(min = 8, message = "Phone number is required"))]
    pub phone: String,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ResetPasswordRequest {
    #[validate(length(min = 8, message = "Phone number is required"))]
    pub phone: String,
    #[validate(length(equal = 6, message = "OTP must be 6 digits"))]
    pub code: String,
    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub new_password: String,
}

#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub message: String,
    pub user: UserResponse,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub otp: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub message: String,
    pub user: UserResponse,
    pub token: String,
}

#[derive(Debug, Serialize)]
pub struct SendOtpResponse {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub otp: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ForgotPasswordResponse {
    pub message: String,
    pub phone: String,
}
