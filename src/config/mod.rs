use std::env;
use std::time::Duration;

#[derive(Debug, Clone, serde::Deserialize)]
pub struct Config {
    pub database_url: String,
    pub redis_url: String,
    pub jwt_secret: String,
    pub server_host: String,
    pub server_port: u16,
    pub api_base_uri: String,
    pub session_ttl_days: u64,
    pub otp_ttl_secs: u64,
    pub rate_limit_window_secs: u64,
    pub rate_limit_requests: u32,
    /// Accept the fixed staging phone/code pair without a stored OTP.
    pub enable_test_otp: bool,
    /// Echo freshly issued OTPs in API responses (local development only).
    pub expose_dev_otp: bool,
    /// Delete outstanding OTPs for a phone when a new one is issued.
    pub invalidate_prior_otps: bool,
}

impl Config {
    pub fn from_env() -> Result<Self, env::VarError> {
        dotenv::dotenv().ok();

        Ok(Config {
            database_url: env::var("DATABASE_URL")?,
            redis_url: env::var("REDIS_URL")?,
            jwt_secret: env::var("JWT_SECRET")?,
            server_host: env::var("SERVER_HOST").unwrap_or_else(|_| "::".into()),
            server_port: env::var("SERVER_PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(3000),
            api_base_uri: env::var("API_BASE_URI").unwrap_or_else(|_| "/api".into()),
            session_ttl_days: env::var("SESSION_TTL_DAYS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(180),
            otp_ttl_secs: env::var("OTP_TTL_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(600),
            rate_limit_window_secs: env::var("RATE_LIMIT_WINDOW")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(60),
            rate_limit_requests: env::var("RATE_LIMIT_REQUESTS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(100),
            enable_test_otp: flag("ENABLE_TEST_OTP"),
            expose_dev_otp: flag("EXPOSE_DEV_OTP"),
            invalidate_prior_otps: flag("INVALIDATE_PRIOR_OTPS"),
        })
    }

    pub fn session_ttl(&self) -> Duration {
        Duration::from_secs(self.session_ttl_days * 24 * 3600)
    }

    pub fn otp_ttl(&self) -> Duration {
        Duration::from_secs(self.otp_ttl_secs)
    }

    pub fn rate_limit_window(&self) -> Duration {
        Duration::from_secs(self.rate_limit_window_secs)
    }
}

fn flag(name: &str) -> bool {
    env::var(name)
        .map(|v| matches!(v.trim(), "1" | "true" | "yes"))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_default_off() {
        assert!(!flag("RENTDESK_TEST_FLAG_THAT_IS_UNSET"));
    }

    #[test]
    fn ttl_helpers_scale_units() {
        let config = Config {
            database_url: String::new(),
            redis_url: String::new(),
            jwt_secret: "secret".into(),
            server_host: "::".into(),
            server_port: 3000,
            api_base_uri: "/api".into(),
            session_ttl_days: 180,
            otp_ttl_secs: 600,
            rate_limit_window_secs: 60,
            rate_limit_requests: 100,
            enable_test_otp: false,
            expose_dev_otp: false,
            invalidate_prior_otps: false,
        };
        assert_eq!(config.session_ttl().as_secs(), 180 * 24 * 3600);
        assert_eq!(config.otp_ttl().as_secs(), 600);
    }
}
