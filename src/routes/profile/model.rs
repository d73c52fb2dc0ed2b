use serde::{Deserialize, Serialize};

use crate::routes::auth::User;

/// Partial profile update; absent fields stay untouched.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileRequest {
    pub full_name: Option<String>,
    pub phone: Option<String>,
    pub city: Option<String>,
}

/// The full account record (hash excluded via serde), canonical phone and
/// timestamps included.
#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub user: User,
}
