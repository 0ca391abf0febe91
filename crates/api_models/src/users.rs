use masking::Secret;
use serde::{Deserialize, Serialize};
use time::PrimitiveDateTime;

use crate::enums;

/// Request body for `POST /auth/register`.
#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SignUpRequest {
    pub name: String,
    pub email: String,
    pub password: Secret<String>,
    /// Defaults to `user`.
    pub role: Option<enums::UserRole>,
}

#[derive(Clone, Debug, Serialize)]
pub struct UserResponse {
    pub name: String,
    pub email: String,
    pub role: enums::UserRole,
    #[serde(with = "common_utils::custom_serde::iso8601")]
    pub created_at: PrimitiveDateTime,
}

/// Request body for `POST /auth/login-json`.
#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoginRequest {
    pub email: String,
    pub password: Secret<String>,
}

#[derive(Clone, Debug, Serialize)]
pub struct LoginResponse {
    pub access_token: Secret<String>,
    pub token_type: String,
}

/// Request body for `POST /auth/change-password`.
#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ChangePasswordRequest {
    pub old_password: Secret<String>,
    pub new_password: Secret<String>,
}
