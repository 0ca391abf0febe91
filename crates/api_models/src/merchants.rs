use masking::Secret;
use serde::{Deserialize, Serialize};
use time::PrimitiveDateTime;

/// Request body for `POST /merchants/`.
#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MerchantCreateRequest {
    pub business_name: String,
    pub business_email: String,
    pub website: Option<String>,
    /// HTTPS endpoint that receives signed event notifications.
    pub webhook_url: Option<String>,
}

#[derive(Clone, Debug, Serialize)]
pub struct MerchantResponse {
    pub merchant_id: String,
    pub business_name: String,
    pub business_email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub webhook_url: Option<String>,
    /// Present only in the creation response; the merchant must record it to
    /// verify webhook signatures.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub webhook_secret: Option<Secret<String>>,
    #[serde(with = "common_utils::custom_serde::iso8601")]
    pub created_at: PrimitiveDateTime,
}

/// Request body for `POST /merchants/me/keys`.
#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ApiKeyCreateRequest {
    /// Human label shown on the dashboard, e.g. "production backend".
    pub label: String,
}

/// The only response that ever carries the key secret.
#[derive(Clone, Debug, Serialize)]
pub struct ApiKeyCreateResponse {
    pub key_id: String,
    /// Plaintext secret, revealed exactly once.
    pub key_secret: Secret<String>,
    pub label: String,
    pub active: bool,
    #[serde(with = "common_utils::custom_serde::iso8601")]
    pub created_at: PrimitiveDateTime,
}

#[derive(Clone, Debug, Serialize)]
pub struct ApiKeyRevokeResponse {
    pub key_id: String,
    pub revoked: bool,
}
