use serde::{Deserialize, Serialize};
use time::PrimitiveDateTime;

use crate::enums;

/// The signed body POSTed to a merchant webhook endpoint. The signature in
/// `X-PayFlow-Signature` is HMAC-SHA256 over the exact serialized bytes of
/// this structure.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct OutgoingWebhook {
    pub event: enums::EventType,
    #[serde(with = "common_utils::custom_serde::iso8601")]
    pub created_at: PrimitiveDateTime,
    pub payload: serde_json::Value,
}

/// One delivery attempt as shown in `GET /v1/webhooks/logs`. Receivers see
/// at-least-once delivery, so every attempt is recorded, including the
/// failed ones that preceded a success.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct WebhookDeliveryLog {
    pub event_id: i64,
    pub event: enums::EventType,
    pub attempt: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_code: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_body: Option<String>,
    pub delivery_status: enums::WebhookDeliveryStatus,
    #[serde(with = "common_utils::custom_serde::iso8601")]
    pub created_at: PrimitiveDateTime,
}

#[derive(Clone, Debug, Serialize)]
pub struct WebhookLogsResponse {
    pub count: usize,
    pub data: Vec<WebhookDeliveryLog>,
}
