use serde::{Deserialize, Serialize};
use time::PrimitiveDateTime;

use crate::enums;

/// Request body for `POST /v1/orders`.
#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OrderCreateRequest {
    /// Amount to collect, in minor currency units. Must be positive.
    pub amount: i64,
    /// ISO 4217 currency; `INR` when omitted.
    pub currency: Option<enums::Currency>,
    /// Merchant-side receipt reference, echoed back verbatim.
    pub receipt: Option<String>,
    /// Opaque merchant notes, at most 4 KiB.
    pub notes: Option<String>,
    /// Deduplication key; one is synthesized when absent.
    pub idempotency_key: Option<String>,
    /// Whether an authorized payment is captured in the same transaction.
    /// Defaults to `true`.
    pub auto_capture: Option<bool>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct OrderResponse {
    pub order_ref: String,
    pub amount: i64,
    pub currency: enums::Currency,
    pub status: enums::OrderStatus,
    pub receipt: Option<String>,
    pub notes: Option<String>,
    pub auto_capture: bool,
    #[serde(with = "common_utils::custom_serde::iso8601")]
    pub created_at: PrimitiveDateTime,
}

/// Pagination constraints for `GET /v1/orders`.
#[derive(Clone, Copy, Debug, Default, Deserialize)]
pub struct OrderListConstraints {
    /// Maximum number of orders to return; server-capped.
    pub count: Option<i64>,
    /// Number of orders to skip, newest first.
    pub skip: Option<i64>,
}

#[derive(Clone, Debug, Serialize)]
pub struct OrderListResponse {
    pub count: usize,
    pub data: Vec<OrderResponse>,
}
