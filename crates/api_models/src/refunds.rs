use serde::{Deserialize, Serialize};
use time::PrimitiveDateTime;

use crate::enums;

/// Request body for `POST /v1/payments/{payment_ref}/refund`.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RefundCreateRequest {
    /// Amount to reverse in minor units; defaults to the remaining
    /// refundable balance.
    pub amount: Option<i64>,
    pub reason: Option<String>,
    pub notes: Option<String>,
    /// Deduplication key scoped to the payment; duplicate requests return
    /// the original refund.
    pub idempotency_key: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RefundResponse {
    pub refund_ref: String,
    pub payment_ref: String,
    pub amount: i64,
    pub currency: enums::Currency,
    pub status: enums::RefundStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(with = "common_utils::custom_serde::iso8601")]
    pub created_at: PrimitiveDateTime,
}

#[derive(Clone, Debug, Serialize)]
pub struct RefundListResponse {
    pub count: usize,
    pub data: Vec<RefundResponse>,
}
