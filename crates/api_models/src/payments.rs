use serde::{Deserialize, Serialize};
use time::PrimitiveDateTime;

use crate::enums;

/// Merchant-facing view of a payment. Method details beyond the method name
/// itself are withheld; card data in particular is reduced to last-4 and the
/// holder name at persistence time and never echoed.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PaymentResponse {
    pub payment_ref: String,
    pub order_ref: String,
    pub amount: i64,
    pub currency: enums::Currency,
    pub method: enums::PaymentMethod,
    pub status: enums::PaymentStatus,
    pub is_flagged: bool,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub fraud_rule_hits: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_reason: Option<String>,
    #[serde(with = "common_utils::custom_serde::iso8601")]
    pub created_at: PrimitiveDateTime,
}

#[derive(Clone, Debug, Serialize)]
pub struct PaymentListResponse {
    pub count: usize,
    pub data: Vec<PaymentResponse>,
}
