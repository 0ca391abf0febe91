use serde::{Deserialize, Serialize};
use time::PrimitiveDateTime;

use crate::enums;

/// Aggregate figures for `GET /admin/stats`. Volumes are integer minor
/// units.
#[derive(Clone, Debug, Default, Serialize)]
pub struct StatsResponse {
    pub total_merchants: u64,
    pub total_orders: u64,
    pub total_payments: u64,
    pub captured_payments: u64,
    pub failed_payments: u64,
    pub flagged_payments: u64,
    pub captured_volume: i64,
    pub refunded_volume: i64,
}

/// One flagged payment as listed by `GET /admin/flagged`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FlaggedPayment {
    pub payment_ref: String,
    pub order_ref: String,
    pub merchant_id: String,
    pub amount: i64,
    pub currency: enums::Currency,
    pub method: enums::PaymentMethod,
    pub status: enums::PaymentStatus,
    pub fraud_rule_hits: Vec<String>,
    #[serde(with = "common_utils::custom_serde::iso8601")]
    pub created_at: PrimitiveDateTime,
}

#[derive(Clone, Debug, Serialize)]
pub struct FlaggedPaymentsResponse {
    pub count: usize,
    pub data: Vec<FlaggedPayment>,
}
