//! Persisted row types, their insertable forms and typed updates.
//!
//! Rows are plain data keyed by ids; relationships are foreign-key columns,
//! never embedded references. `*Update` enums enumerate the legal column
//! mutations so the storage layer cannot write arbitrary states.

use api_models::enums::{
    Currency, EventType, OrderStatus, PaymentMethod, PaymentStatus, RefundStatus, UserRole,
    WebhookDeliveryStatus,
};
use masking::Secret;
use time::PrimitiveDateTime;

#[derive(Clone, Debug)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub password_hash: Secret<String>,
    pub role: UserRole,
    pub created_at: PrimitiveDateTime,
}

#[derive(Clone, Debug)]
pub struct UserNew {
    pub name: String,
    pub email: String,
    pub password_hash: Secret<String>,
    pub role: UserRole,
}

#[derive(Clone, Debug)]
pub struct Merchant {
    pub merchant_id: String,
    pub owner_user_id: i64,
    pub business_name: String,
    pub business_email: String,
    pub website: Option<String>,
    pub webhook_url: Option<String>,
    /// 32 CSPRNG bytes, hex-encoded; shared with the merchant for webhook
    /// signature verification.
    pub webhook_secret: Secret<String>,
    pub created_at: PrimitiveDateTime,
}

#[derive(Clone, Debug)]
pub struct MerchantNew {
    pub merchant_id: String,
    pub owner_user_id: i64,
    pub business_name: String,
    pub business_email: String,
    pub website: Option<String>,
    pub webhook_url: Option<String>,
    pub webhook_secret: Secret<String>,
}

#[derive(Clone, Debug)]
pub struct ApiKey {
    pub key_id: String,
    pub merchant_id: String,
    pub key_secret_hash: Secret<String>,
    pub label: String,
    pub active: bool,
    pub created_at: PrimitiveDateTime,
    pub last_used_at: Option<PrimitiveDateTime>,
}

#[derive(Clone, Debug)]
pub struct ApiKeyNew {
    pub key_id: String,
    pub merchant_id: String,
    pub key_secret_hash: Secret<String>,
    pub label: String,
}

#[derive(Clone, Debug)]
pub struct Order {
    pub id: i64,
    pub order_ref: String,
    pub merchant_id: String,
    pub amount: i64,
    pub currency: Currency,
    pub receipt: Option<String>,
    pub notes: Option<String>,
    pub status: OrderStatus,
    pub auto_capture: bool,
    pub idempotency_key: String,
    pub created_at: PrimitiveDateTime,
}

#[derive(Clone, Debug)]
pub struct OrderNew {
    pub order_ref: String,
    pub merchant_id: String,
    pub amount: i64,
    pub currency: Currency,
    pub receipt: Option<String>,
    pub notes: Option<String>,
    pub auto_capture: bool,
    pub idempotency_key: String,
}

#[derive(Clone, Debug)]
pub enum OrderUpdate {
    StatusUpdate { status: OrderStatus },
}

impl OrderUpdate {
    /// Fold the update into a row, as applied by the in-memory store.
    pub fn apply(self, order: Order) -> Order {
        match self {
            Self::StatusUpdate { status } => Order { status, ..order },
        }
    }
}

#[derive(Clone, Debug)]
pub struct Payment {
    pub id: i64,
    pub payment_ref: String,
    pub order_id: i64,
    pub order_ref: String,
    pub merchant_id: String,
    pub amount: i64,
    pub currency: Currency,
    pub method: PaymentMethod,
    pub status: PaymentStatus,
    /// Derived customer identity used for fraud history lookups.
    pub customer_id: Option<String>,
    pub vpa: Option<Secret<String>>,
    pub card_last4: Option<String>,
    pub card_name: Option<String>,
    pub email: Option<Secret<String>>,
    pub contact: Option<Secret<String>>,
    pub is_flagged: bool,
    pub fraud_rule_hits: Vec<String>,
    pub error_code: Option<String>,
    pub error_reason: Option<String>,
    pub created_at: PrimitiveDateTime,
}

#[derive(Clone, Debug)]
pub struct PaymentNew {
    pub payment_ref: String,
    pub order_id: i64,
    pub order_ref: String,
    pub merchant_id: String,
    pub amount: i64,
    pub currency: Currency,
    pub method: PaymentMethod,
    pub customer_id: Option<String>,
    pub vpa: Option<Secret<String>>,
    pub card_last4: Option<String>,
    pub card_name: Option<String>,
    pub email: Option<Secret<String>>,
    pub contact: Option<Secret<String>>,
    pub is_flagged: bool,
    pub fraud_rule_hits: Vec<String>,
}

#[derive(Clone, Debug)]
pub enum PaymentUpdate {
    /// The simulator authorized the attempt; `status` is `Captured` under
    /// auto-capture, `Authorized` otherwise.
    AuthorizationSucceeded { status: PaymentStatus },
    AuthorizationFailed {
        error_code: String,
        error_reason: String,
    },
    CaptureUpdate,
    RefundStatusUpdate { status: PaymentStatus },
}

impl PaymentUpdate {
    pub fn apply(self, payment: Payment) -> Payment {
        match self {
            Self::AuthorizationSucceeded { status } => Payment { status, ..payment },
            Self::AuthorizationFailed {
                error_code,
                error_reason,
            } => Payment {
                status: PaymentStatus::Failed,
                error_code: Some(error_code),
                error_reason: Some(error_reason),
                ..payment
            },
            Self::CaptureUpdate => Payment {
                status: PaymentStatus::Captured,
                ..payment
            },
            Self::RefundStatusUpdate { status } => Payment { status, ..payment },
        }
    }

    /// The status this update writes.
    pub fn target_status(&self) -> PaymentStatus {
        match self {
            Self::AuthorizationSucceeded { status } | Self::RefundStatusUpdate { status } => {
                *status
            }
            Self::AuthorizationFailed { .. } => PaymentStatus::Failed,
            Self::CaptureUpdate => PaymentStatus::Captured,
        }
    }
}

#[derive(Clone, Debug)]
pub struct Refund {
    pub id: i64,
    pub refund_ref: String,
    pub payment_id: i64,
    pub payment_ref: String,
    pub merchant_id: String,
    pub amount: i64,
    pub currency: Currency,
    pub reason: Option<String>,
    pub notes: Option<String>,
    pub status: RefundStatus,
    pub idempotency_key: Option<String>,
    pub created_at: PrimitiveDateTime,
}

#[derive(Clone, Debug)]
pub struct RefundNew {
    pub refund_ref: String,
    pub payment_id: i64,
    pub payment_ref: String,
    pub merchant_id: String,
    pub amount: i64,
    pub currency: Currency,
    pub reason: Option<String>,
    pub notes: Option<String>,
    pub status: RefundStatus,
    pub idempotency_key: Option<String>,
}

/// Durable outbox row. Appended in the same transaction as the state
/// transition that caused it; drained by the webhook delivery workers.
#[derive(Clone, Debug)]
pub struct WebhookEvent {
    pub id: i64,
    pub merchant_id: String,
    pub event: EventType,
    pub payload: serde_json::Value,
    pub status: WebhookDeliveryStatus,
    pub attempts: i32,
    pub next_attempt_at: PrimitiveDateTime,
    pub last_response_code: Option<i32>,
    pub last_response_body: Option<String>,
    pub created_at: PrimitiveDateTime,
}

#[derive(Clone, Debug)]
pub struct WebhookEventNew {
    pub merchant_id: String,
    pub event: EventType,
    pub payload: serde_json::Value,
}

#[derive(Clone, Debug)]
pub enum WebhookEventUpdate {
    DeliverySucceeded {
        response_code: i32,
        response_body: Option<String>,
    },
    /// Attempt failed; retry at `next_attempt_at`.
    DeliveryFailed {
        response_code: Option<i32>,
        response_body: Option<String>,
        next_attempt_at: PrimitiveDateTime,
    },
    /// Attempt failed and the retry budget is spent.
    RetriesExhausted {
        response_code: Option<i32>,
        response_body: Option<String>,
    },
}

impl WebhookEventUpdate {
    pub fn apply(self, event: WebhookEvent) -> WebhookEvent {
        match self {
            Self::DeliverySucceeded {
                response_code,
                response_body,
            } => WebhookEvent {
                status: WebhookDeliveryStatus::Delivered,
                attempts: event.attempts + 1,
                last_response_code: Some(response_code),
                last_response_body: response_body,
                ..event
            },
            Self::DeliveryFailed {
                response_code,
                response_body,
                next_attempt_at,
            } => WebhookEvent {
                status: WebhookDeliveryStatus::Pending,
                attempts: event.attempts + 1,
                next_attempt_at,
                last_response_code: response_code,
                last_response_body: response_body,
                ..event
            },
            Self::RetriesExhausted {
                response_code,
                response_body,
            } => WebhookEvent {
                status: WebhookDeliveryStatus::Failed,
                attempts: event.attempts + 1,
                last_response_code: response_code,
                last_response_body: response_body,
                ..event
            },
        }
    }
}

/// One row per delivery attempt, successes and failures alike.
#[derive(Clone, Debug)]
pub struct WebhookLog {
    pub id: i64,
    pub event_id: i64,
    pub merchant_id: String,
    pub event: EventType,
    pub attempt: i32,
    pub response_code: Option<i32>,
    pub response_body: Option<String>,
    pub delivery_status: WebhookDeliveryStatus,
    pub created_at: PrimitiveDateTime,
}

#[derive(Clone, Debug)]
pub struct WebhookLogNew {
    pub event_id: i64,
    pub merchant_id: String,
    pub event: EventType,
    pub attempt: i32,
    pub response_code: Option<i32>,
    pub response_body: Option<String>,
    pub delivery_status: WebhookDeliveryStatus,
}

/// Aggregates backing `GET /admin/stats`.
#[derive(Clone, Copy, Debug, Default)]
pub struct PaymentStats {
    pub total_payments: u64,
    pub captured_payments: u64,
    pub failed_payments: u64,
    pub flagged_payments: u64,
    pub captured_volume: i64,
}
