use serde::{Deserialize, Serialize};

/// Lifecycle of an order, the merchant's declared intent to collect.
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    Eq,
    PartialEq,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum OrderStatus {
    #[default]
    Created,
    Attempted,
    Paid,
}

/// Lifecycle of a single payment attempt against an order.
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    Eq,
    PartialEq,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum PaymentStatus {
    #[default]
    Created,
    Authorized,
    Captured,
    Failed,
    Refunded,
    PartiallyRefunded,
}

impl PaymentStatus {
    /// Whether funds have been captured at some point (the order counts as
    /// paid).
    pub fn is_post_capture(self) -> bool {
        matches!(self, Self::Captured | Self::Refunded | Self::PartiallyRefunded)
    }

    /// Whether this attempt blocks further attempts on the same order.
    pub fn blocks_new_attempts(self) -> bool {
        !matches!(self, Self::Failed)
    }

    /// Whether a refund can still be created against this payment.
    pub fn is_refundable(self) -> bool {
        matches!(self, Self::Captured | Self::PartiallyRefunded)
    }
}

/// Supported payment methods on the hosted checkout.
#[derive(
    Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize, strum::Display, strum::EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum PaymentMethod {
    Upi,
    Card,
    Netbanking,
    Wallet,
}

/// Outcome of a refund, which is single-shot.
#[derive(
    Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize, strum::Display, strum::EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum RefundStatus {
    Processed,
    Failed,
}

/// Delivery state of an outbox row.
#[derive(
    Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize, strum::Display, strum::EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum WebhookDeliveryStatus {
    Pending,
    Delivered,
    Failed,
}

impl WebhookDeliveryStatus {
    /// Terminal rows are never picked up again.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Delivered | Self::Failed)
    }
}

/// Webhook event names carried in `X-PayFlow-Event` and the body.
#[derive(
    Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize, strum::Display, strum::EnumString,
)]
pub enum EventType {
    #[serde(rename = "payment.captured")]
    #[strum(serialize = "payment.captured")]
    PaymentCaptured,
    #[serde(rename = "payment.failed")]
    #[strum(serialize = "payment.failed")]
    PaymentFailed,
    #[serde(rename = "order.paid")]
    #[strum(serialize = "order.paid")]
    OrderPaid,
    #[serde(rename = "refund.processed")]
    #[strum(serialize = "refund.processed")]
    RefundProcessed,
}

/// Dashboard identity roles.
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    Eq,
    PartialEq,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum UserRole {
    #[default]
    User,
    Merchant,
    Admin,
}

/// The currencies the gateway accepts. Amounts are integers in the minor
/// unit of the currency.
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    Eq,
    PartialEq,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
pub enum Currency {
    AED,
    AUD,
    CAD,
    EUR,
    GBP,
    #[default]
    INR,
    JPY,
    SGD,
    USD,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_type_uses_dotted_names() {
        assert_eq!(EventType::PaymentCaptured.to_string(), "payment.captured");
        assert_eq!(
            serde_json::to_string(&EventType::OrderPaid).expect("serialize"),
            r#""order.paid""#
        );
    }

    #[test]
    fn payment_status_round_trips_snake_case() {
        let parsed: PaymentStatus = "partially_refunded".parse().expect("parse");
        assert_eq!(parsed, PaymentStatus::PartiallyRefunded);
        assert_eq!(parsed.to_string(), "partially_refunded");
    }
}
