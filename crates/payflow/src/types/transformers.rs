//! Conversions between storage rows and API responses.
//!
//! The orphan rule prevents `From` impls between foreign pairs, so the
//! conversions live behind local `ForeignFrom`/`ForeignInto` traits.

use api_models::{admin, checkout, merchants, orders, payments, refunds, users, webhooks};
use masking::PeekInterface;

use crate::types::storage;

pub trait ForeignFrom<F> {
    fn foreign_from(from: F) -> Self;
}

pub trait ForeignInto<T> {
    fn foreign_into(self) -> T;
}

impl<F, T> ForeignInto<T> for F
where
    T: ForeignFrom<F>,
{
    fn foreign_into(self) -> T {
        T::foreign_from(self)
    }
}

impl ForeignFrom<storage::Order> for orders::OrderResponse {
    fn foreign_from(order: storage::Order) -> Self {
        Self {
            order_ref: order.order_ref,
            amount: order.amount,
            currency: order.currency,
            status: order.status,
            receipt: order.receipt,
            notes: order.notes,
            auto_capture: order.auto_capture,
            created_at: order.created_at,
        }
    }
}

impl ForeignFrom<storage::Payment> for payments::PaymentResponse {
    fn foreign_from(payment: storage::Payment) -> Self {
        Self {
            payment_ref: payment.payment_ref,
            order_ref: payment.order_ref,
            amount: payment.amount,
            currency: payment.currency,
            method: payment.method,
            status: payment.status,
            is_flagged: payment.is_flagged,
            fraud_rule_hits: payment.fraud_rule_hits,
            error_code: payment.error_code,
            error_reason: payment.error_reason,
            created_at: payment.created_at,
        }
    }
}

impl ForeignFrom<storage::Payment> for checkout::PaymentSubmitResponse {
    fn foreign_from(payment: storage::Payment) -> Self {
        Self {
            payment_ref: payment.payment_ref,
            order_ref: payment.order_ref,
            amount: payment.amount,
            status: payment.status,
            is_flagged: payment.is_flagged,
        }
    }
}

impl ForeignFrom<storage::Refund> for refunds::RefundResponse {
    fn foreign_from(refund: storage::Refund) -> Self {
        Self {
            refund_ref: refund.refund_ref,
            payment_ref: refund.payment_ref,
            amount: refund.amount,
            currency: refund.currency,
            status: refund.status,
            reason: refund.reason,
            created_at: refund.created_at,
        }
    }
}

impl ForeignFrom<storage::User> for users::UserResponse {
    fn foreign_from(user: storage::User) -> Self {
        Self {
            name: user.name,
            email: user.email,
            role: user.role,
            created_at: user.created_at,
        }
    }
}

/// Builds the merchant view; the webhook secret is withheld unless
/// `reveal_secret` is set (creation response only).
pub fn merchant_response(
    merchant: storage::Merchant,
    reveal_secret: bool,
) -> merchants::MerchantResponse {
    merchants::MerchantResponse {
        merchant_id: merchant.merchant_id,
        business_name: merchant.business_name,
        business_email: merchant.business_email,
        website: merchant.website,
        webhook_url: merchant.webhook_url,
        webhook_secret: reveal_secret
            .then(|| merchant.webhook_secret.peek().clone().into()),
        created_at: merchant.created_at,
    }
}

impl ForeignFrom<storage::Payment> for admin::FlaggedPayment {
    fn foreign_from(payment: storage::Payment) -> Self {
        Self {
            payment_ref: payment.payment_ref,
            order_ref: payment.order_ref,
            merchant_id: payment.merchant_id,
            amount: payment.amount,
            currency: payment.currency,
            method: payment.method,
            status: payment.status,
            fraud_rule_hits: payment.fraud_rule_hits,
            created_at: payment.created_at,
        }
    }
}

impl ForeignFrom<storage::WebhookLog> for webhooks::WebhookDeliveryLog {
    fn foreign_from(log: storage::WebhookLog) -> Self {
        Self {
            event_id: log.event_id,
            event: log.event,
            attempt: log.attempt,
            response_code: log.response_code,
            response_body: log.response_body,
            delivery_status: log.delivery_status,
            created_at: log.created_at,
        }
    }
}
