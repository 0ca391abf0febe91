//! Types for recording what a request is doing.

use std::fmt;

/// Anything usable as the `flow` field on request spans.
pub trait FlowMetric: fmt::Display + fmt::Debug + Clone {}

/// API flows of the gateway, one per externally observable operation.
#[derive(Clone, Copy, Debug, strum::Display)]
pub enum Flow {
    HealthCheck,
    UserSignUp,
    UserLogin,
    UserChangePassword,
    MerchantCreate,
    MerchantRetrieve,
    MerchantQrCode,
    ApiKeyCreate,
    ApiKeyRevoke,
    OrderCreate,
    OrderList,
    OrderRetrieve,
    OrderPaymentsList,
    PaymentRetrieve,
    PaymentCapture,
    RefundCreate,
    RefundList,
    WebhookLogsList,
    CheckoutInfo,
    CheckoutPaymentSubmit,
    AdminStats,
    AdminFlaggedPayments,
}

impl FlowMetric for Flow {}
