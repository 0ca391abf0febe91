use common_utils::pii;
use masking::Secret;
use serde::{Deserialize, Serialize};

use crate::enums;

/// Request body for `POST /pay/{order_ref}`, submitted by the hosted
/// checkout. Sensitive fields arrive wrapped so they cannot leak through
/// request logging.
#[derive(Clone, Debug, Deserialize)]
pub struct PaymentSubmitRequest {
    pub method: enums::PaymentMethod,
    /// UPI virtual payment address, required for `upi`.
    pub vpa: Option<Secret<String>>,
    /// Full card number; only the last four digits are persisted.
    pub card_number: Option<Secret<String>>,
    /// Card expiry in `MM/YY`; never persisted.
    pub card_expiry: Option<Secret<String>>,
    /// Card verification value; never persisted.
    pub card_cvv: Option<Secret<String>>,
    /// Name on the card.
    pub card_name: Option<String>,
    /// Account email, required for `netbanking`.
    pub email: Option<pii::Email>,
    /// Contact number, required for `netbanking` and `wallet`.
    pub contact: Option<pii::PhoneNumber>,
}

/// Response returned to the hosted checkout.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PaymentSubmitResponse {
    pub payment_ref: String,
    pub order_ref: String,
    pub amount: i64,
    pub status: enums::PaymentStatus,
    pub is_flagged: bool,
}

/// Public merchant display information for `GET /pay/{order_ref}/merchant`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CheckoutInfoResponse {
    pub business_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
    pub order: CheckoutOrderSummary,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CheckoutOrderSummary {
    pub order_ref: String,
    pub amount: i64,
    pub currency: enums::Currency,
    pub status: enums::OrderStatus,
}
