#![forbid(unsafe_code)]
pub mod admin;
pub mod checkout;
pub mod enums;
pub mod merchants;
pub mod orders;
pub mod payments;
pub mod refunds;
pub mod users;
pub mod webhooks;
