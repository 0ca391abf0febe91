pub mod admin;
pub mod api_keys;
pub mod errors;
pub mod fraud;
pub mod gateway;
pub mod merchants;
pub mod orders;
pub mod payments;
pub mod refunds;
pub mod users;
pub mod webhooks;
