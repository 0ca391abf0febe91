pub mod admin;
pub mod app;
pub mod checkout;
pub mod health;
pub mod merchants;
pub mod orders;
pub mod payments;
pub mod users;
pub mod webhooks;

pub use self::app::{Admin, AppState, Checkout, Health, Merchants, Orders, Payments, Users, Webhooks};
