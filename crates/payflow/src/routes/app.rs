//! Application state and the route tree.

use std::sync::Arc;

use actix_web::{web, Scope};
use error_stack::ResultExt;

use super::{admin, checkout, health, merchants, orders, payments, users, webhooks};
use crate::{
    configs::settings::Settings,
    connection, consts,
    core::{
        errors::{ApplicationError, ApplicationResult},
        gateway::{AuthorizationGateway, SimulatorGateway},
    },
    db::{StorageInterface, Store},
};

/// Everything a handler needs, cloned per worker. No mutable state lives
/// here; shared state is the database behind the connection pool.
#[derive(Clone)]
pub struct AppState {
    pub conf: Arc<Settings>,
    pub store: Arc<dyn StorageInterface>,
    pub gateway: Arc<dyn AuthorizationGateway>,
    /// Process-wide client for webhook deliveries.
    pub api_client: reqwest::Client,
}

impl AppState {
    pub async fn new(conf: Settings) -> ApplicationResult<Self> {
        let pool = connection::pg_pool(&conf).await?;
        connection::run_migrations(&pool).await?;
        Self::with_storage(conf, Arc::new(Store::new(pool)))
    }

    /// Build the state over any storage implementation; tests pass the
    /// in-memory store.
    pub fn with_storage(
        conf: Settings,
        store: Arc<dyn StorageInterface>,
    ) -> ApplicationResult<Self> {
        let api_client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(
                consts::WEBHOOK_DELIVERY_TIMEOUT_SECS,
            ))
            .build()
            .change_context(ApplicationError::ApiClientError)?;

        Ok(Self {
            conf: Arc::new(conf),
            store,
            gateway: Arc::new(SimulatorGateway),
            api_client,
        })
    }

    /// Swap the authorization gateway, e.g. for a test double.
    pub fn with_gateway(mut self, gateway: Arc<dyn AuthorizationGateway>) -> Self {
        self.gateway = gateway;
        self
    }
}

pub struct Health;

impl Health {
    pub fn server() -> Scope {
        web::scope("/health").service(web::resource("").route(web::get().to(health::health)))
    }
}

pub struct Users;

impl Users {
    pub fn server() -> Scope {
        web::scope("/auth")
            .service(web::resource("/register").route(web::post().to(users::user_signup)))
            .service(web::resource("/login-json").route(web::post().to(users::user_login)))
            .service(
                web::resource("/change-password").route(web::post().to(users::change_password)),
            )
    }
}

pub struct Merchants;

impl Merchants {
    pub fn server() -> Scope {
        web::scope("/merchants")
            .service(web::resource("").route(web::post().to(merchants::merchant_create)))
            .service(web::resource("/me").route(web::get().to(merchants::merchant_retrieve)))
            .service(web::resource("/me/keys").route(web::post().to(merchants::api_key_create)))
            .service(
                web::resource("/me/keys/{key_id}")
                    .route(web::delete().to(merchants::api_key_revoke)),
            )
            .service(
                web::resource("/me/qr-code").route(web::get().to(merchants::merchant_qr_code)),
            )
    }
}

pub struct Orders;

impl Orders {
    pub fn server() -> Scope {
        web::scope("/v1/orders")
            .service(
                web::resource("")
                    .route(web::post().to(orders::order_create))
                    .route(web::get().to(orders::order_list)),
            )
            .service(web::resource("/{order_ref}").route(web::get().to(orders::order_retrieve)))
            .service(
                web::resource("/{order_ref}/payments")
                    .route(web::get().to(orders::order_payments_list)),
            )
    }
}

pub struct Payments;

impl Payments {
    pub fn server() -> Scope {
        web::scope("/v1/payments")
            .service(
                web::resource("/{payment_ref}").route(web::get().to(payments::payment_retrieve)),
            )
            .service(
                web::resource("/{payment_ref}/capture")
                    .route(web::post().to(payments::payment_capture)),
            )
            .service(
                web::resource("/{payment_ref}/refund")
                    .route(web::post().to(payments::refund_create)),
            )
            .service(
                web::resource("/{payment_ref}/refunds")
                    .route(web::get().to(payments::refund_list)),
            )
    }
}

pub struct Webhooks;

impl Webhooks {
    pub fn server() -> Scope {
        web::scope("/v1/webhooks")
            .service(web::resource("/logs").route(web::get().to(webhooks::webhook_logs)))
    }
}

pub struct Checkout;

impl Checkout {
    pub fn server() -> Scope {
        web::scope("/pay")
            .service(
                web::resource("/{order_ref}/merchant")
                    .route(web::get().to(checkout::checkout_info)),
            )
            .service(
                web::resource("/{order_ref}").route(web::post().to(checkout::payment_submit)),
            )
    }
}

pub struct Admin;

impl Admin {
    pub fn server() -> Scope {
        web::scope("/admin")
            .service(
                web::resource("/stats")
                    .route(web::get().to(admin::stats))
                    .route(web::post().to(admin::stats)),
            )
            .service(
                web::resource("/flagged")
                    .route(web::get().to(admin::flagged))
                    .route(web::post().to(admin::flagged)),
            )
    }
}
