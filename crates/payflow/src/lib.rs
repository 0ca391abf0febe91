#![forbid(unsafe_code)]

pub mod configs;
pub mod connection;
pub mod consts;
pub mod core;
pub mod db;
pub mod routes;
pub mod services;
pub mod types;
pub mod utils;
pub mod workers;

use actix_cors::Cors;
use actix_web::{middleware, web, App, HttpServer};
use error_stack::ResultExt;
pub use payflow_env::logger;
use payflow_env::tracing_actix_web::TracingLogger;

use crate::{
    configs::settings::Settings,
    core::errors::{ApplicationError, ApplicationResult},
    routes::AppState,
};

/// Connect, migrate, start the webhook workers and serve until shutdown.
pub async fn start_server(conf: Settings) -> ApplicationResult<()> {
    let state = AppState::new(conf.clone()).await?;
    workers::webhook_delivery::spawn_workers(&state);

    let app_state = web::Data::new(state);
    logger::info!(
        host = %conf.server.host,
        port = conf.server.port,
        "starting the payflow gateway"
    );

    HttpServer::new(move || {
        App::new()
            .app_data(app_state.clone())
            .wrap(Cors::permissive())
            .wrap(middleware::NormalizePath::trim())
            .wrap(TracingLogger::default())
            .service(routes::Health::server())
            .service(routes::Users::server())
            .service(routes::Merchants::server())
            .service(routes::Orders::server())
            .service(routes::Payments::server())
            .service(routes::Webhooks::server())
            .service(routes::Checkout::server())
            .service(routes::Admin::server())
    })
    .bind((conf.server.host.clone(), conf.server.port))
    .change_context(ApplicationError::ServerError)?
    .workers(conf.server.workers)
    .run()
    .await
    .change_context(ApplicationError::ServerError)
}
