use actix_web::{web, HttpRequest, HttpResponse};
use payflow_env::{instrument, tracing, Flow};

use super::AppState;
use crate::{
    core::admin,
    services::{api, authentication as auth},
};

#[instrument(skip_all, fields(flow = ?Flow::AdminStats))]
pub async fn stats(state: web::Data<AppState>, req: HttpRequest) -> HttpResponse {
    let flow = Flow::AdminStats;
    api::server_wrap(
        flow,
        state,
        &req,
        (),
        |state, _: auth::UserFromToken, _| admin::get_stats(state),
        &auth::AdminJwtAuth,
    )
    .await
}

#[instrument(skip_all, fields(flow = ?Flow::AdminFlaggedPayments))]
pub async fn flagged(state: web::Data<AppState>, req: HttpRequest) -> HttpResponse {
    let flow = Flow::AdminFlaggedPayments;
    api::server_wrap(
        flow,
        state,
        &req,
        (),
        |state, _: auth::UserFromToken, _| admin::list_flagged_payments(state),
        &auth::AdminJwtAuth,
    )
    .await
}
