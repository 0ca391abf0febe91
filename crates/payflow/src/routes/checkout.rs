use actix_web::{web, HttpRequest, HttpResponse};
use payflow_env::{instrument, tracing, Flow};

use super::AppState;
use crate::{
    core::{merchants, payments},
    services::{api, authentication as auth},
};

#[instrument(skip_all, fields(flow = ?Flow::CheckoutInfo))]
pub async fn checkout_info(
    state: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<String>,
) -> HttpResponse {
    let flow = Flow::CheckoutInfo;
    api::server_wrap(
        flow,
        state,
        &req,
        path.into_inner(),
        |state, _: (), order_ref| merchants::checkout_display_info(state, order_ref),
        &auth::NoAuth,
    )
    .await
}

#[instrument(skip_all, fields(flow = ?Flow::CheckoutPaymentSubmit))]
pub async fn payment_submit(
    state: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<String>,
    json_payload: web::Json<api_models::checkout::PaymentSubmitRequest>,
) -> HttpResponse {
    let flow = Flow::CheckoutPaymentSubmit;
    let payload = (path.into_inner(), json_payload.into_inner());
    api::server_wrap(
        flow,
        state,
        &req,
        payload,
        |state, _: (), (order_ref, request)| payments::payment_submit(state, order_ref, request),
        &auth::NoAuth,
    )
    .await
}
