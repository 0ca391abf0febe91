use actix_web::{web, HttpRequest, HttpResponse};
use payflow_env::{instrument, tracing, Flow};

use super::AppState;
use crate::{
    core::{payments, refunds},
    services::{api, authentication as auth},
};

#[instrument(skip_all, fields(flow = ?Flow::PaymentRetrieve))]
pub async fn payment_retrieve(
    state: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<String>,
) -> HttpResponse {
    let flow = Flow::PaymentRetrieve;
    api::server_wrap(
        flow,
        state,
        &req,
        path.into_inner(),
        |state, auth: auth::AuthenticationData, payment_ref| {
            payments::retrieve_payment(state, auth.merchant, payment_ref)
        },
        &auth::ApiKeyAuth,
    )
    .await
}

#[instrument(skip_all, fields(flow = ?Flow::PaymentCapture))]
pub async fn payment_capture(
    state: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<String>,
) -> HttpResponse {
    let flow = Flow::PaymentCapture;
    api::server_wrap(
        flow,
        state,
        &req,
        path.into_inner(),
        |state, auth: auth::AuthenticationData, payment_ref| {
            payments::payment_capture(state, auth.merchant, payment_ref)
        },
        &auth::ApiKeyAuth,
    )
    .await
}

#[instrument(skip_all, fields(flow = ?Flow::RefundCreate))]
pub async fn refund_create(
    state: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<String>,
    json_payload: web::Json<api_models::refunds::RefundCreateRequest>,
) -> HttpResponse {
    let flow = Flow::RefundCreate;
    let payload = (path.into_inner(), json_payload.into_inner());
    api::server_wrap(
        flow,
        state,
        &req,
        payload,
        |state, auth: auth::AuthenticationData, (payment_ref, request)| {
            refunds::refund_create(state, auth.merchant, payment_ref, request)
        },
        &auth::ApiKeyAuth,
    )
    .await
}

#[instrument(skip_all, fields(flow = ?Flow::RefundList))]
pub async fn refund_list(
    state: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<String>,
) -> HttpResponse {
    let flow = Flow::RefundList;
    api::server_wrap(
        flow,
        state,
        &req,
        path.into_inner(),
        |state, auth: auth::AuthenticationData, payment_ref| {
            refunds::refund_list(state, auth.merchant, payment_ref)
        },
        &auth::ApiKeyAuth,
    )
    .await
}
