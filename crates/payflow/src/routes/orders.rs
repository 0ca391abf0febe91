use actix_web::{web, HttpRequest, HttpResponse};
use payflow_env::{instrument, tracing, Flow};

use super::AppState;
use crate::{
    core::orders,
    services::{api, authentication as auth},
};

#[instrument(skip_all, fields(flow = ?Flow::OrderCreate))]
pub async fn order_create(
    state: web::Data<AppState>,
    req: HttpRequest,
    json_payload: web::Json<api_models::orders::OrderCreateRequest>,
) -> HttpResponse {
    let flow = Flow::OrderCreate;
    api::server_wrap(
        flow,
        state,
        &req,
        json_payload.into_inner(),
        |state, auth: auth::AuthenticationData, request| {
            orders::create_order(state, auth.merchant, request)
        },
        &auth::ApiKeyAuth,
    )
    .await
}

#[instrument(skip_all, fields(flow = ?Flow::OrderList))]
pub async fn order_list(
    state: web::Data<AppState>,
    req: HttpRequest,
    query: web::Query<api_models::orders::OrderListConstraints>,
) -> HttpResponse {
    let flow = Flow::OrderList;
    api::server_wrap(
        flow,
        state,
        &req,
        query.into_inner(),
        |state, auth: auth::AuthenticationData, constraints| {
            orders::list_orders(state, auth.merchant, constraints)
        },
        &auth::ApiKeyAuth,
    )
    .await
}

#[instrument(skip_all, fields(flow = ?Flow::OrderRetrieve))]
pub async fn order_retrieve(
    state: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<String>,
) -> HttpResponse {
    let flow = Flow::OrderRetrieve;
    api::server_wrap(
        flow,
        state,
        &req,
        path.into_inner(),
        |state, auth: auth::AuthenticationData, order_ref| {
            orders::retrieve_order(state, auth.merchant, order_ref)
        },
        &auth::ApiKeyAuth,
    )
    .await
}

#[instrument(skip_all, fields(flow = ?Flow::OrderPaymentsList))]
pub async fn order_payments_list(
    state: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<String>,
) -> HttpResponse {
    let flow = Flow::OrderPaymentsList;
    api::server_wrap(
        flow,
        state,
        &req,
        path.into_inner(),
        |state, auth: auth::AuthenticationData, order_ref| {
            orders::list_order_payments(state, auth.merchant, order_ref)
        },
        &auth::ApiKeyAuth,
    )
    .await
}
