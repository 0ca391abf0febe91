use actix_web::{web, HttpRequest, HttpResponse};
use payflow_env::{instrument, tracing, Flow};

use super::AppState;
use crate::{
    core::{api_keys, merchants},
    services::{api, authentication as auth},
};

#[instrument(skip_all, fields(flow = ?Flow::MerchantCreate))]
pub async fn merchant_create(
    state: web::Data<AppState>,
    req: HttpRequest,
    json_payload: web::Json<api_models::merchants::MerchantCreateRequest>,
) -> HttpResponse {
    let flow = Flow::MerchantCreate;
    api::server_wrap(
        flow,
        state,
        &req,
        json_payload.into_inner(),
        |state, user: auth::UserFromToken, request| {
            merchants::create_merchant(state, user, request)
        },
        &auth::MerchantJwtAuth,
    )
    .await
}

#[instrument(skip_all, fields(flow = ?Flow::MerchantRetrieve))]
pub async fn merchant_retrieve(
    state: web::Data<AppState>,
    req: HttpRequest,
) -> HttpResponse {
    let flow = Flow::MerchantRetrieve;
    api::server_wrap(
        flow,
        state,
        &req,
        (),
        |state, (_, merchant): (auth::UserFromToken, _), _| {
            merchants::retrieve_merchant(state, merchant)
        },
        &auth::MerchantAccountAuth,
    )
    .await
}

#[instrument(skip_all, fields(flow = ?Flow::MerchantQrCode))]
pub async fn merchant_qr_code(
    state: web::Data<AppState>,
    req: HttpRequest,
) -> HttpResponse {
    let flow = Flow::MerchantQrCode;
    api::server_wrap(
        flow,
        state,
        &req,
        (),
        |state, (_, merchant): (auth::UserFromToken, _), _| {
            merchants::merchant_qr_code(state, merchant)
        },
        &auth::MerchantAccountAuth,
    )
    .await
}

#[instrument(skip_all, fields(flow = ?Flow::ApiKeyCreate))]
pub async fn api_key_create(
    state: web::Data<AppState>,
    req: HttpRequest,
    json_payload: web::Json<api_models::merchants::ApiKeyCreateRequest>,
) -> HttpResponse {
    let flow = Flow::ApiKeyCreate;
    api::server_wrap(
        flow,
        state,
        &req,
        json_payload.into_inner(),
        |state, (_, merchant): (auth::UserFromToken, _), request| {
            api_keys::create_api_key(state, merchant, request)
        },
        &auth::MerchantAccountAuth,
    )
    .await
}

#[instrument(skip_all, fields(flow = ?Flow::ApiKeyRevoke))]
pub async fn api_key_revoke(
    state: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<String>,
) -> HttpResponse {
    let flow = Flow::ApiKeyRevoke;
    api::server_wrap(
        flow,
        state,
        &req,
        path.into_inner(),
        |state, (_, merchant): (auth::UserFromToken, _), key_id| {
            api_keys::revoke_api_key(state, merchant, key_id)
        },
        &auth::MerchantAccountAuth,
    )
    .await
}
