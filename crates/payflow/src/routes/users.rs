use actix_web::{web, HttpRequest, HttpResponse};
use payflow_env::{instrument, tracing, Flow};

use super::AppState;
use crate::{
    core::users,
    services::{api, authentication as auth},
};

#[instrument(skip_all, fields(flow = ?Flow::UserSignUp))]
pub async fn user_signup(
    state: web::Data<AppState>,
    req: HttpRequest,
    json_payload: web::Json<api_models::users::SignUpRequest>,
) -> HttpResponse {
    let flow = Flow::UserSignUp;
    api::server_wrap(
        flow,
        state,
        &req,
        json_payload.into_inner(),
        |state, _: (), request| users::user_signup(state, request),
        &auth::NoAuth,
    )
    .await
}

#[instrument(skip_all, fields(flow = ?Flow::UserLogin))]
pub async fn user_login(
    state: web::Data<AppState>,
    req: HttpRequest,
    json_payload: web::Json<api_models::users::LoginRequest>,
) -> HttpResponse {
    let flow = Flow::UserLogin;
    api::server_wrap(
        flow,
        state,
        &req,
        json_payload.into_inner(),
        |state, _: (), request| users::user_login(state, request),
        &auth::NoAuth,
    )
    .await
}

#[instrument(skip_all, fields(flow = ?Flow::UserChangePassword))]
pub async fn change_password(
    state: web::Data<AppState>,
    req: HttpRequest,
    json_payload: web::Json<api_models::users::ChangePasswordRequest>,
) -> HttpResponse {
    let flow = Flow::UserChangePassword;
    api::server_wrap(
        flow,
        state,
        &req,
        json_payload.into_inner(),
        |state, user: auth::UserFromToken, request| users::change_password(state, user, request),
        &auth::JWTAuth,
    )
    .await
}
