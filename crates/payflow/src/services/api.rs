//! The request pipeline every handler goes through.
//!
//! [`server_wrap`] authenticates the caller, runs the core function, and
//! shapes the outcome into an [`actix_web::HttpResponse`], logging the flow
//! and request id on the way. Core functions stay HTTP-free: they return
//! [`ApplicationResponse`] values and error reports.

use std::{fmt::Debug, future::Future};

use actix_web::{web, FromRequest, HttpRequest, HttpResponse, ResponseError};
use payflow_env::{logger, tracing, tracing_actix_web::RequestId, Flow};
use serde::Serialize;

use crate::{
    core::errors::{self, RouterResponse, RouterResult},
    routes::AppState,
    services::authentication as auth,
};

/// What a core function resolved to, independent of HTTP.
#[derive(Debug, Eq, PartialEq)]
pub enum ApplicationResponse<R> {
    Json(R),
    JsonWithHeaders((R, Vec<(String, String)>)),
    StatusOk,
    TextPlain(String),
    /// Raw bytes plus their content type, e.g. a QR code PNG.
    FileData((Vec<u8>, String)),
}

async fn server_wrap_util<T, U, Q, F, Fut>(
    state: &web::Data<AppState>,
    request: &HttpRequest,
    payload: T,
    func: F,
    api_auth: &dyn auth::AuthenticateAndFetch<U>,
) -> RouterResult<ApplicationResponse<Q>>
where
    F: FnOnce(AppState, U, T) -> Fut,
    Fut: Future<Output = RouterResponse<Q>>,
{
    let (auth_out, auth_type) = api_auth
        .authenticate_and_fetch(request.headers(), state)
        .await?;

    if let Some(merchant_id) = auth_type.merchant_id() {
        tracing::Span::current().record("merchant_id", merchant_id);
    }

    func(state.get_ref().clone(), auth_out, payload).await
}

#[payflow_env::instrument(
    skip(state, request, payload, func, api_auth),
    fields(request_id, request_method, request_url_path, merchant_id, flow = %flow)
)]
pub async fn server_wrap<T, U, Q, F, Fut>(
    flow: Flow,
    state: web::Data<AppState>,
    request: &HttpRequest,
    payload: T,
    func: F,
    api_auth: &dyn auth::AuthenticateAndFetch<U>,
) -> HttpResponse
where
    F: FnOnce(AppState, U, T) -> Fut,
    Fut: Future<Output = RouterResponse<Q>>,
    Q: Serialize + Debug,
    T: Debug,
{
    let span = tracing::Span::current();
    span.record("request_method", request.method().as_str());
    span.record("request_url_path", request.path());
    if let Ok(request_id) = RequestId::extract(request).await {
        let request_id = request_id.to_string();
        span.record("request_id", request_id.as_str());
    }

    logger::info!(?flow, "begin request");

    let result = server_wrap_util(&state, request, payload, func, api_auth).await;

    let response = match result {
        Ok(ApplicationResponse::Json(response)) => match serde_json::to_string(&response) {
            Ok(body) => http_response_json(body),
            Err(error) => {
                logger::error!(?error, "failed to serialize response");
                errors::ApiErrorResponse::InternalServerError.error_response()
            }
        },
        Ok(ApplicationResponse::JsonWithHeaders((response, headers))) => {
            match serde_json::to_string(&response) {
                Ok(body) => http_response_json_with_headers(body, headers),
                Err(error) => {
                    logger::error!(?error, "failed to serialize response");
                    errors::ApiErrorResponse::InternalServerError.error_response()
                }
            }
        }
        Ok(ApplicationResponse::StatusOk) => HttpResponse::Ok().finish(),
        Ok(ApplicationResponse::TextPlain(text)) => http_response_plaintext(text),
        Ok(ApplicationResponse::FileData((data, content_type))) => {
            http_response_file_data(data, content_type)
        }
        Err(report) => {
            logger::error!(error = ?report, "request failed");
            report.current_context().error_response()
        }
    };

    logger::info!(status_code = response.status().as_u16(), "end request");
    response
}

pub fn http_response_json(body: String) -> HttpResponse {
    HttpResponse::Ok()
        .content_type("application/json")
        .body(body)
}

pub fn http_response_json_with_headers(
    body: String,
    headers: Vec<(String, String)>,
) -> HttpResponse {
    let mut builder = HttpResponse::Ok();
    for (name, value) in &headers {
        builder.insert_header((name.as_str(), value.as_str()));
    }
    builder.content_type("application/json").body(body)
}

pub fn http_response_plaintext(body: String) -> HttpResponse {
    HttpResponse::Ok().content_type("text/plain").body(body)
}

pub fn http_response_file_data(data: Vec<u8>, content_type: String) -> HttpResponse {
    HttpResponse::Ok().content_type(content_type).body(data)
}
