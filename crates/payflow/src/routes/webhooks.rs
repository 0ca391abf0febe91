use actix_web::{web, HttpRequest, HttpResponse};
use api_models::webhooks::{WebhookLogsResponse, WebhookDeliveryLog};
use error_stack::ResultExt;
use payflow_env::{instrument, tracing, Flow};

use super::AppState;
use crate::{
    consts,
    core::errors,
    services::{self, api, authentication as auth},
    types::transformers::ForeignFrom,
};

#[instrument(skip_all, fields(flow = ?Flow::WebhookLogsList))]
pub async fn webhook_logs(state: web::Data<AppState>, req: HttpRequest) -> HttpResponse {
    let flow = Flow::WebhookLogsList;
    api::server_wrap(
        flow,
        state,
        &req,
        (),
        |state, auth: auth::AuthenticationData, _| async move {
            let logs = state
                .store
                .list_webhook_logs_by_merchant_id(
                    &auth.merchant.merchant_id,
                    consts::LIST_MAX_LIMIT,
                )
                .await
                .change_context(errors::ApiErrorResponse::InternalServerError)?;

            let data: Vec<WebhookDeliveryLog> =
                logs.into_iter().map(ForeignFrom::foreign_from).collect();
            Ok(services::ApplicationResponse::Json(WebhookLogsResponse {
                count: data.len(),
                data,
            }))
        },
        &auth::ApiKeyAuth,
    )
    .await
}
