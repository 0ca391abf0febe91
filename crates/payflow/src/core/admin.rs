//! Read-only analytics for the admin dashboard.

use api_models::admin;
use error_stack::ResultExt;
use payflow_env::{instrument, tracing};

use crate::{
    consts,
    core::errors::{self, RouterResponse},
    routes::AppState,
    services,
    types::transformers::ForeignFrom,
};

#[instrument(skip_all)]
pub async fn get_stats(state: AppState) -> RouterResponse<admin::StatsResponse> {
    let total_merchants = state
        .store
        .count_merchants()
        .await
        .change_context(errors::ApiErrorResponse::InternalServerError)?;
    let total_orders = state
        .store
        .count_orders()
        .await
        .change_context(errors::ApiErrorResponse::InternalServerError)?;
    let payment_stats = state
        .store
        .get_payment_stats()
        .await
        .change_context(errors::ApiErrorResponse::InternalServerError)?;
    let refunded_volume = state
        .store
        .get_refunded_volume()
        .await
        .change_context(errors::ApiErrorResponse::InternalServerError)?;

    Ok(services::ApplicationResponse::Json(admin::StatsResponse {
        total_merchants,
        total_orders,
        total_payments: payment_stats.total_payments,
        captured_payments: payment_stats.captured_payments,
        failed_payments: payment_stats.failed_payments,
        flagged_payments: payment_stats.flagged_payments,
        captured_volume: payment_stats.captured_volume,
        refunded_volume,
    }))
}

#[instrument(skip_all)]
pub async fn list_flagged_payments(
    state: AppState,
) -> RouterResponse<admin::FlaggedPaymentsResponse> {
    let flagged = state
        .store
        .list_flagged_payments(consts::LIST_MAX_LIMIT)
        .await
        .change_context(errors::ApiErrorResponse::InternalServerError)?;

    let data: Vec<admin::FlaggedPayment> =
        flagged.into_iter().map(ForeignFrom::foreign_from).collect();
    Ok(services::ApplicationResponse::Json(
        admin::FlaggedPaymentsResponse {
            count: data.len(),
            data,
        },
    ))
}
