use api_models::orders;
use common_utils::fp_utils::when;
use error_stack::{report, ResultExt};
use payflow_env::{instrument, tracing};

use crate::{
    consts,
    core::errors::{self, RouterResponse, StorageErrorExt},
    routes::AppState,
    services,
    types::{
        storage,
        transformers::{ForeignFrom, ForeignInto},
    },
};

fn validate_order_request(request: &orders::OrderCreateRequest) -> errors::RouterResult<()> {
    when(request.amount <= 0, || {
        Err(report!(errors::ApiErrorResponse::InvalidRequestData {
            message: "amount must be a positive integer in minor currency units".to_string(),
        }))
    })?;
    when(
        request
            .notes
            .as_ref()
            .is_some_and(|notes| notes.len() > consts::MAX_NOTES_LENGTH),
        || {
            Err(report!(errors::ApiErrorResponse::InvalidRequestData {
                message: format!("notes must not exceed {} bytes", consts::MAX_NOTES_LENGTH),
            }))
        },
    )
}

#[instrument(skip_all)]
pub async fn create_order(
    state: AppState,
    merchant: storage::Merchant,
    request: orders::OrderCreateRequest,
) -> RouterResponse<orders::OrderResponse> {
    validate_order_request(&request)?;

    let idempotency_key = request
        .idempotency_key
        .clone()
        .unwrap_or_else(|| common_utils::generate_id_with_default_len("pf_idem"));

    let order_new = storage::OrderNew {
        order_ref: common_utils::generate_id_with_default_len(consts::ORDER_REF_PREFIX),
        merchant_id: merchant.merchant_id.clone(),
        amount: request.amount,
        currency: request.currency.unwrap_or_default(),
        receipt: request.receipt.clone(),
        notes: request.notes.clone(),
        auto_capture: request.auto_capture.unwrap_or(true),
        idempotency_key: idempotency_key.clone(),
    };

    match state.store.insert_order(order_new).await {
        Ok(order) => Ok(services::ApplicationResponse::Json(order.foreign_into())),
        Err(error) if error.current_context().is_db_unique_violation() => {
            let existing = state
                .store
                .find_order_by_merchant_id_idempotency_key(&merchant.merchant_id, &idempotency_key)
                .await
                .change_context(errors::ApiErrorResponse::InternalServerError)?;

            let body_matches = existing.amount == request.amount
                && existing.currency == request.currency.unwrap_or_default()
                && existing.receipt == request.receipt
                && existing.notes == request.notes;
            when(!body_matches, || {
                Err(report!(errors::ApiErrorResponse::IdempotencyPayloadMismatch))
            })?;

            Ok(services::ApplicationResponse::JsonWithHeaders((
                existing.foreign_into(),
                vec![("X-Idempotent-Replay".to_string(), "true".to_string())],
            )))
        }
        Err(error) => Err(error.change_context(errors::ApiErrorResponse::InternalServerError)),
    }
}

#[instrument(skip_all)]
pub async fn retrieve_order(
    state: AppState,
    merchant: storage::Merchant,
    order_ref: String,
) -> RouterResponse<orders::OrderResponse> {
    let order = find_owned_order(&state, &merchant, &order_ref).await?;
    Ok(services::ApplicationResponse::Json(order.foreign_into()))
}

#[instrument(skip_all)]
pub async fn list_orders(
    state: AppState,
    merchant: storage::Merchant,
    constraints: orders::OrderListConstraints,
) -> RouterResponse<orders::OrderListResponse> {
    let limit = constraints
        .count
        .unwrap_or(consts::LIST_DEFAULT_LIMIT)
        .clamp(1, consts::LIST_MAX_LIMIT);
    let offset = constraints.skip.unwrap_or(0).max(0);

    let orders = state
        .store
        .list_orders_by_merchant_id(&merchant.merchant_id, limit, offset)
        .await
        .change_context(errors::ApiErrorResponse::InternalServerError)?;

    let data: Vec<orders::OrderResponse> =
        orders.into_iter().map(ForeignFrom::foreign_from).collect();
    Ok(services::ApplicationResponse::Json(
        orders::OrderListResponse {
            count: data.len(),
            data,
        },
    ))
}

#[instrument(skip_all)]
pub async fn list_order_payments(
    state: AppState,
    merchant: storage::Merchant,
    order_ref: String,
) -> RouterResponse<api_models::payments::PaymentListResponse> {
    let order = find_owned_order(&state, &merchant, &order_ref).await?;

    let payments = state
        .store
        .list_payments_by_order_id(order.id)
        .await
        .change_context(errors::ApiErrorResponse::InternalServerError)?;

    let data: Vec<api_models::payments::PaymentResponse> =
        payments.into_iter().map(ForeignFrom::foreign_from).collect();
    Ok(services::ApplicationResponse::Json(
        api_models::payments::PaymentListResponse {
            count: data.len(),
            data,
        },
    ))
}

/// Resolve an order reference for a merchant-scoped route: unknown refs are
/// not found, refs owned by another merchant are forbidden.
pub(crate) async fn find_owned_order(
    state: &AppState,
    merchant: &storage::Merchant,
    order_ref: &str,
) -> errors::RouterResult<storage::Order> {
    let order = state
        .store
        .find_order_by_order_ref(order_ref)
        .await
        .to_not_found_response(errors::ApiErrorResponse::OrderNotFound)?;
    when(order.merchant_id != merchant.merchant_id, || {
        Err(report!(errors::ApiErrorResponse::AccessForbidden))
    })?;
    Ok(order)
}
