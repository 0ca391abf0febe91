//! Refund creation and listing.
//!
//! The refundable balance is derived by summing processed refunds, never by
//! mutating a counter. The handler validates the balance up front for a
//! fast conflict, the simulator outcome is obtained with no transaction
//! open, and the storage operation re-checks the balance under the payment
//! row lock before inserting.

use api_models::{enums, refunds};
use common_utils::fp_utils::when;
use error_stack::report;
use payflow_env::{instrument, tracing};

use crate::{
    consts,
    core::{
        errors::{self, RouterResponse},
        gateway::RefundOutcome,
        payments::find_owned_payment,
        webhooks,
    },
    routes::AppState,
    services,
    types::{
        storage,
        transformers::{ForeignFrom, ForeignInto},
    },
    utils,
};

fn map_refund_error(
    error: error_stack::Report<errors::StorageError>,
) -> error_stack::Report<errors::ApiErrorResponse> {
    match error.current_context() {
        errors::StorageError::RefundBalanceExceeded => {
            error.change_context(errors::ApiErrorResponse::RefundAmountExceeded)
        }
        errors::StorageError::InvalidTransition { current_state, .. } => {
            let current_state = current_state.clone();
            error
                .change_context(errors::ApiErrorResponse::PaymentUnexpectedState { current_state })
        }
        errors::StorageError::ValueNotFound(_) => {
            error.change_context(errors::ApiErrorResponse::PaymentNotFound)
        }
        _ => error.change_context(errors::ApiErrorResponse::InternalServerError),
    }
}

#[instrument(skip_all, fields(payment_ref = %payment_ref))]
pub async fn refund_create(
    state: AppState,
    merchant: storage::Merchant,
    payment_ref: String,
    request: refunds::RefundCreateRequest,
) -> RouterResponse<refunds::RefundResponse> {
    let payment = find_owned_payment(&state, &merchant, &payment_ref).await?;

    // Replay an identical refund instead of summing it twice. Runs before
    // the state check so retrying a completed full refund still replays.
    if let Some(key) = request.idempotency_key.as_deref() {
        if let Some(existing) = state
            .store
            .find_refund_by_payment_id_idempotency_key(payment.id, key)
            .await
            .map_err(|error| error.change_context(errors::ApiErrorResponse::InternalServerError))?
        {
            return Ok(services::ApplicationResponse::Json(existing.foreign_into()));
        }
    }

    when(!payment.status.is_refundable(), || {
        Err(report!(errors::ApiErrorResponse::PaymentUnexpectedState {
            current_state: payment.status.to_string(),
        }))
    })?;

    let existing_refunds = state
        .store
        .list_refunds_by_payment_id(payment.id)
        .await
        .map_err(|error| error.change_context(errors::ApiErrorResponse::InternalServerError))?;
    let already_refunded: i64 = existing_refunds
        .iter()
        .filter(|refund| refund.status == enums::RefundStatus::Processed)
        .map(|refund| refund.amount)
        .sum();

    let amount = request.amount.unwrap_or(payment.amount - already_refunded);
    when(amount <= 0, || {
        Err(report!(errors::ApiErrorResponse::InvalidRequestData {
            message: "refund amount must be a positive integer in minor units".to_string(),
        }))
    })?;
    when(already_refunded + amount > payment.amount, || {
        Err(report!(errors::ApiErrorResponse::RefundAmountExceeded))
    })?;

    // Simulator outcome first; the storage operation re-checks the balance
    // under the row lock.
    let outcome = state
        .gateway
        .execute_refund(&payment, amount, request.reason.as_deref())
        .await;
    let status = match outcome {
        RefundOutcome::Processed => enums::RefundStatus::Processed,
        RefundOutcome::Failed => enums::RefundStatus::Failed,
    };

    let refund_new = storage::RefundNew {
        refund_ref: common_utils::generate_id_with_default_len(consts::REFUND_REF_PREFIX),
        payment_id: payment.id,
        payment_ref: payment.payment_ref.clone(),
        merchant_id: payment.merchant_id.clone(),
        amount,
        currency: payment.currency,
        reason: request.reason.clone(),
        notes: request.notes.clone(),
        status,
        idempotency_key: request.idempotency_key.clone(),
    };

    let events = if status == enums::RefundStatus::Processed {
        vec![webhooks::refund_event(
            enums::EventType::RefundProcessed,
            &refund_new,
        )]
    } else {
        Vec::new()
    };

    let result = utils::retry_transient(|| {
        state
            .store
            .create_refund(refund_new.clone(), events.clone())
    })
    .await;

    let (refund, _payment) = match result {
        Ok(created) => created,
        // A concurrent identical request won the idempotency race; return
        // its refund.
        Err(error) if error.current_context().is_db_unique_violation() => {
            if let Some(key) = request.idempotency_key.as_deref() {
                let existing = state
                    .store
                    .find_refund_by_payment_id_idempotency_key(payment.id, key)
                    .await
                    .map_err(|error| {
                        error.change_context(errors::ApiErrorResponse::InternalServerError)
                    })?
                    .ok_or_else(|| {
                        report!(errors::ApiErrorResponse::InternalServerError)
                    })?;
                return Ok(services::ApplicationResponse::Json(existing.foreign_into()));
            }
            return Err(error.change_context(errors::ApiErrorResponse::InternalServerError));
        }
        Err(error) => return Err(map_refund_error(error)),
    };

    Ok(services::ApplicationResponse::Json(refund.foreign_into()))
}

#[instrument(skip_all, fields(payment_ref = %payment_ref))]
pub async fn refund_list(
    state: AppState,
    merchant: storage::Merchant,
    payment_ref: String,
) -> RouterResponse<refunds::RefundListResponse> {
    let payment = find_owned_payment(&state, &merchant, &payment_ref).await?;

    let refunds = state
        .store
        .list_refunds_by_payment_id(payment.id)
        .await
        .map_err(|error| error.change_context(errors::ApiErrorResponse::InternalServerError))?;

    let data: Vec<refunds::RefundResponse> =
        refunds.into_iter().map(ForeignFrom::foreign_from).collect();
    Ok(services::ApplicationResponse::Json(
        refunds::RefundListResponse {
            count: data.len(),
            data,
        },
    ))
}
