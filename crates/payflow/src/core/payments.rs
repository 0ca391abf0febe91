//! Payment attempts, authorization and capture.
//!
//! A `POST /pay/{order_ref}` attempt runs in three phases: a transaction
//! that locks the order, rejects competing attempts and inserts the
//! `created` payment; the authorization call with no transaction open; and
//! a second transaction that applies the outcome and appends outbox rows.
//! Two concurrent submissions serialize on the order row and the loser is
//! rejected with a conflict.

use api_models::{checkout, enums, payments};
use common_utils::{date_time, fp_utils::when};
use error_stack::report;
use masking::{ExposeInterface, PeekInterface, Secret};
use payflow_env::{instrument, tracing};
use time::Duration;

use crate::{
    consts,
    core::{
        errors::{self, RouterResponse, StorageErrorExt},
        fraud,
        gateway::AuthorizationOutcome,
        webhooks,
    },
    routes::AppState,
    services,
    types::{storage, transformers::ForeignInto},
    utils,
};

struct MethodDetails {
    customer_id: Option<String>,
    vpa: Option<Secret<String>>,
    card_last4: Option<String>,
    card_name: Option<String>,
    email: Option<Secret<String>>,
    contact: Option<Secret<String>>,
}

/// Validate the method-specific fields and reduce them to what is allowed
/// to persist. Full card numbers, expiries and CVVs never leave this
/// function.
fn extract_method_details(
    request: &checkout::PaymentSubmitRequest,
) -> errors::RouterResult<MethodDetails> {
    let email: Option<Secret<String>> = request
        .email
        .clone()
        .map(|email| email.expose().to_lowercase().into());
    let contact: Option<Secret<String>> = request
        .contact
        .clone()
        .map(|contact| contact.expose().into());

    let missing = |field_name: &'static str| {
        report!(errors::ApiErrorResponse::MissingRequiredField { field_name })
    };

    match request.method {
        enums::PaymentMethod::Upi => {
            let vpa = request
                .vpa
                .clone()
                .ok_or_else(|| missing("vpa"))?
                .expose()
                .to_lowercase();
            Ok(MethodDetails {
                customer_id: Some(vpa.clone()),
                vpa: Some(vpa.into()),
                card_last4: None,
                card_name: None,
                email,
                contact,
            })
        }
        enums::PaymentMethod::Card => {
            let card_number = request.card_number.clone().ok_or_else(|| missing("card_number"))?;
            request.card_expiry.as_ref().ok_or_else(|| missing("card_expiry"))?;
            request.card_cvv.as_ref().ok_or_else(|| missing("card_cvv"))?;

            let digits: String = card_number
                .peek()
                .chars()
                .filter(char::is_ascii_digit)
                .collect();
            when(digits.len() < 12 || digits.len() > 19, || {
                Err(report!(errors::ApiErrorResponse::InvalidRequestData {
                    message: "card_number is not a valid card number".to_string(),
                }))
            })?;
            let card_last4 = digits[digits.len() - 4..].to_string();

            let customer_id = email
                .as_ref()
                .map(|email| email.peek().clone())
                .or_else(|| contact.as_ref().map(|contact| contact.peek().clone()));
            Ok(MethodDetails {
                customer_id,
                vpa: None,
                card_last4: Some(card_last4),
                card_name: request.card_name.clone(),
                email,
                contact,
            })
        }
        enums::PaymentMethod::Netbanking => {
            let email = email.ok_or_else(|| missing("email"))?;
            let contact = contact.ok_or_else(|| missing("contact"))?;
            Ok(MethodDetails {
                customer_id: Some(email.peek().clone()),
                vpa: None,
                card_last4: None,
                card_name: None,
                email: Some(email),
                contact: Some(contact),
            })
        }
        enums::PaymentMethod::Wallet => {
            let contact = contact.ok_or_else(|| missing("contact"))?;
            Ok(MethodDetails {
                customer_id: Some(contact.peek().clone()),
                vpa: None,
                card_last4: None,
                card_name: None,
                email,
                contact: Some(contact),
            })
        }
    }
}

fn map_attempt_error(
    error: error_stack::Report<errors::StorageError>,
) -> error_stack::Report<errors::ApiErrorResponse> {
    match error.current_context() {
        errors::StorageError::ActivePaymentExists => {
            error.change_context(errors::ApiErrorResponse::ActivePaymentExists)
        }
        errors::StorageError::InvalidTransition { current_state, .. } => {
            let current_state = current_state.clone();
            error.change_context(errors::ApiErrorResponse::OrderUnexpectedState { current_state })
        }
        errors::StorageError::ValueNotFound(_) => {
            error.change_context(errors::ApiErrorResponse::OrderNotFound)
        }
        _ => error.change_context(errors::ApiErrorResponse::InternalServerError),
    }
}

fn map_transition_error(
    error: error_stack::Report<errors::StorageError>,
) -> error_stack::Report<errors::ApiErrorResponse> {
    match error.current_context() {
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

#[instrument(skip_all, fields(order_ref = %order_ref))]
pub async fn payment_submit(
    state: AppState,
    order_ref: String,
    request: checkout::PaymentSubmitRequest,
) -> RouterResponse<checkout::PaymentSubmitResponse> {
    let order = state
        .store
        .find_order_by_order_ref(&order_ref)
        .await
        .to_not_found_response(errors::ApiErrorResponse::OrderNotFound)?;

    let details = extract_method_details(&request)?;

    // Fraud history is read outside any transaction; the rules only
    // decorate the attempt.
    let history = match details.customer_id.as_deref() {
        Some(customer_id) => {
            let since = date_time::now() - Duration::seconds(consts::FRAUD_HISTORY_WINDOW_SECS);
            state
                .store
                .list_recent_payments_by_customer_id(customer_id, since)
                .await
                .map_err(|error| {
                    error.change_context(errors::ApiErrorResponse::InternalServerError)
                })?
        }
        None => Vec::new(),
    };
    let evaluation = fraud::evaluate(
        &fraud::FraudInput {
            amount: order.amount,
            method: request.method,
            vpa: details.vpa.as_ref().map(|vpa| vpa.peek().as_str()),
        },
        &fraud::PaymentHistory::from_payments(&history),
    );

    let payment_new = storage::PaymentNew {
        payment_ref: common_utils::generate_id_with_default_len(consts::PAYMENT_REF_PREFIX),
        order_id: order.id,
        order_ref: order.order_ref.clone(),
        merchant_id: order.merchant_id.clone(),
        amount: order.amount,
        currency: order.currency,
        method: request.method,
        customer_id: details.customer_id,
        vpa: details.vpa,
        card_last4: details.card_last4,
        card_name: details.card_name,
        email: details.email,
        contact: details.contact,
        is_flagged: evaluation.is_flagged,
        fraud_rule_hits: evaluation.rule_hits,
    };

    let (payment, order) =
        utils::retry_transient(|| state.store.insert_payment_attempt(payment_new.clone()))
            .await
            .map_err(map_attempt_error)?;

    // Authorization result first, transaction second; no transaction spans
    // the gateway call.
    let outcome = state.gateway.authorize_payment(&payment).await;

    let (update, order_update, events) = match outcome {
        AuthorizationOutcome::Authorized if order.auto_capture => (
            storage::PaymentUpdate::AuthorizationSucceeded {
                status: enums::PaymentStatus::Captured,
            },
            Some(storage::OrderUpdate::StatusUpdate {
                status: enums::OrderStatus::Paid,
            }),
            vec![
                webhooks::payment_event(
                    enums::EventType::PaymentCaptured,
                    &payment,
                    enums::PaymentStatus::Captured,
                    None,
                ),
                webhooks::order_event(
                    enums::EventType::OrderPaid,
                    &order,
                    enums::OrderStatus::Paid,
                ),
            ],
        ),
        AuthorizationOutcome::Authorized => (
            storage::PaymentUpdate::AuthorizationSucceeded {
                status: enums::PaymentStatus::Authorized,
            },
            None,
            Vec::new(),
        ),
        AuthorizationOutcome::Declined {
            error_code,
            error_reason,
        } => (
            storage::PaymentUpdate::AuthorizationFailed {
                error_code: error_code.clone(),
                error_reason: error_reason.clone(),
            },
            None,
            vec![webhooks::payment_event(
                enums::EventType::PaymentFailed,
                &payment,
                enums::PaymentStatus::Failed,
                Some((&error_code, &error_reason)),
            )],
        ),
    };

    let allowed_from = [enums::PaymentStatus::Created];
    let (payment, _order) = utils::retry_transient(|| {
        state.store.process_payment_transition(
            payment.id,
            &allowed_from,
            update.clone(),
            order_update.clone(),
            events.clone(),
        )
    })
    .await
    .map_err(map_transition_error)?;

    Ok(services::ApplicationResponse::Json(payment.foreign_into()))
}

#[instrument(skip_all, fields(payment_ref = %payment_ref))]
pub async fn payment_capture(
    state: AppState,
    merchant: storage::Merchant,
    payment_ref: String,
) -> RouterResponse<payments::PaymentResponse> {
    let payment = find_owned_payment(&state, &merchant, &payment_ref).await?;

    // Double capture is a no-op returning the same resource.
    if payment.status == enums::PaymentStatus::Captured {
        return Ok(services::ApplicationResponse::Json(payment.foreign_into()));
    }

    let order = state
        .store
        .find_order_by_order_ref(&payment.order_ref)
        .await
        .map_err(|error| error.change_context(errors::ApiErrorResponse::InternalServerError))?;

    let events = vec![
        webhooks::payment_event(
            enums::EventType::PaymentCaptured,
            &payment,
            enums::PaymentStatus::Captured,
            None,
        ),
        webhooks::order_event(enums::EventType::OrderPaid, &order, enums::OrderStatus::Paid),
    ];

    let allowed_from = [enums::PaymentStatus::Authorized];
    let (payment, _order) = utils::retry_transient(|| {
        state.store.process_payment_transition(
            payment.id,
            &allowed_from,
            storage::PaymentUpdate::CaptureUpdate,
            Some(storage::OrderUpdate::StatusUpdate {
                status: enums::OrderStatus::Paid,
            }),
            events.clone(),
        )
    })
    .await
    .map_err(map_transition_error)?;

    Ok(services::ApplicationResponse::Json(payment.foreign_into()))
}

#[instrument(skip_all, fields(payment_ref = %payment_ref))]
pub async fn retrieve_payment(
    state: AppState,
    merchant: storage::Merchant,
    payment_ref: String,
) -> RouterResponse<payments::PaymentResponse> {
    let payment = find_owned_payment(&state, &merchant, &payment_ref).await?;
    Ok(services::ApplicationResponse::Json(payment.foreign_into()))
}

/// Resolve a payment reference for a merchant-scoped route: unknown refs
/// are not found, refs owned by another merchant are forbidden.
pub(crate) async fn find_owned_payment(
    state: &AppState,
    merchant: &storage::Merchant,
    payment_ref: &str,
) -> errors::RouterResult<storage::Payment> {
    let payment = state
        .store
        .find_payment_by_payment_ref(payment_ref)
        .await
        .to_not_found_response(errors::ApiErrorResponse::PaymentNotFound)?;
    when(payment.merchant_id != merchant.merchant_id, || {
        Err(report!(errors::ApiErrorResponse::AccessForbidden))
    })?;
    Ok(payment)
}
