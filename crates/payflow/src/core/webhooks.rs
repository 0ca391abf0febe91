//! Outbox row construction and webhook delivery.
//!
//! Rows are appended by the state machines inside their transition
//! transactions; delivery happens later on the worker pool. A delivery
//! failure never surfaces to the HTTP call that caused the event.

use api_models::{
    enums::{EventType, OrderStatus, PaymentStatus, WebhookDeliveryStatus},
    webhooks::OutgoingWebhook,
};
use common_utils::crypto::{HmacSha256, SignMessage};
use error_stack::ResultExt;
use masking::PeekInterface;
use payflow_env::{instrument, logger, tracing};
use reqwest::header::CONTENT_TYPE;
use time::{Duration, PrimitiveDateTime};

use crate::{
    consts,
    core::errors::{self, CustomResult},
    routes::AppState,
    types::storage,
};

/// Signature header accompanying every delivery.
pub const SIGNATURE_HEADER: &str = "X-PayFlow-Signature";
/// Event name header accompanying every delivery.
pub const EVENT_HEADER: &str = "X-PayFlow-Event";

/// Build a payment outbox row. `status` and `error` describe the
/// post-transition state the row announces, since the row is written in the
/// same transaction that applies the transition.
pub fn payment_event(
    event: EventType,
    payment: &storage::Payment,
    status: PaymentStatus,
    error: Option<(&str, &str)>,
) -> storage::WebhookEventNew {
    let mut payload = serde_json::json!({
        "payment_ref": payment.payment_ref,
        "order_ref": payment.order_ref,
        "amount": payment.amount,
        "currency": payment.currency,
        "method": payment.method,
        "status": status,
        "is_flagged": payment.is_flagged,
    });
    if let Some((error_code, error_reason)) = error {
        payload["error_code"] = serde_json::json!(error_code);
        payload["error_reason"] = serde_json::json!(error_reason);
    }

    storage::WebhookEventNew {
        merchant_id: payment.merchant_id.clone(),
        event,
        payload,
    }
}

pub fn order_event(
    event: EventType,
    order: &storage::Order,
    status: OrderStatus,
) -> storage::WebhookEventNew {
    storage::WebhookEventNew {
        merchant_id: order.merchant_id.clone(),
        event,
        payload: serde_json::json!({
            "order_ref": order.order_ref,
            "amount": order.amount,
            "currency": order.currency,
            "receipt": order.receipt,
            "status": status,
        }),
    }
}

pub fn refund_event(event: EventType, refund: &storage::RefundNew) -> storage::WebhookEventNew {
    storage::WebhookEventNew {
        merchant_id: refund.merchant_id.clone(),
        event,
        payload: serde_json::json!({
            "refund_ref": refund.refund_ref,
            "payment_ref": refund.payment_ref,
            "amount": refund.amount,
            "currency": refund.currency,
            "status": refund.status,
        }),
    }
}

/// Exponential backoff, capped: `min(600, 2^attempts)` seconds.
pub fn delivery_backoff(attempts: i32) -> Duration {
    let exponential = 1i64 << attempts.clamp(0, 16);
    Duration::seconds(exponential.min(consts::WEBHOOK_MAX_BACKOFF_SECS))
}

/// Serialize the webhook body and sign it with the merchant's secret. The
/// returned bytes are exactly what is POSTed; the signature is the
/// lowercase hex HMAC-SHA256 over them.
pub fn render_and_sign(
    event: &storage::WebhookEvent,
    secret: &[u8],
) -> CustomResult<(Vec<u8>, String), errors::StorageError> {
    let body = serde_json::to_vec(&OutgoingWebhook {
        event: event.event,
        created_at: event.created_at,
        payload: event.payload.clone(),
    })
    .change_context(errors::StorageError::SerializationFailed)?;

    let signature = HmacSha256
        .sign_message(secret, &body)
        .change_context(errors::StorageError::SerializationFailed)
        .attach_printable("failed to sign webhook body")?;

    Ok((body, hex::encode(signature)))
}

fn truncate_response(body: String) -> String {
    if body.len() > consts::WEBHOOK_RESPONSE_BODY_TRUNCATE {
        body.chars()
            .take(consts::WEBHOOK_RESPONSE_BODY_TRUNCATE)
            .collect()
    } else {
        body
    }
}

/// Perform one delivery attempt of a claimed outbox row. Errors are logged,
/// never propagated: the row's own status columns carry the outcome.
#[instrument(skip(state, event), fields(event_id = event.id))]
pub async fn deliver_webhook_event(
    state: &AppState,
    event: storage::WebhookEvent,
    now: PrimitiveDateTime,
) {
    if let Err(error) = try_deliver(state, event, now).await {
        logger::error!(?error, "webhook delivery attempt errored");
    }
}

async fn try_deliver(
    state: &AppState,
    event: storage::WebhookEvent,
    now: PrimitiveDateTime,
) -> CustomResult<(), errors::StorageError> {
    let merchant = state
        .store
        .find_merchant_by_merchant_id(&event.merchant_id)
        .await?;
    let attempt_number = event.attempts + 1;

    let Some(webhook_url) = merchant.webhook_url.clone() else {
        let reason = "merchant has no webhook URL configured".to_string();
        record_attempt(
            state,
            &event,
            attempt_number,
            storage::WebhookEventUpdate::RetriesExhausted {
                response_code: None,
                response_body: Some(reason.clone()),
            },
            None,
            Some(reason),
            false,
        )
        .await?;
        return Ok(());
    };

    let secret = if merchant.webhook_secret.peek().is_empty() {
        state.conf.secrets.webhook_signing_secret.peek().clone()
    } else {
        merchant.webhook_secret.peek().clone()
    };
    let (body, signature) = render_and_sign(&event, secret.as_bytes())?;

    let response = state
        .api_client
        .post(&webhook_url)
        .header(CONTENT_TYPE, "application/json")
        .header(SIGNATURE_HEADER, signature)
        .header(EVENT_HEADER, event.event.to_string())
        .timeout(std::time::Duration::from_secs(
            consts::WEBHOOK_DELIVERY_TIMEOUT_SECS,
        ))
        .body(body)
        .send()
        .await;

    let (response_code, response_body, delivered) = match response {
        Ok(response) => {
            let status_code = i32::from(response.status().as_u16());
            let text = response.text().await.unwrap_or_default();
            (
                Some(status_code),
                Some(truncate_response(text)),
                (200..300).contains(&status_code),
            )
        }
        Err(error) => (None, Some(truncate_response(error.to_string())), false),
    };

    let update = if delivered {
        storage::WebhookEventUpdate::DeliverySucceeded {
            response_code: response_code.unwrap_or_default(),
            response_body: response_body.clone(),
        }
    } else if attempt_number >= consts::MAX_WEBHOOK_DELIVERY_ATTEMPTS {
        storage::WebhookEventUpdate::RetriesExhausted {
            response_code,
            response_body: response_body.clone(),
        }
    } else {
        storage::WebhookEventUpdate::DeliveryFailed {
            response_code,
            response_body: response_body.clone(),
            next_attempt_at: now + delivery_backoff(attempt_number),
        }
    };

    record_attempt(
        state,
        &event,
        attempt_number,
        update,
        response_code,
        response_body,
        delivered,
    )
    .await
}

async fn record_attempt(
    state: &AppState,
    event: &storage::WebhookEvent,
    attempt_number: i32,
    update: storage::WebhookEventUpdate,
    response_code: Option<i32>,
    response_body: Option<String>,
    delivered: bool,
) -> CustomResult<(), errors::StorageError> {
    state.store.update_webhook_event(event.id, update).await?;
    state
        .store
        .insert_webhook_log(storage::WebhookLogNew {
            event_id: event.id,
            merchant_id: event.merchant_id.clone(),
            event: event.event,
            attempt: attempt_number,
            response_code,
            response_body,
            delivery_status: if delivered {
                WebhookDeliveryStatus::Delivered
            } else {
                WebhookDeliveryStatus::Failed
            },
        })
        .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backoff_doubles_then_caps() {
        assert_eq!(delivery_backoff(1), Duration::seconds(2));
        assert_eq!(delivery_backoff(3), Duration::seconds(8));
        assert_eq!(delivery_backoff(9), Duration::seconds(512));
        assert_eq!(delivery_backoff(10), Duration::seconds(600));
        assert_eq!(delivery_backoff(16), Duration::seconds(600));
    }
}
