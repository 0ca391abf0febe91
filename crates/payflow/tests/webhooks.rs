#![allow(clippy::expect_used, clippy::unwrap_used)]

mod utils;

use api_models::enums::{EventType, WebhookDeliveryStatus};
use common_utils::{
    crypto::{HmacSha256, VerifySignature},
    date_time,
};
use payflow::{types::storage, workers::webhook_delivery};
use wiremock::{
    matchers::{method, path},
    Mock, MockServer, ResponseTemplate,
};

async fn seed_event(
    state: &payflow::routes::AppState,
    merchant_id: &str,
) -> storage::WebhookEvent {
    state
        .store
        .insert_webhook_event(storage::WebhookEventNew {
            merchant_id: merchant_id.to_string(),
            event: EventType::PaymentCaptured,
            payload: serde_json::json!({
                "payment_ref": "pf_pay_testpayment",
                "order_ref": "pf_order_testorder",
                "amount": 49_900,
                "status": "captured",
            }),
        })
        .await
        .unwrap()
}

/// Walk the retry schedule without sleeping: drain at `now`, then jump to
/// the row's next scheduled attempt.
async fn drain_until_terminal(
    state: &payflow::routes::AppState,
    event_id: i64,
    max_rounds: usize,
) -> storage::WebhookEvent {
    let mut now = date_time::now();
    for _ in 0..max_rounds {
        webhook_delivery::drain_once(state, now).await.unwrap();
        let current = state.store.find_webhook_event_by_id(event_id).await.unwrap();
        if current.status.is_terminal() {
            return current;
        }
        now = current.next_attempt_at;
    }
    state.store.find_webhook_event_by_id(event_id).await.unwrap()
}

#[tokio::test]
async fn delivery_retries_until_the_endpoint_recovers() {
    let state = utils::app_state();
    let server = MockServer::start().await;
    let merchant =
        utils::seed_merchant(&state, Some(&format!("{}/hooks", server.uri()))).await;

    Mock::given(method("POST"))
        .and(path("/hooks"))
        .respond_with(ResponseTemplate::new(500))
        .up_to_n_times(3)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/hooks"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let event = seed_event(&state, &merchant.merchant_id).await;
    let delivered = drain_until_terminal(&state, event.id, 6).await;

    assert_eq!(delivered.status, WebhookDeliveryStatus::Delivered);
    assert_eq!(delivered.attempts, 4);
    assert_eq!(delivered.last_response_code, Some(200));

    // Every attempt, including the failed ones, carried a valid signature
    // over the exact body bytes.
    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 4);
    for request in &requests {
        let signature = request
            .headers
            .get("X-PayFlow-Signature")
            .expect("signature header missing")
            .to_str()
            .unwrap();
        let signature_bytes = hex::decode(signature).unwrap();
        assert!(HmacSha256
            .verify_signature(
                utils::TEST_WEBHOOK_SECRET.as_bytes(),
                &signature_bytes,
                &request.body,
            )
            .unwrap());

        assert_eq!(
            request
                .headers
                .get("X-PayFlow-Event")
                .expect("event header missing")
                .to_str()
                .unwrap(),
            "payment.captured"
        );

        let body: serde_json::Value = serde_json::from_slice(&request.body).unwrap();
        assert_eq!(body["event"], "payment.captured");
        assert!(body["created_at"].is_string());
        assert_eq!(body["payload"]["payment_ref"], "pf_pay_testpayment");
    }

    let logs = state
        .store
        .list_webhook_logs_by_merchant_id(&merchant.merchant_id, 100)
        .await
        .unwrap();
    assert_eq!(logs.len(), 4);
    assert_eq!(
        logs.iter()
            .filter(|log| log.delivery_status == WebhookDeliveryStatus::Delivered)
            .count(),
        1
    );
}

#[tokio::test]
async fn delivery_gives_up_after_eight_attempts() {
    let state = utils::app_state();
    let server = MockServer::start().await;
    let merchant =
        utils::seed_merchant(&state, Some(&format!("{}/hooks", server.uri()))).await;

    Mock::given(method("POST"))
        .and(path("/hooks"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let event = seed_event(&state, &merchant.merchant_id).await;
    let failed = drain_until_terminal(&state, event.id, 12).await;

    assert_eq!(failed.status, WebhookDeliveryStatus::Failed);
    assert_eq!(failed.attempts, 8);
    assert_eq!(failed.last_response_code, Some(503));

    let logs = state
        .store
        .list_webhook_logs_by_merchant_id(&merchant.merchant_id, 100)
        .await
        .unwrap();
    assert_eq!(logs.len(), 8);

    // Terminal rows are never claimed again, however late the clock runs.
    let far_future = failed.next_attempt_at + time::Duration::seconds(3_600);
    let drained = webhook_delivery::drain_once(&state, far_future).await.unwrap();
    assert_eq!(drained, 0);
}

#[tokio::test]
async fn merchant_without_a_webhook_url_fails_terminally() {
    let state = utils::app_state();
    let merchant = utils::seed_merchant(&state, None).await;

    let event = seed_event(&state, &merchant.merchant_id).await;
    webhook_delivery::drain_once(&state, date_time::now())
        .await
        .unwrap();

    let stored = state.store.find_webhook_event_by_id(event.id).await.unwrap();
    assert_eq!(stored.status, WebhookDeliveryStatus::Failed);

    let logs = state
        .store
        .list_webhook_logs_by_merchant_id(&merchant.merchant_id, 100)
        .await
        .unwrap();
    assert_eq!(logs.len(), 1);
    assert_eq!(logs[0].delivery_status, WebhookDeliveryStatus::Failed);
}

#[tokio::test]
async fn a_claimed_event_is_leased_away_from_other_workers() {
    let state = utils::app_state();
    let merchant = utils::seed_merchant(&state, None).await;

    // No URL: the single drain resolves it terminally; a concurrent drain
    // at the same instant must claim nothing thanks to the lease.
    let _event = seed_event(&state, &merchant.merchant_id).await;
    let now = date_time::now();

    let lease_until = now + time::Duration::seconds(30);
    let claimed = state
        .store
        .claim_due_webhook_events(now, lease_until, 10)
        .await
        .unwrap();
    assert_eq!(claimed.len(), 1);

    let claimed_again = state
        .store
        .claim_due_webhook_events(now, lease_until, 10)
        .await
        .unwrap();
    assert!(claimed_again.is_empty());
}
