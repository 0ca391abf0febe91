//! The pluggable authorization step.
//!
//! Acquiring-bank integration is out of scope; the trait seam is where a
//! real connector would plug in. Handlers obtain the outcome first and open
//! the state transaction second, so no transaction spans this call.

use api_models::enums::PaymentMethod;
use masking::PeekInterface;

use crate::types::storage;

/// Outcome of an authorization attempt.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AuthorizationOutcome {
    Authorized,
    Declined {
        error_code: String,
        error_reason: String,
    },
}

/// Outcome of a refund execution.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RefundOutcome {
    Processed,
    Failed,
}

#[async_trait::async_trait]
pub trait AuthorizationGateway: Send + Sync {
    async fn authorize_payment(&self, payment: &storage::Payment) -> AuthorizationOutcome;

    async fn execute_refund(
        &self,
        payment: &storage::Payment,
        amount: i64,
        reason: Option<&str>,
    ) -> RefundOutcome;
}

/// Deterministic simulator. Declines are triggered by well-known test
/// values so integration tests and sandbox merchants get reproducible
/// outcomes:
///
/// - UPI: VPA local part `fail` (e.g. `fail@okbank`)
/// - card: last four digits `0002`
/// - netbanking: email local part `fail`
/// - wallet: contact ending in `0000`
/// - refunds: reason `simulate_failure`
#[derive(Debug, Default)]
pub struct SimulatorGateway;

#[async_trait::async_trait]
impl AuthorizationGateway for SimulatorGateway {
    async fn authorize_payment(&self, payment: &storage::Payment) -> AuthorizationOutcome {
        let declined = match payment.method {
            PaymentMethod::Upi => payment
                .vpa
                .as_ref()
                .and_then(|vpa| vpa.peek().split_once('@'))
                .is_some_and(|(local, _)| local.eq_ignore_ascii_case("fail")),
            PaymentMethod::Card => payment.card_last4.as_deref() == Some("0002"),
            PaymentMethod::Netbanking => payment
                .email
                .as_ref()
                .is_some_and(|email| email.peek().to_lowercase().starts_with("fail@")),
            PaymentMethod::Wallet => payment
                .contact
                .as_ref()
                .is_some_and(|contact| contact.peek().ends_with("0000")),
        };

        if declined {
            AuthorizationOutcome::Declined {
                error_code: "AUTHORIZATION_DECLINED".to_string(),
                error_reason: "the issuing bank declined the authorization".to_string(),
            }
        } else {
            AuthorizationOutcome::Authorized
        }
    }

    async fn execute_refund(
        &self,
        _payment: &storage::Payment,
        _amount: i64,
        reason: Option<&str>,
    ) -> RefundOutcome {
        if reason == Some("simulate_failure") {
            RefundOutcome::Failed
        } else {
            RefundOutcome::Processed
        }
    }
}
