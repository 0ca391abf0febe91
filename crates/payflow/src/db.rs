//! Storage interfaces and their two implementations.
//!
//! Each entity gets its own trait; [`StorageInterface`] aggregates them so
//! the application can hold a single `Arc<dyn StorageInterface>`. The
//! Postgres-backed [`Store`] is the production implementation; [`MockDb`]
//! backs the test-suite. State transitions are composite operations on the
//! interface so the row lock, the predecessor check, the write and the
//! outbox append share one transaction.

pub mod api_keys;
pub mod events;
pub mod merchants;
pub mod orders;
pub mod payments;
pub mod refunds;
pub mod users;

use std::sync::{
    atomic::{AtomicI64, Ordering},
    Arc,
};

use sqlx::PgPool;
use tokio::sync::Mutex;

pub use self::{
    api_keys::ApiKeyInterface, events::WebhookEventInterface, merchants::MerchantInterface,
    orders::OrderInterface, payments::PaymentInterface, refunds::RefundInterface,
    users::UserInterface,
};
use crate::types::storage;

pub trait StorageInterface:
    Send
    + Sync
    + UserInterface
    + MerchantInterface
    + ApiKeyInterface
    + OrderInterface
    + PaymentInterface
    + RefundInterface
    + WebhookEventInterface
    + 'static
{
}

/// Postgres-backed store over a shared connection pool.
#[derive(Clone)]
pub struct Store {
    pub pool: PgPool,
}

impl Store {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl StorageInterface for Store {}

/// In-memory store used by tests. Tables are vectors behind async mutexes;
/// composite operations take the mutexes in a fixed order (orders, payments,
/// refunds, events) so concurrent test tasks serialize the same way the
/// row locks do in Postgres.
#[derive(Clone, Default)]
pub struct MockDb {
    pub users: Arc<Mutex<Vec<storage::User>>>,
    pub merchants: Arc<Mutex<Vec<storage::Merchant>>>,
    pub api_keys: Arc<Mutex<Vec<storage::ApiKey>>>,
    pub orders: Arc<Mutex<Vec<storage::Order>>>,
    pub payments: Arc<Mutex<Vec<storage::Payment>>>,
    pub refunds: Arc<Mutex<Vec<storage::Refund>>>,
    pub webhook_events: Arc<Mutex<Vec<storage::WebhookEvent>>>,
    pub webhook_logs: Arc<Mutex<Vec<storage::WebhookLog>>>,
    sequence: Arc<AtomicI64>,
}

impl MockDb {
    pub fn new() -> Self {
        Self {
            sequence: Arc::new(AtomicI64::new(1)),
            ..Self::default()
        }
    }

    pub(crate) fn next_id(&self) -> i64 {
        self.sequence.fetch_add(1, Ordering::SeqCst)
    }
}

impl StorageInterface for MockDb {}
