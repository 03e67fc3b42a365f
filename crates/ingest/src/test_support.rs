use std::{
    sync::{
        Mutex,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};

use async_trait::async_trait;
use db::{
    DbErr, RuntimeErr,
    models::{consignment_event::EventColumns, order::Order},
    query::SqlMode,
};

/// In-memory [`IngestStore`](crate::store::IngestStore) that records writes
/// and tracks how many calls of any kind run at once.
pub struct MockStore {
    /// `(reference, org_id, order)`
    pub orders: Vec<(String, String, Order)>,
    pub insert_rows: u64,
    pub update_rows: u64,
    /// Applied to every call while it counts as in flight.
    pub call_delay: Duration,
    /// Lookups for this reference fail with a connection error.
    pub unreachable_reference: Option<String>,
    pub(crate) inserted: Mutex<Vec<EventColumns>>,
    pub(crate) updates: Mutex<Vec<(i64, bool)>>,
    pub(crate) in_flight: AtomicUsize,
    pub(crate) max_in_flight: AtomicUsize,
}

impl Default for MockStore {
    fn default() -> Self {
        Self {
            orders: Vec::new(),
            insert_rows: 1,
            update_rows: 1,
            call_delay: Duration::ZERO,
            unreachable_reference: None,
            inserted: Mutex::default(),
            updates: Mutex::default(),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        }
    }
}

impl MockStore {
    pub fn with_order(mut self, reference: &str, org_id: &str, id: i64) -> Self {
        self.orders.push((
            reference.to_string(),
            org_id.to_string(),
            Order {
                id,
                hub_id: Some(1),
                status: "in_transit".to_string(),
            },
        ));
        self
    }

    pub fn inserted(&self) -> Vec<EventColumns> {
        self.inserted.lock().unwrap().clone()
    }

    pub fn updates(&self) -> Vec<(i64, bool)> {
        self.updates.lock().unwrap().clone()
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    async fn in_flight_call(&self) {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        if !self.call_delay.is_zero() {
            tokio::time::sleep(self.call_delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl crate::store::IngestStore for MockStore {
    async fn find_orders(
        &self,
        reference_number: &str,
        org_id: &str,
        limit: u64,
    ) -> Result<Vec<Order>, DbErr> {
        self.in_flight_call().await;

        if self.unreachable_reference.as_deref() == Some(reference_number) {
            return Err(DbErr::Conn(RuntimeErr::Internal(
                "connection reset".to_string(),
            )));
        }

        Ok(self
            .orders
            .iter()
            .filter(|(reference, org, _)| reference == reference_number && org == org_id)
            .take(limit as usize)
            .map(|(_, _, order)| order.clone())
            .collect())
    }

    async fn insert_event(&self, columns: &EventColumns, _mode: SqlMode) -> Result<u64, DbErr> {
        self.in_flight_call().await;
        self.inserted.lock().unwrap().push(columns.clone());
        Ok(self.insert_rows)
    }

    async fn set_return_to_sender(
        &self,
        order_id: i64,
        is_return_to_sender: bool,
        _mode: SqlMode,
    ) -> Result<u64, DbErr> {
        self.in_flight_call().await;
        self.updates
            .lock()
            .unwrap()
            .push((order_id, is_return_to_sender));
        Ok(self.update_rows)
    }
}
