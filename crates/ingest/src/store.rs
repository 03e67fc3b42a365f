use async_trait::async_trait;
use db::{
    DBService, DbErr,
    models::{
        consignment_event::{ConsignmentEvent, EventColumns},
        order::Order,
    },
    query::SqlMode,
};

/// Database operations one record needs. Counts returned are affected rows.
#[async_trait]
pub trait IngestStore: Send + Sync {
    async fn find_orders(
        &self,
        reference_number: &str,
        org_id: &str,
        limit: u64,
    ) -> Result<Vec<Order>, DbErr>;

    async fn insert_event(&self, columns: &EventColumns, mode: SqlMode) -> Result<u64, DbErr>;

    async fn set_return_to_sender(
        &self,
        order_id: i64,
        is_return_to_sender: bool,
        mode: SqlMode,
    ) -> Result<u64, DbErr>;
}

#[async_trait]
impl IngestStore for DBService {
    async fn find_orders(
        &self,
        reference_number: &str,
        org_id: &str,
        limit: u64,
    ) -> Result<Vec<Order>, DbErr> {
        Order::find_by_reference(&self.pool, reference_number, org_id, limit).await
    }

    async fn insert_event(&self, columns: &EventColumns, mode: SqlMode) -> Result<u64, DbErr> {
        ConsignmentEvent::insert(&self.pool, columns, mode).await
    }

    async fn set_return_to_sender(
        &self,
        order_id: i64,
        is_return_to_sender: bool,
        mode: SqlMode,
    ) -> Result<u64, DbErr> {
        Order::set_return_to_sender(&self.pool, order_id, is_return_to_sender, mode).await
    }
}
