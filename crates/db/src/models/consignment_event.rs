use chrono::NaiveDateTime;
use sea_orm::{
    ColumnTrait, ConnectionTrait, DbErr, EntityName, EntityTrait, QueryFilter, QueryOrder,
};

use crate::{
    entities::consignment_event,
    models::order::Order,
    query::{ColumnValues, SqlMode, SqlValue},
};

pub type EventColumns = ColumnValues<consignment_event::Column>;

pub struct ConsignmentEvent;

impl ConsignmentEvent {
    /// Columns shared by every event written for `order`.
    pub fn base_columns(order: &Order) -> EventColumns {
        ColumnValues::new()
            .with(consignment_event::Column::OrderId, order.id)
            .with(consignment_event::Column::Status, order.status.as_str())
            .with(consignment_event::Column::HubId, order.hub_id)
    }

    /// A fresh column list for one event; `base` is not modified.
    pub fn event_columns(
        base: &EventColumns,
        event_type: &str,
        event_time: NaiveDateTime,
    ) -> EventColumns {
        base.extended([
            (consignment_event::Column::EventType, SqlValue::from(event_type)),
            (consignment_event::Column::EventTime, SqlValue::from(event_time)),
        ])
    }

    /// Executes the insert and returns the affected row count.
    pub async fn insert<C: ConnectionTrait>(
        db: &C,
        columns: &EventColumns,
        mode: SqlMode,
    ) -> Result<u64, DbErr> {
        let result = match mode {
            SqlMode::Parameterized => {
                let insert = columns.insert_statement(consignment_event::Entity)?;
                db.execute(&insert).await?
            }
            SqlMode::LegacyLiteral => {
                let sql = columns.legacy_insert_sql(consignment_event::Entity.table_name());
                db.execute_unprepared(&sql).await?
            }
        };
        Ok(result.rows_affected())
    }

    pub async fn find_by_order_id<C: ConnectionTrait>(
        db: &C,
        order_id: i64,
    ) -> Result<Vec<consignment_event::Model>, DbErr> {
        consignment_event::Entity::find()
            .filter(consignment_event::Column::OrderId.eq(order_id))
            .order_by_asc(consignment_event::Column::Id)
            .all(db)
            .await
    }
}
