use sea_orm::{
    ColumnTrait, ConnectionTrait, DbErr, EntityName, EntityTrait, QueryFilter, QuerySelect,
};

use crate::{
    entities::orders,
    query::{ColumnValues, SqlMode},
};

/// The order columns ingestion needs to attach events.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Order {
    pub id: i64,
    pub hub_id: Option<i64>,
    pub status: String,
}

impl From<orders::Model> for Order {
    fn from(model: orders::Model) -> Self {
        Self {
            id: model.id,
            hub_id: model.hub_id,
            status: model.status,
        }
    }
}

impl Order {
    /// Returns up to `limit` orders with this reference in the organization.
    /// Callers pass a limit of 2 to tell "unique" from "ambiguous" without
    /// loading every duplicate.
    pub async fn find_by_reference<C: ConnectionTrait>(
        db: &C,
        reference_number: &str,
        org_id: &str,
        limit: u64,
    ) -> Result<Vec<Self>, DbErr> {
        let rows = orders::Entity::find()
            .filter(orders::Column::ReferenceNumber.eq(reference_number))
            .filter(orders::Column::OrgId.eq(org_id))
            .limit(limit)
            .all(db)
            .await?;
        Ok(rows.into_iter().map(Self::from).collect())
    }

    pub async fn set_return_to_sender<C: ConnectionTrait>(
        db: &C,
        id: i64,
        is_return_to_sender: bool,
        mode: SqlMode,
    ) -> Result<u64, DbErr> {
        let set = ColumnValues::new().with(orders::Column::IsReturnToSender, is_return_to_sender);
        let result = match mode {
            SqlMode::Parameterized => {
                let update = set.update_statement(orders::Entity, orders::Column::Id, id);
                db.execute(&update).await?
            }
            SqlMode::LegacyLiteral => {
                let sql = set.legacy_update_sql(orders::Entity.table_name(), orders::Column::Id, id);
                db.execute_unprepared(&sql).await?
            }
        };
        Ok(result.rows_affected())
    }
}
