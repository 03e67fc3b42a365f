use sea_orm_migration::prelude::*;
use sea_orm_migration::sea_orm::DatabaseBackend;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // `orders` is owned by the order service in production; this table only
        // mirrors the columns ingestion reads and writes.
        manager
            .create_table(
                Table::create()
                    .if_not_exists()
                    .table(Orders::Table)
                    .col(pk_id_col(manager, Orders::Id))
                    .col(
                        ColumnDef::new(Orders::ReferenceNumber)
                            .string_len(128)
                            .not_null(),
                    )
                    .col(ColumnDef::new(Orders::OrgId).string_len(64).not_null())
                    .col(fk_id_nullable_col(manager, Orders::HubId))
                    .col(
                        ColumnDef::new(Orders::Status)
                            .string_len(64)
                            .not_null()
                            .default(Expr::val("created")),
                    )
                    .col(
                        ColumnDef::new(Orders::IsReturnToSender)
                            .boolean()
                            .not_null()
                            .default(Expr::val(false)),
                    )
                    .to_owned(),
            )
            .await?;

        // Not unique: duplicate references are detected by the resolver.
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_orders_reference_org")
                    .table(Orders::Table)
                    .col(Orders::ReferenceNumber)
                    .col(Orders::OrgId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .if_not_exists()
                    .table(ConsignmentEvents::Table)
                    .col(pk_id_col(manager, ConsignmentEvents::Id))
                    .col(fk_id_col(manager, ConsignmentEvents::OrderId))
                    .col(
                        ColumnDef::new(ConsignmentEvents::Status)
                            .string_len(64)
                            .not_null(),
                    )
                    .col(fk_id_nullable_col(manager, ConsignmentEvents::HubId))
                    .col(
                        ColumnDef::new(ConsignmentEvents::Type)
                            .string_len(64)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ConsignmentEvents::EventTime)
                            .timestamp()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_consignment_events_order_id")
                            .from(ConsignmentEvents::Table, ConsignmentEvents::OrderId)
                            .to(Orders::Table, Orders::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_consignment_events_order_id")
                    .table(ConsignmentEvents::Table)
                    .col(ConsignmentEvents::OrderId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ConsignmentEvents::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Orders::Table).to_owned())
            .await?;
        Ok(())
    }
}

fn pk_id_col<T: Iden>(manager: &SchemaManager, col: T) -> ColumnDef {
    let mut col = ColumnDef::new(col);
    match manager.get_database_backend() {
        DatabaseBackend::Sqlite => {
            col.integer();
        }
        _ => {
            col.big_integer();
        }
    }
    col.not_null().auto_increment().primary_key().to_owned()
}

fn fk_id_col<T: Iden>(manager: &SchemaManager, col: T) -> ColumnDef {
    let mut col = ColumnDef::new(col);
    match manager.get_database_backend() {
        DatabaseBackend::Sqlite => {
            col.integer();
        }
        _ => {
            col.big_integer();
        }
    }
    col.not_null().to_owned()
}

fn fk_id_nullable_col<T: Iden>(manager: &SchemaManager, col: T) -> ColumnDef {
    let mut col = ColumnDef::new(col);
    match manager.get_database_backend() {
        DatabaseBackend::Sqlite => {
            col.integer();
        }
        _ => {
            col.big_integer();
        }
    }
    col.to_owned()
}

#[derive(Iden)]
enum Orders {
    Table,
    Id,
    ReferenceNumber,
    OrgId,
    HubId,
    Status,
    IsReturnToSender,
}

#[derive(Iden)]
enum ConsignmentEvents {
    Table,
    Id,
    OrderId,
    Status,
    HubId,
    Type,
    EventTime,
}
