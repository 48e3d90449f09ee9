use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(InventoryRecords::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(InventoryRecords::Id)
                            .uuid()
                            .primary_key()
                            .not_null(),
                    )
                    .col(ColumnDef::new(InventoryRecords::TenantId).uuid().not_null())
                    .col(
                        ColumnDef::new(InventoryRecords::PropertyId)
                            .uuid()
                            .not_null(),
                    )
                    .col(ColumnDef::new(InventoryRecords::RoomId).uuid().not_null())
                    .col(
                        ColumnDef::new(InventoryRecords::RatePlanId)
                            .uuid()
                            .not_null(),
                    )
                    .col(ColumnDef::new(InventoryRecords::Date).date().not_null())
                    .col(
                        ColumnDef::new(InventoryRecords::AvailableRooms)
                            .integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(InventoryRecords::TotalRooms)
                            .integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(InventoryRecords::Price)
                            .decimal_len(19, 4)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(InventoryRecords::Currency)
                            .string()
                            .not_null()
                            .default("USD"),
                    )
                    .col(ColumnDef::new(InventoryRecords::MinStay).integer().null())
                    .col(
                        ColumnDef::new(InventoryRecords::ClosedToArrival)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(InventoryRecords::ClosedToDeparture)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(InventoryRecords::StopSell)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(InventoryRecords::Restrictions).json().null())
                    .col(
                        ColumnDef::new(InventoryRecords::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(InventoryRecords::UpdatedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .to_owned(),
            )
            .await?;

        // The composite identity; one sellable row per room x plan x night.
        manager
            .create_index(
                Index::create()
                    .name("uq_inventory_tenant_room_plan_date")
                    .table(InventoryRecords::Table)
                    .col(InventoryRecords::TenantId)
                    .col(InventoryRecords::RoomId)
                    .col(InventoryRecords::RatePlanId)
                    .col(InventoryRecords::Date)
                    .unique()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(InventoryRecords::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum InventoryRecords {
    Table,
    Id,
    TenantId,
    PropertyId,
    RoomId,
    RatePlanId,
    Date,
    AvailableRooms,
    TotalRooms,
    Price,
    Currency,
    MinStay,
    ClosedToArrival,
    ClosedToDeparture,
    StopSell,
    Restrictions,
    CreatedAt,
    UpdatedAt,
}
