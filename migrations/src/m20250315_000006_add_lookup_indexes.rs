use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Availability search fetches whole date ranges per property.
        manager
            .create_index(
                Index::create()
                    .name("idx_inventory_tenant_property_date")
                    .table(InventoryRecords::Table)
                    .col(InventoryRecords::TenantId)
                    .col(InventoryRecords::PropertyId)
                    .col(InventoryRecords::Date)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_bookings_tenant_status")
                    .table(Bookings::Table)
                    .col(Bookings::TenantId)
                    .col(Bookings::Status)
                    .if_not_exists()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(
                Index::drop()
                    .name("idx_inventory_tenant_property_date")
                    .table(InventoryRecords::Table)
                    .to_owned(),
            )
            .await?;

        manager
            .drop_index(
                Index::drop()
                    .name("idx_bookings_tenant_status")
                    .table(Bookings::Table)
                    .to_owned(),
            )
            .await
    }
}

#[derive(Iden)]
enum InventoryRecords {
    Table,
    TenantId,
    PropertyId,
    Date,
}

#[derive(Iden)]
enum Bookings {
    Table,
    TenantId,
    Status,
}
