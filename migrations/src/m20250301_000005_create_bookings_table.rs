use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Bookings::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Bookings::Id).uuid().primary_key().not_null())
                    .col(ColumnDef::new(Bookings::TenantId).uuid().not_null())
                    .col(ColumnDef::new(Bookings::PropertyId).uuid().not_null())
                    .col(ColumnDef::new(Bookings::RoomId).uuid().not_null())
                    .col(ColumnDef::new(Bookings::RatePlanId).uuid().not_null())
                    .col(
                        ColumnDef::new(Bookings::BookingReference)
                            .string()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Bookings::GuestName).string().not_null())
                    .col(ColumnDef::new(Bookings::GuestEmail).string().not_null())
                    .col(ColumnDef::new(Bookings::GuestPhone).string().null())
                    .col(ColumnDef::new(Bookings::CheckIn).date().not_null())
                    .col(ColumnDef::new(Bookings::CheckOut).date().not_null())
                    .col(ColumnDef::new(Bookings::Rooms).integer().not_null())
                    .col(ColumnDef::new(Bookings::Adults).integer().not_null())
                    .col(
                        ColumnDef::new(Bookings::Children)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(ColumnDef::new(Bookings::TotalNights).integer().not_null())
                    .col(
                        ColumnDef::new(Bookings::BasePrice)
                            .decimal_len(19, 4)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Bookings::TotalAmount)
                            .decimal_len(19, 4)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Bookings::Currency)
                            .string()
                            .not_null()
                            .default("USD"),
                    )
                    .col(ColumnDef::new(Bookings::Status).string().not_null())
                    .col(ColumnDef::new(Bookings::PaymentStatus).string().not_null())
                    .col(ColumnDef::new(Bookings::SpecialRequests).string().null())
                    .col(
                        ColumnDef::new(Bookings::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Bookings::UpdatedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("uq_bookings_tenant_reference")
                    .table(Bookings::Table)
                    .col(Bookings::TenantId)
                    .col(Bookings::BookingReference)
                    .unique()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Bookings::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Bookings {
    Table,
    Id,
    TenantId,
    PropertyId,
    RoomId,
    RatePlanId,
    BookingReference,
    GuestName,
    GuestEmail,
    GuestPhone,
    CheckIn,
    CheckOut,
    Rooms,
    Adults,
    Children,
    TotalNights,
    BasePrice,
    TotalAmount,
    Currency,
    Status,
    PaymentStatus,
    SpecialRequests,
    CreatedAt,
    UpdatedAt,
}
