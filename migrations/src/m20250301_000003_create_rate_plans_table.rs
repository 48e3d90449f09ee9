use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(RatePlans::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(RatePlans::Id)
                            .uuid()
                            .primary_key()
                            .not_null(),
                    )
                    .col(ColumnDef::new(RatePlans::TenantId).uuid().not_null())
                    .col(ColumnDef::new(RatePlans::PropertyId).uuid().not_null())
                    .col(ColumnDef::new(RatePlans::Name).string().not_null())
                    .col(ColumnDef::new(RatePlans::PlanType).string().not_null())
                    .col(
                        ColumnDef::new(RatePlans::BasePrice)
                            .decimal_len(19, 4)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(RatePlans::Currency)
                            .string()
                            .not_null()
                            .default("USD"),
                    )
                    .col(
                        ColumnDef::new(RatePlans::IsDynamic)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(RatePlans::DynamicRules).json().null())
                    .col(
                        ColumnDef::new(RatePlans::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(RatePlans::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(RatePlans::UpdatedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_rate_plans_property")
                            .from(RatePlans::Table, RatePlans::PropertyId)
                            .to(Properties::Table, Properties::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_rate_plans_tenant_property")
                    .table(RatePlans::Table)
                    .col(RatePlans::TenantId)
                    .col(RatePlans::PropertyId)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(RatePlans::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum RatePlans {
    Table,
    Id,
    TenantId,
    PropertyId,
    Name,
    PlanType,
    BasePrice,
    Currency,
    IsDynamic,
    DynamicRules,
    IsActive,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum Properties {
    Table,
    Id,
}
