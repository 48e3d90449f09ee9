pub use sea_orm_migration::prelude::*;

mod m20250301_000001_create_properties_table;
mod m20250301_000002_create_rooms_table;
mod m20250301_000003_create_rate_plans_table;
mod m20250301_000004_create_inventory_records_table;
mod m20250301_000005_create_bookings_table;
mod m20250315_000006_add_lookup_indexes;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250301_000001_create_properties_table::Migration),
            Box::new(m20250301_000002_create_rooms_table::Migration),
            Box::new(m20250301_000003_create_rate_plans_table::Migration),
            Box::new(m20250301_000004_create_inventory_records_table::Migration),
            Box::new(m20250301_000005_create_bookings_table::Migration),
            Box::new(m20250315_000006_add_lookup_indexes::Migration),
        ]
    }
}
