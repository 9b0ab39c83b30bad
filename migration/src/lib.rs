pub use sea_orm_migration::prelude::*;

pub mod entities;
mod m20251101_000001_surveys;
mod m20251101_000002_survey_clicks;
mod m20251101_000003_survey_links;
mod m20251102_000001_registrations;
mod m20251102_000002_admins;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20251101_000001_surveys::Migration),
            Box::new(m20251101_000002_survey_clicks::Migration),
            Box::new(m20251101_000003_survey_links::Migration),
            Box::new(m20251102_000001_registrations::Migration),
            Box::new(m20251102_000002_admins::Migration),
        ]
    }
}
