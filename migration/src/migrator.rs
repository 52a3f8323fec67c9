use sea_orm_migration::prelude::*;

use crate::migrations;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(migrations::m202603010001_create_students::Migration),
            Box::new(migrations::m202603010002_create_classes::Migration),
            Box::new(migrations::m202603010003_create_attendance_records::Migration),
        ]
    }
}
