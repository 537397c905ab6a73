//! Database migrations.
//!
//! Schema migrations for the database.

#![allow(missing_docs)]

use sea_orm_migration::prelude::*;

mod m20250101_000001_create_member_table;
mod m20250101_000002_create_member_follow_table;
mod m20250101_000003_create_member_restriction_table;
mod m20250101_000004_create_content_post_tables;
mod m20250101_000005_create_comment_tables;
mod m20250101_000006_create_chat_tables;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250101_000001_create_member_table::Migration),
            Box::new(m20250101_000002_create_member_follow_table::Migration),
            Box::new(m20250101_000003_create_member_restriction_table::Migration),
            Box::new(m20250101_000004_create_content_post_tables::Migration),
            Box::new(m20250101_000005_create_comment_tables::Migration),
            Box::new(m20250101_000006_create_chat_tables::Migration),
        ]
    }
}
