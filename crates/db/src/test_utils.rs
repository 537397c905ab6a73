//! Test utilities for database operations.
//!
//! Provides an in-memory `SQLite` database with the full schema applied, so
//! services can be exercised against real queries and transactions without a
//! running `PostgreSQL` instance.

use std::sync::Arc;

use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, DbErr, Statement};
use sea_orm_migration::MigratorTrait;
use tracing::info;

use crate::migrations::Migrator;

/// A throwaway database used by tests.
pub struct TestDatabase {
    /// Database connection.
    pub conn: Arc<DatabaseConnection>,
}

impl TestDatabase {
    /// Create a fresh in-memory database and run all migrations.
    ///
    /// The pool is pinned to one connection: every `SQLite` in-memory
    /// connection is its own database.
    pub async fn new() -> Result<Self, DbErr> {
        let mut opt = ConnectOptions::new("sqlite::memory:");
        opt.max_connections(1)
            .min_connections(1)
            .sqlx_logging(false);

        let conn = Database::connect(opt).await?;
        conn.execute(Statement::from_string(
            conn.get_database_backend(),
            "PRAGMA foreign_keys = ON".to_string(),
        ))
        .await?;
        Migrator::up(&conn, None).await?;

        info!("Created in-memory test database");

        Ok(Self {
            conn: Arc::new(conn),
        })
    }

    /// Get the database connection.
    #[must_use]
    pub fn connection(&self) -> Arc<DatabaseConnection> {
        Arc::clone(&self.conn)
    }
}
