//! Test utilities for Warehouse Deals
//!
//! Provides common testing infrastructure so tests are isolated and use
//! a consistent database setup.

use anyhow::Result;
use std::sync::Arc;

use crate::infrastructure::{DatabaseConnection, SqliteProductRepository};

/// Test database configuration
pub struct TestDatabase {
    pub connection: DatabaseConnection,
}

impl TestDatabase {
    /// Create a new in-memory test database
    ///
    /// Each test gets a fresh, clean database state.
    pub async fn new() -> Result<Self> {
        let db = DatabaseConnection::new("sqlite::memory:").await?;
        db.migrate().await?;
        Ok(Self { connection: db })
    }

    /// Get the database pool for use in repositories
    pub fn pool(&self) -> sqlx::Pool<sqlx::Sqlite> {
        self.connection.pool().clone()
    }

    /// Repository backed by this database
    pub fn product_repository(&self) -> Arc<SqliteProductRepository> {
        Arc::new(SqliteProductRepository::new(self.pool()))
    }
}
