//! Database layer with `SeaORM` entities and repositories.
//!
//! This crate provides:
//! - `SeaORM` entity definitions
//! - Repository abstractions for data access
//! - Database migrations

pub mod entities;
pub mod migration;
pub mod repositories;

pub use repositories::{
    CategoryRepository, InvoiceRepository, ProductRepository, ReceiptRepository, ReportRepository,
    StockRepository,
};

use sea_orm::{ConnectOptions, Database, DatabaseConnection, DbErr};
use stockroom_shared::config::DatabaseConfig;

/// Establishes a connection pool using the application database settings.
///
/// # Errors
///
/// Returns an error if the connection cannot be established.
pub async fn connect(config: &DatabaseConfig) -> Result<DatabaseConnection, DbErr> {
    let mut options = ConnectOptions::new(&config.url);
    options
        .max_connections(config.max_connections)
        .min_connections(config.min_connections);

    Database::connect(options).await
}
