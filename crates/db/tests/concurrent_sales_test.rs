//! Concurrent access stress test for the stock ledger.
//!
//! Many tasks sell single units of the same product at once; exactly the
//! available units succeed and the level never goes negative, regardless
//! of interleaving.
//!
//! These tests require a migrated Postgres database; set `DATABASE_URL`
//! to run them, otherwise they are skipped.

use futures::future::join_all;
use rust_decimal_macros::dec;
use sea_orm::{Database, DatabaseConnection};
use std::env;
use std::sync::Arc;
use tokio::sync::Barrier;
use uuid::Uuid;

use stockroom_core::stock::{MovementKind, StockMovement};
use stockroom_db::repositories::product::{CreateProductInput, ProductRepository};
use stockroom_db::repositories::stock::{
    RecordMovementInput, StockLedgerError, StockRepository,
};

const AVAILABLE_UNITS: i64 = 50;
const ATTEMPTED_SALES: usize = 80;

async fn connect() -> Option<DatabaseConnection> {
    let Ok(url) = env::var("DATABASE_URL") else {
        eprintln!("DATABASE_URL not set, skipping");
        return None;
    };
    Some(
        Database::connect(&url)
            .await
            .expect("Failed to connect to database"),
    )
}

#[tokio::test]
async fn test_concurrent_unit_sales_never_oversell() {
    let Some(db) = connect().await else { return };

    let tag = Uuid::new_v4();
    let product = ProductRepository::new(db.clone())
        .create(CreateProductInput {
            name: format!("Concurrency Test Widget {tag}"),
            description: None,
            sku: Some(format!("SKU-CONC-{tag}")),
            category_id: None,
            supplier_id: None,
            unit_price: dec!(1.00),
            selling_price: dec!(2.00),
            reorder_level: 0,
        })
        .await
        .expect("Failed to create product");

    let repo = StockRepository::new(db.clone());
    repo.record(RecordMovementInput {
        product_id: product.id,
        movement: StockMovement::new(MovementKind::In, AVAILABLE_UNITS),
        notes: Some("Opening stock".to_string()),
        created_by: None,
    })
    .await
    .expect("Failed to stock product");

    let barrier = Arc::new(Barrier::new(ATTEMPTED_SALES));
    let mut tasks = Vec::with_capacity(ATTEMPTED_SALES);

    for _ in 0..ATTEMPTED_SALES {
        let repo = StockRepository::new(db.clone());
        let barrier = Arc::clone(&barrier);
        let product_id = product.id;

        tasks.push(tokio::spawn(async move {
            barrier.wait().await;
            repo.record(RecordMovementInput {
                product_id,
                movement: StockMovement::new(MovementKind::Out, 1),
                notes: None,
                created_by: None,
            })
            .await
        }));
    }

    let results = join_all(tasks).await;

    let mut succeeded = 0_i64;
    let mut rejected = 0_i64;
    for result in results {
        match result.expect("Task panicked") {
            Ok(_) => succeeded += 1,
            Err(StockLedgerError::InsufficientStock { .. }) => rejected += 1,
            Err(e) => panic!("Unexpected error: {e}"),
        }
    }

    assert_eq!(succeeded, AVAILABLE_UNITS, "Exactly the stocked units sell");
    assert_eq!(
        rejected,
        i64::try_from(ATTEMPTED_SALES).expect("fits") - AVAILABLE_UNITS
    );

    let final_quantity = ProductRepository::new(db.clone())
        .find_by_id(product.id)
        .await
        .expect("Failed to fetch product")
        .expect("Product missing")
        .quantity;
    assert_eq!(final_quantity, 0, "The level never goes negative");
}
