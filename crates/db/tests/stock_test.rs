//! Integration tests for the stock ledger repository.
//!
//! These tests require a migrated Postgres database; set `DATABASE_URL`
//! to run them, otherwise they are skipped.

use rust_decimal_macros::dec;
use sea_orm::{Database, DatabaseConnection};
use std::env;
use uuid::Uuid;

use stockroom_core::stock::{MovementKind, StockMovement};
use stockroom_db::entities::products;
use stockroom_db::repositories::product::{CreateProductInput, ProductRepository};
use stockroom_db::repositories::stock::{
    MovementFilter, RecordMovementInput, StockLedgerError, StockRepository,
};

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

async fn create_product(db: &DatabaseConnection) -> products::Model {
    let repo = ProductRepository::new(db.clone());
    let tag = Uuid::new_v4();
    repo.create(CreateProductInput {
        name: format!("Stock Test Widget {tag}"),
        description: None,
        sku: Some(format!("SKU-STOCK-{tag}")),
        category_id: None,
        supplier_id: None,
        unit_price: dec!(2.50),
        selling_price: dec!(5.00),
        reorder_level: 10,
    })
    .await
    .expect("Failed to create product")
}

fn movement(product_id: Uuid, kind: MovementKind, quantity: i64) -> RecordMovementInput {
    RecordMovementInput {
        product_id,
        movement: StockMovement::new(kind, quantity),
        notes: None,
        created_by: None,
    }
}

async fn quantity_of(db: &DatabaseConnection, id: Uuid) -> i64 {
    ProductRepository::new(db.clone())
        .find_by_id(id)
        .await
        .expect("Failed to fetch product")
        .expect("Product missing")
        .quantity
}

#[tokio::test]
async fn test_movements_fold_into_level() {
    let Some(db) = connect().await else { return };
    let product = create_product(&db).await;
    assert_eq!(product.quantity, 0, "Products start with zero stock");

    let repo = StockRepository::new(db.clone());

    repo.record(movement(product.id, MovementKind::In, 10))
        .await
        .expect("Stock-in failed");
    assert_eq!(quantity_of(&db, product.id).await, 10);

    repo.record(movement(product.id, MovementKind::Out, 3))
        .await
        .expect("Stock-out failed");
    assert_eq!(quantity_of(&db, product.id).await, 7);

    repo.record(movement(product.id, MovementKind::Adjustment, -2))
        .await
        .expect("Adjustment failed");
    assert_eq!(quantity_of(&db, product.id).await, 5);

    let history = repo
        .list(MovementFilter {
            product_id: Some(product.id),
            ..MovementFilter::default()
        })
        .await
        .expect("Failed to list movements");
    assert_eq!(history.len(), 3, "Every movement leaves an audit row");
}

#[tokio::test]
async fn test_out_beyond_available_is_rejected() {
    let Some(db) = connect().await else { return };
    let product = create_product(&db).await;
    let repo = StockRepository::new(db.clone());

    repo.record(movement(product.id, MovementKind::In, 5))
        .await
        .expect("Stock-in failed");

    let result = repo.record(movement(product.id, MovementKind::Out, 8)).await;
    match result {
        Err(StockLedgerError::InsufficientStock {
            available,
            requested,
            ..
        }) => {
            assert_eq!(available, 5);
            assert_eq!(requested, 8);
        }
        other => panic!("Expected InsufficientStock, got {other:?}"),
    }

    assert_eq!(
        quantity_of(&db, product.id).await,
        5,
        "A rejected movement must not change the level"
    );
}

#[tokio::test]
async fn test_adjustment_below_zero_is_rejected() {
    let Some(db) = connect().await else { return };
    let product = create_product(&db).await;
    let repo = StockRepository::new(db.clone());

    repo.record(movement(product.id, MovementKind::In, 3))
        .await
        .expect("Stock-in failed");

    let result = repo
        .record(movement(product.id, MovementKind::Adjustment, -5))
        .await;
    match result {
        Err(StockLedgerError::NegativeStock { current, delta, .. }) => {
            assert_eq!(current, 3);
            assert_eq!(delta, -5);
        }
        other => panic!("Expected NegativeStock, got {other:?}"),
    }

    assert_eq!(quantity_of(&db, product.id).await, 3);
}

#[tokio::test]
async fn test_malformed_movements_are_rejected() {
    let Some(db) = connect().await else { return };
    let product = create_product(&db).await;
    let repo = StockRepository::new(db.clone());

    let zero_adjustment = repo
        .record(movement(product.id, MovementKind::Adjustment, 0))
        .await;
    assert!(
        matches!(zero_adjustment, Err(StockLedgerError::InvalidMovement(_))),
        "Zero adjustments are meaningless"
    );

    let negative_in = repo.record(movement(product.id, MovementKind::In, -4)).await;
    assert!(
        matches!(negative_in, Err(StockLedgerError::InvalidMovement(_))),
        "Stock-in quantities must be positive"
    );
}

#[tokio::test]
async fn test_unknown_product_is_rejected() {
    let Some(db) = connect().await else { return };
    let repo = StockRepository::new(db.clone());

    let missing = Uuid::new_v4();
    let result = repo.record(movement(missing, MovementKind::In, 1)).await;
    match result {
        Err(StockLedgerError::ProductNotFound(id)) => assert_eq!(id, missing),
        other => panic!("Expected ProductNotFound, got {other:?}"),
    }
}
