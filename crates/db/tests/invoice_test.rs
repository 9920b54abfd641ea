//! Integration tests for the invoice repository.
//!
//! These tests require a migrated Postgres database; set `DATABASE_URL`
//! to run them, otherwise they are skipped.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use sea_orm::{Database, DatabaseConnection};
use std::env;
use uuid::Uuid;

use stockroom_core::stock::{MovementKind, StockMovement};
use stockroom_db::entities::products;
use stockroom_db::repositories::invoice::{
    AddInvoiceItemInput, CreateInvoiceInput, InvoiceError, InvoiceRepository, UpdateInvoiceInput,
    UpdateInvoiceItemInput,
};
use stockroom_db::repositories::product::{CreateProductInput, ProductRepository};
use stockroom_db::repositories::stock::{RecordMovementInput, StockLedgerError, StockRepository};

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

/// Creates a product and stocks it with `initial` units.
async fn create_stocked_product(db: &DatabaseConnection, initial: i64) -> products::Model {
    let repo = ProductRepository::new(db.clone());
    let tag = Uuid::new_v4();
    let product = repo
        .create(CreateProductInput {
            name: format!("Invoice Test Widget {tag}"),
            description: None,
            sku: Some(format!("SKU-INV-{tag}")),
            category_id: None,
            supplier_id: None,
            unit_price: dec!(50.00),
            selling_price: dec!(100.00),
            reorder_level: 5,
        })
        .await
        .expect("Failed to create product");

    if initial > 0 {
        StockRepository::new(db.clone())
            .record(RecordMovementInput {
                product_id: product.id,
                movement: StockMovement::new(MovementKind::In, initial),
                notes: Some("Opening stock".to_string()),
                created_by: None,
            })
            .await
            .expect("Failed to stock product");
    }

    product
}

async fn quantity_of(db: &DatabaseConnection, id: Uuid) -> i64 {
    ProductRepository::new(db.clone())
        .find_by_id(id)
        .await
        .expect("Failed to fetch product")
        .expect("Product missing")
        .quantity
}

fn invoice_input(discount_rate: Decimal, tax_rate: Decimal) -> CreateInvoiceInput {
    CreateInvoiceInput {
        invoice_number: format!("INV-{}", Uuid::new_v4()),
        customer_name: Some("Test Customer".to_string()),
        sale_date: NaiveDate::from_ymd_opt(2026, 8, 10).expect("valid date"),
        due_date: None,
        discount_rate,
        tax_rate,
        notes: None,
        created_by: None,
    }
}

#[tokio::test]
async fn test_totals_derive_from_lines_and_rates() {
    let Some(db) = connect().await else { return };
    let product = create_stocked_product(&db, 10).await;

    let repo = InvoiceRepository::new(db.clone());
    let invoice = repo
        .create(invoice_input(dec!(10), dec!(5)))
        .await
        .expect("Failed to create invoice");

    repo.add_item(
        invoice.id,
        AddInvoiceItemInput {
            product_id: product.id,
            quantity: 2,
            unit_price: dec!(100.00),
            created_by: None,
        },
    )
    .await
    .expect("Failed to add item");

    let with_items = repo.get(invoice.id).await.expect("Failed to fetch invoice");
    assert_eq!(with_items.invoice.sub_total, dec!(200.00));
    assert_eq!(with_items.invoice.discount_amount, dec!(20.00));
    assert_eq!(with_items.invoice.tax_amount, dec!(9.00));
    assert_eq!(with_items.invoice.total_amount, dec!(189.00));

    assert_eq!(quantity_of(&db, product.id).await, 8);
}

#[tokio::test]
async fn test_sale_beyond_stock_persists_nothing() {
    let Some(db) = connect().await else { return };
    let product = create_stocked_product(&db, 10).await;

    let repo = InvoiceRepository::new(db.clone());
    let invoice = repo
        .create(invoice_input(dec!(0), dec!(0)))
        .await
        .expect("Failed to create invoice");

    repo.add_item(
        invoice.id,
        AddInvoiceItemInput {
            product_id: product.id,
            quantity: 3,
            unit_price: dec!(100.00),
            created_by: None,
        },
    )
    .await
    .expect("Failed to add first item");

    let result = repo
        .add_item(
            invoice.id,
            AddInvoiceItemInput {
                product_id: product.id,
                quantity: 8,
                unit_price: dec!(100.00),
                created_by: None,
            },
        )
        .await;

    match result {
        Err(InvoiceError::Stock(StockLedgerError::InsufficientStock {
            available,
            requested,
            ..
        })) => {
            assert_eq!(available, 7);
            assert_eq!(requested, 8);
        }
        other => panic!("Expected InsufficientStock, got {other:?}"),
    }

    let with_items = repo.get(invoice.id).await.expect("Failed to fetch invoice");
    assert_eq!(with_items.items.len(), 1, "The failed line must not persist");
    assert_eq!(with_items.invoice.total_amount, dec!(300.00));
    assert_eq!(quantity_of(&db, product.id).await, 7);
}

#[tokio::test]
async fn test_quantity_edits_move_the_difference() {
    let Some(db) = connect().await else { return };
    let product = create_stocked_product(&db, 10).await;

    let repo = InvoiceRepository::new(db.clone());
    let invoice = repo
        .create(invoice_input(dec!(0), dec!(0)))
        .await
        .expect("Failed to create invoice");

    let item = repo
        .add_item(
            invoice.id,
            AddInvoiceItemInput {
                product_id: product.id,
                quantity: 3,
                unit_price: dec!(100.00),
                created_by: None,
            },
        )
        .await
        .expect("Failed to add item");
    assert_eq!(quantity_of(&db, product.id).await, 7);

    // Increase to 5: two more units leave stock.
    repo.update_item(
        invoice.id,
        item.id,
        UpdateInvoiceItemInput {
            quantity: Some(5),
            unit_price: None,
            created_by: None,
        },
    )
    .await
    .expect("Failed to increase quantity");
    assert_eq!(quantity_of(&db, product.id).await, 5);

    // Decrease to 1: four units come back.
    repo.update_item(
        invoice.id,
        item.id,
        UpdateInvoiceItemInput {
            quantity: Some(1),
            unit_price: None,
            created_by: None,
        },
    )
    .await
    .expect("Failed to decrease quantity");
    assert_eq!(quantity_of(&db, product.id).await, 9);

    let with_items = repo.get(invoice.id).await.expect("Failed to fetch invoice");
    assert_eq!(with_items.invoice.total_amount, dec!(100.00));
}

#[tokio::test]
async fn test_rate_change_recomputes_totals() {
    let Some(db) = connect().await else { return };
    let product = create_stocked_product(&db, 10).await;

    let repo = InvoiceRepository::new(db.clone());
    let invoice = repo
        .create(invoice_input(dec!(10), dec!(5)))
        .await
        .expect("Failed to create invoice");

    repo.add_item(
        invoice.id,
        AddInvoiceItemInput {
            product_id: product.id,
            quantity: 2,
            unit_price: dec!(100.00),
            created_by: None,
        },
    )
    .await
    .expect("Failed to add item");

    let updated = repo
        .update(
            invoice.id,
            UpdateInvoiceInput {
                discount_rate: Some(dec!(0)),
                tax_rate: Some(dec!(0)),
                ..UpdateInvoiceInput::default()
            },
        )
        .await
        .expect("Failed to update rates");

    assert_eq!(updated.sub_total, dec!(200.00));
    assert_eq!(updated.discount_amount, dec!(0.00));
    assert_eq!(updated.tax_amount, dec!(0.00));
    assert_eq!(updated.total_amount, dec!(200.00));
}

#[tokio::test]
async fn test_out_of_range_rate_is_rejected() {
    let Some(db) = connect().await else { return };
    let repo = InvoiceRepository::new(db.clone());

    let result = repo.create(invoice_input(dec!(101), dec!(0))).await;
    assert!(matches!(result, Err(InvoiceError::Validation(_))));
}

#[tokio::test]
async fn test_item_is_only_reachable_under_its_own_invoice() {
    let Some(db) = connect().await else { return };
    let product = create_stocked_product(&db, 10).await;

    let repo = InvoiceRepository::new(db.clone());
    let invoice = repo
        .create(invoice_input(dec!(0), dec!(0)))
        .await
        .expect("Failed to create invoice");
    let other = repo
        .create(invoice_input(dec!(0), dec!(0)))
        .await
        .expect("Failed to create other invoice");

    let item = repo
        .add_item(
            invoice.id,
            AddInvoiceItemInput {
                product_id: product.id,
                quantity: 3,
                unit_price: dec!(100.00),
                created_by: None,
            },
        )
        .await
        .expect("Failed to add item");

    let result = repo
        .update_item(
            other.id,
            item.id,
            UpdateInvoiceItemInput {
                quantity: Some(1),
                unit_price: None,
                created_by: None,
            },
        )
        .await;
    assert!(matches!(result, Err(InvoiceError::ItemNotFound(_))));

    let result = repo.remove_item(other.id, item.id, None).await;
    assert!(matches!(result, Err(InvoiceError::ItemNotFound(_))));

    // The item and its stock effect are untouched.
    assert_eq!(quantity_of(&db, product.id).await, 7);
    let with_items = repo.get(invoice.id).await.expect("Failed to fetch invoice");
    assert_eq!(with_items.items.len(), 1);
}

#[tokio::test]
async fn test_delete_returns_sold_units() {
    let Some(db) = connect().await else { return };
    let product = create_stocked_product(&db, 10).await;

    let repo = InvoiceRepository::new(db.clone());
    let invoice = repo
        .create(invoice_input(dec!(0), dec!(0)))
        .await
        .expect("Failed to create invoice");

    repo.add_item(
        invoice.id,
        AddInvoiceItemInput {
            product_id: product.id,
            quantity: 6,
            unit_price: dec!(100.00),
            created_by: None,
        },
    )
    .await
    .expect("Failed to add item");
    assert_eq!(quantity_of(&db, product.id).await, 4);

    repo.delete(invoice.id, None)
        .await
        .expect("Failed to delete invoice");
    assert_eq!(
        quantity_of(&db, product.id).await,
        10,
        "Deleting the invoice must return the sold units"
    );
}
