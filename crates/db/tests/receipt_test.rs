//! Integration tests for the receipt repository.
//!
//! These tests require a migrated Postgres database; set `DATABASE_URL`
//! to run them, otherwise they are skipped.

use chrono::NaiveDate;
use rust_decimal_macros::dec;
use sea_orm::{Database, DatabaseConnection};
use std::env;
use uuid::Uuid;

use stockroom_db::entities::products;
use stockroom_db::repositories::invoice::{
    AddInvoiceItemInput, CreateInvoiceInput, InvoiceRepository,
};
use stockroom_db::repositories::product::{CreateProductInput, ProductRepository};
use stockroom_db::repositories::receipt::{
    AddReceiptItemInput, CreateReceiptInput, ReceiptError, ReceiptRepository, UpdateReceiptInput,
};
use stockroom_db::repositories::supplier::{CreateSupplierInput, SupplierRepository};

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
        name: format!("Receipt Test Widget {tag}"),
        description: None,
        sku: Some(format!("SKU-RCPT-{tag}")),
        category_id: None,
        supplier_id: None,
        unit_price: dec!(2.00),
        selling_price: dec!(4.00),
        reorder_level: 10,
    })
    .await
    .expect("Failed to create product")
}

async fn quantity_of(db: &DatabaseConnection, id: Uuid) -> i64 {
    ProductRepository::new(db.clone())
        .find_by_id(id)
        .await
        .expect("Failed to fetch product")
        .expect("Product missing")
        .quantity
}

fn receipt_input(number: String) -> CreateReceiptInput {
    CreateReceiptInput {
        receipt_number: number,
        supplier_id: None,
        purchase_date: NaiveDate::from_ymd_opt(2026, 8, 1).expect("valid date"),
        notes: None,
        created_by: None,
    }
}

#[tokio::test]
async fn test_items_increase_stock_and_derive_total() {
    let Some(db) = connect().await else { return };
    let first = create_product(&db).await;
    let second = create_product(&db).await;

    let repo = ReceiptRepository::new(db.clone());
    let receipt = repo
        .create(receipt_input(format!("RCV-{}", Uuid::new_v4())))
        .await
        .expect("Failed to create receipt");
    assert_eq!(receipt.total_amount, dec!(0));

    repo.add_item(
        receipt.id,
        AddReceiptItemInput {
            product_id: first.id,
            quantity: 5,
            unit_price: dec!(2.00),
            created_by: None,
        },
    )
    .await
    .expect("Failed to add first item");

    repo.add_item(
        receipt.id,
        AddReceiptItemInput {
            product_id: second.id,
            quantity: 3,
            unit_price: dec!(4.00),
            created_by: None,
        },
    )
    .await
    .expect("Failed to add second item");

    let with_items = repo.get(receipt.id).await.expect("Failed to fetch receipt");
    assert_eq!(with_items.items.len(), 2);
    assert_eq!(with_items.receipt.total_amount, dec!(22.00));

    assert_eq!(quantity_of(&db, first.id).await, 5);
    assert_eq!(quantity_of(&db, second.id).await, 3);
}

#[tokio::test]
async fn test_delete_reverses_received_stock() {
    let Some(db) = connect().await else { return };
    let product = create_product(&db).await;

    let repo = ReceiptRepository::new(db.clone());
    let receipt = repo
        .create(receipt_input(format!("RCV-{}", Uuid::new_v4())))
        .await
        .expect("Failed to create receipt");

    repo.add_item(
        receipt.id,
        AddReceiptItemInput {
            product_id: product.id,
            quantity: 10,
            unit_price: dec!(2.00),
            created_by: None,
        },
    )
    .await
    .expect("Failed to add item");
    assert_eq!(quantity_of(&db, product.id).await, 10);

    repo.delete(receipt.id, None)
        .await
        .expect("Failed to delete receipt");
    assert_eq!(
        quantity_of(&db, product.id).await,
        0,
        "Deleting the receipt must remove the units it brought in"
    );

    assert!(matches!(
        repo.get(receipt.id).await,
        Err(ReceiptError::NotFound(_))
    ));
}

#[tokio::test]
async fn test_delete_fails_when_units_already_sold() {
    let Some(db) = connect().await else { return };
    let product = create_product(&db).await;

    let receipts = ReceiptRepository::new(db.clone());
    let receipt = receipts
        .create(receipt_input(format!("RCV-{}", Uuid::new_v4())))
        .await
        .expect("Failed to create receipt");

    receipts
        .add_item(
            receipt.id,
            AddReceiptItemInput {
                product_id: product.id,
                quantity: 10,
                unit_price: dec!(2.00),
                created_by: None,
            },
        )
        .await
        .expect("Failed to add item");

    // Sell 7 of the 10 received units, leaving 3 in stock.
    let invoices = InvoiceRepository::new(db.clone());
    let invoice = invoices
        .create(CreateInvoiceInput {
            invoice_number: format!("INV-{}", Uuid::new_v4()),
            customer_name: None,
            sale_date: NaiveDate::from_ymd_opt(2026, 8, 2).expect("valid date"),
            due_date: None,
            discount_rate: dec!(0),
            tax_rate: dec!(0),
            notes: None,
            created_by: None,
        })
        .await
        .expect("Failed to create invoice");
    invoices
        .add_item(
            invoice.id,
            AddInvoiceItemInput {
                product_id: product.id,
                quantity: 7,
                unit_price: dec!(4.00),
                created_by: None,
            },
        )
        .await
        .expect("Failed to sell units");

    let result = receipts.delete(receipt.id, None).await;
    assert!(
        matches!(result, Err(ReceiptError::Reversal(_))),
        "Reversing 10 units with only 3 in stock must fail, got {result:?}"
    );

    // Nothing was deleted and the level is unchanged.
    assert_eq!(quantity_of(&db, product.id).await, 3);
    assert!(receipts.get(receipt.id).await.is_ok());
}

#[tokio::test]
async fn test_update_clears_nullable_fields() {
    let Some(db) = connect().await else { return };

    let supplier = SupplierRepository::new(db.clone())
        .create(CreateSupplierInput {
            name: format!("Receipt Test Supplier {}", Uuid::new_v4()),
            contact_person: None,
            email: None,
            phone: None,
            address: None,
        })
        .await
        .expect("Failed to create supplier");

    let repo = ReceiptRepository::new(db.clone());
    let receipt = repo
        .create(CreateReceiptInput {
            receipt_number: format!("RCV-{}", Uuid::new_v4()),
            supplier_id: Some(supplier.id),
            purchase_date: NaiveDate::from_ymd_opt(2026, 8, 1).expect("valid date"),
            notes: Some("walk-in purchase".to_string()),
            created_by: None,
        })
        .await
        .expect("Failed to create receipt");

    // Outer None leaves a field alone, Some(None) sets it back to NULL.
    let updated = repo
        .update(
            receipt.id,
            UpdateReceiptInput {
                supplier_id: Some(None),
                purchase_date: None,
                notes: None,
            },
        )
        .await
        .expect("Failed to clear supplier");
    assert_eq!(updated.supplier_id, None);
    assert_eq!(updated.notes.as_deref(), Some("walk-in purchase"));

    let updated = repo
        .update(
            receipt.id,
            UpdateReceiptInput {
                supplier_id: None,
                purchase_date: None,
                notes: Some(None),
            },
        )
        .await
        .expect("Failed to clear notes");
    assert_eq!(updated.notes, None);
}

#[tokio::test]
async fn test_duplicate_receipt_number_is_rejected() {
    let Some(db) = connect().await else { return };
    let repo = ReceiptRepository::new(db.clone());

    let number = format!("RCV-{}", Uuid::new_v4());
    repo.create(receipt_input(number.clone()))
        .await
        .expect("Failed to create receipt");

    let duplicate = repo.create(receipt_input(number)).await;
    assert!(matches!(duplicate, Err(ReceiptError::NumberTaken(_))));
}
