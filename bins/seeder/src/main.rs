//! Database seeder for Stockroom development and testing.
//!
//! Seeds a test user, categories, suppliers, and products with opening
//! stock for local development and testing purposes.
//!
//! Usage: cargo run --bin seeder

use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, Set};
use std::str::FromStr;
use uuid::Uuid;
use stockroom_db::entities::{
    categories, products, sea_orm_active_enums::StockMovementKind, stock_transactions, suppliers,
    users,
};
use stockroom_shared::config::DatabaseConfig;

/// Test user ID (consistent for all seeds)
const TEST_USER_ID: &str = "00000000-0000-0000-0000-000000000001";
/// Electronics category ID
const CAT_ELECTRONICS_ID: &str = "00000000-0000-0000-0000-000000000101";
/// Stationery category ID
const CAT_STATIONERY_ID: &str = "00000000-0000-0000-0000-000000000102";
/// Acme supplier ID
const SUP_ACME_ID: &str = "00000000-0000-0000-0000-000000000201";
/// Globex supplier ID
const SUP_GLOBEX_ID: &str = "00000000-0000-0000-0000-000000000202";

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    let database_url =
        std::env::var("DATABASE_URL").expect("DATABASE_URL must be set in environment");

    println!("Connecting to database...");
    let db = stockroom_db::connect(&DatabaseConfig {
        url: database_url,
        max_connections: 5,
        min_connections: 1,
    })
    .await
    .expect("Failed to connect to database");

    println!("Seeding test user...");
    seed_test_user(&db).await;

    println!("Seeding categories...");
    seed_categories(&db).await;

    println!("Seeding suppliers...");
    seed_suppliers(&db).await;

    println!("Seeding products...");
    seed_products(&db).await;

    println!("Seeding complete!");
}

fn fixed_id(id: &str) -> Uuid {
    Uuid::parse_str(id).unwrap()
}

/// Seeds a test user for development.
async fn seed_test_user(db: &DatabaseConnection) {
    if users::Entity::find_by_id(fixed_id(TEST_USER_ID))
        .one(db)
        .await
        .ok()
        .flatten()
        .is_some()
    {
        println!("  Test user already exists, skipping...");
        return;
    }

    let user = users::ActiveModel {
        id: Set(fixed_id(TEST_USER_ID)),
        username: Set("staff".to_string()),
        email: Set(Some("staff@stockroom.dev".to_string())),
        is_staff: Set(true),
        is_active: Set(true),
        created_at: Set(Utc::now().into()),
        updated_at: Set(Utc::now().into()),
    };

    if let Err(e) = user.insert(db).await {
        eprintln!("Failed to insert test user: {e}");
    } else {
        println!("  Created test user: staff");
    }
}

/// Seeds a couple of categories.
async fn seed_categories(db: &DatabaseConnection) {
    let seeds = [
        (CAT_ELECTRONICS_ID, "Electronics", "Devices and accessories"),
        (CAT_STATIONERY_ID, "Stationery", "Office supplies"),
    ];

    let mut inserted = 0;
    for (id, name, description) in seeds {
        if categories::Entity::find_by_id(fixed_id(id))
            .one(db)
            .await
            .ok()
            .flatten()
            .is_some()
        {
            continue;
        }

        let category = categories::ActiveModel {
            id: Set(fixed_id(id)),
            name: Set(name.to_string()),
            description: Set(Some(description.to_string())),
            created_at: Set(Utc::now().into()),
            updated_at: Set(Utc::now().into()),
        };

        if let Err(e) = category.insert(db).await {
            eprintln!("Failed to insert category {name}: {e}");
        } else {
            inserted += 1;
        }
    }

    println!("  Inserted {inserted} categories");
}

/// Seeds a couple of suppliers.
async fn seed_suppliers(db: &DatabaseConnection) {
    let seeds = [
        (SUP_ACME_ID, "Acme Wholesale", "sales@acme.example"),
        (SUP_GLOBEX_ID, "Globex Trading", "orders@globex.example"),
    ];

    let mut inserted = 0;
    for (id, name, email) in seeds {
        if suppliers::Entity::find_by_id(fixed_id(id))
            .one(db)
            .await
            .ok()
            .flatten()
            .is_some()
        {
            continue;
        }

        let supplier = suppliers::ActiveModel {
            id: Set(fixed_id(id)),
            name: Set(name.to_string()),
            contact_person: Set(None),
            email: Set(Some(email.to_string())),
            phone: Set(None),
            address: Set(None),
            created_at: Set(Utc::now().into()),
            updated_at: Set(Utc::now().into()),
        };

        if let Err(e) = supplier.insert(db).await {
            eprintln!("Failed to insert supplier {name}: {e}");
        } else {
            inserted += 1;
        }
    }

    println!("  Inserted {inserted} suppliers");
}

/// Seeds products with opening stock. Each product gets a matching
/// stock-in transaction so the level always equals the movement history.
async fn seed_products(db: &DatabaseConnection) {
    let seeds: [(&str, &str, &str, &str, &str, i64, &str, &str); 4] = [
        (
            "00000000-0000-0000-0000-000000000301",
            "USB-C Cable 1m",
            "SKU-CABLE-1M",
            CAT_ELECTRONICS_ID,
            SUP_ACME_ID,
            120,
            "2.50",
            "7.99",
        ),
        (
            "00000000-0000-0000-0000-000000000302",
            "Wireless Mouse",
            "SKU-MOUSE-W",
            CAT_ELECTRONICS_ID,
            SUP_ACME_ID,
            40,
            "8.00",
            "19.99",
        ),
        (
            "00000000-0000-0000-0000-000000000303",
            "A4 Notebook",
            "SKU-NOTEBOOK-A4",
            CAT_STATIONERY_ID,
            SUP_GLOBEX_ID,
            200,
            "1.20",
            "3.50",
        ),
        (
            "00000000-0000-0000-0000-000000000304",
            "Ballpoint Pen (Box of 50)",
            "SKU-PEN-BOX50",
            CAT_STATIONERY_ID,
            SUP_GLOBEX_ID,
            30,
            "4.00",
            "9.00",
        ),
    ];

    let mut inserted = 0;
    for (id, name, sku, category_id, supplier_id, quantity, unit_price, selling_price) in seeds {
        if products::Entity::find_by_id(fixed_id(id))
            .one(db)
            .await
            .ok()
            .flatten()
            .is_some()
        {
            continue;
        }

        let product = products::ActiveModel {
            id: Set(fixed_id(id)),
            name: Set(name.to_string()),
            description: Set(None),
            sku: Set(Some(sku.to_string())),
            category_id: Set(Some(fixed_id(category_id))),
            supplier_id: Set(Some(fixed_id(supplier_id))),
            unit_price: Set(Decimal::from_str(unit_price).unwrap()),
            selling_price: Set(Decimal::from_str(selling_price).unwrap()),
            quantity: Set(quantity),
            reorder_level: Set(10),
            created_at: Set(Utc::now().into()),
            updated_at: Set(Utc::now().into()),
        };

        if let Err(e) = product.insert(db).await {
            eprintln!("Failed to insert product {name}: {e}");
            continue;
        }

        let opening = stock_transactions::ActiveModel {
            id: Set(Uuid::new_v4()),
            product_id: Set(fixed_id(id)),
            kind: Set(StockMovementKind::In),
            quantity: Set(quantity),
            notes: Set(Some("Opening stock".to_string())),
            created_by: Set(Some(fixed_id(TEST_USER_ID))),
            occurred_at: Set(Utc::now().into()),
        };

        if let Err(e) = opening.insert(db).await {
            eprintln!("Failed to insert opening stock for {name}: {e}");
        } else {
            inserted += 1;
        }
    }

    println!("  Inserted {inserted} products with opening stock");
}
