//! Product repository for database operations.
//!
//! `quantity` is deliberately absent from the create/update inputs: stock
//! levels change only through the stock repository, which pairs every
//! quantity update with an audit row.

use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, DbErr, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, Set,
};
use uuid::Uuid;

use crate::entities::{categories, products, suppliers};

/// Error types for product operations.
#[derive(Debug, thiserror::Error)]
pub enum ProductError {
    /// Product not found.
    #[error("Product not found: {0}")]
    NotFound(Uuid),

    /// SKU already taken.
    #[error("SKU already taken: {0}")]
    SkuTaken(String),

    /// Referenced category not found.
    #[error("Category not found: {0}")]
    CategoryNotFound(Uuid),

    /// Referenced supplier not found.
    #[error("Supplier not found: {0}")]
    SupplierNotFound(Uuid),

    /// Prices must not be negative.
    #[error("Price must not be negative: {0}")]
    NegativePrice(Decimal),

    /// Reorder level must not be negative.
    #[error("Reorder level must not be negative: {0}")]
    NegativeReorderLevel(i64),

    /// Product has stock history or document lines and cannot be deleted.
    #[error("Product is referenced by {lines} document line(s)")]
    InUse {
        /// Number of receipt and invoice lines referencing the product.
        lines: u64,
    },

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

/// Input for creating a product.
///
/// New products start at zero stock; initial stock is recorded as a
/// manual stock-in movement.
#[derive(Debug, Clone)]
pub struct CreateProductInput {
    /// Product name.
    pub name: String,
    /// Optional description.
    pub description: Option<String>,
    /// Optional SKU (unique when present).
    pub sku: Option<String>,
    /// Optional category reference.
    pub category_id: Option<Uuid>,
    /// Optional supplier reference.
    pub supplier_id: Option<Uuid>,
    /// Purchase cost per unit.
    pub unit_price: Decimal,
    /// Sale price per unit.
    pub selling_price: Decimal,
    /// Reorder threshold.
    pub reorder_level: i64,
}

/// Input for updating a product.
#[derive(Debug, Clone, Default)]
pub struct UpdateProductInput {
    /// New name.
    pub name: Option<String>,
    /// New description.
    pub description: Option<String>,
    /// New SKU.
    pub sku: Option<String>,
    /// New category reference.
    pub category_id: Option<Uuid>,
    /// New supplier reference.
    pub supplier_id: Option<Uuid>,
    /// New purchase cost.
    pub unit_price: Option<Decimal>,
    /// New sale price.
    pub selling_price: Option<Decimal>,
    /// New reorder threshold.
    pub reorder_level: Option<i64>,
}

/// Filter options for listing products.
#[derive(Debug, Clone, Default)]
pub struct ProductFilter {
    /// Match name or SKU (substring).
    pub search: Option<String>,
    /// Filter by category.
    pub category_id: Option<Uuid>,
    /// Filter by supplier.
    pub supplier_id: Option<Uuid>,
    /// Only products at or below their reorder level.
    pub below_reorder: bool,
}

/// Product repository for CRUD operations.
#[derive(Debug, Clone)]
pub struct ProductRepository {
    db: DatabaseConnection,
}

impl ProductRepository {
    /// Creates a new product repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Creates a new product with zero stock.
    ///
    /// # Errors
    ///
    /// Returns an error if validation fails, the SKU is taken, a
    /// referenced category/supplier does not exist, or the insert fails.
    pub async fn create(&self, input: CreateProductInput) -> Result<products::Model, ProductError> {
        validate_prices(input.unit_price, input.selling_price)?;
        if input.reorder_level < 0 {
            return Err(ProductError::NegativeReorderLevel(input.reorder_level));
        }

        if let Some(ref sku) = input.sku {
            if self.sku_exists(sku, None).await? {
                return Err(ProductError::SkuTaken(sku.clone()));
            }
        }
        self.check_references(input.category_id, input.supplier_id)
            .await?;

        let now = Utc::now().into();
        let product = products::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(input.name),
            description: Set(input.description),
            sku: Set(input.sku),
            category_id: Set(input.category_id),
            supplier_id: Set(input.supplier_id),
            unit_price: Set(input.unit_price),
            selling_price: Set(input.selling_price),
            quantity: Set(0),
            reorder_level: Set(input.reorder_level),
            created_at: Set(now),
            updated_at: Set(now),
        };

        Ok(product.insert(&self.db).await?)
    }

    /// Lists products with optional filters, ordered by name.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list(&self, filter: ProductFilter) -> Result<Vec<products::Model>, ProductError> {
        let mut query = products::Entity::find();

        if let Some(search) = filter.search {
            query = query.filter(
                Condition::any()
                    .add(products::Column::Name.contains(&search))
                    .add(products::Column::Sku.contains(&search)),
            );
        }

        if let Some(category_id) = filter.category_id {
            query = query.filter(products::Column::CategoryId.eq(category_id));
        }

        if let Some(supplier_id) = filter.supplier_id {
            query = query.filter(products::Column::SupplierId.eq(supplier_id));
        }

        if filter.below_reorder {
            query = query.filter(
                Expr::col(products::Column::Quantity).lte(Expr::col(products::Column::ReorderLevel)),
            );
        }

        Ok(query
            .order_by_asc(products::Column::Name)
            .all(&self.db)
            .await?)
    }

    /// Finds a product by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<products::Model>, ProductError> {
        Ok(products::Entity::find_by_id(id).one(&self.db).await?)
    }

    /// Updates a product's descriptive fields and prices.
    ///
    /// # Errors
    ///
    /// Returns an error if the product is not found, validation fails,
    /// the new SKU is taken, or a referenced category/supplier does not
    /// exist.
    pub async fn update(
        &self,
        id: Uuid,
        input: UpdateProductInput,
    ) -> Result<products::Model, ProductError> {
        let product = products::Entity::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or(ProductError::NotFound(id))?;

        if let Some(price) = input.unit_price {
            if price < Decimal::ZERO {
                return Err(ProductError::NegativePrice(price));
            }
        }
        if let Some(price) = input.selling_price {
            if price < Decimal::ZERO {
                return Err(ProductError::NegativePrice(price));
            }
        }
        if let Some(level) = input.reorder_level {
            if level < 0 {
                return Err(ProductError::NegativeReorderLevel(level));
            }
        }

        if let Some(ref sku) = input.sku {
            if product.sku.as_deref() != Some(sku) && self.sku_exists(sku, Some(id)).await? {
                return Err(ProductError::SkuTaken(sku.clone()));
            }
        }
        self.check_references(input.category_id, input.supplier_id)
            .await?;

        let mut active: products::ActiveModel = product.into();
        if let Some(name) = input.name {
            active.name = Set(name);
        }
        if let Some(description) = input.description {
            active.description = Set(Some(description));
        }
        if let Some(sku) = input.sku {
            active.sku = Set(Some(sku));
        }
        if let Some(category_id) = input.category_id {
            active.category_id = Set(Some(category_id));
        }
        if let Some(supplier_id) = input.supplier_id {
            active.supplier_id = Set(Some(supplier_id));
        }
        if let Some(unit_price) = input.unit_price {
            active.unit_price = Set(unit_price);
        }
        if let Some(selling_price) = input.selling_price {
            active.selling_price = Set(selling_price);
        }
        if let Some(reorder_level) = input.reorder_level {
            active.reorder_level = Set(reorder_level);
        }
        active.updated_at = Set(Utc::now().into());

        Ok(active.update(&self.db).await?)
    }

    /// Deletes a product.
    ///
    /// Stock transactions cascade away with the product; receipt and
    /// invoice lines keep their documents honest, so a referenced product
    /// cannot be deleted.
    ///
    /// # Errors
    ///
    /// Returns an error if the product is not found or is referenced by
    /// document lines.
    pub async fn delete(&self, id: Uuid) -> Result<(), ProductError> {
        use crate::entities::{invoice_items, receipt_items};

        let product = products::Entity::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or(ProductError::NotFound(id))?;

        let receipt_lines = receipt_items::Entity::find()
            .filter(receipt_items::Column::ProductId.eq(id))
            .count(&self.db)
            .await?;
        let invoice_lines = invoice_items::Entity::find()
            .filter(invoice_items::Column::ProductId.eq(id))
            .count(&self.db)
            .await?;

        let lines = receipt_lines + invoice_lines;
        if lines > 0 {
            return Err(ProductError::InUse { lines });
        }

        products::Entity::delete_by_id(product.id)
            .exec(&self.db)
            .await?;

        Ok(())
    }

    /// Checks if a SKU is already taken, optionally excluding one product.
    async fn sku_exists(&self, sku: &str, exclude: Option<Uuid>) -> Result<bool, DbErr> {
        let mut query = products::Entity::find().filter(products::Column::Sku.eq(sku));

        if let Some(id) = exclude {
            query = query.filter(products::Column::Id.ne(id));
        }

        let count = query.count(&self.db).await?;
        Ok(count > 0)
    }

    /// Verifies that referenced category/supplier rows exist.
    async fn check_references(
        &self,
        category_id: Option<Uuid>,
        supplier_id: Option<Uuid>,
    ) -> Result<(), ProductError> {
        if let Some(id) = category_id {
            categories::Entity::find_by_id(id)
                .one(&self.db)
                .await?
                .ok_or(ProductError::CategoryNotFound(id))?;
        }

        if let Some(id) = supplier_id {
            suppliers::Entity::find_by_id(id)
                .one(&self.db)
                .await?
                .ok_or(ProductError::SupplierNotFound(id))?;
        }

        Ok(())
    }
}

/// Validates a pair of non-negative prices.
fn validate_prices(unit_price: Decimal, selling_price: Decimal) -> Result<(), ProductError> {
    if unit_price < Decimal::ZERO {
        return Err(ProductError::NegativePrice(unit_price));
    }
    if selling_price < Decimal::ZERO {
        return Err(ProductError::NegativePrice(selling_price));
    }
    Ok(())
}
