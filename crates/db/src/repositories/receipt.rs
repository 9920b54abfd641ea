//! Purchase receipt repository.
//!
//! The only entry points that create or remove receipt line items. Each
//! operation runs as one database transaction: the item write, its stock
//! movement, and the recomputed `total_amount` commit together or not at
//! all.

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DatabaseTransaction, DbErr, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
};
use stockroom_core::stock::{MovementKind, StockMovement};
use stockroom_core::totals::{LineAmount, TotalsCalculator, TotalsError};
use uuid::Uuid;

use super::stock::{apply_movement, RecordMovementInput, StockLedgerError};
use crate::entities::{receipt_items, receipts, suppliers};

/// Error types for receipt operations.
#[derive(Debug, thiserror::Error)]
pub enum ReceiptError {
    /// Receipt not found.
    #[error("Receipt not found: {0}")]
    NotFound(Uuid),

    /// Receipt item not found.
    #[error("Receipt item not found: {0}")]
    ItemNotFound(Uuid),

    /// Receipt number already taken.
    #[error("Receipt number already taken: {0}")]
    NumberTaken(String),

    /// Referenced supplier not found.
    #[error("Supplier not found: {0}")]
    SupplierNotFound(Uuid),

    /// Line validation failed.
    #[error("Invalid line: {0}")]
    Line(#[from] TotalsError),

    /// Stock movement failed.
    #[error(transparent)]
    Stock(#[from] StockLedgerError),

    /// Compensating stock reversal failed; the whole unit rolled back.
    #[error("Stock reversal failed: {0}")]
    Reversal(#[source] StockLedgerError),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

/// Input for creating a receipt.
#[derive(Debug, Clone)]
pub struct CreateReceiptInput {
    /// Unique receipt number.
    pub receipt_number: String,
    /// Optional supplier reference.
    pub supplier_id: Option<Uuid>,
    /// Purchase date.
    pub purchase_date: NaiveDate,
    /// Optional notes.
    pub notes: Option<String>,
    /// Acting user.
    pub created_by: Option<Uuid>,
}

/// Input for updating receipt header fields.
///
/// Nullable columns take a double `Option`: the outer level distinguishes
/// "leave unchanged" from "set", and `Some(None)` clears the value.
#[derive(Debug, Clone, Default)]
pub struct UpdateReceiptInput {
    /// New supplier reference; `Some(None)` clears it.
    pub supplier_id: Option<Option<Uuid>>,
    /// New purchase date.
    pub purchase_date: Option<NaiveDate>,
    /// New notes; `Some(None)` clears them.
    pub notes: Option<Option<String>>,
}

/// Input for adding a receipt line item.
#[derive(Debug, Clone)]
pub struct AddReceiptItemInput {
    /// Product received.
    pub product_id: Uuid,
    /// Units received (positive).
    pub quantity: i64,
    /// Purchase price per unit.
    pub unit_price: Decimal,
    /// Acting user.
    pub created_by: Option<Uuid>,
}

/// Input for updating a receipt line item.
#[derive(Debug, Clone, Default)]
pub struct UpdateReceiptItemInput {
    /// New quantity; the difference flows through the stock ledger.
    pub quantity: Option<i64>,
    /// New purchase price.
    pub unit_price: Option<Decimal>,
    /// Acting user.
    pub created_by: Option<Uuid>,
}

/// Filter options for listing receipts.
#[derive(Debug, Clone, Default)]
pub struct ReceiptFilter {
    /// Filter by supplier.
    pub supplier_id: Option<Uuid>,
    /// Purchases on or after this date.
    pub date_from: Option<NaiveDate>,
    /// Purchases on or before this date.
    pub date_to: Option<NaiveDate>,
}

/// Receipt with its line items.
#[derive(Debug, Clone)]
pub struct ReceiptWithItems {
    /// Receipt header.
    pub receipt: receipts::Model,
    /// Line items.
    pub items: Vec<receipt_items::Model>,
}

/// Receipt repository: header CRUD plus the line-item lifecycle.
#[derive(Debug, Clone)]
pub struct ReceiptRepository {
    db: DatabaseConnection,
}

impl ReceiptRepository {
    /// Creates a new receipt repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Creates a new empty receipt.
    ///
    /// # Errors
    ///
    /// Returns an error if the receipt number is taken or the referenced
    /// supplier does not exist.
    pub async fn create(&self, input: CreateReceiptInput) -> Result<receipts::Model, ReceiptError> {
        if self.number_exists(&input.receipt_number).await? {
            return Err(ReceiptError::NumberTaken(input.receipt_number));
        }

        if let Some(id) = input.supplier_id {
            suppliers::Entity::find_by_id(id)
                .one(&self.db)
                .await?
                .ok_or(ReceiptError::SupplierNotFound(id))?;
        }

        let now = Utc::now().into();
        let receipt = receipts::ActiveModel {
            id: Set(Uuid::new_v4()),
            receipt_number: Set(input.receipt_number),
            supplier_id: Set(input.supplier_id),
            purchase_date: Set(input.purchase_date),
            total_amount: Set(Decimal::ZERO),
            notes: Set(input.notes),
            created_by: Set(input.created_by),
            created_at: Set(now),
            updated_at: Set(now),
        };

        Ok(receipt.insert(&self.db).await?)
    }

    /// Lists receipts with optional filters, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list(&self, filter: ReceiptFilter) -> Result<Vec<receipts::Model>, ReceiptError> {
        let mut query = receipts::Entity::find();

        if let Some(supplier_id) = filter.supplier_id {
            query = query.filter(receipts::Column::SupplierId.eq(supplier_id));
        }

        if let Some(from) = filter.date_from {
            query = query.filter(receipts::Column::PurchaseDate.gte(from));
        }

        if let Some(to) = filter.date_to {
            query = query.filter(receipts::Column::PurchaseDate.lte(to));
        }

        Ok(query
            .order_by_desc(receipts::Column::PurchaseDate)
            .order_by_desc(receipts::Column::CreatedAt)
            .all(&self.db)
            .await?)
    }

    /// Gets a receipt with its line items.
    ///
    /// # Errors
    ///
    /// Returns an error if the receipt is not found or the query fails.
    pub async fn get(&self, id: Uuid) -> Result<ReceiptWithItems, ReceiptError> {
        let receipt = receipts::Entity::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or(ReceiptError::NotFound(id))?;

        let items = receipt_items::Entity::find()
            .filter(receipt_items::Column::ReceiptId.eq(id))
            .order_by_asc(receipt_items::Column::CreatedAt)
            .all(&self.db)
            .await?;

        Ok(ReceiptWithItems { receipt, items })
    }

    /// Updates receipt header fields.
    ///
    /// # Errors
    ///
    /// Returns an error if the receipt is not found or a referenced
    /// supplier does not exist.
    pub async fn update(
        &self,
        id: Uuid,
        input: UpdateReceiptInput,
    ) -> Result<receipts::Model, ReceiptError> {
        let receipt = receipts::Entity::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or(ReceiptError::NotFound(id))?;

        if let Some(Some(supplier_id)) = input.supplier_id {
            suppliers::Entity::find_by_id(supplier_id)
                .one(&self.db)
                .await?
                .ok_or(ReceiptError::SupplierNotFound(supplier_id))?;
        }

        let mut active: receipts::ActiveModel = receipt.into();
        if let Some(supplier_id) = input.supplier_id {
            active.supplier_id = Set(supplier_id);
        }
        if let Some(purchase_date) = input.purchase_date {
            active.purchase_date = Set(purchase_date);
        }
        if let Some(notes) = input.notes {
            active.notes = Set(notes);
        }
        active.updated_at = Set(Utc::now().into());

        Ok(active.update(&self.db).await?)
    }

    /// Adds a line item: inserts the row, records the stock-in movement,
    /// and recomputes the receipt total, all in one transaction.
    ///
    /// # Errors
    ///
    /// Returns an error if the receipt or product is missing, the line is
    /// invalid, or the database operation fails.
    pub async fn add_item(
        &self,
        receipt_id: Uuid,
        input: AddReceiptItemInput,
    ) -> Result<receipt_items::Model, ReceiptError> {
        TotalsCalculator::validate_line(LineAmount::new(input.quantity, input.unit_price))?;

        let txn = self.db.begin().await?;

        let receipt = receipts::Entity::find_by_id(receipt_id)
            .one(&txn)
            .await?
            .ok_or(ReceiptError::NotFound(receipt_id))?;

        let item = receipt_items::ActiveModel {
            id: Set(Uuid::new_v4()),
            receipt_id: Set(receipt.id),
            product_id: Set(input.product_id),
            quantity: Set(input.quantity),
            unit_price: Set(input.unit_price),
            created_at: Set(Utc::now().into()),
        };
        let item = item.insert(&txn).await?;

        apply_movement(
            &txn,
            RecordMovementInput {
                product_id: input.product_id,
                movement: StockMovement::new(MovementKind::In, input.quantity),
                notes: Some(format!("Receipt {}", receipt.receipt_number)),
                created_by: input.created_by,
            },
        )
        .await?;

        recompute_total(&txn, receipt.id).await?;
        txn.commit().await?;

        Ok(item)
    }

    /// Updates a line item. A quantity change is reconciled delta-based:
    /// increases flow through a stock-in, decreases through a signed
    /// adjustment.
    ///
    /// # Errors
    ///
    /// Returns an error if the item is missing (or belongs to another
    /// receipt), the new values are invalid, or the compensating movement
    /// fails.
    pub async fn update_item(
        &self,
        receipt_id: Uuid,
        item_id: Uuid,
        input: UpdateReceiptItemInput,
    ) -> Result<receipt_items::Model, ReceiptError> {
        let txn = self.db.begin().await?;

        let item = receipt_items::Entity::find_by_id(item_id)
            .one(&txn)
            .await?
            .filter(|item| item.receipt_id == receipt_id)
            .ok_or(ReceiptError::ItemNotFound(item_id))?;

        let receipt = receipts::Entity::find_by_id(item.receipt_id)
            .one(&txn)
            .await?
            .ok_or(ReceiptError::NotFound(item.receipt_id))?;

        let new_quantity = input.quantity.unwrap_or(item.quantity);
        let new_price = input.unit_price.unwrap_or(item.unit_price);
        TotalsCalculator::validate_line(LineAmount::new(new_quantity, new_price))?;

        let delta = new_quantity - item.quantity;
        if delta != 0 {
            let movement = if delta > 0 {
                StockMovement::new(MovementKind::In, delta)
            } else {
                StockMovement::new(MovementKind::Adjustment, delta)
            };
            apply_movement(
                &txn,
                RecordMovementInput {
                    product_id: item.product_id,
                    movement,
                    notes: Some(format!("Receipt {} correction", receipt.receipt_number)),
                    created_by: input.created_by,
                },
            )
            .await?;
        }

        let mut active: receipt_items::ActiveModel = item.into();
        active.quantity = Set(new_quantity);
        active.unit_price = Set(new_price);
        let item = active.update(&txn).await?;

        recompute_total(&txn, receipt.id).await?;
        txn.commit().await?;

        Ok(item)
    }

    /// Removes a line item and reverses its stock effect with a signed
    /// adjustment. If the reversal would take stock below zero (the
    /// received units were already sold), the whole unit rolls back.
    ///
    /// # Errors
    ///
    /// Returns an error if the item is missing (or belongs to another
    /// receipt) or the reversal fails.
    pub async fn remove_item(
        &self,
        receipt_id: Uuid,
        item_id: Uuid,
        created_by: Option<Uuid>,
    ) -> Result<(), ReceiptError> {
        let txn = self.db.begin().await?;

        let item = receipt_items::Entity::find_by_id(item_id)
            .one(&txn)
            .await?
            .filter(|item| item.receipt_id == receipt_id)
            .ok_or(ReceiptError::ItemNotFound(item_id))?;

        let receipt = receipts::Entity::find_by_id(item.receipt_id)
            .one(&txn)
            .await?
            .ok_or(ReceiptError::NotFound(item.receipt_id))?;

        apply_movement(
            &txn,
            RecordMovementInput {
                product_id: item.product_id,
                movement: StockMovement::new(MovementKind::Adjustment, -item.quantity),
                notes: Some(format!("Reversal of receipt {}", receipt.receipt_number)),
                created_by,
            },
        )
        .await
        .map_err(ReceiptError::Reversal)?;

        receipt_items::Entity::delete_by_id(item.id).exec(&txn).await?;

        recompute_total(&txn, receipt.id).await?;
        txn.commit().await?;

        Ok(())
    }

    /// Deletes a receipt, reversing every item's stock effect first. Any
    /// reversal failure aborts the deletion.
    ///
    /// # Errors
    ///
    /// Returns an error if the receipt is missing or a reversal fails.
    pub async fn delete(&self, id: Uuid, created_by: Option<Uuid>) -> Result<(), ReceiptError> {
        let txn = self.db.begin().await?;

        let receipt = receipts::Entity::find_by_id(id)
            .one(&txn)
            .await?
            .ok_or(ReceiptError::NotFound(id))?;

        let items = receipt_items::Entity::find()
            .filter(receipt_items::Column::ReceiptId.eq(id))
            .all(&txn)
            .await?;

        for item in items {
            apply_movement(
                &txn,
                RecordMovementInput {
                    product_id: item.product_id,
                    movement: StockMovement::new(MovementKind::Adjustment, -item.quantity),
                    notes: Some(format!("Reversal of receipt {}", receipt.receipt_number)),
                    created_by,
                },
            )
            .await
            .map_err(ReceiptError::Reversal)?;
        }

        // Cascade removes the items.
        receipts::Entity::delete_by_id(receipt.id).exec(&txn).await?;
        txn.commit().await?;

        Ok(())
    }

    /// Checks if a receipt number is already taken.
    async fn number_exists(&self, number: &str) -> Result<bool, DbErr> {
        let count = receipts::Entity::find()
            .filter(receipts::Column::ReceiptNumber.eq(number))
            .count(&self.db)
            .await?;

        Ok(count > 0)
    }
}

/// Recomputes a receipt's total from the line items visible inside the
/// transaction, so the total always reflects the rows just written.
async fn recompute_total(txn: &DatabaseTransaction, receipt_id: Uuid) -> Result<(), DbErr> {
    let items = receipt_items::Entity::find()
        .filter(receipt_items::Column::ReceiptId.eq(receipt_id))
        .all(txn)
        .await?;

    let lines: Vec<LineAmount> = items
        .iter()
        .map(|item| LineAmount::new(item.quantity, item.unit_price))
        .collect();
    let total = TotalsCalculator::receipt_total(&lines);

    receipts::Entity::update_many()
        .col_expr(receipts::Column::TotalAmount, Expr::value(total))
        .col_expr(
            receipts::Column::UpdatedAt,
            Expr::current_timestamp().into(),
        )
        .filter(receipts::Column::Id.eq(receipt_id))
        .exec(txn)
        .await?;

    Ok(())
}
