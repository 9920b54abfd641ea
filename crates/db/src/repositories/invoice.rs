//! Sales invoice repository.
//!
//! The only entry points that create or remove invoice line items. Each
//! operation runs as one database transaction: the stock movement, the
//! item write, and the recomputed totals commit together or not at all.
//! The conditional stock update doubles as the sufficiency check, so a
//! sale of more units than are in stock fails before anything persists.

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
use crate::entities::{invoice_items, invoices};

/// Error types for invoice operations.
#[derive(Debug, thiserror::Error)]
pub enum InvoiceError {
    /// Invoice not found.
    #[error("Invoice not found: {0}")]
    NotFound(Uuid),

    /// Invoice item not found.
    #[error("Invoice item not found: {0}")]
    ItemNotFound(Uuid),

    /// Invoice number already taken.
    #[error("Invoice number already taken: {0}")]
    NumberTaken(String),

    /// Line or rate validation failed.
    #[error("Invalid input: {0}")]
    Validation(#[from] TotalsError),

    /// Stock movement failed (including insufficient stock).
    #[error(transparent)]
    Stock(#[from] StockLedgerError),

    /// Compensating stock reversal failed; the whole unit rolled back.
    #[error("Stock reversal failed: {0}")]
    Reversal(#[source] StockLedgerError),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

/// Input for creating an invoice.
#[derive(Debug, Clone)]
pub struct CreateInvoiceInput {
    /// Unique invoice number.
    pub invoice_number: String,
    /// Customer name.
    pub customer_name: Option<String>,
    /// Sale date.
    pub sale_date: NaiveDate,
    /// Optional due date.
    pub due_date: Option<NaiveDate>,
    /// Discount rate in percent, within [0, 100].
    pub discount_rate: Decimal,
    /// Tax rate in percent, within [0, 100].
    pub tax_rate: Decimal,
    /// Optional notes.
    pub notes: Option<String>,
    /// Acting user.
    pub created_by: Option<Uuid>,
}

/// Input for updating invoice header fields.
///
/// A rate change recomputes the derived totals in the same transaction.
/// Nullable columns take a double `Option`: the outer level distinguishes
/// "leave unchanged" from "set", and `Some(None)` clears the value.
#[derive(Debug, Clone, Default)]
pub struct UpdateInvoiceInput {
    /// New customer name; `Some(None)` clears it.
    pub customer_name: Option<Option<String>>,
    /// New sale date.
    pub sale_date: Option<NaiveDate>,
    /// New due date; `Some(None)` clears it.
    pub due_date: Option<Option<NaiveDate>>,
    /// New discount rate.
    pub discount_rate: Option<Decimal>,
    /// New tax rate.
    pub tax_rate: Option<Decimal>,
    /// New notes; `Some(None)` clears them.
    pub notes: Option<Option<String>>,
}

/// Input for adding an invoice line item.
#[derive(Debug, Clone)]
pub struct AddInvoiceItemInput {
    /// Product sold.
    pub product_id: Uuid,
    /// Units sold (positive).
    pub quantity: i64,
    /// Sale price per unit.
    pub unit_price: Decimal,
    /// Acting user.
    pub created_by: Option<Uuid>,
}

/// Input for updating an invoice line item.
#[derive(Debug, Clone, Default)]
pub struct UpdateInvoiceItemInput {
    /// New quantity; the difference flows through the stock ledger.
    pub quantity: Option<i64>,
    /// New sale price.
    pub unit_price: Option<Decimal>,
    /// Acting user.
    pub created_by: Option<Uuid>,
}

/// Filter options for listing invoices.
#[derive(Debug, Clone, Default)]
pub struct InvoiceFilter {
    /// Match customer name (substring).
    pub customer: Option<String>,
    /// Match invoice number exactly.
    pub number: Option<String>,
    /// Sales on or after this date.
    pub date_from: Option<NaiveDate>,
    /// Sales on or before this date.
    pub date_to: Option<NaiveDate>,
}

/// Invoice with its line items.
#[derive(Debug, Clone)]
pub struct InvoiceWithItems {
    /// Invoice header.
    pub invoice: invoices::Model,
    /// Line items.
    pub items: Vec<invoice_items::Model>,
}

/// Invoice repository: header CRUD plus the line-item lifecycle.
#[derive(Debug, Clone)]
pub struct InvoiceRepository {
    db: DatabaseConnection,
}

impl InvoiceRepository {
    /// Creates a new invoice repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Creates a new empty invoice with zero totals.
    ///
    /// # Errors
    ///
    /// Returns an error if a rate is out of range or the invoice number
    /// is taken.
    pub async fn create(&self, input: CreateInvoiceInput) -> Result<invoices::Model, InvoiceError> {
        TotalsCalculator::validate_rate(input.discount_rate)?;
        TotalsCalculator::validate_rate(input.tax_rate)?;

        if self.number_exists(&input.invoice_number).await? {
            return Err(InvoiceError::NumberTaken(input.invoice_number));
        }

        let now = Utc::now().into();
        let invoice = invoices::ActiveModel {
            id: Set(Uuid::new_v4()),
            invoice_number: Set(input.invoice_number),
            customer_name: Set(input.customer_name),
            sale_date: Set(input.sale_date),
            due_date: Set(input.due_date),
            sub_total: Set(Decimal::ZERO),
            discount_rate: Set(input.discount_rate),
            discount_amount: Set(Decimal::ZERO),
            tax_rate: Set(input.tax_rate),
            tax_amount: Set(Decimal::ZERO),
            total_amount: Set(Decimal::ZERO),
            notes: Set(input.notes),
            created_by: Set(input.created_by),
            created_at: Set(now),
            updated_at: Set(now),
        };

        Ok(invoice.insert(&self.db).await?)
    }

    /// Lists invoices with optional filters, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list(&self, filter: InvoiceFilter) -> Result<Vec<invoices::Model>, InvoiceError> {
        let mut query = invoices::Entity::find();

        if let Some(customer) = filter.customer {
            query = query.filter(invoices::Column::CustomerName.contains(&customer));
        }

        if let Some(number) = filter.number {
            query = query.filter(invoices::Column::InvoiceNumber.eq(number));
        }

        if let Some(from) = filter.date_from {
            query = query.filter(invoices::Column::SaleDate.gte(from));
        }

        if let Some(to) = filter.date_to {
            query = query.filter(invoices::Column::SaleDate.lte(to));
        }

        Ok(query
            .order_by_desc(invoices::Column::SaleDate)
            .order_by_desc(invoices::Column::CreatedAt)
            .all(&self.db)
            .await?)
    }

    /// Gets an invoice with its line items.
    ///
    /// # Errors
    ///
    /// Returns an error if the invoice is not found or the query fails.
    pub async fn get(&self, id: Uuid) -> Result<InvoiceWithItems, InvoiceError> {
        let invoice = invoices::Entity::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or(InvoiceError::NotFound(id))?;

        let items = invoice_items::Entity::find()
            .filter(invoice_items::Column::InvoiceId.eq(id))
            .order_by_asc(invoice_items::Column::CreatedAt)
            .all(&self.db)
            .await?;

        Ok(InvoiceWithItems { invoice, items })
    }

    /// Updates invoice header fields. Rate changes re-derive the totals
    /// inside the same transaction.
    ///
    /// # Errors
    ///
    /// Returns an error if the invoice is not found or a rate is out of
    /// range.
    pub async fn update(
        &self,
        id: Uuid,
        input: UpdateInvoiceInput,
    ) -> Result<invoices::Model, InvoiceError> {
        if let Some(rate) = input.discount_rate {
            TotalsCalculator::validate_rate(rate)?;
        }
        if let Some(rate) = input.tax_rate {
            TotalsCalculator::validate_rate(rate)?;
        }

        let txn = self.db.begin().await?;

        let invoice = invoices::Entity::find_by_id(id)
            .one(&txn)
            .await?
            .ok_or(InvoiceError::NotFound(id))?;

        let rates_changed = input.discount_rate.is_some() || input.tax_rate.is_some();

        let mut active: invoices::ActiveModel = invoice.into();
        if let Some(customer_name) = input.customer_name {
            active.customer_name = Set(customer_name);
        }
        if let Some(sale_date) = input.sale_date {
            active.sale_date = Set(sale_date);
        }
        if let Some(due_date) = input.due_date {
            active.due_date = Set(due_date);
        }
        if let Some(discount_rate) = input.discount_rate {
            active.discount_rate = Set(discount_rate);
        }
        if let Some(tax_rate) = input.tax_rate {
            active.tax_rate = Set(tax_rate);
        }
        if let Some(notes) = input.notes {
            active.notes = Set(notes);
        }
        active.updated_at = Set(Utc::now().into());
        let invoice = active.update(&txn).await?;

        if rates_changed {
            recompute_totals(&txn, &invoice).await?;
        }
        txn.commit().await?;

        self.get(id).await.map(|with_items| with_items.invoice)
    }

    /// Adds a line item: records the stock-out movement (the sufficiency
    /// check), inserts the row, and recomputes the totals, all in one
    /// transaction. On insufficient stock nothing persists.
    ///
    /// # Errors
    ///
    /// Returns an error if the invoice or product is missing, the line is
    /// invalid, or stock is insufficient.
    pub async fn add_item(
        &self,
        invoice_id: Uuid,
        input: AddInvoiceItemInput,
    ) -> Result<invoice_items::Model, InvoiceError> {
        TotalsCalculator::validate_line(LineAmount::new(input.quantity, input.unit_price))?;

        let txn = self.db.begin().await?;

        let invoice = invoices::Entity::find_by_id(invoice_id)
            .one(&txn)
            .await?
            .ok_or(InvoiceError::NotFound(invoice_id))?;

        apply_movement(
            &txn,
            RecordMovementInput {
                product_id: input.product_id,
                movement: StockMovement::new(MovementKind::Out, input.quantity),
                notes: Some(format!("Invoice {}", invoice.invoice_number)),
                created_by: input.created_by,
            },
        )
        .await?;

        let item = invoice_items::ActiveModel {
            id: Set(Uuid::new_v4()),
            invoice_id: Set(invoice.id),
            product_id: Set(input.product_id),
            quantity: Set(input.quantity),
            unit_price: Set(input.unit_price),
            created_at: Set(Utc::now().into()),
        };
        let item = item.insert(&txn).await?;

        recompute_totals(&txn, &invoice).await?;
        txn.commit().await?;

        Ok(item)
    }

    /// Updates a line item. A quantity increase flows through a
    /// sufficiency-checked stock-out for the difference; a decrease
    /// returns the difference as a stock-in.
    ///
    /// # Errors
    ///
    /// Returns an error if the item is missing (or belongs to another
    /// invoice), the new values are invalid, or stock is insufficient for
    /// an increase.
    pub async fn update_item(
        &self,
        invoice_id: Uuid,
        item_id: Uuid,
        input: UpdateInvoiceItemInput,
    ) -> Result<invoice_items::Model, InvoiceError> {
        let txn = self.db.begin().await?;

        let item = invoice_items::Entity::find_by_id(item_id)
            .one(&txn)
            .await?
            .filter(|item| item.invoice_id == invoice_id)
            .ok_or(InvoiceError::ItemNotFound(item_id))?;

        let invoice = invoices::Entity::find_by_id(item.invoice_id)
            .one(&txn)
            .await?
            .ok_or(InvoiceError::NotFound(item.invoice_id))?;

        let new_quantity = input.quantity.unwrap_or(item.quantity);
        let new_price = input.unit_price.unwrap_or(item.unit_price);
        TotalsCalculator::validate_line(LineAmount::new(new_quantity, new_price))?;

        let delta = new_quantity - item.quantity;
        if delta != 0 {
            let movement = if delta > 0 {
                StockMovement::new(MovementKind::Out, delta)
            } else {
                StockMovement::new(MovementKind::In, -delta)
            };
            apply_movement(
                &txn,
                RecordMovementInput {
                    product_id: item.product_id,
                    movement,
                    notes: Some(format!("Invoice {} correction", invoice.invoice_number)),
                    created_by: input.created_by,
                },
            )
            .await?;
        }

        let mut active: invoice_items::ActiveModel = item.into();
        active.quantity = Set(new_quantity);
        active.unit_price = Set(new_price);
        let item = active.update(&txn).await?;

        recompute_totals(&txn, &invoice).await?;
        txn.commit().await?;

        Ok(item)
    }

    /// Removes a line item and returns the sold units to stock.
    ///
    /// # Errors
    ///
    /// Returns an error if the item is missing (or belongs to another
    /// invoice) or the reversal fails.
    pub async fn remove_item(
        &self,
        invoice_id: Uuid,
        item_id: Uuid,
        created_by: Option<Uuid>,
    ) -> Result<(), InvoiceError> {
        let txn = self.db.begin().await?;

        let item = invoice_items::Entity::find_by_id(item_id)
            .one(&txn)
            .await?
            .filter(|item| item.invoice_id == invoice_id)
            .ok_or(InvoiceError::ItemNotFound(item_id))?;

        let invoice = invoices::Entity::find_by_id(item.invoice_id)
            .one(&txn)
            .await?
            .ok_or(InvoiceError::NotFound(item.invoice_id))?;

        apply_movement(
            &txn,
            RecordMovementInput {
                product_id: item.product_id,
                movement: StockMovement::new(MovementKind::In, item.quantity),
                notes: Some(format!("Reversal of invoice {}", invoice.invoice_number)),
                created_by,
            },
        )
        .await
        .map_err(InvoiceError::Reversal)?;

        invoice_items::Entity::delete_by_id(item.id).exec(&txn).await?;

        recompute_totals(&txn, &invoice).await?;
        txn.commit().await?;

        Ok(())
    }

    /// Deletes an invoice, returning every item's units to stock first.
    /// Any reversal failure aborts the deletion.
    ///
    /// # Errors
    ///
    /// Returns an error if the invoice is missing or a reversal fails.
    pub async fn delete(&self, id: Uuid, created_by: Option<Uuid>) -> Result<(), InvoiceError> {
        let txn = self.db.begin().await?;

        let invoice = invoices::Entity::find_by_id(id)
            .one(&txn)
            .await?
            .ok_or(InvoiceError::NotFound(id))?;

        let items = invoice_items::Entity::find()
            .filter(invoice_items::Column::InvoiceId.eq(id))
            .all(&txn)
            .await?;

        for item in items {
            apply_movement(
                &txn,
                RecordMovementInput {
                    product_id: item.product_id,
                    movement: StockMovement::new(MovementKind::In, item.quantity),
                    notes: Some(format!("Reversal of invoice {}", invoice.invoice_number)),
                    created_by,
                },
            )
            .await
            .map_err(InvoiceError::Reversal)?;
        }

        // Cascade removes the items.
        invoices::Entity::delete_by_id(invoice.id).exec(&txn).await?;
        txn.commit().await?;

        Ok(())
    }

    /// Checks if an invoice number is already taken.
    async fn number_exists(&self, number: &str) -> Result<bool, DbErr> {
        let count = invoices::Entity::find()
            .filter(invoices::Column::InvoiceNumber.eq(number))
            .count(&self.db)
            .await?;

        Ok(count > 0)
    }
}

/// Recomputes an invoice's derived totals from the line items visible
/// inside the transaction, so they always reflect the rows just written.
async fn recompute_totals(
    txn: &DatabaseTransaction,
    invoice: &invoices::Model,
) -> Result<(), InvoiceError> {
    let items = invoice_items::Entity::find()
        .filter(invoice_items::Column::InvoiceId.eq(invoice.id))
        .all(txn)
        .await?;

    let lines: Vec<LineAmount> = items
        .iter()
        .map(|item| LineAmount::new(item.quantity, item.unit_price))
        .collect();

    let totals =
        TotalsCalculator::invoice_totals(&lines, invoice.discount_rate, invoice.tax_rate)?;

    invoices::Entity::update_many()
        .col_expr(invoices::Column::SubTotal, Expr::value(totals.sub_total))
        .col_expr(
            invoices::Column::DiscountAmount,
            Expr::value(totals.discount_amount),
        )
        .col_expr(invoices::Column::TaxAmount, Expr::value(totals.tax_amount))
        .col_expr(
            invoices::Column::TotalAmount,
            Expr::value(totals.total_amount),
        )
        .col_expr(
            invoices::Column::UpdatedAt,
            Expr::current_timestamp().into(),
        )
        .filter(invoices::Column::Id.eq(invoice.id))
        .exec(txn)
        .await?;

    Ok(())
}
