//! Stock ledger repository.
//!
//! The only code path that changes `products.quantity`. Every change is a
//! single conditional `UPDATE` paired with a `stock_transactions` insert
//! in the same database transaction, so the level and its audit trail can
//! never drift apart and no interleaving of concurrent movements can push
//! a level below zero.

use chrono::{DateTime, Utc};
use sea_orm::sea_query::{Expr, ExprTrait};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DatabaseTransaction, DbErr, EntityTrait,
    QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use stockroom_core::stock::{StockError, StockLedger, StockMovement};
use uuid::Uuid;

use crate::entities::{products, sea_orm_active_enums::StockMovementKind, stock_transactions};

/// Error types for stock ledger operations.
#[derive(Debug, thiserror::Error)]
pub enum StockLedgerError {
    /// Product not found.
    #[error("Product not found: {0}")]
    ProductNotFound(Uuid),

    /// Not enough stock to satisfy a stock-out.
    #[error("Insufficient stock for {product}: available {available}, requested {requested}")]
    InsufficientStock {
        /// Product name.
        product: String,
        /// Units currently in stock.
        available: i64,
        /// Units requested.
        requested: i64,
    },

    /// An adjustment would take the level below zero.
    #[error("Adjustment would take {product} below zero: current {current}, delta {delta}")]
    NegativeStock {
        /// Product name.
        product: String,
        /// Current stock level.
        current: i64,
        /// Signed adjustment delta.
        delta: i64,
    },

    /// The movement itself is malformed.
    #[error("Invalid stock movement: {0}")]
    InvalidMovement(#[source] StockError),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

/// Input for recording a stock movement.
#[derive(Debug, Clone)]
pub struct RecordMovementInput {
    /// Product whose level changes.
    pub product_id: Uuid,
    /// The movement to apply.
    pub movement: StockMovement,
    /// Optional free-form notes (e.g. the document that caused it).
    pub notes: Option<String>,
    /// Acting user.
    pub created_by: Option<Uuid>,
}

/// Filter options for listing stock transactions.
#[derive(Debug, Clone, Default)]
pub struct MovementFilter {
    /// Filter by product.
    pub product_id: Option<Uuid>,
    /// Filter by movement kind.
    pub kind: Option<StockMovementKind>,
    /// Movements at or after this instant.
    pub occurred_from: Option<DateTime<Utc>>,
    /// Movements at or before this instant.
    pub occurred_to: Option<DateTime<Utc>>,
    /// Maximum number of rows, newest first.
    pub limit: Option<u64>,
}

/// Applies a movement inside a caller-supplied database transaction.
///
/// The conditional update is the sufficiency check: it only matches when
/// the resulting level stays non-negative, so concurrent movements against
/// the same product serialize on the row and the losing side observes zero
/// affected rows.
pub(crate) async fn apply_movement(
    txn: &DatabaseTransaction,
    input: RecordMovementInput,
) -> Result<stock_transactions::Model, StockLedgerError> {
    StockLedger::validate(input.movement).map_err(StockLedgerError::InvalidMovement)?;

    let delta = input.movement.delta();

    let update = products::Entity::update_many()
        .col_expr(
            products::Column::Quantity,
            Expr::col(products::Column::Quantity).add(delta),
        )
        .col_expr(
            products::Column::UpdatedAt,
            Expr::current_timestamp().into(),
        )
        .filter(products::Column::Id.eq(input.product_id))
        .filter(Expr::col(products::Column::Quantity).add(delta).gte(0))
        .exec(txn)
        .await?;

    if update.rows_affected == 0 {
        // Either the product is missing or the movement would go negative;
        // re-run the pure rule against the current level to find out which.
        let product = products::Entity::find_by_id(input.product_id)
            .one(txn)
            .await?
            .ok_or(StockLedgerError::ProductNotFound(input.product_id))?;

        return match StockLedger::apply(product.quantity, input.movement) {
            Err(StockError::InsufficientStock {
                available,
                requested,
            }) => Err(StockLedgerError::InsufficientStock {
                product: product.name,
                available,
                requested,
            }),
            Err(StockError::NegativeStock { current, delta }) => {
                Err(StockLedgerError::NegativeStock {
                    product: product.name,
                    current,
                    delta,
                })
            }
            Err(e) => Err(StockLedgerError::InvalidMovement(e)),
            Ok(_) => Err(StockLedgerError::Database(DbErr::Custom(
                "conditional stock update matched no rows for an applicable movement".to_owned(),
            ))),
        };
    }

    let row = stock_transactions::ActiveModel {
        id: Set(Uuid::new_v4()),
        product_id: Set(input.product_id),
        kind: Set(input.movement.kind.into()),
        quantity: Set(input.movement.quantity),
        notes: Set(input.notes),
        created_by: Set(input.created_by),
        occurred_at: Set(Utc::now().into()),
    };

    Ok(row.insert(txn).await?)
}

/// Stock ledger repository.
#[derive(Debug, Clone)]
pub struct StockRepository {
    db: DatabaseConnection,
}

impl StockRepository {
    /// Creates a new stock repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Records a manual stock movement in its own database transaction.
    ///
    /// # Errors
    ///
    /// Returns an error if the movement is malformed, the product does
    /// not exist, the resulting level would be negative, or the database
    /// operation fails.
    pub async fn record(
        &self,
        input: RecordMovementInput,
    ) -> Result<stock_transactions::Model, StockLedgerError> {
        let txn = self.db.begin().await?;
        let row = apply_movement(&txn, input).await?;
        txn.commit().await?;
        Ok(row)
    }

    /// Lists stock transactions with optional filters, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list(
        &self,
        filter: MovementFilter,
    ) -> Result<Vec<stock_transactions::Model>, StockLedgerError> {
        let mut query = stock_transactions::Entity::find();

        if let Some(product_id) = filter.product_id {
            query = query.filter(stock_transactions::Column::ProductId.eq(product_id));
        }

        if let Some(kind) = filter.kind {
            query = query.filter(stock_transactions::Column::Kind.eq(kind));
        }

        if let Some(from) = filter.occurred_from {
            query = query.filter(stock_transactions::Column::OccurredAt.gte(from));
        }

        if let Some(to) = filter.occurred_to {
            query = query.filter(stock_transactions::Column::OccurredAt.lte(to));
        }

        query = query.order_by_desc(stock_transactions::Column::OccurredAt);

        if let Some(limit) = filter.limit {
            query = query.limit(limit);
        }

        Ok(query.all(&self.db).await?)
    }
}
