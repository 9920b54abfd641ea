//! Report repository for inventory and sales aggregations.
//!
//! Read-only queries; every range takes explicit start/end dates.

use std::collections::HashMap;

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ColumnTrait, DatabaseConnection, DbErr, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect,
};
use uuid::Uuid;

use crate::entities::{
    categories, invoice_items, invoices, products, receipts, stock_transactions, suppliers,
};

/// Error types for report operations.
#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    /// Invalid date range.
    #[error("Invalid date range: start {start} is after end {end}")]
    InvalidDateRange {
        /// Start date.
        start: NaiveDate,
        /// End date.
        end: NaiveDate,
    },

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

/// Sales and purchase totals over a date range.
#[derive(Debug, Clone)]
pub struct RangeSummary {
    /// Range start.
    pub start: NaiveDate,
    /// Range end.
    pub end: NaiveDate,
    /// Sum of invoice total amounts.
    pub invoice_total: Decimal,
    /// Sum of invoice sub-totals.
    pub invoice_sub_total: Decimal,
    /// Sum of invoice tax amounts.
    pub invoice_tax: Decimal,
    /// Sum of invoice discount amounts.
    pub invoice_discount: Decimal,
    /// Number of invoices in the range.
    pub invoice_count: u64,
    /// Sum of receipt totals.
    pub receipt_total: Decimal,
    /// Number of receipts in the range.
    pub receipt_count: u64,
}

/// One day's sales.
#[derive(Debug, Clone)]
pub struct DailySales {
    /// The day.
    pub date: NaiveDate,
    /// Sum of invoice total amounts for the day.
    pub total: Decimal,
    /// Number of invoices for the day.
    pub count: u64,
    /// The invoices themselves, newest first.
    pub invoices: Vec<invoices::Model>,
}

/// A product's sales over a range.
#[derive(Debug, Clone)]
pub struct TopProduct {
    /// Product ID.
    pub product_id: Uuid,
    /// Product name.
    pub name: String,
    /// Product SKU.
    pub sku: Option<String>,
    /// Units sold.
    pub quantity_sold: i64,
    /// Revenue at the sale prices actually charged.
    pub revenue: Decimal,
}

/// Profit contribution of one product over a range.
#[derive(Debug, Clone)]
pub struct ProfitLine {
    /// Product ID.
    pub product_id: Uuid,
    /// Product name.
    pub name: String,
    /// Units sold.
    pub quantity: i64,
    /// Revenue at the sale prices actually charged.
    pub revenue: Decimal,
    /// Cost at the product's current unit cost.
    pub cost: Decimal,
    /// `revenue - cost`.
    pub profit: Decimal,
}

/// Profit report over a range.
#[derive(Debug, Clone)]
pub struct ProfitReport {
    /// Range start.
    pub start: NaiveDate,
    /// Range end.
    pub end: NaiveDate,
    /// Per-product lines, highest profit first.
    pub lines: Vec<ProfitLine>,
    /// Total revenue.
    pub total_revenue: Decimal,
    /// Total cost.
    pub total_cost: Decimal,
    /// Total profit.
    pub total_profit: Decimal,
}

/// Dashboard snapshot.
#[derive(Debug, Clone)]
pub struct DashboardSummary {
    /// Number of products.
    pub product_count: u64,
    /// Number of suppliers.
    pub supplier_count: u64,
    /// Number of categories.
    pub category_count: u64,
    /// Number of products at or below their reorder level.
    pub low_stock_count: u64,
    /// Today's sales total.
    pub todays_sales_total: Decimal,
    /// Today's invoice count.
    pub todays_invoice_count: u64,
    /// Ten most recent stock transactions.
    pub recent_transactions: Vec<stock_transactions::Model>,
}

/// Report repository for aggregation queries.
#[derive(Debug, Clone)]
pub struct ReportRepository {
    db: DatabaseConnection,
}

impl ReportRepository {
    /// Creates a new report repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Sales and purchase totals for a date range.
    ///
    /// # Errors
    ///
    /// Returns an error if `end < start` or the database query fails.
    pub async fn range_summary(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<RangeSummary, ReportError> {
        check_range(start, end)?;

        let range_invoices = self.invoices_in_range(start, end).await?;
        let mut summary = RangeSummary {
            start,
            end,
            invoice_total: Decimal::ZERO,
            invoice_sub_total: Decimal::ZERO,
            invoice_tax: Decimal::ZERO,
            invoice_discount: Decimal::ZERO,
            invoice_count: u64::try_from(range_invoices.len()).unwrap_or(u64::MAX),
            receipt_total: Decimal::ZERO,
            receipt_count: 0,
        };

        for invoice in &range_invoices {
            summary.invoice_total += invoice.total_amount;
            summary.invoice_sub_total += invoice.sub_total;
            summary.invoice_tax += invoice.tax_amount;
            summary.invoice_discount += invoice.discount_amount;
        }

        let range_receipts = receipts::Entity::find()
            .filter(receipts::Column::PurchaseDate.gte(start))
            .filter(receipts::Column::PurchaseDate.lte(end))
            .all(&self.db)
            .await?;

        summary.receipt_count = u64::try_from(range_receipts.len()).unwrap_or(u64::MAX);
        for receipt in &range_receipts {
            summary.receipt_total += receipt.total_amount;
        }

        Ok(summary)
    }

    /// Sales for a single day.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn daily_sales(&self, date: NaiveDate) -> Result<DailySales, ReportError> {
        let day_invoices = invoices::Entity::find()
            .filter(invoices::Column::SaleDate.eq(date))
            .order_by_desc(invoices::Column::CreatedAt)
            .all(&self.db)
            .await?;

        let total = day_invoices
            .iter()
            .map(|invoice| invoice.total_amount)
            .sum();

        Ok(DailySales {
            date,
            total,
            count: u64::try_from(day_invoices.len()).unwrap_or(u64::MAX),
            invoices: day_invoices,
        })
    }

    /// Top selling products over a range, by units sold descending.
    ///
    /// # Errors
    ///
    /// Returns an error if `end < start` or the database query fails.
    pub async fn top_selling_products(
        &self,
        start: NaiveDate,
        end: NaiveDate,
        limit: usize,
    ) -> Result<Vec<TopProduct>, ReportError> {
        check_range(start, end)?;

        let mut aggregated: HashMap<Uuid, TopProduct> = HashMap::new();

        for (item, product) in self.sold_lines_in_range(start, end).await? {
            let entry = aggregated
                .entry(product.id)
                .or_insert_with(|| TopProduct {
                    product_id: product.id,
                    name: product.name.clone(),
                    sku: product.sku.clone(),
                    quantity_sold: 0,
                    revenue: Decimal::ZERO,
                });
            entry.quantity_sold += item.quantity;
            entry.revenue += Decimal::from(item.quantity) * item.unit_price;
        }

        let mut result: Vec<TopProduct> = aggregated.into_values().collect();
        result.sort_by(|a, b| b.quantity_sold.cmp(&a.quantity_sold));
        result.truncate(limit);

        Ok(result)
    }

    /// Profit over a range: revenue at the prices charged minus cost at
    /// each product's unit cost.
    ///
    /// # Errors
    ///
    /// Returns an error if `end < start` or the database query fails.
    pub async fn profit(&self, start: NaiveDate, end: NaiveDate) -> Result<ProfitReport, ReportError> {
        check_range(start, end)?;

        let mut aggregated: HashMap<Uuid, ProfitLine> = HashMap::new();

        for (item, product) in self.sold_lines_in_range(start, end).await? {
            let revenue = Decimal::from(item.quantity) * item.unit_price;
            let cost = Decimal::from(item.quantity) * product.unit_price;

            let entry = aggregated.entry(product.id).or_insert_with(|| ProfitLine {
                product_id: product.id,
                name: product.name.clone(),
                quantity: 0,
                revenue: Decimal::ZERO,
                cost: Decimal::ZERO,
                profit: Decimal::ZERO,
            });
            entry.quantity += item.quantity;
            entry.revenue += revenue;
            entry.cost += cost;
            entry.profit = entry.revenue - entry.cost;
        }

        let mut lines: Vec<ProfitLine> = aggregated.into_values().collect();
        lines.sort_by(|a, b| b.profit.cmp(&a.profit));

        let mut report = ProfitReport {
            start,
            end,
            total_revenue: Decimal::ZERO,
            total_cost: Decimal::ZERO,
            total_profit: Decimal::ZERO,
            lines,
        };
        for line in &report.lines {
            report.total_revenue += line.revenue;
            report.total_cost += line.cost;
        }
        report.total_profit = report.total_revenue - report.total_cost;

        Ok(report)
    }

    /// Products at or below their reorder level, lowest stock first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn low_stock_products(&self) -> Result<Vec<products::Model>, ReportError> {
        Ok(products::Entity::find()
            .filter(
                Expr::col(products::Column::Quantity).lte(Expr::col(products::Column::ReorderLevel)),
            )
            .order_by_asc(products::Column::Quantity)
            .all(&self.db)
            .await?)
    }

    /// Dashboard snapshot: entity counts, today's sales, and the most
    /// recent stock transactions.
    ///
    /// # Errors
    ///
    /// Returns an error if a database query fails.
    pub async fn dashboard(&self) -> Result<DashboardSummary, ReportError> {
        let product_count = products::Entity::find().count(&self.db).await?;
        let supplier_count = suppliers::Entity::find().count(&self.db).await?;
        let category_count = categories::Entity::find().count(&self.db).await?;

        let low_stock_count = products::Entity::find()
            .filter(
                Expr::col(products::Column::Quantity).lte(Expr::col(products::Column::ReorderLevel)),
            )
            .count(&self.db)
            .await?;

        let today = self.daily_sales(Utc::now().date_naive()).await?;

        let recent_transactions = stock_transactions::Entity::find()
            .order_by_desc(stock_transactions::Column::OccurredAt)
            .limit(10)
            .all(&self.db)
            .await?;

        Ok(DashboardSummary {
            product_count,
            supplier_count,
            category_count,
            low_stock_count,
            todays_sales_total: today.total,
            todays_invoice_count: today.count,
            recent_transactions,
        })
    }

    /// Invoices whose sale date falls in the range.
    async fn invoices_in_range(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<invoices::Model>, DbErr> {
        invoices::Entity::find()
            .filter(invoices::Column::SaleDate.gte(start))
            .filter(invoices::Column::SaleDate.lte(end))
            .all(&self.db)
            .await
    }

    /// Invoice lines in the range, paired with their products.
    async fn sold_lines_in_range(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<(invoice_items::Model, products::Model)>, DbErr> {
        let ids: Vec<Uuid> = self
            .invoices_in_range(start, end)
            .await?
            .into_iter()
            .map(|invoice| invoice.id)
            .collect();

        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let lines = invoice_items::Entity::find()
            .filter(invoice_items::Column::InvoiceId.is_in(ids))
            .find_also_related(products::Entity)
            .all(&self.db)
            .await?;

        // Lines keep their products alive (RESTRICT), so the pair is
        // always present.
        Ok(lines
            .into_iter()
            .filter_map(|(item, product)| product.map(|p| (item, p)))
            .collect())
    }
}

/// Rejects inverted date ranges.
fn check_range(start: NaiveDate, end: NaiveDate) -> Result<(), ReportError> {
    if end < start {
        return Err(ReportError::InvalidDateRange { start, end });
    }
    Ok(())
}
