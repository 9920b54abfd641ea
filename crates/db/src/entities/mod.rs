//! `SeaORM` entity definitions for the inventory schema.

pub mod categories;
pub mod invoice_items;
pub mod invoices;
pub mod products;
pub mod receipt_items;
pub mod receipts;
pub mod sea_orm_active_enums;
pub mod stock_transactions;
pub mod suppliers;
pub mod users;
