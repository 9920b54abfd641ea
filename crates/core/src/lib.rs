//! Core business logic for Stockroom.
//!
//! This crate contains pure business logic with ZERO web or database dependencies.
//! All domain types, validation rules, and calculations live here.
//!
//! # Modules
//!
//! - `stock` - Stock ledger rules: movements, deltas, and non-negativity
//! - `totals` - Derived monetary totals for receipts and invoices

pub mod stock;
pub mod totals;
