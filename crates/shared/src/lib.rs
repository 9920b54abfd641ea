//! Shared configuration for Stockroom.
//!
//! Layered configuration (files plus `STOCKROOM__` environment
//! variables) used by the database layer and the server binary.

pub mod config;

pub use config::AppConfig;
