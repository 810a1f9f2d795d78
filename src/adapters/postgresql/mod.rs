//! PostgreSQL database integration
//!
//! This module provides integration with PostgreSQL for storing medication
//! records. The schema lives in `migrations/001_initial_schema.sql` and is
//! applied by [`PostgreSQLClient::ensure_schema`].

pub mod adapter;
pub mod client;
pub mod models;

pub use adapter::PostgreSQLAdapter;
pub use client::PostgreSQLClient;
pub use models::PostgreSQLMedication;
