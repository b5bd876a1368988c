//! Shared types and configuration for Tutorpay.
//!
//! This crate provides common types used across all other crates:
//! - Money types with decimal precision
//! - Typed IDs for type-safe entity references
//! - Wallet owner identity types
//! - Pagination types for list queries
//! - Configuration management

pub mod config;
pub mod types;

pub use config::AppConfig;
