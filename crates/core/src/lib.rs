//! Voltio Core - Shared domain types.
//!
//! This crate provides the domain vocabulary used by every Voltio component:
//! - `storefront` - The HTTP API for the catalog, cart, checkout and back-office
//! - `cli` - Command-line tools for migrations, seeding and account management
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no database
//! access, no HTTP. Enums gain `sqlx` mappings behind the `postgres` feature.
//!
//! # Modules
//!
//! - [`types`] - Typed IDs, email, statuses, categories and money arithmetic
//! - [`validation`] - Form field checks that collect per-field errors
//! - [`cart`] - Session cart mutations with stock and size limits
//! - [`catalog`] - Catalog filters, sort order and pagination

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
pub mod catalog;
pub mod types;
pub mod validation;

pub use types::*;
