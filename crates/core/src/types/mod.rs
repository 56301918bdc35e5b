//! Core types for Voltio.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod category;
pub mod email;
pub mod id;
pub mod price;
pub mod status;

pub use category::Category;
pub use email::{Email, EmailError};
pub use id::*;
pub use price::{OrderTotals, PricingRules, format_money, line_total, round_money};
pub use status::*;
