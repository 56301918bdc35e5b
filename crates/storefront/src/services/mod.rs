//! Business logic services for the storefront.
//!
//! # Services
//!
//! - `auth` - Registration, login and password changes (argon2)
//! - `checkout` - Cart pricing and order placement
//! - `site_config` - Cached site configuration

pub mod auth;
pub mod checkout;
pub mod site_config;

pub use auth::{AuthError, AuthService};
pub use checkout::{CheckoutError, CheckoutService};
pub use site_config::ConfigService;
