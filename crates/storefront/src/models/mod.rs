//! Domain models for the storefront.
//!
//! Request payloads that need validation live next to the model they create
//! or update, each with a `validate()` that returns every field error at once.

pub mod faq;
pub mod order;
pub mod product;
pub mod session;
pub mod site_config;
pub mod ticket;
pub mod user;

pub use faq::{Faq, FaqInput};
pub use order::{CheckoutRequest, Order, OrderItem, ShippingAddress};
pub use product::{Product, ProductInput};
pub use session::{CurrentUser, keys as session_keys};
pub use site_config::{PublicSiteConfig, SiteConfig};
pub use ticket::{NewTicket, SupportTicket};
pub use user::{ProfileUpdate, User};
