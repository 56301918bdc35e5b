//! Cart pricing and checkout.

use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::PgPool;
use thiserror::Error;

use voltio_core::cart::Cart;
use voltio_core::validation::FieldErrors;
use voltio_core::{OrderTotals, PricingRules, ProductId, line_total};

use crate::db::orders::OrderError;
use crate::db::settings::SettingsError;
use crate::db::{OrderRepository, ProductRepository, RepositoryError};
use crate::models::{CheckoutRequest, Order, Product, User};
use crate::services::site_config::ConfigService;

/// Errors from checkout.
#[derive(Debug, Error)]
pub enum CheckoutError {
    #[error("the store is in maintenance mode, orders are paused")]
    Maintenance,

    #[error("the cart is empty")]
    EmptyCart,

    #[error("invalid input: {0}")]
    Validation(FieldErrors),

    #[error("{name} is no longer available")]
    ProductUnavailable { product_id: ProductId, name: String },

    #[error("only {available} units of {name} left in stock")]
    InsufficientStock {
        product_id: ProductId,
        name: String,
        available: u32,
    },

    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),

    #[error("settings error: {0}")]
    Settings(#[from] SettingsError),
}

impl From<OrderError> for CheckoutError {
    fn from(err: OrderError) -> Self {
        match err {
            OrderError::EmptyCart => Self::EmptyCart,
            OrderError::ProductUnavailable { product_id, name } => {
                Self::ProductUnavailable { product_id, name }
            }
            OrderError::InsufficientStock {
                product_id,
                name,
                available,
            } => Self::InsufficientStock {
                product_id,
                name,
                available,
            },
            OrderError::Repository(e) => Self::Repository(e),
            // Placing an order never changes status
            OrderError::Transition(e) => {
                Self::Repository(RepositoryError::DataCorruption(e.to_string()))
            }
        }
    }
}

/// One priced cart line.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CartViewLine {
    pub product_id: ProductId,
    pub name: String,
    pub image_url: Option<String>,
    pub unit_price: Decimal,
    pub quantity: u32,
    pub line_total: Decimal,
    /// Units that can still be bought.
    pub available: u32,
    /// `false` when the product was hidden or stock dropped below the quantity.
    pub purchasable: bool,
}

/// The cart as shown to the shopper, priced with current data.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CartView {
    pub lines: Vec<CartViewLine>,
    pub item_count: u32,
    pub totals: OrderTotals,
    /// Whether every line can be checked out as-is.
    pub ready_for_checkout: bool,
}

/// Price a cart against current product rows.
///
/// Lines whose product no longer exists are dropped from `cart`.
pub fn price_cart(cart: &mut Cart, products: &[Product], rules: &PricingRules) -> CartView {
    cart.retain_products(|id| products.iter().any(|p| p.id == id));

    let lines: Vec<CartViewLine> = cart
        .lines()
        .iter()
        .filter_map(|line| {
            let product = products.iter().find(|p| p.id == line.product_id)?;
            let available = product.available_units();
            Some(CartViewLine {
                product_id: product.id,
                name: product.name.clone(),
                image_url: product.image_url.clone(),
                unit_price: product.price,
                quantity: line.quantity,
                line_total: line_total(product.price, line.quantity),
                available,
                purchasable: product.active && line.quantity <= available,
            })
        })
        .collect();

    let subtotal: Decimal = lines
        .iter()
        .filter(|l| l.purchasable)
        .map(|l| l.line_total)
        .sum();

    CartView {
        item_count: cart.item_count(),
        totals: OrderTotals::compute(subtotal, rules),
        ready_for_checkout: !lines.is_empty() && lines.iter().all(|l| l.purchasable),
        lines,
    }
}

/// Checkout service.
pub struct CheckoutService<'a> {
    pool: &'a PgPool,
    config: &'a ConfigService,
}

impl<'a> CheckoutService<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool, config: &'a ConfigService) -> Self {
        Self { pool, config }
    }

    /// Price the session cart, pruning products that were deleted.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError::Repository` or `CheckoutError::Settings` on
    /// database failures.
    pub async fn view(&self, cart: &mut Cart) -> Result<CartView, CheckoutError> {
        let ids: Vec<ProductId> = cart.lines().iter().map(|l| l.product_id).collect();
        let products = ProductRepository::new(self.pool).get_many(&ids).await?;
        let config = self.config.get(self.pool).await?;
        Ok(price_cart(cart, &products, &config.pricing_rules()))
    }

    /// Validate the form and place the order. The cart is left untouched;
    /// callers clear it once the order exists.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError::Maintenance` while orders are paused,
    /// `CheckoutError::EmptyCart`, `CheckoutError::Validation` for bad
    /// shipping fields, and stock errors when a line cannot be fulfilled.
    pub async fn place_order(
        &self,
        user: &User,
        cart: &Cart,
        form: CheckoutRequest,
    ) -> Result<Order, CheckoutError> {
        let config = self.config.get(self.pool).await?;
        if config.maintenance_mode {
            return Err(CheckoutError::Maintenance);
        }
        if cart.is_empty() {
            return Err(CheckoutError::EmptyCart);
        }

        let checkout = form
            .with_defaults(user)
            .validate()
            .map_err(CheckoutError::Validation)?;

        let order = OrderRepository::new(self.pool)
            .place(user.id, &checkout, cart.lines(), &config.pricing_rules())
            .await?;

        tracing::info!(
            order_id = %order.id,
            user_id = %user.id,
            total = %order.total,
            items = order.item_count(),
            "order placed"
        );
        Ok(order)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Utc;
    use voltio_core::Category;

    use super::*;

    fn product(id: i32, price: &str, stock: i32, active: bool) -> Product {
        Product {
            id: ProductId::new(id),
            name: format!("Modelo {id}"),
            description: String::new(),
            category: Category::Bicycle,
            price: price.parse().unwrap(),
            stock,
            autonomy_km: 60,
            top_speed_kmh: Some(25),
            battery_kwh: None,
            charge_time_hours: None,
            image_url: None,
            featured: false,
            active,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn rules() -> PricingRules {
        PricingRules {
            shipping_cost: "500".parse().unwrap(),
            free_shipping_threshold: "20000".parse().unwrap(),
            tax_rate: "0.16".parse().unwrap(),
        }
    }

    #[test]
    fn test_price_cart_totals() {
        let mut cart = Cart::new();
        cart.add(ProductId::new(1), 2, 10).unwrap();
        let view = price_cart(&mut cart, &[product(1, "1000.00", 10, true)], &rules());

        assert!(view.ready_for_checkout);
        assert_eq!(view.item_count, 2);
        assert_eq!(view.totals.subtotal, "2000.00".parse().unwrap());
        assert_eq!(view.totals.shipping, "500".parse().unwrap());
        assert_eq!(view.totals.tax, "320.00".parse().unwrap());
    }

    #[test]
    fn test_price_cart_drops_deleted_products() {
        let mut cart = Cart::new();
        cart.add(ProductId::new(1), 1, 10).unwrap();
        cart.add(ProductId::new(2), 1, 10).unwrap();
        let view = price_cart(&mut cart, &[product(2, "300.00", 3, true)], &rules());

        assert_eq!(view.lines.len(), 1);
        assert_eq!(cart.lines().len(), 1);
        assert_eq!(cart.quantity_of(ProductId::new(1)), 0);
    }

    #[test]
    fn test_price_cart_flags_unpurchasable_lines() {
        let mut cart = Cart::new();
        cart.add(ProductId::new(1), 3, 10).unwrap();
        cart.add(ProductId::new(2), 1, 10).unwrap();
        let products = [product(1, "100.00", 2, true), product(2, "50.00", 5, false)];
        let view = price_cart(&mut cart, &products, &rules());

        assert!(!view.ready_for_checkout);
        assert!(view.lines.iter().all(|l| !l.purchasable));
        assert_eq!(view.totals, OrderTotals::ZERO);
    }

    #[test]
    fn test_empty_cart_is_not_ready() {
        let mut cart = Cart::new();
        let view = price_cart(&mut cart, &[], &rules());
        assert!(!view.ready_for_checkout);
        assert_eq!(view.item_count, 0);
    }
}
