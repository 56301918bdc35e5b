//! Shopping cart kept in the visitor's session.
//!
//! The cart only stores product IDs and quantities. Prices, names and stock
//! are looked up fresh whenever the cart is displayed or checked out, so a
//! price change in the back-office is reflected immediately.

use serde::{Deserialize, Serialize};

use crate::types::ProductId;

/// Maximum units of a single product per cart line.
pub const MAX_LINE_QUANTITY: u32 = 99;

/// Maximum distinct products in a cart.
pub const MAX_LINES: usize = 50;

/// Errors from cart mutations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CartError {
    #[error("quantity must be at least 1")]
    ZeroQuantity,
    #[error("at most {MAX_LINE_QUANTITY} units per product")]
    LineLimit,
    #[error("cart cannot hold more than {MAX_LINES} products")]
    TooManyLines,
    #[error("only {available} units in stock")]
    InsufficientStock { available: u32 },
    #[error("product is not in the cart")]
    NotInCart,
}

/// One product in the cart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    pub product_id: ProductId,
    pub quantity: u32,
}

/// A session cart.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cart {
    lines: Vec<CartLine>,
}

impl Cart {
    #[must_use]
    pub const fn new() -> Self {
        Self { lines: Vec::new() }
    }

    #[must_use]
    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Total units across all lines.
    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.lines.iter().map(|l| l.quantity).sum()
    }

    #[must_use]
    pub fn quantity_of(&self, product_id: ProductId) -> u32 {
        self.lines
            .iter()
            .find(|l| l.product_id == product_id)
            .map_or(0, |l| l.quantity)
    }

    /// Add `quantity` units, merging with an existing line.
    ///
    /// `stock` is the number of units currently available.
    ///
    /// # Errors
    ///
    /// Returns a [`CartError`] if the resulting quantity is zero, exceeds the
    /// per-line limit or stock, or the cart is full.
    pub fn add(&mut self, product_id: ProductId, quantity: u32, stock: u32) -> Result<u32, CartError> {
        if quantity == 0 {
            return Err(CartError::ZeroQuantity);
        }

        let current = self.quantity_of(product_id);
        let wanted = current.saturating_add(quantity);
        check_quantity(wanted, stock)?;

        if let Some(line) = self.lines.iter_mut().find(|l| l.product_id == product_id) {
            line.quantity = wanted;
        } else {
            if self.lines.len() >= MAX_LINES {
                return Err(CartError::TooManyLines);
            }
            self.lines.push(CartLine {
                product_id,
                quantity: wanted,
            });
        }
        Ok(wanted)
    }

    /// Replace the quantity of a line. Zero removes it.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::NotInCart`] if the product has no line, or a
    /// limit error if `quantity` is too large.
    pub fn set_quantity(
        &mut self,
        product_id: ProductId,
        quantity: u32,
        stock: u32,
    ) -> Result<(), CartError> {
        if quantity == 0 {
            return self.remove(product_id);
        }
        check_quantity(quantity, stock)?;

        let line = self
            .lines
            .iter_mut()
            .find(|l| l.product_id == product_id)
            .ok_or(CartError::NotInCart)?;
        line.quantity = quantity;
        Ok(())
    }

    /// Remove a line.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::NotInCart`] if the product has no line.
    pub fn remove(&mut self, product_id: ProductId) -> Result<(), CartError> {
        let before = self.lines.len();
        self.lines.retain(|l| l.product_id != product_id);
        if self.lines.len() == before {
            Err(CartError::NotInCart)
        } else {
            Ok(())
        }
    }

    /// Drop lines whose product no longer exists or is unavailable.
    pub fn retain_products(&mut self, keep: impl Fn(ProductId) -> bool) {
        self.lines.retain(|l| keep(l.product_id));
    }

    pub fn clear(&mut self) {
        self.lines.clear();
    }
}

fn check_quantity(quantity: u32, stock: u32) -> Result<(), CartError> {
    if quantity > MAX_LINE_QUANTITY {
        return Err(CartError::LineLimit);
    }
    if quantity > stock {
        return Err(CartError::InsufficientStock { available: stock });
    }
    Ok(())
}
