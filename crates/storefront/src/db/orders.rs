//! Order repository.
//!
//! Placing an order and changing its status both run in a single transaction
//! that locks the affected product rows, so stock never goes negative and a
//! cancelled order returns its units exactly once.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{PgConnection, PgPool, Postgres, QueryBuilder};
use thiserror::Error;

use voltio_core::cart::CartLine;
use voltio_core::catalog::{Page, Pagination, like_pattern};
use voltio_core::{
    OrderId, OrderStatus, OrderTotals, PaymentMethod, PricingRules, ProductId, TransitionError,
    UserId, line_total,
};

use super::RepositoryError;
use crate::models::order::ValidCheckout;
use crate::models::{Order, OrderItem, Product, ShippingAddress};

const ORDER_COLUMNS: &str = "id, user_id, status, shipping_name, shipping_phone, shipping_street, \
                             shipping_city, shipping_postal_code, payment_method, notes, \
                             subtotal, shipping_cost, tax, total, created_at, updated_at";

const ITEM_COLUMNS: &str = "id, order_id, product_id, product_name, unit_price, quantity, line_total";

/// Errors from placing or updating orders.
#[derive(Debug, Error)]
pub enum OrderError {
    #[error(transparent)]
    Repository(#[from] RepositoryError),

    #[error("the cart is empty")]
    EmptyCart,

    #[error("{name} is no longer available")]
    ProductUnavailable { product_id: ProductId, name: String },

    #[error("only {available} units of {name} left in stock")]
    InsufficientStock {
        product_id: ProductId,
        name: String,
        available: u32,
    },

    #[error(transparent)]
    Transition(#[from] TransitionError),
}

impl From<sqlx::Error> for OrderError {
    fn from(err: sqlx::Error) -> Self {
        Self::Repository(RepositoryError::Database(err))
    }
}

#[derive(sqlx::FromRow)]
struct OrderRow {
    id: OrderId,
    user_id: UserId,
    status: OrderStatus,
    shipping_name: String,
    shipping_phone: String,
    shipping_street: String,
    shipping_city: String,
    shipping_postal_code: String,
    payment_method: PaymentMethod,
    notes: Option<String>,
    subtotal: Decimal,
    shipping_cost: Decimal,
    tax: Decimal,
    total: Decimal,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl OrderRow {
    fn into_order(self, items: Vec<OrderItem>) -> Order {
        Order {
            id: self.id,
            user_id: self.user_id,
            status: self.status,
            shipping: ShippingAddress {
                name: self.shipping_name,
                phone: self.shipping_phone,
                street: self.shipping_street,
                city: self.shipping_city,
                postal_code: self.shipping_postal_code,
            },
            payment_method: self.payment_method,
            notes: self.notes,
            subtotal: self.subtotal,
            shipping_cost: self.shipping_cost,
            tax: self.tax,
            total: self.total,
            items,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// A cart line priced against a locked product row.
#[derive(Debug, Clone, PartialEq)]
struct PricedLine {
    product_id: ProductId,
    product_name: String,
    unit_price: Decimal,
    quantity: u32,
    line_total: Decimal,
}

/// Admin order listing filters.
#[derive(Debug, Clone, Default)]
pub struct OrderFilter {
    pub status: Option<OrderStatus>,
    /// Matches the recipient name or the customer's email.
    pub search: Option<String>,
    pub user_id: Option<UserId>,
}

/// Order counts and revenue for the dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, sqlx::FromRow)]
pub struct OrderStats {
    pub total: i64,
    pub pending: i64,
    pub processing: i64,
    pub delivered: i64,
    pub cancelled: i64,
    /// Sum of totals for orders that were not cancelled.
    pub revenue: Decimal,
}

/// Repository for order database operations.
pub struct OrderRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> OrderRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Turn cart lines into an order, decrementing stock.
    ///
    /// Prices come from the locked product rows, not from the client.
    ///
    /// # Errors
    ///
    /// Returns `OrderError::EmptyCart` for an empty cart,
    /// `OrderError::ProductUnavailable` or `OrderError::InsufficientStock` when
    /// a line cannot be fulfilled, and `OrderError::Repository` on database errors.
    pub async fn place(
        &self,
        user_id: UserId,
        checkout: &ValidCheckout,
        lines: &[CartLine],
        rules: &PricingRules,
    ) -> Result<Order, OrderError> {
        if lines.is_empty() {
            return Err(OrderError::EmptyCart);
        }

        let mut tx = self.pool.begin().await?;

        let ids: Vec<i32> = lines.iter().map(|l| l.product_id.as_i32()).collect();
        let products = sqlx::query_as::<_, Product>(
            "SELECT id, name, description, category, price, stock, autonomy_km, top_speed_kmh,
                    battery_kwh, charge_time_hours, image_url, featured, active,
                    created_at, updated_at
             FROM shop.product WHERE id = ANY($1)
             ORDER BY id
             FOR UPDATE",
        )
        .bind(&ids)
        .fetch_all(&mut *tx)
        .await?;

        let priced = price_lines(lines, &products)?;
        let subtotal: Decimal = priced.iter().map(|l| l.line_total).sum();
        let totals = OrderTotals::compute(subtotal, rules);

        let row = sqlx::query_as::<_, OrderRow>(&format!(
            "INSERT INTO shop.order
                 (user_id, shipping_name, shipping_phone, shipping_street, shipping_city,
                  shipping_postal_code, payment_method, notes, subtotal, shipping_cost, tax, total)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
             RETURNING {ORDER_COLUMNS}"
        ))
        .bind(user_id)
        .bind(&checkout.shipping.name)
        .bind(&checkout.shipping.phone)
        .bind(&checkout.shipping.street)
        .bind(&checkout.shipping.city)
        .bind(&checkout.shipping.postal_code)
        .bind(checkout.payment_method)
        .bind(&checkout.notes)
        .bind(totals.subtotal)
        .bind(totals.shipping)
        .bind(totals.tax)
        .bind(totals.total)
        .fetch_one(&mut *tx)
        .await?;

        let mut items = Vec::with_capacity(priced.len());
        for line in &priced {
            let quantity = to_db_quantity(line.quantity)?;
            let item = sqlx::query_as::<_, OrderItem>(&format!(
                "INSERT INTO shop.order_item
                     (order_id, product_id, product_name, unit_price, quantity, line_total)
                 VALUES ($1, $2, $3, $4, $5, $6)
                 RETURNING {ITEM_COLUMNS}"
            ))
            .bind(row.id)
            .bind(line.product_id)
            .bind(&line.product_name)
            .bind(line.unit_price)
            .bind(quantity)
            .bind(line.line_total)
            .fetch_one(&mut *tx)
            .await?;

            sqlx::query(
                "UPDATE shop.product SET stock = stock - $2, updated_at = NOW() WHERE id = $1",
            )
            .bind(line.product_id)
            .bind(quantity)
            .execute(&mut *tx)
            .await?;

            items.push(item);
        }

        tx.commit().await?;
        Ok(row.into_order(items))
    }

    /// Get an order with its items.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: OrderId) -> Result<Option<Order>, RepositoryError> {
        let mut conn = self.pool.acquire().await?;
        let Some(row) = fetch_row(&mut conn, id, false).await? else {
            return Ok(None);
        };
        let items = fetch_items(&mut conn, &[row.id]).await?;
        Ok(Some(row.into_order(items)))
    }

    /// Get an order only if it belongs to `user_id`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_for_user(
        &self,
        id: OrderId,
        user_id: UserId,
    ) -> Result<Option<Order>, RepositoryError> {
        Ok(self.get(id).await?.filter(|o| o.user_id == user_id))
    }

    /// List orders, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(
        &self,
        filter: &OrderFilter,
        pagination: Pagination,
    ) -> Result<Page<Order>, RepositoryError> {
        let mut count = QueryBuilder::<Postgres>::new(
            "SELECT COUNT(*) FROM shop.order o JOIN shop.user u ON u.id = o.user_id WHERE TRUE",
        );
        push_filters(&mut count, filter);
        let total = count
            .build_query_scalar::<i64>()
            .fetch_one(self.pool)
            .await?;

        let columns = ORDER_COLUMNS
            .split(", ")
            .map(|c| format!("o.{}", c.trim()))
            .collect::<Vec<_>>()
            .join(", ");
        let mut select = QueryBuilder::<Postgres>::new(format!(
            "SELECT {columns} FROM shop.order o JOIN shop.user u ON u.id = o.user_id WHERE TRUE"
        ));
        push_filters(&mut select, filter);
        select
            .push(" ORDER BY o.created_at DESC, o.id DESC LIMIT ")
            .push_bind(pagination.limit())
            .push(" OFFSET ")
            .push_bind(pagination.offset());

        let rows = select
            .build_query_as::<OrderRow>()
            .fetch_all(self.pool)
            .await?;

        let mut conn = self.pool.acquire().await?;
        let ids: Vec<OrderId> = rows.iter().map(|r| r.id).collect();
        let mut items_by_order: HashMap<OrderId, Vec<OrderItem>> = HashMap::new();
        for item in fetch_items(&mut conn, &ids).await? {
            items_by_order.entry(item.order_id).or_default().push(item);
        }

        let orders = rows
            .into_iter()
            .map(|row| {
                let items = items_by_order.remove(&row.id).unwrap_or_default();
                row.into_order(items)
            })
            .collect();

        Ok(Page::new(orders, total, pagination))
    }

    /// Move an order to `next`, restocking its items when it is cancelled.
    ///
    /// # Errors
    ///
    /// Returns `OrderError::Transition` for an illegal status change and
    /// `RepositoryError::NotFound` if the order does not exist.
    pub async fn update_status(&self, id: OrderId, next: OrderStatus) -> Result<Order, OrderError> {
        self.change_status(id, None, next).await
    }

    /// Cancel a customer's own order while it is still pending.
    ///
    /// # Errors
    ///
    /// Returns `OrderError::Transition` once the order has left `pendiente`,
    /// and `RepositoryError::NotFound` if the order is missing or not theirs.
    pub async fn cancel_for_user(&self, id: OrderId, user_id: UserId) -> Result<Order, OrderError> {
        self.change_status(id, Some(user_id), OrderStatus::Cancelled)
            .await
    }

    async fn change_status(
        &self,
        id: OrderId,
        owner: Option<UserId>,
        next: OrderStatus,
    ) -> Result<Order, OrderError> {
        let mut tx = self.pool.begin().await?;

        let row = fetch_row(&mut tx, id, true)
            .await?
            .filter(|r| owner.is_none_or(|user_id| r.user_id == user_id))
            .ok_or(RepositoryError::NotFound)?;

        if owner.is_some() && !row.status.is_customer_cancellable() {
            return Err(TransitionError {
                from: row.status.as_str(),
                to: next.as_str(),
            }
            .into());
        }
        let status = row.status.transition(next)?;

        let items = fetch_items(&mut tx, &[id]).await?;
        if status == OrderStatus::Cancelled {
            for item in &items {
                sqlx::query(
                    "UPDATE shop.product SET stock = stock + $2, updated_at = NOW() WHERE id = $1",
                )
                .bind(item.product_id)
                .bind(item.quantity)
                .execute(&mut *tx)
                .await?;
            }
        }

        let row = sqlx::query_as::<_, OrderRow>(&format!(
            "UPDATE shop.order SET status = $2, updated_at = NOW()
             WHERE id = $1
             RETURNING {ORDER_COLUMNS}"
        ))
        .bind(id)
        .bind(status)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(row.into_order(items))
    }

    /// Order counts by status and revenue.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn stats(&self) -> Result<OrderStats, RepositoryError> {
        let stats = sqlx::query_as::<_, OrderStats>(
            "SELECT COUNT(*) AS total,
                    COUNT(*) FILTER (WHERE status = 'pendiente') AS pending,
                    COUNT(*) FILTER (WHERE status = 'en_proceso') AS processing,
                    COUNT(*) FILTER (WHERE status = 'entregado') AS delivered,
                    COUNT(*) FILTER (WHERE status = 'cancelado') AS cancelled,
                    COALESCE(SUM(total) FILTER (WHERE status <> 'cancelado'), 0) AS revenue
             FROM shop.order",
        )
        .fetch_one(self.pool)
        .await?;

        Ok(stats)
    }
}

async fn fetch_row(
    conn: &mut PgConnection,
    id: OrderId,
    for_update: bool,
) -> Result<Option<OrderRow>, sqlx::Error> {
    let lock = if for_update { " FOR UPDATE" } else { "" };
    sqlx::query_as::<_, OrderRow>(&format!(
        "SELECT {ORDER_COLUMNS} FROM shop.order WHERE id = $1{lock}"
    ))
    .bind(id)
    .fetch_optional(conn)
    .await
}

async fn fetch_items(
    conn: &mut PgConnection,
    order_ids: &[OrderId],
) -> Result<Vec<OrderItem>, sqlx::Error> {
    if order_ids.is_empty() {
        return Ok(Vec::new());
    }
    let ids: Vec<i32> = order_ids.iter().map(OrderId::as_i32).collect();
    sqlx::query_as::<_, OrderItem>(&format!(
        "SELECT {ITEM_COLUMNS} FROM shop.order_item WHERE order_id = ANY($1) ORDER BY id"
    ))
    .bind(ids)
    .fetch_all(conn)
    .await
}

fn push_filters(builder: &mut QueryBuilder<'_, Postgres>, filter: &OrderFilter) {
    if let Some(status) = filter.status {
        builder.push(" AND o.status = ").push_bind(status);
    }
    if let Some(user_id) = filter.user_id {
        builder.push(" AND o.user_id = ").push_bind(user_id);
    }
    if let Some(search) = filter.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        let pattern = like_pattern(search);
        builder
            .push(" AND (o.shipping_name ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR u.email ILIKE ")
            .push_bind(pattern)
            .push(")");
    }
}

/// Check every line against its product and snapshot name and price.
fn price_lines(lines: &[CartLine], products: &[Product]) -> Result<Vec<PricedLine>, OrderError> {
    lines
        .iter()
        .map(|line| {
            let Some(product) = products.iter().find(|p| p.id == line.product_id) else {
                return Err(OrderError::ProductUnavailable {
                    product_id: line.product_id,
                    name: format!("product {}", line.product_id),
                });
            };
            if !product.active {
                return Err(OrderError::ProductUnavailable {
                    product_id: product.id,
                    name: product.name.clone(),
                });
            }
            let available = product.available_units();
            if line.quantity > available {
                return Err(OrderError::InsufficientStock {
                    product_id: product.id,
                    name: product.name.clone(),
                    available,
                });
            }
            Ok(PricedLine {
                product_id: product.id,
                product_name: product.name.clone(),
                unit_price: product.price,
                quantity: line.quantity,
                line_total: line_total(product.price, line.quantity),
            })
        })
        .collect()
}

fn to_db_quantity(quantity: u32) -> Result<i32, RepositoryError> {
    i32::try_from(quantity)
        .map_err(|_| RepositoryError::DataCorruption(format!("quantity {quantity} out of range")))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use voltio_core::Category;

    use super::*;

    fn product(id: i32, price: &str, stock: i32, active: bool) -> Product {
        Product {
            id: ProductId::new(id),
            name: format!("Modelo {id}"),
            description: String::new(),
            category: Category::Scooter,
            price: price.parse().unwrap(),
            stock,
            autonomy_km: 40,
            top_speed_kmh: None,
            battery_kwh: None,
            charge_time_hours: None,
            image_url: None,
            featured: false,
            active,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn line(id: i32, quantity: u32) -> CartLine {
        CartLine {
            product_id: ProductId::new(id),
            quantity,
        }
    }

    #[test]
    fn test_price_lines_snapshots_price() {
        let products = [product(1, "18999.50", 4, true), product(2, "1200.00", 10, true)];
        let priced = price_lines(&[line(1, 2), line(2, 1)], &products).unwrap();
        assert_eq!(priced.len(), 2);
        assert_eq!(priced[0].line_total, "37999.00".parse().unwrap());
        assert_eq!(priced[1].product_name, "Modelo 2");
    }

    #[test]
    fn test_price_lines_rejects_short_stock() {
        let products = [product(1, "100.00", 1, true)];
        let err = price_lines(&[line(1, 3)], &products).unwrap_err();
        assert!(matches!(err, OrderError::InsufficientStock { available: 1, .. }));
    }

    #[test]
    fn test_price_lines_rejects_inactive_and_missing() {
        let products = [product(1, "100.00", 5, false)];
        assert!(matches!(
            price_lines(&[line(1, 1)], &products).unwrap_err(),
            OrderError::ProductUnavailable { .. }
        ));
        assert!(matches!(
            price_lines(&[line(9, 1)], &products).unwrap_err(),
            OrderError::ProductUnavailable { .. }
        ));
    }

    #[test]
    fn test_order_filters() {
        let mut builder = QueryBuilder::<Postgres>::new("SELECT 1 WHERE TRUE");
        push_filters(
            &mut builder,
            &OrderFilter {
                status: Some(OrderStatus::Pending),
                search: Some("luis".to_owned()),
                user_id: None,
            },
        );
        assert_eq!(
            builder.sql(),
            "SELECT 1 WHERE TRUE AND o.status = $1 AND (o.shipping_name ILIKE $2 OR u.email ILIKE $3)"
        );
    }
}
