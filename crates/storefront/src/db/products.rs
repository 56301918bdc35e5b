//! Product repository: the public catalog and admin product management.

use sqlx::{PgPool, Postgres, QueryBuilder};

use voltio_core::catalog::{CatalogQuery, Page, Pagination, Sort, like_pattern};
use voltio_core::{Category, ProductId};

use super::{RepositoryError, conflict_on_unique};
use crate::models::{Product, ProductInput};

const PRODUCT_COLUMNS: &str = "id, name, description, category, price, stock, autonomy_km, \
                               top_speed_kmh, battery_kwh, charge_time_hours, image_url, \
                               featured, active, created_at, updated_at";

/// Admin product listing filters.
#[derive(Debug, Clone, Default)]
pub struct ProductFilter {
    pub search: Option<String>,
    pub category: Option<Category>,
    pub active: Option<bool>,
}

/// Active product count for one category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, sqlx::FromRow)]
pub struct CategoryCount {
    pub category: Category,
    pub count: i64,
}

/// Outcome of an admin delete request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductRemoval {
    Deleted,
    /// Orders reference the product, so it was hidden instead.
    Deactivated,
}

/// Repository for product database operations.
pub struct ProductRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ProductRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Search the public catalog. Only active products are returned.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn catalog(&self, query: &CatalogQuery) -> Result<Page<Product>, RepositoryError> {
        let pagination = query.pagination();

        let mut count =
            QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM shop.product WHERE active");
        push_catalog_filters(&mut count, query);
        let total = count
            .build_query_scalar::<i64>()
            .fetch_one(self.pool)
            .await?;

        let mut select = QueryBuilder::<Postgres>::new(format!(
            "SELECT {PRODUCT_COLUMNS} FROM shop.product WHERE active"
        ));
        push_catalog_filters(&mut select, query);
        select
            .push(order_by(query.sort))
            .push(" LIMIT ")
            .push_bind(pagination.limit())
            .push(" OFFSET ")
            .push_bind(pagination.offset());

        let items = select
            .build_query_as::<Product>()
            .fetch_all(self.pool)
            .await?;

        Ok(Page::new(items, total, pagination))
    }

    /// List products for the admin panel, including inactive ones.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(
        &self,
        filter: &ProductFilter,
        pagination: Pagination,
    ) -> Result<Page<Product>, RepositoryError> {
        let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM shop.product WHERE TRUE");
        push_admin_filters(&mut count, filter);
        let total = count
            .build_query_scalar::<i64>()
            .fetch_one(self.pool)
            .await?;

        let mut select = QueryBuilder::<Postgres>::new(format!(
            "SELECT {PRODUCT_COLUMNS} FROM shop.product WHERE TRUE"
        ));
        push_admin_filters(&mut select, filter);
        select
            .push(" ORDER BY created_at DESC, id DESC LIMIT ")
            .push_bind(pagination.limit())
            .push(" OFFSET ")
            .push_bind(pagination.offset());

        let items = select
            .build_query_as::<Product>()
            .fetch_all(self.pool)
            .await?;

        Ok(Page::new(items, total, pagination))
    }

    /// Get any product by ID, active or not.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let product = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM shop.product WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(product)
    }

    /// Get a product visible in the public catalog.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_active(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        Ok(self.get(id).await?.filter(|p| p.active))
    }

    /// Fetch several products at once, in no particular order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_many(&self, ids: &[ProductId]) -> Result<Vec<Product>, RepositoryError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let ids: Vec<i32> = ids.iter().map(ProductId::as_i32).collect();

        let products = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM shop.product WHERE id = ANY($1)"
        ))
        .bind(ids)
        .fetch_all(self.pool)
        .await?;

        Ok(products)
    }

    /// Insert a validated product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the name is already taken.
    pub async fn create(&self, input: &ProductInput) -> Result<Product, RepositoryError> {
        let product = sqlx::query_as::<_, Product>(&format!(
            "INSERT INTO shop.product
                 (name, description, category, price, stock, autonomy_km, top_speed_kmh,
                  battery_kwh, charge_time_hours, image_url, featured, active)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
             RETURNING {PRODUCT_COLUMNS}"
        ))
        .bind(&input.name)
        .bind(&input.description)
        .bind(input.category)
        .bind(input.price)
        .bind(input.stock)
        .bind(input.autonomy_km)
        .bind(input.top_speed_kmh)
        .bind(input.battery_kwh)
        .bind(input.charge_time_hours)
        .bind(&input.image_url)
        .bind(input.featured)
        .bind(input.active)
        .fetch_one(self.pool)
        .await
        .map_err(|e| conflict_on_unique(e, "a product with this name already exists"))?;

        Ok(product)
    }

    /// Replace every editable field of a product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product does not exist.
    /// Returns `RepositoryError::Conflict` if the new name is already taken.
    pub async fn update(
        &self,
        id: ProductId,
        input: &ProductInput,
    ) -> Result<Product, RepositoryError> {
        let product = sqlx::query_as::<_, Product>(&format!(
            "UPDATE shop.product
             SET name = $2, description = $3, category = $4, price = $5, stock = $6,
                 autonomy_km = $7, top_speed_kmh = $8, battery_kwh = $9,
                 charge_time_hours = $10, image_url = $11, featured = $12, active = $13,
                 updated_at = NOW()
             WHERE id = $1
             RETURNING {PRODUCT_COLUMNS}"
        ))
        .bind(id)
        .bind(&input.name)
        .bind(&input.description)
        .bind(input.category)
        .bind(input.price)
        .bind(input.stock)
        .bind(input.autonomy_km)
        .bind(input.top_speed_kmh)
        .bind(input.battery_kwh)
        .bind(input.charge_time_hours)
        .bind(&input.image_url)
        .bind(input.featured)
        .bind(input.active)
        .fetch_optional(self.pool)
        .await
        .map_err(|e| conflict_on_unique(e, "a product with this name already exists"))?;

        product.ok_or(RepositoryError::NotFound)
    }

    /// Insert or update a product matched case-insensitively by name.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn upsert_by_name(&self, input: &ProductInput) -> Result<Product, RepositoryError> {
        let existing = sqlx::query_scalar::<_, ProductId>(
            "SELECT id FROM shop.product WHERE LOWER(name) = LOWER($1)",
        )
        .bind(&input.name)
        .fetch_optional(self.pool)
        .await?;

        match existing {
            Some(id) => self.update(id, input).await,
            None => self.create(input).await,
        }
    }

    /// Delete a product, or hide it when orders reference it.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product does not exist.
    pub async fn delete_or_deactivate(
        &self,
        id: ProductId,
    ) -> Result<ProductRemoval, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let referenced = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM shop.order_item WHERE product_id = $1)",
        )
        .bind(id)
        .fetch_one(&mut *tx)
        .await?;

        let (sql, removal) = if referenced {
            (
                "UPDATE shop.product SET active = FALSE, featured = FALSE, updated_at = NOW() \
                 WHERE id = $1",
                ProductRemoval::Deactivated,
            )
        } else {
            ("DELETE FROM shop.product WHERE id = $1", ProductRemoval::Deleted)
        };

        let result = sqlx::query(sql).bind(id).execute(&mut *tx).await?;
        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        tx.commit().await?;
        Ok(removal)
    }

    /// Active product counts for every category, including empty ones.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn category_counts(&self) -> Result<Vec<CategoryCount>, RepositoryError> {
        let found = sqlx::query_as::<_, CategoryCount>(
            "SELECT category, COUNT(*) AS count FROM shop.product
             WHERE active GROUP BY category",
        )
        .fetch_all(self.pool)
        .await?;

        Ok(Category::ALL
            .iter()
            .map(|&category| CategoryCount {
                category,
                count: found
                    .iter()
                    .find(|c| c.category == category)
                    .map_or(0, |c| c.count),
            })
            .collect())
    }

    /// Active products at or below `threshold` units, lowest stock first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn low_stock(&self, threshold: i32, limit: i64) -> Result<Vec<Product>, RepositoryError> {
        let products = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM shop.product
             WHERE active AND stock <= $1
             ORDER BY stock, name
             LIMIT $2"
        ))
        .bind(threshold)
        .bind(limit)
        .fetch_all(self.pool)
        .await?;

        Ok(products)
    }

    /// Number of active products.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn count_active(&self) -> Result<i64, RepositoryError> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM shop.product WHERE active")
            .fetch_one(self.pool)
            .await?;

        Ok(count)
    }
}

fn push_catalog_filters(builder: &mut QueryBuilder<'_, Postgres>, query: &CatalogQuery) {
    if let Some(category) = query.category {
        builder.push(" AND category = ").push_bind(category);
    }
    if let Some(min) = query.min_autonomy {
        builder.push(" AND autonomy_km >= ").push_bind(min);
    }
    if let Some(max) = query.max_autonomy {
        builder.push(" AND autonomy_km <= ").push_bind(max);
    }
    if let Some(min) = query.min_price {
        builder.push(" AND price >= ").push_bind(min);
    }
    if let Some(max) = query.max_price {
        builder.push(" AND price <= ").push_bind(max);
    }
    if let Some(featured) = query.featured {
        builder.push(" AND featured = ").push_bind(featured);
    }
    if let Some(text) = query.search_text() {
        let pattern = like_pattern(text);
        builder
            .push(" AND (name ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR description ILIKE ")
            .push_bind(pattern)
            .push(")");
    }
}

fn push_admin_filters(builder: &mut QueryBuilder<'_, Postgres>, filter: &ProductFilter) {
    if let Some(search) = filter.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        builder.push(" AND name ILIKE ").push_bind(like_pattern(search));
    }
    if let Some(category) = filter.category {
        builder.push(" AND category = ").push_bind(category);
    }
    if let Some(active) = filter.active {
        builder.push(" AND active = ").push_bind(active);
    }
}

const fn order_by(sort: Sort) -> &'static str {
    match sort {
        Sort::Newest => " ORDER BY created_at DESC, id DESC",
        Sort::PriceAsc => " ORDER BY price ASC, id",
        Sort::PriceDesc => " ORDER BY price DESC, id",
        Sort::AutonomyDesc => " ORDER BY autonomy_km DESC, id",
        Sort::Name => " ORDER BY LOWER(name), id",
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const BASE: &str = "SELECT 1 FROM shop.product WHERE active";

    #[test]
    fn test_empty_query_adds_nothing() {
        let mut builder = QueryBuilder::<Postgres>::new(BASE);
        push_catalog_filters(&mut builder, &CatalogQuery::default());
        assert_eq!(builder.sql(), BASE);
    }

    #[test]
    fn test_range_filters() {
        let query = CatalogQuery {
            category: Some(Category::Motorcycle),
            min_autonomy: Some(80),
            max_price: Some("45000".parse().unwrap()),
            ..CatalogQuery::default()
        };
        let mut builder = QueryBuilder::<Postgres>::new(BASE);
        push_catalog_filters(&mut builder, &query);
        assert_eq!(
            builder.sql(),
            format!("{BASE} AND category = $1 AND autonomy_km >= $2 AND price <= $3")
        );
    }

    #[test]
    fn test_blank_search_is_ignored() {
        let query = CatalogQuery {
            q: Some("   ".to_owned()),
            ..CatalogQuery::default()
        };
        let mut builder = QueryBuilder::<Postgres>::new(BASE);
        push_catalog_filters(&mut builder, &query);
        assert_eq!(builder.sql(), BASE);
    }

    #[test]
    fn test_search_matches_name_or_description() {
        let query = CatalogQuery {
            q: Some("urbano".to_owned()),
            featured: Some(true),
            ..CatalogQuery::default()
        };
        let mut builder = QueryBuilder::<Postgres>::new(BASE);
        push_catalog_filters(&mut builder, &query);
        assert_eq!(
            builder.sql(),
            format!("{BASE} AND featured = $1 AND (name ILIKE $2 OR description ILIKE $3)")
        );
    }

    #[test]
    fn test_order_by_every_sort() {
        assert!(order_by(Sort::default()).contains("created_at DESC"));
        assert!(order_by(Sort::PriceAsc).contains("price ASC"));
        assert!(order_by(Sort::AutonomyDesc).contains("autonomy_km DESC"));
    }
}
