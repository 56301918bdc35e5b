//! Catalog browsing: filters, sort order and pagination.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::Category;
use crate::validation::FieldErrors;

/// Default page size for listings.
pub const DEFAULT_PER_PAGE: u32 = 12;
/// Largest page size a client may request.
pub const MAX_PER_PAGE: u32 = 100;

/// Catalog sort order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sort {
    #[default]
    Newest,
    PriceAsc,
    PriceDesc,
    AutonomyDesc,
    Name,
}

/// Page request, already clamped to sane bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    page: u32,
    per_page: u32,
}

impl Pagination {
    /// Clamp a raw page request: `page >= 1`, `1 <= per_page <= 100`.
    #[must_use]
    pub fn new(page: Option<u32>, per_page: Option<u32>) -> Self {
        Self {
            page: page.unwrap_or(1).max(1),
            per_page: per_page
                .unwrap_or(DEFAULT_PER_PAGE)
                .clamp(1, MAX_PER_PAGE),
        }
    }

    #[must_use]
    pub const fn page(&self) -> u32 {
        self.page
    }

    #[must_use]
    pub const fn per_page(&self) -> u32 {
        self.per_page
    }

    /// SQL `LIMIT`.
    #[must_use]
    pub fn limit(&self) -> i64 {
        i64::from(self.per_page)
    }

    /// SQL `OFFSET`.
    #[must_use]
    pub fn offset(&self) -> i64 {
        i64::from(self.page - 1) * i64::from(self.per_page)
    }
}

impl Default for Pagination {
    fn default() -> Self {
        Self::new(None, None)
    }
}

/// One page of results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: i64,
    pub page: u32,
    pub per_page: u32,
    pub total_pages: u32,
}

impl<T> Page<T> {
    #[must_use]
    pub fn new(items: Vec<T>, total: i64, pagination: Pagination) -> Self {
        let per_page = i64::from(pagination.per_page());
        let total = total.max(0);
        let pages = (total + per_page - 1) / per_page;
        Self {
            items,
            total,
            page: pagination.page(),
            per_page: pagination.per_page(),
            total_pages: u32::try_from(pages).unwrap_or(u32::MAX),
        }
    }

    /// Convert each item, keeping the paging metadata.
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
            page: self.page,
            per_page: self.per_page,
            total_pages: self.total_pages,
        }
    }
}

/// Public catalog query string.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct CatalogQuery {
    pub category: Option<Category>,
    pub min_autonomy: Option<i32>,
    pub max_autonomy: Option<i32>,
    pub min_price: Option<Decimal>,
    pub max_price: Option<Decimal>,
    /// Free-text search over name and description.
    pub q: Option<String>,
    pub featured: Option<bool>,
    #[serde(default)]
    pub sort: Sort,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

impl CatalogQuery {
    /// Check ranges are non-negative and ordered.
    ///
    /// # Errors
    ///
    /// Returns the offending fields.
    pub fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();

        if self.min_autonomy.is_some_and(|v| v < 0) {
            errors.add("min_autonomy", "must not be negative");
        }
        if self.max_autonomy.is_some_and(|v| v < 0) {
            errors.add("max_autonomy", "must not be negative");
        }
        if let (Some(min), Some(max)) = (self.min_autonomy, self.max_autonomy)
            && min > max
        {
            errors.add("max_autonomy", "must be greater than or equal to min_autonomy");
        }

        if self.min_price.is_some_and(|v| v.is_sign_negative()) {
            errors.add("min_price", "must not be negative");
        }
        if self.max_price.is_some_and(|v| v.is_sign_negative()) {
            errors.add("max_price", "must not be negative");
        }
        if let (Some(min), Some(max)) = (self.min_price, self.max_price)
            && min > max
        {
            errors.add("max_price", "must be greater than or equal to min_price");
        }

        if self.q.as_deref().is_some_and(|q| q.chars().count() > 100) {
            errors.add("q", "search text must be at most 100 characters");
        }

        errors.into_result()
    }

    /// Trimmed search text, `None` when blank.
    #[must_use]
    pub fn search_text(&self) -> Option<&str> {
        self.q.as_deref().map(str::trim).filter(|q| !q.is_empty())
    }

    #[must_use]
    pub fn pagination(&self) -> Pagination {
        Pagination::new(self.page, self.per_page)
    }
}

/// Escape `%`, `_` and `\` for use inside an `ILIKE` pattern.
#[must_use]
pub fn like_pattern(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len() + 2);
    escaped.push('%');
    for ch in text.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped.push('%');
    escaped
}
