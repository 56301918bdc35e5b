//! Vehicle catalog products.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use voltio_core::validation::{self, FieldErrors};
use voltio_core::{Category, ProductId};

/// A catalog vehicle.
#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub description: String,
    pub category: Category,
    pub price: Decimal,
    pub stock: i32,
    /// Range on a full charge.
    pub autonomy_km: i32,
    pub top_speed_kmh: Option<i32>,
    pub battery_kwh: Option<Decimal>,
    pub charge_time_hours: Option<Decimal>,
    pub image_url: Option<String>,
    pub featured: bool,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Units that can be sold right now.
    #[must_use]
    pub fn available_units(&self) -> u32 {
        if self.active {
            u32::try_from(self.stock).unwrap_or(0)
        } else {
            0
        }
    }

    #[must_use]
    pub fn in_stock(&self) -> bool {
        self.available_units() > 0
    }
}

/// Admin create/update payload.
#[derive(Debug, Clone, Deserialize)]
pub struct ProductInput {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub category: Category,
    pub price: Decimal,
    #[serde(default)]
    pub stock: i32,
    #[serde(default)]
    pub autonomy_km: i32,
    pub top_speed_kmh: Option<i32>,
    pub battery_kwh: Option<Decimal>,
    pub charge_time_hours: Option<Decimal>,
    pub image_url: Option<String>,
    #[serde(default)]
    pub featured: bool,
    #[serde(default = "default_active")]
    pub active: bool,
}

const fn default_active() -> bool {
    true
}

/// Upper bounds that keep amounts inside their `NUMERIC` columns, leaving
/// room for 99-unit order lines.
const MAX_PRICE: Decimal = Decimal::from_parts(99_999_999, 0, 0, false, 0);
const MAX_BATTERY_KWH: Decimal = Decimal::from_parts(999_999, 0, 0, false, 0);
const MAX_CHARGE_HOURS: Decimal = Decimal::from_parts(999, 0, 0, false, 0);

/// Check a non-negative amount with at most two decimals, returning it with
/// trailing zeros dropped.
fn bounded_amount(value: Decimal, max: Decimal) -> Result<Decimal, String> {
    let value = value.normalize();
    if value.is_sign_negative() {
        Err("must not be negative".to_owned())
    } else if value.scale() > 2 {
        Err("must have at most two decimal places".to_owned())
    } else if value > max {
        Err(format!("must be at most {max}"))
    } else {
        Ok(value)
    }
}

impl ProductInput {
    /// Validate and normalize the payload.
    ///
    /// # Errors
    ///
    /// Returns every invalid field.
    pub fn validate(mut self) -> Result<Self, FieldErrors> {
        let mut errors = FieldErrors::new();

        if let Some(name) = errors.check("name", validation::required(&self.name, 150)) {
            self.name = name;
        }
        if self.description.chars().count() > 5000 {
            errors.add("description", "must be at most 5000 characters");
        }
        self.description = self.description.trim().to_owned();

        if let Some(price) = errors.check("price", bounded_amount(self.price, MAX_PRICE)) {
            self.price = price;
        }
        if self.stock < 0 {
            errors.add("stock", "must not be negative");
        }
        if self.autonomy_km < 0 {
            errors.add("autonomy_km", "must not be negative");
        }
        if self.top_speed_kmh.is_some_and(|v| v < 0) {
            errors.add("top_speed_kmh", "must not be negative");
        }
        if let Some(kwh) = self.battery_kwh {
            self.battery_kwh = errors.check("battery_kwh", bounded_amount(kwh, MAX_BATTERY_KWH));
        }
        if let Some(hours) = self.charge_time_hours {
            self.charge_time_hours =
                errors.check("charge_time_hours", bounded_amount(hours, MAX_CHARGE_HOURS));
        }

        self.image_url = errors
            .check("image_url", validation::optional(self.image_url.as_deref(), 500))
            .flatten();
        if let Some(url) = &self.image_url
            && !(url.starts_with("https://") || url.starts_with("http://") || url.starts_with('/'))
        {
            errors.add("image_url", "must be an http(s) URL or an absolute path");
        }

        errors.into_result()?;
        Ok(self)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn input() -> ProductInput {
        serde_json::from_value(serde_json::json!({
            "name": "  Voltio Urban S  ",
            "category": "scooters",
            "price": "18999.00",
            "stock": 5,
            "autonomy_km": 45
        }))
        .unwrap()
    }

    #[test]
    fn test_defaults_and_trimming() {
        let product = input().validate().unwrap();
        assert_eq!(product.name, "Voltio Urban S");
        assert!(product.active);
        assert!(!product.featured);
    }

    #[test]
    fn test_rejects_negative_numbers() {
        let mut bad = input();
        bad.price = "-1".parse().unwrap();
        bad.stock = -3;
        bad.autonomy_km = -10;
        let errors = bad.validate().unwrap_err();
        assert!(errors.get("price").is_some());
        assert!(errors.get("stock").is_some());
        assert!(errors.get("autonomy_km").is_some());
    }

    #[test]
    fn test_rejects_sub_cent_prices() {
        let mut bad = input();
        bad.price = "10.005".parse().unwrap();
        assert!(bad.validate().unwrap_err().get("price").is_some());
    }

    #[test]
    fn test_trailing_zeros_are_not_extra_decimals() {
        let mut product = input();
        product.price = "1.500".parse().unwrap();
        product.battery_kwh = Some("4.10".parse().unwrap());
        let product = product.validate().unwrap();
        assert_eq!(product.price, "1.5".parse::<Decimal>().unwrap());
        assert_eq!(product.battery_kwh, Some("4.1".parse().unwrap()));
    }

    #[test]
    fn test_amounts_must_fit_their_columns() {
        let mut bad = input();
        bad.price = "100000000".parse().unwrap();
        bad.charge_time_hours = Some("1000".parse().unwrap());
        let errors = bad.validate().unwrap_err();
        assert!(errors.get("price").is_some());
        assert!(errors.get("charge_time_hours").is_some());

        let mut ok = input();
        ok.price = MAX_PRICE;
        assert!(ok.validate().is_ok());
    }

    #[test]
    fn test_image_url_shape() {
        let mut bad = input();
        bad.image_url = Some("javascript:alert(1)".to_owned());
        assert!(bad.validate().is_err());

        let mut ok = input();
        ok.image_url = Some("/static/img/urban-s.webp".to_owned());
        assert!(ok.validate().is_ok());
    }
}
