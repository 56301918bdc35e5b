//! Orders and the checkout form that creates them.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use voltio_core::validation::{self, FieldErrors};
use voltio_core::{OrderId, OrderItemId, OrderStatus, PaymentMethod, ProductId, UserId};

/// Shipping details captured at checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ShippingAddress {
    pub name: String,
    pub phone: String,
    pub street: String,
    pub city: String,
    pub postal_code: String,
}

/// A purchased line with the name and price at the time of purchase.
#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct OrderItem {
    pub id: OrderItemId,
    #[serde(skip)]
    pub order_id: OrderId,
    pub product_id: ProductId,
    pub product_name: String,
    pub unit_price: Decimal,
    pub quantity: i32,
    pub line_total: Decimal,
}

/// A placed order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Order {
    pub id: OrderId,
    pub user_id: UserId,
    pub status: OrderStatus,
    pub shipping: ShippingAddress,
    pub payment_method: PaymentMethod,
    pub notes: Option<String>,
    pub subtotal: Decimal,
    pub shipping_cost: Decimal,
    pub tax: Decimal,
    pub total: Decimal,
    pub items: Vec<OrderItem>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    /// Total units in the order.
    #[must_use]
    pub fn item_count(&self) -> i32 {
        self.items.iter().map(|i| i.quantity).sum()
    }
}

/// Checkout form. Missing fields fall back to the saved profile.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CheckoutRequest {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub street: Option<String>,
    pub city: Option<String>,
    pub postal_code: Option<String>,
    pub payment_method: Option<PaymentMethod>,
    pub notes: Option<String>,
}

/// Checkout form after validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidCheckout {
    pub shipping: ShippingAddress,
    pub payment_method: PaymentMethod,
    pub notes: Option<String>,
}

impl CheckoutRequest {
    /// Fill blank fields from saved profile values.
    #[must_use]
    pub fn with_defaults(mut self, profile: &super::User) -> Self {
        fn fill(field: &mut Option<String>, fallback: Option<&String>) {
            if field.as_deref().is_none_or(|v| v.trim().is_empty()) {
                *field = fallback.cloned();
            }
        }

        fill(&mut self.name, Some(&profile.name));
        fill(&mut self.phone, profile.phone.as_ref());
        fill(&mut self.street, profile.street.as_ref());
        fill(&mut self.city, profile.city.as_ref());
        fill(&mut self.postal_code, profile.postal_code.as_ref());
        self
    }

    /// Validate the form.
    ///
    /// # Errors
    ///
    /// Returns every invalid field.
    pub fn validate(&self) -> Result<ValidCheckout, FieldErrors> {
        let mut errors = FieldErrors::new();

        let name = errors.check(
            "name",
            validation::required(self.name.as_deref().unwrap_or_default(), 100),
        );
        let phone = errors.check(
            "phone",
            validation::phone(self.phone.as_deref().unwrap_or_default()),
        );
        let street = errors.check(
            "street",
            validation::required(self.street.as_deref().unwrap_or_default(), 200),
        );
        let city = errors.check(
            "city",
            validation::required(self.city.as_deref().unwrap_or_default(), 100),
        );
        let postal_code = errors.check(
            "postal_code",
            validation::postal_code(self.postal_code.as_deref().unwrap_or_default()),
        );
        if self.payment_method.is_none() {
            errors.add("payment_method", "choose a payment method");
        }
        let notes = errors
            .check("notes", validation::optional(self.notes.as_deref(), 500))
            .flatten();

        match (name, phone, street, city, postal_code, self.payment_method) {
            (Some(name), Some(phone), Some(street), Some(city), Some(postal_code), Some(method))
                if errors.is_empty() =>
            {
                Ok(ValidCheckout {
                    shipping: ShippingAddress {
                        name,
                        phone,
                        street,
                        city,
                        postal_code,
                    },
                    payment_method: method,
                    notes,
                })
            }
            _ => Err(errors),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use voltio_core::{Email, UserRole};

    use super::super::User;
    use super::*;

    fn complete() -> CheckoutRequest {
        CheckoutRequest {
            name: Some("Luis Pérez".to_owned()),
            phone: Some("55 1234 5678".to_owned()),
            street: Some("Av. Reforma 222".to_owned()),
            city: Some("CDMX".to_owned()),
            postal_code: Some("06600".to_owned()),
            payment_method: Some(PaymentMethod::Card),
            notes: None,
        }
    }

    fn profile() -> User {
        User {
            id: UserId::new(1),
            email: Email::parse("luis@example.com").unwrap(),
            name: "Luis Pérez".to_owned(),
            phone: Some("5512345678".to_owned()),
            street: Some("Insurgentes 10".to_owned()),
            city: Some("Puebla".to_owned()),
            postal_code: Some("72000".to_owned()),
            role: UserRole::Customer,
            active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_complete_form_validates() {
        let valid = complete().validate().unwrap();
        assert_eq!(valid.shipping.phone, "5512345678");
        assert_eq!(valid.payment_method, PaymentMethod::Card);
    }

    #[test]
    fn test_empty_form_reports_every_field() {
        let errors = CheckoutRequest::default().validate().unwrap_err();
        for field in ["name", "phone", "street", "city", "postal_code", "payment_method"] {
            assert!(errors.get(field).is_some(), "missing error for {field}");
        }
    }

    #[test]
    fn test_bad_postal_code() {
        let mut form = complete();
        form.postal_code = Some("1234".to_owned());
        let errors = form.validate().unwrap_err();
        assert_eq!(errors.len(), 1);
        assert!(errors.get("postal_code").is_some());
    }

    #[test]
    fn test_profile_fills_blank_fields_only() {
        let form = CheckoutRequest {
            city: Some("Monterrey".to_owned()),
            street: Some("  ".to_owned()),
            payment_method: Some(PaymentMethod::BankTransfer),
            ..CheckoutRequest::default()
        }
        .with_defaults(&profile());

        let valid = form.validate().unwrap();
        assert_eq!(valid.shipping.city, "Monterrey");
        assert_eq!(valid.shipping.street, "Insurgentes 10");
        assert_eq!(valid.shipping.postal_code, "72000");
    }
}
