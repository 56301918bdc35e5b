//! Store-wide settings editable from the admin panel.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use voltio_core::PricingRules;
use voltio_core::validation::{self, FieldErrors};

/// Settings key under which the document is stored.
pub const SITE_CONFIG_KEY: &str = "site_config";

/// The full site configuration document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    pub store_name: String,
    pub contact_email: String,
    pub contact_phone: String,
    pub shipping_cost: Decimal,
    /// Orders at or above this subtotal ship free. Zero disables free shipping.
    pub free_shipping_threshold: Decimal,
    /// Fraction of the subtotal, `0.16` for 16%.
    pub tax_rate: Decimal,
    pub currency: String,
    pub maintenance_mode: bool,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            store_name: "Voltio".to_owned(),
            contact_email: "soporte@voltio.mx".to_owned(),
            contact_phone: "+525512345678".to_owned(),
            shipping_cost: Decimal::new(500, 0),
            free_shipping_threshold: Decimal::new(20_000, 0),
            tax_rate: Decimal::new(16, 2),
            currency: "MXN".to_owned(),
            maintenance_mode: false,
        }
    }
}

impl SiteConfig {
    /// Validate an admin update.
    ///
    /// # Errors
    ///
    /// Returns every invalid field.
    pub fn validate(mut self) -> Result<Self, FieldErrors> {
        let mut errors = FieldErrors::new();

        if let Some(name) = errors.check("store_name", validation::required(&self.store_name, 100)) {
            self.store_name = name;
        }
        if let Some(email) = errors.check("contact_email", validation::email(&self.contact_email)) {
            self.contact_email = email.into_inner();
        }
        if let Some(phone) = errors.check("contact_phone", validation::phone(&self.contact_phone)) {
            self.contact_phone = phone;
        }
        if self.shipping_cost.is_sign_negative() {
            errors.add("shipping_cost", "must not be negative");
        }
        if self.free_shipping_threshold.is_sign_negative() {
            errors.add("free_shipping_threshold", "must not be negative");
        }
        if self.tax_rate.is_sign_negative() || self.tax_rate > Decimal::ONE {
            errors.add("tax_rate", "must be between 0 and 1");
        }

        let currency = self.currency.trim().to_uppercase();
        if currency.len() == 3 && currency.chars().all(|c| c.is_ascii_alphabetic()) {
            self.currency = currency;
        } else {
            errors.add("currency", "must be a three-letter ISO code");
        }

        errors.into_result()?;
        Ok(self)
    }

    #[must_use]
    pub const fn pricing_rules(&self) -> PricingRules {
        PricingRules {
            shipping_cost: self.shipping_cost,
            free_shipping_threshold: self.free_shipping_threshold,
            tax_rate: self.tax_rate,
        }
    }
}

/// The subset of settings shown to shoppers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PublicSiteConfig {
    pub store_name: String,
    pub contact_email: String,
    pub contact_phone: String,
    pub shipping_cost: Decimal,
    pub free_shipping_threshold: Decimal,
    pub tax_rate: Decimal,
    pub currency: String,
    pub maintenance_mode: bool,
}

impl From<&SiteConfig> for PublicSiteConfig {
    fn from(config: &SiteConfig) -> Self {
        Self {
            store_name: config.store_name.clone(),
            contact_email: config.contact_email.clone(),
            contact_phone: config.contact_phone.clone(),
            shipping_cost: config.shipping_cost,
            free_shipping_threshold: config.free_shipping_threshold,
            tax_rate: config.tax_rate,
            currency: config.currency.clone(),
            maintenance_mode: config.maintenance_mode,
        }
    }
}
