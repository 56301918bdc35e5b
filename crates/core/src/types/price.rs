//! Money arithmetic for carts and orders.
//!
//! All amounts are [`Decimal`] in the store currency's standard unit
//! (pesos, not centavos) and are rounded to two places half away from zero.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// Round an amount to cents.
#[must_use]
pub fn round_money(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Format an amount as `$1,234.50`.
#[must_use]
pub fn format_money(amount: Decimal) -> String {
    let rounded = round_money(amount);
    let negative = rounded.is_sign_negative() && !rounded.is_zero();
    let text = format!("{:.2}", rounded.abs());
    let (whole, cents) = text.split_once('.').unwrap_or((text.as_str(), "00"));

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, ch) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    if negative {
        format!("-${grouped}.{cents}")
    } else {
        format!("${grouped}.{cents}")
    }
}

/// Store-wide pricing rules applied at checkout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PricingRules {
    /// Flat shipping fee.
    pub shipping_cost: Decimal,
    /// Subtotal at or above which shipping is free. Zero disables free shipping.
    pub free_shipping_threshold: Decimal,
    /// Tax rate as a fraction (0.16 = 16%).
    pub tax_rate: Decimal,
}

/// Computed totals for a cart or order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderTotals {
    pub subtotal: Decimal,
    pub shipping: Decimal,
    pub tax: Decimal,
    pub total: Decimal,
}

impl OrderTotals {
    /// Totals for an empty cart.
    pub const ZERO: Self = Self {
        subtotal: Decimal::ZERO,
        shipping: Decimal::ZERO,
        tax: Decimal::ZERO,
        total: Decimal::ZERO,
    };

    /// Compute shipping, tax and total from a merchandise subtotal.
    #[must_use]
    pub fn compute(subtotal: Decimal, rules: &PricingRules) -> Self {
        let subtotal = round_money(subtotal);
        if subtotal.is_zero() {
            return Self::ZERO;
        }

        let free_shipping = rules.free_shipping_threshold > Decimal::ZERO
            && subtotal >= rules.free_shipping_threshold;
        let shipping = if free_shipping {
            Decimal::ZERO
        } else {
            round_money(rules.shipping_cost)
        };
        let tax = round_money(subtotal * rules.tax_rate);

        Self {
            subtotal,
            shipping,
            tax,
            total: subtotal + shipping + tax,
        }
    }
}

/// Price of `quantity` units.
#[must_use]
pub fn line_total(unit_price: Decimal, quantity: u32) -> Decimal {
    round_money(unit_price * Decimal::from(quantity))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rust_decimal::Decimal;

    use super::*;

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    fn rules() -> PricingRules {
        PricingRules {
            shipping_cost: dec("350"),
            free_shipping_threshold: dec("20000"),
            tax_rate: dec("0.16"),
        }
    }

    #[test]
    fn test_totals_below_threshold_pay_shipping() {
        let totals = OrderTotals::compute(dec("1000"), &rules());
        assert_eq!(totals.shipping, dec("350"));
        assert_eq!(totals.tax, dec("160.00"));
        assert_eq!(totals.total, dec("1510.00"));
    }

    #[test]
    fn test_totals_at_threshold_ship_free() {
        let totals = OrderTotals::compute(dec("20000"), &rules());
        assert_eq!(totals.shipping, Decimal::ZERO);
        assert_eq!(totals.total, dec("23200.00"));
    }

    #[test]
    fn test_zero_threshold_never_ships_free() {
        let rules = PricingRules {
            free_shipping_threshold: Decimal::ZERO,
            ..rules()
        };
        let totals = OrderTotals::compute(dec("999999"), &rules);
        assert_eq!(totals.shipping, dec("350"));
    }

    #[test]
    fn test_empty_subtotal_is_all_zero() {
        assert_eq!(OrderTotals::compute(Decimal::ZERO, &rules()), OrderTotals::ZERO);
    }

    #[test]
    fn test_tax_rounds_half_away_from_zero() {
        let rules = PricingRules {
            tax_rate: dec("0.5"),
            ..rules()
        };
        // 0.05 * 0.5 = 0.025 -> 0.03
        let totals = OrderTotals::compute(dec("0.05"), &rules);
        assert_eq!(totals.tax, dec("0.03"));
    }

    #[test]
    fn test_line_total() {
        assert_eq!(line_total(dec("18999.90"), 3), dec("56999.70"));
    }

    #[test]
    fn test_format_money() {
        assert_eq!(format_money(dec("0")), "$0.00");
        assert_eq!(format_money(dec("999.5")), "$999.50");
        assert_eq!(format_money(dec("1234567.891")), "$1,234,567.89");
        assert_eq!(format_money(dec("-45")), "-$45.00");
    }
}
