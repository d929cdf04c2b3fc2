//! Cart pricing: coupon discount, GST split, shipping and the final payable amount.
//!
//! Every function here is pure. The checkout service resolves products and
//! feeds [`PricedLine`]s in; nothing in this module touches a collaborator.

pub mod coupon;
pub mod tax;
pub mod totals;

use serde::{Deserialize, Serialize};

use crate::domain::aggregates::{CartEntry, Product, TaxFamily};
use crate::domain::value_objects::{CartKey, Money};
use crate::Result;

pub use coupon::{AppliedCoupon, CouponTable};
pub use tax::TaxPolicy;
pub use totals::{assemble_total, ShippingPolicy};

/// A cart line joined with the catalog data needed to price it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PricedLine {
    pub product_id: String,
    pub color: Option<String>,
    pub quantity: u32,
    pub unit_price: Money,
    pub category: String,
    pub tax_class: Option<TaxFamily>,
}

impl PricedLine {
    pub fn from_cart(key: &CartKey, entry: &CartEntry, product: &Product) -> Self {
        Self {
            product_id: key.product_id().to_string(),
            color: key.variant().map(str::to_string),
            quantity: entry.quantity,
            unit_price: product.unit_price(),
            category: product.category.clone(),
            tax_class: product.tax_class,
        }
    }

    pub fn line_total(&self) -> Money { self.unit_price.multiply(self.quantity) }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceBreakdown {
    pub subtotal: Money,
    pub discount: Money,
    pub coupon: Option<AppliedCoupon>,
    pub tax: Money,
    pub shipping: Money,
    pub total: Money,
}

/// Pricing rules in force for the storefront.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Pricing {
    pub coupons: CouponTable,
    pub tax: TaxPolicy,
    pub shipping: ShippingPolicy,
}

impl Pricing {
    pub fn subtotal(lines: &[PricedLine]) -> Money { lines.iter().map(PricedLine::line_total).sum() }

    /// Prices `lines`. An unknown `coupon_code` fails with `InvalidCoupon`.
    pub fn quote(&self, lines: &[PricedLine], coupon_code: Option<&str>) -> Result<PriceBreakdown> {
        let subtotal = Self::subtotal(lines);
        let coupon = match coupon_code.map(str::trim).filter(|c| !c.is_empty()) {
            Some(code) => Some(self.coupons.evaluate(code, subtotal)?),
            None => None,
        };
        let discount = coupon.as_ref().map_or(Money::ZERO, |c| c.discount_amount);
        let tax = self.tax.compute_tax(lines, discount);
        let shipping = if lines.is_empty() { Money::ZERO } else { self.shipping.charge_for(subtotal.saturating_sub(discount)) };
        let total = assemble_total(subtotal, discount, tax, shipping);
        Ok(PriceBreakdown { subtotal, discount, coupon, tax, shipping, total })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    fn line(category: &str, price: i64, quantity: u32) -> PricedLine {
        PricedLine {
            product_id: "p".into(), color: None, quantity,
            unit_price: Money::from_units(price), category: category.into(), tax_class: None,
        }
    }

    #[test]
    fn test_quote_with_coupon() {
        let pricing = Pricing {
            tax: TaxPolicy::new(Decimal::from(5), Decimal::from(18), vec!["cement".into()]).unwrap(),
            shipping: ShippingPolicy { flat_charge: Money::from_units(40), free_above: None },
            ..Default::default()
        };
        let lines = [line("Cement - OPC", 300, 2), line("Tiles - Wall", 400, 1)];
        let quote = pricing.quote(&lines, Some("first25")).unwrap();
        assert_eq!(quote.subtotal, Money::from_units(1000));
        assert_eq!(quote.discount, Money::from_units(250));
        assert_eq!(quote.tax, Money::from_units(76));
        assert_eq!(quote.total, Money::from_units(750 + 76 + 40));
    }

    #[test]
    fn test_quote_empty_cart() {
        let quote = Pricing::default().quote(&[], None).unwrap();
        assert_eq!(quote.total, Money::ZERO);
        assert_eq!(quote.coupon, None);
    }

    #[test]
    fn test_quote_rejects_unknown_coupon() {
        assert!(Pricing::default().quote(&[line("Paints - Exterior", 10, 1)], Some("NOPE")).is_err());
        assert!(Pricing::default().quote(&[line("Paints - Exterior", 10, 1)], Some("  ")).is_ok());
    }
}
