//! Shipping and order total assembly

use crate::domain::value_objects::Money;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ShippingPolicy {
    pub flat_charge: Money,
    /// Orders whose discounted subtotal reaches this amount ship free.
    pub free_above: Option<Money>,
}

impl ShippingPolicy {
    pub fn charge_for(&self, discounted_subtotal: Money) -> Money {
        match self.free_above {
            Some(threshold) if discounted_subtotal >= threshold => Money::ZERO,
            _ => self.flat_charge,
        }
    }
}

/// `(subtotal - discount) + tax + shipping`
pub fn assemble_total(subtotal: Money, discount: Money, tax: Money, shipping: Money) -> Money {
    (subtotal - discount) + tax + shipping
}
