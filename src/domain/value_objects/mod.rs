//! Value Objects for the storefront

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, Sub};

use crate::StorefrontError;

/// Money value object. Single-currency (INR) storefront, so only the amount is carried.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Money(Decimal);

impl Money {
    pub const ZERO: Money = Money(Decimal::ZERO);

    pub fn new(amount: Decimal) -> Self { Self(amount) }
    pub fn from_units(units: i64) -> Self { Self(Decimal::from(units)) }
    pub fn amount(&self) -> Decimal { self.0 }
    pub fn is_positive(&self) -> bool { self.0 > Decimal::ZERO }

    pub fn multiply(&self, qty: u32) -> Money { Money(self.0 * Decimal::from(qty)) }

    /// Rounds down to a whole currency unit.
    pub fn floor(&self) -> Money { Money(self.0.floor()) }

    /// `percent`% of this amount, unrounded.
    pub fn percent(&self, percent: Decimal) -> Money { Money(self.0 * percent / Decimal::ONE_HUNDRED) }

    /// Subtraction clamped at zero.
    pub fn saturating_sub(&self, other: Money) -> Money { Money((self.0 - other.0).max(Decimal::ZERO)) }
}

impl Add for Money {
    type Output = Money;
    fn add(self, rhs: Money) -> Money { Money(self.0 + rhs.0) }
}

impl Sub for Money {
    type Output = Money;
    fn sub(self, rhs: Money) -> Money { Money(self.0 - rhs.0) }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Money { iter.fold(Money::ZERO, Add::add) }
}

impl From<Decimal> for Money {
    fn from(d: Decimal) -> Self { Self(d) }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "₹{}", self.0) }
}

/// Separator between product id and colour in a composite cart key.
/// Product ids must never contain it; colours may.
pub const CART_KEY_SEPARATOR: char = '_';

/// Identifies one cart line: a product plus its optional colour variant.
///
/// Persisted as a composite string (`"<productId>"` or `"<productId>_<color>"`),
/// see [`CartKey::encode`] and [`CartKey::decode`].
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CartKey {
    product_id: String,
    variant: Option<String>,
}

impl CartKey {
    pub fn new(product_id: impl Into<String>, variant: Option<String>) -> Result<Self, StorefrontError> {
        let product_id = product_id.into();
        if product_id.is_empty() {
            return Err(StorefrontError::InvalidKey("empty product id".into()));
        }
        if product_id.contains(CART_KEY_SEPARATOR) {
            return Err(StorefrontError::InvalidKey(format!("product id {product_id:?} contains reserved separator")));
        }
        let variant = variant.filter(|v| !v.is_empty());
        Ok(Self { product_id, variant })
    }

    pub fn product_id(&self) -> &str { &self.product_id }
    pub fn variant(&self) -> Option<&str> { self.variant.as_deref() }

    pub fn encode(&self) -> String {
        match &self.variant {
            Some(color) => format!("{}{}{}", self.product_id, CART_KEY_SEPARATOR, color),
            None => self.product_id.clone(),
        }
    }

    /// Splits on the first separator only, so colours containing `_` survive.
    pub fn decode(key: &str) -> Result<Self, StorefrontError> {
        if key.is_empty() {
            return Err(StorefrontError::InvalidKey("empty cart key".into()));
        }
        match key.split_once(CART_KEY_SEPARATOR) {
            Some((product_id, color)) => Self::new(product_id, Some(color.to_string())),
            None => Self::new(key, None),
        }
    }
}

/// Encodes `(product_id, color)` into a composite cart key.
pub fn encode_cart_key(product_id: &str, color: Option<&str>) -> Result<String, StorefrontError> {
    Ok(CartKey::new(product_id, color.map(str::to_string))?.encode())
}

/// Decodes a composite cart key into `(product_id, color)`.
pub fn decode_cart_key(key: &str) -> Result<(String, Option<String>), StorefrontError> {
    let key = CartKey::decode(key)?;
    Ok((key.product_id, key.variant))
}

impl TryFrom<String> for CartKey {
    type Error = StorefrontError;
    fn try_from(value: String) -> Result<Self, Self::Error> { Self::decode(&value) }
}

impl From<CartKey> for String {
    fn from(key: CartKey) -> Self { key.encode() }
}

impl fmt::Display for CartKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(&self.encode()) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bare_product_key() {
        let key = encode_cart_key("64f1a2", None).unwrap();
        assert_eq!(key, "64f1a2");
        assert_eq!(decode_cart_key(&key).unwrap(), ("64f1a2".to_string(), None));
    }

    #[test]
    fn test_empty_color_is_no_variant() {
        assert_eq!(encode_cart_key("64f1a2", Some("")).unwrap(), "64f1a2");
        assert_eq!(decode_cart_key("64f1a2_").unwrap(), ("64f1a2".to_string(), None));
    }

    #[test]
    fn test_color_with_separator_round_trips() {
        let key = encode_cart_key("64f1a2", Some("ivory_matte")).unwrap();
        assert_eq!(key, "64f1a2_ivory_matte");
        assert_eq!(decode_cart_key(&key).unwrap(), ("64f1a2".to_string(), Some("ivory_matte".to_string())));
    }

    #[test]
    fn test_rejects_malformed_keys() {
        assert!(matches!(decode_cart_key(""), Err(StorefrontError::InvalidKey(_))));
        assert!(matches!(decode_cart_key("_red"), Err(StorefrontError::InvalidKey(_))));
        assert!(matches!(encode_cart_key("tile_01", Some("red")), Err(StorefrontError::InvalidKey(_))));
    }

    #[test]
    fn test_cart_key_serde_as_string() {
        let key = CartKey::new("p9", Some("Grey".into())).unwrap();
        assert_eq!(serde_json::to_string(&key).unwrap(), "\"p9_Grey\"");
        let back: CartKey = serde_json::from_str("\"p9_Grey\"").unwrap();
        assert_eq!(back, key);
    }

    #[test]
    fn test_money_floor_and_percent() {
        let m = Money::from_units(999);
        assert_eq!(m.percent(Decimal::from(25)).floor(), Money::from_units(249));
        assert_eq!(Money::from_units(5).saturating_sub(Money::from_units(9)), Money::ZERO);
    }
}
