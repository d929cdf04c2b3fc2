//! Coupon evaluation

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::domain::value_objects::Money;
use crate::{Result, StorefrontError};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppliedCoupon {
    pub code: String,
    pub discount_percent: Decimal,
    pub discount_amount: Money,
}

/// Static code → percent-off table. Codes are stored normalised (trimmed, uppercase).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CouponTable {
    coupons: BTreeMap<String, Decimal>,
}

impl Default for CouponTable {
    fn default() -> Self { Self::new([("FIRST25", Decimal::from(25))]) }
}

fn normalize(code: &str) -> String { code.trim().to_uppercase() }

impl CouponTable {
    /// Percentages are clamped to `0..=100`.
    pub fn new<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = (S, Decimal)>,
        S: AsRef<str>,
    {
        let coupons = entries
            .into_iter()
            .map(|(code, pct)| (normalize(code.as_ref()), pct.clamp(Decimal::ZERO, Decimal::ONE_HUNDRED)))
            .filter(|(code, _)| !code.is_empty())
            .collect();
        Self { coupons }
    }

    /// Parses `CODE:PERCENT` pairs separated by commas, e.g. `FIRST25:25,BULK10:10`.
    pub fn parse(raw: &str) -> Result<Self> {
        let mut entries = Vec::new();
        for pair in raw.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            let (code, pct) = pair
                .split_once(':')
                .ok_or_else(|| StorefrontError::Validation(format!("coupon entry {pair:?} is not CODE:PERCENT")))?;
            let pct: Decimal = pct
                .trim()
                .parse()
                .map_err(|_| StorefrontError::Validation(format!("coupon {code:?} has invalid percent {pct:?}")))?;
            if pct < Decimal::ZERO || pct > Decimal::ONE_HUNDRED {
                return Err(StorefrontError::Validation(format!("coupon {code:?} percent must be within 0..=100")));
            }
            entries.push((code.to_string(), pct));
        }
        Ok(Self::new(entries))
    }

    pub fn len(&self) -> usize { self.coupons.len() }
    pub fn is_empty(&self) -> bool { self.coupons.is_empty() }

    /// Validates `code` and computes its discount on `subtotal`, floored to a whole unit.
    pub fn evaluate(&self, code: &str, subtotal: Money) -> Result<AppliedCoupon> {
        let code = normalize(code);
        let percent = *self.coupons.get(&code).ok_or_else(|| StorefrontError::InvalidCoupon(code.clone()))?;
        let discount_amount = if subtotal.is_positive() { subtotal.percent(percent).floor() } else { Money::ZERO };
        Ok(AppliedCoupon { code, discount_percent: percent, discount_amount })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first25_on_1000() {
        let applied = CouponTable::default().evaluate("FIRST25", Money::from_units(1000)).unwrap();
        assert_eq!(applied.discount_amount, Money::from_units(250));
        assert_eq!(applied.discount_percent, Decimal::from(25));
    }

    #[test]
    fn test_code_is_normalised() {
        let applied = CouponTable::default().evaluate("  first25 ", Money::from_units(999)).unwrap();
        assert_eq!(applied.code, "FIRST25");
        assert_eq!(applied.discount_amount, Money::from_units(249));
    }

    #[test]
    fn test_unknown_code_rejected() {
        let err = CouponTable::default().evaluate("SAVE99", Money::from_units(500)).unwrap_err();
        assert!(matches!(err, StorefrontError::InvalidCoupon(code) if code == "SAVE99"));
    }

    #[test]
    fn test_zero_subtotal_gives_zero_discount() {
        let applied = CouponTable::default().evaluate("FIRST25", Money::ZERO).unwrap();
        assert_eq!(applied.discount_amount, Money::ZERO);
    }

    #[test]
    fn test_parse_table() {
        let table = CouponTable::parse("first25:25, BULK10:10").unwrap();
        assert_eq!(table.len(), 2);
        assert!(table.evaluate("bulk10", Money::from_units(100)).is_ok());
        assert!(CouponTable::parse("BAD").is_err());
        assert!(CouponTable::parse("BIG:150").is_err());
        assert!(CouponTable::parse("").unwrap().is_empty());
    }
}
