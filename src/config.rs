//! Environment configuration (`.env` is loaded by `main` through dotenvy).

use anyhow::{Context, Result};
use rust_decimal::Decimal;

use crate::domain::value_objects::Money;
use crate::pricing::{CouponTable, Pricing, ShippingPolicy, TaxPolicy};

const DEFAULT_PORT: u16 = 8083;
const DEFAULT_COUPONS: &str = "FIRST25:25";

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub database_url: Option<String>,
    pub nats_url: Option<String>,
    pub port: u16,
    pub pricing: Pricing,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> { Self::from_lookup(|key| std::env::var(key).ok()) }

    /// Builds the config from any key lookup; blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let port = match get("PORT") {
            Some(p) => p.parse().with_context(|| format!("PORT={p:?} is not a valid port"))?,
            None => DEFAULT_PORT,
        };
        let decimal = |key: &str, default: Decimal| -> Result<Decimal> {
            match get(key) {
                Some(v) => v.parse().with_context(|| format!("{key}={v:?} is not a number")),
                None => Ok(default),
            }
        };

        let keywords = get("TAX_REDUCED_KEYWORDS")
            .map(|v| v.split(',').map(str::to_string).collect())
            .unwrap_or_default();
        let tax = TaxPolicy::new(decimal("TAX_RATE_REDUCED", Decimal::from(5))?, decimal("TAX_RATE_STANDARD", Decimal::from(18))?, keywords)
            .context("invalid tax configuration")?;
        let coupons = CouponTable::parse(&get("COUPONS").unwrap_or_else(|| DEFAULT_COUPONS.to_string()))
            .context("invalid COUPONS")?;
        let flat_charge = decimal("SHIPPING_CHARGE", Decimal::ZERO)?;
        anyhow::ensure!(flat_charge >= Decimal::ZERO, "SHIPPING_CHARGE must not be negative");
        let free_above = match get("FREE_SHIPPING_ABOVE") {
            Some(_) => Some(Money::new(decimal("FREE_SHIPPING_ABOVE", Decimal::ZERO)?)),
            None => None,
        };

        Ok(Self {
            database_url: get("DATABASE_URL"),
            nats_url: get("NATS_URL"),
            port,
            pricing: Pricing { coupons, tax, shipping: ShippingPolicy { flat_charge: Money::new(flat_charge), free_above } },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Result<AppConfig> {
        let vars: HashMap<String, String> = vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        AppConfig::from_lookup(|k| vars.get(k).cloned())
    }

    #[test]
    fn test_defaults() {
        let cfg = config(&[]).unwrap();
        assert_eq!(cfg.port, 8083);
        assert!(cfg.database_url.is_none());
        assert_eq!(cfg.pricing, Pricing::default());
    }

    #[test]
    fn test_overrides() {
        let cfg = config(&[
            ("PORT", "9000"), ("COUPONS", "BULK10:10"), ("TAX_REDUCED_KEYWORDS", "Cement, Bricks"),
            ("SHIPPING_CHARGE", "99"), ("FREE_SHIPPING_ABOVE", "5000"),
        ]).unwrap();
        assert_eq!(cfg.port, 9000);
        assert!(cfg.pricing.coupons.evaluate("FIRST25", Money::from_units(10)).is_err());
        assert_eq!(cfg.pricing.tax.family_of("Bricks - Red", None), crate::domain::aggregates::TaxFamily::Reduced);
        assert_eq!(cfg.pricing.shipping.free_above, Some(Money::from_units(5000)));
    }

    #[test]
    fn test_malformed_values_fail() {
        assert!(config(&[("PORT", "eighty")]).is_err());
        assert!(config(&[("TAX_RATE_STANDARD", "180")]).is_err());
        assert!(config(&[("SHIPPING_CHARGE", "-1")]).is_err());
    }
}
