//! Product Aggregate (catalog view, read-only to checkout)

use serde::{Deserialize, Serialize};

use crate::domain::value_objects::Money;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: String,
    pub name: String,
    pub price: Money,
    #[serde(default)]
    pub offer_price: Option<Money>,
    /// Display category, `"Main - Sub"`.
    pub category: String,
    #[serde(default)]
    pub colors: Colors,
    #[serde(default)]
    pub tax_class: Option<TaxFamily>,
}

/// Rate family a product is taxed under.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaxFamily {
    Reduced,
    Standard,
}

impl TaxFamily {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "reduced" => Some(Self::Reduced),
            "standard" => Some(Self::Standard),
            _ => None,
        }
    }
}

/// Colour options as stored by the catalog: either a list or one comma-delimited string.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Colors {
    List(Vec<String>),
    Delimited(String),
}

impl Default for Colors {
    fn default() -> Self { Self::List(vec![]) }
}

impl Colors {
    pub fn to_vec(&self) -> Vec<String> {
        let raw: Vec<&str> = match self {
            Self::List(items) => items.iter().map(String::as_str).collect(),
            Self::Delimited(s) => s.split(',').collect(),
        };
        raw.into_iter().map(str::trim).filter(|c| !c.is_empty()).map(str::to_string).collect()
    }

    /// The catalog's spelling of `color`, matched case-insensitively.
    pub fn matching(&self, color: &str) -> Option<String> {
        self.to_vec().into_iter().find(|c| c.eq_ignore_ascii_case(color.trim()))
    }
}

impl Product {
    /// Price actually charged per unit: the offer price when one is set, else list price.
    pub fn unit_price(&self) -> Money {
        match self.offer_price {
            Some(offer) if offer.is_positive() => offer,
            _ => self.price,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tile() -> Product {
        Product {
            id: "p1".into(), name: "Vinyl Plank".into(), price: Money::from_units(450),
            offer_price: Some(Money::from_units(400)), category: "Floorings - Vinyl".into(),
            colors: Colors::Delimited("Oak, Walnut ,".into()), tax_class: None,
        }
    }

    #[test]
    fn test_unit_price_prefers_offer() {
        let mut p = tile();
        assert_eq!(p.unit_price(), Money::from_units(400));
        p.offer_price = Some(Money::ZERO);
        assert_eq!(p.unit_price(), Money::from_units(450));
    }

    #[test]
    fn test_colors_parsing() {
        let p = tile();
        assert_eq!(p.colors.to_vec(), vec!["Oak", "Walnut"]);
        assert_eq!(p.colors.matching("walnut").as_deref(), Some("Walnut"));
        assert_eq!(p.colors.matching("Teak"), None);
        let listed: Product = serde_json::from_str(
            r#"{"id":"p2","name":"Tap","price":999,"category":"Sanitary - Taps","colors":["Chrome"]}"#,
        ).unwrap();
        assert_eq!(listed.colors.to_vec(), vec!["Chrome"]);
        assert_eq!(listed.offer_price, None);
    }
}
