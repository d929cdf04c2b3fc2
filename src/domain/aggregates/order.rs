//! Order Aggregate

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::domain::value_objects::Money;
use crate::pricing::PriceBreakdown;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: Uuid,
    pub custom_order_id: String,
    pub user_id: String,
    pub address_id: String,
    pub items: Vec<OrderItem>,
    pub subtotal: Money,
    pub discount: Money,
    pub tax: Money,
    pub delivery_charges: Money,
    pub amount: Money,
    pub payment_method: PaymentMethod,
    pub coupon_code: Option<String>,
    pub status: OrderStatus,
    pub payment_status: PaymentStatus,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem { pub product_id: String, pub quantity: u32, pub color: Option<String> }

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    pub id: String,
    pub full_name: String,
    pub area: String,
    pub city: String,
    pub state: String,
    pub pincode: String,
    pub phone_number: String,
}

/// Address as submitted by the shopper, before the address book assigns an id.
#[derive(Clone, Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NewAddress {
    #[validate(length(min = 1, max = 120))]
    pub full_name: String,
    #[validate(length(min = 1, max = 200))]
    pub area: String,
    #[validate(length(min = 1, max = 80))]
    pub city: String,
    #[validate(length(min = 1, max = 80))]
    pub state: String,
    #[validate(length(equal = 6), custom = "all_digits")]
    pub pincode: String,
    #[validate(length(equal = 10), custom = "all_digits")]
    pub phone_number: String,
}

fn all_digits(value: &str) -> Result<(), validator::ValidationError> {
    if value.chars().all(|c| c.is_ascii_digit()) { Ok(()) } else { Err(validator::ValidationError::new("digits")) }
}

impl NewAddress {
    pub fn into_address(self, id: impl Into<String>) -> Address {
        Address {
            id: id.into(), full_name: self.full_name, area: self.area, city: self.city,
            state: self.state, pincode: self.pincode, phone_number: self.phone_number,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus { #[default] Pending, Confirmed, Shipped, Delivered, Cancelled }

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus { #[default] Pending, Paid, Failed }

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentMethod {
    #[serde(rename = "COD")]
    CashOnDelivery,
    Online,
}

macro_rules! str_enum {
    ($ty:ty { $($variant:ident => $s:literal),+ $(,)? }) => {
        impl $ty {
            pub fn as_str(&self) -> &'static str { match self { $(Self::$variant => $s),+ } }
            pub fn parse(s: &str) -> Option<Self> { match s { $($s => Some(Self::$variant),)+ _ => None } }
        }
    };
}

str_enum!(OrderStatus { Pending => "PENDING", Confirmed => "CONFIRMED", Shipped => "SHIPPED", Delivered => "DELIVERED", Cancelled => "CANCELLED" });
str_enum!(PaymentStatus { Pending => "PENDING", Paid => "PAID", Failed => "FAILED" });
str_enum!(PaymentMethod { CashOnDelivery => "COD", Online => "ONLINE" });

/// Order-creation request handed to the order sink.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewOrder {
    pub user_id: String,
    pub address_id: String,
    pub items: Vec<OrderItem>,
    pub payment_method: PaymentMethod,
    pub coupon_code: Option<String>,
    pub breakdown: PriceBreakdown,
}

impl NewOrder {
    /// Materialises the persisted document. New orders always start pending.
    pub fn into_order(self, id: Uuid, custom_order_id: String, created_at: DateTime<Utc>) -> Order {
        Order {
            id, custom_order_id, user_id: self.user_id, address_id: self.address_id, items: self.items,
            subtotal: self.breakdown.subtotal, discount: self.breakdown.discount, tax: self.breakdown.tax,
            delivery_charges: self.breakdown.shipping, amount: self.breakdown.total,
            payment_method: self.payment_method, coupon_code: self.coupon_code,
            status: OrderStatus::Pending, payment_status: PaymentStatus::Pending, created_at,
        }
    }
}

const CUSTOM_ID_SUFFIX_LEN: usize = 10;

/// Order sink acknowledgement.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderReceipt { pub order_id: Uuid, pub custom_order_id: String, pub amount: Money }

/// Human-facing order number, e.g. `BM-20260114-3F9A1C07D2`.
///
/// The suffix is the tail of the UUID v7, which is its random part.
pub fn custom_order_id(id: &Uuid, created_at: DateTime<Utc>) -> String {
    let simple = id.simple().to_string();
    let suffix = simple[simple.len() - CUSTOM_ID_SUFFIX_LEN..].to_uppercase();
    format!("BM-{}-{}", created_at.format("%Y%m%d"), suffix)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_strings() {
        assert_eq!(OrderStatus::default().as_str(), "PENDING");
        assert_eq!(PaymentMethod::parse("COD"), Some(PaymentMethod::CashOnDelivery));
        assert_eq!(serde_json::to_string(&PaymentMethod::CashOnDelivery).unwrap(), "\"COD\"");
        assert_eq!(serde_json::to_string(&PaymentMethod::Online).unwrap(), "\"ONLINE\"");
    }

    #[test]
    fn test_address_validation() {
        let mut addr = NewAddress {
            full_name: "R. Iyer".into(), area: "Anna Nagar".into(), city: "Chennai".into(),
            state: "Tamil Nadu".into(), pincode: "600040".into(), phone_number: "9876543210".into(),
        };
        assert!(addr.validate().is_ok());
        addr.pincode = "60A040".into();
        assert!(addr.validate().is_err());
    }

    #[test]
    fn test_custom_order_id_shape() {
        let id = Uuid::now_v7();
        let code = custom_order_id(&id, Utc::now());
        assert!(code.starts_with("BM-"));
        assert_eq!(code.len(), "BM-YYYYMMDD-".len() + CUSTOM_ID_SUFFIX_LEN);
        assert!(id.simple().to_string().to_uppercase().ends_with(&code[code.len() - CUSTOM_ID_SUFFIX_LEN..]));
    }

    #[test]
    fn test_custom_order_ids_distinct_within_a_day() {
        let now = Utc::now();
        let codes: std::collections::HashSet<String> =
            (0..5000).map(|_| custom_order_id(&Uuid::now_v7(), now)).collect();
        assert_eq!(codes.len(), 5000);
    }
}
