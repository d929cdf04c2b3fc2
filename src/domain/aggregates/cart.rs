//! Cart Aggregate

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::domain::value_objects::CartKey;
use crate::{Result, StorefrontError};

/// Upper bound on a single line's quantity.
pub const MAX_QUANTITY_PER_LINE: u32 = 9999;

/// One shopper's cart, keyed by product and colour variant.
///
/// Serialises as a JSON object keyed by composite cart keys, which is how it is
/// embedded in the user record.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cart {
    entries: BTreeMap<CartKey, CartEntry>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartEntry {
    pub quantity: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color_image: Option<String>,
}

/// Flattened view of a cart entry, as returned to clients.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLine {
    pub key: String,
    pub product_id: String,
    pub color: Option<String>,
    pub quantity: u32,
    pub color_image: Option<String>,
}

impl Cart {
    pub fn new() -> Self { Self::default() }

    pub fn is_empty(&self) -> bool { self.entries.is_empty() }
    pub fn len(&self) -> usize { self.entries.len() }
    pub fn get(&self, key: &CartKey) -> Option<&CartEntry> { self.entries.get(key) }
    pub fn entries(&self) -> impl Iterator<Item = (&CartKey, &CartEntry)> { self.entries.iter() }

    pub fn lines(&self) -> Vec<CartLine> {
        self.entries
            .iter()
            .map(|(key, entry)| CartLine {
                key: key.encode(),
                product_id: key.product_id().to_string(),
                color: key.variant().map(str::to_string),
                quantity: entry.quantity,
                color_image: entry.color_image.clone(),
            })
            .collect()
    }

    /// Adds `quantity` units, merging with an existing line for the same key.
    pub fn add(&mut self, key: CartKey, quantity: u32, color_image: Option<String>) -> Result<u32> {
        if quantity == 0 { return Err(StorefrontError::InvalidQuantity(0)); }
        let current = self.entries.get(&key).map_or(0, |e| e.quantity);
        let next = current.checked_add(quantity).filter(|q| *q <= MAX_QUANTITY_PER_LINE)
            .ok_or(StorefrontError::InvalidQuantity(current.saturating_add(quantity)))?;
        let entry = self.entries.entry(key).or_insert(CartEntry { quantity: 0, color_image: None });
        entry.quantity = next;
        if color_image.is_some() { entry.color_image = color_image; }
        Ok(next)
    }

    pub fn increment(&mut self, key: &CartKey) -> Result<u32> {
        let current = self.quantity_of(key)?;
        if current >= MAX_QUANTITY_PER_LINE {
            return Err(StorefrontError::InvalidQuantity(current.saturating_add(1)));
        }
        self.set_quantity(key.clone(), current + 1)
    }

    /// Removes the line once it reaches zero.
    pub fn decrement(&mut self, key: &CartKey) -> Result<u32> {
        let current = self.quantity_of(key)?;
        self.set_quantity(key.clone(), current.saturating_sub(1))
    }

    /// Sets an absolute quantity; zero removes the line.
    pub fn set_quantity(&mut self, key: CartKey, quantity: u32) -> Result<u32> {
        if quantity > MAX_QUANTITY_PER_LINE { return Err(StorefrontError::InvalidQuantity(quantity)); }
        if quantity == 0 {
            self.entries.remove(&key);
        } else {
            self.entries.entry(key).or_insert(CartEntry { quantity: 0, color_image: None }).quantity = quantity;
        }
        Ok(quantity)
    }

    pub fn remove(&mut self, key: &CartKey) -> Result<()> {
        self.entries.remove(key).map(|_| ()).ok_or_else(|| StorefrontError::ItemNotInCart(key.encode()))
    }

    /// Takes an ordered snapshot out of the cart. Lines added after the snapshot
    /// are kept, and a line topped up since keeps the extra units.
    pub fn subtract(&mut self, ordered: &Cart) {
        for (key, taken) in &ordered.entries {
            if let Some(entry) = self.entries.get_mut(key) {
                entry.quantity = entry.quantity.saturating_sub(taken.quantity);
                if entry.quantity == 0 {
                    self.entries.remove(key);
                }
            }
        }
    }

    fn quantity_of(&self, key: &CartKey) -> Result<u32> {
        self.entries.get(key).map(|e| e.quantity).ok_or_else(|| StorefrontError::ItemNotInCart(key.encode()))
    }

    /// Drops zero-quantity entries that may have been persisted by older writers.
    pub fn without_empty_lines(mut self) -> Self {
        self.entries.retain(|_, e| e.quantity > 0);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(p: &str, c: Option<&str>) -> CartKey { CartKey::new(p, c.map(String::from)).unwrap() }

    #[test]
    fn test_cart_operations() {
        let mut cart = Cart::new();
        cart.add(key("P1", None), 2, None).unwrap();
        cart.add(key("P1", Some("Red")), 1, Some("https://img/red.png".into())).unwrap();
        assert_eq!(cart.len(), 2);
        cart.add(key("P1", None), 1, None).unwrap();
        assert_eq!(cart.get(&key("P1", None)).unwrap().quantity, 3); // Merged
        assert_eq!(cart.lines()[1].key, "P1_Red");
    }

    #[test]
    fn test_decrement_to_zero_removes() {
        let mut cart = Cart::new();
        let k = key("P2", Some("Oak"));
        cart.add(k.clone(), 1, None).unwrap();
        cart.increment(&k).unwrap();
        cart.decrement(&k).unwrap();
        cart.decrement(&k).unwrap();
        assert!(cart.is_empty());
        assert!(matches!(cart.decrement(&k), Err(StorefrontError::ItemNotInCart(_))));
    }

    #[test]
    fn test_quantity_limits() {
        let mut cart = Cart::new();
        assert!(cart.add(key("P3", None), 0, None).is_err());
        assert!(cart.set_quantity(key("P3", None), MAX_QUANTITY_PER_LINE + 1).is_err());
        cart.set_quantity(key("P3", None), MAX_QUANTITY_PER_LINE).unwrap();
        assert!(cart.add(key("P3", None), 1, None).is_err());
    }

    #[test]
    fn test_subtract_keeps_lines_added_later() {
        let mut ordered = Cart::new();
        ordered.add(key("P1", Some("Oak")), 2, None).unwrap();
        ordered.add(key("P2", None), 1, None).unwrap();

        let mut current = ordered.clone();
        current.add(key("P1", Some("Oak")), 3, None).unwrap();
        current.add(key("P9", None), 4, None).unwrap();
        current.subtract(&ordered);

        assert_eq!(current.len(), 2);
        assert_eq!(current.get(&key("P1", Some("Oak"))).unwrap().quantity, 3);
        assert_eq!(current.get(&key("P9", None)).unwrap().quantity, 4);
        assert!(current.get(&key("P2", None)).is_none());
    }

    #[test]
    fn test_embedded_document_shape() {
        let raw = r#"{"a1":{"quantity":2},"a1_Teak_Wood":{"quantity":1,"colorImage":"u"},"b2":{"quantity":0}}"#;
        let cart: Cart = serde_json::from_str(raw).unwrap();
        assert_eq!(cart.len(), 3);
        let cart = cart.without_empty_lines();
        assert_eq!(cart.len(), 2);
        assert_eq!(cart.get(&key("a1", Some("Teak_Wood"))).unwrap().color_image.as_deref(), Some("u"));
        let json = serde_json::to_value(&cart).unwrap();
        assert_eq!(json["a1"]["quantity"], 2);
    }
}
