//! Cart mutations on behalf of one shopper.
//!
//! Each call is load → mutate → store against the [`CartStore`](crate::store::CartStore);
//! a failed store write leaves the persisted cart as it was.

use serde::Deserialize;
use tracing::debug;

use crate::domain::aggregates::{Cart, CartLine};
use crate::domain::value_objects::CartKey;
use crate::store::Stores;
use crate::{Result, StorefrontError};

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddItemRequest {
    pub product_id: String,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub quantity: Option<u32>,
    #[serde(default)]
    pub color_image: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetQuantityRequest {
    pub product_id: String,
    #[serde(default)]
    pub color: Option<String>,
    pub quantity: u32,
}

#[derive(Clone)]
pub struct CartService {
    stores: Stores,
}

impl CartService {
    pub fn new(stores: Stores) -> Self { Self { stores } }

    pub async fn lines(&self, user_id: &str) -> Result<Vec<CartLine>> {
        Ok(self.stores.carts.get(user_id).await?.without_empty_lines().lines())
    }

    /// Adds to the cart after checking the product exists and offers the colour.
    /// The line is keyed by the catalog's spelling of the colour.
    pub async fn add_item(&self, user_id: &str, req: AddItemRequest) -> Result<Vec<CartLine>> {
        let requested = CartKey::new(req.product_id, req.color)?;
        let product = self
            .stores
            .catalog
            .find(requested.product_id())
            .await?
            .ok_or_else(|| StorefrontError::ProductNotFound(requested.product_id().to_string()))?;
        let key = match requested.variant() {
            Some(color) => {
                let offered = product.colors.matching(color).ok_or_else(|| {
                    StorefrontError::Validation(format!("{} is not offered in {color}", product.name))
                })?;
                CartKey::new(product.id, Some(offered))?
            }
            None => requested,
        };
        self.mutate(user_id, |cart| cart.add(key, req.quantity.unwrap_or(1), req.color_image).map(|_| ())).await
    }

    pub async fn set_quantity(&self, user_id: &str, req: SetQuantityRequest) -> Result<Vec<CartLine>> {
        let key = CartKey::new(req.product_id, req.color)?;
        self.mutate(user_id, |cart| {
            if req.quantity > 0 && cart.get(&key).is_none() {
                return Err(StorefrontError::ItemNotInCart(key.encode()));
            }
            cart.set_quantity(key, req.quantity).map(|_| ())
        })
        .await
    }

    /// One more unit of an existing line.
    pub async fn increment(&self, user_id: &str, encoded_key: &str) -> Result<Vec<CartLine>> {
        let key = CartKey::decode(encoded_key)?;
        self.mutate(user_id, |cart| cart.increment(&key).map(|_| ())).await
    }

    /// One unit fewer; the line goes away at zero.
    pub async fn decrement(&self, user_id: &str, encoded_key: &str) -> Result<Vec<CartLine>> {
        let key = CartKey::decode(encoded_key)?;
        self.mutate(user_id, |cart| cart.decrement(&key).map(|_| ())).await
    }

    /// Removes by composite key, as rendered in [`CartLine::key`].
    pub async fn remove_item(&self, user_id: &str, encoded_key: &str) -> Result<Vec<CartLine>> {
        let key = CartKey::decode(encoded_key)?;
        self.mutate(user_id, |cart| cart.remove(&key)).await
    }

    async fn mutate<F>(&self, user_id: &str, f: F) -> Result<Vec<CartLine>>
    where
        F: FnOnce(&mut Cart) -> Result<()>,
    {
        let mut cart = self.stores.carts.get(user_id).await?.without_empty_lines();
        f(&mut cart)?;
        self.stores.carts.set(user_id, &cart).await?;
        debug!(user_id, lines = cart.len(), "cart updated");
        Ok(cart.lines())
    }
}
