//! In-memory collaborators for tests and local development.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{AddressBook, CartStore, OrderSink, ProductCatalog};
use crate::domain::aggregates::order::custom_order_id;
use crate::domain::aggregates::{Address, Cart, NewAddress, NewOrder, Order, OrderReceipt, Product};
use crate::{Result, StorefrontError};

#[derive(Default)]
struct Inner {
    carts: HashMap<String, Cart>,
    products: HashMap<String, Product>,
    addresses: HashMap<String, Vec<Address>>,
    orders: HashMap<Uuid, Order>,
}

#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
    calls: AtomicUsize,
    fail_orders: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self { Self::default() }

    pub async fn insert_product(&self, product: Product) {
        self.inner.write().await.products.insert(product.id.clone(), product);
    }

    /// Makes every subsequent order creation fail, as if the sink were unreachable.
    pub fn fail_orders(&self, fail: bool) { self.fail_orders.store(fail, Ordering::SeqCst); }

    /// Number of collaborator calls served so far.
    pub fn call_count(&self) -> usize { self.calls.load(Ordering::SeqCst) }

    pub async fn order_count(&self) -> usize { self.inner.read().await.orders.len() }

    fn record_call(&self) { self.calls.fetch_add(1, Ordering::SeqCst); }
}

#[async_trait]
impl CartStore for MemoryStore {
    async fn get(&self, user_id: &str) -> Result<Cart> {
        self.record_call();
        Ok(self.inner.read().await.carts.get(user_id).cloned().unwrap_or_default())
    }

    async fn set(&self, user_id: &str, cart: &Cart) -> Result<()> {
        self.record_call();
        self.inner.write().await.carts.insert(user_id.to_string(), cart.clone());
        Ok(())
    }
}

#[async_trait]
impl ProductCatalog for MemoryStore {
    async fn find(&self, product_id: &str) -> Result<Option<Product>> {
        self.record_call();
        Ok(self.inner.read().await.products.get(product_id).cloned())
    }
}

#[async_trait]
impl AddressBook for MemoryStore {
    async fn list(&self, user_id: &str) -> Result<Vec<Address>> {
        self.record_call();
        Ok(self.inner.read().await.addresses.get(user_id).cloned().unwrap_or_default())
    }

    async fn add(&self, user_id: &str, address: NewAddress) -> Result<Address> {
        self.record_call();
        let address = address.into_address(Uuid::now_v7().to_string());
        self.inner.write().await.addresses.entry(user_id.to_string()).or_default().push(address.clone());
        Ok(address)
    }
}

#[async_trait]
impl OrderSink for MemoryStore {
    async fn create(&self, order: NewOrder) -> Result<OrderReceipt> {
        self.record_call();
        if self.fail_orders.load(Ordering::SeqCst) {
            return Err(StorefrontError::CollaboratorFailure("order service unavailable".into()));
        }
        let id = Uuid::now_v7();
        let now = Utc::now();
        let order = order.into_order(id, custom_order_id(&id, now), now);
        let receipt = OrderReceipt { order_id: id, custom_order_id: order.custom_order_id.clone(), amount: order.amount };
        self.inner.write().await.orders.insert(id, order);
        Ok(receipt)
    }

    async fn find(&self, order_id: Uuid) -> Result<Option<Order>> {
        self.record_call();
        Ok(self.inner.read().await.orders.get(&order_id).cloned())
    }
}
