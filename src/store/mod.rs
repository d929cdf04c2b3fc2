//! Collaborator contracts for carts, catalog, address book and orders.
//!
//! Checkout only talks to these traits. [`memory`] backs tests and local runs,
//! [`postgres`] is what the server uses.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use std::sync::Arc;
use uuid::Uuid;

use crate::domain::aggregates::{Address, Cart, NewAddress, NewOrder, Order, OrderReceipt, Product};
use crate::Result;

#[async_trait]
pub trait CartStore: Send + Sync {
    /// Unknown users have an empty cart.
    async fn get(&self, user_id: &str) -> Result<Cart>;
    async fn set(&self, user_id: &str, cart: &Cart) -> Result<()>;
}

#[async_trait]
pub trait ProductCatalog: Send + Sync {
    async fn find(&self, product_id: &str) -> Result<Option<Product>>;
}

#[async_trait]
pub trait AddressBook: Send + Sync {
    async fn list(&self, user_id: &str) -> Result<Vec<Address>>;
    async fn add(&self, user_id: &str, address: NewAddress) -> Result<Address>;
}

#[async_trait]
pub trait OrderSink: Send + Sync {
    async fn create(&self, order: NewOrder) -> Result<OrderReceipt>;
    async fn find(&self, order_id: Uuid) -> Result<Option<Order>>;
}

/// The four collaborators, shared across handlers.
#[derive(Clone)]
pub struct Stores {
    pub carts: Arc<dyn CartStore>,
    pub catalog: Arc<dyn ProductCatalog>,
    pub addresses: Arc<dyn AddressBook>,
    pub orders: Arc<dyn OrderSink>,
}

impl Stores {
    pub fn postgres(db: sqlx::PgPool) -> Self {
        let store = Arc::new(postgres::PgStore::new(db));
        Self { carts: store.clone(), catalog: store.clone(), addresses: store.clone(), orders: store }
    }

    pub fn in_memory(store: Arc<memory::MemoryStore>) -> Self {
        Self { carts: store.clone(), catalog: store.clone(), addresses: store.clone(), orders: store }
    }
}
