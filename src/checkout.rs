//! Checkout: turns a shopper's cart into a persisted order.
//!
//! Ordered lines leave the cart only after the order sink acknowledges the
//! order, and a shopper can have at most one checkout in flight.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use tracing::{info, instrument, warn};

use crate::domain::aggregates::{Cart, NewOrder, OrderItem, OrderReceipt, PaymentMethod};
use crate::domain::events::DomainEvent;
use crate::events::EventPublisher;
use crate::pricing::{PriceBreakdown, PricedLine, Pricing};
use crate::store::Stores;
use crate::{Result, StorefrontError};

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutRequest {
    #[serde(default)]
    pub address_id: Option<String>,
    pub payment_method: PaymentMethod,
    #[serde(default)]
    pub coupon_code: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlacedOrder {
    #[serde(flatten)]
    pub receipt: OrderReceipt,
    pub breakdown: PriceBreakdown,
}

#[derive(Clone)]
pub struct CheckoutService {
    stores: Stores,
    pricing: Arc<Pricing>,
    events: EventPublisher,
    in_flight: Arc<Mutex<HashSet<String>>>,
}

/// Releases the shopper's checkout slot on drop.
struct InFlightGuard {
    users: Arc<Mutex<HashSet<String>>>,
    user_id: String,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        if let Ok(mut users) = self.users.lock() {
            users.remove(&self.user_id);
        }
    }
}

impl CheckoutService {
    pub fn new(stores: Stores, pricing: Pricing, events: EventPublisher) -> Self {
        Self { stores, pricing: Arc::new(pricing), events, in_flight: Arc::default() }
    }

    /// Joins each cart line with its catalog entry.
    pub async fn priced_lines(&self, cart: &Cart) -> Result<Vec<PricedLine>> {
        let mut lines = Vec::with_capacity(cart.len());
        for (key, entry) in cart.entries().filter(|(_, e)| e.quantity > 0) {
            let product = self
                .stores
                .catalog
                .find(key.product_id())
                .await?
                .ok_or_else(|| StorefrontError::ProductNotFound(key.product_id().to_string()))?;
            lines.push(PricedLine::from_cart(key, entry, &product));
        }
        Ok(lines)
    }

    /// Prices the shopper's current cart. Unknown coupons fail with `InvalidCoupon`.
    pub async fn quote(&self, user_id: &str, coupon_code: Option<&str>) -> Result<PriceBreakdown> {
        let cart = self.stores.carts.get(user_id).await?;
        let lines = self.priced_lines(&cart).await?;
        self.pricing.quote(&lines, coupon_code)
    }

    #[instrument(skip(self, request), fields(payment_method = request.payment_method.as_str()))]
    pub async fn place_order(&self, user_id: &str, request: CheckoutRequest) -> Result<PlacedOrder> {
        let address_id = request
            .address_id
            .filter(|id| !id.trim().is_empty())
            .ok_or(StorefrontError::MissingAddress)?;
        let _guard = self.claim(user_id)?;

        let cart = self.stores.carts.get(user_id).await?.without_empty_lines();
        if cart.is_empty() {
            return Err(StorefrontError::EmptyCart);
        }

        let addresses = self.stores.addresses.list(user_id).await?;
        if !addresses.iter().any(|a| a.id == address_id) {
            return Err(StorefrontError::AddressNotFound(address_id));
        }

        let lines = self.priced_lines(&cart).await?;
        let breakdown = match self.pricing.quote(&lines, request.coupon_code.as_deref()) {
            Err(StorefrontError::InvalidCoupon(code)) => {
                warn!(user_id, code = %code, "ignoring invalid coupon at checkout");
                self.pricing.quote(&lines, None)?
            }
            other => other?,
        };

        let order = NewOrder {
            user_id: user_id.to_string(),
            address_id,
            items: lines
                .iter()
                .map(|l| OrderItem { product_id: l.product_id.clone(), quantity: l.quantity, color: l.color.clone() })
                .collect(),
            payment_method: request.payment_method,
            coupon_code: breakdown.coupon.as_ref().map(|c| c.code.clone()),
            breakdown: breakdown.clone(),
        };
        let receipt = self.stores.orders.create(order).await?;
        info!(user_id, order_id = %receipt.order_id, custom_order_id = %receipt.custom_order_id, amount = %receipt.amount, "order placed");

        self.events
            .publish(&DomainEvent::OrderPlaced {
                order_id: receipt.order_id,
                custom_order_id: receipt.custom_order_id.clone(),
                user_id: user_id.to_string(),
                amount: receipt.amount,
            })
            .await;

        // The order is committed; a failed cart update must not be reported as a failed checkout.
        match self.remove_ordered(user_id, &cart).await {
            Ok(()) => self.events.publish(&DomainEvent::CartCleared { user_id: user_id.to_string() }).await,
            Err(e) => warn!(user_id, error = %e, "order placed but cart could not be cleared"),
        }

        Ok(PlacedOrder { receipt, breakdown })
    }

    /// Re-reads the cart so lines added while the order was being created survive.
    async fn remove_ordered(&self, user_id: &str, ordered: &Cart) -> Result<()> {
        let mut current = self.stores.carts.get(user_id).await?.without_empty_lines();
        current.subtract(ordered);
        self.stores.carts.set(user_id, &current).await
    }

    fn claim(&self, user_id: &str) -> Result<InFlightGuard> {
        let mut users = self
            .in_flight
            .lock()
            .map_err(|_| StorefrontError::CollaboratorFailure("checkout guard poisoned".into()))?;
        if !users.insert(user_id.to_string()) {
            return Err(StorefrontError::CheckoutInProgress);
        }
        Ok(InFlightGuard { users: self.in_flight.clone(), user_id: user_id.to_string() })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::aggregates::{Colors, NewAddress, Order, Product};
    use crate::domain::value_objects::{CartKey, Money};
    use crate::store::memory::MemoryStore;
    use crate::store::{CartStore, OrderSink};
    use async_trait::async_trait;
    use uuid::Uuid;

    /// Order sink that lets the shopper keep shopping while the order is created.
    struct ShopperKeepsShopping {
        store: Arc<MemoryStore>,
    }

    #[async_trait]
    impl OrderSink for ShopperKeepsShopping {
        async fn create(&self, order: NewOrder) -> Result<OrderReceipt> {
            let mut cart = self.store.get("u1").await?;
            cart.add(CartKey::new("tap7", None)?, 3, None)?;
            cart.add(CartKey::new("vinyl1", Some("Oak".into()))?, 1, None)?;
            self.store.set("u1", &cart).await?;
            self.store.create(order).await
        }

        async fn find(&self, order_id: Uuid) -> Result<Option<Order>> {
            OrderSink::find(self.store.as_ref(), order_id).await
        }
    }

    async fn setup() -> (Arc<MemoryStore>, CheckoutService, String) {
        let store = Arc::new(MemoryStore::new());
        store.insert_product(Product {
            id: "vinyl1".into(), name: "Vinyl Plank".into(), price: Money::from_units(450),
            offer_price: Some(Money::from_units(400)), category: "Floorings - Vinyl".into(),
            colors: Colors::List(vec!["Oak".into()]), tax_class: None,
        }).await;
        let stores = Stores::in_memory(store.clone());
        let address = stores.addresses.add("u1", NewAddress {
            full_name: "A".into(), area: "B".into(), city: "Pune".into(), state: "MH".into(),
            pincode: "411001".into(), phone_number: "9999999999".into(),
        }).await.unwrap();
        let mut cart = Cart::new();
        cart.add(CartKey::new("vinyl1", Some("Oak".into())).unwrap(), 2, None).unwrap();
        stores.carts.set("u1", &cart).await.unwrap();
        (store, CheckoutService::new(stores, Pricing::default(), EventPublisher::disabled()), address.id)
    }

    fn request(address_id: Option<String>) -> CheckoutRequest {
        CheckoutRequest { address_id, payment_method: PaymentMethod::CashOnDelivery, coupon_code: None }
    }

    #[tokio::test]
    async fn test_missing_address_makes_no_calls() {
        let (store, service, _) = setup().await;
        let before = store.call_count();
        let err = service.place_order("u1", request(None)).await.unwrap_err();
        assert!(matches!(err, StorefrontError::MissingAddress));
        assert_eq!(store.call_count(), before);
    }

    #[tokio::test]
    async fn test_place_order_clears_cart() {
        let (store, service, address_id) = setup().await;
        let placed = service.place_order("u1", request(Some(address_id))).await.unwrap();
        assert_eq!(placed.breakdown.subtotal, Money::from_units(800));
        assert_eq!(placed.breakdown.tax, Money::from_units(144));
        assert_eq!(placed.receipt.amount, Money::from_units(944));
        assert_eq!(store.order_count().await, 1);
        assert!(service.quote("u1", None).await.unwrap().subtotal == Money::ZERO);
    }

    #[tokio::test]
    async fn test_lines_added_during_checkout_stay_in_cart() {
        let (store, _, address_id) = setup().await;
        let mut stores = Stores::in_memory(store.clone());
        stores.orders = Arc::new(ShopperKeepsShopping { store: store.clone() });
        let service = CheckoutService::new(stores, Pricing::default(), EventPublisher::disabled());

        let placed = service.place_order("u1", request(Some(address_id))).await.unwrap();
        assert_eq!(placed.receipt.amount, Money::from_units(944));

        let cart = store.get("u1").await.unwrap();
        assert_eq!(cart.len(), 2);
        assert_eq!(cart.get(&CartKey::new("tap7", None).unwrap()).unwrap().quantity, 3);
        assert_eq!(cart.get(&CartKey::new("vinyl1", Some("Oak".into())).unwrap()).unwrap().quantity, 1);
    }

    #[tokio::test]
    async fn test_guard_released_after_failure() {
        let (store, service, address_id) = setup().await;
        store.fail_orders(true);
        assert!(service.place_order("u1", request(Some(address_id.clone()))).await.is_err());
        store.fail_orders(false);
        assert!(service.place_order("u1", request(Some(address_id))).await.is_ok());
    }

    #[test]
    fn test_second_claim_rejected() {
        let service = CheckoutService::new(
            Stores::in_memory(Arc::new(MemoryStore::new())), Pricing::default(), EventPublisher::disabled(),
        );
        let _first = service.claim("u1").unwrap();
        assert!(matches!(service.claim("u1"), Err(StorefrontError::CheckoutInProgress)));
        assert!(service.claim("u2").is_ok());
    }
}
