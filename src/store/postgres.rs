//! Postgres-backed collaborators.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::types::Json;
use sqlx::PgPool;
use uuid::Uuid;

use super::{AddressBook, CartStore, OrderSink, ProductCatalog};
use crate::domain::aggregates::order::custom_order_id;
use crate::domain::aggregates::{
    Address, Cart, Colors, NewAddress, NewOrder, Order, OrderItem, OrderReceipt, OrderStatus, PaymentMethod,
    PaymentStatus, Product, TaxFamily,
};
use crate::domain::value_objects::Money;
use crate::{Result, StorefrontError};

#[derive(Clone)]
pub struct PgStore {
    db: PgPool,
}

impl PgStore {
    pub fn new(db: PgPool) -> Self { Self { db } }
}

#[derive(Debug, sqlx::FromRow)]
struct ProductRow {
    id: String, name: String, price: Decimal, offer_price: Option<Decimal>,
    category: String, colors: Vec<String>, tax_class: Option<String>,
}

impl From<ProductRow> for Product {
    fn from(r: ProductRow) -> Self {
        Product {
            id: r.id, name: r.name, price: Money::new(r.price), offer_price: r.offer_price.map(Money::new),
            category: r.category, colors: Colors::List(r.colors),
            tax_class: r.tax_class.as_deref().and_then(TaxFamily::parse),
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct AddressRow { id: Uuid, full_name: String, area: String, city: String, state: String, pincode: String, phone_number: String }

impl From<AddressRow> for Address {
    fn from(r: AddressRow) -> Self {
        Address {
            id: r.id.to_string(), full_name: r.full_name, area: r.area, city: r.city,
            state: r.state, pincode: r.pincode, phone_number: r.phone_number,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct OrderRow {
    id: Uuid, custom_order_id: String, user_id: String, address_id: String,
    subtotal: Decimal, discount: Decimal, tax: Decimal, delivery_charges: Decimal, amount: Decimal,
    payment_method: String, coupon_code: Option<String>, status: String, payment_status: String,
    created_at: DateTime<Utc>,
}

#[derive(Debug, sqlx::FromRow)]
struct OrderItemRow { product_id: String, quantity: i32, color: Option<String> }

fn corrupt(what: &str, value: &str) -> StorefrontError {
    StorefrontError::CollaboratorFailure(format!("unrecognised {what} {value:?} in orders table"))
}

impl OrderRow {
    fn into_order(self, items: Vec<OrderItemRow>) -> Result<Order> {
        let items = items
            .into_iter()
            .map(|i| -> Result<OrderItem> {
                let quantity = u32::try_from(i.quantity).map_err(|_| corrupt("quantity", &i.quantity.to_string()))?;
                Ok(OrderItem { product_id: i.product_id, quantity, color: i.color })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Order {
            payment_method: PaymentMethod::parse(&self.payment_method).ok_or_else(|| corrupt("payment method", &self.payment_method))?,
            status: OrderStatus::parse(&self.status).ok_or_else(|| corrupt("status", &self.status))?,
            payment_status: PaymentStatus::parse(&self.payment_status).ok_or_else(|| corrupt("payment status", &self.payment_status))?,
            id: self.id, custom_order_id: self.custom_order_id, user_id: self.user_id, address_id: self.address_id, items,
            subtotal: Money::new(self.subtotal), discount: Money::new(self.discount), tax: Money::new(self.tax),
            delivery_charges: Money::new(self.delivery_charges), amount: Money::new(self.amount),
            coupon_code: self.coupon_code, created_at: self.created_at,
        })
    }
}

#[async_trait]
impl CartStore for PgStore {
    async fn get(&self, user_id: &str) -> Result<Cart> {
        let row: Option<(Json<Cart>,)> = sqlx::query_as("SELECT cart FROM users WHERE id = $1")
            .bind(user_id).fetch_optional(&self.db).await?;
        Ok(row.map(|(cart,)| cart.0).unwrap_or_default())
    }

    async fn set(&self, user_id: &str, cart: &Cart) -> Result<()> {
        sqlx::query("INSERT INTO users (id, cart, created_at, updated_at) VALUES ($1, $2, NOW(), NOW()) ON CONFLICT (id) DO UPDATE SET cart = EXCLUDED.cart, updated_at = NOW()")
            .bind(user_id).bind(Json(cart)).execute(&self.db).await?;
        Ok(())
    }
}

#[async_trait]
impl ProductCatalog for PgStore {
    async fn find(&self, product_id: &str) -> Result<Option<Product>> {
        let row = sqlx::query_as::<_, ProductRow>("SELECT id, name, price, offer_price, category, colors, tax_class FROM products WHERE id = $1 AND status = 'active'")
            .bind(product_id).fetch_optional(&self.db).await?;
        Ok(row.map(Product::from))
    }
}

#[async_trait]
impl AddressBook for PgStore {
    async fn list(&self, user_id: &str) -> Result<Vec<Address>> {
        let rows = sqlx::query_as::<_, AddressRow>("SELECT id, full_name, area, city, state, pincode, phone_number FROM addresses WHERE user_id = $1 ORDER BY created_at")
            .bind(user_id).fetch_all(&self.db).await?;
        Ok(rows.into_iter().map(Address::from).collect())
    }

    async fn add(&self, user_id: &str, a: NewAddress) -> Result<Address> {
        let row = sqlx::query_as::<_, AddressRow>("INSERT INTO addresses (id, user_id, full_name, area, city, state, pincode, phone_number, created_at) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, NOW()) RETURNING id, full_name, area, city, state, pincode, phone_number")
            .bind(Uuid::now_v7()).bind(user_id).bind(&a.full_name).bind(&a.area).bind(&a.city).bind(&a.state).bind(&a.pincode).bind(&a.phone_number)
            .fetch_one(&self.db).await?;
        Ok(row.into())
    }
}

#[async_trait]
impl OrderSink for PgStore {
    async fn create(&self, order: NewOrder) -> Result<OrderReceipt> {
        let id = Uuid::now_v7();
        let now = Utc::now();
        let order = order.into_order(id, custom_order_id(&id, now), now);

        let mut tx = self.db.begin().await?;
        sqlx::query("INSERT INTO orders (id, custom_order_id, user_id, address_id, subtotal, discount, tax, delivery_charges, amount, payment_method, coupon_code, status, payment_status, created_at) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)")
            .bind(order.id).bind(&order.custom_order_id).bind(&order.user_id).bind(&order.address_id)
            .bind(order.subtotal.amount()).bind(order.discount.amount()).bind(order.tax.amount())
            .bind(order.delivery_charges.amount()).bind(order.amount.amount())
            .bind(order.payment_method.as_str()).bind(&order.coupon_code)
            .bind(order.status.as_str()).bind(order.payment_status.as_str()).bind(order.created_at)
            .execute(&mut *tx).await?;
        for item in &order.items {
            let quantity = i32::try_from(item.quantity).map_err(|_| StorefrontError::InvalidQuantity(item.quantity))?;
            sqlx::query("INSERT INTO order_items (id, order_id, product_id, quantity, color) VALUES ($1, $2, $3, $4, $5)")
                .bind(Uuid::now_v7()).bind(order.id).bind(&item.product_id).bind(quantity).bind(&item.color)
                .execute(&mut *tx).await?;
        }
        tx.commit().await?;

        Ok(OrderReceipt { order_id: order.id, custom_order_id: order.custom_order_id, amount: order.amount })
    }

    async fn find(&self, order_id: Uuid) -> Result<Option<Order>> {
        let Some(row) = sqlx::query_as::<_, OrderRow>("SELECT * FROM orders WHERE id = $1").bind(order_id).fetch_optional(&self.db).await? else {
            return Ok(None);
        };
        let items = sqlx::query_as::<_, OrderItemRow>("SELECT product_id, quantity, color FROM order_items WHERE order_id = $1 ORDER BY id")
            .bind(order_id).fetch_all(&self.db).await?;
        row.into_order(items).map(Some)
    }
}
