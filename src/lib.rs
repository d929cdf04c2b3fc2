//! BuildMart Storefront
//!
//! Cart, pricing and checkout backend for a building-materials store.
//!
//! ## Features
//! - Per-user carts keyed by product and colour variant
//! - Coupon discounts and a two-family GST split
//! - Checkout that takes ordered lines out of the cart only once the order is acknowledged
//! - Postgres and in-memory collaborators behind one set of traits

use thiserror::Error;

pub mod cart;
pub mod checkout;
pub mod config;
pub mod domain;
pub mod events;
pub mod pricing;
pub mod routes;
pub mod store;

pub use checkout::{CheckoutRequest, CheckoutService};
pub use config::AppConfig;
pub use pricing::{PriceBreakdown, Pricing};

// =============================================================================
// Error Types
// =============================================================================

#[derive(Error, Debug)]
pub enum StorefrontError {
    #[error("Invalid cart key: {0}")]
    InvalidKey(String),

    #[error("Invalid coupon code: {0}")]
    InvalidCoupon(String),

    #[error("Invalid quantity: {0}")]
    InvalidQuantity(u32),

    #[error("Item not in cart: {0}")]
    ItemNotInCart(String),

    #[error("Please select a delivery address")]
    MissingAddress,

    #[error("Address not found: {0}")]
    AddressNotFound(String),

    #[error("Your cart is empty")]
    EmptyCart,

    #[error("Product not found: {0}")]
    ProductNotFound(String),

    #[error("Order not found: {0}")]
    OrderNotFound(String),

    #[error("A checkout is already in progress for this user")]
    CheckoutInProgress,

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Collaborator failure: {0}")]
    CollaboratorFailure(String),
}

impl From<sqlx::Error> for StorefrontError {
    fn from(e: sqlx::Error) -> Self { StorefrontError::CollaboratorFailure(e.to_string()) }
}

impl From<serde_json::Error> for StorefrontError {
    fn from(e: serde_json::Error) -> Self { StorefrontError::CollaboratorFailure(e.to_string()) }
}

impl From<validator::ValidationErrors> for StorefrontError {
    fn from(e: validator::ValidationErrors) -> Self { StorefrontError::Validation(e.to_string()) }
}

pub type Result<T> = std::result::Result<T, StorefrontError>;
