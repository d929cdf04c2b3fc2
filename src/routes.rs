//! HTTP surface.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get, post},
    Json, Router,
};
use serde::Deserialize;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use uuid::Uuid;
use validator::Validate;

use crate::cart::{AddItemRequest, CartService, SetQuantityRequest};
use crate::checkout::{CheckoutRequest, CheckoutService};
use crate::domain::aggregates::{Address, CartLine, NewAddress, Order, Product};
use crate::events::EventPublisher;
use crate::pricing::{PriceBreakdown, Pricing};
use crate::store::Stores;
use crate::StorefrontError;

#[derive(Clone)]
pub struct AppState {
    pub stores: Stores,
    pub carts: CartService,
    pub checkout: CheckoutService,
}

impl AppState {
    pub fn new(stores: Stores, pricing: Pricing, events: EventPublisher) -> Self {
        Self {
            carts: CartService::new(stores.clone()),
            checkout: CheckoutService::new(stores.clone(), pricing, events),
            stores,
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { Json(serde_json::json!({"status": "healthy", "service": "buildmart-storefront"})) }))
        .route("/api/v1/products/:id", get(get_product))
        .route("/api/v1/users/:user/cart", get(get_cart))
        .route("/api/v1/users/:user/cart/items", post(add_cart_item).put(set_cart_item))
        .route("/api/v1/users/:user/cart/items/:key", delete(remove_cart_item))
        .route("/api/v1/users/:user/cart/items/:key/increment", post(increment_cart_item))
        .route("/api/v1/users/:user/cart/items/:key/decrement", post(decrement_cart_item))
        .route("/api/v1/users/:user/cart/quote", post(quote_cart))
        .route("/api/v1/users/:user/addresses", get(list_addresses).post(add_address))
        .route("/api/v1/users/:user/checkout", post(checkout))
        .route("/api/v1/orders/:id", get(get_order))
        .layer(TraceLayer::new_for_http()).layer(CorsLayer::permissive()).with_state(state)
}

impl StorefrontError {
    fn status(&self) -> StatusCode {
        match self {
            Self::InvalidKey(_) | Self::InvalidQuantity(_) | Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::InvalidCoupon(_) | Self::MissingAddress | Self::EmptyCart => StatusCode::UNPROCESSABLE_ENTITY,
            Self::ItemNotInCart(_) | Self::AddressNotFound(_) | Self::ProductNotFound(_) | Self::OrderNotFound(_) => StatusCode::NOT_FOUND,
            Self::CheckoutInProgress => StatusCode::CONFLICT,
            Self::CollaboratorFailure(_) => StatusCode::BAD_GATEWAY,
        }
    }

    fn code(&self) -> &'static str {
        match self {
            Self::InvalidKey(_) => "invalid_key",
            Self::InvalidCoupon(_) => "invalid_coupon",
            Self::InvalidQuantity(_) => "invalid_quantity",
            Self::ItemNotInCart(_) => "item_not_in_cart",
            Self::MissingAddress => "missing_address",
            Self::AddressNotFound(_) => "address_not_found",
            Self::EmptyCart => "empty_cart",
            Self::ProductNotFound(_) => "product_not_found",
            Self::OrderNotFound(_) => "order_not_found",
            Self::CheckoutInProgress => "checkout_in_progress",
            Self::Validation(_) => "validation_error",
            Self::CollaboratorFailure(_) => "collaborator_failure",
        }
    }
}

impl IntoResponse for StorefrontError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }
        (status, Json(serde_json::json!({"error": self.code(), "message": self.to_string()}))).into_response()
    }
}

type ApiResult<T> = Result<T, StorefrontError>;

async fn get_product(State(s): State<AppState>, Path(id): Path<String>) -> ApiResult<Json<Product>> {
    s.stores.catalog.find(&id).await?.map(Json).ok_or(StorefrontError::ProductNotFound(id))
}

async fn get_cart(State(s): State<AppState>, Path(user): Path<String>) -> ApiResult<Json<Vec<CartLine>>> {
    Ok(Json(s.carts.lines(&user).await?))
}

async fn add_cart_item(State(s): State<AppState>, Path(user): Path<String>, Json(r): Json<AddItemRequest>) -> ApiResult<Json<Vec<CartLine>>> {
    Ok(Json(s.carts.add_item(&user, r).await?))
}

async fn set_cart_item(State(s): State<AppState>, Path(user): Path<String>, Json(r): Json<SetQuantityRequest>) -> ApiResult<Json<Vec<CartLine>>> {
    Ok(Json(s.carts.set_quantity(&user, r).await?))
}

async fn remove_cart_item(State(s): State<AppState>, Path((user, key)): Path<(String, String)>) -> ApiResult<Json<Vec<CartLine>>> {
    Ok(Json(s.carts.remove_item(&user, &key).await?))
}

async fn increment_cart_item(State(s): State<AppState>, Path((user, key)): Path<(String, String)>) -> ApiResult<Json<Vec<CartLine>>> {
    Ok(Json(s.carts.increment(&user, &key).await?))
}

async fn decrement_cart_item(State(s): State<AppState>, Path((user, key)): Path<(String, String)>) -> ApiResult<Json<Vec<CartLine>>> {
    Ok(Json(s.carts.decrement(&user, &key).await?))
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteRequest { #[serde(default)] pub coupon_code: Option<String> }

/// The body is optional; a bare POST quotes without a coupon.
async fn quote_cart(State(s): State<AppState>, Path(user): Path<String>, body: Option<Json<QuoteRequest>>) -> ApiResult<Json<PriceBreakdown>> {
    let r = body.map(|Json(r)| r).unwrap_or_default();
    Ok(Json(s.checkout.quote(&user, r.coupon_code.as_deref()).await?))
}

async fn list_addresses(State(s): State<AppState>, Path(user): Path<String>) -> ApiResult<Json<Vec<Address>>> {
    Ok(Json(s.stores.addresses.list(&user).await?))
}

async fn add_address(State(s): State<AppState>, Path(user): Path<String>, Json(r): Json<NewAddress>) -> ApiResult<(StatusCode, Json<Address>)> {
    r.validate()?;
    Ok((StatusCode::CREATED, Json(s.stores.addresses.add(&user, r).await?)))
}

async fn checkout(State(s): State<AppState>, Path(user): Path<String>, Json(r): Json<CheckoutRequest>) -> ApiResult<impl IntoResponse> {
    let placed = s.checkout.place_order(&user, r).await?;
    Ok((StatusCode::CREATED, Json(placed)))
}

async fn get_order(State(s): State<AppState>, Path(id): Path<Uuid>) -> ApiResult<Json<Order>> {
    s.stores.orders.find(id).await?.map(Json).ok_or_else(|| StorefrontError::OrderNotFound(id.to_string()))
}
