//! Storefront pages served behind the security pipeline.
//!
//! # Routes
//! ```text
//! GET  /                     index
//! GET  /products             catalog, one add-to-cart form per product
//! GET  /cart                 catalog total and the order form
//! POST /cart/add/{id}        → 303 /cart
//! POST /order                "Order received!"
//! GET  /order/confirmation
//! POST /logout               ends the session, clears the cookie
//! ```
//!
//! Nothing is persisted; the cart always holds the whole catalog.

pub mod catalog;
pub mod handlers;

use axum::{
    routing::{get, post},
    Router,
};

/// Storefront routes, unprotected. Wrap with `http::server::protect`.
pub fn routes() -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/products", get(handlers::products))
        .route("/cart", get(handlers::cart))
        .route("/cart/add/{id}", post(handlers::add_to_cart))
        .route("/order", post(handlers::order))
        .route("/order/confirmation", get(handlers::order_confirmation))
        .route("/logout", post(handlers::logout))
}
