//! Page handlers. Each one reads the caller's session from the request
//! extensions; mutating handlers only run once their token has been checked.

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
};

use crate::http::pipeline::RequestSession;
use crate::storefront::catalog::{self, PRODUCTS};

fn page(title: &str, body: &str) -> Html<String> {
    Html(format!(
        "<!doctype html>\n<html><head><meta charset=\"utf-8\"><title>{title}</title></head>\n\
         <body>\n<h1>{title}</h1>\n{body}</body></html>\n"
    ))
}

/// Hidden input carrying a fresh token, under the configured field name.
fn token_input(session: &RequestSession) -> String {
    format!(
        "<input type=\"hidden\" name=\"{}\" value=\"{}\">",
        session.csrf_field(),
        session.csrf_token()
    )
}

pub async fn index() -> Html<String> {
    page(
        "Storefront",
        "<p><a href=\"/products\">Products</a> | <a href=\"/cart\">Cart</a></p>\n",
    )
}

pub async fn products(Extension(session): Extension<RequestSession>) -> Html<String> {
    let mut body = String::from("<ul>\n");
    for product in PRODUCTS.iter() {
        body.push_str(&format!(
            "<li>{} ({} EUR)\n<form method=\"post\" action=\"/cart/add/{}\">{}\
             <button type=\"submit\">Add to cart</button></form></li>\n",
            product.name,
            catalog::format_price(product.price_cents),
            product.id,
            token_input(&session),
        ));
    }
    body.push_str("</ul>\n");
    page("Products", &body)
}

pub async fn cart(Extension(session): Extension<RequestSession>) -> Html<String> {
    let mut body = String::from("<ul>\n");
    for product in PRODUCTS.iter() {
        body.push_str(&format!(
            "<li>{}: {} EUR</li>\n",
            product.name,
            catalog::format_price(product.price_cents)
        ));
    }
    body.push_str(&format!(
        "</ul>\n<p>Total: {} EUR</p>\n<form method=\"post\" action=\"/order\">{}\
         <button type=\"submit\">Order</button></form>\n",
        catalog::format_price(catalog::total_cents()),
        token_input(&session),
    ));
    page("Cart", &body)
}

pub async fn add_to_cart(Path(id): Path<u32>) -> Response {
    match catalog::find(id) {
        Some(product) => {
            tracing::debug!(product = product.id, "Added to cart");
            Redirect::to("/cart").into_response()
        }
        None => (StatusCode::NOT_FOUND, "Unknown product").into_response(),
    }
}

pub async fn order() -> &'static str {
    "Order received!"
}

pub async fn order_confirmation() -> Html<String> {
    page("Order confirmed", "<p>Thank you for your order.</p>\n")
}

pub async fn logout(Extension(session): Extension<RequestSession>) -> Response {
    match session.end().await {
        Ok(ended) => (Extension(ended), Redirect::to("/")).into_response(),
        Err(e) => e.into_response(),
    }
}
