//! Static product catalog.

use serde::Serialize;

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct Product {
    pub id: u32,
    pub name: &'static str,
    /// Price in cents.
    pub price_cents: u64,
}

pub const PRODUCTS: [Product; 2] = [
    Product {
        id: 1,
        name: "Product A",
        price_cents: 2000,
    },
    Product {
        id: 2,
        name: "Product B",
        price_cents: 3500,
    },
];

pub fn find(id: u32) -> Option<&'static Product> {
    PRODUCTS.iter().find(|p| p.id == id)
}

/// Sum of every catalog price, in cents.
pub fn total_cents() -> u64 {
    PRODUCTS.iter().map(|p| p.price_cents).sum()
}

/// `2000` → `"20.00"`.
pub fn format_price(cents: u64) -> String {
    format!("{}.{:02}", cents / 100, cents % 100)
}
