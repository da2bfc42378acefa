//! Data-bound text placeholders.
//!
//! A `text` object may carry a `dynamic` payload that replaces its literal
//! content with a value resolved from product data at render time (a price
//! tag, a stock badge, a product name). Each supported kind is its own type
//! implementing [`ResolveDisplay`]; [`DynamicContent`] is the closed set the
//! draft format accepts, tagged by `kind`.

#[cfg(test)]
#[path = "dynamic_test.rs"]
mod dynamic_test;

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Product facts available to placeholders when a draft is displayed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProductFacts {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub in_stock: Option<bool>,
}

/// Lookup table handed to [`ResolveDisplay::resolve_display_value`].
#[derive(Debug, Clone, Default)]
pub struct DisplayContext {
    products: HashMap<String, ProductFacts>,
}

impl DisplayContext {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) the facts for one product.
    pub fn insert(&mut self, product_id: impl Into<String>, facts: ProductFacts) {
        self.products.insert(product_id.into(), facts);
    }

    #[must_use]
    pub fn product(&self, product_id: &str) -> Option<&ProductFacts> {
        self.products.get(product_id)
    }
}

/// Capability shared by every placeholder kind.
pub trait ResolveDisplay {
    /// The string the renderer should draw in place of the object's literal text.
    fn resolve_display_value(&self, ctx: &DisplayContext) -> String;
}

// =============================================================
// Kinds
// =============================================================

/// A formatted product price, e.g. `$12.50`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceTag {
    pub product_id: String,
    #[serde(default = "default_currency")]
    pub currency: String,
}

/// An availability label chosen from the product's stock state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockBadge {
    pub product_id: String,
    #[serde(default = "default_in_stock_label")]
    pub in_stock_label: String,
    #[serde(default = "default_out_of_stock_label")]
    pub out_of_stock_label: String,
}

/// The product's display name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductName {
    pub product_id: String,
}

fn default_currency() -> String {
    "USD".into()
}

fn default_in_stock_label() -> String {
    "In stock".into()
}

fn default_out_of_stock_label() -> String {
    "Out of stock".into()
}

fn currency_symbol(code: &str) -> Option<&'static str> {
    match code {
        "USD" | "CAD" | "AUD" => Some("$"),
        "EUR" => Some("€"),
        "GBP" => Some("£"),
        "JPY" => Some("¥"),
        _ => None,
    }
}

impl ResolveDisplay for PriceTag {
    fn resolve_display_value(&self, ctx: &DisplayContext) -> String {
        let Some(price) = ctx.product(&self.product_id).and_then(|p| p.price) else {
            return "{price}".into();
        };
        match currency_symbol(&self.currency) {
            Some(symbol) => format!("{symbol}{price:.2}"),
            None => format!("{price:.2} {}", self.currency),
        }
    }
}

impl ResolveDisplay for StockBadge {
    fn resolve_display_value(&self, ctx: &DisplayContext) -> String {
        match ctx.product(&self.product_id).and_then(|p| p.in_stock) {
            Some(true) => self.in_stock_label.clone(),
            Some(false) => self.out_of_stock_label.clone(),
            None => "{stock}".into(),
        }
    }
}

impl ResolveDisplay for ProductName {
    fn resolve_display_value(&self, ctx: &DisplayContext) -> String {
        ctx.product(&self.product_id)
            .and_then(|p| p.name.clone())
            .unwrap_or_else(|| "{name}".into())
    }
}

/// Every placeholder kind a draft may contain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DynamicContent {
    Price(PriceTag),
    StockBadge(StockBadge),
    ProductName(ProductName),
}

impl DynamicContent {
    /// The product this placeholder reads from.
    #[must_use]
    pub fn product_id(&self) -> &str {
        match self {
            Self::Price(p) => &p.product_id,
            Self::StockBadge(s) => &s.product_id,
            Self::ProductName(n) => &n.product_id,
        }
    }
}

impl ResolveDisplay for DynamicContent {
    fn resolve_display_value(&self, ctx: &DisplayContext) -> String {
        match self {
            Self::Price(p) => p.resolve_display_value(ctx),
            Self::StockBadge(s) => s.resolve_display_value(ctx),
            Self::ProductName(n) => n.resolve_display_value(ctx),
        }
    }
}
