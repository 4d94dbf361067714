//! # Cart
//!
//! Client-side aggregation of products before checkout.
//!
//! ## Cart Operations
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Frontend Action          Cart Method             State Change          │
//! │  ───────────────          ───────────             ────────────          │
//! │                                                                         │
//! │  Tap product ────────────► add_item() ──────────► push or qty += n      │
//! │  Change quantity ────────► update_quantity() ───► items[i].qty = n      │
//! │  Remove ─────────────────► remove_item() ───────► items.remove(i)       │
//! │  Sale confirmed ─────────► clear() ─────────────► items.clear()         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Prices are frozen when the item enters the cart.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::validation::{validate_price, validate_quantity};
use crate::MAX_CART_ITEMS;

/// A line in the cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    pub product_id: String,
    /// Product name at time of adding (frozen)
    pub name: String,
    /// Price in cents at time of adding (frozen)
    pub unit_price_cents: i64,
    pub quantity: i64,
}

impl CartItem {
    pub fn new(product_id: impl Into<String>, name: impl Into<String>, unit_price: Money) -> Self {
        CartItem {
            product_id: product_id.into(),
            name: name.into(),
            unit_price_cents: unit_price.cents(),
            quantity: 1,
        }
    }

    #[inline]
    pub fn unit_price(&self) -> Money {
        Money::from_cents(self.unit_price_cents)
    }

    /// unit price × quantity, clamped at the `i64` bounds.
    pub fn line_total(&self) -> Money {
        Money::from_cents(self.unit_price_cents.saturating_mul(self.quantity))
    }
}

/// The shopping cart.
///
/// ## Invariants
/// - Items are unique by `product_id` (adding same product increases quantity)
/// - 1 ≤ quantity ≤ 999
/// - At most 100 distinct items
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Cart {
    pub items: Vec<CartItem>,
}

impl Cart {
    pub fn new() -> Self {
        Cart::default()
    }

    /// Adds `quantity` of a product, merging with an existing line.
    pub fn add_item(&mut self, item: CartItem, quantity: i64) -> CoreResult<()> {
        validate_quantity(quantity)?;
        validate_price(item.unit_price())?;

        if let Some(existing) = self.items.iter_mut().find(|i| i.product_id == item.product_id) {
            let new_qty = existing.quantity.saturating_add(quantity);
            validate_quantity(new_qty)?;
            existing.quantity = new_qty;
            return Ok(());
        }

        if self.items.len() >= MAX_CART_ITEMS {
            return Err(CoreError::CartTooLarge {
                max: MAX_CART_ITEMS,
            });
        }

        self.items.push(CartItem { quantity, ..item });
        Ok(())
    }

    /// Sets a line's quantity; zero removes the line.
    pub fn update_quantity(&mut self, product_id: &str, quantity: i64) -> CoreResult<()> {
        if quantity == 0 {
            return self.remove_item(product_id);
        }
        validate_quantity(quantity)?;

        match self.items.iter_mut().find(|i| i.product_id == product_id) {
            Some(item) => {
                item.quantity = quantity;
                Ok(())
            }
            None => Err(CoreError::NotInCart(product_id.to_string())),
        }
    }

    pub fn remove_item(&mut self, product_id: &str) -> CoreResult<()> {
        let initial_len = self.items.len();
        self.items.retain(|i| i.product_id != product_id);

        if self.items.len() == initial_len {
            Err(CoreError::NotInCart(product_id.to_string()))
        } else {
            Ok(())
        }
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    pub fn item_count(&self) -> usize {
        self.items.len()
    }

    pub fn total_quantity(&self) -> i64 {
        self.items.iter().map(|i| i.quantity).sum()
    }

    /// Σ unit price × quantity.
    ///
    /// Clamps instead of wrapping; an absurd total then fails checkout's
    /// amount ceiling rather than posting a wrapped figure.
    pub fn total(&self) -> Money {
        self.items
            .iter()
            .map(CartItem::line_total)
            .fold(Money::zero(), Money::saturating_add)
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
