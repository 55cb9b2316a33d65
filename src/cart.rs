//! Cart aggregator.
//!
//! Quantities per product id, with derived totals. All operations are total
//! functions over the current contents; there are no error conditions.

use crate::models::{CartItem, Product};

/// Totals derived from the cart contents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CartTotals {
    /// Sum of quantities across all entries.
    pub item_count: i64,
    /// Sum of price × quantity, integer JPY.
    pub total_jpy: i64,
}

/// The customer's cart. Invariant: at most one entry per product id, and no
/// entry ever holds quantity 0 (a decrement past 1 removes the entry).
#[derive(Debug, Clone, Default)]
pub struct Cart {
    items: Vec<CartItem>,
}

impl Cart {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one unit of `product`: increments the existing entry, or inserts
    /// a new one at quantity 1. No upper bound is enforced.
    pub fn add(&mut self, product: &Product) {
        if let Some(item) = self
            .items
            .iter_mut()
            .find(|item| item.product.id == product.id)
        {
            item.quantity += 1;
        } else {
            self.items.push(CartItem {
                product: product.clone(),
                quantity: 1,
            });
        }
    }

    /// Remove one unit of the product: decrements, removing the entry when
    /// its quantity would reach 0. No-op when the id is absent.
    pub fn remove(&mut self, product_id: &str) {
        if let Some(pos) = self
            .items
            .iter()
            .position(|item| item.product.id == product_id)
        {
            if self.items[pos].quantity > 1 {
                self.items[pos].quantity -= 1;
            } else {
                self.items.remove(pos);
            }
        }
    }

    /// Derive item count and JPY total. Pure.
    pub fn totals(&self) -> CartTotals {
        let mut totals = CartTotals::default();
        for item in &self.items {
            totals.item_count += item.quantity;
            totals.total_jpy += item.product.price * item.quantity;
        }
        totals
    }

    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Deep copy of the current contents, for the order factory's snapshot.
    pub fn snapshot(&self) -> Vec<CartItem> {
        self.items.clone()
    }

    /// Empty the cart (after a successful checkout).
    pub fn clear(&mut self) {
        self.items.clear();
    }
}
