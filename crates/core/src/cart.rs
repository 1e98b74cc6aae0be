//! Cart store.
//!
//! [`CartStore`] holds the products and quantities a visitor intends to buy.
//! It starts empty, is mutated synchronously through `&mut self`, and notifies
//! subscribed listeners after every successful mutation. Its serialisable
//! boundary is [`CartState`], which callers persist wherever suits them (the
//! storefront keeps it in the visitor's session).

use core::fmt;

use serde::{Deserialize, Serialize};

use crate::catalog::Product;
use crate::types::{Price, ProductId};

/// Errors returned by cart mutations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CartError {
    /// A quantity of zero was passed where at least one is required.
    #[error("quantity must be at least 1")]
    InvalidQuantity,

    /// The resulting quantity does not fit in a `u32`.
    #[error("quantity overflow for {0}")]
    QuantityOverflow(ProductId),

    /// The product is not in the cart.
    #[error("item not in cart: {0}")]
    ItemNotFound(ProductId),
}

/// One cart line.
///
/// `name` and `unit_price` are captured when the product is first added so
/// the cart can be rendered and totalled without a catalog lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
    pub product_id: ProductId,
    pub name: String,
    pub unit_price: Price,
    pub quantity: u32,
}

impl CartItem {
    /// `unit_price * quantity`.
    #[must_use]
    pub fn line_total(&self) -> Price {
        self.unit_price.times(self.quantity)
    }
}

/// Serialisable cart contents.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartState {
    pub items: Vec<CartItem>,
}

/// What changed in a mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CartEvent {
    /// A product was added, or its quantity incremented by `added`.
    ItemAdded { product_id: ProductId, added: u32 },
    /// A line was removed.
    ItemRemoved { product_id: ProductId },
    /// A line quantity was set.
    QuantityUpdated { product_id: ProductId, quantity: u32 },
    /// Every line was removed.
    Cleared,
}

/// Totals after a mutation, passed to listeners.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CartSummary {
    pub item_count: u32,
    pub total: Price,
}

/// Handle returned by [`CartStore::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Listener = Box<dyn Fn(&CartEvent, &CartSummary) + Send + Sync>;

/// In-memory cart with change notification.
#[derive(Default)]
pub struct CartStore {
    items: Vec<CartItem>,
    listeners: Vec<(SubscriptionId, Listener)>,
    next_subscription: u64,
}

impl fmt::Debug for CartStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CartStore")
            .field("items", &self.items)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl CartStore {
    /// An empty cart.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a cart from persisted state.
    ///
    /// Lines with a zero quantity are dropped and duplicate lines for the
    /// same product are merged, so the store invariants hold even for
    /// hand-edited state. Quantity beyond a cart total of `u32::MAX` is
    /// discarded.
    #[must_use]
    pub fn from_state(state: CartState) -> Self {
        let mut items: Vec<CartItem> = Vec::with_capacity(state.items.len());
        let mut total: u32 = 0;
        for mut item in state.items {
            item.quantity = item.quantity.min(u32::MAX - total);
            if item.quantity == 0 {
                continue;
            }
            total += item.quantity;
            match items.iter_mut().find(|i| i.product_id == item.product_id) {
                Some(existing) => existing.quantity += item.quantity,
                None => items.push(item),
            }
        }
        Self {
            items,
            ..Self::default()
        }
    }

    /// Snapshot the cart contents for persistence.
    #[must_use]
    pub fn state(&self) -> CartState {
        CartState {
            items: self.items.clone(),
        }
    }

    /// Register a listener called after every successful mutation.
    pub fn subscribe<F>(&mut self, listener: F) -> SubscriptionId
    where
        F: Fn(&CartEvent, &CartSummary) + Send + Sync + 'static,
    {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    /// Remove a listener. Returns `false` if it was not registered.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(sub, _)| *sub != id);
        self.listeners.len() != before
    }

    /// Add `quantity` of `product`, inserting a line or incrementing the
    /// existing one.
    ///
    /// # Errors
    ///
    /// Returns `InvalidQuantity` for a zero quantity and `QuantityOverflow`
    /// if the cart's total item count would exceed `u32::MAX`.
    pub fn add_item(&mut self, product: &Product, quantity: u32) -> Result<(), CartError> {
        if quantity == 0 {
            return Err(CartError::InvalidQuantity);
        }
        if self.item_count().checked_add(quantity).is_none() {
            return Err(CartError::QuantityOverflow(product.id.clone()));
        }

        match self.items.iter_mut().find(|i| i.product_id == product.id) {
            Some(item) => item.quantity += quantity,
            None => self.items.push(CartItem {
                product_id: product.id.clone(),
                name: product.name.clone(),
                unit_price: product.price,
                quantity,
            }),
        }

        self.notify(&CartEvent::ItemAdded {
            product_id: product.id.clone(),
            added: quantity,
        });
        Ok(())
    }

    /// Remove the line for `product_id`. Removing an absent product is a no-op
    /// and returns `false`.
    pub fn remove_item(&mut self, product_id: &ProductId) -> bool {
        let before = self.items.len();
        self.items.retain(|i| &i.product_id != product_id);
        let removed = self.items.len() != before;

        if removed {
            self.notify(&CartEvent::ItemRemoved {
                product_id: product_id.clone(),
            });
        }
        removed
    }

    /// Set the quantity of an existing line. A quantity of zero removes it.
    ///
    /// # Errors
    ///
    /// Returns `ItemNotFound` if the product is not in the cart and
    /// `QuantityOverflow` if the cart's total item count would exceed
    /// `u32::MAX`.
    pub fn update_quantity(
        &mut self,
        product_id: &ProductId,
        quantity: u32,
    ) -> Result<(), CartError> {
        let current = self
            .items
            .iter()
            .find(|i| &i.product_id == product_id)
            .map(|i| i.quantity)
            .ok_or_else(|| CartError::ItemNotFound(product_id.clone()))?;

        if quantity == 0 {
            self.remove_item(product_id);
            return Ok(());
        }

        // Lowering a line always fits; raising it must keep the total in range
        if quantity > current
            && self.item_count().checked_add(quantity - current).is_none()
        {
            return Err(CartError::QuantityOverflow(product_id.clone()));
        }

        if let Some(item) = self.items.iter_mut().find(|i| &i.product_id == product_id) {
            item.quantity = quantity;
        }

        self.notify(&CartEvent::QuantityUpdated {
            product_id: product_id.clone(),
            quantity,
        });
        Ok(())
    }

    /// Remove every line.
    pub fn clear(&mut self) {
        self.items.clear();
        self.notify(&CartEvent::Cleared);
    }

    #[must_use]
    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    #[must_use]
    pub fn contains(&self, product_id: &ProductId) -> bool {
        self.items.iter().any(|i| &i.product_id == product_id)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Sum of line quantities.
    ///
    /// Mutations keep this sum within `u32`, so it is exact.
    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.items.iter().map(|i| i.quantity).sum()
    }

    /// Sum of line totals.
    #[must_use]
    pub fn total_price(&self) -> Price {
        self.items.iter().map(CartItem::line_total).sum()
    }

    #[must_use]
    pub fn summary(&self) -> CartSummary {
        CartSummary {
            item_count: self.item_count(),
            total: self.total_price(),
        }
    }

    fn notify(&self, event: &CartEvent) {
        if self.listeners.is_empty() {
            return;
        }
        let summary = self.summary();
        for (_, listener) in &self.listeners {
            listener(event, &summary);
        }
    }
}
