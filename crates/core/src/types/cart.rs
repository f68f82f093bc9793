//! Cart line items and the pure transitions over them.
//!
//! Every transition takes `&self` and returns a fresh [`Cart`]; nothing here
//! mutates in place. Callers holding an older snapshot keep seeing exactly
//! what they saw.

use serde::{Deserialize, Serialize, Serializer};

use super::id::ProductId;
use super::price::Price;
use super::quantity::Quantity;

/// A product descriptor as offered by the catalog, before it is in the cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductInput {
    pub id: ProductId,
    pub title: String,
    pub image_url: String,
    pub price: Price,
}

/// One product line in the cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
    pub id: ProductId,
    pub title: String,
    pub image_url: String,
    pub price: Price,
    pub quantity: Quantity,
}

impl CartItem {
    /// A fresh line for `product` holding a single unit.
    #[must_use]
    pub fn from_product(product: ProductInput) -> Self {
        Self {
            id: product.id,
            title: product.title,
            image_url: product.image_url,
            price: product.price,
            quantity: Quantity::ONE,
        }
    }
}

/// A cart contained the same product ID twice.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("duplicate product id in cart: {0}")]
pub struct DuplicateProductError(pub ProductId);

/// Ordered collection of cart lines, in display order.
///
/// No two lines share a [`ProductId`]. Deserialization enforces this, so a
/// `Cart` can never be observed in a state the transitions could not produce.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(try_from = "Vec<CartItem>")]
pub struct Cart {
    items: Vec<CartItem>,
}

impl Cart {
    /// An empty cart.
    #[must_use]
    pub const fn new() -> Self {
        Self { items: Vec::new() }
    }

    /// Build a cart from lines, rejecting duplicate IDs.
    ///
    /// # Errors
    ///
    /// Returns [`DuplicateProductError`] naming the first repeated ID.
    pub fn from_items(items: Vec<CartItem>) -> Result<Self, DuplicateProductError> {
        for (index, item) in items.iter().enumerate() {
            if items.iter().take(index).any(|earlier| earlier.id == item.id) {
                return Err(DuplicateProductError(item.id.clone()));
            }
        }
        Ok(Self { items })
    }

    #[must_use]
    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    pub fn iter(&self) -> core::slice::Iter<'_, CartItem> {
        self.items.iter()
    }

    #[must_use]
    pub const fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Look up the line for `id`.
    #[must_use]
    pub fn get(&self, id: &ProductId) -> Option<&CartItem> {
        self.items.iter().find(|item| &item.id == id)
    }

    /// Whether a line for `id` exists.
    ///
    /// This tests for the existence of a match, so a product sitting at the
    /// front of the cart is found like any other.
    #[must_use]
    pub fn contains(&self, id: &ProductId) -> bool {
        self.items.iter().any(|item| &item.id == id)
    }

    /// Sum of all line quantities, for a cart badge.
    #[must_use]
    pub fn total_quantity(&self) -> u64 {
        self.items
            .iter()
            .map(|item| u64::from(item.quantity.get()))
            .sum()
    }

    /// Add one unit of `product`.
    ///
    /// A product not yet in the cart is appended with quantity 1. A product
    /// already present is incremented; the descriptor's other fields are
    /// ignored in that case.
    #[must_use]
    pub fn with_added(&self, product: ProductInput) -> Self {
        if self.contains(&product.id) {
            return self.with_incremented(&product.id);
        }

        let mut items = Vec::with_capacity(self.items.len() + 1);
        items.extend(self.items.iter().cloned());
        items.push(CartItem::from_product(product));
        Self { items }
    }

    /// Raise the quantity of `id` by one. Unknown IDs leave the cart as is.
    #[must_use]
    pub fn with_incremented(&self, id: &ProductId) -> Self {
        let items = self
            .items
            .iter()
            .map(|item| {
                if &item.id == id {
                    CartItem {
                        quantity: item.quantity.incremented(),
                        ..item.clone()
                    }
                } else {
                    item.clone()
                }
            })
            .collect();
        Self { items }
    }

    /// Lower the quantity of `id` by one, dropping the line when it reaches
    /// zero. Unknown IDs leave the cart as is.
    #[must_use]
    pub fn with_decremented(&self, id: &ProductId) -> Self {
        let items = self
            .items
            .iter()
            .filter_map(|item| {
                if &item.id == id {
                    item.quantity.decremented().map(|quantity| CartItem {
                        quantity,
                        ..item.clone()
                    })
                } else {
                    Some(item.clone())
                }
            })
            .collect();
        Self { items }
    }
}

impl TryFrom<Vec<CartItem>> for Cart {
    type Error = DuplicateProductError;

    fn try_from(items: Vec<CartItem>) -> Result<Self, Self::Error> {
        Self::from_items(items)
    }
}

impl Serialize for Cart {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.items.serialize(serializer)
    }
}

impl<'a> IntoIterator for &'a Cart {
    type Item = &'a CartItem;
    type IntoIter = core::slice::Iter<'a, CartItem>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}
