//! Shopping cart persisted under [`keys::CART`].

use std::sync::Arc;

use rust_decimal::{Decimal, RoundingStrategy};

use crate::catalog::Product;
use crate::storage::{self, KeyValueStore, keys};

/// Tax rate applied to the subtotal (10%).
pub const TAX_RATE: Decimal = Decimal::from_parts(10, 0, 0, false, 2);

/// Subtotal, tax and total of a cart, in USD.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CartTotals {
    pub subtotal: Decimal,
    pub tax: Decimal,
    pub total: Decimal,
}

impl CartTotals {
    /// Compute totals for `items`. Tax is rounded half-up to cents.
    #[must_use]
    pub fn of(items: &[Product]) -> Self {
        let subtotal: Decimal = items.iter().map(|item| item.price).sum();
        let tax = (subtotal * TAX_RATE)
            .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
        Self {
            subtotal,
            tax,
            total: subtotal + tax,
        }
    }
}

/// Ordered cart entries; the same product may appear more than once.
///
/// Every mutation is written through to the store immediately.
pub struct Cart {
    store: Arc<dyn KeyValueStore>,
    items: Vec<Product>,
}

impl Cart {
    /// Load the cart from `store`. An absent or corrupt cart is empty.
    #[must_use]
    pub fn load(store: Arc<dyn KeyValueStore>) -> Self {
        let items = storage::read_json(&*store, keys::CART).unwrap_or_default();
        Self { store, items }
    }

    /// Entries in the order they were added.
    #[must_use]
    pub fn items(&self) -> &[Product] {
        &self.items
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    #[must_use]
    pub fn totals(&self) -> CartTotals {
        CartTotals::of(&self.items)
    }

    /// Append `product`.
    pub fn add(&mut self, product: Product) {
        self.items.push(product);
        self.save();
    }

    /// Remove the entry at `index`, returning it.
    ///
    /// An out-of-range index leaves the cart untouched and returns `None`.
    pub fn remove(&mut self, index: usize) -> Option<Product> {
        if index >= self.items.len() {
            return None;
        }
        let removed = self.items.remove(index);
        self.save();
        Some(removed)
    }

    /// Empty the cart and delete its storage key.
    pub fn clear(&mut self) {
        self.items.clear();
        storage::forget(&*self.store, keys::CART);
    }

    fn save(&self) {
        storage::persist_json(&*self.store, keys::CART, &self.items);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use aixel_core::ProductId;

    use super::*;
    use crate::catalog::find;
    use crate::storage::MemoryStore;

    fn product(id: i32) -> Product {
        find(ProductId::new(id)).unwrap()
    }

    #[test]
    fn test_totals() {
        let totals = CartTotals::of(&[product(1), product(2)]);
        assert_eq!(totals.subtotal, Decimal::new(49800, 2));
        assert_eq!(totals.tax, Decimal::new(4980, 2));
        assert_eq!(totals.total, Decimal::new(54780, 2));
    }

    #[test]
    fn test_empty_totals_are_zero() {
        let totals = CartTotals::of(&[]);
        assert!(totals.total.is_zero());
    }

    #[test]
    fn test_persists_across_loads() {
        let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
        let mut cart = Cart::load(Arc::clone(&store));
        cart.add(product(3));
        cart.add(product(3));
        cart.add(product(4));

        let reloaded = Cart::load(Arc::clone(&store));
        assert_eq!(reloaded.len(), 3);
        assert_eq!(reloaded.items()[2].name, "Journey Tracker");
    }

    #[test]
    fn test_remove_by_index() {
        let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
        let mut cart = Cart::load(Arc::clone(&store));
        cart.add(product(1));
        cart.add(product(2));

        assert_eq!(cart.remove(5), None);
        assert_eq!(cart.len(), 2);

        assert_eq!(cart.remove(0).unwrap().id, ProductId::new(1));
        assert_eq!(Cart::load(store).items(), &[product(2)]);
    }

    #[test]
    fn test_clear_removes_key() {
        let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
        let mut cart = Cart::load(Arc::clone(&store));
        cart.add(product(1));
        cart.clear();

        assert!(cart.is_empty());
        assert_eq!(store.get(keys::CART).unwrap(), None);
    }

    #[test]
    fn test_corrupt_cart_loads_empty() {
        let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
        store.set(keys::CART, "{\"not\": \"a list\"}").unwrap();
        assert!(Cart::load(store).is_empty());
    }

    #[test]
    fn test_reads_browser_shaped_cart() {
        let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
        store
            .set(
                keys::CART,
                r#"[{"id":2,"name":"Marketing Dashboard","price":199,"description":"d","image":"i","emoji":"📈"}]"#,
            )
            .unwrap();
        let cart = Cart::load(store);
        assert_eq!(cart.totals().subtotal, Decimal::from(199));
    }
}
