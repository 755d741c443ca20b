//! In-memory ProductCatalog and WardrobeStore implementations.
//!
//! The real catalog and wardrobe live in the shopping platform's own
//! services; these adapters satisfy the ports for the server binary and
//! tests.

use async_trait::async_trait;
use fitroom_core::ports::{Product, ProductCatalog, WardrobeStore};
use fitroom_core::Result;
use std::collections::{HashMap, HashSet};
use tokio::sync::RwLock;

/// Product lookups from a seeded map.
#[derive(Default)]
pub struct MemoryProductCatalog {
    products: HashMap<String, Product>,
}

impl MemoryProductCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_product(mut self, product: Product) -> Self {
        self.products.insert(product.id.clone(), product);
        self
    }
}

#[async_trait]
impl ProductCatalog for MemoryProductCatalog {
    async fn get(&self, product_id: &str) -> Result<Option<Product>> {
        Ok(self.products.get(product_id).cloned())
    }
}

/// Idempotent wardrobe sink keyed by call.
#[derive(Default)]
pub struct MemoryWardrobeStore {
    items: RwLock<HashMap<String, HashSet<String>>>,
}

impl MemoryWardrobeStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Product ids currently shared into a call's wardrobe.
    pub async fn items_for(&self, call_id: &str) -> Vec<String> {
        let items = self.items.read().await;
        items
            .get(call_id)
            .map(|set| set.iter().cloned().collect())
            .unwrap_or_default()
    }
}

#[async_trait]
impl WardrobeStore for MemoryWardrobeStore {
    async fn add_item(&self, call_id: &str, product_id: &str) -> Result<()> {
        let mut items = self.items.write().await;
        items
            .entry(call_id.to_string())
            .or_default()
            .insert(product_id.to_string());
        Ok(())
    }

    async fn remove_item(&self, call_id: &str, product_id: &str) -> Result<()> {
        let mut items = self.items.write().await;
        if let Some(set) = items.get_mut(call_id) {
            set.remove(product_id);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_catalog_lookup() {
        let catalog = MemoryProductCatalog::new().with_product(Product {
            id: "prod-1".to_string(),
            name: "Red Dress".to_string(),
            price: 89.0,
            image_url: None,
        });

        assert!(catalog.get("prod-1").await.unwrap().is_some());
        assert!(catalog.get("prod-2").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_wardrobe_is_idempotent() {
        let store = MemoryWardrobeStore::new();
        store.add_item("c1", "prod-1").await.unwrap();
        store.add_item("c1", "prod-1").await.unwrap();
        assert_eq!(store.items_for("c1").await, vec!["prod-1".to_string()]);

        store.remove_item("c1", "prod-1").await.unwrap();
        store.remove_item("c1", "prod-1").await.unwrap();
        assert!(store.items_for("c1").await.is_empty());
    }
}
