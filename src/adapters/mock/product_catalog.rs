use crate::domain::{Product, ProductId};
use crate::ports::product_catalog::{ProductCatalog as ProductCatalogTrait, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

/// ProductCatalogのモック実装
///
/// 商品を登録することで状態を持ったテストをサポート。
#[derive(Default)]
pub struct ProductCatalog {
    products: Mutex<HashMap<ProductId, Product>>,
}

impl ProductCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// 商品を登録（同じIDは上書き）
    pub fn add_product(&self, product: Product) {
        self.products
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(product.product_id, product);
    }
}

#[async_trait]
impl ProductCatalogTrait for ProductCatalog {
    async fn find_by_ids(&self, product_ids: &[ProductId]) -> Result<Vec<Product>> {
        let products = self.products.lock().map_err(|e| e.to_string())?;
        Ok(product_ids
            .iter()
            .filter_map(|id| products.get(id).cloned())
            .collect())
    }

    async fn list_rentable(&self) -> Result<Vec<Product>> {
        let products = self.products.lock().map_err(|e| e.to_string())?;
        let mut all: Vec<Product> = products.values().cloned().collect();
        all.sort_by(|a, b| a.display_name.cmp(&b.display_name));
        Ok(all)
    }
}
