use crate::domain::CustomerId;
use crate::ports::customer_directory::{CustomerDirectory as CustomerDirectoryTrait, Result};
use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::{Mutex, PoisonError};

/// CustomerDirectoryのモック実装
#[derive(Default)]
pub struct CustomerDirectory {
    customers: Mutex<HashSet<CustomerId>>,
}

impl CustomerDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// テスト用に顧客を登録
    pub fn add_customer(&self, customer_id: CustomerId) {
        self.customers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(customer_id);
    }
}

#[async_trait]
impl CustomerDirectoryTrait for CustomerDirectory {
    async fn exists(&self, customer_id: CustomerId) -> Result<bool> {
        Ok(self
            .customers
            .lock()
            .map_err(|e| e.to_string())?
            .contains(&customer_id))
    }
}
