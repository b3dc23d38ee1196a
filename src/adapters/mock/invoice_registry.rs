use crate::domain::BookingId;
use crate::ports::invoice_registry::{InvoiceRegistry as InvoiceRegistryTrait, Result};
use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::{Mutex, PoisonError};

/// InvoiceRegistryのモック実装
///
/// テスト側で登録した予約だけを請求書発行済みとして扱う。
#[derive(Default)]
pub struct InvoiceRegistry {
    invoiced: Mutex<HashSet<BookingId>>,
}

impl InvoiceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// 予約を請求書発行済みにする
    pub fn mark_invoiced(&self, booking_id: BookingId) {
        self.invoiced
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(booking_id);
    }
}

#[async_trait]
impl InvoiceRegistryTrait for InvoiceRegistry {
    async fn has_invoice(&self, booking_id: BookingId) -> Result<bool> {
        Ok(self
            .invoiced
            .lock()
            .map_err(|e| e.to_string())?
            .contains(&booking_id))
    }
}
