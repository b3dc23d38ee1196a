use crate::domain::BookingId;
use crate::ports::invoice_registry::{InvoiceRegistry as InvoiceRegistryTrait, Result};
use async_trait::async_trait;
use sqlx::PgPool;

/// InvoiceRegistryのPostgreSQL実装
///
/// 請求コンテキストのinvoicesテーブルを参照する。
pub struct InvoiceRegistry {
    pool: PgPool,
}

impl InvoiceRegistry {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl InvoiceRegistryTrait for InvoiceRegistry {
    async fn has_invoice(&self, booking_id: BookingId) -> Result<bool> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM invoices WHERE booking_id = $1)")
                .bind(booking_id.value())
                .fetch_one(&self.pool)
                .await?;
        Ok(exists)
    }
}
