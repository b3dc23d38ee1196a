use crate::domain::BookingId;
use async_trait::async_trait;

pub type Result<T> = std::result::Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// 請求書レジストリポート
///
/// 請求書の発行は請求コンテキストの責務。
/// 予約コンテキストは請求書が予約を参照しているかだけを知る。
#[async_trait]
pub trait InvoiceRegistry: Send + Sync {
    /// 予約を参照する請求書があるか
    ///
    /// ビジネスルール: 請求書発行後は予約の変更・支払い記録は不可。
    async fn has_invoice(&self, booking_id: BookingId) -> Result<bool>;
}
