use crate::domain::CustomerId;
use async_trait::async_trait;

pub type Result<T> = std::result::Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// 顧客ディレクトリポート
///
/// 予約コンテキストはCustomerIDのみを知り、顧客詳細は知らない。
#[async_trait]
pub trait CustomerDirectory: Send + Sync {
    /// 顧客が存在するか確認する
    ///
    /// 予約作成前の顧客バリデーションに使用される。
    async fn exists(&self, customer_id: CustomerId) -> Result<bool>;
}
