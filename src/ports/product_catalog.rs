use crate::domain::{Product, ProductId};
use async_trait::async_trait;

pub type Result<T> = std::result::Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// 商品カタログポート
///
/// 予約コンテキストと在庫管理コンテキストの境界を維持する。
/// 予約コンテキストは在庫数と基本料金のみを参照する。
#[async_trait]
pub trait ProductCatalog: Send + Sync {
    /// IDで商品をまとめて取得する
    ///
    /// 存在しないIDは結果に含まれない。
    async fn find_by_ids(&self, product_ids: &[ProductId]) -> Result<Vec<Product>>;

    /// レンタル対象の全商品を取得する
    ///
    /// 期間指定の空き状況一覧に使用される。
    async fn list_rentable(&self) -> Result<Vec<Product>>;
}
