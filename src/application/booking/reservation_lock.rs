use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, MutexGuard, OwnedMutexGuard};

use crate::domain::ProductId;

/// 予約作成・変更の直列化
///
/// 空き状況の確認から保存までを商品ごとに直列化し、同一プロセス内で
/// 最後の1点を二重に予約する競合を防ぐ。
/// 複数プロセス間の競合は防げない（データベース側の予約機構が必要）。
#[derive(Default)]
pub struct BookingLocks {
    products: DashMap<ProductId, Arc<Mutex<()>>>,
    codes: Mutex<()>,
}

/// 商品ロックの保持（dropで解放）
pub struct ProductReservation {
    _guards: Vec<OwnedMutexGuard<()>>,
}

impl BookingLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// 指定商品のロックをすべて取得する
    ///
    /// デッドロックを避けるため、商品IDの昇順で取得する。
    pub async fn reserve_products(&self, product_ids: &[ProductId]) -> ProductReservation {
        let mut ids = product_ids.to_vec();
        ids.sort();
        ids.dedup();

        let mut guards = Vec::with_capacity(ids.len());
        for id in ids {
            let lock = self.products.entry(id).or_default().clone();
            guards.push(lock.lock_owned().await);
        }

        ProductReservation { _guards: guards }
    }

    /// 予約コード採番のロックを取得する
    pub async fn reserve_code(&self) -> MutexGuard<'_, ()> {
        self.codes.lock().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_same_product_is_serialized() {
        let locks = Arc::new(BookingLocks::new());
        let product_id = ProductId::new();

        let held = locks.reserve_products(&[product_id]).await;

        let contender = {
            let locks = locks.clone();
            tokio::spawn(async move {
                let _reservation = locks.reserve_products(&[product_id]).await;
            })
        };

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!contender.is_finished());

        drop(held);
        contender.await.unwrap();
    }

    #[tokio::test]
    async fn test_disjoint_products_do_not_block() {
        let locks = BookingLocks::new();
        let a = ProductId::new();
        let b = ProductId::new();

        let _held_a = locks.reserve_products(&[a]).await;
        let result =
            tokio::time::timeout(Duration::from_millis(100), locks.reserve_products(&[b, b])).await;

        assert!(result.is_ok());
    }
}
