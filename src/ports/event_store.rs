use crate::domain::{events::DomainEvent, value_objects::BookingId};
use async_trait::async_trait;
use futures::stream::BoxStream;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// 読み込み後に別の書き込みが入ったため追記を拒否した
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error(
    "Booking {} was modified concurrently (expected version {expected}, found {actual})",
    .aggregate_id.value()
)]
pub struct VersionConflict {
    pub aggregate_id: BookingId,
    pub expected: u32,
    pub actual: u32,
}

/// 予約イベントログのポート
///
/// 予約の状態はこのログだけが正とする。Read Modelはここから導出される。
#[async_trait]
pub trait EventStore: Send + Sync {
    /// 予約のイベントを末尾に書き足す
    ///
    /// `expected_version`は読み込み時点のイベント数（新規作成なら0）。
    /// 現在のイベント数と一致しなければ`VersionConflict`を返し、何も書かない。
    /// 1回の呼び出しで渡したイベントはすべて書かれるか、何も書かれない。
    async fn append(
        &self,
        aggregate_id: BookingId,
        expected_version: u32,
        events: Vec<DomainEvent>,
    ) -> Result<()>;

    /// 予約1件分のイベントを書き込み順に返す（未登録なら空）
    async fn load(&self, aggregate_id: BookingId) -> Result<Vec<DomainEvent>>;

    /// 全予約のイベントを書き込み順に流す
    ///
    /// `rebuild_read_model` が使う。
    fn stream_all(&self) -> BoxStream<'_, Result<DomainEvent>>;
}
