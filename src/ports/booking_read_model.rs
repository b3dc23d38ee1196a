use crate::domain::{Booking, BookingCode, BookingId, BookingStatus, CustomerId, RentalPeriod};
use async_trait::async_trait;
use chrono::{DateTime, Utc};

pub type Result<T> = std::result::Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// 予約一覧の検索条件
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BookingFilter {
    pub customer_id: Option<CustomerId>,
    pub booking_status: Option<BookingStatus>,
}

impl BookingFilter {
    pub fn matches(&self, booking: &Booking) -> bool {
        self.customer_id.is_none_or(|id| booking.customer_id == id)
            && self
                .booking_status
                .is_none_or(|status| booking.booking_status == status)
    }
}

/// 予約Read Modelポート
///
/// イベントから復元した予約の現在状態を、検索しやすい形で保持する（CQRSパターン）。
#[async_trait]
pub trait BookingReadModel: Send + Sync {
    /// 予約の現在状態を保存する
    ///
    /// イベントストアから復元した集約の完全な状態を保存する（upsert）。
    /// 部分更新は行わない。
    async fn save(&self, booking: Booking) -> Result<()>;

    /// IDで予約を取得する
    async fn get_by_id(&self, booking_id: BookingId) -> Result<Option<Booking>>;

    /// 期間に重なる有効な予約を取得する
    ///
    /// キャンセル済み・完了済みを除き、受け取り日 <= 期間の最終日 かつ
    /// 返却予定日 >= 期間の初日（暦日単位）の予約を返す。
    /// 空き状況の計算に使用される。
    async fn find_active_overlapping(&self, period: RentalPeriod) -> Result<Vec<Booking>>;

    /// 延滞候補の予約を検索する
    ///
    /// expected_return_date < cutoff かつ 確定済み・未返却の予約を返す。
    /// バッチジョブでの延滞検知に使用される。
    async fn find_overdue_candidates(&self, cutoff: DateTime<Utc>) -> Result<Vec<Booking>>;

    /// 条件に合う予約を作成日の新しい順に返す
    async fn search(&self, filter: BookingFilter) -> Result<Vec<Booking>>;

    /// 指定の接頭辞を持つ最新の予約コード
    ///
    /// 予約コードの日次連番の採番に使用される。
    async fn latest_booking_code_with_prefix(&self, prefix: &str) -> Result<Option<BookingCode>>;
}
