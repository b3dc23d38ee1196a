use chrono::{DateTime, Utc};
use tracing::{info, warn};

use crate::domain::{self, DomainEvent};

use super::booking_service::{LoadedBooking, ServiceDependencies, load_booking, persist};
use super::errors::{BookingApplicationError, Result};

/// 延滞検出バッチ
///
/// 定期的に実行され、延滞した予約を検出してBookingBecameOverdueイベントを発行する。
///
/// ビジネスルール：
/// - 返却予定日を過ぎた確定済み・未返却の予約を延滞とする（受け取りの有無は問わない）
/// - 既に延滞として記録された予約は処理しない（重複イベント防止）
/// - 返却済み・キャンセル済み・完了済みの予約は処理しない
///
/// 処理フロー：
/// 1. Read Modelから延滞候補を取得
/// 2. 各候補について：
///    - イベントストアから完全な履歴を取得して現在の状態を復元
///    - 延滞の条件を満たす場合のみBookingBecameOverdueを保存
///    - Read Modelを更新
/// 3. 処理件数を返す
///
/// # エラー
/// ポート層のI/Oエラー（EventStore, BookingReadModel）
pub async fn detect_overdue_bookings(
    deps: &ServiceDependencies,
    now: DateTime<Utc>,
) -> Result<usize> {
    let mut detected_count = 0;

    // 1. Read Modelから延滞候補を取得
    let candidates = deps
        .booking_read_model
        .find_overdue_candidates(now)
        .await
        .map_err(BookingApplicationError::ReadModelError)?;

    // 2. 各候補について延滞判定
    for candidate in candidates {
        // 判定はイベントから復元した状態で行う
        let LoadedBooking { booking, version } =
            match load_booking(&deps.event_store, candidate.booking_id).await {
                Ok(loaded) => loaded,
                Err(BookingApplicationError::BookingNotFound) => continue,
                Err(e) => return Err(e),
            };

        if !domain::booking::is_overdue(&booking, now) {
            continue;
        }

        let (overdue, event) = domain::booking::mark_overdue(&booking, now)?;
        match persist(deps, &overdue, version, DomainEvent::BookingBecameOverdue(event)).await {
            Ok(()) => {}
            // 判定後に返却などが保存された予約は次回の実行で再判定する
            Err(BookingApplicationError::ConcurrentModification(conflict)) => {
                warn!(booking_id = %conflict.aggregate_id.value(), "overdue check raced a write");
                continue;
            }
            Err(e) => return Err(e),
        }

        info!(
            booking_id = %overdue.booking_id.value(),
            booking_code = %overdue.booking_code,
            days_overdue = overdue.period.overdue_days(now),
            "booking became overdue"
        );

        detected_count += 1;
    }

    Ok(detected_count)
}
