use crate::domain::{
    Booking, BookingCode, BookingId, BookingLineItem, BookingStatus, BookingTotals, CustomerId,
    DepositRefund, PaymentEntry, PickupStatus, PricingTerms, RentalPeriod, ReturnStatus, StaffId,
};
use crate::ports::booking_read_model::{
    BookingFilter, BookingReadModel as BookingReadModelTrait, Result,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Row, postgres::PgRow, types::Json};

const SELECT_COLUMNS: &str = r#"
    SELECT
        booking_id,
        booking_code,
        customer_id,
        pickup_date,
        expected_return_date,
        actual_return_date,
        items,
        pricing,
        totals,
        payments,
        deposit_refund,
        booking_status,
        pickup_status,
        return_status,
        cancellation_reason,
        created_by,
        created_at,
        updated_at
    FROM bookings_view
"#;

fn invalid_data(message: String) -> Box<dyn std::error::Error + Send + Sync> {
    Box::new(std::io::Error::new(std::io::ErrorKind::InvalidData, message))
}

/// PostgreSQLの行データをBooking集約に変換する
///
/// ステータスは表示名の文字列、明細・料金条件・金額はJSONBで保存されている。
/// 不正な値はInvalidDataエラーとして返す。
fn map_row_to_booking(row: &PgRow) -> Result<Booking> {
    let period = RentalPeriod::new(row.get("pickup_date"), row.get("expected_return_date"))
        .map_err(|e| invalid_data(e.to_string()))?;

    let booking_status: &str = row.get("booking_status");
    let booking_status: BookingStatus = booking_status.parse().map_err(invalid_data)?;
    let pickup_status: &str = row.get("pickup_status");
    let pickup_status: PickupStatus = pickup_status.parse().map_err(invalid_data)?;
    let return_status: &str = row.get("return_status");
    let return_status: ReturnStatus = return_status.parse().map_err(invalid_data)?;

    let Json(items): Json<Vec<BookingLineItem>> = row.try_get("items")?;
    let Json(pricing): Json<PricingTerms> = row.try_get("pricing")?;
    let Json(totals): Json<BookingTotals> = row.try_get("totals")?;
    let Json(payments): Json<Vec<PaymentEntry>> = row.try_get("payments")?;
    let deposit_refund: Option<Json<DepositRefund>> = row.try_get("deposit_refund")?;

    Ok(Booking {
        booking_id: BookingId::from_uuid(row.get("booking_id")),
        booking_code: BookingCode::from_string(row.get("booking_code")),
        customer_id: CustomerId::from_uuid(row.get("customer_id")),
        period,
        actual_return_date: row.get("actual_return_date"),
        items,
        pricing,
        totals,
        payments,
        deposit_refund: deposit_refund.map(|Json(refund)| refund),
        booking_status,
        pickup_status,
        return_status,
        cancellation_reason: row.get("cancellation_reason"),
        created_by: StaffId::from_uuid(row.get("created_by")),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}

/// BookingReadModelのPostgreSQL実装
///
/// CQRSパターンの読み取り側として、空き状況・延滞検知・一覧表示に
/// 最適化された非正規化ビューを提供する。
pub struct BookingReadModel {
    pool: PgPool,
}

impl BookingReadModel {
    /// PostgreSQLコネクションプールから新しいBookingReadModelを作成
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BookingReadModelTrait for BookingReadModel {
    /// 予約をRead Modelに保存（upsert）
    ///
    /// INSERT ... ON CONFLICT UPDATEを使用して冪等性を保証する。
    /// 検索用に合計金額・残額・支払いステータスも列として持つ。
    async fn save(&self, booking: Booking) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO bookings_view (
                booking_id,
                booking_code,
                customer_id,
                pickup_date,
                expected_return_date,
                actual_return_date,
                items,
                pricing,
                totals,
                payments,
                deposit_refund,
                total_amount,
                balance_due,
                payment_status,
                booking_status,
                pickup_status,
                return_status,
                cancellation_reason,
                created_by,
                created_at,
                updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10,
                    $11, $12, $13, $14, $15, $16, $17, $18, $19, $20, $21)
            ON CONFLICT (booking_id)
            DO UPDATE SET
                pickup_date = EXCLUDED.pickup_date,
                expected_return_date = EXCLUDED.expected_return_date,
                actual_return_date = EXCLUDED.actual_return_date,
                items = EXCLUDED.items,
                pricing = EXCLUDED.pricing,
                totals = EXCLUDED.totals,
                payments = EXCLUDED.payments,
                deposit_refund = EXCLUDED.deposit_refund,
                total_amount = EXCLUDED.total_amount,
                balance_due = EXCLUDED.balance_due,
                payment_status = EXCLUDED.payment_status,
                booking_status = EXCLUDED.booking_status,
                pickup_status = EXCLUDED.pickup_status,
                return_status = EXCLUDED.return_status,
                cancellation_reason = EXCLUDED.cancellation_reason,
                updated_at = EXCLUDED.updated_at
            "#,
        )
        .bind(booking.booking_id.value())
        .bind(booking.booking_code.as_str())
        .bind(booking.customer_id.value())
        .bind(booking.period.pickup_date())
        .bind(booking.period.expected_return_date())
        .bind(booking.actual_return_date)
        .bind(Json(&booking.items))
        .bind(Json(&booking.pricing))
        .bind(Json(&booking.totals))
        .bind(Json(&booking.payments))
        .bind(booking.deposit_refund.as_ref().map(Json))
        .bind(booking.totals.total_amount)
        .bind(booking.totals.balance_due)
        .bind(booking.totals.payment_status.as_str())
        .bind(booking.booking_status.as_str())
        .bind(booking.pickup_status.as_str())
        .bind(booking.return_status.as_str())
        .bind(booking.cancellation_reason.as_deref())
        .bind(booking.created_by.value())
        .bind(booking.created_at)
        .bind(booking.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// IDで予約を取得
    async fn get_by_id(&self, booking_id: BookingId) -> Result<Option<Booking>> {
        let row = sqlx::query(&format!("{SELECT_COLUMNS} WHERE booking_id = $1"))
            .bind(booking_id.value())
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(map_row_to_booking).transpose()
    }

    /// 期間に重なる有効な予約を取得（空き状況計算用）
    ///
    /// 重なりはUTCの暦日単位で判定する。
    /// (booking_status, pickup_date, expected_return_date)のインデックスを使用。
    async fn find_active_overlapping(&self, period: RentalPeriod) -> Result<Vec<Booking>> {
        let rows = sqlx::query(&format!(
            r#"{SELECT_COLUMNS}
            WHERE booking_status NOT IN ('Cancelled', 'Completed')
              AND (pickup_date AT TIME ZONE 'UTC')::date <= $1
              AND (expected_return_date AT TIME ZONE 'UTC')::date >= $2
            ORDER BY pickup_date ASC
            "#
        ))
        .bind(period.last_day())
        .bind(period.first_day())
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(map_row_to_booking).collect()
    }

    /// 延滞候補を検索（バッチ延滞検知用）
    ///
    /// 返却予定日を過ぎた確定済み・未返却の予約を返す。
    async fn find_overdue_candidates(&self, cutoff: DateTime<Utc>) -> Result<Vec<Booking>> {
        let rows = sqlx::query(&format!(
            r#"{SELECT_COLUMNS}
            WHERE booking_status = 'Confirmed'
              AND return_status = 'Not Returned'
              AND expected_return_date < $1
            ORDER BY expected_return_date ASC
            "#
        ))
        .bind(cutoff)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(map_row_to_booking).collect()
    }

    /// 顧客・予約ステータスで絞り込み、作成日の新しい順に返す
    async fn search(&self, filter: BookingFilter) -> Result<Vec<Booking>> {
        let rows = sqlx::query(&format!(
            r#"{SELECT_COLUMNS}
            WHERE ($1::uuid IS NULL OR customer_id = $1)
              AND ($2::varchar IS NULL OR booking_status = $2)
            ORDER BY created_at DESC
            "#
        ))
        .bind(filter.customer_id.map(|id| id.value()))
        .bind(filter.booking_status.map(|status| status.as_str()))
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(map_row_to_booking).collect()
    }

    /// 接頭辞に一致する最新の予約コード
    ///
    /// 連番は3桁の0埋めで、1000件目以降は桁が増えるため長さを先に比較する。
    async fn latest_booking_code_with_prefix(&self, prefix: &str) -> Result<Option<BookingCode>> {
        let code: Option<String> = sqlx::query_scalar(
            r#"
            SELECT booking_code
            FROM bookings_view
            WHERE booking_code LIKE $1 || '%'
            ORDER BY LENGTH(booking_code) DESC, booking_code DESC
            LIMIT 1
            "#,
        )
        .bind(prefix)
        .fetch_optional(&self.pool)
        .await?;

        Ok(code.map(BookingCode::from_string))
    }
}
