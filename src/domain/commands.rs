use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{BookingId, CustomerId, DiscountType, LineItemRequest, PaymentMethod, StaffId};

/// コマンド：予約を作成する
///
/// 外部表現からの正規化は済んでいるが、日付範囲・料金条件の検証はまだ。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateBooking {
    pub customer_id: CustomerId,
    pub pickup_date: DateTime<Utc>,
    pub expected_return_date: DateTime<Utc>,
    pub items: Vec<LineItemRequest>,
    pub discount_type: DiscountType,
    pub discount_value: Decimal,
    /// 省略時は18%
    pub tax_rate: Option<Decimal>,
    pub security_deposit_override: Option<Decimal>,
    /// 作成時に受け取った前払い金
    pub initial_payment: Decimal,
    pub staff_id: StaffId,
}

/// コマンド：予約内容を変更する
///
/// 日付・明細・料金条件をまとめて置き換える。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviseBooking {
    pub booking_id: BookingId,
    pub pickup_date: DateTime<Utc>,
    pub expected_return_date: DateTime<Utc>,
    pub items: Vec<LineItemRequest>,
    pub discount_type: DiscountType,
    pub discount_value: Decimal,
    pub tax_rate: Option<Decimal>,
    pub security_deposit_override: Option<Decimal>,
}

/// コマンド：支払いを記録する
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordPayment {
    pub booking_id: BookingId,
    pub amount: Decimal,
    pub method: PaymentMethod,
}

/// 保証金の返金指示
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefundDeposit {
    pub amount: Decimal,
    pub method: PaymentMethod,
    /// 損傷などによる差し引きの記録
    pub notes: Option<String>,
}

/// コマンド：返却を記録する
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarkReturned {
    pub booking_id: BookingId,
    pub actual_return_date: DateTime<Utc>,
    pub refund: Option<RefundDeposit>,
}

/// コマンド：予約をキャンセルする
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CancelBooking {
    pub booking_id: BookingId,
    pub reason: Option<String>,
}
