use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{
    BookingCode, BookingId, BookingLineItem, BookingTotals, CustomerId, DepositRefund,
    PaymentMethod, PricingTerms, RentalPeriod, StaffId,
};

/// イベント：予約が作成された
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingCreated {
    pub booking_id: BookingId,
    pub booking_code: BookingCode,
    pub customer_id: CustomerId,
    pub period: RentalPeriod,
    pub items: Vec<BookingLineItem>,
    pub pricing: PricingTerms,
    pub totals: BookingTotals,
    pub created_by: StaffId,
    pub created_at: DateTime<Utc>,
}

/// イベント：予約内容が変更された
///
/// 金額は変更後の全項目を再計算した結果。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingRevised {
    pub booking_id: BookingId,
    pub period: RentalPeriod,
    pub items: Vec<BookingLineItem>,
    pub pricing: PricingTerms,
    pub totals: BookingTotals,
    pub revised_at: DateTime<Utc>,
}

/// イベント：予約が確定された
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingConfirmed {
    pub booking_id: BookingId,
    pub confirmed_at: DateTime<Utc>,
}

/// イベント：支払いが記録された
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentRecorded {
    pub booking_id: BookingId,
    pub amount: Decimal,
    pub method: PaymentMethod,
    pub totals: BookingTotals,
    pub recorded_at: DateTime<Utc>,
}

/// イベント：商品が受け取られた
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingPickedUp {
    pub booking_id: BookingId,
    pub picked_up_at: DateTime<Utc>,
}

/// イベント：商品が返却された
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingReturned {
    pub booking_id: BookingId,
    pub actual_return_date: DateTime<Utc>,
    pub days_late: i64,
    pub late_fee: Decimal,
    pub totals: BookingTotals,
    pub deposit_refund: Option<DepositRefund>,
}

/// イベント：予約がキャンセルされた
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingCancelled {
    pub booking_id: BookingId,
    pub reason: Option<String>,
    pub cancelled_at: DateTime<Utc>,
}

/// イベント：予約が延滞した
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingBecameOverdue {
    pub booking_id: BookingId,
    pub expected_return_date: DateTime<Utc>,
    pub detected_at: DateTime<Utc>,
}

/// ドメインイベント統合型
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DomainEvent {
    BookingCreated(BookingCreated),
    BookingRevised(BookingRevised),
    BookingConfirmed(BookingConfirmed),
    PaymentRecorded(PaymentRecorded),
    BookingPickedUp(BookingPickedUp),
    BookingReturned(BookingReturned),
    BookingCancelled(BookingCancelled),
    BookingBecameOverdue(BookingBecameOverdue),
}

impl DomainEvent {
    pub fn booking_id(&self) -> BookingId {
        match self {
            DomainEvent::BookingCreated(e) => e.booking_id,
            DomainEvent::BookingRevised(e) => e.booking_id,
            DomainEvent::BookingConfirmed(e) => e.booking_id,
            DomainEvent::PaymentRecorded(e) => e.booking_id,
            DomainEvent::BookingPickedUp(e) => e.booking_id,
            DomainEvent::BookingReturned(e) => e.booking_id,
            DomainEvent::BookingCancelled(e) => e.booking_id,
            DomainEvent::BookingBecameOverdue(e) => e.booking_id,
        }
    }

    /// イベント種別名（イベントストアの識別子）
    pub fn event_type(&self) -> &'static str {
        match self {
            DomainEvent::BookingCreated(_) => "BookingCreated",
            DomainEvent::BookingRevised(_) => "BookingRevised",
            DomainEvent::BookingConfirmed(_) => "BookingConfirmed",
            DomainEvent::PaymentRecorded(_) => "PaymentRecorded",
            DomainEvent::BookingPickedUp(_) => "BookingPickedUp",
            DomainEvent::BookingReturned(_) => "BookingReturned",
            DomainEvent::BookingCancelled(_) => "BookingCancelled",
            DomainEvent::BookingBecameOverdue(_) => "BookingBecameOverdue",
        }
    }

    /// 事実が発生した時刻
    ///
    /// 返却イベントは実際の返却日時。
    pub fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            DomainEvent::BookingCreated(e) => e.created_at,
            DomainEvent::BookingRevised(e) => e.revised_at,
            DomainEvent::BookingConfirmed(e) => e.confirmed_at,
            DomainEvent::PaymentRecorded(e) => e.recorded_at,
            DomainEvent::BookingPickedUp(e) => e.picked_up_at,
            DomainEvent::BookingReturned(e) => e.actual_return_date,
            DomainEvent::BookingCancelled(e) => e.cancelled_at,
            DomainEvent::BookingBecameOverdue(e) => e.detected_at,
        }
    }
}
