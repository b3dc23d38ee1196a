use rust_decimal::Decimal;
use serde::Serialize;
use thiserror::Error;

use super::{BookingId, BookingStatus, PickupStatus, ProductId};

/// 日付範囲のエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DateRangeError {
    /// 返却予定日が受け取り日より後ではない
    #[error("Return date must be after pickup date")]
    ReturnNotAfterPickup,
}

/// 数量のエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QuantityError {
    #[error("Quantity must be at least 1")]
    Zero,
}

/// 料金条件（割引・税率・金額）の入力エラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PricingInputError {
    #[error("Discount value cannot be negative")]
    NegativeDiscount,
    #[error("Percentage discount must be between 0 and 100")]
    PercentageOutOfRange,
    #[error("Tax rate cannot be negative")]
    NegativeTaxRate,
    #[error("{0} cannot be negative")]
    NegativeAmount(&'static str),
}

/// 明細検証エラーの種別
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum LineItemErrorKind {
    /// 商品が存在しない
    NotFound,
    /// 総在庫数を超えている（期間に依存しない）
    ExceedsStock,
    /// 指定期間の空き数を超えている
    ExceedsAvailability,
}

impl LineItemErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            LineItemErrorKind::NotFound => "NOT_FOUND",
            LineItemErrorKind::ExceedsStock => "EXCEEDS_STOCK",
            LineItemErrorKind::ExceedsAvailability => "EXCEEDS_AVAILABILITY",
        }
    }
}

/// 明細1件の検証エラー
///
/// 呼び出し側が正確なメッセージを出せるよう、商品IDと要求数・空き数を保持する。
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LineItemError {
    pub product_id: ProductId,
    pub kind: LineItemErrorKind,
    pub requested: u32,
    /// ExceedsStockでは総在庫数、ExceedsAvailabilityでは期間中の空き数
    pub available: Option<u32>,
}

impl LineItemError {
    pub fn message(&self) -> String {
        match self.kind {
            LineItemErrorKind::NotFound => "Product not found".to_string(),
            LineItemErrorKind::ExceedsStock => format!(
                "Only {} unit(s) in stock. You requested {}.",
                self.available.unwrap_or(0),
                self.requested
            ),
            LineItemErrorKind::ExceedsAvailability => format!(
                "Only {} unit(s) available for selected dates. You requested {}.",
                self.available.unwrap_or(0),
                self.requested
            ),
        }
    }
}

impl std::fmt::Display for LineItemError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message())
    }
}

impl std::error::Error for LineItemError {}

/// 支払い記録のエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PaymentError {
    #[error("Payment amount must be greater than zero")]
    NonPositiveAmount,
    #[error("Payment amount ({amount}) cannot exceed balance due ({balance_due})")]
    ExceedsBalanceDue { amount: Decimal, balance_due: Decimal },
}

/// 保証金返金のエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RefundError {
    #[error("Refund amount must be greater than zero")]
    NonPositiveAmount,
    #[error("Refund amount ({amount}) cannot exceed security deposit ({deposit})")]
    ExceedsDeposit { amount: Decimal, deposit: Decimal },
}

/// 状態遷移のエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransitionError {
    /// 確定は下書きからのみ
    #[error("Only draft bookings can be confirmed (current: {0:?})")]
    NotDraft(BookingStatus),
    /// 受け取りは確定済みの予約のみ
    #[error("Only confirmed bookings can be marked as picked up (current: {0:?})")]
    NotConfirmed(BookingStatus),
    #[error("Booking is already picked up")]
    AlreadyPickedUp,
    /// 返却は受け取り済みの予約のみ
    #[error("Booking must be picked up before it can be returned (current: {0:?})")]
    NotPickedUp(PickupStatus),
    #[error("Booking is already returned")]
    AlreadyReturned,
    #[error("Booking is already cancelled")]
    AlreadyCancelled,
    #[error("Cannot cancel a completed booking")]
    AlreadyCompleted,
    /// 編集は受け取り前の下書き・確定済みのみ
    #[error("Booking can no longer be edited (status: {0:?})")]
    NotEditable(BookingStatus),
    /// 延滞の条件を満たしていない（確定済み・未返却・返却予定日超過）
    #[error("Booking is not overdue")]
    NotOverdue,
}

/// 予約作成のエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CreateBookingError {
    #[error("Booking must contain at least one item")]
    NoItems,
    #[error(transparent)]
    Payment(#[from] PaymentError),
}

/// 予約内容変更のエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReviseBookingError {
    #[error("Booking must contain at least one item")]
    NoItems,
    #[error(transparent)]
    Transition(#[from] TransitionError),
}

/// 支払い記録のエラー（状態と金額）
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecordPaymentError {
    #[error(transparent)]
    Transition(#[from] TransitionError),
    #[error(transparent)]
    Payment(#[from] PaymentError),
}

/// 返却のエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReturnBookingError {
    #[error(transparent)]
    Transition(#[from] TransitionError),
    #[error(transparent)]
    Refund(#[from] RefundError),
}

/// イベント列の復元エラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReplayError {
    #[error("Event stream must start with BookingCreated")]
    MissingCreation,
    #[error("BookingCreated cannot apply to an existing booking ({0:?})")]
    DuplicateCreation(BookingId),
    #[error("Event for {event:?} cannot apply to {current:?}")]
    BookingMismatch { current: BookingId, event: BookingId },
}
