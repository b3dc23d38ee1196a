use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{
    BookingBecameOverdue, BookingCancelled, BookingCode, BookingConfirmed, BookingCreated,
    BookingId, BookingLineItem, BookingPickedUp, BookingReturned, BookingRevised, BookingStatus,
    BookingTotals, CreateBookingError, CustomerId, DomainEvent, PaymentError, PaymentMethod,
    PaymentRecorded, PickupStatus, PricingTerms, RecordPaymentError, RefundDeposit, RentalPeriod,
    ReplayError, ReturnBookingError, ReturnStatus, ReviseBookingError, StaffId, StockHold,
    TransitionError, apply_late_fee, compute_booking_totals, settle_payment,
    validate_deposit_refund,
};

/// 保証金の返金記録
///
/// 合計金額には影響しない。差し引き額は 保証金 − 返金額 で導出する。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepositRefund {
    pub amount: Decimal,
    pub method: PaymentMethod,
    pub notes: Option<String>,
    pub refunded_at: DateTime<Utc>,
}

impl DepositRefund {
    /// 保証金から差し引いた額
    pub fn deducted_from(&self, security_deposit: Decimal) -> Decimal {
        security_deposit - self.amount
    }
}

/// 支払い履歴の1件
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentEntry {
    pub amount: Decimal,
    pub method: PaymentMethod,
    pub recorded_at: DateTime<Utc>,
}

/// Booking集約 - 1件のレンタル予約
///
/// 金額項目はすべて料金計算の出力で、個別に設定されることはない。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Booking {
    // 識別子
    pub booking_id: BookingId,
    pub booking_code: BookingCode,

    // 他の集約への参照（IDのみ）
    pub customer_id: CustomerId,

    // レンタル内容
    pub period: RentalPeriod,
    pub actual_return_date: Option<DateTime<Utc>>,
    pub items: Vec<BookingLineItem>,

    // 料金
    pub pricing: PricingTerms,
    pub totals: BookingTotals,
    pub payments: Vec<PaymentEntry>,
    pub deposit_refund: Option<DepositRefund>,

    // ステータス
    pub booking_status: BookingStatus,
    pub pickup_status: PickupStatus,
    pub return_status: ReturnStatus,
    pub cancellation_reason: Option<String>,

    // 監査情報
    pub created_by: StaffId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Booking {
    pub fn rental_days(&self) -> i64 {
        self.period.rental_days()
    }

    /// 明細ごとの在庫拘束
    pub fn stock_holds(&self) -> Vec<StockHold> {
        self.items
            .iter()
            .map(|item| StockHold {
                booking_id: self.booking_id,
                booking_status: self.booking_status,
                period: self.period,
                product_id: item.product_id,
                quantity: item.quantity.value(),
            })
            .collect()
    }

    /// 受け取り前の下書き・確定済みのみ編集可能
    pub fn is_editable(&self) -> bool {
        matches!(
            self.booking_status,
            BookingStatus::Draft | BookingStatus::Confirmed
        ) && self.pickup_status == PickupStatus::NotPickedUp
    }
}

/// 予約作成の入力（検証済みの値のみ）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookingDraft {
    pub booking_code: BookingCode,
    pub customer_id: CustomerId,
    pub period: RentalPeriod,
    pub items: Vec<BookingLineItem>,
    pub pricing: PricingTerms,
    pub initial_payment: Decimal,
    pub created_by: StaffId,
}

fn compute_totals(
    items: &[BookingLineItem],
    period: &RentalPeriod,
    pricing: &PricingTerms,
    amount_paid: Decimal,
    late_fees: Decimal,
) -> BookingTotals {
    compute_booking_totals(
        items,
        period.rental_days(),
        &pricing.discount,
        pricing.tax_rate,
        pricing.security_deposit_override,
        amount_paid,
        late_fees,
    )
}

/// 純粋関数：予約を作成する
///
/// ビジネスルール：
/// - 明細は1件以上
/// - 状態はDraft / 未受け取り / 未返却
/// - 金額は支払い0で計算し、前払い金があれば支払いとして反映する
///
/// 在庫の検証は呼び出し側が事前に行う。副作用なし。
pub fn create_booking(
    draft: BookingDraft,
    created_at: DateTime<Utc>,
) -> Result<(Booking, BookingCreated), CreateBookingError> {
    if draft.items.is_empty() {
        return Err(CreateBookingError::NoItems);
    }

    if draft.initial_payment.is_sign_negative() {
        return Err(PaymentError::NonPositiveAmount.into());
    }

    let mut totals = compute_totals(
        &draft.items,
        &draft.period,
        &draft.pricing,
        Decimal::ZERO,
        Decimal::ZERO,
    );
    if !draft.initial_payment.is_zero() {
        totals = settle_payment(&totals, draft.initial_payment)?;
    }

    let event = BookingCreated {
        booking_id: BookingId::new(),
        booking_code: draft.booking_code,
        customer_id: draft.customer_id,
        period: draft.period,
        items: draft.items,
        pricing: draft.pricing,
        totals,
        created_by: draft.created_by,
        created_at,
    };

    Ok((from_created(&event), event))
}

/// 純粋関数：予約内容を変更する
///
/// ビジネスルール：
/// - 受け取り前の下書き・確定済みのみ
/// - 明細は1件以上
/// - 金額は全項目を再計算する（支払い済み額は保持）
///
/// 在庫の検証（自予約を除外）は呼び出し側が事前に行う。
pub fn revise_booking(
    booking: &Booking,
    period: RentalPeriod,
    items: Vec<BookingLineItem>,
    pricing: PricingTerms,
    revised_at: DateTime<Utc>,
) -> Result<(Booking, BookingRevised), ReviseBookingError> {
    if !booking.is_editable() {
        return Err(TransitionError::NotEditable(booking.booking_status).into());
    }
    if items.is_empty() {
        return Err(ReviseBookingError::NoItems);
    }

    let totals = compute_totals(
        &items,
        &period,
        &pricing,
        booking.totals.amount_paid,
        booking.totals.late_fees,
    );

    let event = BookingRevised {
        booking_id: booking.booking_id,
        period,
        items,
        pricing,
        totals,
        revised_at,
    };

    Ok(advance(booking, event, DomainEvent::BookingRevised))
}

/// 純粋関数：予約を確定する
///
/// ビジネスルール：Draftからのみ
pub fn confirm_booking(
    booking: &Booking,
    confirmed_at: DateTime<Utc>,
) -> Result<(Booking, BookingConfirmed), TransitionError> {
    if booking.booking_status != BookingStatus::Draft {
        return Err(TransitionError::NotDraft(booking.booking_status));
    }

    let event = BookingConfirmed {
        booking_id: booking.booking_id,
        confirmed_at,
    };

    Ok(advance(booking, event, DomainEvent::BookingConfirmed))
}

/// 純粋関数：支払いを記録する
///
/// ビジネスルール：
/// - キャンセル済みの予約には記録しない
/// - 金額は0より大きく、未払い残高以下
pub fn record_payment(
    booking: &Booking,
    amount: Decimal,
    method: PaymentMethod,
    recorded_at: DateTime<Utc>,
) -> Result<(Booking, PaymentRecorded), RecordPaymentError> {
    if booking.booking_status == BookingStatus::Cancelled {
        return Err(TransitionError::AlreadyCancelled.into());
    }

    let totals = settle_payment(&booking.totals, amount)?;

    let event = PaymentRecorded {
        booking_id: booking.booking_id,
        amount,
        method,
        totals,
        recorded_at,
    };

    Ok(advance(booking, event, DomainEvent::PaymentRecorded))
}

/// 純粋関数：受け取りを記録する
///
/// ビジネスルール：確定済みかつ未受け取りの予約のみ
pub fn mark_picked_up(
    booking: &Booking,
    picked_up_at: DateTime<Utc>,
) -> Result<(Booking, BookingPickedUp), TransitionError> {
    if booking.pickup_status == PickupStatus::PickedUp {
        return Err(TransitionError::AlreadyPickedUp);
    }
    if booking.booking_status != BookingStatus::Confirmed {
        return Err(TransitionError::NotConfirmed(booking.booking_status));
    }

    let event = BookingPickedUp {
        booking_id: booking.booking_id,
        picked_up_at,
    };

    Ok(advance(booking, event, DomainEvent::BookingPickedUp))
}

/// 純粋関数：返却を記録する
///
/// ビジネスルール：
/// - 受け取り済みの予約のみ
/// - 返却予定日を過ぎていれば延滞料金を合計と残高に加算する（再計算はしない）
/// - 保証金の返金額は保証金以下。合計金額には影響しない
/// - 返却後はReturned / Completed
pub fn mark_returned(
    booking: &Booking,
    actual_return_date: DateTime<Utc>,
    refund: Option<RefundDeposit>,
) -> Result<(Booking, BookingReturned), ReturnBookingError> {
    if booking.return_status == ReturnStatus::Returned {
        return Err(TransitionError::AlreadyReturned.into());
    }
    if booking.booking_status == BookingStatus::Cancelled {
        return Err(TransitionError::AlreadyCancelled.into());
    }
    if booking.pickup_status != PickupStatus::PickedUp {
        return Err(TransitionError::NotPickedUp(booking.pickup_status).into());
    }

    let deposit_refund = match refund {
        Some(refund) => {
            validate_deposit_refund(refund.amount, booking.totals.security_deposit)?;
            Some(DepositRefund {
                amount: refund.amount,
                method: refund.method,
                notes: refund.notes,
                refunded_at: actual_return_date,
            })
        }
        None => None,
    };

    let assessment = apply_late_fee(
        &booking.items,
        booking.period.expected_return_date(),
        &booking.totals,
        actual_return_date,
    );

    let event = BookingReturned {
        booking_id: booking.booking_id,
        actual_return_date,
        days_late: assessment.days_late,
        late_fee: assessment.late_fee,
        totals: booking.totals.with_late_fee(&assessment),
        deposit_refund,
    };

    Ok(advance(booking, event, DomainEvent::BookingReturned))
}

/// 純粋関数：予約をキャンセルする
///
/// ビジネスルール：キャンセル済み・完了済みは不可
pub fn cancel_booking(
    booking: &Booking,
    reason: Option<String>,
    cancelled_at: DateTime<Utc>,
) -> Result<(Booking, BookingCancelled), TransitionError> {
    match booking.booking_status {
        BookingStatus::Cancelled => return Err(TransitionError::AlreadyCancelled),
        BookingStatus::Completed => return Err(TransitionError::AlreadyCompleted),
        _ => {}
    }

    let event = BookingCancelled {
        booking_id: booking.booking_id,
        reason,
        cancelled_at,
    };

    Ok(advance(booking, event, DomainEvent::BookingCancelled))
}

/// 純粋関数：延滞判定
///
/// 確定済み・未返却で、返却予定日を過ぎている予約（受け取りの有無は問わない）。
pub fn is_overdue(booking: &Booking, now: DateTime<Utc>) -> bool {
    booking.booking_status == BookingStatus::Confirmed
        && booking.return_status == ReturnStatus::NotReturned
        && now > booking.period.expected_return_date()
}

/// 純粋関数：延滞を記録する
pub fn mark_overdue(
    booking: &Booking,
    detected_at: DateTime<Utc>,
) -> Result<(Booking, BookingBecameOverdue), TransitionError> {
    if !is_overdue(booking, detected_at) {
        return Err(TransitionError::NotOverdue);
    }

    let event = BookingBecameOverdue {
        booking_id: booking.booking_id,
        expected_return_date: booking.period.expected_return_date(),
        detected_at,
    };

    Ok(advance(booking, event, DomainEvent::BookingBecameOverdue))
}

/// 遷移関数の共通処理：イベントを適用した新しい状態とイベントを返す
fn advance<E: Clone>(booking: &Booking, event: E, wrap: fn(E) -> DomainEvent) -> (Booking, E) {
    let next = evolve(booking.clone(), &wrap(event.clone()));
    (next, event)
}

fn from_created(e: &BookingCreated) -> Booking {
    Booking {
        booking_id: e.booking_id,
        booking_code: e.booking_code.clone(),
        customer_id: e.customer_id,
        period: e.period,
        actual_return_date: None,
        items: e.items.clone(),
        pricing: e.pricing,
        totals: e.totals,
        payments: Vec::new(),
        deposit_refund: None,
        booking_status: BookingStatus::Draft,
        pickup_status: PickupStatus::NotPickedUp,
        return_status: ReturnStatus::NotReturned,
        cancellation_reason: None,
        created_by: e.created_by,
        created_at: e.created_at,
        updated_at: e.created_at,
    }
}

/// 作成後のイベントを既存の予約に適用する
///
/// イベントは確定した事実として扱い、遷移条件は再検証しない。
fn evolve(booking: Booking, event: &DomainEvent) -> Booking {
    match event {
        DomainEvent::BookingCreated(e) => from_created(e),
        DomainEvent::BookingRevised(e) => Booking {
            period: e.period,
            items: e.items.clone(),
            pricing: e.pricing,
            totals: e.totals,
            updated_at: e.revised_at,
            ..booking
        },
        DomainEvent::BookingConfirmed(e) => Booking {
            booking_status: BookingStatus::Confirmed,
            updated_at: e.confirmed_at,
            ..booking
        },
        DomainEvent::PaymentRecorded(e) => {
            let mut payments = booking.payments;
            payments.push(PaymentEntry {
                amount: e.amount,
                method: e.method,
                recorded_at: e.recorded_at,
            });
            Booking {
                totals: e.totals,
                payments,
                updated_at: e.recorded_at,
                ..booking
            }
        }
        DomainEvent::BookingPickedUp(e) => Booking {
            pickup_status: PickupStatus::PickedUp,
            updated_at: e.picked_up_at,
            ..booking
        },
        DomainEvent::BookingReturned(e) => Booking {
            actual_return_date: Some(e.actual_return_date),
            totals: e.totals,
            deposit_refund: e.deposit_refund.clone(),
            booking_status: BookingStatus::Completed,
            return_status: ReturnStatus::Returned,
            updated_at: e.actual_return_date,
            ..booking
        },
        DomainEvent::BookingCancelled(e) => {
            let pickup_status = if booking.pickup_status == PickupStatus::NotPickedUp {
                PickupStatus::Cancelled
            } else {
                booking.pickup_status
            };
            Booking {
                booking_status: BookingStatus::Cancelled,
                pickup_status,
                cancellation_reason: e.reason.clone(),
                updated_at: e.cancelled_at,
                ..booking
            }
        }
        DomainEvent::BookingBecameOverdue(e) => Booking {
            return_status: ReturnStatus::Overdue,
            updated_at: e.detected_at,
            ..booking
        },
    }
}

/// イベントを適用して新しい状態を生成する純粋関数
///
/// イベントソーシングのfoldパターンで使用される。
///
/// # エラー
/// - 作成イベントより前のイベント: `ReplayError::MissingCreation`
/// - 既存の予約への作成イベント: `ReplayError::DuplicateCreation`
/// - 別の予約のイベント: `ReplayError::BookingMismatch`
pub fn apply_event(booking: Option<Booking>, event: &DomainEvent) -> Result<Booking, ReplayError> {
    match (booking, event) {
        (None, DomainEvent::BookingCreated(e)) => Ok(from_created(e)),
        (None, _) => Err(ReplayError::MissingCreation),
        (Some(current), DomainEvent::BookingCreated(_)) => {
            Err(ReplayError::DuplicateCreation(current.booking_id))
        }
        (Some(current), event) if current.booking_id != event.booking_id() => {
            Err(ReplayError::BookingMismatch {
                current: current.booking_id,
                event: event.booking_id(),
            })
        }
        (Some(current), event) => Ok(evolve(current, event)),
    }
}

/// イベント列から現在の状態を復元する純粋関数
///
/// イベントが空の場合は`None`。
pub fn replay_events(events: &[DomainEvent]) -> Result<Option<Booking>, ReplayError> {
    events.iter().try_fold(None, |booking, event| {
        apply_event(booking, event).map(Some)
    })
}
