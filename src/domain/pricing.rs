//! 料金計算
//!
//! 明細・レンタル日数・割引/税率/保証金の条件から、予約のすべての金額項目と
//! 支払いステータスを導出する。入力以外の状態を持たず、I/Oも行わない。
//! 予約の金額はここでのみ計算し、永続化層で再計算してはならない。

use chrono::{DateTime, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use super::{
    BookingLineItem, DiscountType, PaymentError, PaymentStatus, PricingInputError, RefundError,
    compute_days_late,
};

/// 通貨の小数桁数
const CURRENCY_DECIMAL_PLACES: u32 = 2;

/// 既定の税率（%）
pub fn default_tax_rate() -> Decimal {
    Decimal::from(18)
}

/// 延滞料金率：1日あたりレンタル料金の50%
pub fn late_fee_rate() -> Decimal {
    Decimal::new(5, 1)
}

/// 通貨単位に丸める（四捨五入）
pub fn round_currency(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(CURRENCY_DECIMAL_PLACES, RoundingStrategy::MidpointAwayFromZero)
}

/// 割引条件
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Discount {
    pub discount_type: DiscountType,
    pub value: Decimal,
}

impl Discount {
    pub fn none() -> Self {
        Self {
            discount_type: DiscountType::None,
            value: Decimal::ZERO,
        }
    }

    /// 入力境界での検証：値は0以上、割合指定は0〜100
    pub fn new(discount_type: DiscountType, value: Decimal) -> Result<Self, PricingInputError> {
        if value.is_sign_negative() {
            return Err(PricingInputError::NegativeDiscount);
        }
        if discount_type == DiscountType::Percentage && value > Decimal::ONE_HUNDRED {
            return Err(PricingInputError::PercentageOutOfRange);
        }
        Ok(Self {
            discount_type,
            value,
        })
    }

    /// 小計に対する割引額
    ///
    /// 固定額・プロモーションコードは小計を超えても切り詰めない。
    pub fn amount_for(&self, subtotal: Decimal) -> Decimal {
        match self.discount_type {
            DiscountType::None => Decimal::ZERO,
            DiscountType::Percentage => {
                round_currency(subtotal * self.value / Decimal::ONE_HUNDRED)
            }
            DiscountType::FixedAmount | DiscountType::PromotionalCode => self.value,
        }
    }
}

impl Default for Discount {
    fn default() -> Self {
        Self::none()
    }
}

/// 料金条件（割引・税率・保証金の上書き）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricingTerms {
    pub discount: Discount,
    pub tax_rate: Decimal,
    /// 0より大きい場合のみ明細からの保証金合計を置き換える
    pub security_deposit_override: Option<Decimal>,
}

impl PricingTerms {
    /// 税率省略時は既定値（18%）
    pub fn new(
        discount: Discount,
        tax_rate: Option<Decimal>,
        security_deposit_override: Option<Decimal>,
    ) -> Result<Self, PricingInputError> {
        let tax_rate = tax_rate.unwrap_or_else(default_tax_rate);
        if tax_rate.is_sign_negative() {
            return Err(PricingInputError::NegativeTaxRate);
        }
        if security_deposit_override.is_some_and(|d| d.is_sign_negative()) {
            return Err(PricingInputError::NegativeAmount("Security deposit"));
        }
        Ok(Self {
            discount,
            tax_rate,
            security_deposit_override,
        })
    }
}

impl Default for PricingTerms {
    fn default() -> Self {
        Self {
            discount: Discount::none(),
            tax_rate: default_tax_rate(),
            security_deposit_override: None,
        }
    }
}

/// 予約の金額計算結果（不変）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingTotals {
    pub subtotal: Decimal,
    pub discount_amount: Decimal,
    /// 小計 − 割引額（割引設定によっては負になりうる）
    pub taxable_amount: Decimal,
    pub tax_amount: Decimal,
    pub security_deposit: Decimal,
    pub late_fees: Decimal,
    pub total_amount: Decimal,
    pub amount_paid: Decimal,
    pub balance_due: Decimal,
    pub payment_status: PaymentStatus,
}

/// 純粋関数：明細の小計
pub fn compute_line_subtotal(item: &BookingLineItem, rental_days: i64) -> Decimal {
    item.rental_price_per_unit_per_day
        * Decimal::from(item.quantity.value())
        * Decimal::from(rental_days)
}

/// 純粋関数：未払い残高
///
/// 支払い済み額が合計以上なら0、それ以外は差額。
pub fn compute_balance_due(total_amount: Decimal, amount_paid: Decimal) -> Decimal {
    if amount_paid >= total_amount {
        Decimal::ZERO
    } else {
        total_amount - amount_paid
    }
}

/// 純粋関数：支払いステータス
///
/// 支払い0ならUnpaid、残高0以下ならPaid、それ以外はPartially Paid。
pub fn payment_status_for(amount_paid: Decimal, balance_due: Decimal) -> PaymentStatus {
    if amount_paid.is_zero() {
        PaymentStatus::Unpaid
    } else if balance_due <= Decimal::ZERO {
        PaymentStatus::Paid
    } else {
        PaymentStatus::PartiallyPaid
    }
}

/// 純粋関数：予約の金額一式を計算する
///
/// 計算式：
/// - 小計 = Σ(1日料金 × 数量 × レンタル日数)
/// - 課税対象額 = 小計 − 割引額
/// - 税額 = 課税対象額 × 税率 / 100
/// - 保証金 = 上書き値（0より大きい場合）または Σ(1個あたり保証金 × 数量)
/// - 合計 = 課税対象額 + 税額 + 保証金 + 延滞料金
pub fn compute_booking_totals(
    items: &[BookingLineItem],
    rental_days: i64,
    discount: &Discount,
    tax_rate: Decimal,
    security_deposit_override: Option<Decimal>,
    amount_paid: Decimal,
    late_fees: Decimal,
) -> BookingTotals {
    let subtotal: Decimal = items
        .iter()
        .map(|item| compute_line_subtotal(item, rental_days))
        .sum();

    let discount_amount = discount.amount_for(subtotal);
    let taxable_amount = subtotal - discount_amount;
    let tax_amount = round_currency(taxable_amount * tax_rate / Decimal::ONE_HUNDRED);

    let security_deposit = match security_deposit_override {
        Some(deposit) if deposit > Decimal::ZERO => deposit,
        _ => items
            .iter()
            .map(|item| item.security_deposit_per_unit * Decimal::from(item.quantity.value()))
            .sum(),
    };

    let total_amount = taxable_amount + tax_amount + security_deposit + late_fees;
    let balance_due = compute_balance_due(total_amount, amount_paid);

    BookingTotals {
        subtotal,
        discount_amount,
        taxable_amount,
        tax_amount,
        security_deposit,
        late_fees,
        total_amount,
        amount_paid,
        balance_due,
        payment_status: payment_status_for(amount_paid, balance_due),
    }
}

/// 純粋関数：支払いを反映する
///
/// # エラー
/// - 金額が0以下: `PaymentError::NonPositiveAmount`
/// - 金額が未払い残高を超える: `PaymentError::ExceedsBalanceDue`
pub fn settle_payment(
    totals: &BookingTotals,
    amount: Decimal,
) -> Result<BookingTotals, PaymentError> {
    if amount <= Decimal::ZERO {
        return Err(PaymentError::NonPositiveAmount);
    }
    if amount > totals.balance_due {
        return Err(PaymentError::ExceedsBalanceDue {
            amount,
            balance_due: totals.balance_due,
        });
    }

    let amount_paid = totals.amount_paid + amount;
    let balance_due = compute_balance_due(totals.total_amount, amount_paid);

    Ok(BookingTotals {
        amount_paid,
        balance_due,
        payment_status: payment_status_for(amount_paid, balance_due),
        ..*totals
    })
}

/// 延滞料金の査定結果
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LateFeeAssessment {
    pub days_late: i64,
    pub late_fee: Decimal,
    pub updated_total_amount: Decimal,
    pub updated_balance_due: Decimal,
}

/// 純粋関数：延滞料金を査定する
///
/// 延滞料金 = Σ(1日料金 × 0.5 × 数量 × 延滞日数)。
/// 合計と残高には加算のみ行い、再計算しない（返却時点までの手動調整を保持する）。
pub fn apply_late_fee(
    items: &[BookingLineItem],
    expected_return_date: DateTime<Utc>,
    totals: &BookingTotals,
    actual_return_date: DateTime<Utc>,
) -> LateFeeAssessment {
    let days_late = compute_days_late(expected_return_date, actual_return_date);

    let late_fee = if days_late == 0 {
        Decimal::ZERO
    } else {
        let fee: Decimal = items
            .iter()
            .map(|item| {
                item.rental_price_per_unit_per_day
                    * late_fee_rate()
                    * Decimal::from(item.quantity.value())
                    * Decimal::from(days_late)
            })
            .sum();
        round_currency(fee)
    };

    LateFeeAssessment {
        days_late,
        late_fee,
        updated_total_amount: totals.total_amount + late_fee,
        updated_balance_due: totals.balance_due + late_fee,
    }
}

impl BookingTotals {
    /// 延滞料金の査定結果を反映する
    pub fn with_late_fee(&self, assessment: &LateFeeAssessment) -> BookingTotals {
        BookingTotals {
            late_fees: self.late_fees + assessment.late_fee,
            total_amount: assessment.updated_total_amount,
            balance_due: assessment.updated_balance_due,
            payment_status: payment_status_for(self.amount_paid, assessment.updated_balance_due),
            ..*self
        }
    }
}

/// 純粋関数：保証金返金額の検証
///
/// 返金は合計金額に影響せず、別途記録される。
pub fn validate_deposit_refund(
    amount: Decimal,
    security_deposit: Decimal,
) -> Result<(), RefundError> {
    if amount <= Decimal::ZERO {
        return Err(RefundError::NonPositiveAmount);
    }
    if amount > security_deposit {
        return Err(RefundError::ExceedsDeposit {
            amount,
            deposit: security_deposit,
        });
    }
    Ok(())
}
