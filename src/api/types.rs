use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{
    Booking, BookingId, BookingLineItem, BookingStatus, BookingTotals, CancelBooking,
    CreateBooking, CustomerId, DepositRefund, DiscountType, LineItemError, LineItemRequest,
    MarkReturned, PaymentEntry, PaymentMethod, ProductAvailability, ProductId, Quantity,
    RecordPayment, RefundDeposit, ReviseBooking, StaffId, compute_line_subtotal,
};

// ============================================================================
// Requests
// ============================================================================

/// 明細の入力
///
/// 料金・保証金を省略すると商品の基本値が使われる。
#[derive(Debug, Clone, Deserialize)]
pub struct LineItemInput {
    pub product_id: Uuid,
    pub quantity: u32,
    pub rental_price_per_unit_per_day: Option<Decimal>,
    pub security_deposit_per_unit: Option<Decimal>,
}

impl LineItemInput {
    fn to_request(&self) -> Result<LineItemRequest, String> {
        let quantity = Quantity::try_from(self.quantity).map_err(|e| e.to_string())?;
        Ok(LineItemRequest {
            product_id: ProductId::from_uuid(self.product_id),
            quantity,
            rental_price_per_unit_per_day: self.rental_price_per_unit_per_day,
            security_deposit_per_unit: self.security_deposit_per_unit,
        })
    }
}

fn to_requests(items: &[LineItemInput]) -> Result<Vec<LineItemRequest>, String> {
    items.iter().map(LineItemInput::to_request).collect()
}

fn parse_discount_type(value: Option<&str>) -> Result<DiscountType, String> {
    value.map_or(Ok(DiscountType::None), str::parse)
}

/// POST /bookings のリクエストボディ
#[derive(Debug, Clone, Deserialize)]
pub struct CreateBookingRequest {
    pub customer_id: Uuid,
    pub pickup_date: DateTime<Utc>,
    pub expected_return_date: DateTime<Utc>,
    pub items: Vec<LineItemInput>,
    /// "None" / "Percentage" / "Fixed Amount" / "Promotional Code"
    pub discount_type: Option<String>,
    pub discount_value: Option<Decimal>,
    pub tax_rate: Option<Decimal>,
    pub security_deposit_override: Option<Decimal>,
    pub initial_payment: Option<Decimal>,
    pub staff_id: Uuid,
}

impl CreateBookingRequest {
    /// 外部表現を型付きのコマンドに正規化する
    pub fn to_command(&self) -> Result<CreateBooking, String> {
        Ok(CreateBooking {
            customer_id: CustomerId::from_uuid(self.customer_id),
            pickup_date: self.pickup_date,
            expected_return_date: self.expected_return_date,
            items: to_requests(&self.items)?,
            discount_type: parse_discount_type(self.discount_type.as_deref())?,
            discount_value: self.discount_value.unwrap_or(Decimal::ZERO),
            tax_rate: self.tax_rate,
            security_deposit_override: self.security_deposit_override,
            initial_payment: self.initial_payment.unwrap_or(Decimal::ZERO),
            staff_id: StaffId::from_uuid(self.staff_id),
        })
    }
}

/// PUT /bookings/:id のリクエストボディ
#[derive(Debug, Clone, Deserialize)]
pub struct ReviseBookingRequest {
    pub pickup_date: DateTime<Utc>,
    pub expected_return_date: DateTime<Utc>,
    pub items: Vec<LineItemInput>,
    pub discount_type: Option<String>,
    pub discount_value: Option<Decimal>,
    pub tax_rate: Option<Decimal>,
    pub security_deposit_override: Option<Decimal>,
}

impl ReviseBookingRequest {
    pub fn to_command(&self, booking_id: BookingId) -> Result<ReviseBooking, String> {
        Ok(ReviseBooking {
            booking_id,
            pickup_date: self.pickup_date,
            expected_return_date: self.expected_return_date,
            items: to_requests(&self.items)?,
            discount_type: parse_discount_type(self.discount_type.as_deref())?,
            discount_value: self.discount_value.unwrap_or(Decimal::ZERO),
            tax_rate: self.tax_rate,
            security_deposit_override: self.security_deposit_override,
        })
    }
}

/// POST /bookings/:id/payments のリクエストボディ
#[derive(Debug, Clone, Deserialize)]
pub struct RecordPaymentRequest {
    pub amount: Decimal,
    /// "Cash" / "UPI" / "Bank Transfer" / "Card" / "Cheque"（省略時はCash）
    pub method: Option<String>,
}

impl RecordPaymentRequest {
    pub fn to_command(&self, booking_id: BookingId) -> Result<RecordPayment, String> {
        Ok(RecordPayment {
            booking_id,
            amount: self.amount,
            method: parse_method(self.method.as_deref())?,
        })
    }
}

fn parse_method(method: Option<&str>) -> Result<PaymentMethod, String> {
    method.map_or(Ok(PaymentMethod::default()), str::parse)
}

/// 保証金返金の入力
#[derive(Debug, Clone, Deserialize)]
pub struct RefundInput {
    pub amount: Decimal,
    /// "Cash" / "UPI" / "Bank Transfer" / "Card" / "Cheque"
    pub method: Option<String>,
    pub notes: Option<String>,
}

/// POST /bookings/:id/return のリクエストボディ
#[derive(Debug, Clone, Deserialize)]
pub struct MarkReturnedRequest {
    /// 省略時はリクエスト受信時刻
    pub actual_return_date: Option<DateTime<Utc>>,
    pub refund: Option<RefundInput>,
}

impl MarkReturnedRequest {
    pub fn to_command(&self, booking_id: BookingId) -> Result<MarkReturned, String> {
        let refund = match &self.refund {
            Some(input) => Some(RefundDeposit {
                amount: input.amount,
                method: parse_method(input.method.as_deref())?,
                notes: input.notes.clone(),
            }),
            None => None,
        };

        Ok(MarkReturned {
            booking_id,
            actual_return_date: self.actual_return_date.unwrap_or_else(Utc::now),
            refund,
        })
    }
}

/// POST /bookings/:id/cancel のリクエストボディ
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CancelBookingRequest {
    pub reason: Option<String>,
}

impl CancelBookingRequest {
    pub fn to_command(&self, booking_id: BookingId) -> CancelBooking {
        CancelBooking {
            booking_id,
            reason: self.reason.clone(),
        }
    }
}

/// 予約一覧取得のクエリパラメータ
#[derive(Debug, Deserialize)]
pub struct ListBookingsQuery {
    /// 顧客IDでフィルタリング
    pub customer_id: Option<Uuid>,
    /// 予約ステータスでフィルタリング
    pub status: Option<String>,
}

/// 空き状況取得のクエリパラメータ
#[derive(Debug, Deserialize)]
pub struct AvailabilityQuery {
    pub pickup_date: DateTime<Utc>,
    pub return_date: DateTime<Utc>,
    /// 編集中の予約（自身の拘束分を空き数に戻す）
    pub exclude_booking_id: Option<Uuid>,
}

/// ステータスクエリパラメータのパースとバリデーション
pub fn parse_status_filter(status: &str) -> Result<BookingStatus, String> {
    status.parse::<BookingStatus>()
}

// ============================================================================
// Responses
// ============================================================================

/// 明細レスポンス（小計は予約のレンタル日数から導出）
#[derive(Debug, Serialize)]
pub struct LineItemResponse {
    pub product_id: Uuid,
    pub product_name: String,
    pub sku: Option<String>,
    pub quantity: u32,
    pub rental_price_per_unit_per_day: Decimal,
    pub security_deposit_per_unit: Decimal,
    pub subtotal: Decimal,
}

impl LineItemResponse {
    fn new(item: &BookingLineItem, rental_days: i64) -> Self {
        Self {
            product_id: item.product_id.value(),
            product_name: item.product_name.clone(),
            sku: item.sku.clone(),
            quantity: item.quantity.value(),
            rental_price_per_unit_per_day: item.rental_price_per_unit_per_day,
            security_deposit_per_unit: item.security_deposit_per_unit,
            subtotal: compute_line_subtotal(item, rental_days),
        }
    }
}

/// 保証金返金レスポンス
#[derive(Debug, Serialize)]
pub struct DepositRefundResponse {
    pub amount: Decimal,
    pub deducted: Decimal,
    pub method: String,
    pub notes: Option<String>,
    pub refunded_at: DateTime<Utc>,
}

impl DepositRefundResponse {
    fn new(refund: &DepositRefund, security_deposit: Decimal) -> Self {
        Self {
            amount: refund.amount,
            deducted: refund.deducted_from(security_deposit),
            method: refund.method.as_str().to_string(),
            notes: refund.notes.clone(),
            refunded_at: refund.refunded_at,
        }
    }
}

/// 予約レスポンス（GET /bookings/:id、各コマンドの結果）
#[derive(Debug, Serialize)]
pub struct BookingResponse {
    pub booking_id: Uuid,
    pub booking_code: String,
    pub customer_id: Uuid,
    pub pickup_date: DateTime<Utc>,
    pub expected_return_date: DateTime<Utc>,
    pub actual_return_date: Option<DateTime<Utc>>,
    pub rental_days: i64,
    pub items: Vec<LineItemResponse>,
    pub discount_type: String,
    pub discount_value: Decimal,
    pub tax_rate: Decimal,
    pub totals: BookingTotals,
    pub payments: Vec<PaymentEntry>,
    pub deposit_refund: Option<DepositRefundResponse>,
    pub booking_status: String,
    pub pickup_status: String,
    pub return_status: String,
    pub payment_status: String,
    pub cancellation_reason: Option<String>,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Booking> for BookingResponse {
    fn from(booking: Booking) -> Self {
        let rental_days = booking.rental_days();
        Self {
            booking_id: booking.booking_id.value(),
            booking_code: booking.booking_code.to_string(),
            customer_id: booking.customer_id.value(),
            pickup_date: booking.period.pickup_date(),
            expected_return_date: booking.period.expected_return_date(),
            actual_return_date: booking.actual_return_date,
            rental_days,
            items: booking
                .items
                .iter()
                .map(|item| LineItemResponse::new(item, rental_days))
                .collect(),
            discount_type: booking.pricing.discount.discount_type.as_str().to_string(),
            discount_value: booking.pricing.discount.value,
            tax_rate: booking.pricing.tax_rate,
            totals: booking.totals,
            payments: booking.payments,
            deposit_refund: booking
                .deposit_refund
                .as_ref()
                .map(|refund| DepositRefundResponse::new(refund, booking.totals.security_deposit)),
            booking_status: booking.booking_status.as_str().to_string(),
            pickup_status: booking.pickup_status.as_str().to_string(),
            return_status: booking.return_status.as_str().to_string(),
            payment_status: booking.totals.payment_status.as_str().to_string(),
            cancellation_reason: booking.cancellation_reason,
            created_by: booking.created_by.value(),
            created_at: booking.created_at,
            updated_at: booking.updated_at,
        }
    }
}

/// 商品ごとの空き状況レスポンス
#[derive(Debug, Serialize)]
pub struct AvailabilityResponse {
    pub product_id: Uuid,
    pub total_stock: u32,
    pub booked: u32,
    pub held_by_this: u32,
    pub available: u32,
}

impl From<ProductAvailability> for AvailabilityResponse {
    fn from(entry: ProductAvailability) -> Self {
        Self {
            product_id: entry.product_id.value(),
            total_stock: entry.total_stock,
            booked: entry.booked,
            held_by_this: entry.held_by_this,
            available: entry.available,
        }
    }
}

/// 明細エラーの詳細
#[derive(Debug, Serialize)]
pub struct LineItemErrorDetail {
    pub product_id: Uuid,
    pub kind: &'static str,
    pub requested: u32,
    pub available: Option<u32>,
    pub message: String,
}

impl From<&LineItemError> for LineItemErrorDetail {
    fn from(error: &LineItemError) -> Self {
        Self {
            product_id: error.product_id.value(),
            kind: error.kind.as_str(),
            requested: error.requested,
            available: error.available,
            message: error.message(),
        }
    }
}

/// エラーレスポンス
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub details: Vec<LineItemErrorDetail>,
    /// 金額の上限（支払いは未払い残高、返金は保証金）
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<Decimal>,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            message: message.into(),
            details: Vec::new(),
            limit: None,
        }
    }

    pub fn with_limit(mut self, limit: Option<Decimal>) -> Self {
        self.limit = limit;
        self
    }

    pub fn with_details(mut self, details: Vec<LineItemErrorDetail>) -> Self {
        self.details = details;
        self
    }
}
