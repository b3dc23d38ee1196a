use crate::application::booking::{AmountError, BookingApplicationError};
use crate::domain::{PaymentError, RefundError};
use rust_decimal::Decimal;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};

use super::types::{ErrorResponse, LineItemErrorDetail};

/// API層のエラー型
///
/// アプリケーション層のエラーと、リクエストの正規化に失敗した入力エラーを
/// HTTPレスポンスにマッピングする。
#[derive(Debug)]
pub enum ApiError {
    Application(BookingApplicationError),
    BadRequest(String),
}

impl From<BookingApplicationError> for ApiError {
    fn from(err: BookingApplicationError) -> Self {
        ApiError::Application(err)
    }
}

fn unprocessable(error_type: &str, message: String) -> (StatusCode, ErrorResponse) {
    (
        StatusCode::UNPROCESSABLE_ENTITY,
        ErrorResponse::new(error_type, message),
    )
}

/// 上限を超えた金額エラーの上限額
fn amount_limit(err: &AmountError) -> Option<Decimal> {
    match err {
        AmountError::Payment(PaymentError::ExceedsBalanceDue { balance_due, .. }) => {
            Some(*balance_due)
        }
        AmountError::Refund(RefundError::ExceedsDeposit { deposit, .. }) => Some(*deposit),
        AmountError::Payment(PaymentError::NonPositiveAmount)
        | AmountError::Refund(RefundError::NonPositiveAmount) => None,
    }
}

fn internal(error_type: &str, message: &str) -> (StatusCode, ErrorResponse) {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        ErrorResponse::new(error_type, message),
    )
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let err = match self {
            ApiError::BadRequest(message) => {
                let body = Json(ErrorResponse::new("BAD_REQUEST", message));
                return (StatusCode::BAD_REQUEST, body).into_response();
            }
            ApiError::Application(err) => err,
        };

        let message = err.to_string();
        let (status, body) = match err {
            // 404 Not Found - リクエストされたリソースが存在しない
            BookingApplicationError::BookingNotFound => (
                StatusCode::NOT_FOUND,
                ErrorResponse::new("BOOKING_NOT_FOUND", message),
            ),

            // 409 Conflict - 請求書発行済み、または同時更新
            BookingApplicationError::InvoiceAlreadyIssued => (
                StatusCode::CONFLICT,
                ErrorResponse::new("INVOICE_ALREADY_ISSUED", message),
            ),
            BookingApplicationError::ConcurrentModification(_) => (
                StatusCode::CONFLICT,
                ErrorResponse::new("CONCURRENT_MODIFICATION", message),
            ),

            // 422 Unprocessable Entity - ビジネスルール違反
            // 明細エラーは問題のある明細をすべてdetailsに入れる
            BookingApplicationError::InvalidLineItems(ref errors) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                ErrorResponse::new("INVALID_LINE_ITEMS", message)
                    .with_details(errors.iter().map(LineItemErrorDetail::from).collect()),
            ),
            BookingApplicationError::CustomerNotFound => {
                unprocessable("CUSTOMER_NOT_FOUND", message)
            }
            BookingApplicationError::InvalidDateRange(_) => {
                unprocessable("INVALID_DATE_RANGE", message)
            }
            BookingApplicationError::NoItems => unprocessable("NO_ITEMS", message),
            BookingApplicationError::InvalidPricing(_) => {
                unprocessable("INVALID_PRICING", message)
            }
            BookingApplicationError::InvalidPaymentAmount(ref e) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                ErrorResponse::new("INVALID_PAYMENT_AMOUNT", message).with_limit(amount_limit(e)),
            ),
            BookingApplicationError::InvalidStateTransition(_) => {
                unprocessable("INVALID_STATE_TRANSITION", message)
            }

            // 500 Internal Server Error - システム障害
            // 内部エラーの詳細はログに記録し、クライアントには一般的なメッセージのみを返す
            BookingApplicationError::EventStoreError(ref e) => {
                tracing::error!("Event store error: {}", e);
                internal("EVENT_STORE_ERROR", "Failed to store event")
            }
            BookingApplicationError::ReadModelError(ref e) => {
                tracing::error!("Read model error: {}", e);
                internal("READ_MODEL_ERROR", "Failed to access read model")
            }
            BookingApplicationError::ProductCatalogError(ref e) => {
                tracing::error!("Product catalog error: {}", e);
                internal("PRODUCT_CATALOG_ERROR", "Product catalog error")
            }
            BookingApplicationError::CustomerDirectoryError(ref e) => {
                tracing::error!("Customer directory error: {}", e);
                internal("CUSTOMER_DIRECTORY_ERROR", "Customer directory error")
            }
            BookingApplicationError::InvoiceRegistryError(ref e) => {
                tracing::error!("Invoice registry error: {}", e);
                internal("INVOICE_REGISTRY_ERROR", "Invoice registry error")
            }
        };

        (status, Json(body)).into_response()
    }
}
