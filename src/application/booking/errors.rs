use thiserror::Error;

use crate::domain::{
    CreateBookingError, DateRangeError, LineItemError, PaymentError, PricingInputError,
    RecordPaymentError, RefundError, ReturnBookingError, ReviseBookingError, TransitionError,
};
use crate::ports::VersionConflict;

/// 支払い・返金額の不正（上限額などの詳細を保持する）
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AmountError {
    #[error(transparent)]
    Payment(#[from] PaymentError),
    #[error(transparent)]
    Refund(#[from] RefundError),
}

/// 予約管理アプリケーション層のエラー
#[derive(Debug, Error)]
pub enum BookingApplicationError {
    /// 返却予定日が受け取り日より後ではない
    #[error(transparent)]
    InvalidDateRange(#[from] DateRangeError),

    /// 在庫・空き状況の検証に失敗した明細（すべて）
    #[error("{} line item(s) failed validation", .0.len())]
    InvalidLineItems(Vec<LineItemError>),

    /// 明細が1件もない
    #[error("Booking must contain at least one item")]
    NoItems,

    /// 割引・税率・金額の入力が不正
    #[error(transparent)]
    InvalidPricing(#[from] PricingInputError),

    /// 支払い・返金額が不正
    #[error(transparent)]
    InvalidPaymentAmount(#[from] AmountError),

    /// 現在の状態では実行できない操作
    #[error(transparent)]
    InvalidStateTransition(#[from] TransitionError),

    /// 顧客が存在しない
    #[error("Customer not found")]
    CustomerNotFound,

    /// 予約が見つからない
    #[error("Booking not found")]
    BookingNotFound,

    /// 請求書発行済みのため変更不可
    #[error("An invoice already references this booking")]
    InvoiceAlreadyIssued,

    /// 読み込み後に同じ予約へ別の変更が保存された
    #[error(transparent)]
    ConcurrentModification(#[from] VersionConflict),

    /// EventStoreのエラー
    #[error("Event store error")]
    EventStoreError(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// ReadModelのエラー
    #[error("Read model error")]
    ReadModelError(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// ProductCatalogのエラー
    #[error("Product catalog error")]
    ProductCatalogError(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// CustomerDirectoryのエラー
    #[error("Customer directory error")]
    CustomerDirectoryError(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// InvoiceRegistryのエラー
    #[error("Invoice registry error")]
    InvoiceRegistryError(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl From<CreateBookingError> for BookingApplicationError {
    fn from(e: CreateBookingError) -> Self {
        match e {
            CreateBookingError::NoItems => Self::NoItems,
            CreateBookingError::Payment(e) => Self::InvalidPaymentAmount(e.into()),
        }
    }
}

impl From<ReviseBookingError> for BookingApplicationError {
    fn from(e: ReviseBookingError) -> Self {
        match e {
            ReviseBookingError::NoItems => Self::NoItems,
            ReviseBookingError::Transition(e) => Self::InvalidStateTransition(e),
        }
    }
}

impl From<RecordPaymentError> for BookingApplicationError {
    fn from(e: RecordPaymentError) -> Self {
        match e {
            RecordPaymentError::Transition(e) => Self::InvalidStateTransition(e),
            RecordPaymentError::Payment(e) => Self::InvalidPaymentAmount(e.into()),
        }
    }
}

impl From<ReturnBookingError> for BookingApplicationError {
    fn from(e: ReturnBookingError) -> Self {
        match e {
            ReturnBookingError::Transition(e) => Self::InvalidStateTransition(e),
            ReturnBookingError::Refund(e) => Self::InvalidPaymentAmount(e.into()),
        }
    }
}

impl BookingApplicationError {
    /// EventStoreのエラーを分類する（バージョン競合は業務エラーとして扱う）
    pub(super) fn from_event_store(e: Box<dyn std::error::Error + Send + Sync>) -> Self {
        match e.downcast::<VersionConflict>() {
            Ok(conflict) => Self::ConcurrentModification(*conflict),
            Err(e) => Self::EventStoreError(e),
        }
    }
}

/// アプリケーション層の Result型
pub type Result<T> = std::result::Result<T, BookingApplicationError>;
