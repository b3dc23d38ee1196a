use serde::{Deserialize, Serialize};

/// 予約ステータス
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BookingStatus {
    /// 下書き
    Draft,
    /// 確定済み
    Confirmed,
    /// 完了（返却済み）
    Completed,
    /// キャンセル済み
    Cancelled,
    /// 来店なし
    #[serde(rename = "No Show")]
    NoShow,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Draft => "Draft",
            BookingStatus::Confirmed => "Confirmed",
            BookingStatus::Completed => "Completed",
            BookingStatus::Cancelled => "Cancelled",
            BookingStatus::NoShow => "No Show",
        }
    }

    /// 在庫を消費するか
    ///
    /// キャンセル済み・完了済みの予約は在庫を拘束しない。
    pub fn holds_stock(&self) -> bool {
        !matches!(self, BookingStatus::Cancelled | BookingStatus::Completed)
    }
}

impl std::str::FromStr for BookingStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Draft" => Ok(BookingStatus::Draft),
            "Confirmed" => Ok(BookingStatus::Confirmed),
            "Completed" => Ok(BookingStatus::Completed),
            "Cancelled" => Ok(BookingStatus::Cancelled),
            "No Show" => Ok(BookingStatus::NoShow),
            _ => Err(format!("Invalid booking status: {}", s)),
        }
    }
}

/// 受け取りステータス
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PickupStatus {
    #[serde(rename = "Not Picked Up")]
    NotPickedUp,
    #[serde(rename = "Picked Up")]
    PickedUp,
    Delayed,
    Cancelled,
}

impl PickupStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PickupStatus::NotPickedUp => "Not Picked Up",
            PickupStatus::PickedUp => "Picked Up",
            PickupStatus::Delayed => "Delayed",
            PickupStatus::Cancelled => "Cancelled",
        }
    }
}

impl std::str::FromStr for PickupStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Not Picked Up" => Ok(PickupStatus::NotPickedUp),
            "Picked Up" => Ok(PickupStatus::PickedUp),
            "Delayed" => Ok(PickupStatus::Delayed),
            "Cancelled" => Ok(PickupStatus::Cancelled),
            _ => Err(format!("Invalid pickup status: {}", s)),
        }
    }
}

/// 返却ステータス
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReturnStatus {
    #[serde(rename = "Not Returned")]
    NotReturned,
    Returned,
    Overdue,
    #[serde(rename = "Partially Returned")]
    PartiallyReturned,
}

impl ReturnStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReturnStatus::NotReturned => "Not Returned",
            ReturnStatus::Returned => "Returned",
            ReturnStatus::Overdue => "Overdue",
            ReturnStatus::PartiallyReturned => "Partially Returned",
        }
    }
}

impl std::str::FromStr for ReturnStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Not Returned" => Ok(ReturnStatus::NotReturned),
            "Returned" => Ok(ReturnStatus::Returned),
            "Overdue" => Ok(ReturnStatus::Overdue),
            "Partially Returned" => Ok(ReturnStatus::PartiallyReturned),
            _ => Err(format!("Invalid return status: {}", s)),
        }
    }
}

/// 支払いステータス
///
/// Refunded / Overdue は外部のライフサイクルイベントでのみ設定され、
/// 料金計算からは導出されない。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PaymentStatus {
    Unpaid,
    #[serde(rename = "Partially Paid")]
    PartiallyPaid,
    Paid,
    Refunded,
    Overdue,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Unpaid => "Unpaid",
            PaymentStatus::PartiallyPaid => "Partially Paid",
            PaymentStatus::Paid => "Paid",
            PaymentStatus::Refunded => "Refunded",
            PaymentStatus::Overdue => "Overdue",
        }
    }
}

impl std::str::FromStr for PaymentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Unpaid" => Ok(PaymentStatus::Unpaid),
            "Partially Paid" => Ok(PaymentStatus::PartiallyPaid),
            "Paid" => Ok(PaymentStatus::Paid),
            "Refunded" => Ok(PaymentStatus::Refunded),
            "Overdue" => Ok(PaymentStatus::Overdue),
            _ => Err(format!("Invalid payment status: {}", s)),
        }
    }
}

/// 割引種別
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum DiscountType {
    #[default]
    None,
    Percentage,
    #[serde(rename = "Fixed Amount")]
    FixedAmount,
    #[serde(rename = "Promotional Code")]
    PromotionalCode,
}

impl DiscountType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DiscountType::None => "None",
            DiscountType::Percentage => "Percentage",
            DiscountType::FixedAmount => "Fixed Amount",
            DiscountType::PromotionalCode => "Promotional Code",
        }
    }
}

impl std::str::FromStr for DiscountType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "None" => Ok(DiscountType::None),
            "Percentage" => Ok(DiscountType::Percentage),
            "Fixed Amount" => Ok(DiscountType::FixedAmount),
            "Promotional Code" => Ok(DiscountType::PromotionalCode),
            _ => Err(format!("Invalid discount type: {}", s)),
        }
    }
}

/// 支払い・保証金返金の方法
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum PaymentMethod {
    #[default]
    Cash,
    #[serde(rename = "UPI")]
    Upi,
    #[serde(rename = "Bank Transfer")]
    BankTransfer,
    Card,
    Cheque,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Cash => "Cash",
            PaymentMethod::Upi => "UPI",
            PaymentMethod::BankTransfer => "Bank Transfer",
            PaymentMethod::Card => "Card",
            PaymentMethod::Cheque => "Cheque",
        }
    }
}

impl std::str::FromStr for PaymentMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Cash" => Ok(PaymentMethod::Cash),
            "UPI" => Ok(PaymentMethod::Upi),
            "Bank Transfer" => Ok(PaymentMethod::BankTransfer),
            "Card" => Ok(PaymentMethod::Card),
            "Cheque" => Ok(PaymentMethod::Cheque),
            _ => Err(format!("Invalid payment method: {}", s)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_booking_status_round_trips_display_names() {
        for status in [
            BookingStatus::Draft,
            BookingStatus::Confirmed,
            BookingStatus::Completed,
            BookingStatus::Cancelled,
            BookingStatus::NoShow,
        ] {
            assert_eq!(BookingStatus::from_str(status.as_str()), Ok(status));
        }
    }

    #[test]
    fn test_only_cancelled_and_completed_release_stock() {
        assert!(BookingStatus::Draft.holds_stock());
        assert!(BookingStatus::Confirmed.holds_stock());
        assert!(BookingStatus::NoShow.holds_stock());
        assert!(!BookingStatus::Cancelled.holds_stock());
        assert!(!BookingStatus::Completed.holds_stock());
    }

    #[test]
    fn test_discount_type_serde_uses_display_names() {
        let json = serde_json::to_string(&DiscountType::FixedAmount).unwrap();
        assert_eq!(json, "\"Fixed Amount\"");

        let parsed: DiscountType = serde_json::from_str("\"Promotional Code\"").unwrap();
        assert_eq!(parsed, DiscountType::PromotionalCode);
    }

    #[test]
    fn test_payment_status_rejects_unknown() {
        assert!(PaymentStatus::from_str("Settled").is_err());
    }
}
