use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::QuantityError;

/// 予約ID - 予約管理コンテキストの集約ID
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BookingId(Uuid);

impl BookingId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn value(&self) -> Uuid {
        self.0
    }
}

impl Default for BookingId {
    fn default() -> Self {
        Self::new()
    }
}

/// 商品ID - 在庫管理コンテキストへの参照
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ProductId(Uuid);

impl ProductId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn value(&self) -> Uuid {
        self.0
    }
}

impl Default for ProductId {
    fn default() -> Self {
        Self::new()
    }
}

/// 顧客ID - 顧客管理コンテキストへの参照
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CustomerId(Uuid);

impl CustomerId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn value(&self) -> Uuid {
        self.0
    }
}

impl Default for CustomerId {
    fn default() -> Self {
        Self::new()
    }
}

/// 職員ID - 職員管理コンテキストへの参照
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StaffId(Uuid);

impl StaffId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn value(&self) -> Uuid {
        self.0
    }
}

impl Default for StaffId {
    fn default() -> Self {
        Self::new()
    }
}

/// 予約コードの接頭辞
pub const BOOKING_CODE_PREFIX: &str = "BO";

/// 予約コード
///
/// 形式: `BO` + `YYYYMMDD` + 3桁の日次連番（例: `BO20260101001`）
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BookingCode(String);

impl BookingCode {
    /// 日付と連番から予約コードを組み立てる
    pub fn new(date: NaiveDate, sequence: u32) -> Self {
        Self(format!("{}{:03}", Self::prefix_for(date), sequence))
    }

    /// 永続化済みの文字列から復元する（検証しない）
    pub fn from_string(code: String) -> Self {
        Self(code)
    }

    /// 指定日の予約コード接頭辞（例: `BO20260101`）
    pub fn prefix_for(date: NaiveDate) -> String {
        format!("{}{}", BOOKING_CODE_PREFIX, date.format("%Y%m%d"))
    }

    /// 末尾の連番部分
    ///
    /// 接頭辞の後ろが数値として読めない場合は`None`。
    pub fn sequence(&self) -> Option<u32> {
        let digits = self.0.get(BOOKING_CODE_PREFIX.len() + 8..)?;
        digits.parse().ok()
    }

    /// 同じ日の次の予約コード
    ///
    /// `latest`はその日に発行された最新のコード。無ければ連番1から始める。
    pub fn next_for(date: NaiveDate, latest: Option<&BookingCode>) -> Self {
        let sequence = latest.and_then(BookingCode::sequence).unwrap_or(0) + 1;
        Self::new(date, sequence)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for BookingCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// 数量
///
/// 不変条件：1以上。
/// 型システムでこの制約を強制し、0個の明細を作成できないようにする。
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct Quantity(u32);

impl Quantity {
    pub fn value(&self) -> u32 {
        self.0
    }
}

impl TryFrom<u32> for Quantity {
    type Error = QuantityError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        if value == 0 {
            return Err(QuantityError::Zero);
        }
        Ok(Self(value))
    }
}

impl From<Quantity> for u32 {
    fn from(quantity: Quantity) -> Self {
        quantity.0
    }
}
