use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::DateRangeError;

const MILLIS_PER_DAY: i64 = 24 * 60 * 60 * 1000;

/// 期間を日数に切り上げる（負の期間は0日）
fn ceil_days(duration: Duration) -> i64 {
    let millis = duration.num_milliseconds();
    if millis <= 0 {
        return 0;
    }
    (millis + MILLIS_PER_DAY - 1) / MILLIS_PER_DAY
}

/// 純粋関数：レンタル日数
///
/// 受け取り日から返却予定日までの日数を切り上げる。最小値は1日
/// （同日・1日未満のレンタルも1日分として請求する）。
pub fn compute_rental_days(pickup_date: DateTime<Utc>, return_date: DateTime<Utc>) -> i64 {
    ceil_days(return_date - pickup_date).max(1)
}

/// 純粋関数：延滞日数
///
/// 実返却日が返却予定日より後の場合のみ切り上げた日数を返す。それ以外は0。
pub fn compute_days_late(
    expected_return_date: DateTime<Utc>,
    actual_return_date: DateTime<Utc>,
) -> i64 {
    if actual_return_date <= expected_return_date {
        return 0;
    }
    ceil_days(actual_return_date - expected_return_date)
}

/// レンタル期間
///
/// 不変条件：返却予定日は受け取り日より後。
/// 重なり判定は暦日単位で行い、時刻は無視する。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RentalPeriod {
    pickup_date: DateTime<Utc>,
    expected_return_date: DateTime<Utc>,
}

impl RentalPeriod {
    /// # エラー
    /// 返却予定日が受け取り日以前の場合は`DateRangeError::ReturnNotAfterPickup`
    pub fn new(
        pickup_date: DateTime<Utc>,
        expected_return_date: DateTime<Utc>,
    ) -> Result<Self, DateRangeError> {
        if expected_return_date <= pickup_date {
            return Err(DateRangeError::ReturnNotAfterPickup);
        }
        Ok(Self {
            pickup_date,
            expected_return_date,
        })
    }

    pub fn pickup_date(&self) -> DateTime<Utc> {
        self.pickup_date
    }

    pub fn expected_return_date(&self) -> DateTime<Utc> {
        self.expected_return_date
    }

    pub fn first_day(&self) -> NaiveDate {
        self.pickup_date.date_naive()
    }

    pub fn last_day(&self) -> NaiveDate {
        self.expected_return_date.date_naive()
    }

    /// 閉区間での重なり判定
    ///
    /// 境界が接しているだけの期間も重なりとみなす（保守的な判定）。
    pub fn overlaps(&self, other: &RentalPeriod) -> bool {
        self.first_day() <= other.last_day() && self.last_day() >= other.first_day()
    }

    pub fn rental_days(&self) -> i64 {
        compute_rental_days(self.pickup_date, self.expected_return_date)
    }

    /// 基準時刻時点での延滞日数（未返却として計算）
    pub fn overdue_days(&self, now: DateTime<Utc>) -> i64 {
        compute_days_late(self.expected_return_date, now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap()
    }

    fn period(from: DateTime<Utc>, to: DateTime<Utc>) -> RentalPeriod {
        RentalPeriod::new(from, to).unwrap()
    }

    #[test]
    fn test_new_rejects_return_before_pickup() {
        let result = RentalPeriod::new(at(2026, 1, 5), at(2026, 1, 1));
        assert_eq!(result, Err(DateRangeError::ReturnNotAfterPickup));
    }

    #[test]
    fn test_new_rejects_equal_dates() {
        let result = RentalPeriod::new(at(2026, 1, 5), at(2026, 1, 5));
        assert_eq!(result, Err(DateRangeError::ReturnNotAfterPickup));
    }

    #[test]
    fn test_rental_days_whole_days() {
        assert_eq!(compute_rental_days(at(2026, 1, 1), at(2026, 1, 3)), 2);
    }

    #[test]
    fn test_rental_days_rounds_partial_day_up() {
        let pickup = at(2026, 1, 1);
        let ret = pickup + Duration::days(2) + Duration::hours(1);
        assert_eq!(compute_rental_days(pickup, ret), 3);
    }

    #[test]
    fn test_rental_days_floor_is_one() {
        let pickup = at(2026, 1, 1);
        assert_eq!(compute_rental_days(pickup, pickup), 1);
        assert_eq!(compute_rental_days(pickup, pickup + Duration::hours(3)), 1);
        assert_eq!(compute_rental_days(pickup, pickup + Duration::milliseconds(1)), 1);
    }

    #[test]
    fn test_days_late_zero_when_on_time() {
        assert_eq!(compute_days_late(at(2026, 1, 10), at(2026, 1, 10)), 0);
        assert_eq!(compute_days_late(at(2026, 1, 10), at(2026, 1, 9)), 0);
    }

    #[test]
    fn test_days_late_rounds_up() {
        assert_eq!(compute_days_late(at(2026, 1, 10), at(2026, 1, 12)), 2);
        let late = at(2026, 1, 10) + Duration::minutes(5);
        assert_eq!(compute_days_late(at(2026, 1, 10), late), 1);
    }

    #[test]
    fn test_identical_ranges_overlap() {
        let a = period(at(2026, 1, 1), at(2026, 1, 5));
        let b = period(at(2026, 1, 1), at(2026, 1, 5));
        assert!(a.overlaps(&b));
    }

    #[test]
    fn test_touching_boundaries_overlap() {
        let a = period(at(2026, 1, 1), at(2026, 1, 5));
        let b = period(at(2026, 1, 5), at(2026, 1, 8));
        assert!(a.overlaps(&b));
        assert!(b.overlaps(&a));
    }

    #[test]
    fn test_overlap_ignores_time_of_day() {
        let a = period(at(2026, 1, 1), at(2026, 1, 5) + Duration::hours(9));
        let b = period(at(2026, 1, 5) + Duration::hours(18), at(2026, 1, 7));
        assert!(a.overlaps(&b));
    }

    #[test]
    fn test_disjoint_ranges_do_not_overlap() {
        let a = period(at(2026, 1, 1), at(2026, 1, 5));
        let b = period(at(2026, 1, 6), at(2026, 1, 10));
        assert!(!a.overlaps(&b));
        assert!(!b.overlaps(&a));
    }

    #[test]
    fn test_overdue_days() {
        let p = period(at(2026, 1, 1), at(2026, 1, 10));
        assert_eq!(p.overdue_days(at(2026, 1, 9)), 0);
        assert_eq!(p.overdue_days(at(2026, 1, 13)), 3);
    }
}
