//! 在庫の空き状況
//!
//! 指定期間に重なる有効な予約を集計し、商品ごとの空き数を求める。
//! 読み取り専用の純粋関数のみ。競合する予約作成との順序保証はアプリケーション層の責務。

use std::collections::HashMap;

use serde::Serialize;

use super::{
    BookingId, BookingStatus, LineItemError, LineItemErrorKind, LineItemRequest, Product,
    ProductId, RentalPeriod,
};

/// 予約明細による在庫の拘束
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StockHold {
    pub booking_id: BookingId,
    pub booking_status: BookingStatus,
    pub period: RentalPeriod,
    pub product_id: ProductId,
    pub quantity: u32,
}

impl StockHold {
    /// 指定期間の在庫を消費するか
    fn consumes(&self, period: &RentalPeriod) -> bool {
        self.booking_status.holds_stock() && self.period.overlaps(period)
    }
}

/// 商品1件の空き状況の内訳
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ProductAvailability {
    pub product_id: ProductId,
    pub total_stock: u32,
    /// 期間中に重なる他の有効な予約の数量（除外対象の予約は含まない）
    pub booked: u32,
    /// 除外対象の予約が期間中に拘束している数量
    pub held_by_this: u32,
    pub available: u32,
}

/// 期間中の拘束数量を（他の予約, 除外対象の予約）に分けて集計する
fn tally(
    product_id: ProductId,
    holds: &[StockHold],
    period: &RentalPeriod,
    exclude: Option<BookingId>,
) -> (u32, u32) {
    holds
        .iter()
        .filter(|hold| hold.product_id == product_id && hold.consumes(period))
        .fold((0u32, 0u32), |(others, own), hold| {
            if Some(hold.booking_id) == exclude {
                (others, own.saturating_add(hold.quantity))
            } else {
                (others.saturating_add(hold.quantity), own)
            }
        })
}

fn floor_at_zero(value: i64) -> u32 {
    u32::try_from(value.max(0)).unwrap_or(u32::MAX)
}

/// 純粋関数：商品ごとの空き数を計算する
///
/// ビジネスルール：
/// - キャンセル済み・完了済みの予約は在庫を消費しない
/// - 重なり判定は暦日の閉区間（境界が接していても重なる）
/// - `exclude`の予約は「他の予約」の集計から外し、その拘束分を空き数に足し戻す
/// - 空き数 = 総在庫 − 他の予約 + 自予約の拘束分（0未満は0）
/// - 在庫0の商品も省略せず空き0として返す
pub fn compute_availability(
    products: &[Product],
    holds: &[StockHold],
    period: &RentalPeriod,
    exclude: Option<BookingId>,
) -> HashMap<ProductId, ProductAvailability> {
    products
        .iter()
        .map(|product| {
            let (booked, held_by_this) = tally(product.product_id, holds, period, exclude);
            let available = floor_at_zero(
                i64::from(product.total_stock) - i64::from(booked) + i64::from(held_by_this),
            );

            (
                product.product_id,
                ProductAvailability {
                    product_id: product.product_id,
                    total_stock: product.total_stock,
                    booked,
                    held_by_this,
                    available,
                },
            )
        })
        .collect()
}

/// 純粋関数：明細を在庫と空き状況に照らして検証する
///
/// 最初のエラーで打ち切らず、問題のある明細をすべて返す。
/// 空のリストは検証成功を意味する。
///
/// 明細ごとの判定順：
/// 1. 商品が存在しない → NotFound
/// 2. 総在庫数を超える → ExceedsStock（期間に依存しない）
/// 3. 同じ商品の明細の合計が 総在庫 − 他の予約 を超える → ExceedsAvailability
///
/// 自予約の拘束分は足し戻さない（`compute_availability`の表示値とは異なる）。
pub fn validate_line_items(
    requests: &[LineItemRequest],
    products: &[Product],
    holds: &[StockHold],
    period: &RentalPeriod,
    exclude: Option<BookingId>,
) -> Vec<LineItemError> {
    let mut requested_per_product: HashMap<ProductId, u32> = HashMap::new();
    for request in requests {
        let total = requested_per_product.entry(request.product_id).or_default();
        *total = total.saturating_add(request.quantity.value());
    }

    let mut errors = Vec::new();

    for request in requests {
        let requested = request.quantity.value();

        let Some(product) = products.iter().find(|p| p.product_id == request.product_id) else {
            errors.push(LineItemError {
                product_id: request.product_id,
                kind: LineItemErrorKind::NotFound,
                requested,
                available: None,
            });
            continue;
        };

        if requested > product.total_stock {
            errors.push(LineItemError {
                product_id: request.product_id,
                kind: LineItemErrorKind::ExceedsStock,
                requested,
                available: Some(product.total_stock),
            });
            continue;
        }

        let (booked_by_others, _) = tally(product.product_id, holds, period, exclude);
        let available =
            floor_at_zero(i64::from(product.total_stock) - i64::from(booked_by_others));
        let combined = requested_per_product
            .get(&request.product_id)
            .copied()
            .unwrap_or(requested);

        if combined > available {
            errors.push(LineItemError {
                product_id: request.product_id,
                kind: LineItemErrorKind::ExceedsAvailability,
                requested: combined,
                available: Some(available),
            });
        }
    }

    errors
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Quantity;
    use chrono::{DateTime, TimeZone, Utc};
    use rust_decimal::Decimal;

    fn at(m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, m, d, 0, 0, 0).unwrap()
    }

    fn period(from: DateTime<Utc>, to: DateTime<Utc>) -> RentalPeriod {
        RentalPeriod::new(from, to).unwrap()
    }

    fn product(total_stock: u32) -> Product {
        Product {
            product_id: ProductId::new(),
            display_name: "Lehenga".to_string(),
            sku: None,
            total_stock,
            base_rental_price: Decimal::from(700),
            base_security_deposit: Decimal::from(1000),
        }
    }

    fn hold(
        product: &Product,
        quantity: u32,
        status: BookingStatus,
        period: RentalPeriod,
    ) -> StockHold {
        StockHold {
            booking_id: BookingId::new(),
            booking_status: status,
            period,
            product_id: product.product_id,
            quantity,
        }
    }

    fn request(product_id: ProductId, quantity: u32) -> LineItemRequest {
        LineItemRequest {
            product_id,
            quantity: Quantity::try_from(quantity).unwrap(),
            rental_price_per_unit_per_day: None,
            security_deposit_per_unit: None,
        }
    }

    // TDD: compute_availability() のテスト
    #[test]
    fn test_scenario_d_overlapping_booking_consumes_stock() {
        let p = product(3);
        let holds = vec![hold(&p, 2, BookingStatus::Confirmed, period(at(1, 1), at(1, 5)))];

        let overlapping = compute_availability(
            std::slice::from_ref(&p),
            &holds,
            &period(at(1, 3), at(1, 10)),
            None,
        );
        assert_eq!(overlapping[&p.product_id].available, 1);

        let disjoint = compute_availability(
            std::slice::from_ref(&p),
            &holds,
            &period(at(1, 6), at(1, 10)),
            None,
        );
        assert_eq!(disjoint[&p.product_id].available, 3);
    }

    #[test]
    fn test_identical_range_counts_as_overlap() {
        let p = product(1);
        let range = period(at(2, 1), at(2, 4));
        let holds = vec![hold(&p, 1, BookingStatus::Draft, range)];

        let result = compute_availability(std::slice::from_ref(&p), &holds, &range, None);

        assert_eq!(result[&p.product_id].available, 0);
    }

    #[test]
    fn test_cancelled_and_completed_bookings_release_stock() {
        let p = product(2);
        let range = period(at(3, 1), at(3, 3));
        let holds = vec![
            hold(&p, 2, BookingStatus::Cancelled, range),
            hold(&p, 2, BookingStatus::Completed, range),
        ];

        let result = compute_availability(std::slice::from_ref(&p), &holds, &range, None);

        assert_eq!(result[&p.product_id].available, 2);
    }

    #[test]
    fn test_zero_stock_product_is_listed_as_unavailable() {
        let p = product(0);
        let result =
            compute_availability(std::slice::from_ref(&p), &[], &period(at(1, 1), at(1, 2)), None);

        assert_eq!(result.len(), 1);
        assert_eq!(result[&p.product_id].available, 0);
    }

    #[test]
    fn test_overbooked_product_floors_at_zero() {
        let p = product(1);
        let range = period(at(1, 1), at(1, 2));
        let holds = vec![
            hold(&p, 1, BookingStatus::Confirmed, range),
            hold(&p, 2, BookingStatus::Confirmed, range),
        ];

        let result = compute_availability(std::slice::from_ref(&p), &holds, &range, None);

        assert_eq!(result[&p.product_id].available, 0);
    }

    #[test]
    fn test_excluded_booking_is_added_back() {
        let p = product(5);
        let range = period(at(4, 1), at(4, 5));
        let own = hold(&p, 2, BookingStatus::Confirmed, range);
        let other = hold(&p, 1, BookingStatus::Confirmed, range);
        let others_only = vec![other];
        let with_own = vec![other, own];

        let before = compute_availability(std::slice::from_ref(&p), &others_only, &range, None);
        let during_edit = compute_availability(
            std::slice::from_ref(&p),
            &with_own,
            &range,
            Some(own.booking_id),
        );

        // 空き数 = 5 − 1 + 2
        assert_eq!(before[&p.product_id].available, 4);
        assert_eq!(during_edit[&p.product_id].booked, 1);
        assert_eq!(during_edit[&p.product_id].held_by_this, 2);
        assert_eq!(during_edit[&p.product_id].available, 6);
    }

    #[test]
    fn test_excluded_sole_booking_reports_stock_plus_hold() {
        let p = product(2);
        let range = period(at(1, 1), at(1, 5));
        let own = hold(&p, 2, BookingStatus::Confirmed, range);

        let result = compute_availability(
            std::slice::from_ref(&p),
            &[own],
            &range,
            Some(own.booking_id),
        );

        assert_eq!(result[&p.product_id].booked, 0);
        assert_eq!(result[&p.product_id].held_by_this, 2);
        assert_eq!(result[&p.product_id].available, 4);
    }

    #[test]
    fn test_excluded_booking_outside_range_is_not_added_back() {
        let p = product(3);
        let own = hold(&p, 2, BookingStatus::Confirmed, period(at(5, 1), at(5, 2)));

        let result = compute_availability(
            std::slice::from_ref(&p),
            &[own],
            &period(at(5, 10), at(5, 12)),
            Some(own.booking_id),
        );

        assert_eq!(result[&p.product_id].held_by_this, 0);
        assert_eq!(result[&p.product_id].available, 3);
    }

    // TDD: validate_line_items() のテスト
    #[test]
    fn test_validate_accepts_available_items() {
        let p = product(3);
        let errors = validate_line_items(
            &[request(p.product_id, 3)],
            std::slice::from_ref(&p),
            &[],
            &period(at(1, 1), at(1, 3)),
            None,
        );

        assert!(errors.is_empty());
    }

    #[test]
    fn test_validate_accumulates_every_error() {
        let scarce = product(3);
        let small = product(1);
        let missing = ProductId::new();
        let range = period(at(1, 3), at(1, 10));
        let holds = vec![hold(&scarce, 2, BookingStatus::Confirmed, period(at(1, 1), at(1, 5)))];

        let errors = validate_line_items(
            &[
                request(missing, 1),
                request(small.product_id, 2),
                request(scarce.product_id, 2),
            ],
            &[scarce.clone(), small.clone()],
            &holds,
            &range,
            None,
        );

        assert_eq!(errors.len(), 3);
        assert_eq!(errors[0].kind, LineItemErrorKind::NotFound);
        assert_eq!(errors[0].product_id, missing);
        assert_eq!(errors[1].kind, LineItemErrorKind::ExceedsStock);
        assert_eq!(errors[1].available, Some(1));
        assert_eq!(errors[2].kind, LineItemErrorKind::ExceedsAvailability);
        assert_eq!(errors[2].requested, 2);
        assert_eq!(errors[2].available, Some(1));
        assert_eq!(
            errors[2].message(),
            "Only 1 unit(s) available for selected dates. You requested 2."
        );
    }

    #[test]
    fn test_validate_does_not_add_back_own_hold() {
        let p = product(5);
        let range = period(at(7, 1), at(7, 4));
        let own = hold(&p, 2, BookingStatus::Confirmed, range);
        let other = hold(&p, 2, BookingStatus::Confirmed, range);

        let shown = compute_availability(
            std::slice::from_ref(&p),
            &[own, other],
            &range,
            Some(own.booking_id),
        );
        let errors = validate_line_items(
            &[request(p.product_id, 4)],
            std::slice::from_ref(&p),
            &[own, other],
            &range,
            Some(own.booking_id),
        );

        assert_eq!(shown[&p.product_id].available, 5);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].kind, LineItemErrorKind::ExceedsAvailability);
        assert_eq!(errors[0].available, Some(3));
    }

    #[test]
    fn test_validate_sums_lines_for_the_same_product() {
        let p = product(3);
        let range = period(at(8, 1), at(8, 3));

        let errors = validate_line_items(
            &[request(p.product_id, 2), request(p.product_id, 2)],
            std::slice::from_ref(&p),
            &[],
            &range,
            None,
        );

        assert_eq!(errors.len(), 2);
        assert!(errors.iter().all(|e| e.kind == LineItemErrorKind::ExceedsAvailability));
        assert_eq!(errors[0].requested, 4);
        assert_eq!(errors[0].available, Some(3));
    }

    #[test]
    fn test_validate_with_exclusion_accepts_unchanged_booking() {
        let p = product(2);
        let range = period(at(6, 1), at(6, 4));
        let own = hold(&p, 2, BookingStatus::Draft, range);

        let without_exclusion = validate_line_items(
            &[request(p.product_id, 2)],
            std::slice::from_ref(&p),
            &[own],
            &range,
            None,
        );
        let with_exclusion = validate_line_items(
            &[request(p.product_id, 2)],
            std::slice::from_ref(&p),
            &[own],
            &range,
            Some(own.booking_id),
        );

        assert_eq!(without_exclusion.len(), 1);
        assert!(with_exclusion.is_empty());
    }
}
