use tracing::debug;

use crate::domain::{
    self, BookingId, LineItemError, LineItemRequest, Product, ProductAvailability, ProductId,
    RentalPeriod, StockHold,
};

use super::booking_service::ServiceDependencies;
use super::errors::{BookingApplicationError, Result};

/// 期間に重なる有効な予約の在庫拘束を取得する
async fn load_holds(deps: &ServiceDependencies, period: &RentalPeriod) -> Result<Vec<StockHold>> {
    let bookings = deps
        .booking_read_model
        .find_active_overlapping(*period)
        .await
        .map_err(BookingApplicationError::ReadModelError)?;

    Ok(bookings.iter().flat_map(|b| b.stock_holds()).collect())
}

/// 明細の検証に必要な商品と在庫拘束を取得する
pub(super) async fn load_stock_context(
    deps: &ServiceDependencies,
    requests: &[LineItemRequest],
    period: &RentalPeriod,
) -> Result<(Vec<Product>, Vec<StockHold>)> {
    let mut ids: Vec<ProductId> = requests.iter().map(|r| r.product_id).collect();
    ids.sort();
    ids.dedup();

    let products = deps
        .product_catalog
        .find_by_ids(&ids)
        .await
        .map_err(BookingApplicationError::ProductCatalogError)?;
    let holds = load_holds(deps, period).await?;

    Ok((products, holds))
}

/// 期間中の商品ごとの空き数を計算する
///
/// `exclude`を指定すると、その予約を他の予約の集計から外し、拘束分を空き数に足し戻す
/// （編集画面での確認用）。
/// 結果は商品IDの順に並ぶ。在庫0の商品も含む。
pub async fn compute_availability(
    deps: &ServiceDependencies,
    period: RentalPeriod,
    exclude: Option<BookingId>,
) -> Result<Vec<ProductAvailability>> {
    let products = deps
        .product_catalog
        .list_rentable()
        .await
        .map_err(BookingApplicationError::ProductCatalogError)?;
    let holds = load_holds(deps, &period).await?;

    let mut availability: Vec<ProductAvailability> =
        domain::compute_availability(&products, &holds, &period, exclude)
            .into_values()
            .collect();
    availability.sort_by_key(|entry| entry.product_id);

    for entry in &availability {
        debug!(
            product_id = %entry.product_id.value(),
            total_stock = entry.total_stock,
            booked = entry.booked,
            held_by_this = entry.held_by_this,
            available = entry.available,
            "availability tally"
        );
    }

    Ok(availability)
}

/// 明細を在庫・空き状況に照らして検証する（読み取りのみ）
///
/// 問題のある明細をすべて返す。空のリストは検証成功を意味する。
pub async fn validate_line_items(
    deps: &ServiceDependencies,
    requests: &[LineItemRequest],
    period: RentalPeriod,
    exclude: Option<BookingId>,
) -> Result<Vec<LineItemError>> {
    let (products, holds) = load_stock_context(deps, requests, &period).await?;

    Ok(domain::validate_line_items(
        requests, &products, &holds, &period, exclude,
    ))
}
