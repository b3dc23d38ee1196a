use chrono::Utc;
use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::{info, warn};

use crate::domain::{
    self, Booking, BookingCode, BookingDraft, BookingId, BookingLineItem, Discount, DiscountType,
    DomainEvent, LineItemRequest, PricingTerms, ProductId, RentalPeriod, commands::*,
};
use crate::ports::*;

use super::availability_service::load_stock_context;
use super::errors::{BookingApplicationError, Result};
use super::reservation_lock::BookingLocks;

/// サービスの依存関係
///
/// 関数型DDDの原則に従い、データ構造として定義。
/// 振る舞い（メソッド）は持たず、純粋な関数に依存関係を渡す。
#[derive(Clone)]
pub struct ServiceDependencies {
    pub event_store: Arc<dyn EventStore>,
    pub booking_read_model: Arc<dyn BookingReadModel>,
    pub product_catalog: Arc<dyn ProductCatalog>,
    pub customer_directory: Arc<dyn CustomerDirectory>,
    pub invoice_registry: Arc<dyn InvoiceRegistry>,
    pub locks: Arc<BookingLocks>,
}

/// イベントストアから復元した予約と、その時点のバージョン（イベント数）
pub(super) struct LoadedBooking {
    pub booking: Booking,
    pub version: u32,
}

/// イベントストアから予約集約を復元するヘルパー関数
///
/// # エラー
/// - EventStoreError: イベント読み込み失敗、またはイベント列が不正
/// - BookingNotFound: イベントが存在しない
pub(super) async fn load_booking(
    event_store: &Arc<dyn EventStore>,
    booking_id: BookingId,
) -> Result<LoadedBooking> {
    let events = event_store
        .load(booking_id)
        .await
        .map_err(BookingApplicationError::EventStoreError)?;
    let version = u32::try_from(events.len())
        .map_err(|e| BookingApplicationError::EventStoreError(Box::new(e)))?;

    let booking = domain::booking::replay_events(&events)
        .map_err(|e| BookingApplicationError::EventStoreError(Box::new(e)))?
        .ok_or(BookingApplicationError::BookingNotFound)?;

    Ok(LoadedBooking { booking, version })
}

/// イベントを保存し、Read Modelを集約の完全な状態で更新する
///
/// `expected_version`は集約を読み込んだ時点のバージョン。その後に別の書き込みが
/// 入っていればConcurrentModificationで拒否され、Read Modelも更新しない。
/// EventStoreとReadModelは独立して更新される（結果整合性）。
pub(super) async fn persist(
    deps: &ServiceDependencies,
    booking: &Booking,
    expected_version: u32,
    event: DomainEvent,
) -> Result<()> {
    deps.event_store
        .append(booking.booking_id, expected_version, vec![event])
        .await
        .map_err(BookingApplicationError::from_event_store)?;

    deps.booking_read_model
        .save(booking.clone())
        .await
        .map_err(BookingApplicationError::ReadModelError)?;

    Ok(())
}

/// 請求書発行済みの予約を拒否する
async fn ensure_not_invoiced(deps: &ServiceDependencies, booking_id: BookingId) -> Result<()> {
    let invoiced = deps
        .invoice_registry
        .has_invoice(booking_id)
        .await
        .map_err(BookingApplicationError::InvoiceRegistryError)?;

    if invoiced {
        return Err(BookingApplicationError::InvoiceAlreadyIssued);
    }
    Ok(())
}

/// 入力境界：明細・料金条件を型付きの値へ検証する
fn validate_terms(
    items: &[LineItemRequest],
    discount_type: DiscountType,
    discount_value: Decimal,
    tax_rate: Option<Decimal>,
    security_deposit_override: Option<Decimal>,
) -> Result<PricingTerms> {
    if items.is_empty() {
        return Err(BookingApplicationError::NoItems);
    }
    for item in items {
        item.validate()?;
    }

    let discount = Discount::new(discount_type, discount_value)?;
    Ok(PricingTerms::new(discount, tax_rate, security_deposit_override)?)
}

/// 明細を在庫・空き状況に照らして検証し、商品の基本値で確定する
///
/// 呼び出し側は対象商品のロックを保持していること。
async fn resolve_line_items(
    deps: &ServiceDependencies,
    requests: &[LineItemRequest],
    period: &RentalPeriod,
    exclude: Option<BookingId>,
) -> Result<Vec<BookingLineItem>> {
    let (products, holds) = load_stock_context(deps, requests, period).await?;

    let errors = domain::validate_line_items(requests, &products, &holds, period, exclude);
    if !errors.is_empty() {
        for error in &errors {
            warn!(
                product_id = %error.product_id.value(),
                kind = error.kind.as_str(),
                requested = error.requested,
                available = ?error.available,
                "line item rejected"
            );
        }
        return Err(BookingApplicationError::InvalidLineItems(errors));
    }

    Ok(requests
        .iter()
        .filter_map(|request| {
            products
                .iter()
                .find(|p| p.product_id == request.product_id)
                .map(|product| BookingLineItem::from_request(request, product))
        })
        .collect())
}

fn product_ids(requests: &[LineItemRequest]) -> Vec<ProductId> {
    requests.iter().map(|r| r.product_id).collect()
}

/// 予約を作成する
///
/// ビジネスルール：
/// - 顧客が存在すること
/// - 明細が1件以上あり、金額・割引・税率が妥当であること
/// - 返却予定日が受け取り日より後であること
/// - すべての明細が在庫・期間中の空き数以内であること（1件でも不可なら全体を拒否）
///
/// # 一貫性保証
///
/// 空き状況の確認から保存までは対象商品のロック内で行う（同一プロセス内のみ）。
/// EventStoreとReadModelは独立して更新される（結果整合性）。
///
/// # 戻り値
/// 作成された予約
pub async fn create_booking(deps: &ServiceDependencies, cmd: CreateBooking) -> Result<Booking> {
    // 1. 顧客の存在確認
    let customer_exists = deps
        .customer_directory
        .exists(cmd.customer_id)
        .await
        .map_err(BookingApplicationError::CustomerDirectoryError)?;

    if !customer_exists {
        return Err(BookingApplicationError::CustomerNotFound);
    }

    // 2. 入力の検証（日付範囲・明細・料金条件）
    let period = RentalPeriod::new(cmd.pickup_date, cmd.expected_return_date)?;
    let pricing = validate_terms(
        &cmd.items,
        cmd.discount_type,
        cmd.discount_value,
        cmd.tax_rate,
        cmd.security_deposit_override,
    )?;

    // 3. 対象商品のロックを取得し、在庫・空き状況を検証
    let _reservation = deps.locks.reserve_products(&product_ids(&cmd.items)).await;
    let items = resolve_line_items(deps, &cmd.items, &period, None).await?;

    // 4. 予約コードを採番し、ドメイン層の純粋関数を呼び出し
    let _code_guard = deps.locks.reserve_code().await;
    let created_at = Utc::now();
    let prefix = BookingCode::prefix_for(created_at.date_naive());
    let latest = deps
        .booking_read_model
        .latest_booking_code_with_prefix(&prefix)
        .await
        .map_err(BookingApplicationError::ReadModelError)?;

    let draft = BookingDraft {
        booking_code: BookingCode::next_for(created_at.date_naive(), latest.as_ref()),
        customer_id: cmd.customer_id,
        period,
        items,
        pricing,
        initial_payment: cmd.initial_payment,
        created_by: cmd.staff_id,
    };
    let (booking, event) = domain::booking::create_booking(draft, created_at)?;

    // 5. イベントストアに保存し、Read Modelを更新
    persist(deps, &booking, 0, DomainEvent::BookingCreated(event)).await?;

    info!(
        booking_id = %booking.booking_id.value(),
        booking_code = %booking.booking_code,
        total_amount = %booking.totals.total_amount,
        "booking created"
    );

    Ok(booking)
}

/// 予約内容を変更する
///
/// ビジネスルール：
/// - 予約が存在し、請求書が発行されていないこと
/// - 受け取り前の下書き・確定済みであること
/// - 自予約の拘束分を除外して在庫・空き状況を再検証すること
/// - 金額は全項目を再計算する（支払い済み額は保持）
pub async fn revise_booking(deps: &ServiceDependencies, cmd: ReviseBooking) -> Result<Booking> {
    // 1. 請求書ガード
    ensure_not_invoiced(deps, cmd.booking_id).await?;

    // 2. 入力の検証
    let period = RentalPeriod::new(cmd.pickup_date, cmd.expected_return_date)?;
    let pricing = validate_terms(
        &cmd.items,
        cmd.discount_type,
        cmd.discount_value,
        cmd.tax_rate,
        cmd.security_deposit_override,
    )?;

    // 3. 新旧の対象商品をロックし、ロック内で集約を復元し直す
    let current = load_booking(&deps.event_store, cmd.booking_id).await?;
    let mut locked = product_ids(&cmd.items);
    locked.extend(current.booking.items.iter().map(|item| item.product_id));
    let _reservation = deps.locks.reserve_products(&locked).await;
    let LoadedBooking { booking, version } =
        load_booking(&deps.event_store, cmd.booking_id).await?;

    if !booking.is_editable() {
        return Err(domain::TransitionError::NotEditable(booking.booking_status).into());
    }

    // 4. 自予約を除外して明細を検証
    let items = resolve_line_items(deps, &cmd.items, &period, Some(booking.booking_id)).await?;

    // 5. ドメイン層の純粋関数を呼び出し
    let (revised, event) =
        domain::booking::revise_booking(&booking, period, items, pricing, Utc::now())?;

    // 6. 保存
    persist(deps, &revised, version, DomainEvent::BookingRevised(event)).await?;

    info!(
        booking_id = %revised.booking_id.value(),
        total_amount = %revised.totals.total_amount,
        balance_due = %revised.totals.balance_due,
        "booking revised"
    );

    Ok(revised)
}

/// 予約を確定する
///
/// ビジネスルール：Draftからのみ
pub async fn confirm_booking(deps: &ServiceDependencies, booking_id: BookingId) -> Result<Booking> {
    let LoadedBooking { booking, version } = load_booking(&deps.event_store, booking_id).await?;

    let (confirmed, event) = domain::booking::confirm_booking(&booking, Utc::now())?;

    persist(deps, &confirmed, version, DomainEvent::BookingConfirmed(event)).await?;

    info!(booking_id = %booking_id.value(), "booking confirmed");

    Ok(confirmed)
}

/// 支払いを記録する
///
/// ビジネスルール：
/// - 請求書が発行されていないこと
/// - 金額は0より大きく、未払い残高以下
pub async fn record_payment(deps: &ServiceDependencies, cmd: RecordPayment) -> Result<Booking> {
    // 1. 請求書ガード
    ensure_not_invoiced(deps, cmd.booking_id).await?;

    // 2. イベントストアから予約集約を復元
    let LoadedBooking { booking, version } =
        load_booking(&deps.event_store, cmd.booking_id).await?;

    // 3. ドメイン層の純粋関数を呼び出し
    let (paid, event) =
        domain::booking::record_payment(&booking, cmd.amount, cmd.method, Utc::now())?;

    // 4. 保存（読み込み後に別の支払いが入っていれば拒否される）
    persist(deps, &paid, version, DomainEvent::PaymentRecorded(event)).await?;

    info!(
        booking_id = %cmd.booking_id.value(),
        amount = %cmd.amount,
        method = cmd.method.as_str(),
        balance_due = %paid.totals.balance_due,
        payment_status = paid.totals.payment_status.as_str(),
        "payment recorded"
    );

    Ok(paid)
}

/// 受け取りを記録する
///
/// ビジネスルール：確定済みの予約のみ
pub async fn mark_picked_up(deps: &ServiceDependencies, booking_id: BookingId) -> Result<Booking> {
    let LoadedBooking { booking, version } = load_booking(&deps.event_store, booking_id).await?;

    let (picked_up, event) = domain::booking::mark_picked_up(&booking, Utc::now())?;

    persist(deps, &picked_up, version, DomainEvent::BookingPickedUp(event)).await?;

    info!(booking_id = %booking_id.value(), "booking picked up");

    Ok(picked_up)
}

/// 返却を記録する
///
/// ビジネスルール：
/// - 受け取り済みの予約のみ
/// - 返却予定日を過ぎていれば延滞料金を加算する
/// - 保証金の返金額は保証金以下
pub async fn mark_returned(deps: &ServiceDependencies, cmd: MarkReturned) -> Result<Booking> {
    let LoadedBooking { booking, version } =
        load_booking(&deps.event_store, cmd.booking_id).await?;

    let (returned, event) =
        domain::booking::mark_returned(&booking, cmd.actual_return_date, cmd.refund)?;
    let (days_late, late_fee) = (event.days_late, event.late_fee);

    persist(deps, &returned, version, DomainEvent::BookingReturned(event)).await?;

    info!(
        booking_id = %cmd.booking_id.value(),
        days_late,
        late_fee = %late_fee,
        balance_due = %returned.totals.balance_due,
        "booking returned"
    );

    Ok(returned)
}

/// 予約をキャンセルする
///
/// ビジネスルール：キャンセル済み・完了済みは不可
pub async fn cancel_booking(deps: &ServiceDependencies, cmd: CancelBooking) -> Result<Booking> {
    let LoadedBooking { booking, version } =
        load_booking(&deps.event_store, cmd.booking_id).await?;

    let (cancelled, event) = domain::booking::cancel_booking(&booking, cmd.reason, Utc::now())?;

    persist(deps, &cancelled, version, DomainEvent::BookingCancelled(event)).await?;

    info!(booking_id = %cmd.booking_id.value(), "booking cancelled");

    Ok(cancelled)
}

/// 予約を取得する（Read Model）
pub async fn get_booking(deps: &ServiceDependencies, booking_id: BookingId) -> Result<Booking> {
    deps.booking_read_model
        .get_by_id(booking_id)
        .await
        .map_err(BookingApplicationError::ReadModelError)?
        .ok_or(BookingApplicationError::BookingNotFound)
}

/// 予約を検索する（Read Model）
pub async fn list_bookings(
    deps: &ServiceDependencies,
    filter: BookingFilter,
) -> Result<Vec<Booking>> {
    deps.booking_read_model
        .search(filter)
        .await
        .map_err(BookingApplicationError::ReadModelError)
}
