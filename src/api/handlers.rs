use crate::application::booking::{
    BookingApplicationError, ServiceDependencies, cancel_booking as execute_cancel_booking,
    compute_availability as execute_compute_availability,
    confirm_booking as execute_confirm_booking, create_booking as execute_create_booking,
    get_booking as execute_get_booking, list_bookings as execute_list_bookings,
    mark_picked_up as execute_mark_picked_up, mark_returned as execute_mark_returned,
    record_payment as execute_record_payment, revise_booking as execute_revise_booking,
};
use crate::domain::{BookingId, CustomerId, RentalPeriod};
use crate::ports::BookingFilter;
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use std::sync::Arc;
use uuid::Uuid;

use super::{
    error::ApiError,
    types::{
        AvailabilityQuery, AvailabilityResponse, BookingResponse, CancelBookingRequest,
        CreateBookingRequest, ListBookingsQuery, MarkReturnedRequest, RecordPaymentRequest,
        ReviseBookingRequest, parse_status_filter,
    },
};

// ============================================================================
// State
// ============================================================================

/// ハンドラー間で共有されるアプリケーション状態
#[derive(Clone)]
pub struct AppState {
    pub service_deps: ServiceDependencies,
}

type BookingResult = Result<Json<BookingResponse>, ApiError>;

// ============================================================================
// Command handlers (POST / PUT)
// ============================================================================

/// POST /bookings - 新しい予約を作成
///
/// 強制されるビジネスルール:
/// - 顧客が存在すること
/// - 返却予定日が受け取り日より後であること
/// - 明細が1件以上あり、すべての明細が在庫・空き状況の範囲内であること
/// - 前払い金が合計金額を超えないこと
pub async fn create_booking(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateBookingRequest>,
) -> Result<(StatusCode, Json<BookingResponse>), ApiError> {
    let cmd = req.to_command().map_err(ApiError::BadRequest)?;

    let booking = execute_create_booking(&state.service_deps, cmd).await?;

    Ok((StatusCode::CREATED, Json(BookingResponse::from(booking))))
}

/// PUT /bookings/:id - 予約内容を変更
///
/// 日付・明細・料金条件を置き換え、金額を再計算する。支払い済み額は保持される。
pub async fn revise_booking(
    State(state): State<Arc<AppState>>,
    Path(booking_id): Path<Uuid>,
    Json(req): Json<ReviseBookingRequest>,
) -> BookingResult {
    let cmd = req
        .to_command(BookingId::from_uuid(booking_id))
        .map_err(ApiError::BadRequest)?;

    let booking = execute_revise_booking(&state.service_deps, cmd).await?;
    Ok(Json(BookingResponse::from(booking)))
}

/// POST /bookings/:id/confirm - 下書きを確定
pub async fn confirm_booking(
    State(state): State<Arc<AppState>>,
    Path(booking_id): Path<Uuid>,
) -> BookingResult {
    let booking =
        execute_confirm_booking(&state.service_deps, BookingId::from_uuid(booking_id)).await?;
    Ok(Json(BookingResponse::from(booking)))
}

/// POST /bookings/:id/payments - 支払いを記録
///
/// 金額は0より大きく、残額以下であること。
pub async fn record_payment(
    State(state): State<Arc<AppState>>,
    Path(booking_id): Path<Uuid>,
    Json(req): Json<RecordPaymentRequest>,
) -> BookingResult {
    let cmd = req
        .to_command(BookingId::from_uuid(booking_id))
        .map_err(ApiError::BadRequest)?;
    let booking = execute_record_payment(&state.service_deps, cmd).await?;
    Ok(Json(BookingResponse::from(booking)))
}

/// POST /bookings/:id/pickup - 受け取りを記録
pub async fn mark_picked_up(
    State(state): State<Arc<AppState>>,
    Path(booking_id): Path<Uuid>,
) -> BookingResult {
    let booking =
        execute_mark_picked_up(&state.service_deps, BookingId::from_uuid(booking_id)).await?;
    Ok(Json(BookingResponse::from(booking)))
}

/// POST /bookings/:id/return - 返却を記録
///
/// 返却予定日を過ぎていれば延滞料を加算する。保証金の返金も同時に記録できる。
pub async fn mark_returned(
    State(state): State<Arc<AppState>>,
    Path(booking_id): Path<Uuid>,
    Json(req): Json<MarkReturnedRequest>,
) -> BookingResult {
    let cmd = req
        .to_command(BookingId::from_uuid(booking_id))
        .map_err(ApiError::BadRequest)?;

    let booking = execute_mark_returned(&state.service_deps, cmd).await?;
    Ok(Json(BookingResponse::from(booking)))
}

/// POST /bookings/:id/cancel - 予約をキャンセル
pub async fn cancel_booking(
    State(state): State<Arc<AppState>>,
    Path(booking_id): Path<Uuid>,
    body: Option<Json<CancelBookingRequest>>,
) -> BookingResult {
    let req = body.map(|Json(req)| req).unwrap_or_default();
    let cmd = req.to_command(BookingId::from_uuid(booking_id));

    let booking = execute_cancel_booking(&state.service_deps, cmd).await?;
    Ok(Json(BookingResponse::from(booking)))
}

// ============================================================================
// Query handlers (GET)
// ============================================================================

/// GET /bookings/:id - 予約詳細をIDで取得
pub async fn get_booking(
    State(state): State<Arc<AppState>>,
    Path(booking_id): Path<Uuid>,
) -> BookingResult {
    let booking =
        execute_get_booking(&state.service_deps, BookingId::from_uuid(booking_id)).await?;
    Ok(Json(BookingResponse::from(booking)))
}

/// GET /bookings - オプションフィルタ付き予約一覧取得
///
/// クエリパラメータ:
/// - customer_id: 顧客IDでフィルタリング（オプション）
/// - status: 予約ステータスでフィルタリング（Draft, Confirmed, ...）（オプション）
pub async fn list_bookings(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListBookingsQuery>,
) -> Result<Json<Vec<BookingResponse>>, ApiError> {
    let booking_status = query
        .status
        .as_deref()
        .map(parse_status_filter)
        .transpose()
        .map_err(ApiError::BadRequest)?;

    let filter = BookingFilter {
        customer_id: query.customer_id.map(CustomerId::from_uuid),
        booking_status,
    };

    let bookings = execute_list_bookings(&state.service_deps, filter).await?;
    Ok(Json(bookings.into_iter().map(BookingResponse::from).collect()))
}

/// GET /availability - 期間中の商品ごとの空き数
///
/// exclude_booking_idを指定すると、その予約の拘束分を空き数に戻す。
pub async fn get_availability(
    State(state): State<Arc<AppState>>,
    Query(query): Query<AvailabilityQuery>,
) -> Result<Json<Vec<AvailabilityResponse>>, ApiError> {
    let period = RentalPeriod::new(query.pickup_date, query.return_date)
        .map_err(|e| ApiError::from(BookingApplicationError::from(e)))?;

    let availability = execute_compute_availability(
        &state.service_deps,
        period,
        query.exclude_booking_id.map(BookingId::from_uuid),
    )
    .await?;

    Ok(Json(
        availability
            .into_iter()
            .map(AvailabilityResponse::from)
            .collect(),
    ))
}
