use crate::domain::booking::replay_events;
use crate::domain::events::DomainEvent;
use crate::domain::value_objects::BookingId;
use crate::ports::{BookingReadModel, EventStore};
use futures::StreamExt;
use std::collections::HashMap;

type Result<T> = std::result::Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// ドメインイベントをRead Modelに投影する
///
/// イベントから集約の状態を再構築し、bookings_viewテーブルに反映する。
///
/// # イベントソーシングの原則
///
/// 1. イベントが真実の情報源
/// 2. Read Modelはイベントから導出される
/// 3. 各イベントは完全な状態再構築をトリガーする
///
/// # 引数
/// * `read_model` - 更新するRead Model
/// * `events` - 1件の予約の全イベント（時系列順）
pub async fn project_booking_events(
    read_model: &dyn BookingReadModel,
    events: &[DomainEvent],
) -> Result<()> {
    // 全イベントから集約の状態を再構築
    let Some(booking) = replay_events(events)? else {
        return Ok(());
    };

    read_model.save(booking).await?;
    Ok(())
}

/// イベントログ全体からRead Modelを作り直す
///
/// ストリームを予約ごとにまとめ、初出順に投影する。
/// 戻り値は投影した予約の件数。
pub async fn rebuild_read_model(
    event_store: &dyn EventStore,
    read_model: &dyn BookingReadModel,
) -> Result<usize> {
    let mut order: Vec<BookingId> = Vec::new();
    let mut streams: HashMap<BookingId, Vec<DomainEvent>> = HashMap::new();

    let mut all_events = event_store.stream_all();
    while let Some(event) = all_events.next().await {
        let event = event?;
        let booking_id = event.booking_id();
        streams
            .entry(booking_id)
            .or_insert_with(|| {
                order.push(booking_id);
                Vec::new()
            })
            .push(event);
    }

    for booking_id in &order {
        if let Some(events) = streams.get(booking_id) {
            project_booking_events(read_model, events).await?;
        }
    }

    tracing::info!(bookings = order.len(), "Read model rebuilt from event log");
    Ok(order.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::mock::{InMemoryBookingReadModel, InMemoryEventStore};
    use crate::domain::booking::{
        cancel_booking, confirm_booking, create_booking, mark_picked_up, mark_returned,
        record_payment,
    };
    use crate::domain::{
        BookingCode, BookingDraft, BookingLineItem, BookingStatus, CustomerId, PaymentMethod,
        PaymentStatus, PricingTerms, ProductId, Quantity, RentalPeriod, ReturnStatus, StaffId,
    };
    use chrono::{DateTime, Duration, TimeZone, Utc};
    use rust_decimal::Decimal;

    fn start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, 10, 0, 0).unwrap()
    }

    fn created_events(sequence: u32) -> (BookingId, Vec<DomainEvent>) {
        let draft = BookingDraft {
            booking_code: BookingCode::new(start().date_naive(), sequence),
            customer_id: CustomerId::new(),
            period: RentalPeriod::new(start(), start() + Duration::days(3)).unwrap(),
            items: vec![BookingLineItem {
                product_id: ProductId::new(),
                product_name: "Tent".to_string(),
                sku: None,
                quantity: Quantity::try_from(1).unwrap(),
                rental_price_per_unit_per_day: Decimal::from(100),
                security_deposit_per_unit: Decimal::from(200),
            }],
            pricing: PricingTerms::default(),
            initial_payment: Decimal::ZERO,
            created_by: StaffId::new(),
        };
        let (booking, created) = create_booking(draft, start()).unwrap();
        (booking.booking_id, vec![DomainEvent::BookingCreated(created)])
    }

    #[tokio::test]
    async fn test_project_booking_created_event() {
        let read_model = InMemoryBookingReadModel::new();
        let (booking_id, events) = created_events(1);

        project_booking_events(&read_model, &events).await.unwrap();

        let booking = read_model.get_by_id(booking_id).await.unwrap().unwrap();
        assert_eq!(booking.booking_status, BookingStatus::Draft);
        assert_eq!(booking.totals.total_amount, Decimal::from(554));
    }

    #[tokio::test]
    async fn test_project_full_lifecycle() {
        let read_model = InMemoryBookingReadModel::new();
        let (_, mut events) = created_events(1);
        let booking = replay_events(&events).unwrap().unwrap();

        let (booking, confirmed) = confirm_booking(&booking, start()).unwrap();
        events.push(DomainEvent::BookingConfirmed(confirmed));
        let (booking, paid) =
            record_payment(&booking, Decimal::from(554), PaymentMethod::Cash, start()).unwrap();
        events.push(DomainEvent::PaymentRecorded(paid));
        let (booking, picked_up) = mark_picked_up(&booking, start()).unwrap();
        events.push(DomainEvent::BookingPickedUp(picked_up));
        let (booking, returned) =
            mark_returned(&booking, start() + Duration::days(3), None).unwrap();
        events.push(DomainEvent::BookingReturned(returned));

        project_booking_events(&read_model, &events).await.unwrap();

        let projected = read_model
            .get_by_id(booking.booking_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(projected, booking);
        assert_eq!(projected.booking_status, BookingStatus::Completed);
        assert_eq!(projected.return_status, ReturnStatus::Returned);
        assert_eq!(projected.totals.payment_status, PaymentStatus::Paid);
    }

    #[tokio::test]
    async fn test_project_empty_events() {
        let read_model = InMemoryBookingReadModel::new();
        let result = project_booking_events(&read_model, &[]).await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_project_rejects_stream_without_creation() {
        let read_model = InMemoryBookingReadModel::new();
        let (_, events) = created_events(1);
        let booking = replay_events(&events).unwrap().unwrap();
        let (_, cancelled) = cancel_booking(&booking, None, start()).unwrap();

        let result =
            project_booking_events(&read_model, &[DomainEvent::BookingCancelled(cancelled)]).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_rebuild_read_model_from_event_log() {
        let event_store = InMemoryEventStore::new();
        let read_model = InMemoryBookingReadModel::new();

        let (first_id, first_events) = created_events(1);
        let (second_id, second_events) = created_events(2);
        event_store.append(first_id, 0, first_events.clone()).await.unwrap();
        event_store.append(second_id, 0, second_events).await.unwrap();

        let first = replay_events(&first_events).unwrap().unwrap();
        let (_, cancelled) = cancel_booking(&first, None, start()).unwrap();
        event_store
            .append(first_id, 1, vec![DomainEvent::BookingCancelled(cancelled)])
            .await
            .unwrap();

        let projected = rebuild_read_model(&event_store, &read_model).await.unwrap();

        assert_eq!(projected, 2);
        let first = read_model.get_by_id(first_id).await.unwrap().unwrap();
        assert_eq!(first.booking_status, BookingStatus::Cancelled);
        let second = read_model.get_by_id(second_id).await.unwrap().unwrap();
        assert_eq!(second.booking_status, BookingStatus::Draft);
    }
}
