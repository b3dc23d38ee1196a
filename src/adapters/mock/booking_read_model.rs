use crate::domain::{Booking, BookingCode, BookingId, BookingStatus, RentalPeriod, ReturnStatus};
use crate::ports::booking_read_model::{
    BookingFilter, BookingReadModel as BookingReadModelTrait, Result,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Mutex;

/// BookingReadModelのインメモリ実装
///
/// PostgreSQLのビューと同じ条件で、集約のスナップショットを絞り込む。
#[derive(Default)]
pub struct BookingReadModel {
    bookings: Mutex<HashMap<BookingId, Booking>>,
}

impl BookingReadModel {
    pub fn new() -> Self {
        Self::default()
    }

    fn select(&self, predicate: impl Fn(&Booking) -> bool) -> Result<Vec<Booking>> {
        let bookings = self.bookings.lock().map_err(|e| e.to_string())?;
        let mut selected: Vec<Booking> =
            bookings.values().filter(|b| predicate(b)).cloned().collect();
        selected.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(selected)
    }
}

#[async_trait]
impl BookingReadModelTrait for BookingReadModel {
    async fn save(&self, booking: Booking) -> Result<()> {
        self.bookings
            .lock()
            .map_err(|e| e.to_string())?
            .insert(booking.booking_id, booking);
        Ok(())
    }

    async fn get_by_id(&self, booking_id: BookingId) -> Result<Option<Booking>> {
        let bookings = self.bookings.lock().map_err(|e| e.to_string())?;
        Ok(bookings.get(&booking_id).cloned())
    }

    async fn find_active_overlapping(&self, period: RentalPeriod) -> Result<Vec<Booking>> {
        self.select(|b| b.booking_status.holds_stock() && b.period.overlaps(&period))
    }

    async fn find_overdue_candidates(&self, cutoff: DateTime<Utc>) -> Result<Vec<Booking>> {
        self.select(|b| {
            b.booking_status == BookingStatus::Confirmed
                && b.return_status == ReturnStatus::NotReturned
                && b.period.expected_return_date() < cutoff
        })
    }

    async fn search(&self, filter: BookingFilter) -> Result<Vec<Booking>> {
        self.select(|b| filter.matches(b))
    }

    async fn latest_booking_code_with_prefix(&self, prefix: &str) -> Result<Option<BookingCode>> {
        let bookings = self.bookings.lock().map_err(|e| e.to_string())?;
        Ok(bookings
            .values()
            .map(|b| &b.booking_code)
            .filter(|code| code.as_str().starts_with(prefix))
            .max_by(|a, b| {
                (a.as_str().len(), a.as_str()).cmp(&(b.as_str().len(), b.as_str()))
            })
            .cloned())
    }
}
