use crate::domain::{events::DomainEvent, value_objects::BookingId};
use crate::ports::event_store::{EventStore as EventStoreTrait, Result, VersionConflict};
use async_trait::async_trait;
use futures::stream::{self, BoxStream, StreamExt};
use std::sync::Mutex;

/// In-memory implementation of EventStore
///
/// Keeps a single append-only log in insertion order. The version of a
/// booking is the number of its events in the log.
#[derive(Default)]
pub struct EventStore {
    log: Mutex<Vec<DomainEvent>>,
}

impl EventStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl EventStoreTrait for EventStore {
    async fn append(
        &self,
        aggregate_id: BookingId,
        expected_version: u32,
        events: Vec<DomainEvent>,
    ) -> Result<()> {
        let mut log = self.log.lock().map_err(|e| e.to_string())?;

        let current = log
            .iter()
            .filter(|event| event.booking_id() == aggregate_id)
            .count();
        let current = u32::try_from(current)?;
        if current != expected_version {
            return Err(Box::new(VersionConflict {
                aggregate_id,
                expected: expected_version,
                actual: current,
            }));
        }

        log.extend(events);
        Ok(())
    }

    async fn load(&self, aggregate_id: BookingId) -> Result<Vec<DomainEvent>> {
        let log = self.log.lock().map_err(|e| e.to_string())?;
        Ok(log
            .iter()
            .filter(|event| event.booking_id() == aggregate_id)
            .cloned()
            .collect())
    }

    fn stream_all(&self) -> BoxStream<'_, Result<DomainEvent>> {
        let snapshot: Vec<Result<DomainEvent>> = match self.log.lock() {
            Ok(log) => log.iter().cloned().map(Ok).collect(),
            Err(e) => vec![Err(e.to_string().into())],
        };
        stream::iter(snapshot).boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{BookingCancelled, BookingConfirmed};
    use chrono::Utc;

    fn confirmed(booking_id: BookingId) -> DomainEvent {
        DomainEvent::BookingConfirmed(BookingConfirmed {
            booking_id,
            confirmed_at: Utc::now(),
        })
    }

    #[tokio::test]
    async fn test_append_rejects_stale_version() {
        let store = EventStore::new();
        let booking_id = BookingId::new();
        store.append(booking_id, 0, vec![confirmed(booking_id)]).await.unwrap();

        // 同じバージョンを読んだ2つ目の書き込み
        let cancelled = DomainEvent::BookingCancelled(BookingCancelled {
            booking_id,
            reason: None,
            cancelled_at: Utc::now(),
        });
        let result = store.append(booking_id, 0, vec![cancelled]).await;

        let conflict = result.unwrap_err().downcast::<VersionConflict>().unwrap();
        assert_eq!(conflict.expected, 0);
        assert_eq!(conflict.actual, 1);
        assert_eq!(store.load(booking_id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_versions_are_per_booking() {
        let store = EventStore::new();
        let first = BookingId::new();
        let second = BookingId::new();

        store.append(first, 0, vec![confirmed(first)]).await.unwrap();
        store.append(second, 0, vec![confirmed(second)]).await.unwrap();
        store.append(first, 1, vec![confirmed(first)]).await.unwrap();

        assert_eq!(store.load(first).await.unwrap().len(), 2);
    }
}
