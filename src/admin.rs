//! Admin dashboard controller: the booking listing, lifecycle actions, and
//! the rooms/settings passthroughs.

use std::sync::Arc;

use ulid::Ulid;

use crate::calendar::CalendarEditor;
use crate::engine::{
    AcceptOutcome, BookingFilter, CompleteOutcome, DeleteAllConfirmed, DeleteAllReport, Engine,
    EngineError,
};
use crate::model::{Booking, BookingStatus, Room, Settings};

/// Dashboard headline numbers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DashboardStats {
    pub total: usize,
    pub pending: usize,
    pub accepted: usize,
    pub completed: usize,
}

/// One admin's booking-management session. Holds a cached listing; every
/// lifecycle action refreshes it, and an attached calendar editor gets
/// reloaded so both panels agree after a mutation.
pub struct BookingManager {
    engine: Arc<Engine>,
    bookings: Vec<Booking>,
    filter: BookingFilter,
}

impl BookingManager {
    pub async fn open(engine: Arc<Engine>) -> Result<Self, EngineError> {
        let bookings = engine.list_bookings().await?;
        Ok(Self {
            engine,
            bookings,
            filter: BookingFilter::default(),
        })
    }

    /// Re-read the listing from the store.
    pub async fn refresh(&mut self) -> Result<(), EngineError> {
        self.bookings = self.engine.list_bookings().await?;
        Ok(())
    }

    pub fn set_filter(&mut self, filter: BookingFilter) {
        self.filter = filter;
    }

    /// The cached listing with the current filter applied, newest first.
    pub fn visible(&self) -> Vec<&Booking> {
        self.bookings
            .iter()
            .filter(|b| self.filter.matches(b))
            .collect()
    }

    pub fn stats(&self) -> DashboardStats {
        let mut stats = DashboardStats {
            total: self.bookings.len(),
            ..DashboardStats::default()
        };
        for booking in &self.bookings {
            match booking.status {
                BookingStatus::Pending => stats.pending += 1,
                BookingStatus::Accepted => stats.accepted += 1,
                BookingStatus::Completed => stats.completed += 1,
            }
        }
        stats
    }

    pub async fn accept(
        &mut self,
        id: Ulid,
        calendar: Option<&mut CalendarEditor>,
    ) -> Result<AcceptOutcome, EngineError> {
        let outcome = self.engine.accept(id).await?;
        self.sync(calendar).await?;
        Ok(outcome)
    }

    pub async fn complete(
        &mut self,
        id: Ulid,
        calendar: Option<&mut CalendarEditor>,
    ) -> Result<CompleteOutcome, EngineError> {
        let outcome = self.engine.complete(id).await?;
        self.sync(calendar).await?;
        Ok(outcome)
    }

    pub async fn delete(
        &mut self,
        id: Ulid,
        calendar: Option<&mut CalendarEditor>,
    ) -> Result<(), EngineError> {
        self.engine.delete(id).await?;
        self.sync(calendar).await?;
        Ok(())
    }

    /// Bulk delete, gated on the double-confirmation token.
    pub async fn delete_all(
        &mut self,
        token: DeleteAllConfirmed,
        calendar: Option<&mut CalendarEditor>,
    ) -> Result<DeleteAllReport, EngineError> {
        let report = self.engine.delete_all(token).await?;
        self.sync(calendar).await?;
        Ok(report)
    }

    async fn sync(&mut self, calendar: Option<&mut CalendarEditor>) -> Result<(), EngineError> {
        self.refresh().await?;
        if let Some(calendar) = calendar {
            calendar
                .reload()
                .await
                .map_err(|e| EngineError::from_availability("reload", e))?;
        }
        Ok(())
    }

    // Rooms and settings are plain CRUD with no lifecycle coupling.

    pub async fn list_rooms(&self) -> Result<Vec<Room>, EngineError> {
        Ok(self.engine.store().list_rooms().await?)
    }

    pub async fn save_room(&self, room: Room) -> Result<(), EngineError> {
        Ok(self.engine.store().upsert_room(room).await?)
    }

    pub async fn remove_room(&self, id: Ulid) -> Result<(), EngineError> {
        Ok(self.engine.store().remove_room(id).await?)
    }

    pub async fn settings(&self) -> Result<Option<Settings>, EngineError> {
        Ok(self.engine.store().get_settings().await?)
    }

    pub async fn save_settings(&self, settings: Settings) -> Result<(), EngineError> {
        Ok(self.engine.store().put_settings(settings).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar::DayState;
    use crate::engine::{DeleteAllRequest, EngineConfig};
    use crate::model::BookingRequest;
    use crate::notify::NotifyHub;
    use crate::store::MemoryStore;
    use chrono::NaiveDate;

    fn d(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    fn request(name: &str, ci: &str, co: &str) -> BookingRequest {
        BookingRequest {
            guest_name: name.into(),
            email: "guest@example.com".into(),
            phone: "0917 123 4567".into(),
            check_in: d(ci),
            check_out: d(co),
            guests: 2,
            extra_beds: 0,
            special_requests: None,
        }
    }

    async fn setup() -> (Arc<Engine>, BookingManager) {
        let store = Arc::new(MemoryStore::new());
        let engine = Arc::new(Engine::new(
            store,
            Arc::new(NotifyHub::new()),
            EngineConfig::default(),
        ));
        let manager = BookingManager::open(engine.clone()).await.unwrap();
        (engine, manager)
    }

    async fn create(engine: &Engine, name: &str, ci: &str, co: &str) -> Booking {
        let snap = engine.load_snapshot().await.unwrap();
        engine.create(request(name, ci, co), &snap).await.unwrap()
    }

    #[tokio::test]
    async fn accept_updates_listing_and_calendar() {
        let (engine, mut manager) = setup().await;
        let booking = create(&engine, "Maria Santos", "2025-11-01", "2025-11-03").await;
        let mut calendar = CalendarEditor::open(
            engine.availability().clone(),
            engine.notify().clone(),
        )
        .await
        .unwrap();

        manager.refresh().await.unwrap();
        let outcome = manager.accept(booking.id, Some(&mut calendar)).await.unwrap();
        assert_eq!(outcome, AcceptOutcome::Accepted);

        assert_eq!(manager.visible()[0].status, BookingStatus::Accepted);
        assert_eq!(
            crate::calendar::day_state(d("2025-11-01"), calendar.snapshot(), d("2025-10-01")),
            DayState::Unavailable
        );
    }

    #[tokio::test]
    async fn stats_count_by_status() {
        let (engine, mut manager) = setup().await;
        let a = create(&engine, "A", "2025-11-01", "2025-11-02").await;
        let b = create(&engine, "B", "2025-11-05", "2025-11-06").await;
        create(&engine, "C", "2025-11-10", "2025-11-11").await;
        engine.accept(a.id).await.unwrap();
        engine.accept(b.id).await.unwrap();
        engine.complete(b.id).await.unwrap();

        manager.refresh().await.unwrap();
        assert_eq!(
            manager.stats(),
            DashboardStats {
                total: 3,
                pending: 1,
                accepted: 1,
                completed: 1,
            }
        );
    }

    #[tokio::test]
    async fn filter_narrows_the_listing() {
        let (engine, mut manager) = setup().await;
        let a = create(&engine, "A", "2025-11-01", "2025-11-02").await;
        create(&engine, "B", "2025-11-05", "2025-11-06").await;
        engine.accept(a.id).await.unwrap();

        manager.refresh().await.unwrap();
        assert_eq!(manager.visible().len(), 2);

        manager.set_filter(BookingFilter {
            status: Some(BookingStatus::Pending),
            since: None,
        });
        let visible = manager.visible();
        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0].guest_name, "B");
    }

    #[tokio::test]
    async fn delete_all_empties_listing_and_frees_calendar() {
        let (engine, mut manager) = setup().await;
        let a = create(&engine, "A", "2025-11-01", "2025-11-03").await;
        engine.accept(a.id).await.unwrap();
        let mut calendar = CalendarEditor::open(
            engine.availability().clone(),
            engine.notify().clone(),
        )
        .await
        .unwrap();
        assert!(!calendar.snapshot().is_available(d("2025-11-01")));

        let token = DeleteAllRequest::confirm().confirm_again();
        let report = manager.delete_all(token, Some(&mut calendar)).await.unwrap();

        assert_eq!(report.deleted, 1);
        assert!(manager.visible().is_empty());
        assert!(calendar.snapshot().is_empty());
    }

    #[tokio::test]
    async fn rooms_and_settings_roundtrip() {
        let (_, manager) = setup().await;
        let room = Room {
            id: Ulid::new(),
            name: "Family Room".into(),
            price_per_night: 3300,
            max_guests: 4,
            available: true,
            amenities: vec!["aircon".into(), "wifi".into()],
            description: "Ground floor room".into(),
        };
        manager.save_room(room.clone()).await.unwrap();
        assert_eq!(manager.list_rooms().await.unwrap(), vec![room.clone()]);
        manager.remove_room(room.id).await.unwrap();
        assert!(manager.list_rooms().await.unwrap().is_empty());

        assert!(manager.settings().await.unwrap().is_none());
        let settings = Settings {
            site_name: "Arriba Homestay".into(),
            contact_email: "stay@arriba.example".into(),
            contact_phone: "0917 123 4567".into(),
            check_in_time: "14:00".into(),
            check_out_time: "12:00".into(),
        };
        manager.save_settings(settings.clone()).await.unwrap();
        assert_eq!(manager.settings().await.unwrap(), Some(settings));
    }
}
