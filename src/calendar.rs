//! Admin calendar editor: month grids, multi-select, and bulk availability
//! edits over the shared collection.

use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::{NaiveDate, Utc};

use crate::availability::{Attribution, AvailabilityError, AvailabilityStore};
use crate::model::{AvailabilityEntry, AvailabilitySnapshot, BookingEvent};
use crate::notify::NotifyHub;

/// How a calendar cell renders.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DayState {
    Past,
    Available,
    Unavailable,
}

/// State of one date, relative to `today`. Past wins over everything.
pub fn day_state(date: NaiveDate, snapshot: &AvailabilitySnapshot, today: NaiveDate) -> DayState {
    if date < today {
        DayState::Past
    } else if snapshot.is_available(date) {
        DayState::Available
    } else {
        DayState::Unavailable
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DayCell {
    pub date: NaiveDate,
    pub state: DayState,
    pub selected: bool,
}

/// The status an admin applies to the current selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetAvailability {
    Available,
    Unavailable,
}

/// One admin's calendar editing session.
///
/// Holds its own snapshot and a set of selected future dates. Edits write
/// through the availability store and patch the local snapshot on success,
/// so the grid reflects the edit without waiting for a reload.
pub struct CalendarEditor {
    availability: AvailabilityStore,
    notify: Arc<NotifyHub>,
    snapshot: AvailabilitySnapshot,
    selected: BTreeSet<NaiveDate>,
}

impl CalendarEditor {
    pub async fn open(
        availability: AvailabilityStore,
        notify: Arc<NotifyHub>,
    ) -> Result<Self, AvailabilityError> {
        let snapshot = availability.load_all().await?;
        Ok(Self {
            availability,
            notify,
            snapshot,
            selected: BTreeSet::new(),
        })
    }

    pub fn snapshot(&self) -> &AvailabilitySnapshot {
        &self.snapshot
    }

    /// Toggle a date in or out of the selection. Past dates are not
    /// selectable; returns whether the date is now selected.
    pub fn toggle(&mut self, date: NaiveDate, today: NaiveDate) -> bool {
        if date < today {
            return false;
        }
        if self.selected.remove(&date) {
            false
        } else {
            self.selected.insert(date);
            true
        }
    }

    pub fn clear_selection(&mut self) {
        self.selected.clear();
    }

    pub fn selected_count(&self) -> usize {
        self.selected.len()
    }

    /// Cells for one calendar month. `month` is 1-based.
    pub fn month_view(&self, year: i32, month: u32, today: NaiveDate) -> Vec<DayCell> {
        crate::dates::month_days(year, month)
            .into_iter()
            .map(|date| DayCell {
                date,
                state: day_state(date, &self.snapshot, today),
                selected: self.selected.contains(&date),
            })
            .collect()
    }

    /// Apply a status to every selected date, then clear the selection.
    /// Returns how many dates were written. An empty selection writes
    /// nothing. On a partial failure the selection is kept so the admin can
    /// retry, and only the successful dates are patched locally.
    pub async fn set_availability(
        &mut self,
        status: SetAvailability,
    ) -> Result<usize, AvailabilityError> {
        if self.selected.is_empty() {
            return Ok(0);
        }
        let dates: Vec<NaiveDate> = self.selected.iter().copied().collect();

        let result = match status {
            SetAvailability::Unavailable => {
                self.availability
                    .mark_unavailable(&dates, Attribution::none())
                    .await
            }
            SetAvailability::Available => self.availability.mark_available(&dates).await,
        };

        match result {
            Ok(()) => {
                self.apply_local(&dates, status);
                self.selected.clear();
                self.emit(status, dates.clone());
                Ok(dates.len())
            }
            Err(AvailabilityError::Partial { failed }) => {
                let succeeded: Vec<NaiveDate> = dates
                    .iter()
                    .copied()
                    .filter(|d| !failed.contains(d))
                    .collect();
                self.apply_local(&succeeded, status);
                for date in &succeeded {
                    self.selected.remove(date);
                }
                if !succeeded.is_empty() {
                    self.emit(status, succeeded);
                }
                Err(AvailabilityError::Partial { failed })
            }
            Err(e) => Err(e),
        }
    }

    /// Replace the snapshot with a fresh read.
    pub async fn reload(&mut self) -> Result<(), AvailabilityError> {
        self.snapshot = self.availability.load_all().await?;
        Ok(())
    }

    fn apply_local(&mut self, dates: &[NaiveDate], status: SetAvailability) {
        let now = Utc::now();
        for &date in dates {
            match status {
                SetAvailability::Unavailable => {
                    self.snapshot
                        .set_unavailable(date, AvailabilityEntry::manual_block(now));
                }
                SetAvailability::Available => self.snapshot.set_available(date),
            }
        }
    }

    fn emit(&self, status: SetAvailability, dates: Vec<NaiveDate>) {
        let event = match status {
            SetAvailability::Unavailable => BookingEvent::DatesBlocked { dates },
            SetAvailability::Available => BookingEvent::DatesReleased { dates },
        };
        self.notify.send(event);
    }
}
