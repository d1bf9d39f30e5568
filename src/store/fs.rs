use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use serde::de::DeserializeOwned;
use ulid::Ulid;

use crate::model::{AvailabilityEntry, AvailabilitySnapshot, Booking, BookingStatus, Room, Settings};

use super::memory::MemoryStore;
use super::{DocumentStore, StoreError};

/// Document store persisted as one JSON file per collection under a data
/// directory. Every mutation rewrites the affected collection file via a
/// temp file and an atomic rename, so a crash mid-write leaves the previous
/// file intact. Missing files load as empty collections.
///
/// The store is `Arc`-shared across concurrent mutations, and each
/// collection uses one tmp path, so saves of the same collection must not
/// interleave: each collection's snapshot-and-write is serialized behind
/// its own lock. Saves of different collections still run concurrently.
pub struct JsonStore {
    inner: MemoryStore,
    dir: PathBuf,
    save_locks: SaveLocks,
}

#[derive(Default)]
struct SaveLocks {
    availability: Mutex<()>,
    bookings: Mutex<()>,
    rooms: Mutex<()>,
    settings: Mutex<()>,
}

fn io_err(e: io::Error) -> StoreError {
    StoreError::Unavailable(e.to_string())
}

fn read_json<T: DeserializeOwned>(path: &Path) -> io::Result<Option<T>> {
    let file = match File::open(path) {
        Ok(f) => f,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e),
    };
    let value = serde_json::from_reader(BufReader::new(file))
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
    Ok(Some(value))
}

/// Write to `<path>.tmp`, fsync, then rename over the target.
fn write_json<T: Serialize>(path: &Path, value: &T) -> io::Result<()> {
    let tmp_path = path.with_extension("json.tmp");
    let file = File::create(&tmp_path)?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, value)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
    writer.flush()?;
    writer.get_ref().sync_all()?;
    fs::rename(&tmp_path, path)
}

impl JsonStore {
    /// Open (or create) the store in `dir`, loading whatever collections
    /// already exist on disk.
    pub fn open(dir: impl Into<PathBuf>) -> io::Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        let inner = MemoryStore::new();

        let store = Self {
            inner,
            dir,
            save_locks: SaveLocks::default(),
        };
        if let Some(entries) =
            read_json::<BTreeMap<NaiveDate, AvailabilityEntry>>(&store.path("availability"))?
        {
            store.inner.seed_availability(entries);
        }
        if let Some(bookings) = read_json::<Vec<Booking>>(&store.path("bookings"))? {
            store.inner.seed_bookings(bookings);
        }
        if let Some(rooms) = read_json::<Vec<Room>>(&store.path("rooms"))? {
            store.inner.seed_rooms(rooms);
        }
        if let Some(settings) = read_json::<Settings>(&store.path("settings"))? {
            store.inner.seed_settings(settings);
        }
        Ok(store)
    }

    fn path(&self, collection: &str) -> PathBuf {
        self.dir.join(format!("{collection}.json"))
    }

    // Each save snapshots memory while holding the collection's lock, so a
    // slower save can never overwrite a newer one with stale state.

    fn save_availability(&self) -> Result<(), StoreError> {
        let _guard = self.save_locks.availability.lock().expect("save lock");
        write_json(&self.path("availability"), &self.inner.availability_entries()).map_err(io_err)
    }

    fn save_bookings(&self) -> Result<(), StoreError> {
        let _guard = self.save_locks.bookings.lock().expect("save lock");
        let mut bookings = self.inner.booking_records();
        bookings.sort_by_key(|b| b.id);
        write_json(&self.path("bookings"), &bookings).map_err(io_err)
    }

    fn save_rooms(&self) -> Result<(), StoreError> {
        let _guard = self.save_locks.rooms.lock().expect("save lock");
        let mut rooms = self.inner.room_records();
        rooms.sort_by_key(|r| r.id);
        write_json(&self.path("rooms"), &rooms).map_err(io_err)
    }

    fn save_settings(&self) -> Result<(), StoreError> {
        let _guard = self.save_locks.settings.lock().expect("save lock");
        match self.inner.settings_value() {
            Some(settings) => write_json(&self.path("settings"), &settings).map_err(io_err),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl DocumentStore for JsonStore {
    async fn load_availability(&self) -> Result<AvailabilitySnapshot, StoreError> {
        self.inner.load_availability().await
    }

    async fn put_availability(
        &self,
        date: NaiveDate,
        entry: AvailabilityEntry,
    ) -> Result<(), StoreError> {
        self.inner.put_availability(date, entry).await?;
        self.save_availability()
    }

    async fn delete_availability(&self, date: NaiveDate) -> Result<(), StoreError> {
        self.inner.delete_availability(date).await?;
        self.save_availability()
    }

    async fn insert_booking(&self, booking: Booking) -> Result<(), StoreError> {
        self.inner.insert_booking(booking).await?;
        self.save_bookings()
    }

    async fn get_booking(&self, id: Ulid) -> Result<Option<Booking>, StoreError> {
        self.inner.get_booking(id).await
    }

    async fn set_booking_status(
        &self,
        id: Ulid,
        status: BookingStatus,
        updated_at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        self.inner.set_booking_status(id, status, updated_at).await?;
        self.save_bookings()
    }

    async fn remove_booking(&self, id: Ulid) -> Result<Option<Booking>, StoreError> {
        let removed = self.inner.remove_booking(id).await?;
        if removed.is_some() {
            self.save_bookings()?;
        }
        Ok(removed)
    }

    async fn list_bookings(&self) -> Result<Vec<Booking>, StoreError> {
        self.inner.list_bookings().await
    }

    async fn clear_bookings(&self) -> Result<Vec<Booking>, StoreError> {
        let removed = self.inner.clear_bookings().await?;
        self.save_bookings()?;
        Ok(removed)
    }

    async fn list_rooms(&self) -> Result<Vec<Room>, StoreError> {
        self.inner.list_rooms().await
    }

    async fn upsert_room(&self, room: Room) -> Result<(), StoreError> {
        self.inner.upsert_room(room).await?;
        self.save_rooms()
    }

    async fn remove_room(&self, id: Ulid) -> Result<(), StoreError> {
        self.inner.remove_room(id).await?;
        self.save_rooms()
    }

    async fn get_settings(&self) -> Result<Option<Settings>, StoreError> {
        self.inner.get_settings().await
    }

    async fn put_settings(&self, settings: Settings) -> Result<(), StoreError> {
        self.inner.put_settings(settings).await?;
        self.save_settings()
    }
}
