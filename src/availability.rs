use std::sync::Arc;
use std::time::Duration;

use chrono::{NaiveDate, Utc};
use ulid::Ulid;

use crate::model::{AvailabilityEntry, AvailabilitySnapshot};
use crate::observability;
use crate::store::{DocumentStore, StoreError};

/// Default per-operation deadline for store calls. A stalled request fails
/// instead of hanging the caller.
pub const DEFAULT_OP_TIMEOUT: Duration = Duration::from_secs(10);

/// Who a blocked date is attributed to. `none()` is a manual admin block.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Attribution {
    pub booking_id: Option<Ulid>,
    pub guest_name: Option<String>,
}

impl Attribution {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn booking(id: Ulid, guest_name: &str) -> Self {
        Self {
            booking_id: Some(id),
            guest_name: Some(guest_name.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum AvailabilityError {
    Store(StoreError),
    /// Some per-date writes landed and some did not. Nothing is rolled back
    /// or retried; the failed dates are named so the caller can surface them
    /// and the next full reload reconciles the snapshot.
    Partial { failed: Vec<NaiveDate> },
}

impl std::fmt::Display for AvailabilityError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AvailabilityError::Store(e) => write!(f, "{e}"),
            AvailabilityError::Partial { failed } => {
                write!(f, "partial availability write, failed dates: ")?;
                for (i, d) in failed.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{d}")?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for AvailabilityError {}

impl From<StoreError> for AvailabilityError {
    fn from(e: StoreError) -> Self {
        AvailabilityError::Store(e)
    }
}

/// Wraps the external `availability` collection with the write discipline the
/// rest of the crate relies on: per-date upsert/delete fan-out issued
/// concurrently, idempotent per date, last-writer-wins, no cross-date
/// atomicity. Cheap to clone; share one per store.
#[derive(Clone)]
pub struct AvailabilityStore {
    store: Arc<dyn DocumentStore>,
    op_timeout: Duration,
}

enum WriteOp {
    Block(Attribution),
    Release,
}

impl AvailabilityStore {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            store,
            op_timeout: DEFAULT_OP_TIMEOUT,
        }
    }

    pub fn with_timeout(store: Arc<dyn DocumentStore>, op_timeout: Duration) -> Self {
        Self { store, op_timeout }
    }

    /// Full read of the availability collection.
    pub async fn load_all(&self) -> Result<AvailabilitySnapshot, AvailabilityError> {
        let start = std::time::Instant::now();
        let snapshot = tokio::time::timeout(self.op_timeout, self.store.load_availability())
            .await
            .map_err(|_| StoreError::Unavailable("availability load timed out".into()))??;
        metrics::histogram!(observability::SNAPSHOT_LOAD_DURATION_SECONDS)
            .record(start.elapsed().as_secs_f64());
        Ok(snapshot)
    }

    /// Upsert an unavailable entry for each date, attributed to `who`.
    /// Issuing this twice with the same inputs leaves one entry per date
    /// carrying the latest metadata.
    pub async fn mark_unavailable(
        &self,
        dates: &[NaiveDate],
        who: Attribution,
    ) -> Result<(), AvailabilityError> {
        self.fan_out(dates, WriteOp::Block(who)).await
    }

    /// Delete the entry for each date. Absent dates are a no-op.
    pub async fn mark_available(&self, dates: &[NaiveDate]) -> Result<(), AvailabilityError> {
        self.fan_out(dates, WriteOp::Release).await
    }

    /// Issue one write per date, all concurrently, and collect the dates
    /// whose write failed or timed out. All-failed maps to a plain store
    /// error; a mix maps to `Partial` naming exactly the failed dates.
    async fn fan_out(&self, dates: &[NaiveDate], op: WriteOp) -> Result<(), AvailabilityError> {
        if dates.is_empty() {
            return Ok(());
        }
        let now = Utc::now();
        let start = std::time::Instant::now();

        let writes = dates.iter().map(|&date| {
            let store = self.store.clone();
            let timeout = self.op_timeout;
            let entry = match &op {
                WriteOp::Block(who) => Some(AvailabilityEntry {
                    status: crate::model::AvailabilityStatus::Unavailable,
                    booking_id: who.booking_id,
                    guest_name: who.guest_name.clone(),
                    updated_at: now,
                }),
                WriteOp::Release => None,
            };
            async move {
                let write = async {
                    match entry {
                        Some(entry) => store.put_availability(date, entry).await,
                        None => store.delete_availability(date).await,
                    }
                };
                match tokio::time::timeout(timeout, write).await {
                    Ok(Ok(())) => Ok(date),
                    Ok(Err(e)) => {
                        tracing::warn!("availability write for {date} failed: {e}");
                        Err(date)
                    }
                    Err(_) => {
                        tracing::warn!("availability write for {date} timed out");
                        Err(date)
                    }
                }
            }
        });

        let results = futures::future::join_all(writes).await;
        metrics::histogram!(observability::AVAILABILITY_WRITE_DURATION_SECONDS)
            .record(start.elapsed().as_secs_f64());

        let failed: Vec<NaiveDate> = results.into_iter().filter_map(Result::err).collect();
        if failed.is_empty() {
            return Ok(());
        }
        metrics::counter!(observability::STORE_WRITE_FAILURES_TOTAL)
            .increment(failed.len() as u64);
        if failed.len() == dates.len() {
            return Err(StoreError::Unavailable("all availability writes failed".into()).into());
        }
        Err(AvailabilityError::Partial { failed })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use crate::store::testing::FlakyStore;

    fn d(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    fn adapter() -> (Arc<MemoryStore>, AvailabilityStore) {
        let store = Arc::new(MemoryStore::new());
        let adapter = AvailabilityStore::new(store.clone());
        (store, adapter)
    }

    #[tokio::test]
    async fn mark_unavailable_is_idempotent() {
        let (_, adapter) = adapter();
        let date = d("2025-10-30");
        let who = Attribution::booking(Ulid::new(), "Maria Santos");

        adapter.mark_unavailable(&[date], who.clone()).await.unwrap();
        adapter.mark_unavailable(&[date], who.clone()).await.unwrap();

        let snap = adapter.load_all().await.unwrap();
        assert_eq!(snap.len(), 1);
        let entry = snap.get(date).unwrap();
        assert_eq!(entry.booking_id, who.booking_id);
        assert_eq!(entry.guest_name.as_deref(), Some("Maria Santos"));
    }

    #[tokio::test]
    async fn repeat_mark_keeps_latest_attribution() {
        let (_, adapter) = adapter();
        let date = d("2025-10-30");

        adapter
            .mark_unavailable(&[date], Attribution::booking(Ulid::new(), "First Guest"))
            .await
            .unwrap();
        let second = Attribution::booking(Ulid::new(), "Second Guest");
        adapter.mark_unavailable(&[date], second.clone()).await.unwrap();

        let snap = adapter.load_all().await.unwrap();
        assert_eq!(snap.get(date).unwrap().booking_id, second.booking_id);
    }

    #[tokio::test]
    async fn mark_available_on_absent_date_is_noop() {
        let (_, adapter) = adapter();
        adapter.mark_available(&[d("2025-10-30")]).await.unwrap();
        assert!(adapter.load_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn empty_date_list_writes_nothing() {
        let (_, adapter) = adapter();
        adapter
            .mark_unavailable(&[], Attribution::none())
            .await
            .unwrap();
        adapter.mark_available(&[]).await.unwrap();
        assert!(adapter.load_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn partial_failure_names_failed_dates() {
        let store = Arc::new(FlakyStore::new());
        let adapter = AvailabilityStore::new(store.clone());
        let good = d("2025-11-01");
        let bad = d("2025-11-02");
        store.fail_puts_for(bad);

        let result = adapter
            .mark_unavailable(&[good, bad], Attribution::none())
            .await;
        match result {
            Err(AvailabilityError::Partial { failed }) => assert_eq!(failed, vec![bad]),
            other => panic!("expected partial failure, got {other:?}"),
        }

        // The successful date is written and stays written
        let snap = adapter.load_all().await.unwrap();
        assert!(!snap.is_available(good));
        assert!(snap.is_available(bad));
    }

    #[tokio::test]
    async fn all_failed_is_a_store_error() {
        let store = Arc::new(FlakyStore::new());
        let adapter = AvailabilityStore::new(store.clone());
        let date = d("2025-11-01");
        store.fail_puts_for(date);

        let result = adapter.mark_unavailable(&[date], Attribution::none()).await;
        assert!(matches!(result, Err(AvailabilityError::Store(_))));
    }
}
