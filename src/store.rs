//! Data-access port for intake submissions.
//!
//! Both the intake form and the response browser receive a `ResponseStore`
//! instead of reaching for a global client. Three implementations exist:
//! the hosted PostgREST backend (`SupabaseClient`), direct Postgres
//! (`PgResponseStore`) and the in-process `MemoryStore`.

use async_trait::async_trait;
use chrono::{Duration, Utc};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use tokio::sync::Mutex;

use crate::errors::AppError;
use crate::models::{IntakeRecord, NewIntakeRecord};

/// Append-only store of intake submissions.
#[async_trait]
pub trait ResponseStore: Send + Sync {
    /// Append one submission. The store assigns `id` and timestamps.
    ///
    /// # Errors
    ///
    /// - `ExternalApiError` / `DatabaseError` when the backend rejects or
    ///   cannot be reached; nothing is persisted in that case.
    async fn insert(&self, record: &NewIntakeRecord) -> Result<IntakeRecord, AppError>;

    /// Every submission, ordered by `created_at` descending.
    async fn list_newest_first(&self) -> Result<Vec<IntakeRecord>, AppError>;
}

/// In-process store used for local development and tests.
///
/// `set_failing(true)` makes every call fail with an `ExternalApiError`,
/// which is how tests exercise backend outages.
#[derive(Default)]
pub struct MemoryStore {
    records: Mutex<Vec<IntakeRecord>>,
    failing: AtomicBool,
    insert_calls: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store pre-filled with records (any order; listing sorts).
    pub fn with_records(records: Vec<IntakeRecord>) -> Self {
        Self {
            records: Mutex::new(records),
            ..Self::default()
        }
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Number of insert requests received, failed ones included.
    pub fn insert_calls(&self) -> usize {
        self.insert_calls.load(Ordering::SeqCst)
    }

    pub async fn len(&self) -> usize {
        self.records.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.lock().await.is_empty()
    }

    fn check_available(&self) -> Result<(), AppError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(AppError::ExternalApiError(
                "memory store is unavailable".to_string(),
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl ResponseStore for MemoryStore {
    async fn insert(&self, record: &NewIntakeRecord) -> Result<IntakeRecord, AppError> {
        self.insert_calls.fetch_add(1, Ordering::SeqCst);
        self.check_available()?;

        let mut records = self.records.lock().await;
        let id = records.iter().map(|r| r.id).max().unwrap_or(0) + 1;

        // Keep creation times strictly increasing so ordering is stable.
        let mut created_at = Utc::now();
        if let Some(latest) = records.iter().map(|r| r.created_at).max() {
            if created_at <= latest {
                created_at = latest + Duration::microseconds(1);
            }
        }

        let stored = IntakeRecord::from_new(id, record, created_at);
        records.push(stored.clone());
        tracing::debug!("Memory store appended record {}", id);
        Ok(stored)
    }

    async fn list_newest_first(&self) -> Result<Vec<IntakeRecord>, AppError> {
        self.check_available()?;

        let mut records = self.records.lock().await.clone();
        records.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(records)
    }
}
