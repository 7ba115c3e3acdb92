#![forbid(unsafe_code)]

use super::{SqliteStore, StoreError};
use adv_core::{
    Advisor, AdvisorId, DataAccess, DataAccessError, FilterSpec, PageWindow, SortSpec, UserId,
};
use async_trait::async_trait;
use std::collections::BTreeSet;
use std::sync::{Arc, Mutex};

/// Cloneable handle that serves a [`SqliteStore`] to async callers.
///
/// Every call takes the lock for one synchronous statement batch; the guard is
/// never held across an await point.
#[derive(Clone, Debug)]
pub struct SharedStore {
    inner: Arc<Mutex<SqliteStore>>,
}

impl SharedStore {
    pub fn new(store: SqliteStore) -> Self {
        Self {
            inner: Arc::new(Mutex::new(store)),
        }
    }

    pub fn with_store<T>(
        &self,
        f: impl FnOnce(&mut SqliteStore) -> Result<T, StoreError>,
    ) -> Result<T, StoreError> {
        let mut guard = self.inner.lock().map_err(|_| StoreError::LockPoisoned)?;
        f(&mut *guard)
    }
}

fn logged(err: StoreError, op: &'static str) -> DataAccessError {
    tracing::debug!(op, code = err.code(), error = %err, "store call failed");
    err.into()
}

#[async_trait]
impl DataAccess for SharedStore {
    async fn count_matching(&self, filter: &FilterSpec) -> Result<u64, DataAccessError> {
        self.with_store(|store| store.count_matching(filter))
            .map_err(|err| logged(err, "count_matching"))
    }

    async fn fetch_page(
        &self,
        filter: &FilterSpec,
        sort: &SortSpec,
        window: PageWindow,
    ) -> Result<Vec<Advisor>, DataAccessError> {
        self.with_store(|store| store.fetch_page(filter, sort, window))
            .map_err(|err| logged(err, "fetch_page"))
    }

    async fn resolve_favorite_advisor_ids(
        &self,
        user: &UserId,
        list_names: &BTreeSet<String>,
    ) -> Result<BTreeSet<AdvisorId>, DataAccessError> {
        self.with_store(|store| store.favorite_advisor_ids(user, list_names))
            .map_err(|err| logged(err, "resolve_favorite_advisor_ids"))
    }

    async fn resolve_report_advisor_ids(
        &self,
        user: &UserId,
        report_names: &BTreeSet<String>,
    ) -> Result<BTreeSet<AdvisorId>, DataAccessError> {
        self.with_store(|store| store.report_advisor_ids(user, report_names))
            .map_err(|err| logged(err, "resolve_report_advisor_ids"))
    }
}
