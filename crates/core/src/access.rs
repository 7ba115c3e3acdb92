#![forbid(unsafe_code)]

use crate::ids::{AdvisorId, UserId};
use crate::model::Advisor;
use crate::pagination::PageWindow;
use crate::query::{FilterSpec, SortSpec};
use async_trait::async_trait;
use std::collections::BTreeSet;
use thiserror::Error;

/// A failed call into the backing store. The engine never propagates these:
/// counts degrade to zero, pages to empty, memberships to empty sets.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum DataAccessError {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("query error: {0}")]
    Query(String),

    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// A filter references a value that no longer exists, such as a deleted
    /// favorite list.
    #[error("invalid filter: {0}")]
    InvalidFilter(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl DataAccessError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::Transport(_) => "TRANSPORT",
            Self::Query(_) => "QUERY",
            Self::Unauthorized(_) => "UNAUTHORIZED",
            Self::InvalidFilter(_) => "INVALID_FILTER",
            Self::Internal(_) => "INTERNAL",
        }
    }
}

/// The narrow interface the engine needs from an advisors datastore.
#[async_trait]
pub trait DataAccess: Send + Sync {
    /// Total rows matching `filter`.
    async fn count_matching(&self, filter: &FilterSpec) -> Result<u64, DataAccessError>;

    /// Rows `window.start..=window.end` of the filtered set ordered by `sort`.
    /// A short page means the set is exhausted.
    async fn fetch_page(
        &self,
        filter: &FilterSpec,
        sort: &SortSpec,
        window: PageWindow,
    ) -> Result<Vec<Advisor>, DataAccessError>;

    /// Union of the members of the user's favorite lists named in `list_names`.
    async fn resolve_favorite_advisor_ids(
        &self,
        user: &UserId,
        list_names: &BTreeSet<String>,
    ) -> Result<BTreeSet<AdvisorId>, DataAccessError>;

    /// Union of the materialized id lists of the user's reports named in
    /// `report_names`. Ids of advisors deleted since are kept.
    async fn resolve_report_advisor_ids(
        &self,
        user: &UserId,
        report_names: &BTreeSet<String>,
    ) -> Result<BTreeSet<AdvisorId>, DataAccessError>;
}
