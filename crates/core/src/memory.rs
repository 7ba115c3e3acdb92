#![forbid(unsafe_code)]

use crate::access::{DataAccess, DataAccessError};
use crate::ids::{AdvisorId, UserId};
use crate::model::Advisor;
use crate::pagination::PageWindow;
use crate::query::{FilterSpec, SortSpec};
use async_trait::async_trait;
use std::collections::{BTreeMap, BTreeSet};
use tokio::sync::RwLock;

#[derive(Clone, Debug)]
struct NamedMembers {
    user: UserId,
    name: String,
    members: Vec<AdvisorId>,
}

#[derive(Debug, Default)]
struct Tables {
    advisors: BTreeMap<AdvisorId, Advisor>,
    favorite_lists: Vec<NamedMembers>,
    reports: Vec<NamedMembers>,
}

/// In-memory advisors directory evaluating predicates and sort order with the
/// reference semantics of [`FilterSpec::matches`] and [`SortSpec::compare`].
#[derive(Debug, Default)]
pub struct MemoryDirectory {
    tables: RwLock<Tables>,
}

impl MemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert_advisors(&self, advisors: impl IntoIterator<Item = Advisor>) {
        let mut tables = self.tables.write().await;
        for advisor in advisors {
            tables.advisors.insert(advisor.id.clone(), advisor);
        }
    }

    pub async fn remove_advisor(&self, id: &AdvisorId) -> bool {
        self.tables.write().await.advisors.remove(id).is_some()
    }

    pub async fn advisor_count(&self) -> usize {
        self.tables.read().await.advisors.len()
    }

    pub async fn add_favorite_list(
        &self,
        user: &UserId,
        name: &str,
        members: impl IntoIterator<Item = AdvisorId>,
    ) {
        let list = NamedMembers {
            user: user.clone(),
            name: name.to_string(),
            members: members.into_iter().collect(),
        };
        self.tables.write().await.favorite_lists.push(list);
    }

    pub async fn add_report(
        &self,
        user: &UserId,
        name: &str,
        advisor_ids: impl IntoIterator<Item = AdvisorId>,
    ) {
        let report = NamedMembers {
            user: user.clone(),
            name: name.to_string(),
            members: advisor_ids.into_iter().collect(),
        };
        self.tables.write().await.reports.push(report);
    }

    fn matching<'a>(tables: &'a Tables, filter: &FilterSpec) -> Vec<&'a Advisor> {
        tables
            .advisors
            .values()
            .filter(|advisor| filter.matches(advisor))
            .collect()
    }
}

fn union_named(
    groups: &[NamedMembers],
    user: &UserId,
    names: &BTreeSet<String>,
    kind: &str,
) -> Result<BTreeSet<AdvisorId>, DataAccessError> {
    let mut found = false;
    let mut out = BTreeSet::new();
    for group in groups
        .iter()
        .filter(|g| &g.user == user && names.contains(&g.name))
    {
        found = true;
        out.extend(group.members.iter().cloned());
    }
    if !found {
        return Err(DataAccessError::InvalidFilter(format!(
            "no {kind} named {names:?} for user {user}"
        )));
    }
    Ok(out)
}

#[async_trait]
impl DataAccess for MemoryDirectory {
    async fn count_matching(&self, filter: &FilterSpec) -> Result<u64, DataAccessError> {
        if filter.is_nothing() {
            return Ok(0);
        }
        let tables = self.tables.read().await;
        Ok(Self::matching(&tables, filter).len() as u64)
    }

    async fn fetch_page(
        &self,
        filter: &FilterSpec,
        sort: &SortSpec,
        window: PageWindow,
    ) -> Result<Vec<Advisor>, DataAccessError> {
        if filter.is_nothing() {
            return Ok(Vec::new());
        }
        let tables = self.tables.read().await;
        let mut rows = Self::matching(&tables, filter);
        rows.sort_by(|a, b| sort.compare(a, b));
        let start = usize::try_from(window.offset())
            .map_err(|_| DataAccessError::Query("window offset overflow".to_string()))?;
        let limit = usize::try_from(window.limit())
            .map_err(|_| DataAccessError::Query("window limit overflow".to_string()))?;
        Ok(rows.into_iter().skip(start).take(limit).cloned().collect())
    }

    async fn resolve_favorite_advisor_ids(
        &self,
        user: &UserId,
        list_names: &BTreeSet<String>,
    ) -> Result<BTreeSet<AdvisorId>, DataAccessError> {
        let tables = self.tables.read().await;
        union_named(&tables.favorite_lists, user, list_names, "favorite list")
    }

    async fn resolve_report_advisor_ids(
        &self,
        user: &UserId,
        report_names: &BTreeSet<String>,
    ) -> Result<BTreeSet<AdvisorId>, DataAccessError> {
        let tables = self.tables.read().await;
        union_named(&tables.reports, user, report_names, "report")
    }
}
