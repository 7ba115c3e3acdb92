#![forbid(unsafe_code)]

use crate::filter::name_contains;
use crate::ids::AdvisorId;
use crate::model::{Advisor, AdvisorColumn};
use std::collections::BTreeSet;

/// One storage-independent filter condition over the advisors table.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Predicate {
    /// `first_name` or `last_name` contains the needle, ignoring case.
    NameContains(String),
    /// The column value is one of `values`. Absent values never match.
    ColumnIn {
        column: AdvisorColumn,
        values: BTreeSet<String>,
    },
    /// The advisor id is one of the given ids.
    IdIn(BTreeSet<AdvisorId>),
}

impl Predicate {
    pub fn matches(&self, advisor: &Advisor) -> bool {
        match self {
            Self::NameContains(needle) => name_contains(advisor, needle),
            Self::ColumnIn { column, values } => advisor
                .column(*column)
                .is_some_and(|value| values.contains(value)),
            Self::IdIn(ids) => ids.contains(&advisor.id),
        }
    }
}

/// The composed filter applied identically to count and page queries.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FilterSpec {
    /// Conjunction of predicates; an empty list matches every advisor.
    Match(Vec<Predicate>),
    /// A membership selection resolved to nothing: the query yields zero rows
    /// and never needs to reach the store.
    Nothing,
}

impl FilterSpec {
    pub fn everything() -> Self {
        Self::Match(Vec::new())
    }

    pub fn is_nothing(&self) -> bool {
        matches!(self, Self::Nothing)
    }

    pub fn predicates(&self) -> &[Predicate] {
        match self {
            Self::Match(predicates) => predicates,
            Self::Nothing => &[],
        }
    }

    pub fn matches(&self, advisor: &Advisor) -> bool {
        match self {
            Self::Match(predicates) => predicates.iter().all(|p| p.matches(advisor)),
            Self::Nothing => false,
        }
    }
}

impl Default for FilterSpec {
    fn default() -> Self {
        Self::everything()
    }
}
