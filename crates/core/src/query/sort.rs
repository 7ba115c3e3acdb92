#![forbid(unsafe_code)]

use crate::model::{Advisor, AdvisorColumn};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Sortable columns are exactly the advisor text columns.
pub type SortField = AdvisorColumn;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    pub fn flipped(self) -> Self {
        match self {
            Self::Asc => Self::Desc,
            Self::Desc => Self::Asc,
        }
    }

    pub fn as_sql(self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SortSpec {
    pub field: SortField,
    pub direction: SortDirection,
}

impl Default for SortSpec {
    fn default() -> Self {
        Self {
            field: AdvisorColumn::FirstName,
            direction: SortDirection::Asc,
        }
    }
}

impl SortSpec {
    pub fn new(field: AdvisorColumn, direction: SortDirection) -> Self {
        Self { field, direction }
    }

    /// Column-header click: the active field flips direction, any other
    /// field becomes active ascending.
    pub fn toggle(self, field: AdvisorColumn) -> Self {
        if self.field == field {
            Self::new(field, self.direction.flipped())
        } else {
            Self::new(field, SortDirection::Asc)
        }
    }

    /// Total order used by the in-memory store. Absent values come last when
    /// ascending and first when descending; ties fall back to id ascending so
    /// windows over the same query never overlap or skip rows.
    pub fn compare(&self, a: &Advisor, b: &Advisor) -> Ordering {
        let ascending = match (a.column(self.field), b.column(self.field)) {
            (Some(x), Some(y)) => x.cmp(y),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        };
        let primary = match self.direction {
            SortDirection::Asc => ascending,
            SortDirection::Desc => ascending.reverse(),
        };
        primary.then_with(|| a.id.cmp(&b.id))
    }
}
